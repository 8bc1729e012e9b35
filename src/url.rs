//! Constants for use in connection URLs.
//!
//! Directory connections are configured with an instance of
//! [`ConnectParams`](crate::ConnectParams). Instances of
//! [`ConnectParams`](crate::ConnectParams) can be created using a
//! [`ConnectParamsBuilder`](crate::ConnectParamsBuilder), or from a URL.
//!
//! Also [`ConnectParamsBuilder`](crate::ConnectParamsBuilder)s can be created
//! from a URL.
//!
//! Such a URL is supposed to have the form
//!
//! ```text
//! <scheme>://<host>[:<port>][<options>]
//! ```
//! where
//! > `<scheme>` = `ldap` | `ldaps`
//! > `<host>` = the host where the directory server can be found
//! > `<port>` = the port at which the server can be found on `<host>`
//! >            (defaults to 389 for `ldap` and 636 for `ldaps`)
//! > `<options>` = `?<key>[=<value>][{&<key>[=<value>]}]`
//!
//! __Supported options are:__
//! - `base_dn=<value>` specifies the distinguished name that roots all
//!   searches and serves as the bind identity when the login is empty
//! - `mechanism=<value>` selects the authentication mechanism; one of
//!   `none`, `simple`, `DIGEST-MD5`, `GSSAPI` (default: `simple`)
//! - `follow_referrals` (no value) lets searches and binds chase referral
//!   responses from the directory
//! - `starttls` (no value) upgrades the plain connection with `StartTLS`
//!   before any credentials are sent; requires one of the TLS options below
//! - `connect_timeout_secs=<value>` bounds the time for establishing the
//!   connection; without it the transport's defaults apply
//! - the [TLS](https://en.wikipedia.org/wiki/Transport_Layer_Security) options
//!
//! __The TLS options are:__
//! - `tls_certificate_dir=<value>`: points to a folder with pem files that
//!   contain certificates; all pem files in that folder are evaluated
//! - `tls_certificate_env=<value>`: denotes an environment variable that
//!   contains certificates
//! - `use_mozillas_root_certificates` (no value): use the root certificates
//!   from [`https://mkcert.org/`](https://mkcert.org/)
//! - `insecure_omit_server_certificate_check` (no value): lets the client
//!   omit the validation of the server's identity. Don't use this option in
//!   productive setups!
//!
//! __To configure TLS__, use the scheme `ldaps`, or the scheme `ldap` plus
//! the option `starttls`, and at least one of the TLS options.
//!
//! __For a plain connection without TLS__, use the scheme `ldap` and none of
//! the TLS options.
//!
//! ### Examples
//!
//! ```rust
//! use ldap_auth::IntoConnectParams;
//!
//! let params = "ldap://example.test?base_dn=cn=admin,dc=example,dc=com"
//!     .into_connect_params()
//!     .unwrap();
//! ```
//!
//! ```rust
//! use ldap_auth::IntoConnectParamsBuilder;
//!
//! let mut builder = "ldaps://ad.example.test:3269?use_mozillas_root_certificates"
//!     .into_connect_params_builder()
//!     .unwrap();
//!
//! builder.base_dn("dc=example,dc=test");
//! let params = builder.build().unwrap(); // ConnectParams
//! ```

/// Protocol without TLS (unless `StartTLS` is requested).
pub const LDAP: &str = "ldap";

/// Protocol with TLS from the start.
pub const LDAPS: &str = "ldaps";

/// Default port for the `ldap` scheme.
pub const DEFAULT_PORT: u16 = 389;

/// Default port for the `ldaps` scheme.
pub const DEFAULT_PORT_TLS: u16 = 636;

/// Option-key for denoting the base distinguished name.
pub const BASE_DN: &str = "base_dn";

/// Option-key for denoting the authentication mechanism.
pub const MECHANISM: &str = "mechanism";

/// Option-key for letting binds and searches chase referral responses.
pub const FOLLOW_REFERRALS: &str = "follow_referrals";

/// Option-key for upgrading the plain connection with `StartTLS` before any
/// credentials are sent.
pub const STARTTLS: &str = "starttls";

/// Option-key for bounding the time for establishing the connection.
pub const CONNECT_TIMEOUT_SECS: &str = "connect_timeout_secs";

/// Option-key for denoting a folder in which server certificates can be found.
pub const TLS_CERTIFICATE_DIR: &str = "tls_certificate_dir";

/// Option-key for denoting an environment variable in which a server
/// certificate can be found.
pub const TLS_CERTIFICATE_ENV: &str = "tls_certificate_env";

/// Option-key for defining that the server roots from <https://mkcert.org/>
/// should be added to the trust store for TLS.
pub const USE_MOZILLAS_ROOT_CERTIFICATES: &str = "use_mozillas_root_certificates";

/// Option-key for defining that the server's identity is not validated.
/// Don't use this option in productive setups!
pub const INSECURE_OMIT_SERVER_CERTIFICATE_CHECK: &str =
    "insecure_omit_server_certificate_check";
