//! Synchronous LDAP authentication helper.
//!
//! `ldap-auth` provides a lean, blocking rust-API for authenticating users
//! against a directory server (e.g. Active Directory or `OpenLDAP`): it opens
//! a connection, optionally secures the channel with TLS (either implicitly
//! via `ldaps` or by upgrading an existing connection with `StartTLS`), binds
//! with the supplied credentials, and can verify group membership through a
//! `memberOf` attribute lookup.
//!
//! The entry point is [`DirectoryAuthenticator`], which is configured with an
//! immutable [`ConnectParams`] value. `ConnectParams` can be built
//! programmatically with a [`ConnectParamsBuilder`] or parsed from a URL
//! (see module [`url`](crate::url)):
//!
//! ```rust,no_run
//! use ldap_auth::{DirectoryAuthenticator, SecUtf8};
//!
//! # fn main() -> ldap_auth::LdapAuthResult<()> {
//! let authenticator = DirectoryAuthenticator::new(
//!     "ldap://example.test?base_dn=cn=admin,dc=example,dc=com",
//! )?;
//!
//! let secret = SecUtf8::from("password");
//! if authenticator.authenticate_member_of("jdoe", &secret, "mathematicians")? {
//!     // jdoe presented valid credentials and is a mathematician
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Every operation is blocking and synchronous; every operation acquires its
//! own connection and releases it on all exit paths. An authenticator holds
//! nothing but its immutable parameters, so a single instance can be used
//! from multiple threads; concurrent calls produce independent connections.

#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

mod auth_error;
mod conn;
mod protocol;
pub mod url;

pub use crate::auth_error::{LdapAuthError, LdapAuthResult};
pub use crate::conn::{
    AuthMechanism, ConnectParams, ConnectParamsBuilder, DirectoryAuthenticator,
    DirectoryConnection, IntoConnectParams, IntoConnectParamsBuilder, ServerCerts, Tls,
};
pub use crate::protocol::{escape_filter_value, extract_common_name};

/// Re-export of the secret-string type used for bind credentials.
pub use secstr::SecUtf8;
