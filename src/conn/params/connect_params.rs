//! Connection parameters
use super::cp_url::format_as_url;
use super::into_connect_params_builder::IntoConnectParamsBuilder;
use crate::{AuthMechanism, ConnectParamsBuilder, LdapAuthResult};
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde::de::Deserialize;
use std::{io::Read, path::PathBuf, time::Duration};

/// An immutable struct with all information necessary to authenticate
/// against a directory server.
///
/// An authentication attempt never mutates its `ConnectParams`; reconfiguring
/// means building a new value.
///
/// # Instantiating a `ConnectParams` using the `ConnectParamsBuilder`
///
/// See [`ConnectParamsBuilder`](crate::ConnectParamsBuilder) for details.
///
/// ```rust,no_run
/// use ldap_auth::{AuthMechanism, ConnectParams, ServerCerts};
///
/// let connect_params = ConnectParams::builder()
///    .hostname("ad.example.test")
///    .base_dn("dc=example,dc=test")
///    .mechanism(AuthMechanism::Simple)
///    .tls_with(ServerCerts::RootCertificates)
///    .build()
///    .unwrap();
/// ```
///
/// # Instantiating a `ConnectParams` from a URL
///
/// See module [`url`](crate::url) for details about the supported URLs.
///
/// ```rust
/// use ldap_auth::IntoConnectParams;
///
/// let connect_params = "ldap://example.test?base_dn=cn=admin,dc=example,dc=com"
///     .into_connect_params()
///     .unwrap();
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectParams {
    host: String,
    addr: String,
    base_dn: String,
    mechanism: AuthMechanism,
    follow_referrals: bool,
    starttls: bool,
    connect_timeout: Option<Duration>,
    tls: Tls,
}

/// Describes whether and how TLS is to be used.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub enum Tls {
    /// Plain TCP connection
    #[default]
    Off,
    /// TLS without server validation - dangerous!
    Insecure,
    /// TLS with server validation
    Secure(Vec<ServerCerts>),
}

impl ConnectParams {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        host: String,
        port: u16,
        base_dn: String,
        mechanism: AuthMechanism,
        follow_referrals: bool,
        starttls: bool,
        connect_timeout: Option<Duration>,
        tls: Tls,
    ) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            host,
            base_dn,
            mechanism,
            follow_referrals,
            starttls,
            connect_timeout,
            tls,
        }
    }

    /// Returns a new builder for `ConnectParams`.
    pub fn builder() -> ConnectParamsBuilder {
        ConnectParamsBuilder::new()
    }

    /// The `ServerCerts`.
    pub fn server_certs(&self) -> Option<&Vec<ServerCerts>> {
        match self.tls {
            Tls::Secure(ref certs) => Some(certs),
            Tls::Insecure | Tls::Off => None,
        }
    }

    /// The host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The socket address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The base distinguished name that roots all searches and serves as the
    /// bind identity when the login is empty.
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// The authentication mechanism.
    pub fn mechanism(&self) -> AuthMechanism {
        self.mechanism
    }

    /// Whether binds and searches chase referral responses.
    pub fn follow_referrals(&self) -> bool {
        self.follow_referrals
    }

    /// Whether the plain connection is upgraded with `StartTLS` before any
    /// credentials are sent.
    pub fn is_starttls(&self) -> bool {
        self.starttls
    }

    /// The timeout for establishing the connection; `None` delegates to the
    /// transport's defaults.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Whether TLS or a plain TCP connection is to be used.
    pub fn is_tls(&self) -> bool {
        !matches!(self.tls, Tls::Off)
    }

    pub(crate) fn tls(&self) -> &Tls {
        &self.tls
    }

    // The URL handed to the transport; StartTLS upgrades are requested via
    // the connection settings, not the scheme.
    pub(crate) fn conn_url(&self) -> String {
        if self.is_tls() && !self.starttls {
            format!("{}://{}", crate::url::LDAPS, self.addr)
        } else {
            format!("{}://{}", crate::url::LDAP, self.addr)
        }
    }

    #[allow(clippy::too_many_lines)]
    pub(crate) fn rustls_clientconfig(&self) -> std::io::Result<ClientConfig> {
        match self.tls {
            Tls::Off | Tls::Insecure => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "rustls_clientconfig called without Tls::Secure - \
                    this should have been prevented earlier",
            )),
            Tls::Secure(ref server_certs) => {
                let mut root_store = RootCertStore::empty();
                for server_cert in server_certs {
                    match server_cert {
                        ServerCerts::RootCertificates => {
                            root_store.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(
                                |ta| {
                                    OwnedTrustAnchor::from_subject_spki_name_constraints(
                                        ta.subject,
                                        ta.spki,
                                        ta.name_constraints,
                                    )
                                },
                            ));
                        }
                        ServerCerts::Direct(ref pem) => {
                            let (n_ok, n_err) =
                                root_store.add_parsable_certificates(&[pem.clone().into_bytes()]);
                            if n_ok == 0 {
                                info!("None of the directly provided server certificates was accepted");
                            } else if n_err > 0 {
                                info!(
                                    "Not all directly provided server certificates were accepted"
                                );
                            }
                        }
                        ServerCerts::Environment(env_var) => {
                            match std::env::var(env_var) {
                                Ok(value) => {
                                    let (n_ok, n_err) =
                                        root_store.add_parsable_certificates(&[value.into_bytes()]);
                                    if n_ok == 0 {
                                        info!("None of the env-provided server certificates was accepted");
                                    } else if n_err > 0 {
                                        info!("Not all env-provided server certificates were accepted");
                                    }
                                }
                                Err(e) => {
                                    return Err(std::io::Error::new(
                                        std::io::ErrorKind::InvalidInput,
                                        format!(
                                            "Environment variable {env_var} not found, reason: {e}"
                                        ),
                                    ));
                                }
                            }
                        }
                        ServerCerts::Directory(trust_anchor_dir) => {
                            let trust_anchor_files: Vec<PathBuf> =
                                std::fs::read_dir(trust_anchor_dir)?
                                    .filter_map(Result::ok)
                                    .filter(|dir_entry| {
                                        dir_entry
                                            .file_type()
                                            .map(|ft| ft.is_file())
                                            .unwrap_or(false)
                                    })
                                    .filter(|dir_entry| {
                                        let path = dir_entry.path();
                                        let ext = path.extension();
                                        Some(AsRef::<std::ffi::OsStr>::as_ref("pem")) == ext
                                    })
                                    .map(|dir_entry| dir_entry.path())
                                    .collect();

                            let mut t_ok = 0;
                            let mut t_err = 0;
                            for trust_anchor_file in trust_anchor_files {
                                trace!("Trying trust anchor file {:?}", trust_anchor_file);
                                let mut buf = Vec::<u8>::new();
                                std::fs::File::open(trust_anchor_file)?.read_to_end(&mut buf)?;
                                let (n_ok, n_err) = root_store.add_parsable_certificates(&[buf]);
                                t_ok += n_ok;
                                t_err += n_err;
                            }
                            if t_ok == 0 {
                                warn!(
                                    "None of the server certificates in the directory was accepted"
                                );
                            } else if t_err > 0 {
                                warn!("Not all server certificates in the directory were accepted");
                            }
                        }
                    }
                }
                let config = ClientConfig::builder()
                    .with_safe_defaults()
                    .with_root_certificates(root_store)
                    .with_no_client_auth();
                Ok(config)
            }
        }
    }
}

impl std::fmt::Display for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        format_as_url(
            &self.addr,
            Some(&self.base_dn),
            self.mechanism,
            self.follow_referrals,
            self.starttls,
            self.connect_timeout,
            &self.tls,
            f,
        )
    }
}

/// Expresses where Certificates for TLS are read from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerCerts {
    /// Server Certificates are read from files in the specified folder.
    Directory(String),
    /// Server Certificates are read from the specified environment variable.
    Environment(String),
    /// The Server Certificate is given directly.
    Direct(String),
    /// Defines that the server roots from <https://mkcert.org/> should be
    /// added to the trust store for TLS.
    RootCertificates,
}

/// A trait implemented by types that can be converted into a `ConnectParams`.
pub trait IntoConnectParams {
    /// Converts the value of `self` into a `ConnectParams`.
    ///
    /// # Errors
    /// `LdapAuthError::Usage` or `LdapAuthError::ConnParams` if wrong
    /// information was provided
    fn into_connect_params(self) -> LdapAuthResult<ConnectParams>;
}

impl IntoConnectParams for ConnectParams {
    fn into_connect_params(self) -> LdapAuthResult<ConnectParams> {
        Ok(self)
    }
}

impl IntoConnectParams for &str {
    fn into_connect_params(self) -> LdapAuthResult<ConnectParams> {
        self.into_connect_params_builder()?.build()
    }
}

impl IntoConnectParams for String {
    fn into_connect_params(self) -> LdapAuthResult<ConnectParams> {
        self.as_str().into_connect_params()
    }
}

impl IntoConnectParams for url::Url {
    fn into_connect_params(self) -> LdapAuthResult<ConnectParams> {
        self.into_connect_params_builder()?.build()
    }
}

#[allow(clippy::missing_errors_doc)]
impl<'de> Deserialize<'de> for ConnectParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DeserializationHelper {
            host: String,
            port: Option<u16>,
            base_dn: String,
            #[serde(default)]
            mechanism: AuthMechanism,
            #[serde(default)]
            follow_referrals: bool,
            #[serde(default)]
            starttls: bool,
            connect_timeout_secs: Option<u64>,
            #[serde(default)]
            tls: Tls,
        }
        let helper: DeserializationHelper = DeserializationHelper::deserialize(deserializer)?;
        if helper.starttls && matches!(helper.tls, Tls::Off) {
            return Err(serde::de::Error::custom(
                "'starttls' requires a TLS configuration",
            ));
        }
        let port = helper.port.unwrap_or(
            if matches!(helper.tls, Tls::Off) || helper.starttls {
                crate::url::DEFAULT_PORT
            } else {
                crate::url::DEFAULT_PORT_TLS
            },
        );
        Ok(ConnectParams::new(
            helper.host,
            port,
            helper.base_dn,
            helper.mechanism,
            helper.follow_referrals,
            helper.starttls,
            helper.connect_timeout_secs.map(Duration::from_secs),
            helper.tls,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{IntoConnectParams, ServerCerts};
    use crate::AuthMechanism;

    #[test]
    fn test_params_from_url() {
        {
            let params = "ldap://abcd123:2222?base_dn=dc=example,dc=com"
                .into_connect_params()
                .unwrap();

            assert_eq!("abcd123:2222", params.addr());
            assert_eq!("dc=example,dc=com", params.base_dn());
            assert_eq!(AuthMechanism::Simple, params.mechanism());
            assert!(!params.follow_referrals());
            assert!(params.server_certs().is_none());
            assert!(!params.is_tls());
            assert_eq!("ldap://abcd123:2222", params.conn_url());
        }
        {
            let params = "ldap://example.test?base_dn=cn=admin,dc=example,dc=com"
                .into_connect_params()
                .unwrap();

            // default port for the plain scheme
            assert_eq!("example.test:389", params.addr());
            assert_eq!("cn=admin,dc=example,dc=com", params.base_dn());
        }
        {
            let params = "ldaps://abcd123:2222\
                          ?base_dn=dc=example,dc=com\
                          &mechanism=none\
                          &follow_referrals\
                          &tls_certificate_dir=TCD\
                          &use_mozillas_root_certificates"
                .into_connect_params()
                .unwrap();

            assert_eq!(AuthMechanism::None, params.mechanism());
            assert!(params.follow_referrals());
            assert!(params.is_tls());
            assert!(!params.is_starttls());
            assert_eq!(
                ServerCerts::Directory("TCD".to_string()),
                *params.server_certs().unwrap().first().unwrap()
            );
            assert_eq!(
                ServerCerts::RootCertificates,
                *params.server_certs().unwrap().get(1).unwrap()
            );
            assert_eq!("ldaps://abcd123:2222", params.conn_url());
            assert_eq!(
                params.to_string(),
                "ldaps://abcd123:2222\
                ?base_dn=dc=example,dc=com\
                &mechanism=none\
                &follow_referrals\
                &tls_certificate_dir=TCD\
                &use_mozillas_root_certificates"
                    .to_owned()
            );
        }
        {
            let params = "ldap://abcd123:2222\
                          ?base_dn=dc=example,dc=com\
                          &starttls\
                          &insecure_omit_server_certificate_check"
                .into_connect_params()
                .unwrap();

            assert!(params.is_tls());
            assert!(params.is_starttls());
            assert!(params.server_certs().is_none());
            // StartTLS keeps the plain scheme; the upgrade happens in-band
            assert_eq!("ldap://abcd123:2222", params.conn_url());
        }
        {
            let params = "ldaps://abcd123?base_dn=dc=example,dc=com\
                          &insecure_omit_server_certificate_check"
                .into_connect_params()
                .unwrap();

            // default port for the TLS scheme
            assert_eq!("abcd123:636", params.addr());
        }
    }

    #[test]
    fn test_errors() {
        // unknown scheme
        assert!("http://abcd123:2222?base_dn=dc=example,dc=com"
            .into_connect_params()
            .is_err());
        // base_dn is required
        assert!("ldap://abcd123:2222".into_connect_params().is_err());
        // ldaps needs a certificate source or the explicit insecure option
        assert!("ldaps://abcd123:2222?base_dn=dc=example,dc=com"
            .into_connect_params()
            .is_err());
        // certificate sources and the insecure option contradict each other
        assert!("ldaps://abcd123:2222?base_dn=dc=example,dc=com\
                 &use_mozillas_root_certificates\
                 &insecure_omit_server_certificate_check"
            .into_connect_params()
            .is_err());
        // starttls on ldaps is contradictory
        assert!("ldaps://abcd123:2222?base_dn=dc=example,dc=com\
                 &use_mozillas_root_certificates&starttls"
            .into_connect_params()
            .is_err());
        // TLS options without ldaps or starttls
        assert!("ldap://abcd123:2222?base_dn=dc=example,dc=com\
                 &use_mozillas_root_certificates"
            .into_connect_params()
            .is_err());
        // unknown option
        assert!("ldap://abcd123:2222?base_dn=dc=example,dc=com&foo=bar"
            .into_connect_params()
            .is_err());
    }
}
