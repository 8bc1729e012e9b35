use super::cp_url::format_as_url;
use crate::{
    AuthMechanism, ConnectParams, IntoConnectParamsBuilder, LdapAuthError, LdapAuthResult,
    ServerCerts, Tls,
};
use std::time::Duration;

/// A builder for `ConnectParams`.
///
/// # Instantiating a `ConnectParamsBuilder` programmatically
///
/// ```rust
/// use ldap_auth::ConnectParams;
///
/// let connect_params = ConnectParams::builder()
///     .hostname("abcd123")
///     .port(2222)
///     .base_dn("dc=example,dc=com")
///     .build()
///     .unwrap();
/// ```
///
/// # Instantiating a `ConnectParamsBuilder` from a URL
///
/// See module [`url`](crate::url) for details about the supported URLs.
///
/// ```rust
/// use ldap_auth::IntoConnectParamsBuilder;
///
/// let connect_params = "ldap://abcd123:2222"
///     .into_connect_params_builder()
///     .unwrap()
///     .base_dn("dc=example,dc=com")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(into = "String")]
pub struct ConnectParamsBuilder {
    hostname: Option<String>,
    port: Option<u16>,
    base_dn: Option<String>,
    mechanism: AuthMechanism,
    follow_referrals: bool,
    starttls: bool,
    connect_timeout: Option<Duration>,
    tls: Tls,
}

impl ConnectParamsBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hostname.
    pub fn hostname<H: AsRef<str>>(&mut self, hostname: H) -> &mut Self {
        self.hostname = Some(hostname.as_ref().to_owned());
        self
    }

    /// Sets the port.
    ///
    /// Without an explicit port, the default port of the chosen protocol is
    /// used (389, or 636 for TLS without `StartTLS`).
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Sets the base distinguished name that roots all searches and serves
    /// as the bind identity when the login is empty.
    pub fn base_dn<D: AsRef<str>>(&mut self, base_dn: D) -> &mut Self {
        self.base_dn = Some(base_dn.as_ref().to_owned());
        self
    }

    /// Sets the authentication mechanism.
    pub fn mechanism(&mut self, mechanism: AuthMechanism) -> &mut Self {
        self.mechanism = mechanism;
        self
    }

    /// Lets binds and searches chase referral responses from the directory.
    ///
    /// Chasing a referral at search time requires re-binding on the referred
    /// server with the same mechanism as the primary bind. Only a connection
    /// bound with [`AuthMechanism::Simple`] retains a copy of the bind
    /// identity and secret for its lifetime (dropped when the connection is
    /// closed); anonymous and GSSAPI binds are repeated without credentials.
    /// Without this option no credentials are retained past the bind call.
    pub fn follow_referrals(&mut self, follow_referrals: bool) -> &mut Self {
        self.follow_referrals = follow_referrals;
        self
    }

    /// Upgrades the plain connection with `StartTLS` before any credentials
    /// are sent. Requires a TLS configuration
    /// ([`tls_with`](Self::tls_with) or
    /// [`tls_without_server_verification`](Self::tls_without_server_verification)).
    pub fn starttls(&mut self, starttls: bool) -> &mut Self {
        self.starttls = starttls;
        self
    }

    /// Bounds the time for establishing the connection. Without it, the
    /// transport's defaults apply.
    pub fn connect_timeout(&mut self, connect_timeout: Duration) -> &mut Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    /// Whether TLS or a plain TCP connection is to be used.
    pub fn is_tls(&self) -> bool {
        !matches!(self.tls, Tls::Off)
    }

    /// Makes the client use TLS for the connection to the server.
    ///
    /// Requires that the server's certificate is provided with one of the
    /// enum variants of [`ServerCerts`](crate::ServerCerts).
    ///
    /// If needed, you can call this function multiple times with different
    /// `ServerCert` variants.
    ///
    /// Example:
    ///
    /// ```rust,no_run
    /// # use ldap_auth::{ConnectParams, ServerCerts};
    /// # let string_with_certificate = String::new();
    /// let mut connect_params = ConnectParams::builder()
    ///    // ...more settings required...
    ///    .tls_with(ServerCerts::Direct(string_with_certificate))
    ///    .build();
    /// ```
    pub fn tls_with(&mut self, server_certs: ServerCerts) -> &mut Self {
        match self.tls {
            Tls::Off | Tls::Insecure => {
                self.tls = Tls::Secure(vec![]);
            }
            Tls::Secure(_) => {}
        }
        if let Tls::Secure(ref mut v) = self.tls {
            v.push(server_certs);
        }
        self
    }

    /// Makes the client use TLS for the connection to the server, but
    /// hazardously without verifying the server's certificate.
    /// Erases all already configured server certs.
    pub fn tls_without_server_verification(&mut self) -> &mut Self {
        self.tls = Tls::Insecure;
        self
    }

    /// Constructs a `ConnectParams` from the builder.
    ///
    /// # Errors
    /// `LdapAuthError::Usage` if the builder was not yet configured to
    /// create a meaningful `ConnectParams`
    pub fn build(&self) -> LdapAuthResult<ConnectParams> {
        let host = self
            .hostname
            .as_ref()
            .cloned()
            .ok_or(LdapAuthError::Usage("hostname is missing"))?;

        let base_dn = self
            .base_dn
            .as_ref()
            .cloned()
            .ok_or(LdapAuthError::Usage("base_dn is missing"))?;

        if self.starttls && matches!(self.tls, Tls::Off) {
            return Err(LdapAuthError::Usage(
                "'starttls' requires a TLS configuration; \
                use tls_with or tls_without_server_verification",
            ));
        }

        let port = self.port.unwrap_or(if self.is_tls() && !self.starttls {
            crate::url::DEFAULT_PORT_TLS
        } else {
            crate::url::DEFAULT_PORT
        });

        Ok(ConnectParams::new(
            host,
            port,
            base_dn,
            self.mechanism,
            self.follow_referrals,
            self.starttls,
            self.connect_timeout,
            self.tls.clone(),
        ))
    }

    /// Returns the url for this connection.
    ///
    /// # Errors
    ///
    /// `LdapAuthError::Usage` if no hostname was configured yet
    pub fn to_url(&self) -> LdapAuthResult<String> {
        if self.hostname.is_none() {
            return Err(LdapAuthError::Usage("hostname is missing"));
        }
        Ok(self.to_string())
    }

    /// Getter
    pub fn get_hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Getter
    pub fn get_port(&self) -> Option<u16> {
        self.port
    }

    /// Getter
    pub fn get_base_dn(&self) -> Option<&str> {
        self.base_dn.as_deref()
    }

    /// Getter
    pub fn get_mechanism(&self) -> AuthMechanism {
        self.mechanism
    }

    /// Getter
    pub fn get_server_certs(&self) -> Option<&Vec<ServerCerts>> {
        match self.tls {
            Tls::Secure(ref sc) => Some(sc),
            _ => None,
        }
    }
}

impl<'de> serde::de::Deserialize<'de> for ConnectParamsBuilder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let visitor = Visitor();
        deserializer.deserialize_str(visitor)
    }
}

struct Visitor();
impl serde::de::Visitor<'_> for Visitor {
    type Value = ConnectParamsBuilder;
    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a String in the form of a url")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        IntoConnectParamsBuilder::into_connect_params_builder(v).map_err(E::custom)
    }
}

impl From<ConnectParamsBuilder> for String {
    fn from(cpb: ConnectParamsBuilder) -> String {
        cpb.to_string()
    }
}

impl std::fmt::Display for ConnectParamsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        format_as_url(
            &format!(
                "{}:{}",
                self.hostname.as_deref().unwrap_or(""),
                self.port.unwrap_or_default()
            ),
            self.base_dn.as_deref(),
            self.mechanism,
            self.follow_referrals,
            self.starttls,
            self.connect_timeout,
            &self.tls,
            f,
        )
    }
}

#[cfg(test)]
mod test {
    use super::ConnectParamsBuilder;
    use crate::{AuthMechanism, IntoConnectParamsBuilder, ServerCerts};

    #[test]
    fn test_connect_params_builder() {
        {
            let params = ConnectParamsBuilder::new()
                .hostname("abcd123")
                .port(2222)
                .base_dn("dc=example,dc=com")
                .build()
                .unwrap();
            assert_eq!("abcd123:2222", params.addr());
            assert_eq!("dc=example,dc=com", params.base_dn());
            assert_eq!(AuthMechanism::Simple, params.mechanism());
            assert!(params.server_certs().is_none());
            assert!(!params.is_tls());
        }
        {
            let mut builder = ConnectParamsBuilder::new();
            builder
                .hostname("abcd123")
                .base_dn("dc=example,dc=com")
                .mechanism(AuthMechanism::None)
                .follow_referrals(true);
            builder.tls_with(crate::ServerCerts::Directory("TCD".to_string()));
            builder.tls_with(crate::ServerCerts::RootCertificates);

            let params = builder.build().unwrap();
            assert_eq!(AuthMechanism::None, params.mechanism());
            assert!(params.follow_referrals());
            // TLS without StartTLS falls back to the ldaps default port
            assert_eq!("abcd123:636", params.addr());
            assert_eq!(
                ServerCerts::Directory("TCD".to_string()),
                *params.server_certs().unwrap().first().unwrap()
            );
            assert_eq!(
                ServerCerts::RootCertificates,
                *params.server_certs().unwrap().get(1).unwrap()
            );
        }
        {
            let builder = "ldap://abcd123:2222?base_dn=dc=example,dc=com"
                .into_connect_params_builder()
                .unwrap();
            assert_eq!("abcd123", builder.get_hostname().unwrap());
            assert_eq!(2222, builder.get_port().unwrap());
            assert_eq!("dc=example,dc=com", builder.get_base_dn().unwrap());
            assert!(builder.get_server_certs().is_none());
            assert!(!builder.is_tls());
        }
    }

    #[test]
    fn test_missing_pieces() {
        {
            let mut builder = ConnectParamsBuilder::new();
            builder.base_dn("dc=example,dc=com");
            assert!(builder.build().is_err()); // hostname is missing
            assert!(builder.to_url().is_err());
        }
        {
            let mut builder = ConnectParamsBuilder::new();
            builder.hostname("abcd123");
            assert!(builder.build().is_err()); // base_dn is missing
        }
        {
            let mut builder = ConnectParamsBuilder::new();
            builder
                .hostname("abcd123")
                .base_dn("dc=example,dc=com")
                .starttls(true);
            assert!(builder.build().is_err()); // starttls without TLS config
        }
    }

    #[test]
    fn serde_test() {
        #[derive(Serialize, Deserialize, Debug)]
        struct Data {
            x: ConnectParamsBuilder,
        }

        let mut data = Data {
            x: ConnectParamsBuilder::new(),
        };
        data.x
            .hostname("abcd123")
            .port(2222)
            .base_dn("dc=example,dc=com")
            .follow_referrals(true)
            .tls_with(crate::ServerCerts::Directory("TCD".to_string()))
            .tls_with(crate::ServerCerts::RootCertificates);

        let serialized = serde_json::to_string(&data).unwrap();
        assert_eq!(
            r#"{"x":"ldaps://abcd123:2222?base_dn=dc=example,dc=com&follow_referrals&tls_certificate_dir=TCD&use_mozillas_root_certificates"}"#,
            serialized
        );

        let deserialized: Data = serde_json::from_str(&serialized).unwrap();
        assert_eq!(data.x, deserialized.x);
    }
}
