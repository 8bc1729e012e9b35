use super::cp_url::UrlOpt;
use crate::{
    url::{LDAP, LDAPS},
    AuthMechanism, ConnectParamsBuilder, LdapAuthError, LdapAuthResult, ServerCerts,
};
use std::time::Duration;
use url::Url;

/// A trait implemented by types that can be converted into a `ConnectParamsBuilder`.
///
/// # Example
/// ```rust
///     use ldap_auth::IntoConnectParamsBuilder;
///
///     let cp_builder = "ldap://abcd123:2222"
///         .into_connect_params_builder()
///         .unwrap();
///
///     assert_eq!("abcd123", cp_builder.get_hostname().unwrap());
/// ```
pub trait IntoConnectParamsBuilder {
    /// Converts the value of `self` into a `ConnectParamsBuilder`.
    ///
    /// # Errors
    /// `LdapAuthError::Usage` if wrong information was provided
    fn into_connect_params_builder(self) -> LdapAuthResult<ConnectParamsBuilder>;
}

impl IntoConnectParamsBuilder for ConnectParamsBuilder {
    fn into_connect_params_builder(self) -> LdapAuthResult<ConnectParamsBuilder> {
        Ok(self)
    }
}

impl IntoConnectParamsBuilder for &str {
    fn into_connect_params_builder(self) -> LdapAuthResult<ConnectParamsBuilder> {
        Url::parse(self)
            .map_err(|e| LdapAuthError::conn_params(Box::new(e)))?
            .into_connect_params_builder()
    }
}

impl IntoConnectParamsBuilder for String {
    fn into_connect_params_builder(self) -> LdapAuthResult<ConnectParamsBuilder> {
        self.as_str().into_connect_params_builder()
    }
}

impl IntoConnectParamsBuilder for Url {
    fn into_connect_params_builder(self) -> LdapAuthResult<ConnectParamsBuilder> {
        let mut builder = ConnectParamsBuilder::new();
        self.host_str().map(|host| builder.hostname(host));
        self.port().map(|port| builder.port(port));

        // authoritative switch between protocols:
        let use_ldaps = match self.scheme() {
            LDAP => false,
            LDAPS => true,
            _ => {
                error!("unknown scheme: {}, from {}", self.scheme(), self);
                return Err(LdapAuthError::Usage(
                    "Unknown protocol, only 'ldap' and 'ldaps' are supported",
                ));
            }
        };

        let mut starttls_option = false;
        let mut insecure_option = false;
        let mut server_certs = Vec::<ServerCerts>::new();

        for (name, value) in self.query_pairs() {
            match UrlOpt::from(name.as_ref()) {
                Some(UrlOpt::BaseDn) => {
                    builder.base_dn(&value);
                }
                Some(UrlOpt::Mechanism) => {
                    builder.mechanism(AuthMechanism::parse(&value)?);
                }
                Some(UrlOpt::FollowReferrals) => {
                    builder.follow_referrals(true);
                }
                Some(UrlOpt::Starttls) => {
                    starttls_option = true;
                }
                Some(UrlOpt::ConnectTimeoutSecs) => {
                    let secs: u64 = value
                        .parse()
                        .map_err(|e| LdapAuthError::conn_params(Box::new(e)))?;
                    builder.connect_timeout(Duration::from_secs(secs));
                }
                Some(UrlOpt::TlsCertificateDir) => {
                    server_certs.push(ServerCerts::Directory(value.to_string()));
                }
                Some(UrlOpt::TlsCertificateEnv) => {
                    server_certs.push(ServerCerts::Environment(value.to_string()));
                }
                Some(UrlOpt::TlsCertificateMozilla) => {
                    server_certs.push(ServerCerts::RootCertificates);
                }
                Some(UrlOpt::InsecureOmitServerCheck) => {
                    insecure_option = true;
                }
                None => {
                    return Err(LdapAuthError::UsageDetailed(format!(
                        "option '{name}' not supported",
                    )));
                }
            }
        }

        if use_ldaps && starttls_option {
            return Err(LdapAuthError::Usage(
                "'starttls' upgrades a plain connection and cannot be combined with 'ldaps'; \
                use 'ldap://...?starttls' instead",
            ));
        }

        if use_ldaps || starttls_option {
            if insecure_option {
                if !server_certs.is_empty() {
                    return Err(LdapAuthError::Usage(
                        "Use either the url-options 'tls_certificate_dir', 'tls_certificate_env' \
                        and 'use_mozillas_root_certificates' \
                        to specify the access to the server certificate, \
                        or use 'insecure_omit_server_certificate_check' to not verify the server's \
                        identity, which is not recommended in most situations",
                    ));
                }
                builder.tls_without_server_verification();
            } else {
                if server_certs.is_empty() {
                    return Err(LdapAuthError::Usage(
                        "Using 'ldaps' or 'starttls' requires at least one of the url-options \
                        'tls_certificate_dir', 'tls_certificate_env', \
                        'use_mozillas_root_certificates', or 'insecure_omit_server_certificate_check'",
                    ));
                }
                for cert in server_certs {
                    builder.tls_with(cert);
                }
            }
            if starttls_option {
                builder.starttls(true);
            }
        } else if insecure_option || !server_certs.is_empty() {
            return Err(LdapAuthError::Usage(
                "Using 'ldap' is not possible with any of the url-options \
                    'tls_certificate_dir', 'tls_certificate_env', \
                    'use_mozillas_root_certificates', or 'insecure_omit_server_certificate_check'; \
                    consider using 'ldaps' or the 'starttls' option instead",
            ));
        }

        Ok(builder)
    }
}
