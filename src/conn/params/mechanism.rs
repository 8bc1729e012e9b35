use crate::{LdapAuthError, LdapAuthResult};

/// The authentication mechanism used for the bind operation.
///
/// The string values are the mechanism names as they appear in connection
/// URLs (see [`url`](crate::url)).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum AuthMechanism {
    /// Anonymous bind; the login and the secret are not sent to the server.
    ///
    /// An authenticator configured with this mechanism reports success for
    /// any credentials the server lets read its tree, so it is only useful
    /// for membership lookups, never for verifying a password.
    None,
    /// Simple bind. The secret travels to the server in the bind request,
    /// so this should only be used on an encrypted channel.
    #[default]
    Simple,
    /// DIGEST-MD5 SASL bind. Historic (RFC 6331); not supported, configuring
    /// it yields [`LdapAuthError::UnsupportedMechanism`].
    DigestMd5,
    /// GSSAPI (Kerberos) SASL bind; requires the `gssapi` crate feature.
    Gssapi,
}

impl AuthMechanism {
    /// The mechanism name as used in connection URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Simple => "simple",
            Self::DigestMd5 => "DIGEST-MD5",
            Self::Gssapi => "GSSAPI",
        }
    }

    pub(crate) fn parse(value: &str) -> LdapAuthResult<Self> {
        match value {
            "none" => Ok(Self::None),
            "simple" => Ok(Self::Simple),
            "DIGEST-MD5" => Ok(Self::DigestMd5),
            "GSSAPI" => Ok(Self::Gssapi),
            _ => Err(LdapAuthError::UsageDetailed(format!(
                "unknown authentication mechanism '{value}'"
            ))),
        }
    }
}

impl std::fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::AuthMechanism;

    #[test]
    fn round_trips_mechanism_names() {
        for mechanism in [
            AuthMechanism::None,
            AuthMechanism::Simple,
            AuthMechanism::DigestMd5,
            AuthMechanism::Gssapi,
        ] {
            assert_eq!(mechanism, AuthMechanism::parse(mechanism.as_str()).unwrap());
        }
        assert!(AuthMechanism::parse("EXTERNAL").is_err());
    }
}
