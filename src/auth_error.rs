use thiserror::Error;

/// A list specifying categories of errors that can occur while talking to a
/// directory server.
///
/// Errors propagate to the caller unmodified; the crate performs no retries
/// and no local recovery. Failures while *closing* a connection are swallowed
/// (logged at debug level) so that they never mask the primary result.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LdapAuthError {
    /// Erroneous connection parameters, e.g. from a malformed connection URL.
    #[error("Erroneous connection parameters")]
    ConnParams {
        /// The causing Error.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The directory server rejected the bind credentials.
    #[error("The directory server rejected the bind credentials (result code {code}): {text}")]
    BindRejected {
        /// The LDAP result code (49 = invalidCredentials, 50 = insufficientAccessRights).
        code: u32,
        /// The diagnostic message sent by the server.
        text: String,
    },

    /// Error occurred in communication with the directory server: network or
    /// TLS failures, timeouts, malformed protocol data.
    #[error("Error occurred in communication with the directory server")]
    Transport {
        /// The causing Error.
        #[from]
        source: ldap3::LdapError,
    },

    /// The directory server answered with a non-success result code.
    #[error("The directory server answered with result code {code}: {text}")]
    Directory {
        /// The LDAP result code.
        code: u32,
        /// The diagnostic message sent by the server.
        text: String,
    },

    /// Referral chasing exceeded the hop limit.
    #[error("Referral chasing exceeded the limit of {0} hops")]
    ReferralLimit(usize),

    /// The configured authentication mechanism is not available in this build.
    #[error("The authentication mechanism {0} is not supported")]
    UnsupportedMechanism(&'static str),

    /// Error occurred while reading trust anchors from the filesystem or the
    /// environment.
    #[error(transparent)]
    Io {
        /// The causing Error.
        #[from]
        source: std::io::Error,
    },

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    Usage(&'static str),

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    UsageDetailed(String),
}

/// Abbreviation of `Result<T, LdapAuthError>`.
pub type LdapAuthResult<T> = std::result::Result<T, LdapAuthError>;

impl LdapAuthError {
    /// Returns the server's result code, if the error carries one.
    ///
    /// This method helps in case you need programmatic access to the reason
    /// for a rejected bind or a failed search.
    pub fn server_code(&self) -> Option<u32> {
        match self {
            Self::BindRejected { code, .. } | Self::Directory { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Reveal the inner error.
    pub fn inner(&self) -> Option<&dyn std::error::Error> {
        match self {
            Self::ConnParams { source } => Some(&**source),
            Self::Transport { source } => Some(source),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }

    pub(crate) fn conn_params(error: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        Self::ConnParams { source: error }
    }
}
