use super::connect_params::{ServerCerts, Tls};
use crate::url::{self, LDAP, LDAPS};
use crate::AuthMechanism;
use std::time::Duration;

#[allow(clippy::too_many_arguments)]
pub(crate) fn format_as_url(
    addr: &str,
    base_dn: Option<&str>,
    mechanism: AuthMechanism,
    follow_referrals: bool,
    starttls: bool,
    connect_timeout: Option<Duration>,
    tls: &Tls,
    f: &mut std::fmt::Formatter,
) -> std::fmt::Result {
    write!(
        f,
        "{}://{}",
        match tls {
            Tls::Insecure | Tls::Secure(_) if !starttls => LDAPS,
            _ => LDAP,
        },
        addr,
    )?;

    let mut sep = std::iter::repeat(())
        .enumerate()
        .map(|(i, ())| if i == 0 { "?" } else { "&" });

    if let Some(dn) = base_dn {
        write!(f, "{}{}={dn}", sep.next().unwrap(), UrlOpt::BaseDn)?;
    }

    if mechanism != AuthMechanism::Simple {
        write!(f, "{}{}={mechanism}", sep.next().unwrap(), UrlOpt::Mechanism)?;
    }

    if follow_referrals {
        write!(f, "{}{}", sep.next().unwrap(), UrlOpt::FollowReferrals)?;
    }

    if starttls {
        write!(f, "{}{}", sep.next().unwrap(), UrlOpt::Starttls)?;
    }

    if let Some(timeout) = connect_timeout {
        write!(
            f,
            "{}{}={}",
            sep.next().unwrap(),
            UrlOpt::ConnectTimeoutSecs,
            timeout.as_secs()
        )?;
    }

    match tls {
        Tls::Off => {}
        Tls::Insecure => {
            write!(
                f,
                "{}{}",
                sep.next().unwrap(),
                UrlOpt::InsecureOmitServerCheck
            )?;
        }
        Tls::Secure(server_certs) => {
            for sc in server_certs {
                match sc {
                    ServerCerts::Directory(s) => {
                        write!(
                            f,
                            "{}{}={s}",
                            sep.next().unwrap(),
                            UrlOpt::TlsCertificateDir
                        )?;
                    }
                    ServerCerts::Environment(s) => {
                        write!(
                            f,
                            "{}{}={s}",
                            sep.next().unwrap(),
                            UrlOpt::TlsCertificateEnv
                        )?;
                    }
                    ServerCerts::RootCertificates => {
                        write!(
                            f,
                            "{}{}",
                            sep.next().unwrap(),
                            UrlOpt::TlsCertificateMozilla
                        )?;
                    }
                    ServerCerts::Direct(_s) => {
                        panic!("NOT SUPPORTED IN URLs");
                    }
                }
            }
        }
    }

    Ok(())
}

pub(crate) enum UrlOpt {
    BaseDn,
    Mechanism,
    FollowReferrals,
    Starttls,
    ConnectTimeoutSecs,
    TlsCertificateDir,
    TlsCertificateEnv,
    TlsCertificateMozilla,
    InsecureOmitServerCheck,
}

impl UrlOpt {
    pub fn from(s: &str) -> Option<Self> {
        match s {
            url::BASE_DN => Some(UrlOpt::BaseDn),
            url::MECHANISM => Some(UrlOpt::Mechanism),
            url::FOLLOW_REFERRALS => Some(UrlOpt::FollowReferrals),
            url::STARTTLS => Some(UrlOpt::Starttls),
            url::CONNECT_TIMEOUT_SECS => Some(UrlOpt::ConnectTimeoutSecs),
            url::TLS_CERTIFICATE_DIR => Some(UrlOpt::TlsCertificateDir),
            url::TLS_CERTIFICATE_ENV => Some(UrlOpt::TlsCertificateEnv),
            url::USE_MOZILLAS_ROOT_CERTIFICATES => Some(UrlOpt::TlsCertificateMozilla),
            url::INSECURE_OMIT_SERVER_CERTIFICATE_CHECK => Some(UrlOpt::InsecureOmitServerCheck),
            _ => None,
        }
    }
}

impl std::fmt::Display for UrlOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                UrlOpt::BaseDn => url::BASE_DN,
                UrlOpt::Mechanism => url::MECHANISM,
                UrlOpt::FollowReferrals => url::FOLLOW_REFERRALS,
                UrlOpt::Starttls => url::STARTTLS,
                UrlOpt::ConnectTimeoutSecs => url::CONNECT_TIMEOUT_SECS,
                UrlOpt::TlsCertificateDir => url::TLS_CERTIFICATE_DIR,
                UrlOpt::TlsCertificateEnv => url::TLS_CERTIFICATE_ENV,
                UrlOpt::TlsCertificateMozilla => url::USE_MOZILLAS_ROOT_CERTIFICATES,
                UrlOpt::InsecureOmitServerCheck => url::INSECURE_OMIT_SERVER_CERTIFICATE_CHECK,
            }
        )
    }
}
