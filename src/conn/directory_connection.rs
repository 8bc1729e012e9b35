use super::directory_link::{bind_failure, DirectoryLink, RC_REFERRAL, RC_SUCCESS};
use crate::{LdapAuthError, LdapAuthResult};
use ldap3::SearchEntry;
use secstr::SecUtf8;

/// Hop limit when chasing referrals, preventing referral loops.
pub(crate) const MAX_REFERRAL_HOPS: usize = 10;

/// How to re-establish the bind on a referred server.
///
/// Only populated when referral chasing is configured, and mirrors the
/// mechanism of the primary bind; a secret is only retained for simple
/// binds (dropped, and zeroed by way of `SecUtf8`, when the connection
/// goes away). Anonymous and GSSAPI binds are repeated without one.
pub(crate) enum Rebind {
    Anonymous,
    Simple {
        bind_dn: String,
        secret: SecUtf8,
    },
    #[cfg(feature = "gssapi")]
    Gssapi {
        server_fqdn: String,
    },
}

impl Rebind {
    fn apply(&self, link: &mut dyn DirectoryLink) -> LdapAuthResult<()> {
        let bound = match self {
            Rebind::Anonymous => link.simple_bind("", "")?,
            Rebind::Simple { bind_dn, secret } => link.simple_bind(bind_dn, secret.unsecure())?,
            #[cfg(feature = "gssapi")]
            Rebind::Gssapi { server_fqdn } => link.gssapi_bind(server_fqdn)?,
        };
        if bound.rc == RC_SUCCESS {
            Ok(())
        } else {
            Err(bind_failure(bound.rc, bound.text))
        }
    }
}

/// An open, bound connection to a directory server.
///
/// Obtained from [`DirectoryAuthenticator::connect_and_bind`](crate::DirectoryAuthenticator::connect_and_bind).
/// The connection unbinds when it is dropped; call [`close`](Self::close) to
/// release it explicitly.
pub struct DirectoryConnection {
    link: Box<dyn DirectoryLink>,
    rebind: Option<Rebind>,
    follow_referrals: bool,
    closed: bool,
}

impl DirectoryConnection {
    pub(crate) fn new(
        link: Box<dyn DirectoryLink>,
        rebind: Option<Rebind>,
        follow_referrals: bool,
    ) -> Self {
        Self {
            link,
            rebind,
            follow_referrals,
            closed: false,
        }
    }

    /// Unbinds and releases the connection.
    ///
    /// Failures while unbinding are logged at debug level and not returned;
    /// dropping the connection has the same effect.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.link.quiet_unbind();
        }
    }

    /// Searches the subtree below `base`, chasing referrals if configured.
    pub(crate) fn search_subtree(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[&str],
    ) -> LdapAuthResult<Vec<SearchEntry>> {
        let mut referred: Option<Box<dyn DirectoryLink>> = None;
        let mut search_base = base.to_string();
        let mut hops = 0_usize;

        let result = loop {
            let link: &mut dyn DirectoryLink = match referred {
                Some(ref mut l) => &mut **l,
                None => &mut *self.link,
            };
            let outcome = match link.search_subtree(&search_base, filter, attrs) {
                Ok(outcome) => outcome,
                Err(e) => break Err(e),
            };
            match outcome.rc {
                RC_SUCCESS | RC_REFERRAL
                    if self.follow_referrals
                        && outcome.entries.is_empty()
                        && !outcome.refs.is_empty() =>
                {
                    hops += 1;
                    if hops > MAX_REFERRAL_HOPS {
                        break Err(LdapAuthError::ReferralLimit(MAX_REFERRAL_HOPS));
                    }
                    let referral_url = &outcome.refs[0];
                    debug!("chasing referral to {referral_url}");
                    let (mut next, next_base) = match link.open_referral(referral_url) {
                        Ok(opened) => opened,
                        Err(e) => break Err(e),
                    };
                    if let Some(rebind) = &self.rebind {
                        if let Err(e) = rebind.apply(&mut *next) {
                            next.quiet_unbind();
                            break Err(e);
                        }
                    }
                    if let Some(base) = next_base {
                        search_base = base;
                    }
                    if let Some(mut previous) = referred.replace(next) {
                        previous.quiet_unbind();
                    }
                }
                RC_SUCCESS => break Ok(outcome.entries),
                rc => {
                    break Err(LdapAuthError::Directory {
                        code: rc,
                        text: outcome.text,
                    })
                }
            }
        };

        if let Some(mut link) = referred {
            link.quiet_unbind();
        }
        result
    }
}

impl Drop for DirectoryConnection {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DirectoryConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConnection")
            .field("follow_referrals", &self.follow_referrals)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Runs `op` on the connection and releases the connection on every exit
/// path, whether `op` succeeded or not.
pub(crate) fn run_scoped<T>(
    mut conn: DirectoryConnection,
    op: impl FnOnce(&mut DirectoryConnection) -> LdapAuthResult<T>,
) -> LdapAuthResult<T> {
    let result = op(&mut conn);
    conn.close();
    result
}
