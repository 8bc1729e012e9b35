use super::directory_connection::{run_scoped, DirectoryConnection, Rebind, MAX_REFERRAL_HOPS};
use super::directory_link::{
    bind_failure, BindOutcome, DirectoryLink, LdapLink, RC_REFERRAL, RC_SUCCESS,
};
use crate::protocol::{account_name_filter, extract_common_name, GROUP_MEMBERSHIP_ATTR};
use crate::{AuthMechanism, ConnectParams, IntoConnectParams, LdapAuthError, LdapAuthResult};
use secstr::SecUtf8;
use std::collections::HashSet;

/// Authenticates users against a directory server.
///
/// A `DirectoryAuthenticator` holds nothing but its immutable
/// [`ConnectParams`]; every operation opens its own connection, binds, and
/// releases the connection before returning. A single instance can therefore
/// be shared freely across threads.
#[derive(Clone, Debug)]
pub struct DirectoryAuthenticator {
    params: ConnectParams,
}

impl DirectoryAuthenticator {
    /// Creates a new authenticator from connect parameters, a URL, or a
    /// `ConnectParamsBuilder` (see [`IntoConnectParams`]).
    pub fn new<P: IntoConnectParams>(params: P) -> LdapAuthResult<Self> {
        Ok(Self {
            params: params.into_connect_params()?,
        })
    }

    /// Exposes the connect parameters.
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Verifies the credentials by opening a connection and binding.
    ///
    /// Returns `Ok(true)` if the directory server accepted the credentials.
    /// A failure is always reported as an error, never as `false`;
    /// rejected credentials show up as [`LdapAuthError::BindRejected`].
    pub fn authenticate(&self, login: &str, secret: &SecUtf8) -> LdapAuthResult<bool> {
        run_scoped(self.connect_and_bind(login, secret)?, |_| Ok(true))
    }

    /// Verifies the credentials and additionally checks that the user is a
    /// member of a group whose common name equals `group_name`.
    pub fn authenticate_member_of(
        &self,
        login: &str,
        secret: &SecUtf8,
        group_name: &str,
    ) -> LdapAuthResult<bool> {
        run_scoped(self.connect_and_bind(login, secret)?, |conn| {
            self.is_member_of(conn, login, group_name)
        })
    }

    /// Opens a connection and binds with the given credentials.
    ///
    /// With an empty `login`, the configured base DN is used as the bind
    /// identity. On any failure after the socket is open the connection is
    /// quietly unbound before the error propagates.
    pub fn connect_and_bind(
        &self,
        login: &str,
        secret: &SecUtf8,
    ) -> LdapAuthResult<DirectoryConnection> {
        let link = LdapLink::open(&self.params)?;
        self.bind_on(Box::new(link), login, secret)
    }

    fn bind_on(
        &self,
        mut link: Box<dyn DirectoryLink>,
        login: &str,
        secret: &SecUtf8,
    ) -> LdapAuthResult<DirectoryConnection> {
        match self.try_bind(&mut link, login, secret) {
            Ok(()) => Ok(DirectoryConnection::new(
                link,
                self.rebind_for(login, secret),
                self.params.follow_referrals(),
            )),
            Err(e) => {
                link.quiet_unbind();
                Err(e)
            }
        }
    }

    /// Binds with the configured mechanism, chasing bind-time referrals if
    /// configured.
    fn try_bind(
        &self,
        link: &mut Box<dyn DirectoryLink>,
        login: &str,
        secret: &SecUtf8,
    ) -> LdapAuthResult<()> {
        let mut hops = 0_usize;
        loop {
            let outcome = self.bind_once(link, login, secret)?;
            match outcome.rc {
                RC_SUCCESS => break Ok(()),
                RC_REFERRAL if self.params.follow_referrals() && !outcome.refs.is_empty() => {
                    hops += 1;
                    if hops > MAX_REFERRAL_HOPS {
                        break Err(LdapAuthError::ReferralLimit(MAX_REFERRAL_HOPS));
                    }
                    debug!("bind referred to {}", outcome.refs[0]);
                    let (next, _) = link.open_referral(&outcome.refs[0])?;
                    link.quiet_unbind();
                    *link = next;
                }
                rc => break Err(bind_failure(rc, outcome.text)),
            }
        }
    }

    fn bind_once(
        &self,
        link: &mut Box<dyn DirectoryLink>,
        login: &str,
        secret: &SecUtf8,
    ) -> LdapAuthResult<BindOutcome> {
        match self.params.mechanism() {
            AuthMechanism::None => link.simple_bind("", ""),
            AuthMechanism::Simple => link.simple_bind(self.bind_identity(login), secret.unsecure()),
            AuthMechanism::DigestMd5 => Err(LdapAuthError::UnsupportedMechanism("DIGEST-MD5")),
            #[cfg(feature = "gssapi")]
            AuthMechanism::Gssapi => link.gssapi_bind(self.params.host()),
            #[cfg(not(feature = "gssapi"))]
            AuthMechanism::Gssapi => Err(LdapAuthError::UnsupportedMechanism("GSSAPI")),
        }
    }

    // the rebind on a referred server mirrors the primary bind's mechanism;
    // only a simple bind keeps hold of the secret
    fn rebind_for(&self, login: &str, secret: &SecUtf8) -> Option<Rebind> {
        if !self.params.follow_referrals() {
            return None;
        }
        match self.params.mechanism() {
            AuthMechanism::None => Some(Rebind::Anonymous),
            AuthMechanism::Simple => Some(Rebind::Simple {
                bind_dn: self.bind_identity(login).to_string(),
                secret: secret.clone(),
            }),
            #[cfg(feature = "gssapi")]
            AuthMechanism::Gssapi => Some(Rebind::Gssapi {
                server_fqdn: self.params.host().to_string(),
            }),
            // these mechanisms never produce a bound connection
            #[cfg(not(feature = "gssapi"))]
            AuthMechanism::Gssapi => None,
            AuthMechanism::DigestMd5 => None,
        }
    }

    // the empty login binds as the configured base DN
    fn bind_identity<'a>(&'a self, login: &'a str) -> &'a str {
        if login.is_empty() {
            self.params.base_dn()
        } else {
            login
        }
    }

    /// Checks whether any group of the account has `group_name` as its
    /// common name.
    fn is_member_of(
        &self,
        conn: &mut DirectoryConnection,
        login: &str,
        group_name: &str,
    ) -> LdapAuthResult<bool> {
        Ok(self
            .list_groups(conn, login)?
            .iter()
            .any(|dn| extract_common_name(dn) == group_name))
    }

    /// Fetches the group DNs of the account, from the first matching entry.
    fn list_groups(
        &self,
        conn: &mut DirectoryConnection,
        login: &str,
    ) -> LdapAuthResult<HashSet<String>> {
        let filter = account_name_filter(login);
        let entries =
            conn.search_subtree(self.params.base_dn(), &filter, &[GROUP_MEMBERSHIP_ATTR])?;
        let Some(entry) = entries.into_iter().next() else {
            return Ok(HashSet::new());
        };
        Ok(entry
            .attrs
            .get(GROUP_MEMBERSHIP_ATTR)
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default())
    }
}
