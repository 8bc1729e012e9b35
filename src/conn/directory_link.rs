use crate::{ConnectParams, LdapAuthError, LdapAuthResult};
use ldap3::{LdapConn, LdapConnSettings, Scope, SearchEntry};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use url::Url;

pub(crate) const RC_SUCCESS: u32 = 0;
pub(crate) const RC_REFERRAL: u32 = 10;
pub(crate) const RC_INVALID_CREDENTIALS: u32 = 49;
pub(crate) const RC_INSUFFICIENT_ACCESS_RIGHTS: u32 = 50;

/// Server response to a bind request.
pub(crate) struct BindOutcome {
    pub(crate) rc: u32,
    pub(crate) text: String,
    pub(crate) refs: Vec<String>,
}

/// Server response to a subtree search.
pub(crate) struct SearchOutcome {
    pub(crate) entries: Vec<SearchEntry>,
    pub(crate) rc: u32,
    pub(crate) text: String,
    pub(crate) refs: Vec<String>,
}

/// Maps a non-success bind result code to the matching error variant.
pub(crate) fn bind_failure(rc: u32, text: String) -> LdapAuthError {
    match rc {
        RC_INVALID_CREDENTIALS | RC_INSUFFICIENT_ACCESS_RIGHTS => {
            LdapAuthError::BindRejected { code: rc, text }
        }
        _ => LdapAuthError::Directory { code: rc, text },
    }
}

/// The low-level exchange with one directory server.
///
/// Production code uses [`LdapLink`]; tests substitute a scripted fake.
pub(crate) trait DirectoryLink {
    fn simple_bind(&mut self, bind_dn: &str, secret: &str) -> LdapAuthResult<BindOutcome>;

    #[cfg(feature = "gssapi")]
    fn gssapi_bind(&mut self, server_fqdn: &str) -> LdapAuthResult<BindOutcome>;

    fn search_subtree(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[&str],
    ) -> LdapAuthResult<SearchOutcome>;

    /// Opens a connection to the server a referral URL points at.
    ///
    /// Returns the new link and the search base embedded in the referral
    /// URL, if it carries one.
    fn open_referral(
        &self,
        referral_url: &str,
    ) -> LdapAuthResult<(Box<dyn DirectoryLink>, Option<String>)>;

    /// Unbinds and drops the connection; failures are logged, not returned.
    fn quiet_unbind(&mut self);
}

/// [`DirectoryLink`] over an `ldap3` connection.
pub(crate) struct LdapLink {
    ldap: LdapConn,
    settings: LdapConnSettings,
}

impl LdapLink {
    pub(crate) fn open(params: &ConnectParams) -> LdapAuthResult<Self> {
        let settings = Self::settings_for(params)?;
        Self::connect(settings, &params.conn_url())
    }

    fn settings_for(params: &ConnectParams) -> LdapAuthResult<LdapConnSettings> {
        let mut settings = LdapConnSettings::new();
        if let Some(timeout) = params.connect_timeout() {
            settings = settings.set_conn_timeout(timeout);
        }
        if params.is_starttls() {
            settings = settings.set_starttls(true);
        }
        match params.tls() {
            crate::Tls::Off => {}
            crate::Tls::Insecure => {
                warn!(
                    "TLS server certificate verification is disabled for {}",
                    params.addr()
                );
                settings = settings.set_no_tls_verify(true);
            }
            crate::Tls::Secure(_) => {
                settings = settings.set_config(Arc::new(params.rustls_clientconfig()?));
            }
        }
        Ok(settings)
    }

    fn connect(settings: LdapConnSettings, conn_url: &str) -> LdapAuthResult<Self> {
        debug!("connecting to {conn_url}");
        let ldap = LdapConn::with_settings(settings.clone(), conn_url)?;
        Ok(Self { ldap, settings })
    }
}

impl DirectoryLink for LdapLink {
    fn simple_bind(&mut self, bind_dn: &str, secret: &str) -> LdapAuthResult<BindOutcome> {
        let result = self.ldap.simple_bind(bind_dn, secret)?;
        Ok(BindOutcome {
            rc: result.rc,
            text: result.text,
            refs: result.refs,
        })
    }

    #[cfg(feature = "gssapi")]
    fn gssapi_bind(&mut self, server_fqdn: &str) -> LdapAuthResult<BindOutcome> {
        let result = self.ldap.sasl_gssapi_bind(server_fqdn)?;
        Ok(BindOutcome {
            rc: result.rc,
            text: result.text,
            refs: result.refs,
        })
    }

    fn search_subtree(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[&str],
    ) -> LdapAuthResult<SearchOutcome> {
        trace!("searching below {base} with filter {filter}");
        let ldap3::SearchResult(entries, result) =
            self.ldap.search(base, Scope::Subtree, filter, attrs)?;
        Ok(SearchOutcome {
            entries: entries.into_iter().map(SearchEntry::construct).collect(),
            rc: result.rc,
            text: result.text,
            refs: result.refs,
        })
    }

    fn open_referral(
        &self,
        referral_url: &str,
    ) -> LdapAuthResult<(Box<dyn DirectoryLink>, Option<String>)> {
        let parsed =
            Url::parse(referral_url).map_err(|e| LdapAuthError::conn_params(Box::new(e)))?;
        match parsed.scheme() {
            crate::url::LDAP | crate::url::LDAPS => {}
            other => {
                return Err(LdapAuthError::UsageDetailed(format!(
                    "referral to unsupported scheme '{other}'"
                )));
            }
        }

        // an LDAP URL may carry the referred search base in its path
        let base = match parsed.path().trim_start_matches('/') {
            "" => None,
            encoded => Some(
                percent_decode_str(encoded)
                    .decode_utf8()
                    .map_err(|e| LdapAuthError::conn_params(Box::new(e)))?
                    .into_owned(),
            ),
        };

        let conn_url = match parsed.port() {
            Some(port) => format!(
                "{}://{}:{port}",
                parsed.scheme(),
                parsed.host_str().unwrap_or_default()
            ),
            None => format!(
                "{}://{}",
                parsed.scheme(),
                parsed.host_str().unwrap_or_default()
            ),
        };
        let link = Self::connect(self.settings.clone(), &conn_url)?;
        Ok((Box::new(link), base))
    }

    fn quiet_unbind(&mut self) {
        if let Err(e) = self.ldap.unbind() {
            debug!("unbind failed: {e}");
        }
    }
}

impl std::fmt::Debug for LdapLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapLink").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_link {
    use super::{BindOutcome, DirectoryLink, SearchOutcome, RC_SUCCESS};
    use crate::LdapAuthResult;
    use ldap3::SearchEntry;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    /// What the fake server is supposed to answer, and what it has seen.
    #[derive(Default)]
    pub(crate) struct Script {
        pub(crate) bind_rc: u32,
        // per-call overrides; once drained, `bind_rc` applies
        pub(crate) bind_rcs: VecDeque<u32>,
        pub(crate) binds: Vec<(String, String)>,
        pub(crate) bind_refs: Vec<String>,
        pub(crate) searches: VecDeque<LdapAuthResult<SearchOutcome>>,
        pub(crate) search_bases: Vec<String>,
        pub(crate) search_filters: Vec<String>,
        pub(crate) unbinds: usize,
        pub(crate) referral_base: Option<String>,
        pub(crate) opened_referrals: Vec<String>,
    }

    /// A scripted stand-in for a directory server connection.
    ///
    /// Clones share the script, so a referral link opened from a `FakeLink`
    /// records into the same `Script`.
    #[derive(Clone)]
    pub(crate) struct FakeLink(pub(crate) Arc<Mutex<Script>>);

    impl FakeLink {
        pub(crate) fn new(script: Script) -> Self {
            Self(Arc::new(Mutex::new(script)))
        }
    }

    impl DirectoryLink for FakeLink {
        fn simple_bind(&mut self, bind_dn: &str, secret: &str) -> LdapAuthResult<BindOutcome> {
            let mut script = self.0.lock().unwrap();
            script.binds.push((bind_dn.to_string(), secret.to_string()));
            let rc = script.bind_rcs.pop_front().unwrap_or(script.bind_rc);
            Ok(BindOutcome {
                rc,
                text: String::new(),
                refs: script.bind_refs.clone(),
            })
        }

        #[cfg(feature = "gssapi")]
        fn gssapi_bind(&mut self, _server_fqdn: &str) -> LdapAuthResult<BindOutcome> {
            let mut script = self.0.lock().unwrap();
            let rc = script.bind_rcs.pop_front().unwrap_or(script.bind_rc);
            Ok(BindOutcome {
                rc,
                text: String::new(),
                refs: vec![],
            })
        }

        fn search_subtree(
            &mut self,
            base: &str,
            filter: &str,
            _attrs: &[&str],
        ) -> LdapAuthResult<SearchOutcome> {
            let mut script = self.0.lock().unwrap();
            script.search_bases.push(base.to_string());
            script.search_filters.push(filter.to_string());
            script.searches.pop_front().unwrap_or_else(empty_success)
        }

        fn open_referral(
            &self,
            referral_url: &str,
        ) -> LdapAuthResult<(Box<dyn DirectoryLink>, Option<String>)> {
            let mut script = self.0.lock().unwrap();
            script.opened_referrals.push(referral_url.to_string());
            let base = script.referral_base.clone();
            Ok((Box::new(self.clone()), base))
        }

        fn quiet_unbind(&mut self) {
            self.0.lock().unwrap().unbinds += 1;
        }
    }

    pub(crate) fn empty_success() -> LdapAuthResult<SearchOutcome> {
        Ok(SearchOutcome {
            entries: vec![],
            rc: RC_SUCCESS,
            text: String::new(),
            refs: vec![],
        })
    }

    pub(crate) fn found(entries: Vec<SearchEntry>) -> LdapAuthResult<SearchOutcome> {
        Ok(SearchOutcome {
            entries,
            rc: RC_SUCCESS,
            text: String::new(),
            refs: vec![],
        })
    }

    pub(crate) fn referred(refs: Vec<&str>) -> LdapAuthResult<SearchOutcome> {
        Ok(SearchOutcome {
            entries: vec![],
            rc: super::RC_REFERRAL,
            text: String::new(),
            refs: refs.into_iter().map(ToString::to_string).collect(),
        })
    }

    pub(crate) fn entry(dn: &str, attr: &str, values: &[&str]) -> SearchEntry {
        let mut attrs = HashMap::new();
        attrs.insert(
            attr.to_string(),
            values.iter().map(ToString::to_string).collect(),
        );
        SearchEntry {
            dn: dn.to_string(),
            attrs,
            bin_attrs: HashMap::new(),
        }
    }
}
