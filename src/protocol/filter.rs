//! Search filter construction.

use std::borrow::Cow;

/// The multi-valued attribute that lists an entry's group memberships.
pub(crate) const GROUP_MEMBERSHIP_ATTR: &str = "memberOf";

// Principal lookup by account name: `(sAMAccountName=<login>)`, with the
// login escaped before splicing.
pub(crate) fn account_name_filter(login: &str) -> String {
    format!("(sAMAccountName={})", escape_filter_value(login))
}

/// Escapes the search-filter metacharacters (`*`, `(`, `)`, `\`, NUL) in a
/// value, per RFC 4515, so that the value can be spliced into a filter string
/// without acting as filter syntax.
///
/// Values without metacharacters are passed through unchanged (borrowed).
pub fn escape_filter_value(value: &str) -> Cow<'_, str> {
    ldap3::ldap_escape(value)
}

#[cfg(test)]
mod tests {
    use super::{account_name_filter, escape_filter_value};

    #[test]
    fn passes_clean_values_through() {
        assert_eq!("jdoe", escape_filter_value("jdoe"));
        assert_eq!("Max Mustermann", escape_filter_value("Max Mustermann"));
    }

    #[test]
    fn escapes_filter_metacharacters() {
        assert_eq!(
            r"\2a\28\29\5c\00",
            escape_filter_value("*()\\\0").to_lowercase()
        );
    }

    #[test]
    fn builds_the_principal_filter() {
        assert_eq!("(sAMAccountName=jdoe)", account_name_filter("jdoe"));
    }

    #[test]
    fn defuses_filter_injection() {
        let filter = account_name_filter("*)(objectClass=*");
        assert!(!filter.contains('*'));
        // exactly the two parentheses of the template survive
        assert_eq!(1, filter.matches('(').count());
        assert_eq!(1, filter.matches(')').count());
    }
}
