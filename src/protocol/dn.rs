//! Distinguished-name helpers.

/// Extracts the value of the first `CN=<value>,` component of a
/// distinguished name.
///
/// The component's value must be non-empty and terminated by a comma;
/// a trailing `CN=...` without a comma does not count. The match is
/// case-sensitive. Returns the empty string if no such component exists.
///
/// ```rust
/// use ldap_auth::extract_common_name;
///
/// assert_eq!(
///     "mathematicians",
///     extract_common_name("CN=mathematicians,dc=example,dc=com"),
/// );
/// assert_eq!("", extract_common_name("dc=example,dc=com"));
/// ```
pub fn extract_common_name(distinguished_name: &str) -> &str {
    let mut rest = distinguished_name;
    while let Some(pos) = rest.find("CN=") {
        rest = &rest[pos + 3..];
        match rest.find(',') {
            Some(end) if end > 0 => return &rest[..end],
            // empty value; keep looking for a later component
            Some(_) => {}
            // no comma anywhere to the right, so no component can match
            None => break,
        }
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::extract_common_name;

    #[test]
    fn extracts_first_component() {
        assert_eq!(
            "mathematicians",
            extract_common_name("CN=mathematicians,dc=example,dc=com")
        );
        assert_eq!(
            "Alice",
            extract_common_name("CN=Alice,OU=People,DC=example,DC=com")
        );
        // only the first component is consulted
        assert_eq!("a", extract_common_name("CN=a,CN=b,dc=example"));
    }

    #[test]
    fn requires_terminating_comma() {
        assert_eq!("", extract_common_name("CN=mathematicians"));
        assert_eq!("", extract_common_name(""));
        assert_eq!("", extract_common_name("dc=example,dc=com"));
    }

    #[test]
    fn skips_empty_values() {
        assert_eq!("b", extract_common_name("CN=,CN=b,dc=example"));
        assert_eq!("", extract_common_name("CN=,dc=example"));
    }

    #[test]
    fn is_case_sensitive() {
        assert_eq!("", extract_common_name("cn=mathematicians,dc=example"));
    }
}
