//! Relative IRI resolution.
//!
//! Resolution follows a small subset of RFC 3986:
//!
//! | Reference | Result |
//! |-----------|--------|
//! | absolute (`scheme:...`) | unchanged |
//! | empty | the base |
//! | `#frag` | base + `#frag` |
//! | `?query` | base with its query replaced |
//! | `/path` | scheme and authority of the base + `/path` |
//! | anything else | base up to its last `/` or `:` + reference |
//!
//! Dot segments are not normalized.

/// Whether `iri` starts with a URI scheme.
pub fn is_absolute(iri: &str) -> bool {
    let mut chars = iri.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    for (_, c) in chars {
        match c {
            ':' => return true,
            c if c.is_ascii_alphanumeric() || c == '+' || c == '.' || c == '-' => {}
            _ => return false,
        }
    }
    false
}

/// Resolve `iri` against `base`.
///
/// Returns `None` when `iri` is relative and there is no base.
pub fn resolve_iri(iri: &str, base: Option<&str>) -> Option<String> {
    if is_absolute(iri) {
        return Some(iri.to_string());
    }
    let base = base?;
    let resolved = match iri.as_bytes().first() {
        None => base.to_string(),
        Some(b'#') => format!("{base}{iri}"),
        Some(b'?') => {
            let end = base.find('?').unwrap_or(base.len());
            format!("{}{iri}", &base[..end])
        }
        Some(b'/') => format!("{}{iri}", base_root(base)),
        Some(_) => {
            let end = base.rfind(['/', ':']).map(|i| i + 1).unwrap_or(0);
            format!("{}{iri}", &base[..end])
        }
    };
    Some(resolved)
}

/// Scheme, slashes and authority of `base`.
fn base_root(base: &str) -> &str {
    let bytes = base.as_bytes();
    let mut pos = 0;

    let scheme_len = bytes
        .iter()
        .take_while(|b| b.is_ascii_lowercase())
        .count();
    if scheme_len > 0 && bytes.get(scheme_len) == Some(&b':') {
        pos = scheme_len + 1;
        while bytes.get(pos) == Some(&b'/') {
            pos += 1;
        }
    }
    let authority = base[pos..].find('/').unwrap_or(base.len() - pos);
    &base[..pos + authority]
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://example.org/dir/file?q=1";

    #[test]
    fn test_absolute_unchanged() {
        assert_eq!(
            resolve_iri("urn:isbn:123", Some(BASE)).as_deref(),
            Some("urn:isbn:123")
        );
        assert_eq!(
            resolve_iri("http://other.org/x", None).as_deref(),
            Some("http://other.org/x")
        );
    }

    #[test]
    fn test_relative_without_base() {
        assert!(resolve_iri("x", None).is_none());
        assert!(resolve_iri("", None).is_none());
    }

    #[test]
    fn test_resolution_rules() {
        assert_eq!(resolve_iri("", Some(BASE)).as_deref(), Some(BASE));
        assert_eq!(
            resolve_iri("#frag", Some("http://example.org/a")).as_deref(),
            Some("http://example.org/a#frag")
        );
        assert_eq!(
            resolve_iri("?x=2", Some(BASE)).as_deref(),
            Some("http://example.org/dir/file?x=2")
        );
        assert_eq!(
            resolve_iri("/root", Some(BASE)).as_deref(),
            Some("http://example.org/root")
        );
        assert_eq!(
            resolve_iri("other", Some("http://example.org/dir/file")).as_deref(),
            Some("http://example.org/dir/other")
        );
    }

    #[test]
    fn test_scheme_detection() {
        assert!(is_absolute("mailto:me@ex.org"));
        assert!(!is_absolute("1abc:x"));
        assert!(!is_absolute("path/with:colon"));
        assert!(!is_absolute("relative"));
    }
}
