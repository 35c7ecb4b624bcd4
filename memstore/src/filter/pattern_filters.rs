use crate::common::Value;
use crate::errors::StoreResult;
use regex::{Regex, RegexBuilder};

use super::filter_error;

/// Translates a SQL LIKE pattern into an unanchored regular expression.
///
/// `%` matches any run of characters and `_` any single character. A
/// backslash makes the following character literal. Every other character
/// is matched literally.
pub(crate) fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => regex.push_str(&regex::escape(&escaped.to_string())),
                None => regex.push_str(r"\\"),
            },
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex
}

/// Compiles a LIKE pattern.
pub(crate) fn compile_like(pattern: &str, case_insensitive: bool) -> StoreResult<Regex> {
    let regex = RegexBuilder::new(&like_to_regex(pattern))
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()?;
    Ok(regex)
}

/// Compiles the operand of a `regexp` condition.
///
/// Both a bare pattern and the `/pattern/flags` form are accepted; the
/// flags `i`, `m` and `s` are honoured and `g` is ignored.
pub(crate) fn compile_regexp(pattern: &str, case_insensitive: bool) -> StoreResult<Regex> {
    let (body, flags) = match split_flags(pattern) {
        Some((body, flags)) => (body, flags),
        None => (pattern, ""),
    };

    let mut builder = RegexBuilder::new(body);
    builder.case_insensitive(case_insensitive || flags.contains('i'));
    builder.multi_line(flags.contains('m'));
    builder.dot_matches_new_line(flags.contains('s'));

    if let Some(unknown) = flags.chars().find(|c| !"imsg".contains(*c)) {
        return Err(filter_error(&format!(
            "Unsupported regular expression flag '{}' in {}",
            unknown, pattern
        )));
    }
    Ok(builder.build()?)
}

fn split_flags(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let flags = &rest[end + 1..];
    if flags.chars().all(|c| c.is_ascii_alphabetic()) {
        Some((&rest[..end], flags))
    } else {
        None
    }
}

/// Tests a value against a regular expression. Only string values can
/// match.
pub(crate) fn test_regex(regex: &Regex, value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => regex.is_match(s),
        _ => false,
    }
}

/// Tests a LIKE condition. Scalars are matched through their text form; a
/// missing value never matches `like` and always matches `nlike`.
pub(crate) fn test_like(regex: &Regex, negate: bool, value: Option<&Value>) -> bool {
    let matched = match value {
        None | Some(Value::Null) => false,
        Some(Value::Document(_)) | Some(Value::Array(_)) => false,
        Some(Value::String(s)) => regex.is_match(s),
        Some(other) => regex.is_match(&other.to_text()),
    };
    matched != negate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_translation() {
        assert_eq!(like_to_regex("%St%"), ".*St.*");
        assert_eq!(like_to_regex("a_c"), "a.c");
        assert_eq!(like_to_regex("1.5*"), r"1\.5\*");
        assert_eq!(like_to_regex(r"100\%"), "100%");
        assert_eq!(like_to_regex(r"a\_b"), "a_b");
        assert_eq!(like_to_regex("(x)"), r"\(x\)");
    }

    #[test]
    fn test_like_is_unanchored() {
        let regex = compile_like("%St%", false).unwrap();
        assert!(test_like(&regex, false, Some(&Value::from("Stuart Sutcliffe"))));
        assert!(test_like(&regex, false, Some(&Value::from("Ringo Starr"))));
        assert!(!test_like(&regex, false, Some(&Value::from("John Lennon"))));

        let regex = compile_like("M%XY", false).unwrap();
        for name in ["John Lennon", "Paul McCartney", "George Harrison"] {
            assert!(!test_like(&regex, false, Some(&Value::from(name))));
        }
    }

    #[test]
    fn test_like_escapes() {
        let regex = compile_like(r"50\%", false).unwrap();
        assert!(test_like(&regex, false, Some(&Value::from("save 50% now"))));
        assert!(!test_like(&regex, false, Some(&Value::from("save 500 now"))));

        let regex = compile_like("a.b", false).unwrap();
        assert!(!test_like(&regex, false, Some(&Value::from("axb"))));
    }

    #[test]
    fn test_ilike_and_negation() {
        let regex = compile_like("%st%", true).unwrap();
        assert!(test_like(&regex, false, Some(&Value::from("Ringo Starr"))));
        assert!(!test_like(&regex, true, Some(&Value::from("Ringo Starr"))));
        assert!(test_like(&regex, true, None));
        assert!(!test_like(&regex, false, None));
    }

    #[test]
    fn test_like_on_numbers_uses_text() {
        let regex = compile_like("4_", false).unwrap();
        assert!(test_like(&regex, false, Some(&Value::I64(42))));
    }

    #[test]
    fn test_regexp_flags() {
        let regex = compile_regexp("/^j/i", false).unwrap();
        assert!(test_regex(&regex, Some(&Value::from("John"))));

        let regex = compile_regexp("^j", true).unwrap();
        assert!(test_regex(&regex, Some(&Value::from("John"))));

        let regex = compile_regexp("^J", false).unwrap();
        assert!(!test_regex(&regex, Some(&Value::from("john"))));
        assert!(!test_regex(&regex, Some(&Value::I64(1))));
        assert!(!test_regex(&regex, None));

        assert!(compile_regexp("/x/q", false).is_err());
    }

    #[test]
    fn test_regexp_with_slashes_in_body() {
        let regex = compile_regexp("/a\\/b/", false).unwrap();
        assert!(test_regex(&regex, Some(&Value::from("a/b"))));
        let regex = compile_regexp("a/b", false).unwrap();
        assert!(test_regex(&regex, Some(&Value::from("xa/by"))));
    }
}
