//! UTF-16 offset helpers and lenient number parsing.
//!
//! The host page indexes strings in UTF-16 code units, so every offset that
//! leaves this crate is counted the same way.

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Longest prefix of `s` that fits in `units` UTF-16 code units.
///
/// Never splits a surrogate pair: a character that would straddle the limit
/// is dropped entirely.
pub fn utf16_prefix(s: &str, units: usize) -> &str {
    let mut used = 0;
    for (idx, ch) in s.char_indices() {
        let width = ch.len_utf16();
        if used + width > units {
            return &s[..idx];
        }
        used += width;
    }
    s
}

/// Shorten `s` to `limit` UTF-16 units, appending an ellipsis when cut.
pub fn truncate_with_ellipsis(s: &str, limit: usize) -> String {
    let prefix = utf16_prefix(s, limit);
    if prefix.len() == s.len() {
        s.to_string()
    } else {
        format!("{prefix}…")
    }
}

/// Parse the leading floating point number of `s`, ignoring leading
/// whitespace and any trailing garbage (`"12.5px"` parses as `12.5`).
///
/// Returns `None` when no number prefix exists.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;

    // Shrink until the candidate parses; handles inputs like "1e" or "3.-".
    (1..=end)
        .rev()
        .filter(|&len| s.is_char_boundary(len))
        .find_map(|len| s[..len].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse the leading integer of `s` (`"3px"` parses as `3`).
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['-', '+']));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_len_counts_surrogates() {
        assert_eq!(utf16_len("abc"), 3);
        assert_eq!(utf16_len("a😀"), 3);
        assert_eq!(utf16_len(""), 0);
    }

    #[test]
    fn test_utf16_prefix_does_not_split_pairs() {
        assert_eq!(utf16_prefix("hello", 3), "hel");
        assert_eq!(utf16_prefix("ab😀c", 3), "ab");
        assert_eq!(utf16_prefix("ab😀c", 4), "ab😀");
        assert_eq!(utf16_prefix("short", 100), "short");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc…");
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12.5"), Some(12.5));
        assert_eq!(parse_float_prefix("  -3.25px"), Some(-3.25));
        assert_eq!(parse_float_prefix("1e2"), Some(100.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("normal"), None);
        assert_eq!(parse_float_prefix(""), None);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("3"), Some(3));
        assert_eq!(parse_int_prefix("10rows"), Some(10));
        assert_eq!(parse_int_prefix("-1"), Some(-1));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix("-"), None);
    }
}
