//! SQL text utility functions
//!
//! MySQL-flavoured quoting: backticks around identifiers, single quotes
//! around literals with embedded quotes doubled.

/// Characters that carry meaning inside a regular expression
const REGEX_METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Wrap an identifier in backticks
///
/// Purely syntactic: the name must already be a validated identifier.
pub fn quote_identifier(ident: &str) -> String {
    format!("`{}`", ident)
}

/// Escape a string so it can sit between single quotes
///
/// Every `'` is doubled. With `escape_backslashes` every `\` is doubled too,
/// for servers running without `NO_BACKSLASH_ESCAPES`.
///
/// # Example
///
/// ```
/// use filterql::utils::sql::escape_literal;
///
/// assert_eq!(escape_literal("O'Brien", false), "O''Brien");
/// assert_eq!(escape_literal(r"C:\tmp", true), r"C:\\tmp");
/// ```
pub fn escape_literal(s: &str, escape_backslashes: bool) -> String {
    if escape_backslashes {
        s.replace('\\', "\\\\").replace('\'', "''")
    } else {
        s.replace('\'', "''")
    }
}

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Apply before [`escape_literal`] when a value is embedded in a LIKE
/// pattern, so wildcards in the value match literally.
///
/// # Example
///
/// ```
/// use filterql::utils::sql::escape_like_pattern;
///
/// let pattern = format!("%{}%", escape_like_pattern("100% match_test"));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Escape and wrap a string literal in single quotes
pub fn quote_literal(s: &str, escape_backslashes: bool) -> String {
    format!("'{}'", escape_literal(s, escape_backslashes))
}

/// Backslash-escape regex metacharacters so a literal substring can be anchored
///
/// # Example
///
/// ```
/// use filterql::utils::sql::escape_regex;
///
/// assert_eq!(format!("^{}", escape_regex("v1.2")), r"^v1\.2");
/// ```
pub fn escape_regex(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if REGEX_METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("user_id"), "`user_id`");
        assert_eq!(quote_identifier("order"), "`order`");
    }

    #[test]
    fn test_escape_literal_no_special_chars() {
        assert_eq!(escape_literal("hello", false), "hello");
    }

    #[test]
    fn test_escape_literal_quotes() {
        assert_eq!(escape_literal("O'Brien", false), "O''Brien");
        assert_eq!(escape_literal("''", false), "''''");
    }

    #[test]
    fn test_escape_literal_backslash_untouched_by_default() {
        assert_eq!(escape_literal(r"a\b", false), r"a\b");
    }

    #[test]
    fn test_escape_literal_backslash_breakout() {
        // `\'` must not survive as an escaped quote
        assert_eq!(escape_literal(r"x\'", true), r"x\\''");
    }

    #[test]
    fn test_escape_like_pattern_no_special_chars() {
        assert_eq!(escape_like_pattern("hello"), "hello");
    }

    #[test]
    fn test_escape_like_pattern_wildcards() {
        assert_eq!(escape_like_pattern("100%"), "100\\%");
        assert_eq!(escape_like_pattern("foo_bar"), "foo\\_bar");
    }

    #[test]
    fn test_escape_like_pattern_backslash_first() {
        assert_eq!(escape_like_pattern("100%_\\test"), "100\\%\\_\\\\test");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("it's", false), "'it''s'");
        assert_eq!(quote_literal("", false), "''");
    }

    #[test]
    fn test_escape_regex_all_metacharacters() {
        assert_eq!(
            escape_regex(r".*+?^${}()|[]\"),
            r"\.\*\+\?\^\$\{\}\(\)\|\[\]\\"
        );
    }

    #[test]
    fn test_escape_regex_plain_text() {
        assert_eq!(escape_regex("abc_123 -"), "abc_123 -");
        assert_eq!(escape_regex(""), "");
    }
}
