//! Pure lexical helpers: identifier quoting, string-literal escaping and
//! operator validation.

use crate::error::Error;
use crate::keywords::is_reserved_word;

/// Characters permitted in a purely symbolic operator.
const OPERATOR_CHARS: &str = "+-*/<>=~!@#%^&|`?";

/// Keyword operators accepted verbatim, sorted for binary search.
const KEYWORD_OPERATORS: &[&str] = &[
    "AND",
    "COLLATE",
    "EXISTS",
    "ILIKE",
    "IN",
    "IS DISTINCT FROM",
    "IS NOT DISTINCT FROM",
    "IS NOT NULL",
    "IS NULL",
    "LIKE",
    "NOT",
    "NOT ILIKE",
    "NOT IN",
    "NOT LIKE",
    "NOT SIMILAR TO",
    "OR",
    "SIMILAR TO",
];

/// Returns true if `ident` can be emitted without quotes: it has the bare
/// identifier shape and does not collide with a reserved keyword.
pub fn is_bare_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return false;
    }
    !is_reserved_word(ident)
}

/// Renders an identifier, double-quoting unless it is bare-safe.
///
/// Interior `"` characters are doubled. With `force` set the identifier is
/// quoted unconditionally.
pub fn quote_identifier(ident: &str, force: bool) -> String {
    if !force && is_bare_identifier(ident) {
        return ident.to_owned();
    }
    let mut out = String::with_capacity(ident.len() + 2);
    out.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Renders a single-quoted string literal, doubling interior `'`.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Validates an operator string.
///
/// Accepted: a keyword operator from the closed whitelist (matched
/// case-insensitively), or a non-empty purely symbolic operator that
/// cannot open a comment (`--` and `/*` are always rejected).
pub fn validate_operator(op: &str) -> Result<(), Error> {
    let upper = op.to_ascii_uppercase();
    if KEYWORD_OPERATORS.binary_search(&upper.as_str()).is_ok() {
        return Ok(());
    }
    if !op.is_empty()
        && op.chars().all(|c| OPERATOR_CHARS.contains(c))
        && !op.contains("--")
        && !op.contains("/*")
    {
        return Ok(());
    }
    Err(Error::InvalidOperator(op.to_owned()))
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn keyword_operators_are_sorted() {
        assert!(KEYWORD_OPERATORS.iter().tuple_windows().all(|(a, b)| a < b));
    }

    #[test]
    fn bare_identifiers_stay_bare() {
        assert_eq!(quote_identifier("users", false), "users");
        assert_eq!(quote_identifier("_tmp$2", false), "_tmp$2");
        assert_eq!(quote_identifier("COUNT", false), "COUNT");
    }

    #[test]
    fn reserved_and_odd_identifiers_are_quoted() {
        assert_eq!(quote_identifier("select", false), "\"select\"");
        assert_eq!(quote_identifier("user group", false), "\"user group\"");
        assert_eq!(quote_identifier("1st", false), "\"1st\"");
        assert_eq!(quote_identifier("", false), "\"\"");
    }

    #[test]
    fn forced_identifiers_are_always_quoted() {
        assert_eq!(quote_identifier("users", true), "\"users\"");
    }

    #[test]
    fn interior_quotes_are_doubled() {
        assert_eq!(quote_identifier("a\"b", false), "\"a\"\"b\"");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn whitelisted_operators_pass() {
        assert!(validate_operator("IS DISTINCT FROM").is_ok());
        assert!(validate_operator("not ilike").is_ok());
        assert!(validate_operator("@>").is_ok());
        assert!(validate_operator("||").is_ok());
        assert!(validate_operator("?|").is_ok());
    }

    #[test]
    fn comment_openers_and_junk_are_rejected() {
        assert!(validate_operator("--").is_err());
        assert!(validate_operator("<--").is_err());
        assert!(validate_operator("/*").is_err());
        assert!(validate_operator("").is_err());
        assert!(validate_operator("DROP TABLE").is_err());
        assert!(validate_operator("= 1; --").is_err());
    }
}
