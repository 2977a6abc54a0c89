//! The token IR and the `unlex` renderer.
//!
//! Serialization is a two-stage pipeline: every node emits tagged tokens in
//! output order, and [`unlex`] renders the stream to text. The spacing
//! rules live here and nowhere else, which keeps escaping and whitespace
//! concerns out of the AST.

use core::fmt;

use itertools::Itertools;

use crate::error::Error;
use crate::keywords::Keyword;
use crate::quote::{quote_identifier, quote_literal, validate_operator};

/// An optionally force-quoted SQL identifier.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ident {
    /// The identifier text, without quotes.
    pub value: String,
    /// When set, the identifier is quoted even if it could be emitted bare.
    pub force_quote: bool,
}

impl Ident {
    /// Creates an identifier that is quoted only when required.
    pub fn new(value: impl Into<String>) -> Self {
        Ident {
            value: value.into(),
            force_quote: false,
        }
    }

    /// Creates an identifier that is always quoted.
    pub fn quoted(value: impl Into<String>) -> Self {
        Ident {
            value: value.into(),
            force_quote: true,
        }
    }
}

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Ident::new(value)
    }
}

impl From<String> for Ident {
    fn from(value: String) -> Self {
        Ident::new(value)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_identifier(&self.value, self.force_quote))
    }
}

/// A SQL literal value.
///
/// Booleans and null render as lowercase words. Non-finite floats render
/// as quoted string literals (`'NaN'`, `'Infinity'`, `'-Infinity'`), which
/// PostgreSQL accepts as floating-point specials.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// An integer literal.
    Integer(i64),
    /// A floating-point literal.
    Float(f64),
    /// A single-quoted string literal.
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Boolean(true) => f.write_str("true"),
            Literal::Boolean(false) => f.write_str("false"),
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Float(v) if v.is_finite() => write!(f, "{}", v),
            Literal::Float(v) if v.is_nan() => f.write_str("'NaN'"),
            Literal::Float(v) if v.is_sign_positive() => f.write_str("'Infinity'"),
            Literal::Float(_) => f.write_str("'-Infinity'"),
            Literal::String(v) => f.write_str(&quote_literal(v)),
        }
    }
}

/// A SQL operator.
///
/// The built-in variants cover the operators the typed surface produces;
/// anything else goes through [`Operator::custom`], which applies the
/// safety validation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `||`
    Concat,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `not`
    Not,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `ILIKE`
    ILike,
    /// `NOT ILIKE`
    NotILike,
    /// `SIMILAR TO`
    SimilarTo,
    /// `NOT SIMILAR TO`
    NotSimilarTo,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
    /// `IS DISTINCT FROM`
    IsDistinctFrom,
    /// `IS NOT DISTINCT FROM`
    IsNotDistinctFrom,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// A validated operator outside the built-in set, e.g. `@>`.
    Custom(String),
}

impl Operator {
    /// Validates and wraps an operator outside the built-in set.
    pub fn custom(op: impl Into<String>) -> Result<Self, Error> {
        let op = op.into();
        validate_operator(&op)?;
        Ok(Operator::Custom(op))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Concat => "||",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "not",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotILike => "NOT ILIKE",
            Operator::SimilarTo => "SIMILAR TO",
            Operator::NotSimilarTo => "NOT SIMILAR TO",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::IsDistinctFrom => "IS DISTINCT FROM",
            Operator::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Custom(op) => op.as_str(),
        })
    }
}

/// Punctuation tokens.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Special {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `*`
    Asterisk,
    /// `,`
    Comma,
    /// `.`
    Period,
    /// `:`
    Colon,
}

impl Special {
    /// The rendered text of the punctuation mark.
    pub fn as_str(&self) -> &'static str {
        match self {
            Special::LeftParen => "(",
            Special::RightParen => ")",
            Special::LeftBracket => "[",
            Special::RightBracket => "]",
            Special::Asterisk => "*",
            Special::Comma => ",",
            Special::Period => ".",
            Special::Colon => ":",
        }
    }
}

impl fmt::Display for Special {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of the rendered token stream.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    /// A keyword from the closed set.
    Keyword(Keyword),
    /// An identifier, quoted on demand.
    Ident(Ident),
    /// A literal value.
    Literal(Literal),
    /// An operator.
    Operator(Operator),
    /// Punctuation.
    Special(Special),
    /// A qualified column reference, rendered `table.column` with each part
    /// quoted on demand.
    ColumnRef {
        /// The table alias part.
        table: Ident,
        /// The column part.
        column: Ident,
    },
    /// A positional placeholder, rendered `$n` (1-based).
    Parameter(u32),
}

impl Token {
    /// Shorthand for an on-demand-quoted identifier token.
    pub fn ident(value: impl Into<String>) -> Self {
        Token::Ident(Ident::new(value))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k),
            Token::Ident(ident) => write!(f, "{}", ident),
            Token::Literal(lit) => write!(f, "{}", lit),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Special(s) => write!(f, "{}", s),
            Token::ColumnRef { table, column } => write!(f, "{}.{}", table, column),
            Token::Parameter(index) => write!(f, "${}", index),
        }
    }
}

/// A node that can emit itself into the token stream.
///
/// [`Serializable::serialize`] is the whole rendering pipeline: `tokenize`
/// builds the stream, [`unlex`] turns it into text. Both are pure;
/// serialising the same node twice yields byte-identical output.
pub trait Serializable {
    /// Appends this node's tokens, in output order, to `out`.
    fn tokenize(&self, out: &mut Vec<Token>);

    /// Renders this node to SQL text.
    fn serialize(&self) -> String {
        let mut tokens = Vec::new();
        self.tokenize(&mut tokens);
        unlex(&tokens)
    }
}

/// Emits `items` separated by commas.
pub fn comma_separated<'a, T, I>(out: &mut Vec<Token>, items: I)
where
    T: Serializable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(Token::Special(Special::Comma));
        }
        item.tokenize(out);
    }
}

/// Renders a token stream to text.
///
/// A single space separates consecutive tokens, except:
/// no space after `(` or `[`; none before `)`, `]`, `,` or `.` (nor after
/// `.`); none between an identifier and a directly applied bracket
/// (function calls, array types); and none after the keywords `CAST`,
/// `ARRAY`, `ANY`, `ALL`, `ROLLUP`, `CUBE` and `SETS` when a bracketed
/// form follows.
pub fn unlex(tokens: &[Token]) -> String {
    let mut out = String::new();
    if let Some(first) = tokens.first() {
        out.push_str(&first.to_string());
    }
    for (prev, next) in tokens.iter().tuple_windows() {
        if needs_space(prev, next) {
            out.push(' ');
        }
        out.push_str(&next.to_string());
    }
    log::trace!("unlexed {} tokens into {} bytes", tokens.len(), out.len());
    out
}

fn needs_space(prev: &Token, next: &Token) -> bool {
    if let Token::Special(Special::LeftParen | Special::LeftBracket | Special::Period) = prev {
        return false;
    }
    if let Token::Special(
        Special::RightParen | Special::RightBracket | Special::Comma | Special::Period,
    ) = next
    {
        return false;
    }
    if matches!(
        next,
        Token::Special(Special::LeftParen | Special::LeftBracket)
    ) {
        if matches!(prev, Token::Ident(_) | Token::ColumnRef { .. }) {
            return false;
        }
        // subscript chains: `integer[][]`
        if matches!(prev, Token::Special(Special::RightBracket)) {
            return false;
        }
        if let Token::Keyword(k) = prev {
            if matches!(
                k,
                Keyword::CAST
                    | Keyword::ARRAY
                    | Keyword::ANY
                    | Keyword::ALL
                    | Keyword::ROLLUP
                    | Keyword::CUBE
                    | Keyword::SETS
            ) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(tokens: &[Token]) -> String {
        unlex(tokens)
    }

    #[test]
    fn spaces_between_plain_tokens() {
        let sql = render(&[
            Token::Keyword(Keyword::SELECT),
            Token::ident("users"),
            Token::Keyword(Keyword::AS),
            Token::ident("u"),
        ]);
        assert_eq!(sql, "SELECT users AS u");
    }

    #[test]
    fn no_space_inside_brackets_or_before_comma() {
        let sql = render(&[
            Token::Special(Special::LeftParen),
            Token::Literal(Literal::Integer(1)),
            Token::Special(Special::Comma),
            Token::Literal(Literal::Integer(2)),
            Token::Special(Special::RightParen),
        ]);
        assert_eq!(sql, "(1, 2)");
    }

    #[test]
    fn function_application_hugs_the_paren() {
        let sql = render(&[
            Token::ident("count"),
            Token::Special(Special::LeftParen),
            Token::Special(Special::Asterisk),
            Token::Special(Special::RightParen),
        ]);
        assert_eq!(sql, "count(*)");
    }

    #[test]
    fn bracketed_keywords_hug_their_bracket() {
        let sql = render(&[
            Token::Keyword(Keyword::ARRAY),
            Token::Special(Special::LeftBracket),
            Token::Literal(Literal::Integer(1)),
            Token::Special(Special::RightBracket),
        ]);
        assert_eq!(sql, "ARRAY[1]");

        let sql = render(&[
            Token::Keyword(Keyword::CAST),
            Token::Special(Special::LeftParen),
            Token::Literal(Literal::Integer(1)),
            Token::Keyword(Keyword::AS),
            Token::ident("boolean"),
            Token::Special(Special::RightParen),
        ]);
        assert_eq!(sql, "CAST(1 AS boolean)");
    }

    #[test]
    fn exists_keeps_its_space() {
        let sql = render(&[
            Token::Keyword(Keyword::EXISTS),
            Token::Special(Special::LeftParen),
            Token::Keyword(Keyword::SELECT),
            Token::Special(Special::RightParen),
        ]);
        assert_eq!(sql, "EXISTS (SELECT)");
    }

    #[test]
    fn column_refs_quote_on_demand() {
        let plain = Token::ColumnRef {
            table: Ident::new("users"),
            column: Ident::new("name"),
        };
        assert_eq!(render(&[plain]), "users.name");

        let quoted = Token::ColumnRef {
            table: Ident::new("user group"),
            column: Ident::new("select"),
        };
        assert_eq!(render(&[quoted]), "\"user group\".\"select\"");
    }

    #[test]
    fn parameters_render_positionally() {
        assert_eq!(render(&[Token::Parameter(3)]), "$3");
    }

    #[test]
    fn literals_render_lowercase_words() {
        assert_eq!(render(&[Token::Literal(Literal::Null)]), "null");
        assert_eq!(render(&[Token::Literal(Literal::Boolean(true))]), "true");
        assert_eq!(render(&[Token::Literal(Literal::String("it's".into()))]), "'it''s'");
    }

    #[test]
    fn non_finite_floats_become_string_literals() {
        assert_eq!(render(&[Token::Literal(Literal::Float(f64::NAN))]), "'NaN'");
        assert_eq!(
            render(&[Token::Literal(Literal::Float(f64::INFINITY))]),
            "'Infinity'"
        );
        assert_eq!(
            render(&[Token::Literal(Literal::Float(f64::NEG_INFINITY))]),
            "'-Infinity'"
        );
        assert_eq!(render(&[Token::Literal(Literal::Float(0.5))]), "0.5");
    }

    #[test]
    fn custom_operator_is_validated() {
        assert!(Operator::custom("@>").is_ok());
        assert!(Operator::custom("1; DROP").is_err());
    }
}
