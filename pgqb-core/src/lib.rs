//! # pgqb-core
//!
//! Lexical foundations of the pgqb query builder: the closed keyword set,
//! identifier and literal quoting, operator validation, the tagged token
//! IR, and the `unlex` renderer that turns a token stream into SQL text.
//!
//! Nothing in this crate knows about queries; it is the bottom layer the
//! AST and builder crates emit into.

#![deny(missing_docs)]
#![deny(unused_imports)]

mod error;
mod keywords;
mod quote;
mod tokens;
mod value;

pub use self::{
    error::Error,
    keywords::{is_reserved_word, Keyword},
    quote::{is_bare_identifier, quote_identifier, quote_literal, validate_operator},
    tokens::{comma_separated, unlex, Ident, Literal, Operator, Serializable, Special, Token},
    value::Value,
};
