use core::fmt;

use pgqb_core::{Serializable, Special, Token};

/// A printed SQL type name.
///
/// Carried by `CAST` expressions and parameter registries. Names use the
/// spellings the server prints, so round-tripping through `pg_typeof` is
/// stable.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// `boolean`
    Boolean,
    /// `smallint`
    SmallInt,
    /// `integer`
    Integer,
    /// `bigint`
    BigInt,
    /// `real`
    Real,
    /// `double precision`
    DoublePrecision,
    /// `numeric`
    Numeric,
    /// `text`
    Text,
    /// `varchar`
    Varchar,
    /// `date`
    Date,
    /// `time`
    Time,
    /// `timestamp`
    Timestamp,
    /// `timestamptz`
    TimestampTz,
    /// `interval`
    Interval,
    /// `uuid`
    Uuid,
    /// `json`
    Json,
    /// `jsonb`
    Jsonb,
    /// `bytea`
    Bytea,
    /// `record`
    Record,
    /// An array of an element type, e.g. `integer[]`.
    Array(Box<DataType>),
    /// A named type outside the built-in registry: enums, domains, ranges,
    /// extension types.
    Custom(String),
}

impl Serializable for DataType {
    fn tokenize(&self, out: &mut Vec<Token>) {
        match self {
            DataType::Array(element) => {
                element.tokenize(out);
                out.push(Token::Special(Special::LeftBracket));
                out.push(Token::Special(Special::RightBracket));
            }
            DataType::DoublePrecision => {
                out.push(Token::ident("double"));
                out.push(Token::ident("precision"));
            }
            DataType::Custom(name) => out.push(Token::ident(name.clone())),
            other => out.push(Token::ident(other.base_name())),
        }
    }
}

impl DataType {
    fn base_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::SmallInt => "smallint",
            DataType::Integer => "integer",
            DataType::BigInt => "bigint",
            DataType::Real => "real",
            DataType::Numeric => "numeric",
            DataType::Text => "text",
            DataType::Varchar => "varchar",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::TimestampTz => "timestamptz",
            DataType::Interval => "interval",
            DataType::Uuid => "uuid",
            DataType::Json => "json",
            DataType::Jsonb => "jsonb",
            DataType::Bytea => "bytea",
            DataType::Record => "record",
            DataType::DoublePrecision | DataType::Array(_) | DataType::Custom(_) => {
                unreachable!("handled structurally in tokenize")
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn plain_names() {
        assert_eq!(DataType::Boolean.to_string(), "boolean");
        assert_eq!(DataType::TimestampTz.to_string(), "timestamptz");
        assert_eq!(DataType::DoublePrecision.to_string(), "double precision");
    }

    #[test]
    fn array_types_hug_their_brackets() {
        let ty = DataType::Array(Box::new(DataType::Integer));
        assert_eq!(ty.to_string(), "integer[]");

        let nested = DataType::Array(Box::new(ty));
        assert_eq!(nested.to_string(), "integer[][]");
    }

    #[test]
    fn custom_names_are_quoted_on_demand() {
        assert_eq!(DataType::Custom("mood".into()).to_string(), "mood");
        assert_eq!(
            DataType::Custom("user defined".into()).to_string(),
            "\"user defined\""
        );
    }
}
