//! The closed keyword set used by the serializer and the reserved-word
//! table that drives identifier quoting.

/// Expands to the [`Keyword`] enum and its string table.
///
/// **NOTE**: keep the list sorted; the reserved-word table relies on the
/// same convention to be able to match using binary search.
macro_rules! define_keywords {
    ( $( $keyword:ident ),* $(,)? ) => {
        /// A SQL keyword emitted by the serializer.
        ///
        /// The set is closed: every keyword the renderer can produce is a
        /// variant here, and each renders as its own name.
        #[allow(non_camel_case_types)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Keyword {
            $(
                #[allow(missing_docs)]
                $keyword
            ),*
        }

        impl Keyword {
            /// The rendered text of the keyword.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$keyword => stringify!($keyword)),*
                }
            }
        }

        impl ::core::fmt::Display for Keyword {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_keywords! {
    ABSENT,
    ALL,
    AND,
    ANY,
    ARRAY,
    AS,
    ASC,
    BETWEEN,
    BY,
    CASE,
    CAST,
    COLLATE,
    CROSS,
    CUBE,
    CURRENT,
    DESC,
    DISTINCT,
    ELSE,
    END,
    EXCEPT,
    EXCLUDE,
    EXISTS,
    FETCH,
    FILTER,
    FIRST,
    FOLLOWING,
    FOR,
    FROM,
    FULL,
    GROUP,
    GROUPING,
    GROUPS,
    HAVING,
    INNER,
    INTERSECT,
    JOIN,
    KEY,
    KEYS,
    LAST,
    LATERAL,
    LEFT,
    LIMIT,
    LOCKED,
    NEXT,
    NO,
    NOT,
    NOWAIT,
    NULL,
    NULLS,
    OF,
    OFFSET,
    ON,
    ONLY,
    ORDER,
    ORDINALITY,
    OTHERS,
    OVER,
    PARTITION,
    PRECEDING,
    RANGE,
    RIGHT,
    ROLLUP,
    ROW,
    ROWS,
    SELECT,
    SETS,
    SHARE,
    SKIP,
    THEN,
    TIES,
    UNBOUNDED,
    UNION,
    UNIQUE,
    UPDATE,
    USING,
    WHEN,
    WHERE,
    WINDOW,
    WITH,
    WITHIN,
    WITHOUT,
}

/// PostgreSQL reserved words, sorted for binary search.
///
/// Covers the fully reserved words plus the reserved-but-callable ones
/// from the keyword appendix; quoting is precautionary, so the wider set
/// is used.
pub(crate) const RESERVED_WORDS: &[&str] = &[
    "ALL",
    "ANALYSE",
    "ANALYZE",
    "AND",
    "ANY",
    "ARRAY",
    "AS",
    "ASC",
    "ASYMMETRIC",
    "AUTHORIZATION",
    "BINARY",
    "BOTH",
    "CASE",
    "CAST",
    "CHECK",
    "COLLATE",
    "COLLATION",
    "COLUMN",
    "CONCURRENTLY",
    "CONSTRAINT",
    "CREATE",
    "CROSS",
    "CURRENT_CATALOG",
    "CURRENT_DATE",
    "CURRENT_ROLE",
    "CURRENT_SCHEMA",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DEFAULT",
    "DEFERRABLE",
    "DESC",
    "DISTINCT",
    "DO",
    "ELSE",
    "END",
    "EXCEPT",
    "FALSE",
    "FETCH",
    "FOR",
    "FOREIGN",
    "FREEZE",
    "FROM",
    "FULL",
    "GRANT",
    "GROUP",
    "HAVING",
    "ILIKE",
    "IN",
    "INITIALLY",
    "INNER",
    "INTERSECT",
    "INTO",
    "IS",
    "ISNULL",
    "JOIN",
    "LATERAL",
    "LEADING",
    "LEFT",
    "LIKE",
    "LIMIT",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NATURAL",
    "NOT",
    "NOTNULL",
    "NULL",
    "OFFSET",
    "ON",
    "ONLY",
    "OR",
    "ORDER",
    "OUTER",
    "OVERLAPS",
    "PLACING",
    "PRIMARY",
    "REFERENCES",
    "RETURNING",
    "RIGHT",
    "SELECT",
    "SESSION_USER",
    "SIMILAR",
    "SOME",
    "SYMMETRIC",
    "SYSTEM_USER",
    "TABLE",
    "TABLESAMPLE",
    "THEN",
    "TO",
    "TRAILING",
    "TRUE",
    "UNION",
    "UNIQUE",
    "USER",
    "USING",
    "VARIADIC",
    "VERBOSE",
    "WHEN",
    "WHERE",
    "WINDOW",
    "WITH",
];

/// Returns true if `ident` collides with a reserved keyword.
///
/// Matching is case-insensitive; a bare `select` is just as ambiguous to
/// the SQL parser as `SELECT`.
pub fn is_reserved_word(ident: &str) -> bool {
    let upper = ident.to_ascii_uppercase();
    RESERVED_WORDS.binary_search(&upper.as_str()).is_ok()
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn reserved_words_are_sorted() {
        assert!(RESERVED_WORDS.iter().tuple_windows().all(|(a, b)| a < b));
    }

    #[test]
    fn reserved_word_lookup_is_case_insensitive() {
        assert!(is_reserved_word("select"));
        assert!(is_reserved_word("Select"));
        assert!(is_reserved_word("SELECT"));
        assert!(!is_reserved_word("selected"));
        assert!(!is_reserved_word("users"));
    }

    #[test]
    fn keyword_renders_as_its_name() {
        assert_eq!(Keyword::SELECT.to_string(), "SELECT");
        assert_eq!(Keyword::ORDINALITY.as_str(), "ORDINALITY");
    }
}
