//! # pgqb
//!
//! A statically-typed `SELECT` builder for PostgreSQL. Queries are
//! ordinary values assembled through a staged, phantom-typed surface and
//! rendered into SQL text plus a positional parameter vector for a
//! prepared-statement driver.
//!
//! ```
//! use pgqb::{not, Bool, Int4, JoinExt, Params, SelectExt, Serializable, Text};
//!
//! pgqb::table! {
//!     pub struct Posts as "posts" {
//!         id: Int4,
//!         name: Text,
//!         deleted: Bool,
//!     }
//!
//!     pub struct UserPost as "user_post" {
//!         user_id: Int4,
//!         post_id: Int4,
//!     }
//! }
//!
//! pgqb::parameters! {
//!     pub struct FeedParams: FeedValues {
//!         user_id: Int4,
//!     }
//! }
//!
//! let params = FeedParams::declare();
//! let query = Posts::table()
//!     .alias("s")
//!     .inner_join(UserPost::table().alias("up"), |(s, up)| {
//!         s.id().eq(up.post_id())
//!     })
//!     .select(|(s, _)| (s.id().label("id"), s.name().label("name")))
//!     .filter(|(s, up)| not(s.deleted()).and(up.user_id().eq(params.user_id.clone())));
//!
//! assert_eq!(
//!     query.serialize(),
//!     "SELECT s.id AS id, s.name AS name \
//!      FROM (posts AS s INNER JOIN user_post AS up ON (s.id = up.post_id)) \
//!      WHERE ((not s.deleted) AND (up.user_id = $1))"
//! );
//!
//! let values = FeedParams::pack(FeedValues { user_id: 7 });
//! assert_eq!(values.len(), 1);
//! ```
//!
//! The layering mirrors the crates: `pgqb-core` owns tokens, quoting and
//! rendering; `pgqb-ast` owns the untyped clause and expression records;
//! `pgqb-builder` owns the typed construction surface re-exported here.

#![deny(missing_docs)]
#![deny(unused_imports)]

pub use pgqb_ast as ast;
pub use pgqb_builder as builder;
pub use pgqb_core as core;

pub use pgqb_builder::{exprs, parameters, sql_type, table};

#[doc(no_inline)]
pub use pgqb_builder::{
    abs, aggregate, aggregate_star, all_of, any_of, array, array_agg, avg, bool_and, bool_or,
    case_when, char_length, coalesce, composite, constant, count, count_star, dense_rank, exists,
    field, first_value, from_function, from_subquery, func, json_array_agg, json_object_agg, lag,
    last_value, lead, lower, max, min, mode, not, now, ntile, null, ordered_set_aggregate,
    percentile_cont, percentile_disc, rank, row, row_number, string_agg, sum, upper, uuid,
    window_function,
};

#[doc(no_inline)]
pub use pgqb_builder::{
    Aggregate, AliasedTable, AnyExpr, Array, BaseTable, BaseType, Bool, BoolLike, Bytea, CaseWhen,
    CompatibleWith, DataType, Date, Error, Expr, FilteredWindowFunction, Float4, Float8, Frame,
    FrameEnd, FrameExclusion, FrameKind, FrameStart, FromClause, GroupElement, GroupSet, Int2,
    Int4, Int8, Intact, Interval, IntoConstant, IntoExpr, IntoFrom, IntoSubquery, Json,
    JsonArrayAggregate, JsonObjectAggregate, Jsonb, JoinExt, Labeled, Lock, LockAllowed,
    LockForbidden, LockPolicy, MultiRange, Nullability, Nullable, Nulled, Numeric, Operator,
    OrderSpec, OrderedSet, OrderedSetAggregate, OrdinalTableFunction, ParameterMap, Params, Query,
    QuantifiedOperand, Range, RangeElement, Record, Row, SelectExt, Selection, Serializable,
    SqlNumber, SqlOrd, SqlText, SqlType, StarAggregate, Table, TableFunction, Text, Time,
    Timestamp, TimestampTz, Uuid, Value, VarChar, WindowFunction, WindowSpec,
};
