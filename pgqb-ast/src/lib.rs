//! # pgqb-ast
//!
//! The untyped query and expression AST of the pgqb query builder.
//!
//! Every node is inert, immutable data that knows how to emit itself into
//! the token stream of `pgqb-core`. Dynamic invariants (argumentless
//! aggregates, window-name uniqueness, fetch-requires-offset, scalar
//! arity) are enforced by the checked constructors here; everything the
//! type system can rule out is ruled out one layer up, in `pgqb-builder`.

#![deny(missing_docs)]
#![deny(unused_imports)]

mod expression;
mod query;
mod types;
mod utils;

pub use self::{expression::*, query::*, types::*};
