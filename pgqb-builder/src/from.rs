//! The from-clause algebra: base tables, table functions, subqueries and
//! joins, with row-handle tuples threaded through the `ON` callbacks.

use core::marker::PhantomData;

use pgqb_ast as ast;
use pgqb_core::Ident;

use crate::expr::{AnyExpr, Expr};
use crate::table::{Row, Table};
use crate::types::BoolLike;

/// A fully-formed `FROM` clause carrying its row handles.
pub struct FromClause<R: Row> {
    pub(crate) node: ast::FromNode,
    pub(crate) row: R,
}

/// A table reference that may still be aliased.
pub struct BaseTable<T: Table> {
    marker: PhantomData<fn() -> T>,
}

impl<T: Table> BaseTable<T> {
    #[doc(hidden)]
    pub fn new() -> Self {
        BaseTable {
            marker: PhantomData,
        }
    }

    /// `real_name AS alias`. A table may be aliased once; the returned
    /// reference has no further `alias` method.
    pub fn alias(self, alias: &'static str) -> AliasedTable<T> {
        AliasedTable {
            alias,
            marker: self.marker,
        }
    }
}

impl<T: Table> Default for BaseTable<T> {
    fn default() -> Self {
        BaseTable::new()
    }
}

/// An aliased table reference; cannot be re-aliased.
pub struct AliasedTable<T: Table> {
    alias: &'static str,
    marker: PhantomData<fn() -> T>,
}

/// Conversion into a `FROM` node with its row handles.
pub trait IntoFrom {
    /// The row handles exposed to clause callbacks.
    type Row: Row;

    /// Builds the from-clause.
    fn into_from(self) -> FromClause<Self::Row>;
}

impl<T: Table> IntoFrom for BaseTable<T> {
    type Row = T;

    fn into_from(self) -> FromClause<T> {
        FromClause {
            node: ast::FromNode::Table(ast::TableNode {
                name: Ident::new(T::NAME),
                alias: None,
            }),
            row: T::handle(T::NAME),
        }
    }
}

impl<T: Table> IntoFrom for AliasedTable<T> {
    type Row = T;

    fn into_from(self) -> FromClause<T> {
        FromClause {
            node: ast::FromNode::Table(ast::TableNode {
                name: Ident::new(T::NAME),
                alias: Some(Ident::new(self.alias)),
            }),
            row: T::handle(self.alias),
        }
    }
}

impl<R: Row> IntoFrom for FromClause<R> {
    type Row = R;

    fn into_from(self) -> FromClause<R> {
        self
    }
}

fn join<R1, R2, B, P>(
    left: FromClause<R1>,
    right: FromClause<R2>,
    kind: ast::JoinKind,
    lateral: bool,
    on: P,
) -> FromClause<(R1, R2)>
where
    R1: Row,
    R2: Row,
    B: BoolLike,
    P: FnOnce(&(R1, R2)) -> Expr<B>,
{
    let row = (left.row, right.row);
    let predicate = on(&row);
    FromClause {
        node: ast::FromNode::Join(Box::new(ast::JoinNode {
            left: left.node,
            kind,
            lateral,
            right: right.node,
            on: Some(predicate.into_ast()),
        })),
        row,
    }
}

fn cross<R1: Row, R2: Row>(
    left: FromClause<R1>,
    right: FromClause<R2>,
    lateral: bool,
) -> FromClause<(R1, R2)> {
    FromClause {
        node: ast::FromNode::Join(Box::new(ast::JoinNode {
            left: left.node,
            kind: ast::JoinKind::Cross,
            lateral,
            right: right.node,
            on: None,
        })),
        row: (left.row, right.row),
    }
}

/// Join constructors, available on anything that can become a `FROM` node.
///
/// The `ON` callback receives the joined handle pair; on the outer side of
/// an outer join the handle's columns are presented as nullable.
pub trait JoinExt: IntoFrom + Sized {
    /// `( left INNER JOIN right ON predicate )`
    fn inner_join<F, B, P>(self, right: F, on: P) -> FromClause<(Self::Row, F::Row)>
    where
        F: IntoFrom,
        B: BoolLike,
        P: FnOnce(&(Self::Row, F::Row)) -> Expr<B>,
    {
        join(self.into_from(), right.into_from(), ast::JoinKind::Inner, false, on)
    }

    /// `( left INNER JOIN LATERAL right ON predicate )`
    fn inner_join_lateral<F, B, P>(self, right: F, on: P) -> FromClause<(Self::Row, F::Row)>
    where
        F: IntoFrom,
        B: BoolLike,
        P: FnOnce(&(Self::Row, F::Row)) -> Expr<B>,
    {
        join(self.into_from(), right.into_from(), ast::JoinKind::Inner, true, on)
    }

    /// `( left LEFT JOIN right ON predicate )`; the right handle's columns
    /// become nullable.
    fn left_join<F, B, P>(
        self,
        right: F,
        on: P,
    ) -> FromClause<(Self::Row, <F::Row as Row>::Nulled)>
    where
        F: IntoFrom,
        B: BoolLike,
        P: FnOnce(&(Self::Row, <F::Row as Row>::Nulled)) -> Expr<B>,
    {
        let right = right.into_from();
        let right = FromClause {
            node: right.node,
            row: right.row.nulled(),
        };
        join(self.into_from(), right, ast::JoinKind::Left, false, on)
    }

    /// `( left LEFT JOIN LATERAL right ON predicate )`
    fn left_join_lateral<F, B, P>(
        self,
        right: F,
        on: P,
    ) -> FromClause<(Self::Row, <F::Row as Row>::Nulled)>
    where
        F: IntoFrom,
        B: BoolLike,
        P: FnOnce(&(Self::Row, <F::Row as Row>::Nulled)) -> Expr<B>,
    {
        let right = right.into_from();
        let right = FromClause {
            node: right.node,
            row: right.row.nulled(),
        };
        join(self.into_from(), right, ast::JoinKind::Left, true, on)
    }

    /// `( left RIGHT JOIN right ON predicate )`; the left handle's columns
    /// become nullable.
    fn right_join<F, B, P>(
        self,
        right: F,
        on: P,
    ) -> FromClause<(<Self::Row as Row>::Nulled, F::Row)>
    where
        F: IntoFrom,
        B: BoolLike,
        P: FnOnce(&(<Self::Row as Row>::Nulled, F::Row)) -> Expr<B>,
    {
        let left = self.into_from();
        let left = FromClause {
            node: left.node,
            row: left.row.nulled(),
        };
        join(left, right.into_from(), ast::JoinKind::Right, false, on)
    }

    /// `( left RIGHT JOIN LATERAL right ON predicate )`
    fn right_join_lateral<F, B, P>(
        self,
        right: F,
        on: P,
    ) -> FromClause<(<Self::Row as Row>::Nulled, F::Row)>
    where
        F: IntoFrom,
        B: BoolLike,
        P: FnOnce(&(<Self::Row as Row>::Nulled, F::Row)) -> Expr<B>,
    {
        let left = self.into_from();
        let left = FromClause {
            node: left.node,
            row: left.row.nulled(),
        };
        join(left, right.into_from(), ast::JoinKind::Right, true, on)
    }

    /// `( left FULL JOIN right ON predicate )`; both handles' columns
    /// become nullable.
    fn full_join<F, B, P>(
        self,
        right: F,
        on: P,
    ) -> FromClause<(<Self::Row as Row>::Nulled, <F::Row as Row>::Nulled)>
    where
        F: IntoFrom,
        B: BoolLike,
        P: FnOnce(&(<Self::Row as Row>::Nulled, <F::Row as Row>::Nulled)) -> Expr<B>,
    {
        let left = self.into_from();
        let left = FromClause {
            node: left.node,
            row: left.row.nulled(),
        };
        let right = right.into_from();
        let right = FromClause {
            node: right.node,
            row: right.row.nulled(),
        };
        join(left, right, ast::JoinKind::Full, false, on)
    }

    /// `( left FULL JOIN LATERAL right ON predicate )`
    fn full_join_lateral<F, B, P>(
        self,
        right: F,
        on: P,
    ) -> FromClause<(<Self::Row as Row>::Nulled, <F::Row as Row>::Nulled)>
    where
        F: IntoFrom,
        B: BoolLike,
        P: FnOnce(&(<Self::Row as Row>::Nulled, <F::Row as Row>::Nulled)) -> Expr<B>,
    {
        let left = self.into_from();
        let left = FromClause {
            node: left.node,
            row: left.row.nulled(),
        };
        let right = right.into_from();
        let right = FromClause {
            node: right.node,
            row: right.row.nulled(),
        };
        join(left, right, ast::JoinKind::Full, true, on)
    }

    /// `( left CROSS JOIN right )`
    fn cross_join<F: IntoFrom>(self, right: F) -> FromClause<(Self::Row, F::Row)> {
        cross(self.into_from(), right.into_from(), false)
    }

    /// `( left CROSS JOIN LATERAL right )`
    fn cross_join_lateral<F: IntoFrom>(self, right: F) -> FromClause<(Self::Row, F::Row)> {
        cross(self.into_from(), right.into_from(), true)
    }
}

impl<X: IntoFrom> JoinExt for X {}

/// A set-returning function used as a `FROM` item:
/// `name(args..) [WITH ORDINALITY] [AS alias]`.
///
/// The row shape is declared like a table's; an `ORDINALITY` column, when
/// requested, is declared there too.
pub struct TableFunction<T: Table> {
    args: Vec<ast::Expr>,
    alias: Option<&'static str>,
    marker: PhantomData<fn() -> T>,
}

/// Builds a table function whose row shape is declared by `T`; the
/// function name is `T::NAME`.
pub fn from_function<T: Table>(args: Vec<AnyExpr>) -> TableFunction<T> {
    TableFunction {
        args: args.into_iter().map(AnyExpr::into_ast).collect(),
        alias: None,
        marker: PhantomData,
    }
}

impl<T: Table> TableFunction<T> {
    /// Appends `WITH ORDINALITY`. Available at most once; the returned
    /// reference has no further `with_ordinality` method.
    pub fn with_ordinality(self) -> OrdinalTableFunction<T> {
        OrdinalTableFunction { inner: self }
    }

    /// `AS alias`
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    fn into_node(self, with_ordinality: bool) -> (ast::FromNode, T) {
        let alias = self.alias;
        let node = ast::FromNode::Function(ast::FunctionNode {
            name: Ident::new(T::NAME),
            args: self.args,
            with_ordinality,
            alias: alias.map(Ident::new),
        });
        (node, T::handle(alias.unwrap_or(T::NAME)))
    }
}

impl<T: Table> IntoFrom for TableFunction<T> {
    type Row = T;

    fn into_from(self) -> FromClause<T> {
        let (node, row) = self.into_node(false);
        FromClause { node, row }
    }
}

/// A table function with `WITH ORDINALITY` already applied.
pub struct OrdinalTableFunction<T: Table> {
    inner: TableFunction<T>,
}

impl<T: Table> OrdinalTableFunction<T> {
    /// `AS alias`
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.inner = self.inner.alias(alias);
        self
    }
}

impl<T: Table> IntoFrom for OrdinalTableFunction<T> {
    type Row = T;

    fn into_from(self) -> FromClause<T> {
        let (node, row) = self.inner.into_node(true);
        FromClause { node, row }
    }
}
