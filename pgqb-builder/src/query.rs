//! The staged `SELECT` builder.
//!
//! One immutable value, `Query<R, S, St, L>`, moves forward through the
//! clause order; each clause method exists only on the stages that permit
//! it and returns the narrowed next stage:
//!
//! ```text
//! Select -> Distinct? -> Where? -> GroupBy? -> Having? -> Window* ->
//! SetOp* -> OrderBy? -> (Offset/Limit | Offset Fetch) -> Lock*
//! ```
//!
//! Set operations flip the lock-policy phantom to [`LockForbidden`], so
//! `FOR UPDATE` after `UNION` does not compile. Illegal clause orders and
//! double-set clauses do not compile either; what the types cannot see
//! (duplicate window names) is checked at call time.

use core::marker::PhantomData;

use pgqb_ast as ast;
use pgqb_core::{unlex, Error, Ident, Serializable, Token};

use crate::expr::{AnyExpr, Expr, OrderSpec, QuantifiedOperand};
use crate::from::{FromClause, IntoFrom};
use crate::table::{Row, Table};
use crate::types::{Bool, BoolLike, CompatibleWith, SqlType};

/// A labeled projection item, rendered `expr AS alias`.
pub struct Labeled<T: SqlType> {
    item: ast::SelectItem,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> Clone for Labeled<T> {
    fn clone(&self) -> Self {
        Labeled {
            item: self.item.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: SqlType> Expr<T> {
    /// Labels the expression as a projection item: `expr AS alias`.
    pub fn label(self, alias: &str) -> Labeled<T> {
        Labeled {
            item: ast::SelectItem {
                expr: self.into_ast(),
                alias: Ident::new(alias),
            },
            marker: PhantomData,
        }
    }
}

/// The projection tuple of a query: a [`Labeled`] item or a tuple of
/// selections.
pub trait Selection {
    /// The projection items, in order.
    fn items(&self) -> Vec<ast::SelectItem>;
}

impl<T: SqlType> Selection for Labeled<T> {
    fn items(&self) -> Vec<ast::SelectItem> {
        vec![self.item.clone()]
    }
}

macro_rules! impl_selection_for_tuples {
    ( $( ($($name:ident),+) );+ $(;)? ) => {$(
        impl<$($name: Selection),+> Selection for ($($name,)+) {
            fn items(&self) -> Vec<ast::SelectItem> {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                let mut items = Vec::new();
                $(items.extend($name.items());)+
                items
            }
        }
    )+};
}

impl_selection_for_tuples! {
    (A);
    (A, B);
    (A, B, C);
    (A, B, C, D);
    (A, B, C, D, E);
    (A, B, C, D, E, F);
    (A, B, C, D, E, F, G);
    (A, B, C, D, E, F, G, H);
    (A, B, C, D, E, F, G, H, I);
    (A, B, C, D, E, F, G, H, I, J);
    (A, B, C, D, E, F, G, H, I, J, K);
    (A, B, C, D, E, F, G, H, I, J, K, L);
}

// Stage markers. Instances never exist; they ride in PhantomData.

/// Stage right after `select`.
pub struct SelectStage;
/// Stage after `distinct`/`distinct_on`.
pub struct DistinctStage;
/// Stage after `filter`.
pub struct WhereStage;
/// Stage after a grouping clause.
pub struct GroupByStage;
/// Stage after `having`.
pub struct HavingStage;
/// Stage after one or more `window` declarations.
pub struct WindowStage;
/// Stage after a set operation.
pub struct SetOpStage;
/// Stage after `order_by`.
pub struct OrderByStage;
/// Stage after `offset` (limit/fetch still open).
pub struct OffsetStage;
/// Stage after `limit` (offset still open).
pub struct LimitStage;
/// Stage with pagination fully specified.
pub struct PaginatedStage;
/// Stage after one or more lock clauses.
pub struct LockStage;

macro_rules! impl_stage_set {
    ( $trait:ident => $($stage:ty),+ $(,)? ) => {$(
        impl $trait for $stage {}
    )+};
}

/// Stages that may take `distinct`/`distinct_on`.
pub trait CanDistinct {}
impl_stage_set!(CanDistinct => SelectStage);

/// Stages that may take `filter`.
pub trait CanFilter {}
impl_stage_set!(CanFilter => SelectStage, DistinctStage);

/// Stages that may take a grouping clause.
pub trait CanGroupBy {}
impl_stage_set!(CanGroupBy => SelectStage, DistinctStage, WhereStage);

/// Stages that may take `having`.
pub trait CanHaving {}
impl_stage_set!(CanHaving => SelectStage, DistinctStage, WhereStage, GroupByStage);

/// Stages that may declare a window.
pub trait CanWindow {}
impl_stage_set!(
    CanWindow => SelectStage, DistinctStage, WhereStage, GroupByStage, HavingStage, WindowStage
);

/// Stages that may continue with a set operation.
pub trait CanSetOp {}
impl_stage_set!(
    CanSetOp => SelectStage, DistinctStage, WhereStage, GroupByStage, HavingStage, WindowStage,
    SetOpStage
);

/// Stages that may take `order_by`.
pub trait CanOrderBy {}
impl_stage_set!(
    CanOrderBy => SelectStage, DistinctStage, WhereStage, GroupByStage, HavingStage, WindowStage,
    SetOpStage
);

/// Stages that may open pagination.
pub trait CanPaginate {}
impl_stage_set!(
    CanPaginate => SelectStage, DistinctStage, WhereStage, GroupByStage, HavingStage, WindowStage,
    SetOpStage, OrderByStage
);

/// Stages that may append a lock clause.
pub trait CanLock {}
impl_stage_set!(
    CanLock => SelectStage, DistinctStage, WhereStage, GroupByStage, HavingStage, WindowStage,
    OrderByStage, OffsetStage, LimitStage, PaginatedStage, LockStage
);

/// Whether `FOR` lock clauses are still permitted.
pub trait LockPolicy {}

/// Lock clauses permitted.
pub struct LockAllowed;
/// Lock clauses forbidden: the query carries a set operation.
pub struct LockForbidden;

impl LockPolicy for LockAllowed {}
impl LockPolicy for LockForbidden {}

/// A staged `SELECT` builder over row handles `R` and selection tuple `S`.
pub struct Query<R: Row, S, St, L> {
    query: ast::Subquery,
    row: R,
    marker: PhantomData<fn() -> (S, St, L)>,
}

/// Entry to the staged builder: projects the row handles into a selection
/// tuple.
pub trait SelectExt: IntoFrom + Sized {
    /// `SELECT projection FROM self`
    fn select<S: Selection>(
        self,
        projection: impl FnOnce(&Self::Row) -> S,
    ) -> Query<Self::Row, S, SelectStage, LockAllowed> {
        let FromClause { node, row } = self.into_from();
        let items = projection(&row).items();
        Query {
            query: ast::Subquery::new(node, items),
            row,
            marker: PhantomData,
        }
    }
}

impl<X: IntoFrom> SelectExt for X {}

impl<R: Row, S, St, L> Query<R, S, St, L> {
    fn step<St2, L2>(self, edit: impl FnOnce(&R, &mut ast::Subquery)) -> Query<R, S, St2, L2> {
        let mut query = self.query;
        edit(&self.row, &mut query);
        Query {
            query,
            row: self.row,
            marker: PhantomData,
        }
    }

    /// The accumulated AST record.
    pub fn ast(&self) -> &ast::Subquery {
        &self.query
    }
}

/// Conversion of a staged builder into the underlying AST record.
pub trait IntoSubquery {
    /// Surrenders the AST record.
    fn into_subquery(self) -> ast::Subquery;
}

impl<R: Row, S, St, L> IntoSubquery for Query<R, S, St, L> {
    fn into_subquery(self) -> ast::Subquery {
        self.query
    }
}

impl<R: Row, S, St, L> Serializable for Query<R, S, St, L> {
    fn tokenize(&self, out: &mut Vec<Token>) {
        self.query.tokenize(out);
    }

    fn serialize(&self) -> String {
        let mut tokens = Vec::new();
        self.tokenize(&mut tokens);
        let sql = unlex(&tokens);
        log::debug!("serialized query: {}", sql);
        sql
    }
}

impl<R: Row, S, St: CanDistinct, L: LockPolicy> Query<R, S, St, L> {
    /// `SELECT DISTINCT`
    pub fn distinct(self) -> Query<R, S, DistinctStage, L> {
        self.step(|_, q| q.distinct = Some(ast::DistinctClause::Distinct))
    }

    /// `SELECT DISTINCT ON (keys..)`
    pub fn distinct_on(
        self,
        keys: impl FnOnce(&R) -> Vec<AnyExpr>,
    ) -> Query<R, S, DistinctStage, L> {
        self.step(|row, q| {
            let keys = keys(row).into_iter().map(AnyExpr::into_ast).collect();
            q.distinct = Some(ast::DistinctClause::DistinctOn(keys));
        })
    }
}

impl<R: Row, S, St: CanFilter, L: LockPolicy> Query<R, S, St, L> {
    /// `WHERE predicate`
    pub fn filter<B: BoolLike>(
        self,
        predicate: impl FnOnce(&R) -> Expr<B>,
    ) -> Query<R, S, WhereStage, L> {
        self.step(|row, q| q.filter = Some(predicate(row).into_ast()))
    }
}

/// One element of a `ROLLUP`/`CUBE` list: a key or a composite `(a, b)`.
pub struct GroupElement(ast::GroupingElement);

impl<T: SqlType> From<Expr<T>> for GroupElement {
    fn from(expr: Expr<T>) -> Self {
        GroupElement(ast::GroupingElement::Expr(expr.into_ast()))
    }
}

/// A composite grouping element, `(a, b, ..)`.
pub fn composite(keys: Vec<AnyExpr>) -> GroupElement {
    GroupElement(ast::GroupingElement::List(
        keys.into_iter().map(AnyExpr::into_ast).collect(),
    ))
}

/// One tree of a `GROUPING SETS(..)` list.
pub struct GroupSet(ast::GroupingTree);

impl GroupSet {
    /// A flat list of keys; an empty list is the grand total `()`.
    pub fn keys(keys: Vec<AnyExpr>) -> Self {
        GroupSet(ast::GroupingTree::Exprs(
            keys.into_iter().map(AnyExpr::into_ast).collect(),
        ))
    }

    /// A nested `ROLLUP(..)`.
    pub fn rollup(elements: Vec<GroupElement>) -> Self {
        GroupSet(ast::GroupingTree::Rollup(
            elements.into_iter().map(|e| e.0).collect(),
        ))
    }

    /// A nested `CUBE(..)`.
    pub fn cube(elements: Vec<GroupElement>) -> Self {
        GroupSet(ast::GroupingTree::Cube(
            elements.into_iter().map(|e| e.0).collect(),
        ))
    }
}

impl<R: Row, S, St: CanGroupBy, L: LockPolicy> Query<R, S, St, L> {
    fn set_group_by(self, distinct: bool, tree: ast::GroupingTree) -> Query<R, S, GroupByStage, L> {
        self.step(|_, q| q.group_by = Some(ast::GroupByClause { distinct, tree }))
    }

    /// `GROUP BY keys..`
    pub fn group_by(self, keys: impl FnOnce(&R) -> Vec<AnyExpr>) -> Query<R, S, GroupByStage, L> {
        let tree = ast::GroupingTree::Exprs(
            keys(&self.row).into_iter().map(AnyExpr::into_ast).collect(),
        );
        self.set_group_by(false, tree)
    }

    /// `GROUP BY DISTINCT keys..`
    pub fn group_by_distinct(
        self,
        keys: impl FnOnce(&R) -> Vec<AnyExpr>,
    ) -> Query<R, S, GroupByStage, L> {
        let tree = ast::GroupingTree::Exprs(
            keys(&self.row).into_iter().map(AnyExpr::into_ast).collect(),
        );
        self.set_group_by(true, tree)
    }

    /// `GROUP BY ROLLUP(elements..)`
    pub fn rollup(
        self,
        elements: impl FnOnce(&R) -> Vec<GroupElement>,
    ) -> Query<R, S, GroupByStage, L> {
        let tree = ast::GroupingTree::Rollup(
            elements(&self.row).into_iter().map(|e| e.0).collect(),
        );
        self.set_group_by(false, tree)
    }

    /// `GROUP BY CUBE(elements..)`
    pub fn cube(
        self,
        elements: impl FnOnce(&R) -> Vec<GroupElement>,
    ) -> Query<R, S, GroupByStage, L> {
        let tree =
            ast::GroupingTree::Cube(elements(&self.row).into_iter().map(|e| e.0).collect());
        self.set_group_by(false, tree)
    }

    /// `GROUP BY GROUPING SETS(trees..)`
    pub fn grouping_sets(
        self,
        trees: impl FnOnce(&R) -> Vec<GroupSet>,
    ) -> Query<R, S, GroupByStage, L> {
        let tree =
            ast::GroupingTree::Sets(trees(&self.row).into_iter().map(|t| t.0).collect());
        self.set_group_by(false, tree)
    }
}

impl<R: Row, S, St: CanHaving, L: LockPolicy> Query<R, S, St, L> {
    /// `HAVING predicate`
    pub fn having<B: BoolLike>(
        self,
        predicate: impl FnOnce(&R) -> Expr<B>,
    ) -> Query<R, S, HavingStage, L> {
        self.step(|row, q| q.having = Some(predicate(row).into_ast()))
    }
}

impl<R: Row, S, St: CanWindow, L: LockPolicy> Query<R, S, St, L> {
    /// Declares a named window: `WINDOW name AS (spec)`. Repeatable; a
    /// duplicate name is rejected with [`Error::DuplicateWindowName`].
    pub fn window(
        self,
        name: &str,
        spec: impl FnOnce(&R) -> crate::window::WindowSpec,
    ) -> Result<Query<R, S, WindowStage, L>, Error> {
        let def = spec(&self.row).def;
        let mut query = self.query;
        query.push_window(name, def)?;
        Ok(Query {
            query,
            row: self.row,
            marker: PhantomData,
        })
    }
}

impl<R: Row, S, St: CanSetOp, L: LockPolicy> Query<R, S, St, L> {
    fn combine<R2, St2, L2>(
        self,
        op: ast::SetOperator,
        all: bool,
        other: Query<R2, S, St2, L2>,
    ) -> Query<R, S, SetOpStage, LockForbidden>
    where
        R2: Row,
        St2: CanSetOp,
        L2: LockPolicy,
    {
        self.step(|_, q| {
            q.set_ops.push(ast::SetOpClause {
                op,
                all,
                query: Box::new(other.query),
            });
        })
    }

    /// `UNION other`. The other query must select the same tuple; the
    /// combined query no longer accepts lock clauses.
    pub fn union<R2: Row, St2: CanSetOp, L2: LockPolicy>(
        self,
        other: Query<R2, S, St2, L2>,
    ) -> Query<R, S, SetOpStage, LockForbidden> {
        self.combine(ast::SetOperator::Union, false, other)
    }

    /// `UNION ALL other`
    pub fn union_all<R2: Row, St2: CanSetOp, L2: LockPolicy>(
        self,
        other: Query<R2, S, St2, L2>,
    ) -> Query<R, S, SetOpStage, LockForbidden> {
        self.combine(ast::SetOperator::Union, true, other)
    }

    /// `INTERSECT other`
    pub fn intersect<R2: Row, St2: CanSetOp, L2: LockPolicy>(
        self,
        other: Query<R2, S, St2, L2>,
    ) -> Query<R, S, SetOpStage, LockForbidden> {
        self.combine(ast::SetOperator::Intersect, false, other)
    }

    /// `INTERSECT ALL other`
    pub fn intersect_all<R2: Row, St2: CanSetOp, L2: LockPolicy>(
        self,
        other: Query<R2, S, St2, L2>,
    ) -> Query<R, S, SetOpStage, LockForbidden> {
        self.combine(ast::SetOperator::Intersect, true, other)
    }

    /// `EXCEPT other`
    pub fn except<R2: Row, St2: CanSetOp, L2: LockPolicy>(
        self,
        other: Query<R2, S, St2, L2>,
    ) -> Query<R, S, SetOpStage, LockForbidden> {
        self.combine(ast::SetOperator::Except, false, other)
    }

    /// `EXCEPT ALL other`
    pub fn except_all<R2: Row, St2: CanSetOp, L2: LockPolicy>(
        self,
        other: Query<R2, S, St2, L2>,
    ) -> Query<R, S, SetOpStage, LockForbidden> {
        self.combine(ast::SetOperator::Except, true, other)
    }
}

impl<R: Row, S, St: CanOrderBy, L: LockPolicy> Query<R, S, St, L> {
    /// `ORDER BY specs..`; a bare expression converts to a specification
    /// with the server-default ordering.
    pub fn order_by(
        self,
        specs: impl FnOnce(&R) -> Vec<OrderSpec>,
    ) -> Query<R, S, OrderByStage, L> {
        self.step(|row, q| {
            q.order_by = specs(row).into_iter().map(OrderSpec::into_ast).collect();
        })
    }
}

impl<R: Row, S, St: CanPaginate, L: LockPolicy> Query<R, S, St, L> {
    /// `LIMIT n`
    pub fn limit(self, n: u64) -> Query<R, S, LimitStage, L> {
        self.step(|_, q| q.limit = Some(ast::LimitClause::Limit(ast::LimitCount::Count(n))))
    }

    /// `LIMIT ALL`
    pub fn limit_all(self) -> Query<R, S, LimitStage, L> {
        self.step(|_, q| q.limit = Some(ast::LimitClause::Limit(ast::LimitCount::All)))
    }

    /// `OFFSET n`
    pub fn offset(self, n: u64) -> Query<R, S, OffsetStage, L> {
        self.step(|_, q| q.offset = Some(n))
    }
}

impl<R: Row, S, L: LockPolicy> Query<R, S, OffsetStage, L> {
    /// `FETCH NEXT n ROWS ONLY`. Only reachable once `OFFSET` is set; the
    /// AST-level constructor checks the same invariant dynamically.
    pub fn fetch_next(self, n: u64) -> Query<R, S, PaginatedStage, L> {
        self.step(|_, q| {
            q.limit = Some(ast::LimitClause::Fetch {
                count: n,
                with_ties: false,
            });
        })
    }

    /// `FETCH NEXT n ROWS WITH TIES`
    pub fn fetch_next_with_ties(self, n: u64) -> Query<R, S, PaginatedStage, L> {
        self.step(|_, q| {
            q.limit = Some(ast::LimitClause::Fetch {
                count: n,
                with_ties: true,
            });
        })
    }

    /// `LIMIT n` after `OFFSET`.
    pub fn limit(self, n: u64) -> Query<R, S, PaginatedStage, L> {
        self.step(|_, q| q.limit = Some(ast::LimitClause::Limit(ast::LimitCount::Count(n))))
    }

    /// `LIMIT ALL` after `OFFSET`.
    pub fn limit_all(self) -> Query<R, S, PaginatedStage, L> {
        self.step(|_, q| q.limit = Some(ast::LimitClause::Limit(ast::LimitCount::All)))
    }
}

impl<R: Row, S, L: LockPolicy> Query<R, S, LimitStage, L> {
    /// `OFFSET n` after `LIMIT`.
    pub fn offset(self, n: u64) -> Query<R, S, PaginatedStage, L> {
        self.step(|_, q| q.offset = Some(n))
    }
}

/// A row-level lock specification for [`Query::for_lock`].
#[derive(Clone, Debug)]
pub struct Lock {
    clause: ast::LockClause,
}

impl Lock {
    fn new(strength: ast::LockStrength) -> Self {
        Lock {
            clause: ast::LockClause {
                strength,
                of: Vec::new(),
                block: None,
            },
        }
    }

    /// `FOR UPDATE`
    pub fn update() -> Self {
        Lock::new(ast::LockStrength::Update)
    }

    /// `FOR NO KEY UPDATE`
    pub fn no_key_update() -> Self {
        Lock::new(ast::LockStrength::NoKeyUpdate)
    }

    /// `FOR SHARE`
    pub fn share() -> Self {
        Lock::new(ast::LockStrength::Share)
    }

    /// `FOR KEY SHARE`
    pub fn key_share() -> Self {
        Lock::new(ast::LockStrength::KeyShare)
    }

    /// Restricts the lock to one table by its unqualified name;
    /// repeatable.
    pub fn of(mut self, table: &str) -> Self {
        self.clause.of.push(Ident::new(table));
        self
    }

    /// `NOWAIT`
    pub fn nowait(mut self) -> Self {
        self.clause.block = Some(ast::LockBlock::Nowait);
        self
    }

    /// `SKIP LOCKED`
    pub fn skip_locked(mut self) -> Self {
        self.clause.block = Some(ast::LockBlock::SkipLocked);
        self
    }
}

impl<R: Row, S, St: CanLock> Query<R, S, St, LockAllowed> {
    /// Appends a `FOR` lock clause; repeatable, serialised in order. Not
    /// available once the query carries a set operation.
    pub fn for_lock(self, lock: Lock) -> Query<R, S, LockStage, LockAllowed> {
        self.step(|_, q| q.locks.push(lock.clause))
    }
}

impl<R: Row, T: SqlType, St, L> Query<R, (Labeled<T>,), St, L> {
    /// Reifies the one-column query as a scalar expression. Wider (or
    /// narrower) selections have no `scalar` method; the AST-level
    /// [`pgqb_ast::Subquery::scalar`] checks the same arity dynamically.
    pub fn scalar(self) -> Expr<T::Nulled> {
        Expr::new(ast::Expr::Subquery(Box::new(self.query)))
    }
}

impl<R: Row, T: SqlType, St, L> Query<R, Labeled<T>, St, L> {
    /// Reifies the one-column query as a scalar expression.
    pub fn scalar(self) -> Expr<T::Nulled> {
        Expr::new(ast::Expr::Subquery(Box::new(self.query)))
    }
}

impl<T, U, R, St, L> QuantifiedOperand<T> for Query<R, (Labeled<U>,), St, L>
where
    T: SqlType,
    U: CompatibleWith<T>,
    R: Row,
{
    fn into_rhs(self) -> ast::QuantifiedRhs {
        ast::QuantifiedRhs::Subquery(Box::new(self.query))
    }
}

impl<T: SqlType> Expr<T> {
    /// `(expr IN (subquery))`; the subquery must select exactly one
    /// compatible column.
    pub fn in_subquery<U, R, St, L>(self, query: Query<R, (Labeled<U>,), St, L>) -> Expr<Bool>
    where
        U: CompatibleWith<T>,
        R: Row,
    {
        Expr::new(ast::Expr::in_subquery(
            self.into_ast(),
            false,
            query.query,
        ))
    }

    /// `(expr NOT IN (subquery))`
    pub fn not_in_subquery<U, R, St, L>(
        self,
        query: Query<R, (Labeled<U>,), St, L>,
    ) -> Expr<Bool>
    where
        U: CompatibleWith<T>,
        R: Row,
    {
        Expr::new(ast::Expr::in_subquery(self.into_ast(), true, query.query))
    }
}

/// `EXISTS (query)`
pub fn exists(query: impl IntoSubquery) -> Expr<Bool> {
    Expr::new(ast::Expr::exists(query.into_subquery()))
}

/// Uses a completed query as a `FROM` item: `(query) AS alias`.
///
/// `T` declares the column shape the subquery exposes under `alias`; the
/// correspondence is trusted, as with every handle.
pub fn from_subquery<T: Table>(query: impl IntoSubquery, alias: &'static str) -> FromClause<T> {
    FromClause {
        node: ast::FromNode::Subquery(ast::SubqueryNode {
            query: Box::new(query.into_subquery()),
            alias: Ident::new(alias),
        }),
        row: T::handle(alias),
    }
}
