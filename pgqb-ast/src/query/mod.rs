mod from;

use core::fmt;

use indexmap::IndexMap;
use pgqb_core::{
    comma_separated, Error, Ident, Keyword, Literal, Operator, Serializable, Token,
};

pub use self::from::*;

use crate::expression::{Expr, WindowDef};
use crate::utils::parenthesized;

/// A complete `SELECT` statement record.
///
/// Clause slots mirror the fixed serialisation order: `SELECT`, distinct
/// clause, projection, `FROM`, `WHERE`, `GROUP BY`, `HAVING`, `WINDOW`,
/// set-operation continuations, `ORDER BY`, pagination, `FOR` locks.
/// The record is inert data; the staged builder owns clause ordering and
/// the checked methods here own the dynamic invariants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subquery {
    /// The `FROM` node.
    pub from: FromNode,
    /// Projection items, each rendered `expr AS alias`.
    pub projection: Vec<SelectItem>,
    /// Distinct clause.
    pub distinct: Option<DistinctClause>,
    /// `WHERE` predicate.
    pub filter: Option<Expr>,
    /// `GROUP BY` clause.
    pub group_by: Option<GroupByClause>,
    /// `HAVING` predicate.
    pub having: Option<Expr>,
    /// Named windows, in declaration order; names are unique.
    pub windows: IndexMap<String, WindowDef>,
    /// Set-operation continuations, in order.
    pub set_ops: Vec<SetOpClause>,
    /// `ORDER BY` specifications.
    pub order_by: Vec<OrderByExpr>,
    /// `OFFSET` row count.
    pub offset: Option<u64>,
    /// `LIMIT` / `FETCH` clause.
    pub limit: Option<LimitClause>,
    /// Row-level lock clauses, in order.
    pub locks: Vec<LockClause>,
}

impl Subquery {
    /// Creates a bare `SELECT projection FROM from`.
    pub fn new(from: FromNode, projection: Vec<SelectItem>) -> Self {
        Subquery {
            from,
            projection,
            distinct: None,
            filter: None,
            group_by: None,
            having: None,
            windows: IndexMap::new(),
            set_ops: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
            locks: Vec::new(),
        }
    }

    /// Appends a named window; a duplicate name is rejected.
    pub fn push_window(&mut self, name: impl Into<String>, def: WindowDef) -> Result<(), Error> {
        let name = name.into();
        if self.windows.contains_key(&name) {
            return Err(Error::DuplicateWindowName(name));
        }
        self.windows.insert(name, def);
        Ok(())
    }

    /// Switches pagination to the `FETCH` form; `OFFSET` must already be
    /// set.
    pub fn set_fetch(&mut self, count: u64, with_ties: bool) -> Result<(), Error> {
        if self.offset.is_none() {
            return Err(Error::MissingOffsetForFetch);
        }
        self.limit = Some(LimitClause::Fetch { count, with_ties });
        Ok(())
    }

    /// Reifies the query as a scalar expression; the projection must be
    /// exactly one column wide.
    pub fn scalar(self) -> Result<Expr, Error> {
        if self.projection.len() != 1 {
            return Err(Error::ScalarArity(self.projection.len()));
        }
        Ok(Expr::Subquery(Box::new(self)))
    }
}

impl Serializable for Subquery {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(Keyword::SELECT));
        if let Some(distinct) = &self.distinct {
            distinct.tokenize(out);
        }
        comma_separated(out, &self.projection);
        out.push(Token::Keyword(Keyword::FROM));
        self.from.tokenize(out);
        if let Some(filter) = &self.filter {
            out.push(Token::Keyword(Keyword::WHERE));
            filter.tokenize(out);
        }
        if let Some(group_by) = &self.group_by {
            group_by.tokenize(out);
        }
        if let Some(having) = &self.having {
            out.push(Token::Keyword(Keyword::HAVING));
            having.tokenize(out);
        }
        if !self.windows.is_empty() {
            out.push(Token::Keyword(Keyword::WINDOW));
            for (i, (name, def)) in self.windows.iter().enumerate() {
                if i > 0 {
                    out.push(Token::Special(pgqb_core::Special::Comma));
                }
                out.push(Token::ident(name.clone()));
                out.push(Token::Keyword(Keyword::AS));
                def.tokenize(out);
            }
        }
        for set_op in &self.set_ops {
            set_op.tokenize(out);
        }
        if !self.order_by.is_empty() {
            out.push(Token::Keyword(Keyword::ORDER));
            out.push(Token::Keyword(Keyword::BY));
            comma_separated(out, &self.order_by);
        }
        self.tokenize_pagination(out);
        for lock in &self.locks {
            lock.tokenize(out);
        }
    }
}

impl Subquery {
    fn tokenize_pagination(&self, out: &mut Vec<Token>) {
        let offset = |out: &mut Vec<Token>, n: u64| {
            out.push(Token::Keyword(Keyword::OFFSET));
            out.push(Token::Literal(Literal::Integer(
                i64::try_from(n).unwrap_or(i64::MAX),
            )));
        };
        match &self.limit {
            Some(LimitClause::Limit(count)) => {
                out.push(Token::Keyword(Keyword::LIMIT));
                match count {
                    LimitCount::Count(n) => out.push(Token::Literal(Literal::Integer(
                        i64::try_from(*n).unwrap_or(i64::MAX),
                    ))),
                    LimitCount::All => out.push(Token::Keyword(Keyword::ALL)),
                }
                if let Some(n) = self.offset {
                    offset(out, n);
                }
            }
            Some(LimitClause::Fetch { count, with_ties }) => {
                if let Some(n) = self.offset {
                    offset(out, n);
                }
                out.push(Token::Keyword(Keyword::FETCH));
                out.push(Token::Keyword(Keyword::NEXT));
                out.push(Token::Literal(Literal::Integer(
                    i64::try_from(*count).unwrap_or(i64::MAX),
                )));
                out.push(Token::Keyword(Keyword::ROWS));
                if *with_ties {
                    out.push(Token::Keyword(Keyword::WITH));
                    out.push(Token::Keyword(Keyword::TIES));
                } else {
                    out.push(Token::Keyword(Keyword::ONLY));
                }
            }
            None => {
                if let Some(n) = self.offset {
                    offset(out, n);
                }
            }
        }
    }
}

impl fmt::Display for Subquery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// One projection item, rendered `expr AS alias`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectItem {
    /// The projected expression.
    pub expr: Expr,
    /// The output column name.
    pub alias: Ident,
}

impl Serializable for SelectItem {
    fn tokenize(&self, out: &mut Vec<Token>) {
        self.expr.tokenize(out);
        out.push(Token::Keyword(Keyword::AS));
        out.push(Token::Ident(self.alias.clone()));
    }
}

/// The distinct clause.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistinctClause {
    /// `DISTINCT`
    Distinct,
    /// `DISTINCT ON (keys..)`
    DistinctOn(Vec<Expr>),
}

impl Serializable for DistinctClause {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(Keyword::DISTINCT));
        if let DistinctClause::DistinctOn(keys) = self {
            out.push(Token::Keyword(Keyword::ON));
            parenthesized(out, |out| comma_separated(out, keys));
        }
    }
}

/// `GROUP BY [DISTINCT] tree`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupByClause {
    /// The `GROUP BY DISTINCT` flag.
    pub distinct: bool,
    /// The grouping tree.
    pub tree: GroupingTree,
}

impl Serializable for GroupByClause {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(Keyword::GROUP));
        out.push(Token::Keyword(Keyword::BY));
        if self.distinct {
            out.push(Token::Keyword(Keyword::DISTINCT));
        }
        self.tree.tokenize(out);
    }
}

/// The recursive grouping structure: a flat expression list, `ROLLUP`,
/// `CUBE`, or `GROUPING SETS` over further trees.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupingTree {
    /// A flat list of grouping expressions.
    Exprs(Vec<Expr>),
    /// `ROLLUP(elements..)`
    Rollup(Vec<GroupingElement>),
    /// `CUBE(elements..)`
    Cube(Vec<GroupingElement>),
    /// `GROUPING SETS(trees..)`
    Sets(Vec<GroupingTree>),
}

impl Serializable for GroupingTree {
    fn tokenize(&self, out: &mut Vec<Token>) {
        match self {
            GroupingTree::Exprs(exprs) => comma_separated(out, exprs),
            GroupingTree::Rollup(elements) => {
                out.push(Token::Keyword(Keyword::ROLLUP));
                parenthesized(out, |out| comma_separated(out, elements));
            }
            GroupingTree::Cube(elements) => {
                out.push(Token::Keyword(Keyword::CUBE));
                parenthesized(out, |out| comma_separated(out, elements));
            }
            GroupingTree::Sets(trees) => {
                out.push(Token::Keyword(Keyword::GROUPING));
                out.push(Token::Keyword(Keyword::SETS));
                parenthesized(out, |out| {
                    for (i, tree) in trees.iter().enumerate() {
                        if i > 0 {
                            out.push(Token::Special(pgqb_core::Special::Comma));
                        }
                        match tree {
                            // A flat list forms one grouping set: a single
                            // key stands bare, anything else (incl. the
                            // empty grand-total set) is parenthesized.
                            GroupingTree::Exprs(exprs) if exprs.len() == 1 => {
                                exprs[0].tokenize(out)
                            }
                            GroupingTree::Exprs(exprs) => {
                                parenthesized(out, |out| comma_separated(out, exprs))
                            }
                            nested => nested.tokenize(out),
                        }
                    }
                });
            }
        }
    }
}

/// One element of a `ROLLUP`/`CUBE` list: an expression or a composite
/// `(a, b)` element.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupingElement {
    /// A single grouping expression.
    Expr(Expr),
    /// A composite grouping element, `(a, b, ..)`.
    List(Vec<Expr>),
}

impl Serializable for GroupingElement {
    fn tokenize(&self, out: &mut Vec<Token>) {
        match self {
            GroupingElement::Expr(expr) => expr.tokenize(out),
            GroupingElement::List(exprs) => {
                parenthesized(out, |out| comma_separated(out, exprs))
            }
        }
    }
}

/// A set-operation continuation: `UNION [ALL] query` and friends.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetOpClause {
    /// The set operator.
    pub op: SetOperator,
    /// The `ALL` flag.
    pub all: bool,
    /// The right-hand query.
    pub query: Box<Subquery>,
}

impl Serializable for SetOpClause {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(match self.op {
            SetOperator::Union => Keyword::UNION,
            SetOperator::Intersect => Keyword::INTERSECT,
            SetOperator::Except => Keyword::EXCEPT,
        }));
        if self.all {
            out.push(Token::Keyword(Keyword::ALL));
        }
        self.query.tokenize(out);
    }
}

/// Set operators.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SetOperator {
    /// `UNION`
    Union,
    /// `INTERSECT`
    Intersect,
    /// `EXCEPT`
    Except,
}

/// One `ORDER BY` specification:
/// `expr [ASC | DESC | USING op] [NULLS FIRST | NULLS LAST]`.
///
/// A bare expression renders with no direction tokens; the server default
/// is `ASC NULLS LAST`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderByExpr {
    /// The ordering expression.
    pub expr: Expr,
    /// Optional direction.
    pub direction: Option<OrderDirection>,
    /// Optional nulls placement.
    pub nulls: Option<NullsOrder>,
}

impl OrderByExpr {
    /// Sets `ASC`.
    pub fn asc(mut self) -> Self {
        self.direction = Some(OrderDirection::Asc);
        self
    }

    /// Sets `DESC`.
    pub fn desc(mut self) -> Self {
        self.direction = Some(OrderDirection::Desc);
        self
    }

    /// Sets `USING op`.
    pub fn using(mut self, op: Operator) -> Self {
        self.direction = Some(OrderDirection::Using(op));
        self
    }

    /// Sets `NULLS FIRST`.
    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    /// Sets `NULLS LAST`.
    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }
}

impl From<Expr> for OrderByExpr {
    fn from(expr: Expr) -> Self {
        OrderByExpr {
            expr,
            direction: None,
            nulls: None,
        }
    }
}

impl Serializable for OrderByExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        self.expr.tokenize(out);
        match &self.direction {
            Some(OrderDirection::Asc) => out.push(Token::Keyword(Keyword::ASC)),
            Some(OrderDirection::Desc) => out.push(Token::Keyword(Keyword::DESC)),
            Some(OrderDirection::Using(op)) => {
                out.push(Token::Keyword(Keyword::USING));
                out.push(Token::Operator(op.clone()));
            }
            None => {}
        }
        match self.nulls {
            Some(NullsOrder::First) => {
                out.push(Token::Keyword(Keyword::NULLS));
                out.push(Token::Keyword(Keyword::FIRST));
            }
            Some(NullsOrder::Last) => {
                out.push(Token::Keyword(Keyword::NULLS));
                out.push(Token::Keyword(Keyword::LAST));
            }
            None => {}
        }
    }
}

/// Ordering direction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderDirection {
    /// `ASC`
    Asc,
    /// `DESC`
    Desc,
    /// `USING op`
    Using(Operator),
}

/// Nulls placement.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NullsOrder {
    /// `NULLS FIRST`
    First,
    /// `NULLS LAST`
    Last,
}

/// The `LIMIT` / `FETCH` pagination styles; mutually exclusive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LimitClause {
    /// `LIMIT n` / `LIMIT ALL`
    Limit(LimitCount),
    /// `FETCH NEXT n ROWS ONLY` / `.. WITH TIES`; requires `OFFSET`.
    Fetch {
        /// Row count.
        count: u64,
        /// `WITH TIES` instead of `ONLY`.
        with_ties: bool,
    },
}

/// The count of a `LIMIT` clause.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LimitCount {
    /// `LIMIT n`
    Count(u64),
    /// `LIMIT ALL`
    All,
}

/// Row-lock strength.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LockStrength {
    /// `FOR UPDATE`
    Update,
    /// `FOR NO KEY UPDATE`
    NoKeyUpdate,
    /// `FOR SHARE`
    Share,
    /// `FOR KEY SHARE`
    KeyShare,
}

/// Lock waiting policy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LockBlock {
    /// `NOWAIT`
    Nowait,
    /// `SKIP LOCKED`
    SkipLocked,
}

/// One `FOR` lock clause:
/// `FOR strength [OF table, ..] [NOWAIT | SKIP LOCKED]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LockClause {
    /// Lock strength.
    pub strength: LockStrength,
    /// Restricting table names, unqualified.
    pub of: Vec<Ident>,
    /// Waiting policy.
    pub block: Option<LockBlock>,
}

impl Serializable for LockClause {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(Keyword::FOR));
        match self.strength {
            LockStrength::Update => out.push(Token::Keyword(Keyword::UPDATE)),
            LockStrength::NoKeyUpdate => {
                out.push(Token::Keyword(Keyword::NO));
                out.push(Token::Keyword(Keyword::KEY));
                out.push(Token::Keyword(Keyword::UPDATE));
            }
            LockStrength::Share => out.push(Token::Keyword(Keyword::SHARE)),
            LockStrength::KeyShare => {
                out.push(Token::Keyword(Keyword::KEY));
                out.push(Token::Keyword(Keyword::SHARE));
            }
        }
        if !self.of.is_empty() {
            out.push(Token::Keyword(Keyword::OF));
            for (i, table) in self.of.iter().enumerate() {
                if i > 0 {
                    out.push(Token::Special(pgqb_core::Special::Comma));
                }
                out.push(Token::Ident(table.clone()));
            }
        }
        match self.block {
            Some(LockBlock::Nowait) => out.push(Token::Keyword(Keyword::NOWAIT)),
            Some(LockBlock::SkipLocked) => {
                out.push(Token::Keyword(Keyword::SKIP));
                out.push(Token::Keyword(Keyword::LOCKED));
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn users() -> FromNode {
        FromNode::Table(TableNode {
            name: Ident::new("users"),
            alias: None,
        })
    }

    fn select_ids() -> Subquery {
        Subquery::new(
            users(),
            vec![SelectItem {
                expr: Expr::column("users", "id"),
                alias: Ident::new("id"),
            }],
        )
    }

    #[test]
    fn minimal_select() {
        assert_eq!(
            select_ids().serialize(),
            "SELECT users.id AS id FROM users"
        );
    }

    #[test]
    fn serialisation_is_deterministic() {
        let query = select_ids();
        assert_eq!(query.serialize(), query.serialize());
    }

    #[test]
    fn clause_order_is_fixed() {
        let mut query = select_ids();
        query.distinct = Some(DistinctClause::Distinct);
        query.filter = Some(Expr::column("users", "active"));
        query.group_by = Some(GroupByClause {
            distinct: false,
            tree: GroupingTree::Exprs(vec![Expr::column("users", "id")]),
        });
        query.having = Some(Expr::column("users", "active"));
        query.order_by = vec![OrderByExpr::from(Expr::column("users", "id")).desc()];
        query.offset = Some(10);
        query.limit = Some(LimitClause::Limit(LimitCount::Count(5)));
        query.locks.push(LockClause {
            strength: LockStrength::Update,
            of: vec![Ident::new("users")],
            block: Some(LockBlock::SkipLocked),
        });
        assert_eq!(
            query.serialize(),
            "SELECT DISTINCT users.id AS id FROM users WHERE users.active \
             GROUP BY users.id HAVING users.active ORDER BY users.id DESC \
             LIMIT 5 OFFSET 10 FOR UPDATE OF users SKIP LOCKED"
        );
    }

    #[test]
    fn distinct_on_keys() {
        let mut query = select_ids();
        query.distinct = Some(DistinctClause::DistinctOn(vec![Expr::column(
            "users", "org_id",
        )]));
        assert_eq!(
            query.serialize(),
            "SELECT DISTINCT ON (users.org_id) users.id AS id FROM users"
        );
    }

    #[test]
    fn grouping_trees_render_compactly() {
        let tree = GroupingTree::Sets(vec![
            GroupingTree::Rollup(vec![
                GroupingElement::Expr(Expr::column("t", "a")),
                GroupingElement::List(vec![Expr::column("t", "b"), Expr::column("t", "c")]),
            ]),
            GroupingTree::Cube(vec![GroupingElement::Expr(Expr::column("t", "d"))]),
            GroupingTree::Exprs(vec![Expr::column("t", "e")]),
        ]);
        let mut out = Vec::new();
        GroupByClause {
            distinct: true,
            tree,
        }
        .tokenize(&mut out);
        assert_eq!(
            pgqb_core::unlex(&out),
            "GROUP BY DISTINCT GROUPING SETS(ROLLUP(t.a, (t.b, t.c)), CUBE(t.d), t.e)"
        );
    }

    #[test]
    fn fetch_requires_offset() {
        let mut query = select_ids();
        assert_eq!(query.set_fetch(10, false), Err(Error::MissingOffsetForFetch));

        query.offset = Some(20);
        query.set_fetch(10, true).expect("offset is set");
        assert_eq!(
            query.serialize(),
            "SELECT users.id AS id FROM users OFFSET 20 FETCH NEXT 10 ROWS WITH TIES"
        );
    }

    #[test]
    fn duplicate_window_names_are_rejected() {
        let mut query = select_ids();
        query
            .push_window("w", WindowDef::default())
            .expect("first name is free");
        assert_eq!(
            query.push_window("w", WindowDef::default()),
            Err(Error::DuplicateWindowName("w".into()))
        );
        assert_eq!(
            query.serialize(),
            "SELECT users.id AS id FROM users WINDOW w AS ()"
        );
    }

    #[test]
    fn scalar_requires_exactly_one_column() {
        let query = select_ids();
        assert!(query.scalar().is_ok());

        let mut two = select_ids();
        two.projection.push(SelectItem {
            expr: Expr::column("users", "name"),
            alias: Ident::new("name"),
        });
        assert_eq!(two.scalar(), Err(Error::ScalarArity(2)));

        let mut zero = select_ids();
        zero.projection.clear();
        assert_eq!(zero.scalar(), Err(Error::ScalarArity(0)));
    }

    #[test]
    fn set_ops_follow_the_body() {
        let mut query = select_ids();
        query.set_ops.push(SetOpClause {
            op: SetOperator::Union,
            all: true,
            query: Box::new(select_ids()),
        });
        query.order_by = vec![OrderByExpr::from(Expr::column("users", "id"))];
        assert_eq!(
            query.serialize(),
            "SELECT users.id AS id FROM users UNION ALL SELECT users.id AS id FROM users \
             ORDER BY users.id"
        );
    }
}
