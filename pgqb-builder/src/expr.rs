//! The phantom-typed expression surface.

use core::fmt;
use core::marker::PhantomData;

use pgqb_ast as ast;
use pgqb_core::{Literal, Operator, Serializable, Token};

use crate::types::{
    BaseType, Bool, BoolLike, CompatibleWith, Float4, Float8, Int2, Int4, Int8, Nullable,
    SqlNumber, SqlOrd, SqlText, SqlType, Text,
};

/// A typed SQL expression.
///
/// The marker `T` exists only at the type level; at runtime this is a thin
/// wrapper around the untyped AST node. Every method consumes the receiver
/// and returns a fresh expression; clone the handle when a node is used in
/// more than one place.
pub struct Expr<T: SqlType> {
    node: ast::Expr,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Expr {
            node: self.node.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: SqlType> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.node).finish()
    }
}

impl<T: SqlType> Serializable for Expr<T> {
    fn tokenize(&self, out: &mut Vec<Token>) {
        self.node.tokenize(out);
    }
}

/// Anything that finalizes into a typed expression: expressions themselves
/// and the staged aggregate surfaces.
pub trait IntoExpr<T: SqlType> {
    /// Finalizes into the expression.
    fn into_expr(self) -> Expr<T>;
}

impl<T: SqlType> IntoExpr<T> for Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self
    }
}

impl<T: SqlType> Expr<T> {
    pub(crate) fn new(node: ast::Expr) -> Self {
        Expr {
            node,
            marker: PhantomData,
        }
    }

    /// A positional placeholder (1-based). Normally produced by the
    /// parameter binder, which owns index assignment.
    pub fn parameter(index: u32) -> Self {
        Expr::new(ast::Expr::parameter(index))
    }

    /// The untyped AST node.
    pub fn into_ast(self) -> ast::Expr {
        self.node
    }

    /// Borrows the untyped AST node.
    pub fn ast(&self) -> &ast::Expr {
        &self.node
    }

    fn unary(self, build: impl FnOnce(ast::Expr) -> ast::Expr) -> Expr<Bool> {
        Expr::new(build(self.node))
    }

    fn compare<U: CompatibleWith<T>>(self, op: Operator, other: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(self.node, op, other.into_expr().node))
    }

    /// `(expr IS NULL)`
    pub fn is_null(self) -> Expr<Bool> {
        self.unary(|node| ast::Expr::postfix(node, Operator::IsNull))
    }

    /// `(expr IS NOT NULL)`
    pub fn is_not_null(self) -> Expr<Bool> {
        self.unary(|node| ast::Expr::postfix(node, Operator::IsNotNull))
    }

    /// `(a IS DISTINCT FROM b)`
    pub fn is_distinct_from<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        self.compare(Operator::IsDistinctFrom, other)
    }

    /// `(a IS NOT DISTINCT FROM b)`
    pub fn is_not_distinct_from<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        self.compare(Operator::IsNotDistinctFrom, other)
    }

    /// `(a = b)`
    pub fn eq<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        self.compare(Operator::Equal, other)
    }

    /// `(a <> b)`
    pub fn ne<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        self.compare(Operator::NotEqual, other)
    }

    /// `CAST(expr AS type)`
    pub fn cast_as<U: SqlType>(self) -> Expr<U> {
        Expr::new(ast::Expr::cast(self.node, U::data_type()))
    }

    /// `(expr IN (v1, v2, ..))`
    pub fn is_in<U: CompatibleWith<T>>(
        self,
        list: impl IntoIterator<Item = Expr<U>>,
    ) -> Expr<Bool> {
        let list = list.into_iter().map(Expr::into_ast).collect();
        Expr::new(ast::Expr::in_list(self.node, false, list))
    }

    /// `(expr NOT IN (v1, v2, ..))`
    pub fn not_in<U: CompatibleWith<T>>(
        self,
        list: impl IntoIterator<Item = Expr<U>>,
    ) -> Expr<Bool> {
        let list = list.into_iter().map(Expr::into_ast).collect();
        Expr::new(ast::Expr::in_list(self.node, true, list))
    }

    /// `(a op ANY(rhs))`; the right-hand side is an array expression or a
    /// one-column subquery.
    pub fn any(self, op: Operator, rhs: impl QuantifiedOperand<T>) -> Expr<Bool> {
        Expr::new(ast::Expr::quantified(
            self.node,
            op,
            ast::Quantifier::Any,
            rhs.into_rhs(),
        ))
    }

    /// `(a op ALL(rhs))`
    pub fn all(self, op: Operator, rhs: impl QuantifiedOperand<T>) -> Expr<Bool> {
        Expr::new(ast::Expr::quantified(
            self.node,
            op,
            ast::Quantifier::All,
            rhs.into_rhs(),
        ))
    }
}

impl<T: SqlOrd> Expr<T> {
    /// `(a < b)`
    pub fn lt<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        self.compare(Operator::Less, other)
    }

    /// `(a <= b)`
    pub fn le<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        self.compare(Operator::LessOrEqual, other)
    }

    /// `(a > b)`
    pub fn gt<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        self.compare(Operator::Greater, other)
    }

    /// `(a >= b)`
    pub fn ge<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        self.compare(Operator::GreaterOrEqual, other)
    }

    /// `(expr BETWEEN low AND high)`
    pub fn between<U: CompatibleWith<T>, V: CompatibleWith<T>>(
        self,
        low: impl IntoExpr<U>,
        high: impl IntoExpr<V>,
    ) -> Expr<Bool> {
        Expr::new(ast::Expr::between(
            self.node,
            false,
            low.into_expr().node,
            high.into_expr().node,
        ))
    }

    /// `(expr NOT BETWEEN low AND high)`
    pub fn not_between<U: CompatibleWith<T>, V: CompatibleWith<T>>(
        self,
        low: impl IntoExpr<U>,
        high: impl IntoExpr<V>,
    ) -> Expr<Bool> {
        Expr::new(ast::Expr::between(
            self.node,
            true,
            low.into_expr().node,
            high.into_expr().node,
        ))
    }

    /// Ascending order specification.
    pub fn asc(self) -> OrderSpec {
        OrderSpec::from(self).asc()
    }

    /// Descending order specification.
    pub fn desc(self) -> OrderSpec {
        OrderSpec::from(self).desc()
    }

    /// `USING op` order specification.
    pub fn using(self, op: Operator) -> OrderSpec {
        OrderSpec::from(self).using(op)
    }
}

impl<T: SqlText> Expr<T> {
    /// `(a LIKE pattern)`
    pub fn like<U: SqlText>(self, pattern: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::Like,
            pattern.into_expr().node,
        ))
    }

    /// `(a NOT LIKE pattern)`
    pub fn not_like<U: SqlText>(self, pattern: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::NotLike,
            pattern.into_expr().node,
        ))
    }

    /// `(a ILIKE pattern)`
    pub fn ilike<U: SqlText>(self, pattern: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::ILike,
            pattern.into_expr().node,
        ))
    }

    /// `(a NOT ILIKE pattern)`
    pub fn not_ilike<U: SqlText>(self, pattern: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::NotILike,
            pattern.into_expr().node,
        ))
    }

    /// `(a SIMILAR TO pattern)`
    pub fn similar_to<U: SqlText>(self, pattern: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::SimilarTo,
            pattern.into_expr().node,
        ))
    }

    /// `(a NOT SIMILAR TO pattern)`
    pub fn not_similar_to<U: SqlText>(self, pattern: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::NotSimilarTo,
            pattern.into_expr().node,
        ))
    }

    /// `(expr COLLATE "collation")`; the collation name is always quoted.
    pub fn collate(self, collation: &str) -> Expr<T> {
        Expr::new(ast::Expr::collate(self.node, collation))
    }

    /// `(a || b)`
    pub fn concat<U: SqlText>(self, other: impl IntoExpr<U>) -> Expr<Text> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::Concat,
            other.into_expr().node,
        ))
    }
}

impl<T: SqlNumber> Expr<T> {
    fn arith<U: CompatibleWith<T>>(self, op: Operator, other: impl IntoExpr<U>) -> Expr<T> {
        Expr::new(ast::Expr::infix(self.node, op, other.into_expr().node))
    }

    /// `(a + b)`
    pub fn add<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<T> {
        self.arith(Operator::Plus, other)
    }

    /// `(a - b)`
    pub fn sub<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<T> {
        self.arith(Operator::Minus, other)
    }

    /// `(a * b)`
    pub fn mul<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<T> {
        self.arith(Operator::Multiply, other)
    }

    /// `(a / b)`
    pub fn div<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<T> {
        self.arith(Operator::Divide, other)
    }

    /// `(a % b)`
    pub fn modulo<U: CompatibleWith<T>>(self, other: impl IntoExpr<U>) -> Expr<T> {
        self.arith(Operator::Modulo, other)
    }
}

impl<T: BoolLike> Expr<T> {
    /// `(a AND b)`
    pub fn and<U: BoolLike>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::And,
            other.into_expr().node,
        ))
    }

    /// `(a OR b)`
    pub fn or<U: BoolLike>(self, other: impl IntoExpr<U>) -> Expr<Bool> {
        Expr::new(ast::Expr::infix(
            self.node,
            Operator::Or,
            other.into_expr().node,
        ))
    }
}

impl<T: BaseType> Expr<Nullable<T>> {
    /// Re-types a nullable expression as not-null. Purely a type-level
    /// assertion; the rendered SQL is unchanged.
    pub fn not_null(self) -> Expr<T> {
        Expr::new(self.node)
    }
}

/// Logical negation, rendered `(not expr)`.
pub fn not<T: BoolLike>(expr: impl IntoExpr<T>) -> Expr<Bool> {
    Expr::new(ast::Expr::prefix(Operator::Not, expr.into_expr().node))
}

/// `(a AND b AND c ..)` over any number of predicates.
pub fn all_of<T: BoolLike>(predicates: impl IntoIterator<Item = Expr<T>>) -> Expr<Bool> {
    Expr::new(ast::Expr::multi(
        Operator::And,
        predicates.into_iter().map(Expr::into_ast).collect(),
    ))
}

/// `(a OR b OR c ..)` over any number of predicates.
pub fn any_of<T: BoolLike>(predicates: impl IntoIterator<Item = Expr<T>>) -> Expr<Bool> {
    Expr::new(ast::Expr::multi(
        Operator::Or,
        predicates.into_iter().map(Expr::into_ast).collect(),
    ))
}

/// A free column reference for when no table handle is in scope.
///
/// The generated `table!` handles produce these under the hood; reaching
/// for `field` directly trades away the phantom row typing.
pub fn field<T: SqlType>(table: &str, column: &str) -> Expr<T> {
    Expr::new(ast::Expr::column(table, column))
}

/// Host values accepted as inline constants.
///
/// Strings are restricted to `&'static str`: a computed `String` cannot be
/// spelled here and must be bound as a parameter instead, which keeps
/// runtime data out of the SQL text.
pub trait IntoConstant {
    /// SQL type of the produced literal.
    type Sql: SqlType;

    /// The literal value.
    fn literal(self) -> Literal;
}

impl IntoConstant for &'static str {
    type Sql = Text;

    fn literal(self) -> Literal {
        Literal::String(self.to_owned())
    }
}

impl IntoConstant for bool {
    type Sql = Bool;

    fn literal(self) -> Literal {
        Literal::Boolean(self)
    }
}

impl IntoConstant for i16 {
    type Sql = Int2;

    fn literal(self) -> Literal {
        Literal::Integer(self.into())
    }
}

impl IntoConstant for i32 {
    type Sql = Int4;

    fn literal(self) -> Literal {
        Literal::Integer(self.into())
    }
}

impl IntoConstant for i64 {
    type Sql = Int8;

    fn literal(self) -> Literal {
        Literal::Integer(self)
    }
}

impl IntoConstant for f32 {
    type Sql = Float4;

    fn literal(self) -> Literal {
        Literal::Float(self.into())
    }
}

impl IntoConstant for f64 {
    type Sql = Float8;

    fn literal(self) -> Literal {
        Literal::Float(self)
    }
}

/// Builds a literal expression from a narrow host value.
pub fn constant<V: IntoConstant>(value: V) -> Expr<V::Sql> {
    Expr::new(ast::Expr::Literal(value.literal()))
}

/// A typed `null` literal.
pub fn null<T: BaseType>() -> Expr<Nullable<T>> {
    Expr::new(ast::Expr::Literal(Literal::Null))
}

/// A type-erased expression, for positions where heterogeneous lists are
/// legal: grouping keys, partitions, distinct-on keys.
#[derive(Clone, Debug)]
pub struct AnyExpr(pub(crate) ast::Expr);

impl<T: SqlType> From<Expr<T>> for AnyExpr {
    fn from(expr: Expr<T>) -> Self {
        AnyExpr(expr.node)
    }
}

impl AnyExpr {
    /// The untyped AST node.
    pub fn into_ast(self) -> ast::Expr {
        self.0
    }
}

/// One `ORDER BY` specification.
///
/// A bare expression converts into a specification with no direction
/// tokens; the server default is `ASC NULLS LAST`.
#[derive(Clone, Debug)]
pub struct OrderSpec {
    pub(crate) spec: ast::OrderByExpr,
}

impl<T: SqlType> From<Expr<T>> for OrderSpec {
    fn from(expr: Expr<T>) -> Self {
        OrderSpec {
            spec: ast::OrderByExpr::from(expr.node),
        }
    }
}

impl OrderSpec {
    /// Sets `ASC`.
    pub fn asc(mut self) -> Self {
        self.spec = self.spec.asc();
        self
    }

    /// Sets `DESC`.
    pub fn desc(mut self) -> Self {
        self.spec = self.spec.desc();
        self
    }

    /// Sets `USING op`.
    pub fn using(mut self, op: Operator) -> Self {
        self.spec = self.spec.using(op);
        self
    }

    /// Sets `NULLS FIRST`.
    pub fn nulls_first(mut self) -> Self {
        self.spec = self.spec.nulls_first();
        self
    }

    /// Sets `NULLS LAST`.
    pub fn nulls_last(mut self) -> Self {
        self.spec = self.spec.nulls_last();
        self
    }

    /// The untyped specification.
    pub fn into_ast(self) -> ast::OrderByExpr {
        self.spec
    }
}

/// Right-hand side of `ANY`/`ALL`: an array expression or a one-column
/// subquery (the latter implementation lives with the query builder).
pub trait QuantifiedOperand<T: SqlType> {
    #[doc(hidden)]
    fn into_rhs(self) -> ast::QuantifiedRhs;
}

impl<T: SqlType, U: CompatibleWith<T>> QuantifiedOperand<T> for Expr<crate::types::Array<U>> {
    fn into_rhs(self) -> ast::QuantifiedRhs {
        ast::QuantifiedRhs::Array(Box::new(self.node))
    }
}

/// Collects typed expressions into a type-erased list.
#[macro_export]
macro_rules! exprs {
    ( $( $expr:expr ),* $(,)? ) => {
        ::std::vec![ $( $crate::AnyExpr::from($expr) ),* ]
    };
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn constant_is_null_matches_postgres_shape() {
        assert_eq!(constant("abc").is_null().serialize(), "('abc' IS NULL)");
    }

    #[test]
    fn constant_in_list() {
        let expr = constant(1).is_in([constant(1), constant(2), constant(3)]);
        assert_eq!(expr.serialize(), "(1 IN (1, 2, 3))");
    }

    #[test]
    fn cast_to_marker_type() {
        assert_eq!(constant(1).cast_as::<Bool>().serialize(), "CAST(1 AS boolean)");
        assert_eq!(
            constant(1).cast_as::<crate::types::Array<Int4>>().serialize(),
            "CAST(1 AS integer[])"
        );
    }

    #[test]
    fn comparisons_unify_nullability() {
        let nullable: Expr<Nullable<Int4>> = field("b", "x");
        let plain: Expr<Int4> = field("a", "x");
        assert_eq!(nullable.eq(plain).serialize(), "(b.x = a.x)");

        let nullable: Expr<Nullable<Int4>> = field("b", "x");
        let plain: Expr<Int4> = field("a", "x");
        assert_eq!(plain.lt(nullable).serialize(), "(a.x < b.x)");
    }

    #[test]
    fn logic_and_negation() {
        let expr = not(field::<Bool>("s", "deleted")).and(field::<Bool>("s", "active"));
        assert_eq!(expr.serialize(), "((not s.deleted) AND s.active)");
    }

    #[test]
    fn arithmetic_keeps_the_operand_type() {
        let expr = field::<Int4>("t", "x").add(constant(1)).mul(constant(2));
        assert_eq!(expr.serialize(), "((t.x + 1) * 2)");
    }

    #[test]
    fn pattern_matching_and_collate() {
        let expr = field::<Text>("u", "name").ilike(constant("a%"));
        assert_eq!(expr.serialize(), "(u.name ILIKE 'a%')");

        let expr = field::<Text>("u", "name").collate("de_DE");
        assert_eq!(expr.serialize(), "(u.name COLLATE \"de_DE\")");
    }

    #[test]
    fn any_over_an_array() {
        let expr = field::<Int4>("t", "x").any(
            Operator::Equal,
            field::<crate::types::Array<Int4>>("t", "xs"),
        );
        assert_eq!(expr.serialize(), "(t.x = ANY(t.xs))");
    }

    #[test]
    fn order_specs() {
        let mut out = Vec::new();
        field::<Int4>("t", "x").desc().nulls_first().into_ast().tokenize(&mut out);
        assert_eq!(pgqb_core::unlex(&out), "t.x DESC NULLS FIRST");
    }

    #[test]
    fn null_literal_is_typed() {
        let expr: Expr<Nullable<Bool>> = null();
        assert_eq!(expr.serialize(), "null");
    }

    #[test]
    fn not_null_projection_is_textually_inert() {
        let expr: Expr<Nullable<Int4>> = field("b", "x");
        assert_eq!(expr.not_null().serialize(), "b.x");
    }
}
