mod aggregate;
mod window;

use core::fmt;

pub use self::aggregate::*;
pub use self::window::*;

use pgqb_core::{comma_separated, Ident, Keyword, Literal, Operator, Serializable, Special, Token};

use crate::query::Subquery;
use crate::types::DataType;
use crate::utils::parenthesized;

/// A SQL expression tree node.
///
/// Nodes are immutable once constructed; the builder surface wraps
/// existing nodes in new ones. Every operator application parenthesizes
/// itself when tokenized, so rendering never needs precedence logic.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// A literal value.
    Literal(Literal),
    /// A qualified column reference, `table.column`.
    Column(ColumnRef),
    /// A positional placeholder, `$n` (1-based).
    Parameter(u32),
    /// Prefix operator application, e.g. `(not x)`.
    Prefix(PrefixExpr),
    /// Postfix operator application, e.g. `(x IS NULL)`.
    Postfix(PostfixExpr),
    /// Infix operator application, e.g. `(a = b)`.
    Infix(InfixExpr),
    /// One operator folded over several operands, e.g. `(a AND b AND c)`.
    Multi(MultiExpr),
    /// `(expr [NOT] BETWEEN low AND high)`
    Between(BetweenExpr),
    /// `CASE [operand] WHEN .. THEN .. [ELSE ..] END`
    Case(CaseExpr),
    /// `(expr [NOT] IN (v1, v2, ..))`
    InList(InListExpr),
    /// `(expr [NOT] IN (subquery))`
    InSubquery(InSubqueryExpr),
    /// `(expr op ANY(..))` / `(expr op ALL(..))`
    Quantified(QuantifiedExpr),
    /// `(expr COLLATE "collation")`
    Collate(CollateExpr),
    /// `CAST(expr AS type)`
    Cast(CastExpr),
    /// A scalar function call, e.g. `lower(x)`.
    Function(FunctionCall),
    /// An aggregate call.
    Aggregate(AggregateCall),
    /// An ordered-set aggregate call.
    OrderedSetAggregate(OrderedSetAggregateCall),
    /// `json_object_agg(k : v ..)`
    JsonObjectAgg(JsonObjectAgg),
    /// `json_array_agg(v ..)`
    JsonArrayAgg(JsonArrayAgg),
    /// A window function call with its `OVER` clause.
    Window(WindowCall),
    /// `ARRAY[..]`
    Array(ArrayExpr),
    /// `ROW(..)`
    Row(RowExpr),
    /// `EXISTS (subquery)`
    Exists(Box<Subquery>),
    /// A parenthesized scalar subquery used as a value.
    Subquery(Box<Subquery>),
}

impl Expr {
    /// A column reference.
    pub fn column(table: impl Into<Ident>, column: impl Into<Ident>) -> Self {
        Expr::Column(ColumnRef {
            table: table.into(),
            column: column.into(),
        })
    }

    /// A positional placeholder (1-based).
    pub fn parameter(index: u32) -> Self {
        Expr::Parameter(index)
    }

    /// `(op expr)`
    pub fn prefix(op: Operator, expr: Expr) -> Self {
        Expr::Prefix(PrefixExpr {
            op,
            expr: Box::new(expr),
        })
    }

    /// `(expr op)`
    pub fn postfix(expr: Expr, op: Operator) -> Self {
        Expr::Postfix(PostfixExpr {
            expr: Box::new(expr),
            op,
        })
    }

    /// `(left op right)`
    pub fn infix(left: Expr, op: Operator, right: Expr) -> Self {
        Expr::Infix(InfixExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// `(a op b op c ..)`
    pub fn multi(op: Operator, operands: Vec<Expr>) -> Self {
        Expr::Multi(MultiExpr { op, operands })
    }

    /// `(expr [NOT] BETWEEN low AND high)`
    pub fn between(expr: Expr, negated: bool, low: Expr, high: Expr) -> Self {
        Expr::Between(BetweenExpr {
            expr: Box::new(expr),
            negated,
            low: Box::new(low),
            high: Box::new(high),
        })
    }

    /// `(expr [NOT] IN (v1, v2, ..))`
    pub fn in_list(expr: Expr, negated: bool, list: Vec<Expr>) -> Self {
        Expr::InList(InListExpr {
            expr: Box::new(expr),
            negated,
            list,
        })
    }

    /// `(expr [NOT] IN (subquery))`
    pub fn in_subquery(expr: Expr, negated: bool, subquery: Subquery) -> Self {
        Expr::InSubquery(InSubqueryExpr {
            expr: Box::new(expr),
            negated,
            subquery: Box::new(subquery),
        })
    }

    /// `(left op ANY(rhs))` / `(left op ALL(rhs))`
    pub fn quantified(left: Expr, op: Operator, quantifier: Quantifier, rhs: QuantifiedRhs) -> Self {
        Expr::Quantified(QuantifiedExpr {
            left: Box::new(left),
            op,
            quantifier,
            rhs,
        })
    }

    /// `(expr COLLATE "collation")`; the collation is always quoted.
    pub fn collate(expr: Expr, collation: impl Into<String>) -> Self {
        Expr::Collate(CollateExpr {
            expr: Box::new(expr),
            collation: Ident::quoted(collation),
        })
    }

    /// `CAST(expr AS type)`
    pub fn cast(expr: Expr, data_type: DataType) -> Self {
        Expr::Cast(CastExpr {
            expr: Box::new(expr),
            data_type,
        })
    }

    /// A scalar function call, `name(args..)`.
    pub fn function(name: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Expr::Function(FunctionCall {
            name: name.into(),
            args,
        })
    }

    /// `ARRAY[..]`
    pub fn array(elements: Vec<Expr>) -> Self {
        Expr::Array(ArrayExpr { elements })
    }

    /// `ROW(..)`
    pub fn row(fields: Vec<Expr>) -> Self {
        Expr::Row(RowExpr { fields })
    }

    /// `EXISTS (subquery)`
    pub fn exists(subquery: Subquery) -> Self {
        Expr::Exists(Box::new(subquery))
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Expr::Literal(literal)
    }
}

impl Serializable for Expr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        match self {
            Expr::Literal(lit) => out.push(Token::Literal(lit.clone())),
            Expr::Column(column) => column.tokenize(out),
            Expr::Parameter(index) => out.push(Token::Parameter(*index)),
            Expr::Prefix(e) => e.tokenize(out),
            Expr::Postfix(e) => e.tokenize(out),
            Expr::Infix(e) => e.tokenize(out),
            Expr::Multi(e) => e.tokenize(out),
            Expr::Between(e) => e.tokenize(out),
            Expr::Case(e) => e.tokenize(out),
            Expr::InList(e) => e.tokenize(out),
            Expr::InSubquery(e) => e.tokenize(out),
            Expr::Quantified(e) => e.tokenize(out),
            Expr::Collate(e) => e.tokenize(out),
            Expr::Cast(e) => e.tokenize(out),
            Expr::Function(e) => e.tokenize(out),
            Expr::Aggregate(e) => e.tokenize(out),
            Expr::OrderedSetAggregate(e) => e.tokenize(out),
            Expr::JsonObjectAgg(e) => e.tokenize(out),
            Expr::JsonArrayAgg(e) => e.tokenize(out),
            Expr::Window(e) => e.tokenize(out),
            Expr::Array(e) => e.tokenize(out),
            Expr::Row(e) => e.tokenize(out),
            Expr::Exists(query) => {
                out.push(Token::Keyword(Keyword::EXISTS));
                parenthesized(out, |out| query.tokenize(out));
            }
            Expr::Subquery(query) => parenthesized(out, |out| query.tokenize(out)),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// A qualified column reference.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnRef {
    /// The table alias part.
    pub table: Ident,
    /// The column part.
    pub column: Ident,
}

impl Serializable for ColumnRef {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::ColumnRef {
            table: self.table.clone(),
            column: self.column.clone(),
        });
    }
}

/// Prefix operator application, e.g. `(not x)`.
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrefixExpr {
    pub op: Operator,
    pub expr: Box<Expr>,
}

impl Serializable for PrefixExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            out.push(Token::Operator(self.op.clone()));
            self.expr.tokenize(out);
        });
    }
}

/// Postfix operator application, e.g. `(x IS NULL)`.
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostfixExpr {
    pub expr: Box<Expr>,
    pub op: Operator,
}

impl Serializable for PostfixExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            self.expr.tokenize(out);
            out.push(Token::Operator(self.op.clone()));
        });
    }
}

/// Infix operator application, e.g. `(a = b)`.
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfixExpr {
    pub left: Box<Expr>,
    pub op: Operator,
    pub right: Box<Expr>,
}

impl Serializable for InfixExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            self.left.tokenize(out);
            out.push(Token::Operator(self.op.clone()));
            self.right.tokenize(out);
        });
    }
}

/// One operator folded over several operands.
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiExpr {
    pub op: Operator,
    pub operands: Vec<Expr>,
}

impl Serializable for MultiExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            for (i, operand) in self.operands.iter().enumerate() {
                if i > 0 {
                    out.push(Token::Operator(self.op.clone()));
                }
                operand.tokenize(out);
            }
        });
    }
}

/// `(expr [NOT] BETWEEN low AND high)`
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetweenExpr {
    pub expr: Box<Expr>,
    pub negated: bool,
    pub low: Box<Expr>,
    pub high: Box<Expr>,
}

impl Serializable for BetweenExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            self.expr.tokenize(out);
            if self.negated {
                out.push(Token::Keyword(Keyword::NOT));
            }
            out.push(Token::Keyword(Keyword::BETWEEN));
            self.low.tokenize(out);
            out.push(Token::Keyword(Keyword::AND));
            self.high.tokenize(out);
        });
    }
}

/// `CASE [operand] WHEN condition THEN result .. [ELSE result] END`
///
/// Conditions and results are kept in lockstep; a searched `CASE` leaves
/// `operand` empty.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CaseExpr {
    /// Operand of a simple `CASE`.
    pub operand: Option<Box<Expr>>,
    /// `WHEN` conditions.
    pub conditions: Vec<Expr>,
    /// `THEN` results, one per condition.
    pub results: Vec<Expr>,
    /// `ELSE` result.
    pub else_result: Option<Box<Expr>>,
}

impl Serializable for CaseExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(Keyword::CASE));
        if let Some(operand) = &self.operand {
            operand.tokenize(out);
        }
        for (condition, result) in self.conditions.iter().zip(&self.results) {
            out.push(Token::Keyword(Keyword::WHEN));
            condition.tokenize(out);
            out.push(Token::Keyword(Keyword::THEN));
            result.tokenize(out);
        }
        if let Some(else_result) = &self.else_result {
            out.push(Token::Keyword(Keyword::ELSE));
            else_result.tokenize(out);
        }
        out.push(Token::Keyword(Keyword::END));
    }
}

/// `(expr [NOT] IN (v1, v2, ..))`
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InListExpr {
    pub expr: Box<Expr>,
    pub negated: bool,
    pub list: Vec<Expr>,
}

impl Serializable for InListExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            self.expr.tokenize(out);
            out.push(Token::Operator(if self.negated {
                Operator::NotIn
            } else {
                Operator::In
            }));
            parenthesized(out, |out| comma_separated(out, &self.list));
        });
    }
}

/// `(expr [NOT] IN (subquery))`
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InSubqueryExpr {
    pub expr: Box<Expr>,
    pub negated: bool,
    pub subquery: Box<Subquery>,
}

impl Serializable for InSubqueryExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            self.expr.tokenize(out);
            out.push(Token::Operator(if self.negated {
                Operator::NotIn
            } else {
                Operator::In
            }));
            parenthesized(out, |out| self.subquery.tokenize(out));
        });
    }
}

/// `ANY` or `ALL`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quantifier {
    /// `ANY(..)`
    Any,
    /// `ALL(..)`
    All,
}

/// Right-hand side of a quantified comparison.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuantifiedRhs {
    /// An array-valued expression.
    Array(Box<Expr>),
    /// A one-column subquery.
    Subquery(Box<Subquery>),
}

/// `(left op ANY(rhs))` / `(left op ALL(rhs))`
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantifiedExpr {
    pub left: Box<Expr>,
    pub op: Operator,
    pub quantifier: Quantifier,
    pub rhs: QuantifiedRhs,
}

impl Serializable for QuantifiedExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            self.left.tokenize(out);
            out.push(Token::Operator(self.op.clone()));
            out.push(Token::Keyword(match self.quantifier {
                Quantifier::Any => Keyword::ANY,
                Quantifier::All => Keyword::ALL,
            }));
            parenthesized(out, |out| match &self.rhs {
                QuantifiedRhs::Array(array) => array.tokenize(out),
                QuantifiedRhs::Subquery(subquery) => subquery.tokenize(out),
            });
        });
    }
}

/// `(expr COLLATE "collation")`
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollateExpr {
    pub expr: Box<Expr>,
    pub collation: Ident,
}

impl Serializable for CollateExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            self.expr.tokenize(out);
            out.push(Token::Keyword(Keyword::COLLATE));
            out.push(Token::Ident(self.collation.clone()));
        });
    }
}

/// `CAST(expr AS type)`
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastExpr {
    pub expr: Box<Expr>,
    pub data_type: DataType,
}

impl Serializable for CastExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(Keyword::CAST));
        parenthesized(out, |out| {
            self.expr.tokenize(out);
            out.push(Token::Keyword(Keyword::AS));
            self.data_type.tokenize(out);
        });
    }
}

/// A scalar function call, `name(args..)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionCall {
    /// Function name, quoted on demand.
    pub name: Ident,
    /// Call arguments.
    pub args: Vec<Expr>,
}

impl Serializable for FunctionCall {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Ident(self.name.clone()));
        parenthesized(out, |out| comma_separated(out, &self.args));
    }
}

/// `ARRAY[..]`
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayExpr {
    pub elements: Vec<Expr>,
}

impl Serializable for ArrayExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(Keyword::ARRAY));
        out.push(Token::Special(Special::LeftBracket));
        comma_separated(out, &self.elements);
        out.push(Token::Special(Special::RightBracket));
    }
}

/// `ROW(..)`
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowExpr {
    pub fields: Vec<Expr>,
}

impl Serializable for RowExpr {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(Keyword::ROW));
        parenthesized(out, |out| comma_separated(out, &self.fields));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lit(n: i64) -> Expr {
        Expr::from(Literal::Integer(n))
    }

    #[test]
    fn postfix_is_null() {
        let expr = Expr::postfix(
            Expr::from(Literal::String("abc".into())),
            Operator::IsNull,
        );
        assert_eq!(expr.serialize(), "('abc' IS NULL)");
    }

    #[test]
    fn in_list_parenthesizes_both_levels() {
        let expr = Expr::in_list(lit(1), false, vec![lit(1), lit(2), lit(3)]);
        assert_eq!(expr.serialize(), "(1 IN (1, 2, 3))");
    }

    #[test]
    fn negated_in_list() {
        let expr = Expr::in_list(lit(1), true, vec![lit(2)]);
        assert_eq!(expr.serialize(), "(1 NOT IN (2))");
    }

    #[test]
    fn cast_renders_compactly() {
        let expr = Expr::cast(lit(1), DataType::Boolean);
        assert_eq!(expr.serialize(), "CAST(1 AS boolean)");
    }

    #[test]
    fn column_references_quote_on_demand() {
        assert_eq!(Expr::column("users", "name").serialize(), "users.name");
        assert_eq!(
            Expr::column("user group", "select").serialize(),
            "\"user group\".\"select\""
        );
    }

    #[test]
    fn infix_chain_parenthesizes_each_application() {
        let expr = Expr::infix(
            Expr::prefix(Operator::Not, Expr::column("s", "deleted")),
            Operator::And,
            Expr::infix(Expr::column("up", "user_id"), Operator::Equal, Expr::parameter(1)),
        );
        assert_eq!(expr.serialize(), "((not s.deleted) AND (up.user_id = $1))");
    }

    #[test]
    fn multi_folds_one_operator() {
        let expr = Expr::multi(Operator::Or, vec![lit(1), lit(2), lit(3)]);
        assert_eq!(expr.serialize(), "(1 OR 2 OR 3)");
    }

    #[test]
    fn between_and_case() {
        let expr = Expr::between(Expr::column("t", "x"), false, lit(1), lit(10));
        assert_eq!(expr.serialize(), "(t.x BETWEEN 1 AND 10)");

        let case = Expr::Case(CaseExpr {
            operand: None,
            conditions: vec![Expr::infix(Expr::column("t", "x"), Operator::Less, lit(0))],
            results: vec![lit(-1)],
            else_result: Some(Box::new(lit(1))),
        });
        assert_eq!(case.serialize(), "CASE WHEN (t.x < 0) THEN -1 ELSE 1 END");
    }

    #[test]
    fn collate_forces_quotes() {
        let expr = Expr::collate(Expr::column("t", "name"), "de_DE");
        assert_eq!(expr.serialize(), "(t.name COLLATE \"de_DE\")");
    }

    #[test]
    fn array_literal_hugs_brackets() {
        let expr = Expr::array(vec![lit(1), lit(2)]);
        assert_eq!(expr.serialize(), "ARRAY[1, 2]");
    }

    #[test]
    fn row_constructor() {
        let expr = Expr::row(vec![lit(1), Expr::from(Literal::Boolean(true))]);
        assert_eq!(expr.serialize(), "ROW (1, true)");
    }
}
