use pgqb_core::{comma_separated, Ident, Keyword, Serializable, Token};

use crate::expression::Expr;
use crate::query::Subquery;
use crate::utils::parenthesized;

/// A node of the from-clause algebra.
///
/// Joins are binary and parenthesize themselves, so a join chain renders
/// as an explicitly nested tree and never depends on the parser's
/// associativity.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FromNode {
    /// A base table, optionally aliased.
    Table(TableNode),
    /// A set-returning function.
    Function(FunctionNode),
    /// A parenthesized subquery with a mandatory alias.
    Subquery(SubqueryNode),
    /// A join of two from-nodes.
    Join(Box<JoinNode>),
}

impl Serializable for FromNode {
    fn tokenize(&self, out: &mut Vec<Token>) {
        match self {
            FromNode::Table(node) => node.tokenize(out),
            FromNode::Function(node) => node.tokenize(out),
            FromNode::Subquery(node) => node.tokenize(out),
            FromNode::Join(node) => node.tokenize(out),
        }
    }
}

/// `name [AS alias]`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableNode {
    /// The real table name.
    pub name: Ident,
    /// Optional alias.
    pub alias: Option<Ident>,
}

impl Serializable for TableNode {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Ident(self.name.clone()));
        if let Some(alias) = &self.alias {
            out.push(Token::Keyword(Keyword::AS));
            out.push(Token::Ident(alias.clone()));
        }
    }
}

/// `name(args..) [WITH ORDINALITY] [AS alias]`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionNode {
    /// The function name.
    pub name: Ident,
    /// Call arguments.
    pub args: Vec<Expr>,
    /// Appends `WITH ORDINALITY`.
    pub with_ordinality: bool,
    /// Optional alias.
    pub alias: Option<Ident>,
}

impl Serializable for FunctionNode {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Ident(self.name.clone()));
        parenthesized(out, |out| comma_separated(out, &self.args));
        if self.with_ordinality {
            out.push(Token::Keyword(Keyword::WITH));
            out.push(Token::Keyword(Keyword::ORDINALITY));
        }
        if let Some(alias) = &self.alias {
            out.push(Token::Keyword(Keyword::AS));
            out.push(Token::Ident(alias.clone()));
        }
    }
}

/// `(subquery) AS alias`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubqueryNode {
    /// The inner query.
    pub query: Box<Subquery>,
    /// The mandatory alias.
    pub alias: Ident,
}

impl Serializable for SubqueryNode {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| self.query.tokenize(out));
        out.push(Token::Keyword(Keyword::AS));
        out.push(Token::Ident(self.alias.clone()));
    }
}

/// Join flavor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL JOIN`
    Full,
    /// `CROSS JOIN`
    Cross,
}

/// `( left kind JOIN [LATERAL] right [ON predicate] )`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JoinNode {
    /// Left operand.
    pub left: FromNode,
    /// Join flavor.
    pub kind: JoinKind,
    /// `LATERAL` flag on the right operand.
    pub lateral: bool,
    /// Right operand.
    pub right: FromNode,
    /// `ON` predicate; absent for cross joins.
    pub on: Option<Expr>,
}

impl Serializable for JoinNode {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            self.left.tokenize(out);
            out.push(Token::Keyword(match self.kind {
                JoinKind::Inner => Keyword::INNER,
                JoinKind::Left => Keyword::LEFT,
                JoinKind::Right => Keyword::RIGHT,
                JoinKind::Full => Keyword::FULL,
                JoinKind::Cross => Keyword::CROSS,
            }));
            out.push(Token::Keyword(Keyword::JOIN));
            if self.lateral {
                out.push(Token::Keyword(Keyword::LATERAL));
            }
            self.right.tokenize(out);
            if let Some(predicate) = &self.on {
                out.push(Token::Keyword(Keyword::ON));
                predicate.tokenize(out);
            }
        });
    }
}
