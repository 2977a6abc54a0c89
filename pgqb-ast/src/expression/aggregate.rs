use pgqb_core::{comma_separated, Error, Ident, Keyword, Serializable, Special, Token};

use crate::expression::Expr;
use crate::query::OrderByExpr;
use crate::utils::parenthesized;

/// Arguments of an aggregate or window call: `*` or an expression list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AggregateArgs {
    /// `fn(*)`
    Star,
    /// `fn(a, b, ..)`
    List(Vec<Expr>),
}

impl AggregateArgs {
    /// True for `*` and for an empty argument list.
    pub fn is_argumentless(&self) -> bool {
        match self {
            AggregateArgs::Star => true,
            AggregateArgs::List(args) => args.is_empty(),
        }
    }

    pub(crate) fn tokenize_inner(&self, out: &mut Vec<Token>) {
        match self {
            AggregateArgs::Star => out.push(Token::Special(Special::Asterisk)),
            AggregateArgs::List(args) => comma_separated(out, args),
        }
    }
}

fn tokenize_filter(filter: Option<&Expr>, out: &mut Vec<Token>) {
    if let Some(predicate) = filter {
        out.push(Token::Keyword(Keyword::FILTER));
        parenthesized(out, |out| {
            out.push(Token::Keyword(Keyword::WHERE));
            predicate.tokenize(out);
        });
    }
}

fn tokenize_order_by(order_by: &[OrderByExpr], out: &mut Vec<Token>) {
    if !order_by.is_empty() {
        out.push(Token::Keyword(Keyword::ORDER));
        out.push(Token::Keyword(Keyword::BY));
        comma_separated(out, order_by);
    }
}

/// A plain aggregate call:
/// `name([DISTINCT] args [ORDER BY ..]) [FILTER (WHERE p)]`.
///
/// An argumentless call (`count(*)`) accepts neither `DISTINCT` nor
/// `ORDER BY`; both modifiers fail at construction time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateCall {
    /// Function name.
    pub name: Ident,
    /// Call arguments.
    pub args: AggregateArgs,
    /// `DISTINCT` flag.
    pub distinct: bool,
    /// `ORDER BY` inside the call.
    pub order_by: Vec<OrderByExpr>,
    /// `FILTER` predicate.
    pub filter: Option<Box<Expr>>,
}

impl AggregateCall {
    /// Creates `name(args..)`.
    pub fn new(name: impl Into<Ident>, args: Vec<Expr>) -> Self {
        AggregateCall {
            name: name.into(),
            args: AggregateArgs::List(args),
            distinct: false,
            order_by: Vec::new(),
            filter: None,
        }
    }

    /// Creates `name(*)`.
    pub fn star(name: impl Into<Ident>) -> Self {
        AggregateCall {
            name: name.into(),
            args: AggregateArgs::Star,
            distinct: false,
            order_by: Vec::new(),
            filter: None,
        }
    }

    /// Adds `DISTINCT`.
    pub fn distinct(mut self) -> Result<Self, Error> {
        if self.args.is_argumentless() {
            return Err(Error::InvalidAggregateConfiguration(self.name.value));
        }
        self.distinct = true;
        Ok(self)
    }

    /// Adds `ORDER BY` inside the call.
    pub fn order_by(mut self, order: Vec<OrderByExpr>) -> Result<Self, Error> {
        if self.args.is_argumentless() {
            return Err(Error::InvalidAggregateConfiguration(self.name.value));
        }
        self.order_by = order;
        Ok(self)
    }

    /// Adds `FILTER (WHERE predicate)`.
    pub fn filter_where(mut self, predicate: Expr) -> Self {
        self.filter = Some(Box::new(predicate));
        self
    }
}

impl Serializable for AggregateCall {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Ident(self.name.clone()));
        parenthesized(out, |out| {
            if self.distinct {
                out.push(Token::Keyword(Keyword::DISTINCT));
            }
            self.args.tokenize_inner(out);
            tokenize_order_by(&self.order_by, out);
        });
        tokenize_filter(self.filter.as_deref(), out);
    }
}

/// An ordered-set aggregate call:
/// `name(args..) WITHIN GROUP (ORDER BY ..) [FILTER (WHERE p)]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderedSetAggregateCall {
    /// Function name.
    pub name: Ident,
    /// Direct arguments, outside the `WITHIN GROUP` clause.
    pub args: Vec<Expr>,
    /// The `WITHIN GROUP (ORDER BY ..)` specifications.
    pub within_group: Vec<OrderByExpr>,
    /// `FILTER` predicate.
    pub filter: Option<Box<Expr>>,
}

impl OrderedSetAggregateCall {
    /// Creates `name(args..) WITHIN GROUP (ORDER BY within_group)`.
    pub fn new(
        name: impl Into<Ident>,
        args: Vec<Expr>,
        within_group: Vec<OrderByExpr>,
    ) -> Self {
        OrderedSetAggregateCall {
            name: name.into(),
            args,
            within_group,
            filter: None,
        }
    }

    /// Adds `FILTER (WHERE predicate)`.
    pub fn filter_where(mut self, predicate: Expr) -> Self {
        self.filter = Some(Box::new(predicate));
        self
    }
}

impl Serializable for OrderedSetAggregateCall {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Ident(self.name.clone()));
        parenthesized(out, |out| comma_separated(out, &self.args));
        out.push(Token::Keyword(Keyword::WITHIN));
        out.push(Token::Keyword(Keyword::GROUP));
        parenthesized(out, |out| {
            out.push(Token::Keyword(Keyword::ORDER));
            out.push(Token::Keyword(Keyword::BY));
            comma_separated(out, &self.within_group);
        });
        tokenize_filter(self.filter.as_deref(), out);
    }
}

/// Null handling of the JSON aggregates.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NullTreatment {
    /// `ABSENT ON NULL`
    Absent,
    /// `NULL ON NULL`
    Null,
}

impl NullTreatment {
    fn tokenize(self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(match self {
            NullTreatment::Absent => Keyword::ABSENT,
            NullTreatment::Null => Keyword::NULL,
        }));
        out.push(Token::Keyword(Keyword::ON));
        out.push(Token::Keyword(Keyword::NULL));
    }
}

/// Key uniqueness treatment of `json_object_agg`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UniqueKeys {
    /// `WITH UNIQUE KEYS`
    With,
    /// `WITHOUT UNIQUE KEYS`
    Without,
}

/// `json_object_agg(k : v [ABSENT|NULL ON NULL] [WITH|WITHOUT UNIQUE KEYS])`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JsonObjectAgg {
    /// Key expression.
    pub key: Box<Expr>,
    /// Value expression.
    pub value: Box<Expr>,
    /// Null handling.
    pub on_null: Option<NullTreatment>,
    /// Key uniqueness treatment.
    pub unique_keys: Option<UniqueKeys>,
}

impl Serializable for JsonObjectAgg {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::ident("json_object_agg"));
        parenthesized(out, |out| {
            self.key.tokenize(out);
            out.push(Token::Special(Special::Colon));
            self.value.tokenize(out);
            if let Some(on_null) = self.on_null {
                on_null.tokenize(out);
            }
            if let Some(unique) = self.unique_keys {
                out.push(Token::Keyword(match unique {
                    UniqueKeys::With => Keyword::WITH,
                    UniqueKeys::Without => Keyword::WITHOUT,
                }));
                out.push(Token::Keyword(Keyword::UNIQUE));
                out.push(Token::Keyword(Keyword::KEYS));
            }
        });
    }
}

/// `json_array_agg(v [ORDER BY ..] [ABSENT|NULL ON NULL])`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JsonArrayAgg {
    /// Value expression.
    pub value: Box<Expr>,
    /// `ORDER BY` inside the call.
    pub order_by: Vec<OrderByExpr>,
    /// Null handling.
    pub on_null: Option<NullTreatment>,
}

impl Serializable for JsonArrayAgg {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::ident("json_array_agg"));
        parenthesized(out, |out| {
            self.value.tokenize(out);
            tokenize_order_by(&self.order_by, out);
            if let Some(on_null) = self.on_null {
                on_null.tokenize(out);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use pgqb_core::{Literal, Operator};
    use pretty_assertions::assert_eq;

    use super::*;

    fn agg_expr(call: AggregateCall) -> Expr {
        Expr::Aggregate(call)
    }

    #[test]
    fn count_star() {
        let call = AggregateCall::star("COUNT");
        assert_eq!(agg_expr(call).serialize(), "COUNT(*)");
    }

    #[test]
    fn argumentless_rejects_distinct_and_order() {
        assert_eq!(
            AggregateCall::star("count").distinct(),
            Err(Error::InvalidAggregateConfiguration("count".into()))
        );
        assert_eq!(
            AggregateCall::new("count", Vec::new()).order_by(Vec::new()),
            Err(Error::InvalidAggregateConfiguration("count".into()))
        );
    }

    #[test]
    fn filter_clause_follows_the_call() {
        let call = AggregateCall::new("COUNT", vec![Expr::column("users", "id")]).filter_where(
            Expr::infix(
                Expr::column("users", "active"),
                Operator::Equal,
                Expr::from(Literal::Boolean(true)),
            ),
        );
        assert_eq!(
            agg_expr(call).serialize(),
            "COUNT(users.id) FILTER (WHERE (users.active = true))"
        );
    }

    #[test]
    fn distinct_with_order_by() -> Result<(), Error> {
        let call = AggregateCall::new("array_agg", vec![Expr::column("t", "x")])
            .distinct()?
            .order_by(vec![OrderByExpr::from(Expr::column("t", "x"))])?;
        assert_eq!(agg_expr(call).serialize(), "array_agg(DISTINCT t.x ORDER BY t.x)");
        Ok(())
    }

    #[test]
    fn ordered_set_aggregate() {
        let call = OrderedSetAggregateCall::new(
            "percentile_cont",
            vec![Expr::from(Literal::Float(0.5))],
            vec![OrderByExpr::from(Expr::column("t", "x")).asc()],
        );
        assert_eq!(
            Expr::OrderedSetAggregate(call).serialize(),
            "percentile_cont(0.5) WITHIN GROUP (ORDER BY t.x ASC)"
        );
    }

    #[test]
    fn json_object_agg_full_form() {
        let agg = JsonObjectAgg {
            key: Box::new(Expr::column("t", "k")),
            value: Box::new(Expr::column("t", "v")),
            on_null: Some(NullTreatment::Absent),
            unique_keys: Some(UniqueKeys::With),
        };
        assert_eq!(
            Expr::JsonObjectAgg(agg).serialize(),
            "json_object_agg(t.k : t.v ABSENT ON NULL WITH UNIQUE KEYS)"
        );
    }

    #[test]
    fn json_array_agg_with_order() {
        let agg = JsonArrayAgg {
            value: Box::new(Expr::column("t", "v")),
            order_by: vec![OrderByExpr::from(Expr::column("t", "v")).desc()],
            on_null: Some(NullTreatment::Null),
        };
        assert_eq!(
            Expr::JsonArrayAgg(agg).serialize(),
            "json_array_agg(t.v ORDER BY t.v DESC NULL ON NULL)"
        );
    }
}
