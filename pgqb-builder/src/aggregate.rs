//! Typed staged surfaces for aggregate calls.
//!
//! An aggregate is configured (`DISTINCT`, inner `ORDER BY`, `FILTER`)
//! before it finalizes into an expression via [`IntoExpr`]. The
//! argumentless form is a separate type that simply has no `distinct` or
//! `order_by` method; the generic entry points go through the checked AST
//! constructors instead.

use core::marker::PhantomData;

use pgqb_ast as ast;
use pgqb_core::{Error, Ident};

use crate::expr::{Expr, IntoExpr, OrderSpec};
use crate::query::Labeled;
use crate::types::{BoolLike, SqlType};

fn order_asts(specs: Vec<OrderSpec>) -> Vec<ast::OrderByExpr> {
    specs.into_iter().map(OrderSpec::into_ast).collect()
}

/// A staged aggregate call with arguments.
pub struct Aggregate<T: SqlType> {
    call: ast::AggregateCall,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> Aggregate<T> {
    pub(crate) fn new(name: &str, args: Vec<ast::Expr>) -> Self {
        Aggregate {
            call: ast::AggregateCall::new(name, args),
            marker: PhantomData,
        }
    }

    /// Adds `DISTINCT`. Fails on an argumentless call.
    pub fn distinct(self) -> Result<Self, Error> {
        Ok(Aggregate {
            call: self.call.distinct()?,
            marker: PhantomData,
        })
    }

    /// Adds `ORDER BY` inside the call. Fails on an argumentless call.
    pub fn order_by(self, specs: Vec<OrderSpec>) -> Result<Self, Error> {
        Ok(Aggregate {
            call: self.call.order_by(order_asts(specs))?,
            marker: PhantomData,
        })
    }

    /// Adds `FILTER (WHERE predicate)`.
    pub fn filter_where<B: BoolLike>(mut self, predicate: Expr<B>) -> Self {
        self.call = self.call.filter_where(predicate.into_ast());
        self
    }

    /// Turns the call into a window call over a named window:
    /// `name(args) [FILTER ..] OVER window`.
    pub fn over(self, window: &str) -> Expr<T> {
        Expr::new(ast::Expr::Window(ast::WindowCall {
            function: self.call.name,
            args: self.call.args,
            filter: self.call.filter,
            window: Ident::new(window),
        }))
    }

    /// Labels the aggregate as a projection item.
    pub fn label(self, alias: &str) -> Labeled<T> {
        self.into_expr().label(alias)
    }
}

impl<T: SqlType> IntoExpr<T> for Aggregate<T> {
    fn into_expr(self) -> Expr<T> {
        Expr::new(ast::Expr::Aggregate(self.call))
    }
}

/// An argumentless aggregate over `*`, such as `count(*)`.
///
/// `DISTINCT` and `ORDER BY` do not exist here; the type is how the
/// invariant is spelled.
pub struct StarAggregate<T: SqlType> {
    call: ast::AggregateCall,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> StarAggregate<T> {
    pub(crate) fn new(name: &str) -> Self {
        StarAggregate {
            call: ast::AggregateCall::star(name),
            marker: PhantomData,
        }
    }

    /// Adds `FILTER (WHERE predicate)`.
    pub fn filter_where<B: BoolLike>(mut self, predicate: Expr<B>) -> Self {
        self.call = self.call.filter_where(predicate.into_ast());
        self
    }

    /// Turns the call into a window call over a named window.
    pub fn over(self, window: &str) -> Expr<T> {
        Expr::new(ast::Expr::Window(ast::WindowCall {
            function: self.call.name,
            args: self.call.args,
            filter: self.call.filter,
            window: Ident::new(window),
        }))
    }

    /// Labels the aggregate as a projection item.
    pub fn label(self, alias: &str) -> Labeled<T> {
        self.into_expr().label(alias)
    }
}

impl<T: SqlType> IntoExpr<T> for StarAggregate<T> {
    fn into_expr(self) -> Expr<T> {
        Expr::new(ast::Expr::Aggregate(self.call))
    }
}

/// An ordered-set aggregate awaiting its `WITHIN GROUP` clause.
///
/// Only [`OrderedSet::within_group_order_by`] leads onward; the direct
/// arguments alone are not a complete call.
pub struct OrderedSet<T: SqlType> {
    name: String,
    args: Vec<ast::Expr>,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> OrderedSet<T> {
    pub(crate) fn new(name: &str, args: Vec<ast::Expr>) -> Self {
        OrderedSet {
            name: name.to_owned(),
            args,
            marker: PhantomData,
        }
    }

    /// `name(args) WITHIN GROUP (ORDER BY specs..)`
    pub fn within_group_order_by(self, specs: Vec<OrderSpec>) -> OrderedSetAggregate<T> {
        OrderedSetAggregate {
            call: ast::OrderedSetAggregateCall::new(self.name, self.args, order_asts(specs)),
            marker: PhantomData,
        }
    }
}

/// A complete ordered-set aggregate call.
pub struct OrderedSetAggregate<T: SqlType> {
    call: ast::OrderedSetAggregateCall,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> OrderedSetAggregate<T> {
    /// Adds `FILTER (WHERE predicate)`.
    pub fn filter_where<B: BoolLike>(mut self, predicate: Expr<B>) -> Self {
        self.call = self.call.filter_where(predicate.into_ast());
        self
    }

    /// Labels the aggregate as a projection item.
    pub fn label(self, alias: &str) -> Labeled<T> {
        self.into_expr().label(alias)
    }
}

impl<T: SqlType> IntoExpr<T> for OrderedSetAggregate<T> {
    fn into_expr(self) -> Expr<T> {
        Expr::new(ast::Expr::OrderedSetAggregate(self.call))
    }
}

/// A staged `json_object_agg` call.
pub struct JsonObjectAggregate<T: SqlType> {
    agg: ast::JsonObjectAgg,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> JsonObjectAggregate<T> {
    pub(crate) fn new(key: ast::Expr, value: ast::Expr) -> Self {
        JsonObjectAggregate {
            agg: ast::JsonObjectAgg {
                key: Box::new(key),
                value: Box::new(value),
                on_null: None,
                unique_keys: None,
            },
            marker: PhantomData,
        }
    }

    /// `ABSENT ON NULL`
    pub fn absent_on_null(mut self) -> Self {
        self.agg.on_null = Some(ast::NullTreatment::Absent);
        self
    }

    /// `NULL ON NULL`
    pub fn null_on_null(mut self) -> Self {
        self.agg.on_null = Some(ast::NullTreatment::Null);
        self
    }

    /// `WITH UNIQUE KEYS`
    pub fn with_unique_keys(mut self) -> Self {
        self.agg.unique_keys = Some(ast::UniqueKeys::With);
        self
    }

    /// `WITHOUT UNIQUE KEYS`
    pub fn without_unique_keys(mut self) -> Self {
        self.agg.unique_keys = Some(ast::UniqueKeys::Without);
        self
    }

    /// Labels the aggregate as a projection item.
    pub fn label(self, alias: &str) -> Labeled<T> {
        self.into_expr().label(alias)
    }
}

impl<T: SqlType> IntoExpr<T> for JsonObjectAggregate<T> {
    fn into_expr(self) -> Expr<T> {
        Expr::new(ast::Expr::JsonObjectAgg(self.agg))
    }
}

/// A staged `json_array_agg` call.
pub struct JsonArrayAggregate<T: SqlType> {
    agg: ast::JsonArrayAgg,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> JsonArrayAggregate<T> {
    pub(crate) fn new(value: ast::Expr) -> Self {
        JsonArrayAggregate {
            agg: ast::JsonArrayAgg {
                value: Box::new(value),
                order_by: Vec::new(),
                on_null: None,
            },
            marker: PhantomData,
        }
    }

    /// Adds `ORDER BY` inside the call.
    pub fn order_by(mut self, specs: Vec<OrderSpec>) -> Self {
        self.agg.order_by = order_asts(specs);
        self
    }

    /// `ABSENT ON NULL`
    pub fn absent_on_null(mut self) -> Self {
        self.agg.on_null = Some(ast::NullTreatment::Absent);
        self
    }

    /// `NULL ON NULL`
    pub fn null_on_null(mut self) -> Self {
        self.agg.on_null = Some(ast::NullTreatment::Null);
        self
    }

    /// Labels the aggregate as a projection item.
    pub fn label(self, alias: &str) -> Labeled<T> {
        self.into_expr().label(alias)
    }
}

impl<T: SqlType> IntoExpr<T> for JsonArrayAggregate<T> {
    fn into_expr(self) -> Expr<T> {
        Expr::new(ast::Expr::JsonArrayAgg(self.agg))
    }
}
