//! Window definitions and partial window calls.

use core::marker::PhantomData;

use pgqb_ast as ast;
use pgqb_core::Ident;

use crate::expr::{AnyExpr, Expr, OrderSpec};
use crate::types::{BoolLike, SqlType};

/// Builder for a window definition, the body of one `WINDOW name AS (..)`
/// entry.
#[derive(Clone, Debug, Default)]
pub struct WindowSpec {
    pub(crate) def: ast::WindowDef,
}

impl WindowSpec {
    /// An empty window definition.
    pub fn new() -> Self {
        WindowSpec::default()
    }

    /// A definition extending an existing named window.
    pub fn based_on(name: &str) -> Self {
        WindowSpec {
            def: ast::WindowDef {
                existing: Some(Ident::new(name)),
                ..ast::WindowDef::default()
            },
        }
    }

    /// Sets `PARTITION BY`.
    pub fn partition_by(mut self, keys: Vec<AnyExpr>) -> Self {
        self.def.partition_by = keys.into_iter().map(AnyExpr::into_ast).collect();
        self
    }

    /// Sets `ORDER BY`.
    pub fn order_by(mut self, specs: Vec<OrderSpec>) -> Self {
        self.def.order_by = specs.into_iter().map(OrderSpec::into_ast).collect();
        self
    }

    /// Sets the frame clause.
    pub fn frame(mut self, frame: ast::Frame) -> Self {
        self.def.frame = Some(frame);
        self
    }
}

/// A partial window call: function and arguments fixed, `FILTER` still
/// addable, `OVER` still missing.
///
/// The call is not an expression until [`WindowFunction::over`] names the
/// window it runs over.
pub struct WindowFunction<T: SqlType> {
    function: Ident,
    args: ast::AggregateArgs,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> WindowFunction<T> {
    pub(crate) fn new(function: &str, args: ast::AggregateArgs) -> Self {
        WindowFunction {
            function: Ident::new(function),
            args,
            marker: PhantomData,
        }
    }

    /// Adds `FILTER (WHERE predicate)`. The returned call can only be
    /// completed with `over`; a second filter cannot be spelled.
    pub fn filter_where<B: BoolLike>(self, predicate: Expr<B>) -> FilteredWindowFunction<T> {
        FilteredWindowFunction {
            function: self.function,
            args: self.args,
            filter: predicate.into_ast(),
            marker: PhantomData,
        }
    }

    /// Completes the call over a named window: `fn(args) OVER window`.
    pub fn over(self, window: &str) -> Expr<T> {
        Expr::new(ast::Expr::Window(ast::WindowCall {
            function: self.function,
            args: self.args,
            filter: None,
            window: Ident::new(window),
        }))
    }
}

/// A partial window call whose `FILTER` is set; only `over` remains.
pub struct FilteredWindowFunction<T: SqlType> {
    function: Ident,
    args: ast::AggregateArgs,
    filter: ast::Expr,
    marker: PhantomData<fn() -> T>,
}

impl<T: SqlType> FilteredWindowFunction<T> {
    /// Completes the call over a named window.
    pub fn over(self, window: &str) -> Expr<T> {
        Expr::new(ast::Expr::Window(ast::WindowCall {
            function: self.function,
            args: self.args,
            filter: Some(Box::new(self.filter)),
            window: Ident::new(window),
        }))
    }
}
