use pgqb_core::{comma_separated, Ident, Keyword, Serializable, Token};

use crate::expression::{AggregateArgs, Expr};
use crate::query::OrderByExpr;
use crate::utils::parenthesized;

/// A complete window function call:
/// `name(args) [FILTER (WHERE p)] OVER window`.
///
/// Window definitions themselves are declared at the query level; the call
/// refers to one by name.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowCall {
    /// Function name.
    pub function: Ident,
    /// Call arguments.
    pub args: AggregateArgs,
    /// `FILTER` predicate.
    pub filter: Option<Box<Expr>>,
    /// The window name after `OVER`.
    pub window: Ident,
}

impl Serializable for WindowCall {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Ident(self.function.clone()));
        parenthesized(out, |out| self.args.tokenize_inner(out));
        if let Some(predicate) = &self.filter {
            out.push(Token::Keyword(Keyword::FILTER));
            parenthesized(out, |out| {
                out.push(Token::Keyword(Keyword::WHERE));
                predicate.tokenize(out);
            });
        }
        out.push(Token::Keyword(Keyword::OVER));
        out.push(Token::Ident(self.window.clone()));
    }
}

/// A window definition, the parenthesized body of a `WINDOW name AS (..)`
/// entry.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowDef {
    /// Name of an existing window this definition extends.
    pub existing: Option<Ident>,
    /// `PARTITION BY` expressions.
    pub partition_by: Vec<Expr>,
    /// `ORDER BY` specifications.
    pub order_by: Vec<OrderByExpr>,
    /// Frame clause.
    pub frame: Option<Frame>,
}

impl Serializable for WindowDef {
    fn tokenize(&self, out: &mut Vec<Token>) {
        parenthesized(out, |out| {
            if let Some(existing) = &self.existing {
                out.push(Token::Ident(existing.clone()));
            }
            if !self.partition_by.is_empty() {
                out.push(Token::Keyword(Keyword::PARTITION));
                out.push(Token::Keyword(Keyword::BY));
                comma_separated(out, &self.partition_by);
            }
            if !self.order_by.is_empty() {
                out.push(Token::Keyword(Keyword::ORDER));
                out.push(Token::Keyword(Keyword::BY));
                comma_separated(out, &self.order_by);
            }
            if let Some(frame) = &self.frame {
                frame.tokenize(out);
            }
        });
    }
}

/// Frame mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    /// `RANGE`
    Range,
    /// `ROWS`
    Rows,
    /// `GROUPS`
    Groups,
}

/// A frame start bound. `UNBOUNDED FOLLOWING` is not a legal start, so the
/// type has no way to spell it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameStart {
    /// `UNBOUNDED PRECEDING`
    UnboundedPreceding,
    /// `n PRECEDING`
    Preceding(u64),
    /// `CURRENT ROW`
    CurrentRow,
    /// `n FOLLOWING`
    Following(u64),
}

/// A frame end bound. `UNBOUNDED PRECEDING` is not a legal end, so the
/// type has no way to spell it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameEnd {
    /// `n PRECEDING`
    Preceding(u64),
    /// `CURRENT ROW`
    CurrentRow,
    /// `n FOLLOWING`
    Following(u64),
    /// `UNBOUNDED FOLLOWING`
    UnboundedFollowing,
}

/// Frame exclusion policy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameExclusion {
    /// `EXCLUDE CURRENT ROW`
    CurrentRow,
    /// `EXCLUDE GROUP`
    Group,
    /// `EXCLUDE TIES`
    Ties,
    /// `EXCLUDE NO OTHERS`
    NoOthers,
}

/// A window frame clause.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Frame mode.
    pub kind: FrameKind,
    /// Start bound.
    pub start: FrameStart,
    /// End bound; absent for the single-bound shorthand.
    pub end: Option<FrameEnd>,
    /// Exclusion policy.
    pub exclusion: Option<FrameExclusion>,
}

impl Frame {
    /// `ROWS start`
    pub fn rows(start: FrameStart) -> Self {
        Frame::single(FrameKind::Rows, start)
    }

    /// `ROWS BETWEEN start AND end`
    pub fn rows_between(start: FrameStart, end: FrameEnd) -> Self {
        Frame::bounded(FrameKind::Rows, start, end)
    }

    /// `RANGE start`
    pub fn range(start: FrameStart) -> Self {
        Frame::single(FrameKind::Range, start)
    }

    /// `RANGE BETWEEN start AND end`
    pub fn range_between(start: FrameStart, end: FrameEnd) -> Self {
        Frame::bounded(FrameKind::Range, start, end)
    }

    /// `GROUPS start`
    pub fn groups(start: FrameStart) -> Self {
        Frame::single(FrameKind::Groups, start)
    }

    /// `GROUPS BETWEEN start AND end`
    pub fn groups_between(start: FrameStart, end: FrameEnd) -> Self {
        Frame::bounded(FrameKind::Groups, start, end)
    }

    /// Sets the exclusion policy.
    pub fn exclude(mut self, exclusion: FrameExclusion) -> Self {
        self.exclusion = Some(exclusion);
        self
    }

    fn single(kind: FrameKind, start: FrameStart) -> Self {
        Frame {
            kind,
            start,
            end: None,
            exclusion: None,
        }
    }

    fn bounded(kind: FrameKind, start: FrameStart, end: FrameEnd) -> Self {
        Frame {
            kind,
            start,
            end: Some(end),
            exclusion: None,
        }
    }
}

fn integer(out: &mut Vec<Token>, n: u64) {
    out.push(Token::Literal(pgqb_core::Literal::Integer(
        i64::try_from(n).unwrap_or(i64::MAX),
    )));
}

impl Serializable for FrameStart {
    fn tokenize(&self, out: &mut Vec<Token>) {
        match self {
            FrameStart::UnboundedPreceding => {
                out.push(Token::Keyword(Keyword::UNBOUNDED));
                out.push(Token::Keyword(Keyword::PRECEDING));
            }
            FrameStart::Preceding(n) => {
                integer(out, *n);
                out.push(Token::Keyword(Keyword::PRECEDING));
            }
            FrameStart::CurrentRow => {
                out.push(Token::Keyword(Keyword::CURRENT));
                out.push(Token::Keyword(Keyword::ROW));
            }
            FrameStart::Following(n) => {
                integer(out, *n);
                out.push(Token::Keyword(Keyword::FOLLOWING));
            }
        }
    }
}

impl Serializable for FrameEnd {
    fn tokenize(&self, out: &mut Vec<Token>) {
        match self {
            FrameEnd::Preceding(n) => {
                integer(out, *n);
                out.push(Token::Keyword(Keyword::PRECEDING));
            }
            FrameEnd::CurrentRow => {
                out.push(Token::Keyword(Keyword::CURRENT));
                out.push(Token::Keyword(Keyword::ROW));
            }
            FrameEnd::Following(n) => {
                integer(out, *n);
                out.push(Token::Keyword(Keyword::FOLLOWING));
            }
            FrameEnd::UnboundedFollowing => {
                out.push(Token::Keyword(Keyword::UNBOUNDED));
                out.push(Token::Keyword(Keyword::FOLLOWING));
            }
        }
    }
}

impl Serializable for Frame {
    fn tokenize(&self, out: &mut Vec<Token>) {
        out.push(Token::Keyword(match self.kind {
            FrameKind::Range => Keyword::RANGE,
            FrameKind::Rows => Keyword::ROWS,
            FrameKind::Groups => Keyword::GROUPS,
        }));
        match &self.end {
            Some(end) => {
                out.push(Token::Keyword(Keyword::BETWEEN));
                self.start.tokenize(out);
                out.push(Token::Keyword(Keyword::AND));
                end.tokenize(out);
            }
            None => self.start.tokenize(out),
        }
        if let Some(exclusion) = self.exclusion {
            out.push(Token::Keyword(Keyword::EXCLUDE));
            match exclusion {
                FrameExclusion::CurrentRow => {
                    out.push(Token::Keyword(Keyword::CURRENT));
                    out.push(Token::Keyword(Keyword::ROW));
                }
                FrameExclusion::Group => out.push(Token::Keyword(Keyword::GROUP)),
                FrameExclusion::Ties => out.push(Token::Keyword(Keyword::TIES)),
                FrameExclusion::NoOthers => {
                    out.push(Token::Keyword(Keyword::NO));
                    out.push(Token::Keyword(Keyword::OTHERS));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn window_call_with_filter() {
        let call = WindowCall {
            function: Ident::new("count"),
            args: AggregateArgs::Star,
            filter: Some(Box::new(Expr::column("t", "active"))),
            window: Ident::new("w"),
        };
        assert_eq!(
            Expr::Window(call).serialize(),
            "count(*) FILTER (WHERE t.active) OVER w"
        );
    }

    #[test]
    fn window_def_orders_its_clauses() {
        let def = WindowDef {
            existing: None,
            partition_by: vec![Expr::column("t", "dept")],
            order_by: vec![OrderByExpr::from(Expr::column("t", "salary")).desc()],
            frame: Some(Frame::rows_between(
                FrameStart::UnboundedPreceding,
                FrameEnd::CurrentRow,
            )),
        };
        assert_eq!(
            def.serialize(),
            "(PARTITION BY t.dept ORDER BY t.salary DESC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)"
        );
    }

    #[test]
    fn single_bound_frame_and_exclusion() {
        let frame = Frame::range(FrameStart::Preceding(5)).exclude(FrameExclusion::Ties);
        assert_eq!(frame.serialize(), "RANGE 5 PRECEDING EXCLUDE TIES");

        let frame = Frame::groups(FrameStart::CurrentRow).exclude(FrameExclusion::NoOthers);
        assert_eq!(frame.serialize(), "GROUPS CURRENT ROW EXCLUDE NO OTHERS");
    }

    #[test]
    fn window_def_extending_an_existing_window() {
        let def = WindowDef {
            existing: Some(Ident::new("base")),
            partition_by: Vec::new(),
            order_by: vec![OrderByExpr::from(Expr::column("t", "x"))],
            frame: None,
        };
        assert_eq!(def.serialize(), "(base ORDER BY t.x)");
    }
}
