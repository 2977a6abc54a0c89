//! Table declarations and the row-handle machinery.
//!
//! A table is declared once with [`table!`]; the macro generates a handle
//! struct whose column accessors produce typed expressions. Handles are
//! generic over a [`Nullability`] transform so outer joins can present the
//! same table with every column nullable, without a second declaration.

use crate::types::SqlType;

/// The nullability transform a join applies to a handle's columns.
pub trait Nullability: Copy + 'static {
    /// Applies the transform to one column type.
    type Col<T: SqlType>: SqlType;

    /// The transform after a further outer join.
    type Nulled: Nullability;
}

/// Identity transform: columns keep their declared types.
#[derive(Copy, Clone, Debug, Default)]
pub struct Intact;

/// Outer-side transform: every column becomes nullable.
#[derive(Copy, Clone, Debug, Default)]
pub struct Nulled;

impl Nullability for Intact {
    type Col<T: SqlType> = T;
    type Nulled = Nulled;
}

impl Nullability for Nulled {
    type Col<T: SqlType> = T::Nulled;
    type Nulled = Nulled;
}

/// A tuple of table handles threaded through the builder callbacks.
///
/// Joins nest pairs, so after `a.join(b).join(c)` the callbacks receive
/// `&((A, B), C)` and destructure it with the matching pattern.
pub trait Row: Clone {
    /// The same shape with every column nullable.
    type Nulled: Row;

    /// Applies the outer-join transform.
    fn nulled(self) -> Self::Nulled;
}

impl<A: Row, B: Row> Row for (A, B) {
    type Nulled = (A::Nulled, B::Nulled);

    fn nulled(self) -> Self::Nulled {
        (self.0.nulled(), self.1.nulled())
    }
}

/// A table definition generated by [`table!`].
pub trait Table: Row {
    /// The real table name.
    const NAME: &'static str;

    /// Creates a handle whose column references qualify with `alias`.
    fn handle(alias: &'static str) -> Self;
}

/// Declares a table: a handle struct with one typed column accessor per
/// declared column.
///
/// ```
/// use pgqb_builder::{Bool, Int4, Text};
///
/// pgqb_builder::table! {
///     /// The posts table.
///     pub struct Posts as "posts" {
///         id: Int4,
///         name: Text,
///         deleted: Bool,
///     }
/// }
/// ```
///
/// A column whose SQL name is not a Rust identifier takes an explicit
/// name: `user_group: Text as "user group"`.
#[macro_export]
macro_rules! table {
    ( $( $(#[$doc:meta])* $vis:vis struct $name:ident as $table:literal {
        $( $(#[$col_doc:meta])* $col:ident: $col_ty:ty $(as $col_name:literal)? ),* $(,)?
    } )* ) => {$(
        $(#[$doc])*
        #[derive(Copy, Clone, Debug)]
        $vis struct $name<N: $crate::Nullability = $crate::Intact> {
            alias: &'static str,
            marker: ::core::marker::PhantomData<N>,
        }

        impl<N: $crate::Nullability> $name<N> {
            $(
                $(#[$col_doc])*
                pub fn $col(&self) -> $crate::Expr<N::Col<$col_ty>> {
                    $crate::field(self.alias, $crate::__column_name!($col $(, $col_name)?))
                }
            )*
        }

        impl<N: $crate::Nullability> $crate::Row for $name<N> {
            type Nulled = $name<N::Nulled>;

            fn nulled(self) -> Self::Nulled {
                $name {
                    alias: self.alias,
                    marker: ::core::marker::PhantomData,
                }
            }
        }

        impl $crate::Table for $name {
            const NAME: &'static str = $table;

            fn handle(alias: &'static str) -> Self {
                $name {
                    alias,
                    marker: ::core::marker::PhantomData,
                }
            }
        }

        impl $name {
            /// Starts a `FROM` clause at this table.
            pub fn table() -> $crate::BaseTable<Self> {
                $crate::BaseTable::new()
            }
        }
    )*};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __column_name {
    ( $col:ident ) => {
        stringify!($col)
    };
    ( $col:ident, $col_name:expr ) => {
        $col_name
    };
}
