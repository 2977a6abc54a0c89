//! The parameter binder.
//!
//! Declaration order is the contract: the n-th declared parameter renders
//! as `$n`, and the packer emits host values in the same order. The
//! [`parameters!`] macro is the typed form; [`ParameterMap`] is the
//! runtime-declared form for queries whose shape is not known at compile
//! time.

use std::collections::HashMap;

use indexmap::IndexMap;
use pgqb_ast::DataType;
use pgqb_core::Value;

use crate::expr::Expr;
use crate::types::SqlType;

/// Implemented by [`parameters!`]-generated handle structs.
pub trait Params: Sized {
    /// The host-value record matching the declared fields.
    type Values;

    /// Creates the expression handles, `$1..$n` in declaration order.
    fn declare() -> Self;

    /// Packs a values record into the positional vector.
    fn pack(values: Self::Values) -> Vec<Value>;
}

/// Declares a typed parameter set: a struct of placeholder expressions
/// plus a values record and a packer, tied together by declaration order.
///
/// ```
/// use pgqb_builder::{Int4, Params, Text};
///
/// pgqb_builder::parameters! {
///     /// Parameters of the feed query.
///     pub struct FeedParams: FeedValues {
///         user_id: Int4,
///         tag: Text,
///     }
/// }
///
/// let params = FeedParams::declare();            // user_id = $1, tag = $2
/// let packed = FeedParams::pack(FeedValues {
///     user_id: 7,
///     tag: "rust".to_owned(),
/// });
/// assert_eq!(packed.len(), 2);
/// ```
#[macro_export]
macro_rules! parameters {
    ( $(#[$doc:meta])* $vis:vis struct $name:ident: $values:ident {
        $( $(#[$field_doc:meta])* $field:ident: $field_ty:ty ),* $(,)?
    } ) => {
        $(#[$doc])*
        $vis struct $name {
            $(
                $(#[$field_doc])*
                pub $field: $crate::Expr<$field_ty>,
            )*
        }

        /// Host values for the matching parameter struct, packed in
        /// declaration order.
        $vis struct $values {
            $(
                $(#[$field_doc])*
                pub $field: <$field_ty as $crate::SqlType>::Value,
            )*
        }

        impl $crate::Params for $name {
            type Values = $values;

            fn declare() -> Self {
                let mut index = 0u32;
                let this = Self {
                    $(
                        $field: {
                            index += 1;
                            $crate::Expr::parameter(index)
                        },
                    )*
                };
                let _ = index;
                this
            }

            fn pack(values: $values) -> ::std::vec::Vec<$crate::Value> {
                ::std::vec![
                    $( <$field_ty as $crate::SqlType>::pack(values.$field) ),*
                ]
            }
        }
    };
}

/// A runtime-declared parameter registry.
///
/// Each name is declared once with its type; re-declaring a name hands
/// back the existing placeholder index. Packing reads the values by name
/// and emits them positionally; a missing name packs as [`Value::Null`],
/// which is the caller's responsibility to avoid.
#[derive(Clone, Debug, Default)]
pub struct ParameterMap {
    types: IndexMap<&'static str, DataType>,
}

impl ParameterMap {
    /// An empty registry.
    pub fn new() -> Self {
        ParameterMap::default()
    }

    /// Declares a parameter and returns its placeholder expression.
    pub fn declare<T: SqlType>(&mut self, name: &'static str) -> Expr<T> {
        let index = match self.types.get_index_of(name) {
            Some(index) => index,
            None => {
                self.types.insert(name, T::data_type());
                self.types.len() - 1
            }
        };
        Expr::parameter(index as u32 + 1)
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The declared `(name, type)` pairs, in declaration order.
    pub fn declarations(&self) -> impl Iterator<Item = (&'static str, &DataType)> {
        self.types.iter().map(|(name, ty)| (*name, ty))
    }

    /// Packs named values into the positional vector.
    pub fn pack(&self, mut values: HashMap<&str, Value>) -> Vec<Value> {
        self.types
            .keys()
            .map(|name| values.remove(*name).unwrap_or(Value::Null))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pgqb_core::Serializable;
    use pretty_assertions::assert_eq;

    use crate::types::{Float8, Int4, Text};

    use super::*;

    crate::parameters! {
        /// Parameters used by the tests.
        pub struct TestParams: TestValues {
            user_id: Int4,
            min_score: Float8,
            tag: Text,
        }
    }

    #[test]
    fn handles_render_in_declaration_order() {
        let params = TestParams::declare();
        assert_eq!(params.user_id.serialize(), "$1");
        assert_eq!(params.min_score.serialize(), "$2");
        assert_eq!(params.tag.serialize(), "$3");
    }

    #[test]
    fn packer_follows_declaration_order() {
        let packed = TestParams::pack(TestValues {
            user_id: 7,
            min_score: 0.5,
            tag: "rust".to_owned(),
        });
        assert_eq!(
            packed,
            vec![Value::Int4(7), Value::Float8(0.5), Value::Text("rust".into())]
        );
    }

    #[test]
    fn map_declares_and_packs_positionally() {
        let mut params = ParameterMap::new();
        let user_id: Expr<Int4> = params.declare("user_id");
        let tag: Expr<Text> = params.declare("tag");
        assert_eq!(user_id.serialize(), "$1");
        assert_eq!(tag.serialize(), "$2");
        assert_eq!(params.len(), 2);

        let packed = params.pack(HashMap::from([
            ("tag", Value::Text("rust".into())),
            ("user_id", Value::Int4(7)),
        ]));
        assert_eq!(packed, vec![Value::Int4(7), Value::Text("rust".into())]);
    }

    #[test]
    fn redeclaring_a_name_reuses_its_index() {
        let mut params = ParameterMap::new();
        let first: Expr<Int4> = params.declare("user_id");
        let second: Expr<Int4> = params.declare("user_id");
        assert_eq!(first.serialize(), second.serialize());
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn missing_names_pack_as_null() {
        let mut params = ParameterMap::new();
        let _: Expr<Int4> = params.declare("user_id");
        let packed = params.pack(HashMap::new());
        assert_eq!(packed, vec![Value::Null]);
    }
}
