//! Phantom marker types describing SQL column types.
//!
//! Markers never exist at runtime; they ride along in `PhantomData` to
//! constrain which operations an expression offers and which host values a
//! parameter accepts. Nullability is part of the marker ([`Nullable`]),
//! and outer joins rewrite it structurally (see the `from` module).

use core::marker::PhantomData;

use pgqb_ast::DataType;
use pgqb_core::Value;

/// A phantom marker describing the SQL type of an expression.
pub trait SqlType: 'static {
    /// The host value bound for parameters of this type.
    type Value;

    /// The marker with nullability stripped.
    type NotNull: SqlType;

    /// The nullable derivation of the marker.
    type Nulled: SqlType;

    /// The printed type name.
    fn data_type() -> DataType;

    /// Converts a host value into a packable [`Value`].
    fn pack(value: Self::Value) -> Value;
}

/// Markers that are not already [`Nullable`].
pub trait BaseType: SqlType {}

macro_rules! base_types {
    ( $( $(#[$doc:meta])* $name:ident => $value:ty, $data_type:expr );* $(;)? ) => {$(
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub struct $name;

        impl SqlType for $name {
            type Value = $value;
            type NotNull = Self;
            type Nulled = Nullable<Self>;

            fn data_type() -> DataType {
                $data_type
            }

            fn pack(value: Self::Value) -> Value {
                value.into()
            }
        }

        impl BaseType for $name {}
    )*};
}

base_types! {
    /// `boolean`
    Bool => bool, DataType::Boolean;
    /// `smallint`
    Int2 => i16, DataType::SmallInt;
    /// `integer`
    Int4 => i32, DataType::Integer;
    /// `bigint`
    Int8 => i64, DataType::BigInt;
    /// `real`
    Float4 => f32, DataType::Real;
    /// `double precision`
    Float8 => f64, DataType::DoublePrecision;
    /// `numeric`, bound through its text form
    Numeric => String, DataType::Numeric;
    /// `text`
    Text => String, DataType::Text;
    /// `varchar`
    VarChar => String, DataType::Varchar;
    /// `date`, bound through its text form
    Date => String, DataType::Date;
    /// `time`, bound through its text form
    Time => String, DataType::Time;
    /// `timestamp`, bound through its text form
    Timestamp => String, DataType::Timestamp;
    /// `timestamptz`, bound through its text form
    TimestampTz => String, DataType::TimestampTz;
    /// `interval`, bound through its text form
    Interval => String, DataType::Interval;
    /// `uuid`, bound through its text form
    Uuid => String, DataType::Uuid;
    /// `json`, bound through its text form
    Json => String, DataType::Json;
    /// `jsonb`, bound through its text form
    Jsonb => String, DataType::Jsonb;
    /// `bytea`
    Bytea => Vec<u8>, DataType::Bytea;
    /// `record`, the type of `ROW(..)` constructors
    Record => String, DataType::Record;
}

/// The nullable derivation of a marker type.
///
/// `Nullable<Nullable<T>>` cannot be formed: the inner marker must be a
/// [`BaseType`], which keeps the derivation idempotent by construction.
pub struct Nullable<T: SqlType>(PhantomData<T>);

impl<T: BaseType> SqlType for Nullable<T> {
    type Value = Option<T::Value>;
    type NotNull = T;
    type Nulled = Nullable<T>;

    fn data_type() -> DataType {
        T::data_type()
    }

    fn pack(value: Self::Value) -> Value {
        match value {
            Some(inner) => T::pack(inner),
            None => Value::Null,
        }
    }
}

/// A one-dimensional array of an element type.
pub struct Array<T: SqlType>(PhantomData<T>);

impl<T: SqlType> SqlType for Array<T> {
    type Value = Vec<T::Value>;
    type NotNull = Self;
    type Nulled = Nullable<Self>;

    fn data_type() -> DataType {
        DataType::Array(Box::new(T::data_type()))
    }

    fn pack(value: Self::Value) -> Value {
        Value::Array(value.into_iter().map(T::pack).collect())
    }
}

impl<T: SqlType> BaseType for Array<T> {}

/// Element types with built-in range types.
pub trait RangeElement: BaseType {
    /// The range type name, e.g. `int4range`.
    const RANGE: &'static str;
    /// The multirange type name, e.g. `int4multirange`.
    const MULTIRANGE: &'static str;
}

macro_rules! range_elements {
    ( $( $name:ident => $range:literal, $multirange:literal );* $(;)? ) => {$(
        impl RangeElement for $name {
            const RANGE: &'static str = $range;
            const MULTIRANGE: &'static str = $multirange;
        }
    )*};
}

range_elements! {
    Int4 => "int4range", "int4multirange";
    Int8 => "int8range", "int8multirange";
    Numeric => "numrange", "nummultirange";
    Date => "daterange", "datemultirange";
    Timestamp => "tsrange", "tsmultirange";
    TimestampTz => "tstzrange", "tstzmultirange";
}

/// A range over an element type, e.g. `Range<Int4>` for `int4range`.
pub struct Range<T: RangeElement>(PhantomData<T>);

impl<T: RangeElement> SqlType for Range<T> {
    type Value = String;
    type NotNull = Self;
    type Nulled = Nullable<Self>;

    fn data_type() -> DataType {
        DataType::Custom(T::RANGE.to_owned())
    }

    fn pack(value: Self::Value) -> Value {
        value.into()
    }
}

impl<T: RangeElement> BaseType for Range<T> {}

/// A multirange over an element type.
pub struct MultiRange<T: RangeElement>(PhantomData<T>);

impl<T: RangeElement> SqlType for MultiRange<T> {
    type Value = String;
    type NotNull = Self;
    type Nulled = Nullable<Self>;

    fn data_type() -> DataType {
        DataType::Custom(T::MULTIRANGE.to_owned())
    }

    fn pack(value: Self::Value) -> Value {
        value.into()
    }
}

impl<T: RangeElement> BaseType for MultiRange<T> {}

macro_rules! impl_capability {
    ( $trait:ident: $( $name:ty ),* $(,)? ) => {$(
        impl $trait for $name {}
    )*};
}

/// Types with an ordering usable by the comparison operators and by
/// `ASC`/`DESC` specifications.
pub trait SqlOrd: SqlType {}

impl_capability!(SqlOrd: Int2, Int4, Int8, Float4, Float8, Numeric, Text, VarChar, Date, Time,
    Timestamp, TimestampTz, Interval, Uuid);

impl<T: BaseType + SqlOrd> SqlOrd for Nullable<T> {}

/// Character types: pattern matching and collation.
pub trait SqlText: SqlType {}

impl_capability!(SqlText: Text, VarChar);

impl<T: BaseType + SqlText> SqlText for Nullable<T> {}

/// Numeric types: arithmetic.
pub trait SqlNumber: SqlType {}

impl_capability!(SqlNumber: Int2, Int4, Int8, Float4, Float8, Numeric);

impl<T: BaseType + SqlNumber> SqlNumber for Nullable<T> {}

/// Boolean-valued types, usable as predicates and with the logical
/// connectives.
pub trait BoolLike: SqlType {}

impl BoolLike for Bool {}
impl BoolLike for Nullable<Bool> {}

/// Relates operand types that may meet across a comparison: a type is
/// compatible with itself and with its nullable counterpart.
pub trait CompatibleWith<T: SqlType>: SqlType {}

impl<T: SqlType> CompatibleWith<T> for T {}
impl<T: BaseType> CompatibleWith<Nullable<T>> for T {}
impl<T: BaseType> CompatibleWith<T> for Nullable<T> {}

/// Declares a marker for a named SQL type outside the built-in registry:
/// an enum, domain or extension type.
///
/// ```
/// pgqb_builder::sql_type! {
///     /// The `mood` enum.
///     pub struct Mood => "mood";
/// }
/// ```
#[macro_export]
macro_rules! sql_type {
    ( $( $(#[$doc:meta])* $vis:vis struct $name:ident => $sql_name:expr; )* ) => {$(
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        $vis struct $name;

        impl $crate::SqlType for $name {
            type Value = ::std::string::String;
            type NotNull = Self;
            type Nulled = $crate::Nullable<Self>;

            fn data_type() -> $crate::DataType {
                $crate::DataType::Custom($sql_name.into())
            }

            fn pack(value: Self::Value) -> $crate::Value {
                value.into()
            }
        }

        impl $crate::BaseType for $name {}
    )*};
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn data_type_names() {
        assert_eq!(Int4::data_type(), DataType::Integer);
        assert_eq!(Nullable::<Text>::data_type(), DataType::Text);
        assert_eq!(
            Array::<Int4>::data_type(),
            DataType::Array(Box::new(DataType::Integer))
        );
        assert_eq!(
            Range::<Int4>::data_type(),
            DataType::Custom("int4range".into())
        );
    }

    #[test]
    fn nullable_packing_maps_options() {
        assert_eq!(Nullable::<Int4>::pack(Some(7)), Value::Int4(7));
        assert_eq!(Nullable::<Int4>::pack(None), Value::Null);
    }

    #[test]
    fn array_packing_maps_elements() {
        assert_eq!(
            Array::<Int2>::pack(vec![1, 2]),
            Value::Array(vec![Value::Int2(1), Value::Int2(2)])
        );
    }
}
