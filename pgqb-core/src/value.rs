use core::fmt;

/// A host value packed for positional binding.
///
/// These are the elements of the parameter vector handed to the driver;
/// they never appear in the rendered SQL text. Types without a dedicated
/// variant (numeric, date/time, uuid, json) bind through their text form,
/// which every PostgreSQL driver accepts.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// `boolean`
    Bool(bool),
    /// `smallint`
    Int2(i16),
    /// `integer`
    Int4(i32),
    /// `bigint`
    Int8(i64),
    /// `real`
    Float4(f32),
    /// `double precision`
    Float8(f64),
    /// Any text-carried value.
    Text(String),
    /// `bytea`
    Bytes(Vec<u8>),
    /// A one-dimensional array.
    Array(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int2(v) => write!(f, "{}", v),
            Value::Int4(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Float4(v) => write!(f, "{}", v),
            Value::Float8(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int2(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int4(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int8(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float4(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float8(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}
