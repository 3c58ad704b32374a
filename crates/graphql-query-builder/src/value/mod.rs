//! Argument values and their GraphQL literal rendering.
//!
//! [`Value`] is the argument model used by both the field tree and the
//! [`QueryBlock`](crate::QueryBlock) tree. Primitive values render as GraphQL
//! literals, lists and objects render structurally, and anything that
//! implements [`serde::Serialize`] can be converted with
//! [`Value::from_serialize`].
//!
//! # Example
//!
//! ```
//! use graphql_query_builder::{Value, Variable};
//!
//! assert_eq!(Value::from("hello").to_string(), "\"hello\"");
//! assert_eq!(Value::from(true).to_string(), "true");
//! assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
//!
//! let id = Variable::new("$id", "Int").unwrap();
//! assert_eq!(Value::from(id).to_string(), "$id");
//! ```

pub mod date_time;
mod ser;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, TimeZone};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::variable::Variable;

pub(crate) use ser::VARIABLE_MARKER;

/// A GraphQL argument value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    /// Only used for unsigned values that do not fit into `i64`.
    UInt(u64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    /// A bare enum symbol, rendered unquoted.
    Enum(String),
    Variable(Variable),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Creates an enum value rendered as its bare symbol.
    #[must_use]
    pub fn enum_value(symbol: impl Into<String>) -> Self {
        Self::Enum(symbol.into())
    }

    /// Converts any serializable value into an argument value.
    ///
    /// Struct fields keep their declaration order, unit enum variants become
    /// [`Value::Enum`] and [`Variable`]s nested anywhere stay variables.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        value.serialize(ser::ValueSerializer)
    }

    /// Renders the value as a GraphQL literal if it is a primitive.
    ///
    /// Returns `None` for null, lists and objects, which are rendered
    /// structurally by the [`Display`](fmt::Display) implementation.
    #[must_use]
    pub fn primitive_literal(&self) -> Option<String> {
        match self {
            Self::Bool(value) => Some(value.to_string()),
            Self::Int(value) => Some(value.to_string()),
            Self::UInt(value) => Some(value.to_string()),
            Self::Float(value) if value.is_finite() => Some(value.to_string()),
            Self::String(value) => Some(format!("\"{value}\"")),
            Self::DateTime(value) => Some(format!("\"{}\"", date_time::to_literal(value))),
            Self::Enum(symbol) => Some(symbol.clone()),
            Self::Variable(variable) => Some(variable.name().to_string()),
            Self::Float(_) | Self::Null | Self::List(_) | Self::Object(_) => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    /// Visits every variable referenced anywhere inside this value.
    pub fn for_each_variable(&self, visit: &mut impl FnMut(&Variable)) {
        match self {
            Self::Variable(variable) => visit(variable),
            Self::List(items) => {
                for item in items {
                    item.for_each_variable(visit);
                }
            }
            Self::Object(map) => {
                for item in map.values() {
                    item.for_each_variable(visit);
                }
            }
            _ => {}
        }
    }

    /// Deep-merges `incoming` into this value.
    ///
    /// Objects merge key by key, recursively. Any other combination is
    /// replaced by the incoming value.
    pub fn merge(&mut self, incoming: &Self) {
        match (self, incoming) {
            (Self::Object(existing), Self::Object(incoming)) => {
                for (key, value) in incoming {
                    match existing.get_mut(key) {
                        Some(current) => current.merge(value),
                        None => {
                            existing.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            (current, incoming) => *current = incoming.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(literal) = self.primitive_literal() {
            return f.write_str(&literal);
        }

        match self {
            Self::List(items) if !items.is_empty() => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(map) if !map.is_empty() => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}:{item}")?;
                }
                f.write_str("}")
            }
            _ => f.write_str("null"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Int(value) => serializer.serialize_i64(*value),
            Self::UInt(value) => serializer.serialize_u64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::String(value) | Self::Enum(value) => serializer.serialize_str(value),
            Self::DateTime(value) => date_time::serialize(value, serializer),
            Self::Variable(variable) => variable.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, item) in map {
                    out.serialize_entry(key, item)?;
                }
                out.end()
            }
        }
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    i64::try_from(value).map_or(Self::UInt(value as u64), Self::Int)
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64, u8, u16, u32);
impl_from_unsigned!(u64, usize);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        // Going through the shortest representation keeps `0.1f32` as `0.1`.
        Self::Float(value.to_string().parse().unwrap_or_else(|_| f64::from(value)))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<Variable> for Value {
    fn from(value: Variable) -> Self {
        Self::Variable(value)
    }
}

impl From<&Variable> for Value {
    fn from(value: &Variable) -> Self {
        Self::Variable(value.clone())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Self::DateTime(value.fixed_offset())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(value: BTreeMap<K, V>) -> Self {
        Self::Object(value.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<IndexMap<K, V>> for Value {
    fn from(value: IndexMap<K, V>) -> Self {
        Self::Object(value.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
