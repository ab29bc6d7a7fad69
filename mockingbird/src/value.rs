// vim: tw=80
//! Dynamic argument and answer values.
//!
//! A double sees every argument as a [`Value`], and every answer it produces
//! is a `Value` too.  Conversions exist for the common primitive types;
//! anything else can travel as an [`Value::opaque`] value.
use std::{
    any::{self, TypeId},
    cmp::Ordering,
    collections::BTreeMap,
    fmt,
    rc::Rc
};

use downcast::{downcast, Any};

use crate::error::{Error, Result};

/// A value that mockingbird knows nothing about, other than how to compare and
/// print it.
pub trait OpaqueValue: Any + fmt::Debug {
    fn eq_opaque(&self, other: &dyn OpaqueValue) -> bool;

    fn opaque_type_id(&self) -> TypeId;

    fn opaque_type_name(&self) -> &'static str;
}
downcast!(dyn OpaqueValue);

impl<T> OpaqueValue for T
    where T: Any + fmt::Debug + PartialEq
{
    fn eq_opaque(&self, other: &dyn OpaqueValue) -> bool {
        other.downcast_ref::<T>()
            .map(|o| self == o)
            .unwrap_or(false)
    }

    fn opaque_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn opaque_type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// The variant of a [`Value`], used by typed wildcards.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ValueKind {
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Opaque,
}

/// An argument or answer value.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Opaque(Rc<dyn OpaqueValue>),
}

impl Value {
    /// Wrap an arbitrary comparable value.
    pub fn opaque<T>(t: T) -> Self
        where T: Any + fmt::Debug + PartialEq
    {
        Value::Opaque(Rc::new(t))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    /// Borrow the contents of an opaque value as a `T`.
    pub fn downcast_ref<T: Any + fmt::Debug + PartialEq>(&self) -> Option<&T> {
        match self {
            Value::Opaque(o) => o.downcast_ref::<T>().ok(),
            _ => None
        }
    }

    /// Type of the wrapped value, for opaque values.
    pub(crate) fn opaque_type_id(&self) -> Option<TypeId> {
        match self {
            Value::Opaque(o) => Some(o.opaque_type_id()),
            _ => None
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // NaN equals NaN
            (Value::Float(a), Value::Float(b)) =>
                a == b || (a.is_nan() && b.is_nan()),
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => (**a).eq_opaque(&**b),
            _ => false
        }
    }
}

/// Numbers order among themselves, strings among themselves.  Nothing else
/// is ordered.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(l) => {
                f.write_str("[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            },
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                f.write_str("}")
            },
            Value::Opaque(o) => write!(f, "{:?}", o),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

macro_rules! value_from_int {
    ($($t:ty)*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Int(i64::from(i))
                }
            }
        )*
    }
}
value_from_int!{i8 i16 i32 i64 u8 u16 u32}

macro_rules! value_from_wide_int {
    ($($t:ty)*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    match i64::try_from(i) {
                        Ok(i) => Value::Int(i),
                        Err(_) => Value::Float(i as f64)
                    }
                }
            }
        )*
    }
}
value_from_wide_int!{u64 usize isize}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Str(c.to_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(Value::None)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(m: BTreeMap<String, T>) -> Self {
        Value::Map(m.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Conversion from an answer [`Value`] back into a typed return value.
///
/// Generated trait doubles use this to turn whatever the answer chain produced
/// into the method's return type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(value: &Value) -> Error {
    Error::Answer(format!("cannot convert {} into {}", value,
                          any::type_name::<T>()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(_value: Value) -> Result<Self> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch::<bool>(&value))
    }
}

macro_rules! int_from_value {
    ($($t:ty)*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self> {
                    value.as_i64()
                        .and_then(|i| <$t>::try_from(i).ok())
                        .ok_or_else(|| mismatch::<$t>(&value))
                }
            }
        )*
    }
}
int_from_value!{i8 i16 i32 i64 isize u8 u16 u32 u64 usize}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch::<f64>(&value))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        value.as_f64()
            .map(|x| x as f32)
            .ok_or_else(|| mismatch::<f32>(&value))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch::<String>(&other))
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(l) => l.into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Vec<T>>(&other))
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(m) => m.into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(mismatch::<BTreeMap<String, T>>(&other))
        }
    }
}
