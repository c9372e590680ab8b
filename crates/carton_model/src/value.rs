//! Dynamic values and value types exchanged with the binary container.
//!
//! The container side of the system only ever sees a flat, ordered stream of
//! [`Value`]s. [`ValueType`] is the declared shape of a member as it appears
//! in the hierarchy input; resolution rejects members whose declared type has
//! no container encoding.

use core::fmt;
use std::sync::Arc;

use crate::instance::Instance;

// -----------------------------------------------------------------------------
// ValueType

/// The declared type of a field or accessor value.
///
/// Everything except [`ValueType::Opaque`] has a known container encoding.
/// `Opaque` carries the original type name for diagnostics; a property whose
/// anchor declares an opaque type is dropped from the plan with an
/// `UnsupportedType` diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    I32,
    I64,
    F64,
    Str,
    Bytes,
    /// An ordered sequence of one element type.
    Seq(Box<ValueType>),
    /// A nested structural value of the named analyzed type.
    Record(Arc<str>),
    /// A type the container cannot encode.
    Opaque(Arc<str>),
}

impl ValueType {
    /// A sequence of `elem` values.
    #[inline]
    pub fn seq(elem: ValueType) -> Self {
        Self::Seq(Box::new(elem))
    }

    /// A nested record of the named type.
    #[inline]
    pub fn record(type_name: &str) -> Self {
        Self::Record(Arc::from(type_name))
    }

    /// A type with no known container encoding.
    #[inline]
    pub fn opaque(type_name: &str) -> Self {
        Self::Opaque(Arc::from(type_name))
    }

    /// Whether values of this type can be written to the container.
    pub fn is_encodable(&self) -> bool {
        match self {
            Self::Opaque(_) => false,
            Self::Seq(elem) => elem.is_encodable(),
            _ => true,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::F64 => f.write_str("f64"),
            Self::Str => f.write_str("str"),
            Self::Bytes => f.write_str("bytes"),
            Self::Seq(elem) => write!(f, "seq<{elem}>"),
            Self::Record(name) => write!(f, "record<{name}>"),
            Self::Opaque(name) => write!(f, "opaque<{name}>"),
        }
    }
}

// -----------------------------------------------------------------------------
// Value

/// One dynamic value held in an [`Instance`] slot or read from the container.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<Value>),
    Record(Instance),
}

impl Value {
    /// Whether this value conforms to the given declared type.
    ///
    /// Sequences check every element; records check the instance's type name.
    pub fn matches_type(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (Self::Bool(_), ValueType::Bool) => true,
            (Self::I32(_), ValueType::I32) => true,
            (Self::I64(_), ValueType::I64) => true,
            (Self::F64(_), ValueType::F64) => true,
            (Self::Str(_), ValueType::Str) => true,
            (Self::Bytes(_), ValueType::Bytes) => true,
            (Self::Seq(elems), ValueType::Seq(elem)) => {
                elems.iter().all(|v| v.matches_type(elem))
            }
            (Self::Record(instance), ValueType::Record(name)) => {
                instance.type_name() == &**name
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<u8>> for Value {
    #[inline]
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Instance> for Value {
    #[inline]
    fn from(value: Instance) -> Self {
        Self::Record(value)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Value, ValueType};
    use crate::instance::Instance;

    #[test]
    fn scalar_types_match() {
        assert!(Value::from(true).matches_type(&ValueType::Bool));
        assert!(Value::from("x").matches_type(&ValueType::Str));
        assert!(!Value::from(1_i32).matches_type(&ValueType::I64));
    }

    #[test]
    fn seq_checks_every_element() {
        let ty = ValueType::seq(ValueType::I32);
        assert!(Value::Seq(vec![1_i32.into(), 2_i32.into()]).matches_type(&ty));
        assert!(!Value::Seq(vec![1_i32.into(), "two".into()]).matches_type(&ty));
        // The empty sequence conforms to any element type.
        assert!(Value::Seq(Vec::new()).matches_type(&ty));
    }

    #[test]
    fn record_checks_type_name() {
        let ty = ValueType::record("Point");
        assert!(Value::from(Instance::new("Point")).matches_type(&ty));
        assert!(!Value::from(Instance::new("Rect")).matches_type(&ty));
    }

    #[test]
    fn opaque_is_not_encodable() {
        assert!(!ValueType::opaque("java.io.File").is_encodable());
        assert!(!ValueType::seq(ValueType::opaque("Thread")).is_encodable());
        assert!(ValueType::seq(ValueType::Str).is_encodable());
    }
}
