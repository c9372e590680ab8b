//! The binary container seam.
//!
//! The container itself is an external primitive; all this crate assumes is
//! an ordered, type-directed pair of `write`/`read` operations. The wire
//! format is out of scope. [`SeqContainer`] is an in-memory implementation
//! used by tests and as a reference for the ordering contract.

use std::collections::VecDeque;

use thiserror::Error;

use carton_model::{Value, ValueType};

// -----------------------------------------------------------------------------
// Traits

/// Ordered appending of values to a container.
pub trait ContainerWrite {
    /// Append `value` after everything written so far.
    fn write(&mut self, value: &Value) -> Result<(), ContainerError>;
}

/// Ordered, type-directed consumption of values from a container.
///
/// The container carries no field names; the caller supplies the expected
/// type of the next value, fixed by plan order.
pub trait ContainerRead {
    /// Consume the next value, which must conform to `expected`.
    fn read(&mut self, expected: &ValueType) -> Result<Value, ContainerError>;
}

// -----------------------------------------------------------------------------
// ContainerError

/// Failures at the container boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContainerError {
    #[error("unexpected end of container")]
    Exhausted,

    #[error("container value does not conform to expected type `{expected}`")]
    TypeMismatch { expected: ValueType },
}

// -----------------------------------------------------------------------------
// SeqContainer

/// An in-memory container holding an ordered value sequence.
///
/// # Examples
///
/// ```
/// use carton_codec::container::{ContainerRead, ContainerWrite, SeqContainer};
/// use carton_model::{Value, ValueType};
///
/// let mut container = SeqContainer::new();
/// container.write(&Value::I64(7)).unwrap();
/// container.write(&Value::Str("x".into())).unwrap();
///
/// assert_eq!(container.read(&ValueType::I64).unwrap(), Value::I64(7));
/// assert_eq!(container.read(&ValueType::Str).unwrap(), Value::Str("x".into()));
/// assert!(container.read(&ValueType::Bool).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeqContainer {
    values: VecDeque<Value>,
}

impl SeqContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ContainerWrite for SeqContainer {
    fn write(&mut self, value: &Value) -> Result<(), ContainerError> {
        self.values.push_back(value.clone());
        Ok(())
    }
}

impl ContainerRead for SeqContainer {
    fn read(&mut self, expected: &ValueType) -> Result<Value, ContainerError> {
        let value = self.values.pop_front().ok_or(ContainerError::Exhausted)?;
        if !value.matches_type(expected) {
            return Err(ContainerError::TypeMismatch {
                expected: expected.clone(),
            });
        }
        Ok(value)
    }
}

// -----------------------------------------------------------------------------
// Tests
