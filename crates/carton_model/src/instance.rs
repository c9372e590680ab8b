//! Dynamic instances the codec reads from and writes into.
//!
//! An [`Instance`] is a type-erased record of storage slots, keyed by the
//! declaring type name and the field name. Keying by declaring type keeps
//! shadowed fields (same name at different hierarchy levels) in distinct
//! slots, mirroring the fact that they back different storage.

use std::sync::Arc;

use crate::hash::HashMap;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Instance

/// A dynamic record holding the structural state of one analyzed type.
///
/// # Examples
///
/// ```
/// use carton_model::instance::Instance;
/// use carton_model::value::Value;
///
/// let mut point = Instance::new("Point");
/// point.set("Point", "x", 3_i64);
/// point.set("Point", "y", 5_i64);
///
/// assert_eq!(point.get("Point", "x"), Some(&Value::I64(3)));
/// assert_eq!(point.get("Point", "z"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    type_name: Arc<str>,
    slots: HashMap<Arc<str>, HashMap<Arc<str>, Value>>,
}

impl Instance {
    /// A blank instance of the named type with no slots set.
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: Arc::from(type_name),
            slots: HashMap::default(),
        }
    }

    /// The analyzed type this instance belongs to.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set the slot `field` declared by `declaring`.
    pub fn set(&mut self, declaring: &str, field: &str, value: impl Into<Value>) {
        self.slots
            .entry(Arc::from(declaring))
            .or_default()
            .insert(Arc::from(field), value.into());
    }

    /// Read the slot `field` declared by `declaring`.
    pub fn get(&self, declaring: &str, field: &str) -> Option<&Value> {
        self.slots.get(declaring)?.get(field)
    }

    /// Number of slots currently set.
    pub fn slot_len(&self) -> usize {
        self.slots.values().map(HashMap::len).sum()
    }
}

// -----------------------------------------------------------------------------
// Tests
