//! Resolved properties, access strategies, and the serialization plan.

use std::sync::Arc;

use carton_model::ValueType;

// -----------------------------------------------------------------------------
// AccessStrategy

/// A reference to one accessor method and the storage slot it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorRef {
    /// The accessor method name.
    pub name: Arc<str>,
    /// The storage slot the accessor is bound to, if declared.
    pub backing: Option<Arc<str>>,
}

/// The mechanism by which emitted code reads and writes one property.
///
/// Decided once per property at resolution time; encode/decode never perform
/// visibility checks again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessStrategy {
    /// Read and write the storage slot directly.
    DirectField { field: Arc<str> },
    /// Invoke a paired reader/writer. A missing writer makes the property
    /// read-only: encode serializes it, decode consumes and skips it.
    AccessorPair {
        reader: AccessorRef,
        writer: Option<AccessorRef>,
    },
    /// No viable mechanism. Terminal for the property; never enters a plan.
    Unresolved,
}

impl AccessStrategy {
    /// Whether decode can restore this property.
    #[inline]
    pub fn is_writable(&self) -> bool {
        match self {
            Self::DirectField { .. } => true,
            Self::AccessorPair { writer, .. } => writer.is_some(),
            Self::Unresolved => false,
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

// -----------------------------------------------------------------------------
// PropertyDescriptor

/// One resolved logical property, the unit of serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub(crate) name: Arc<str>,
    pub(crate) declared_by: Arc<str>,
    pub(crate) value_type: ValueType,
    pub(crate) strategy: AccessStrategy,
    pub(crate) sealed: bool,
    pub(crate) order: usize,
}

impl PropertyDescriptor {
    /// Canonical property name.
    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Name of the type declaring this property.
    #[inline]
    pub fn declared_by(&self) -> &Arc<str> {
        &self.declared_by
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn strategy(&self) -> &AccessStrategy {
        &self.strategy
    }

    /// Whether the read anchor is sealed against overriding. Carried as
    /// metadata only; sealing never affects serializability.
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Position in the plan. Encode and decode iterate this order.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }
}

// -----------------------------------------------------------------------------
// SerializationPlan

/// The ordered, resolved property list for one type.
///
/// Order is stable: superclass-declared properties precede subclass-declared
/// ones, declaration order within each type. Encode and decode both iterate
/// this exact sequence; it is the sole mechanism ensuring positional
/// correctness, since the container carries no field names.
#[derive(Debug, Clone)]
pub struct SerializationPlan {
    type_name: Arc<str>,
    properties: Box<[PropertyDescriptor]>,
}

impl SerializationPlan {
    pub(crate) fn new(type_name: Arc<str>, mut properties: Vec<PropertyDescriptor>) -> Self {
        for (order, property) in properties.iter_mut().enumerate() {
            property.order = order;
        }
        Self {
            type_name,
            properties: properties.into_boxed_slice(),
        }
    }

    /// An empty plan, used when analysis of the type failed outright.
    pub(crate) fn empty(type_name: Arc<str>) -> Self {
        Self::new(type_name, Vec::new())
    }

    /// The analyzed type this plan belongs to.
    #[inline]
    pub fn type_name(&self) -> &Arc<str> {
        &self.type_name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties in plan order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &PropertyDescriptor> {
        self.properties.iter()
    }

    /// Look up a property by declaring type and canonical name.
    pub fn property(&self, declared_by: &str, name: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| &*p.declared_by == declared_by && &*p.name == name)
    }
}
