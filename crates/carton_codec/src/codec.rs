//! The code emitter: symmetric encode/decode routines from one plan.
//!
//! A [`Codec`] is compiled once from a [`SerializationPlan`] and executes the
//! plan's access strategies against dynamic [`Instance`]s. Encode and decode
//! always iterate the identical plan and order; this is the sole mechanism
//! ensuring positional correctness, since the container carries no field
//! names.

use std::fmt;
use std::sync::Arc;

use log::trace;
use thiserror::Error;

use carton_model::{Instance, Value, ValueType};
use carton_plan::{
    AccessStrategy, Diagnostic, DiagnosticKind, PropertyDescriptor, SerializationPlan,
};

use crate::container::{ContainerError, ContainerRead, ContainerWrite};

// -----------------------------------------------------------------------------
// Constructor

/// An externally supplied reference producing a blank instance for decode.
pub struct Constructor {
    func: Box<dyn Fn() -> Instance + Send + Sync>,
}

impl Constructor {
    pub fn new(func: impl Fn() -> Instance + Send + Sync + 'static) -> Self {
        Self {
            func: Box::new(func),
        }
    }

    /// A constructor producing an empty instance of the named type.
    pub fn blank(type_name: &str) -> Self {
        let type_name: Arc<str> = Arc::from(type_name);
        Self::new(move || Instance::new(&type_name))
    }

    /// Produce one blank instance.
    #[inline]
    pub fn construct(&self) -> Instance {
        (self.func)()
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Constructor")
    }
}

// -----------------------------------------------------------------------------
// ExecError

/// Failures while executing a compiled codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("slot `{declaring}.{field}` is missing on the instance")]
    MissingSlot {
        declaring: Arc<str>,
        field: Arc<str>,
    },

    #[error("accessor `{accessor}` has no backing slot binding")]
    UnboundAccessor { accessor: Arc<str> },

    #[error("value for `{type_name}.{property}` does not conform to declared type `{expected}`")]
    TypeMismatch {
        type_name: Arc<str>,
        property: Arc<str>,
        expected: ValueType,
    },

    #[error("`{type_name}.{property}` has no serializable access mechanism")]
    Unresolved {
        type_name: Arc<str>,
        property: Arc<str>,
    },
}

// -----------------------------------------------------------------------------
// Codec

/// The result of one decode run: the reconstructed instance plus a
/// diagnostic for every read-only property whose value was consumed but
/// could not be written back.
#[derive(Debug)]
pub struct Decoded {
    pub instance: Instance,
    pub skipped: Vec<Diagnostic>,
}

/// Paired encode/decode routines compiled from one plan.
///
/// # Examples
///
/// ```
/// use carton_codec::codec::{Codec, Constructor};
/// use carton_codec::container::SeqContainer;
/// use carton_model::{Instance, TypeDecl, TypeModel, Value, ValueType, Visibility};
/// use carton_plan::{Analyzer, GenerationScope};
///
/// let mut model = TypeModel::new();
/// model.register(
///     TypeDecl::new("Point", "geo")
///         .field("x", ValueType::I64, Visibility::Public)
///         .field("y", ValueType::I64, Visibility::Public),
/// ).unwrap();
/// let analyzer = Analyzer::new(model, GenerationScope::in_module("geo"));
/// let codec = Codec::compile(analyzer.plan_for("Point").plan.clone());
///
/// let mut point = Instance::new("Point");
/// point.set("Point", "x", 3_i64);
/// point.set("Point", "y", 5_i64);
///
/// let mut container = SeqContainer::new();
/// codec.encode(&point, &mut container).unwrap();
///
/// let decoded = codec.decode(&mut container, &Constructor::blank("Point")).unwrap();
/// assert_eq!(decoded.instance.get("Point", "x"), Some(&Value::I64(3)));
/// assert!(decoded.skipped.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    plan: SerializationPlan,
}

impl Codec {
    /// Compile a codec for one resolved plan.
    pub fn compile(plan: SerializationPlan) -> Self {
        Self { plan }
    }

    #[inline]
    pub fn plan(&self) -> &SerializationPlan {
        &self.plan
    }

    /// Read every property in plan order and append it to the container.
    pub fn encode(
        &self,
        instance: &Instance,
        out: &mut dyn ContainerWrite,
    ) -> Result<(), ExecError> {
        for property in self.plan.iter() {
            let value = self.read_property(instance, property)?;
            if !value.matches_type(property.value_type()) {
                return Err(ExecError::TypeMismatch {
                    type_name: property.declared_by().clone(),
                    property: property.name().clone(),
                    expected: property.value_type().clone(),
                });
            }
            trace!(
                "encode `{}.{}` at position {}",
                property.declared_by(),
                property.name(),
                property.order(),
            );
            out.write(&value)?;
        }
        Ok(())
    }

    /// Construct a blank instance and restore every property in plan order.
    ///
    /// Read-only properties are consumed from the container (positions must
    /// stay aligned) but not written; each is reported in
    /// [`Decoded::skipped`] rather than silently dropped.
    pub fn decode(
        &self,
        input: &mut dyn ContainerRead,
        constructor: &Constructor,
    ) -> Result<Decoded, ExecError> {
        let mut instance = constructor.construct();
        let mut skipped = Vec::new();

        for property in self.plan.iter() {
            let value = input.read(property.value_type())?;
            match self.write_target(property)? {
                Some(slot) => {
                    instance.set(property.declared_by(), slot, value);
                }
                None => {
                    trace!(
                        "decode skips read-only `{}.{}`",
                        property.declared_by(),
                        property.name(),
                    );
                    skipped.push(Diagnostic::new(
                        property.declared_by().clone(),
                        Some(property.name().clone()),
                        DiagnosticKind::ReadOnlySkipped,
                    ));
                }
            }
        }
        Ok(Decoded { instance, skipped })
    }

    /// Fetch a property's value from the instance via its strategy.
    fn read_property(
        &self,
        instance: &Instance,
        property: &PropertyDescriptor,
    ) -> Result<Value, ExecError> {
        let slot = match property.strategy() {
            AccessStrategy::DirectField { field } => field,
            AccessStrategy::AccessorPair { reader, .. } => {
                reader.backing.as_ref().ok_or_else(|| ExecError::UnboundAccessor {
                    accessor: reader.name.clone(),
                })?
            }
            AccessStrategy::Unresolved => {
                return Err(ExecError::Unresolved {
                    type_name: property.declared_by().clone(),
                    property: property.name().clone(),
                });
            }
        };
        instance
            .get(property.declared_by(), slot)
            .cloned()
            .ok_or_else(|| ExecError::MissingSlot {
                declaring: property.declared_by().clone(),
                field: slot.clone(),
            })
    }

    /// The slot decode writes into, or `None` for read-only properties.
    fn write_target<'p>(
        &self,
        property: &'p PropertyDescriptor,
    ) -> Result<Option<&'p Arc<str>>, ExecError> {
        match property.strategy() {
            AccessStrategy::DirectField { field } => Ok(Some(field)),
            AccessStrategy::AccessorPair { writer: Some(writer), .. } => writer
                .backing
                .as_ref()
                .map(Some)
                .ok_or_else(|| ExecError::UnboundAccessor {
                    accessor: writer.name.clone(),
                }),
            AccessStrategy::AccessorPair { writer: None, .. } => Ok(None),
            AccessStrategy::Unresolved => Err(ExecError::Unresolved {
                type_name: property.declared_by().clone(),
                property: property.name().clone(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use carton_model::{Instance, TypeDecl, TypeModel, Value, ValueType, Visibility};
    use carton_plan::{Analyzer, DiagnosticKind, GenerationScope};

    use super::{Codec, Constructor, ExecError};
    use crate::container::SeqContainer;

    fn codec_for(model: TypeModel, scope: GenerationScope, leaf: &str) -> Codec {
        let analyzer = Analyzer::new(model, scope);
        Codec::compile(analyzer.plan_for(leaf).plan.clone())
    }

    #[test]
    fn round_trip_restores_every_writable_property() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("Rec", "m")
                    .field("flag", ValueType::Bool, Visibility::Public)
                    .field("count", ValueType::I32, Visibility::Public)
                    .field("label", ValueType::Str, Visibility::Public),
            )
            .unwrap();
        let codec = codec_for(model, GenerationScope::foreign(), "Rec");

        let mut original = Instance::new("Rec");
        original.set("Rec", "flag", true);
        original.set("Rec", "count", 9_i32);
        original.set("Rec", "label", "hello");

        let mut container = SeqContainer::new();
        codec.encode(&original, &mut container).unwrap();
        assert_eq!(container.len(), 3);

        let decoded = codec
            .decode(&mut container, &Constructor::blank("Rec"))
            .unwrap();
        assert!(decoded.skipped.is_empty());
        assert_eq!(decoded.instance, original);
    }

    #[test]
    fn accessor_pair_reads_and_writes_its_backing_slot() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .field("inner", ValueType::Str, Visibility::Private)
                    .reader("getLabel", ValueType::Str, Visibility::Public, Some("inner"))
                    .writer("setLabel", ValueType::Str, Visibility::Public, Some("inner")),
            )
            .unwrap();
        let codec = codec_for(model, GenerationScope::foreign(), "A");

        let mut original = Instance::new("A");
        original.set("A", "inner", "payload");

        let mut container = SeqContainer::new();
        codec.encode(&original, &mut container).unwrap();
        let decoded = codec
            .decode(&mut container, &Constructor::blank("A"))
            .unwrap();
        assert_eq!(
            decoded.instance.get("A", "inner"),
            Some(&Value::Str("payload".into()))
        );
    }

    #[test]
    fn read_only_property_is_consumed_and_reported() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .reader("getId", ValueType::I64, Visibility::Public, Some("id"))
                    .writer("setId", ValueType::I64, Visibility::Private, Some("id"))
                    .field("name", ValueType::Str, Visibility::Public),
            )
            .unwrap();
        let codec = codec_for(model, GenerationScope::foreign(), "A");

        let mut original = Instance::new("A");
        original.set("A", "id", 42_i64);
        original.set("A", "name", "n");

        let mut container = SeqContainer::new();
        codec.encode(&original, &mut container).unwrap();

        let decoded = codec
            .decode(&mut container, &Constructor::blank("A"))
            .unwrap();
        // `id` was consumed (so `name` stayed aligned) but not restored.
        assert_eq!(decoded.instance.get("A", "id"), None);
        assert_eq!(decoded.instance.get("A", "name"), Some(&Value::Str("n".into())));
        assert_eq!(decoded.skipped.len(), 1);
        assert_eq!(decoded.skipped[0].kind(), DiagnosticKind::ReadOnlySkipped);
    }

    #[test]
    fn missing_slot_fails_encode() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").field("x", ValueType::I32, Visibility::Public))
            .unwrap();
        let codec = codec_for(model, GenerationScope::foreign(), "A");

        let empty = Instance::new("A");
        let mut container = SeqContainer::new();
        assert!(matches!(
            codec.encode(&empty, &mut container),
            Err(ExecError::MissingSlot { .. })
        ));
    }

    #[test]
    fn slot_value_must_conform_to_declared_type() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").field("x", ValueType::I32, Visibility::Public))
            .unwrap();
        let codec = codec_for(model, GenerationScope::foreign(), "A");

        let mut bad = Instance::new("A");
        bad.set("A", "x", "not a number");
        let mut container = SeqContainer::new();
        assert!(matches!(
            codec.encode(&bad, &mut container),
            Err(ExecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn unbound_accessor_fails_execution() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .reader("getV", ValueType::I32, Visibility::Public, None)
                    .writer("setV", ValueType::I32, Visibility::Public, None),
            )
            .unwrap();
        let codec = codec_for(model, GenerationScope::foreign(), "A");

        let instance = Instance::new("A");
        let mut container = SeqContainer::new();
        assert!(matches!(
            codec.encode(&instance, &mut container),
            Err(ExecError::UnboundAccessor { .. })
        ));
    }

    #[test]
    fn nested_record_round_trips() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("Outer", "m")
                    .field("inner", ValueType::record("Inner"), Visibility::Public),
            )
            .unwrap();
        let codec = codec_for(model, GenerationScope::foreign(), "Outer");

        let mut inner = Instance::new("Inner");
        inner.set("Inner", "x", 1_i64);
        let mut outer = Instance::new("Outer");
        outer.set("Outer", "inner", inner.clone());

        let mut container = SeqContainer::new();
        codec.encode(&outer, &mut container).unwrap();
        let decoded = codec
            .decode(&mut container, &Constructor::blank("Outer"))
            .unwrap();
        assert_eq!(
            decoded.instance.get("Outer", "inner"),
            Some(&Value::Record(inner))
        );
    }
}
