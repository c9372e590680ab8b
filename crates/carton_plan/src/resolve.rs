//! Property resolution: from collected members to a [`SerializationPlan`].
//!
//! Resolution reconciles visibility, inheritance, naming conventions, and
//! exclusion markers into one ordered list of (property, strategy) pairs.
//! Same-named declarations at different hierarchy levels stay distinct,
//! scoped to their declaring type; within one declaring type a field and an
//! accessor pair of the same canonical name fuse into a single property, and
//! the most direct viable mechanism wins.

use std::sync::Arc;

use log::{debug, trace};

use carton_model::hash::{HashMap, HashSet};
use carton_model::{MemberDescriptor, MemberKind, TypeDescriptor, TypeModel};

use crate::diag::{DiagnosticKind, Diagnostics};
use crate::naming::NamingConvention;
use crate::property::{AccessStrategy, AccessorRef, PropertyDescriptor, SerializationPlan};
use crate::scope::GenerationScope;

// -----------------------------------------------------------------------------
// Resolver

/// Resolves one type's plan against a model, scope, and naming convention.
pub struct Resolver<'a> {
    model: &'a TypeModel,
    scope: &'a GenerationScope,
    naming: &'a NamingConvention,
}

impl<'a> Resolver<'a> {
    pub fn new(
        model: &'a TypeModel,
        scope: &'a GenerationScope,
        naming: &'a NamingConvention,
    ) -> Self {
        Self {
            model,
            scope,
            naming,
        }
    }

    /// Produce the plan and diagnostics for `leaf`.
    ///
    /// Never fails: unresolvable properties are dropped with a diagnostic and
    /// the plan keeps everything else.
    pub fn resolve(&self, leaf: &Arc<TypeDescriptor>) -> (SerializationPlan, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let ancestry = self.scope_ancestry();

        let mut properties = Vec::new();
        for ty in leaf.chain() {
            self.resolve_type(&ty, &ancestry, &mut properties, &mut diagnostics);
        }

        debug!(
            "resolved `{}`: {} properties, {} diagnostics",
            leaf.name(),
            properties.len(),
            diagnostics.len(),
        );
        (
            SerializationPlan::new(leaf.name().clone(), properties),
            diagnostics,
        )
    }

    /// The name set of the generation scope's own inheritance chain.
    fn scope_ancestry(&self) -> HashSet<Arc<str>> {
        let mut ancestry = HashSet::default();
        if let Some(extends) = self.scope.extends() {
            match self.model.descriptor(extends) {
                Ok(descriptor) => {
                    for ty in descriptor.chain() {
                        ancestry.insert(ty.name().clone());
                    }
                }
                Err(err) => {
                    trace!("generation scope extends unresolvable `{extends}`: {err}");
                }
            }
        }
        ancestry
    }

    /// Resolve the properties declared by one type of the chain.
    fn resolve_type(
        &self,
        ty: &Arc<TypeDescriptor>,
        ancestry: &HashSet<Arc<str>>,
        out: &mut Vec<PropertyDescriptor>,
        diagnostics: &mut Diagnostics,
    ) {
        let candidates = self.group_candidates(ty);

        let mut resolved: Vec<(usize, PropertyDescriptor)> = Vec::new();
        let mut covered: HashSet<Arc<str>> = HashSet::default();

        // Accessor-anchored candidates go first so the slots their pairs
        // cover are known before field-only candidates are judged.
        for candidate in candidates.iter().filter(|c| !c.is_field_only()) {
            if let Some(property) =
                self.resolve_candidate(ty, candidate, ancestry, &mut covered, diagnostics)
            {
                resolved.push((candidate.anchor_index, property));
            }
        }
        for candidate in candidates.iter().filter(|c| c.is_field_only()) {
            if covered.contains(&*candidate.name) {
                trace!(
                    "`{}.{}` is covered by an accessor pair, dropping the raw field",
                    ty.name(),
                    candidate.name,
                );
                continue;
            }
            if let Some(property) =
                self.resolve_candidate(ty, candidate, ancestry, &mut covered, diagnostics)
            {
                resolved.push((candidate.anchor_index, property));
            }
        }

        // Plan order within one type follows declaration order of each
        // property's earliest contributing member.
        resolved.sort_by_key(|(anchor, _)| *anchor);
        out.extend(resolved.into_iter().map(|(_, property)| property));
    }

    /// Group a type's members into property candidates keyed by canonical
    /// name. Accessors that do not match the naming convention contribute no
    /// property identity.
    fn group_candidates<'m>(&self, ty: &'m TypeDescriptor) -> Vec<Candidate<'m>> {
        let mut candidates: Vec<Candidate<'m>> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::default();

        for (index, member) in ty.members().iter().enumerate() {
            let name = match member.kind() {
                MemberKind::Field => member.name().to_string(),
                MemberKind::Reader => match self.naming.reader_property(member.name()) {
                    Some(name) => name,
                    None => {
                        trace!("`{}.{}` is not reader-shaped, ignored", ty.name(), member.name());
                        continue;
                    }
                },
                MemberKind::Writer => match self.naming.writer_property(member.name()) {
                    Some(name) => name,
                    None => {
                        trace!("`{}.{}` is not writer-shaped, ignored", ty.name(), member.name());
                        continue;
                    }
                },
            };

            let slot = *by_name.entry(name.clone()).or_insert_with(|| {
                candidates.push(Candidate::new(Arc::from(&*name), index));
                candidates.len() - 1
            });
            match member.kind() {
                MemberKind::Field => candidates[slot].fields.push(member),
                MemberKind::Reader => candidates[slot].readers.push(member),
                MemberKind::Writer => candidates[slot].writers.push(member),
            }
        }
        candidates
    }

    /// Decide one candidate's fate: a resolved property, or a diagnostic, or
    /// silent exclusion.
    fn resolve_candidate(
        &self,
        ty: &Arc<TypeDescriptor>,
        candidate: &Candidate<'_>,
        ancestry: &HashSet<Arc<str>>,
        covered: &mut HashSet<Arc<str>>,
        diagnostics: &mut Diagnostics,
    ) -> Option<PropertyDescriptor> {
        if candidate.fields.len() > 1
            || candidate.readers.len() > 1
            || candidate.writers.len() > 1
        {
            diagnostics.report(ty.name(), &candidate.name, DiagnosticKind::Ambiguous);
            return None;
        }

        let field = candidate.fields.first().copied();
        let reader = candidate.readers.first().copied();
        let writer = candidate.writers.first().copied();

        // Property identity anchors at the read side. A writer with neither
        // reader nor field has no readable state to serialize.
        let Some(read_anchor) = reader.or(field) else {
            diagnostics.report(ty.name(), &candidate.name, DiagnosticKind::Inaccessible);
            return None;
        };

        if read_anchor.is_excluded() {
            trace!("`{}.{}` carries the exclusion marker", ty.name(), candidate.name);
            return None;
        }

        let value_type = read_anchor.value_type().clone();
        if !value_type.is_encodable() {
            diagnostics.report(ty.name(), &candidate.name, DiagnosticKind::UnsupportedType);
            return None;
        }

        let reach = |member: &MemberDescriptor| {
            self.scope.can_reach(member.visibility(), ty, ancestry)
        };
        let field_reachable = field.is_some_and(|f| reach(f));
        let reader_reachable = reader.is_some_and(|r| !r.is_excluded() && reach(r));
        let writer_reachable = writer.is_some_and(|w| reach(w));

        // Most direct viable mechanism wins.
        let strategy = if field_reachable {
            let field = field.unwrap_or(read_anchor);
            AccessStrategy::DirectField {
                field: field.name().clone(),
            }
        } else if reader_reachable {
            let reader = reader.unwrap_or(read_anchor);
            if let Some(backing) = reader.backing() {
                covered.insert(backing.clone());
            }
            let writer = writer.filter(|_| writer_reachable).map(|w| {
                if let Some(backing) = w.backing() {
                    covered.insert(backing.clone());
                }
                AccessorRef {
                    name: w.name().clone(),
                    backing: w.backing().cloned(),
                }
            });
            AccessStrategy::AccessorPair {
                reader: AccessorRef {
                    name: reader.name().clone(),
                    backing: reader.backing().cloned(),
                },
                writer,
            }
        } else {
            AccessStrategy::Unresolved
        };

        if !strategy.is_resolved() {
            diagnostics.report(ty.name(), &candidate.name, DiagnosticKind::Inaccessible);
            return None;
        }

        trace!(
            "`{}.{}` resolved via {:?}",
            ty.name(),
            candidate.name,
            strategy,
        );
        Some(PropertyDescriptor {
            name: candidate.name.clone(),
            declared_by: ty.name().clone(),
            value_type,
            strategy,
            sealed: read_anchor.is_sealed(),
            order: 0,
        })
    }
}

// -----------------------------------------------------------------------------
// Candidate

/// All declarations of one declaring type sharing one canonical name.
struct Candidate<'m> {
    name: Arc<str>,
    /// Declaration index of the earliest contributing member.
    anchor_index: usize,
    fields: Vec<&'m MemberDescriptor>,
    readers: Vec<&'m MemberDescriptor>,
    writers: Vec<&'m MemberDescriptor>,
}

impl<'m> Candidate<'m> {
    fn new(name: Arc<str>, anchor_index: usize) -> Self {
        Self {
            name,
            anchor_index,
            fields: Vec::new(),
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    fn is_field_only(&self) -> bool {
        self.readers.is_empty() && self.writers.is_empty()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use carton_model::{MemberFlags, TypeDecl, TypeModel, ValueType, Visibility};

    use super::Resolver;
    use crate::diag::DiagnosticKind;
    use crate::naming::NamingConvention;
    use crate::property::AccessStrategy;
    use crate::scope::GenerationScope;

    fn resolve_with(
        model: &TypeModel,
        scope: &GenerationScope,
        leaf: &str,
    ) -> (crate::property::SerializationPlan, crate::diag::Diagnostics) {
        let naming = NamingConvention::default();
        let descriptor = model.descriptor(leaf).unwrap();
        Resolver::new(model, scope, &naming).resolve(&descriptor)
    }

    #[test]
    fn public_field_resolves_directly() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").field("x", ValueType::I64, Visibility::Public))
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(diags.is_empty());
        let prop = plan.property("A", "x").unwrap();
        assert_eq!(
            prop.strategy(),
            &AccessStrategy::DirectField { field: Arc::from("x") }
        );
    }

    #[test]
    fn private_field_without_accessors_is_inaccessible() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").field("x", ValueType::I64, Visibility::Private))
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::in_module("m"), "A");
        assert!(plan.is_empty());
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.kind(), DiagnosticKind::Inaccessible);
        assert_eq!(diag.property(), Some("x"));
    }

    #[test]
    fn accessor_pair_resolves_without_a_same_named_field() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .field("storage", ValueType::Str, Visibility::Private)
                    .reader("getLabel", ValueType::Str, Visibility::Public, Some("storage"))
                    .writer("setLabel", ValueType::Str, Visibility::Public, Some("storage")),
            )
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(diags.is_empty());
        let prop = plan.property("A", "label").unwrap();
        match prop.strategy() {
            AccessStrategy::AccessorPair { reader, writer } => {
                assert_eq!(&*reader.name, "getLabel");
                assert_eq!(writer.as_ref().unwrap().backing.as_deref(), Some("storage"));
            }
            other => panic!("expected accessor pair, got {other:?}"),
        }
        // The private backing field is covered by the pair: no property, no
        // diagnostic.
        assert!(plan.property("A", "storage").is_none());
    }

    #[test]
    fn shadowed_properties_stay_distinct() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("Base", "m").field("name", ValueType::Str, Visibility::Public))
            .unwrap();
        model
            .register(
                TypeDecl::new("Child", "m")
                    .extends("Base")
                    .field("name", ValueType::Str, Visibility::Public),
            )
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "Child");
        assert!(diags.is_empty());
        assert_eq!(plan.len(), 2);
        let base = plan.property("Base", "name").unwrap();
        let child = plan.property("Child", "name").unwrap();
        assert!(base.order() < child.order());
    }

    #[test]
    fn superclass_properties_precede_subclass_properties() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("Base", "m").field("a", ValueType::I32, Visibility::Public))
            .unwrap();
        model
            .register(
                TypeDecl::new("Child", "m")
                    .extends("Base")
                    .field("b", ValueType::I32, Visibility::Public),
            )
            .unwrap();

        let (plan, _) = resolve_with(&model, &GenerationScope::foreign(), "Child");
        let order: Vec<&str> = plan.iter().map(|p| &**p.name()).collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn excluded_reader_drops_the_whole_property() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .reader_flagged(
                        "getTemp",
                        ValueType::I32,
                        Visibility::Public,
                        MemberFlags::EXCLUDED,
                        Some("temp"),
                    )
                    .writer("setTemp", ValueType::I32, Visibility::Public, Some("temp")),
            )
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(plan.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn excluded_field_drops_a_field_only_property() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").field_flagged(
                "cacheLine",
                ValueType::I64,
                Visibility::Public,
                MemberFlags::EXCLUDED,
            ))
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(plan.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn duplicate_fields_are_ambiguous() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .field("x", ValueType::I32, Visibility::Public)
                    .field("x", ValueType::I64, Visibility::Public),
            )
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(plan.is_empty());
        assert_eq!(diags.iter().next().unwrap().kind(), DiagnosticKind::Ambiguous);
    }

    #[test]
    fn get_and_is_readers_for_one_property_are_ambiguous() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .reader("getReady", ValueType::Bool, Visibility::Public, Some("ready"))
                    .reader("isReady", ValueType::Bool, Visibility::Public, Some("ready"))
                    .writer("setReady", ValueType::Bool, Visibility::Public, Some("ready")),
            )
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(plan.is_empty());
        assert_eq!(diags.iter().next().unwrap().kind(), DiagnosticKind::Ambiguous);
    }

    #[test]
    fn opaque_value_type_is_unsupported() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").field(
                "handle",
                ValueType::opaque("os.RawHandle"),
                Visibility::Public,
            ))
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(plan.is_empty());
        assert_eq!(
            diags.iter().next().unwrap().kind(),
            DiagnosticKind::UnsupportedType
        );
    }

    #[test]
    fn unreachable_writer_yields_read_only_property() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .reader("getId", ValueType::I64, Visibility::Public, Some("id"))
                    .writer("setId", ValueType::I64, Visibility::Private, Some("id")),
            )
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(diags.is_empty());
        let prop = plan.property("A", "id").unwrap();
        assert!(!prop.strategy().is_writable());
    }

    #[test]
    fn writer_without_read_anchor_is_inaccessible() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").writer(
                "setGhost",
                ValueType::Str,
                Visibility::Public,
                Some("ghost"),
            ))
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(plan.is_empty());
        assert_eq!(
            diags.iter().next().unwrap().kind(),
            DiagnosticKind::Inaccessible
        );
    }

    #[test]
    fn module_scoped_field_prefers_direct_access_in_module() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .field("two", ValueType::Str, Visibility::Module)
                    .reader("getTwo", ValueType::Str, Visibility::Public, Some("two"))
                    .writer("setTwo", ValueType::Str, Visibility::Public, Some("two")),
            )
            .unwrap();

        let (plan, _) = resolve_with(&model, &GenerationScope::in_module("m"), "A");
        assert!(matches!(
            plan.property("A", "two").unwrap().strategy(),
            AccessStrategy::DirectField { .. }
        ));

        let (plan, _) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(matches!(
            plan.property("A", "two").unwrap().strategy(),
            AccessStrategy::AccessorPair { .. }
        ));
    }

    #[test]
    fn inherit_scoped_field_reachable_from_subtype_scope() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").field("three", ValueType::Str, Visibility::Inherit))
            .unwrap();

        let scope = GenerationScope::foreign().extending("A");
        let (plan, diags) = resolve_with(&model, &scope, "A");
        assert!(diags.is_empty());
        assert!(matches!(
            plan.property("A", "three").unwrap().strategy(),
            AccessStrategy::DirectField { .. }
        ));
    }

    #[test]
    fn sealed_accessors_still_serialize() {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("A", "m")
                    .field("extra", ValueType::Str, Visibility::Private)
                    .reader_flagged(
                        "getFinal",
                        ValueType::Str,
                        Visibility::Public,
                        MemberFlags::SEALED,
                        Some("extra"),
                    )
                    .writer_flagged(
                        "setFinal",
                        ValueType::Str,
                        Visibility::Public,
                        MemberFlags::SEALED,
                        Some("extra"),
                    ),
            )
            .unwrap();

        let (plan, diags) = resolve_with(&model, &GenerationScope::foreign(), "A");
        assert!(diags.is_empty());
        let prop = plan.property("A", "final").unwrap();
        assert!(prop.is_sealed());
        assert!(prop.strategy().is_writable());
    }
}
