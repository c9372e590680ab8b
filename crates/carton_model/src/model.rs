//! The type model: registration of raw declarations and descriptor building.
//!
//! [`TypeModel`] is the central store for hierarchy input. Registering a
//! [`TypeDecl`] records the raw declaration; [`TypeModel::descriptor`] builds
//! the immutable [`TypeDescriptor`] chain on first request and caches it for
//! the lifetime of the model. Cycle detection happens on the raw declaration
//! graph, before any `Arc` link is created, so a malformed hierarchy fails
//! fast instead of producing a reference cycle.

use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, trace};
use thiserror::Error;

use crate::decl::TypeDecl;
use crate::descriptor::{MemberDescriptor, TypeDescriptor};
use crate::hash::HashMap;

// -----------------------------------------------------------------------------
// ModelError

/// Malformed hierarchy input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The parent chain revisits a type already seen.
    #[error("inheritance chain of `{type_name}` revisits `{repeated}`")]
    CyclicInheritance {
        type_name: Arc<str>,
        repeated: Arc<str>,
    },

    /// A declared parent names no registered type.
    #[error("`{type_name}` extends unknown type `{parent}`")]
    UnknownParent {
        type_name: Arc<str>,
        parent: Arc<str>,
    },

    /// A descriptor was requested for a name that was never registered.
    #[error("type `{0}` is not registered")]
    UnknownType(Arc<str>),

    /// The same type name was registered twice.
    #[error("type `{0}` is declared more than once")]
    DuplicateType(Arc<str>),
}

// -----------------------------------------------------------------------------
// TypeModel

/// A registry of declared types and their built descriptors.
///
/// Descriptors are built once per type and cached; concurrent readers share
/// the cache behind an `RwLock`.
///
/// # Examples
///
/// ```
/// use carton_model::decl::{TypeDecl, Visibility};
/// use carton_model::model::TypeModel;
/// use carton_model::value::ValueType;
///
/// let mut model = TypeModel::new();
/// model.register(
///     TypeDecl::new("Point", "geo")
///         .field("x", ValueType::I64, Visibility::Public),
/// ).unwrap();
///
/// let point = model.descriptor("Point").unwrap();
/// assert_eq!(&**point.name(), "Point");
/// assert!(point.parent().is_none());
/// ```
#[derive(Debug, Default)]
pub struct TypeModel {
    decls: HashMap<Arc<str>, TypeDecl>,
    built: RwLock<HashMap<Arc<str>, Arc<TypeDescriptor>>>,
}

impl TypeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one raw declaration.
    pub fn register(&mut self, decl: TypeDecl) -> Result<(), ModelError> {
        if self.decls.contains_key(&*decl.name) {
            return Err(ModelError::DuplicateType(decl.name.clone()));
        }
        trace!("registered declaration for `{}`", decl.name);
        self.decls.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Whether a declaration exists for `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    /// Number of registered declarations.
    #[inline]
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Build (or fetch the cached) descriptor for `name`.
    ///
    /// The whole parent chain is validated and built in one pass, so a
    /// successful return guarantees every ancestor descriptor exists too.
    pub fn descriptor(&self, name: &str) -> Result<Arc<TypeDescriptor>, ModelError> {
        {
            let built = self.built.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(descriptor) = built.get(name) {
                return Ok(descriptor.clone());
            }
        }

        let chain = self.chain_decls(name)?;

        let mut built = self.built.write().unwrap_or_else(PoisonError::into_inner);
        let mut parent: Option<Arc<TypeDescriptor>> = None;
        // Root first, reusing any ancestor a concurrent builder already made.
        for decl in chain.into_iter().rev() {
            let descriptor = match built.get(&decl.name) {
                Some(existing) => existing.clone(),
                None => {
                    let members: Box<[MemberDescriptor]> = decl
                        .members
                        .iter()
                        .map(MemberDescriptor::from_decl)
                        .collect();
                    let descriptor = Arc::new(TypeDescriptor::new(
                        decl.name.clone(),
                        decl.module.clone(),
                        members,
                        parent.take(),
                    ));
                    debug!("built descriptor for `{}`", decl.name);
                    built.insert(decl.name.clone(), descriptor.clone());
                    descriptor
                }
            };
            parent = Some(descriptor);
        }

        // The chain is non-empty, so `parent` now holds the leaf.
        Ok(parent.unwrap_or_else(|| unreachable!("descriptor chain cannot be empty")))
    }

    /// Collect the declaration chain leaf-first, detecting cycles and
    /// unknown links on the raw name graph.
    fn chain_decls(&self, name: &str) -> Result<Vec<&TypeDecl>, ModelError> {
        let leaf = self
            .decls
            .get(name)
            .ok_or_else(|| ModelError::UnknownType(Arc::from(name)))?;

        let mut seen: Vec<&str> = vec![&leaf.name];
        let mut chain = vec![leaf];
        let mut current = leaf;
        while let Some(parent_name) = &current.parent {
            if seen.contains(&&**parent_name) {
                return Err(ModelError::CyclicInheritance {
                    type_name: leaf.name.clone(),
                    repeated: parent_name.clone(),
                });
            }
            let parent = self.decls.get(&**parent_name).ok_or_else(|| {
                ModelError::UnknownParent {
                    type_name: current.name.clone(),
                    parent: parent_name.clone(),
                }
            })?;
            seen.push(&parent.name);
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ModelError, TypeModel};
    use crate::decl::{TypeDecl, Visibility};
    use crate::value::ValueType;

    #[test]
    fn descriptors_are_cached() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").field("x", ValueType::I32, Visibility::Public))
            .unwrap();

        let first = model.descriptor("A").unwrap();
        let second = model.descriptor("A").unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn building_a_leaf_builds_its_ancestors() {
        let mut model = TypeModel::new();
        model.register(TypeDecl::new("Root", "m")).unwrap();
        model
            .register(TypeDecl::new("Mid", "m").extends("Root"))
            .unwrap();
        model
            .register(TypeDecl::new("Leaf", "m").extends("Mid"))
            .unwrap();

        let leaf = model.descriptor("Leaf").unwrap();
        assert_eq!(&**leaf.parent().unwrap().name(), "Mid");

        // The ancestor is shared with a direct request for it.
        let mid = model.descriptor("Mid").unwrap();
        assert!(std::sync::Arc::ptr_eq(leaf.parent().unwrap(), &mid));
    }

    #[test]
    fn cyclic_chain_is_rejected() {
        let mut model = TypeModel::new();
        model.register(TypeDecl::new("A", "m").extends("B")).unwrap();
        model.register(TypeDecl::new("B", "m").extends("A")).unwrap();

        match model.descriptor("A") {
            Err(ModelError::CyclicInheritance { type_name, repeated }) => {
                assert_eq!(&*type_name, "A");
                assert_eq!(&*repeated, "A");
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let mut model = TypeModel::new();
        model.register(TypeDecl::new("A", "m").extends("A")).unwrap();
        assert!(matches!(
            model.descriptor("A"),
            Err(ModelError::CyclicInheritance { .. })
        ));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut model = TypeModel::new();
        model
            .register(TypeDecl::new("A", "m").extends("Missing"))
            .unwrap();
        assert!(matches!(
            model.descriptor("A"),
            Err(ModelError::UnknownParent { .. })
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut model = TypeModel::new();
        model.register(TypeDecl::new("A", "m")).unwrap();
        assert!(matches!(
            model.register(TypeDecl::new("A", "other")),
            Err(ModelError::DuplicateType(_))
        ));
    }
}
