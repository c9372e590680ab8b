//! Immutable, resolved type descriptors.
//!
//! A [`TypeDescriptor`] is a node in an already-validated hierarchy: parent
//! links are real `Arc`s (traversal only, the chain is acyclic by
//! construction) and members are frozen in declaration order. Descriptors are
//! built once per type by [`TypeModel`](crate::model::TypeModel) and shared.

use std::sync::Arc;

use crate::decl::{AccessorKind, MemberDecl, MemberFlags, Visibility};
use crate::value::ValueType;

// -----------------------------------------------------------------------------
// MemberDescriptor

/// What kind of member a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Reader,
    Writer,
}

/// One declared field or accessor, frozen for resolution.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    name: Arc<str>,
    kind: MemberKind,
    value_type: ValueType,
    visibility: Visibility,
    flags: MemberFlags,
    backing: Option<Arc<str>>,
}

impl MemberDescriptor {
    pub(crate) fn from_decl(decl: &MemberDecl) -> Self {
        match decl {
            MemberDecl::Field(f) => Self {
                name: f.name.clone(),
                kind: MemberKind::Field,
                value_type: f.value_type.clone(),
                visibility: f.visibility,
                flags: f.flags,
                backing: None,
            },
            MemberDecl::Accessor(a) => Self {
                name: a.name.clone(),
                kind: match a.kind {
                    AccessorKind::Reader => MemberKind::Reader,
                    AccessorKind::Writer => MemberKind::Writer,
                },
                value_type: a.value_type.clone(),
                visibility: a.visibility,
                flags: a.flags,
                backing: a.backing.clone(),
            },
        }
    }

    /// The declared member name (for accessors, the method name).
    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[inline]
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// Whether the member carries the exclusion marker.
    #[inline]
    pub fn is_excluded(&self) -> bool {
        self.flags.contains(MemberFlags::EXCLUDED)
    }

    /// Whether the member is sealed against overriding.
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(MemberFlags::SEALED)
    }

    /// The storage slot an accessor touches, if bound. Always `None` for
    /// fields (a field is its own slot).
    #[inline]
    pub fn backing(&self) -> Option<&Arc<str>> {
        self.backing.as_ref()
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// A node in the analyzed hierarchy. Immutable once built.
#[derive(Debug)]
pub struct TypeDescriptor {
    name: Arc<str>,
    module: Arc<str>,
    members: Box<[MemberDescriptor]>,
    parent: Option<Arc<TypeDescriptor>>,
}

impl TypeDescriptor {
    pub(crate) fn new(
        name: Arc<str>,
        module: Arc<str>,
        members: Box<[MemberDescriptor]>,
        parent: Option<Arc<TypeDescriptor>>,
    ) -> Self {
        Self {
            name,
            module,
            members,
            parent,
        }
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn module(&self) -> &Arc<str> {
        &self.module
    }

    /// Declared members in declaration order.
    #[inline]
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// The parent descriptor, absent for root types.
    #[inline]
    pub fn parent(&self) -> Option<&Arc<TypeDescriptor>> {
        self.parent.as_ref()
    }

    /// The inheritance chain from the root down to this type (inclusive).
    pub fn chain(self: &Arc<Self>) -> Vec<Arc<TypeDescriptor>> {
        let mut chain = Vec::new();
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            current = ty.parent.clone();
            chain.push(ty);
        }
        chain.reverse();
        chain
    }

    /// Whether `name` appears anywhere in this type's chain (including self).
    pub fn is_subtype_of(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if &*ty.name == name {
                return true;
            }
            current = ty.parent.as_deref();
        }
        false
    }
}

// -----------------------------------------------------------------------------
// MemberRef

/// A member together with its declaring type, produced by [`collect_members`].
#[derive(Debug, Clone)]
pub struct MemberRef {
    declaring: Arc<TypeDescriptor>,
    index: usize,
}

impl MemberRef {
    /// The type that declares this member.
    #[inline]
    pub fn declaring(&self) -> &Arc<TypeDescriptor> {
        &self.declaring
    }

    /// Position of the member in its declaring type's member list.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn member(&self) -> &MemberDescriptor {
        &self.declaring.members()[self.index]
    }
}

/// Collect every member of the chain, superclass-declared members first,
/// declaration order within each type.
pub fn collect_members(leaf: &Arc<TypeDescriptor>) -> Vec<MemberRef> {
    let mut members = Vec::new();
    for ty in leaf.chain() {
        for index in 0..ty.members().len() {
            members.push(MemberRef {
                declaring: ty.clone(),
                index,
            });
        }
    }
    members
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::collect_members;
    use crate::decl::{TypeDecl, Visibility};
    use crate::model::TypeModel;
    use crate::value::ValueType;

    fn two_level_model() -> TypeModel {
        let mut model = TypeModel::new();
        model
            .register(
                TypeDecl::new("Base", "m")
                    .field("a", ValueType::I64, Visibility::Public)
                    .field("b", ValueType::Str, Visibility::Public),
            )
            .unwrap();
        model
            .register(
                TypeDecl::new("Child", "m")
                    .extends("Base")
                    .field("c", ValueType::Bool, Visibility::Public),
            )
            .unwrap();
        model
    }

    #[test]
    fn chain_runs_root_first() {
        let model = two_level_model();
        let child = model.descriptor("Child").unwrap();
        let chain = child.chain();
        let names: Vec<&str> = chain.iter().map(|t| &**t.name()).collect();
        assert_eq!(names, ["Base", "Child"]);
    }

    #[test]
    fn collect_orders_superclass_members_first() {
        let model = two_level_model();
        let child = model.descriptor("Child").unwrap();
        let collected: Vec<(String, String)> = collect_members(&child)
            .iter()
            .map(|m| (m.declaring().name().to_string(), m.member().name().to_string()))
            .collect();
        assert_eq!(
            collected,
            [
                ("Base".into(), "a".into()),
                ("Base".into(), "b".into()),
                ("Child".into(), "c".into()),
            ]
        );
    }

    #[test]
    fn subtype_check_walks_the_chain() {
        let model = two_level_model();
        let child = model.descriptor("Child").unwrap();
        assert!(child.is_subtype_of("Child"));
        assert!(child.is_subtype_of("Base"));
        assert!(!child.is_subtype_of("Other"));
    }
}
