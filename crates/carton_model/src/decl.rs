//! Raw hierarchy input declarations.
//!
//! A [`TypeDecl`] is the harness-supplied description of one type: its name,
//! module, parent link, and declared members in declaration order. The model
//! never inspects real Rust types; everything the planner knows about a type
//! arrives through these declarations.

use std::sync::Arc;

use bitflags::bitflags;

use crate::value::ValueType;

// -----------------------------------------------------------------------------
// Visibility

/// Declared visibility of a field or accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Reachable from any scope.
    Public,
    /// Reachable only from the declaring type's module.
    Module,
    /// Reachable from subtypes of the declaring type, or from its module.
    Inherit,
    /// Never reachable from outside the declaring type.
    Private,
}

// -----------------------------------------------------------------------------
// MemberFlags

bitflags! {
    /// Declarative markers carried by a member declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MemberFlags: u8 {
        /// The member must be omitted from serialization. Anchored at the
        /// read side: a marked reader excludes the whole property.
        const EXCLUDED = 1 << 0;
        /// The member cannot be overridden further down the hierarchy.
        /// Orthogonal to mutability of the value it exposes.
        const SEALED = 1 << 1;
    }
}

// -----------------------------------------------------------------------------
// Member declarations

/// Whether an accessor reads or writes its property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Reader,
    Writer,
}

/// One declared storage field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Arc<str>,
    pub value_type: ValueType,
    pub visibility: Visibility,
    pub flags: MemberFlags,
}

/// One declared accessor method.
///
/// `backing` names the storage slot the accessor touches; it need not share
/// the accessor's own name. Resolution only needs the accessor's name and
/// visibility, but the codec needs the binding to execute the strategy
/// against a dynamic [`Instance`](crate::instance::Instance).
#[derive(Debug, Clone)]
pub struct AccessorDecl {
    pub name: Arc<str>,
    pub kind: AccessorKind,
    pub value_type: ValueType,
    pub visibility: Visibility,
    pub flags: MemberFlags,
    pub backing: Option<Arc<str>>,
}

/// A declared member, in declaration order.
#[derive(Debug, Clone)]
pub enum MemberDecl {
    Field(FieldDecl),
    Accessor(AccessorDecl),
}

// -----------------------------------------------------------------------------
// TypeDecl

/// The full declared description of one type in the hierarchy.
///
/// # Examples
///
/// ```
/// use carton_model::decl::{TypeDecl, Visibility};
/// use carton_model::value::ValueType;
///
/// let decl = TypeDecl::new("Point", "geo")
///     .field("x", ValueType::I64, Visibility::Public)
///     .field("y", ValueType::I64, Visibility::Public);
///
/// assert_eq!(decl.members.len(), 2);
/// assert!(decl.parent.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Arc<str>,
    pub module: Arc<str>,
    pub parent: Option<Arc<str>>,
    pub members: Vec<MemberDecl>,
}

impl TypeDecl {
    /// Create an empty declaration for `name` living in `module`.
    pub fn new(name: &str, module: &str) -> Self {
        Self {
            name: Arc::from(name),
            module: Arc::from(module),
            parent: None,
            members: Vec::new(),
        }
    }

    /// Declare the parent type by name.
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(Arc::from(parent));
        self
    }

    /// Declare a field with no markers.
    pub fn field(self, name: &str, value_type: ValueType, visibility: Visibility) -> Self {
        self.field_flagged(name, value_type, visibility, MemberFlags::empty())
    }

    /// Declare a field carrying markers.
    pub fn field_flagged(
        mut self,
        name: &str,
        value_type: ValueType,
        visibility: Visibility,
        flags: MemberFlags,
    ) -> Self {
        self.members.push(MemberDecl::Field(FieldDecl {
            name: Arc::from(name),
            value_type,
            visibility,
            flags,
        }));
        self
    }

    /// Declare a reader accessor bound to `backing` (if any), no markers.
    pub fn reader(
        self,
        name: &str,
        value_type: ValueType,
        visibility: Visibility,
        backing: Option<&str>,
    ) -> Self {
        self.accessor(
            name,
            AccessorKind::Reader,
            value_type,
            visibility,
            MemberFlags::empty(),
            backing,
        )
    }

    /// Declare a reader accessor carrying markers.
    pub fn reader_flagged(
        self,
        name: &str,
        value_type: ValueType,
        visibility: Visibility,
        flags: MemberFlags,
        backing: Option<&str>,
    ) -> Self {
        self.accessor(name, AccessorKind::Reader, value_type, visibility, flags, backing)
    }

    /// Declare a writer accessor bound to `backing` (if any), no markers.
    pub fn writer(
        self,
        name: &str,
        value_type: ValueType,
        visibility: Visibility,
        backing: Option<&str>,
    ) -> Self {
        self.accessor(
            name,
            AccessorKind::Writer,
            value_type,
            visibility,
            MemberFlags::empty(),
            backing,
        )
    }

    /// Declare a writer accessor carrying markers.
    pub fn writer_flagged(
        self,
        name: &str,
        value_type: ValueType,
        visibility: Visibility,
        flags: MemberFlags,
        backing: Option<&str>,
    ) -> Self {
        self.accessor(name, AccessorKind::Writer, value_type, visibility, flags, backing)
    }

    fn accessor(
        mut self,
        name: &str,
        kind: AccessorKind,
        value_type: ValueType,
        visibility: Visibility,
        flags: MemberFlags,
        backing: Option<&str>,
    ) -> Self {
        self.members.push(MemberDecl::Accessor(AccessorDecl {
            name: Arc::from(name),
            kind,
            value_type,
            visibility,
            flags,
            backing: backing.map(Arc::from),
        }));
        self
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{MemberDecl, MemberFlags, TypeDecl, Visibility};
    use crate::value::ValueType;

    #[test]
    fn declaration_order_is_preserved() {
        let decl = TypeDecl::new("A", "m")
            .field("b", ValueType::Str, Visibility::Private)
            .reader("getB", ValueType::Str, Visibility::Public, Some("b"))
            .writer("setB", ValueType::Str, Visibility::Public, Some("b"));

        let names: Vec<&str> = decl
            .members
            .iter()
            .map(|m| match m {
                MemberDecl::Field(f) => &*f.name,
                MemberDecl::Accessor(a) => &*a.name,
            })
            .collect();
        assert_eq!(names, ["b", "getB", "setB"]);
    }

    #[test]
    fn flags_are_independent() {
        let both = MemberFlags::EXCLUDED | MemberFlags::SEALED;
        assert!(both.contains(MemberFlags::EXCLUDED));
        assert!(both.contains(MemberFlags::SEALED));
        assert!(!MemberFlags::SEALED.contains(MemberFlags::EXCLUDED));
    }
}
