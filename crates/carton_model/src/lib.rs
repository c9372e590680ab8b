//! Structural type model for serialization planning.
//!
//! This crate holds everything the planner knows about a type before any
//! access decision is made:
//!
//! - [`decl`]: raw, harness-supplied hierarchy declarations ([`TypeDecl`]).
//! - [`model`]: the [`TypeModel`] registry that validates parent links
//!   (cycles, unknown parents) and freezes declarations into descriptors.
//! - [`descriptor`]: immutable [`TypeDescriptor`] / [`MemberDescriptor`]
//!   nodes and the chain walk that collects members root-first.
//! - [`value`] / [`instance`]: the dynamic value model the emitted codec
//!   executes against.
//! - [`hash`]: fixed-seed hash containers, so resolution output is
//!   deterministic across runs.

// -----------------------------------------------------------------------------
// Modules

pub mod decl;
pub mod descriptor;
pub mod hash;
pub mod instance;
pub mod model;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use decl::{AccessorDecl, AccessorKind, FieldDecl, MemberDecl, MemberFlags, TypeDecl, Visibility};
pub use descriptor::{MemberDescriptor, MemberKind, MemberRef, TypeDescriptor, collect_members};
pub use instance::Instance;
pub use model::{ModelError, TypeModel};
pub use value::{Value, ValueType};
