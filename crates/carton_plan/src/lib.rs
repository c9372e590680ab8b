//! Property resolution and serialization planning.
//!
//! This crate turns a validated type hierarchy (from `carton_model`) into one
//! unambiguous, ordered [`SerializationPlan`] per type:
//!
//! - [`scope`]: the assumed generation scope and the visibility matrix.
//! - [`naming`]: accessor pairing by prefix convention.
//! - [`resolve`]: the conflict/override resolver producing the plan.
//! - [`diag`]: per-type diagnostics with partial-failure semantics.
//! - [`cache`]: the memoizing, single-flight plan store and the top-level
//!   [`Analyzer`] entry point.
//!
//! Resolution happens once per type at analysis time. The emitted codec
//! (`carton_codec`) consumes the plan without ever re-checking visibility.

// -----------------------------------------------------------------------------
// Modules

pub mod cache;
pub mod diag;
pub mod naming;
pub mod property;
pub mod resolve;
pub mod scope;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use cache::{Analyzer, PlanCache, PlanOutcome};
pub use diag::{Diagnostic, DiagnosticKind, Diagnostics};
pub use naming::NamingConvention;
pub use property::{AccessStrategy, AccessorRef, PropertyDescriptor, SerializationPlan};
pub use resolve::Resolver;
pub use scope::GenerationScope;
