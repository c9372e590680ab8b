//! Code emission for resolved serialization plans.
//!
//! Consumes a `carton_plan::SerializationPlan` and produces the paired
//! encode/decode routines against an external binary container:
//!
//! - [`container`]: the ordered write/read seam plus an in-memory
//!   implementation for tests.
//! - [`codec`]: the compiled [`Codec`] executing access strategies against
//!   dynamic instances, and the externally supplied [`Constructor`] used to
//!   produce blank instances during decode.

// -----------------------------------------------------------------------------
// Modules

pub mod codec;
pub mod container;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use codec::{Codec, Constructor, Decoded, ExecError};
pub use container::{ContainerError, ContainerRead, ContainerWrite, SeqContainer};
