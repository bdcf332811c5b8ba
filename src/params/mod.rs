//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables live here with:
//! - Physical units (meters, seconds, m/s)
//! - Documented ranges and meanings
//! - Validation returning typed errors

mod ocean;
mod run;

// Re-export all types
pub use ocean::{validate_resolution, OceanConfig, GRAVITY};
pub use run::{BackendKind, ExecutionConfig, RunConfig};
