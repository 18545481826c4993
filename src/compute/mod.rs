//! Compute layer: projection math and input validation.
//!
//! These are free functions with no state; the index, the viewport
//! controller and ingestion all build on them.

pub mod projection;
pub mod validation;
