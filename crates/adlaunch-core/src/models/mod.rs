//! Data models for the application
//!
//! Request-facing draft/asset shapes, the brand credential bundle, and the
//! per-draft launch outcome types shared between the API layer and the
//! notification sink.

mod brand;
mod draft;
mod launch;

pub use brand::*;
pub use draft::*;
pub use launch::*;
