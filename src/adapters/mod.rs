//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: JSON preprocessor and regressor artifacts loaded from disk

pub mod artifacts;

// Re-export artifact error for lib.rs
pub use artifacts::ArtifactError;
