//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the scoring pipeline and the persisted model artifacts.

mod model;

pub use model::{ModelBundle, ModelError, Preprocessor, Regressor, SubjectModels};
