//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. Feature engineering and
//! score bucketing live here so they can be tested without any artifacts.

mod features;
mod prediction;
mod student;

pub use features::{column_kind, ColumnKind, EngineeredAttributes, FeatureValue, COLUMN_NAMES};
pub use prediction::{
    average_score, clamp_score, PerformanceLevel, PredictionResult, Subject, MAX_SCORE,
    MIN_SCORE,
};
pub use student::{AttributeError, StudentAttributes, FORM_FIELDS};

#[cfg(test)]
pub(crate) use student::sample_form;
