//! Model ports: Traits for the fitted preprocessor and the score regressors.
//!
//! These traits abstract the artifact format from the scoring pipeline.

use crate::domain::{EngineeredAttributes, Subject};

/// Errors that can occur while transforming a row or predicting a score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Found unknown category {value:?} in column {column}")]
    UnknownCategory { column: String, value: String },

    #[error("Column {column} is not present in the input row")]
    MissingColumn { column: String },

    #[error("Column {column} must be numeric")]
    ExpectedNumeric { column: String },

    #[error("Column {column} must be categorical")]
    ExpectedCategorical { column: String },

    #[error("Feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{subject} model produced a non-finite prediction")]
    NonFinite { subject: String },
}

/// A fitted transformation applied identically to every input row.
pub trait Preprocessor: Send + Sync {
    /// Number of values produced by `transform`.
    fn output_width(&self) -> usize;

    /// Transform an engineered row into a numeric feature vector.
    ///
    /// # Errors
    /// Returns `ModelError` for missing columns, mistyped columns or
    /// categories the preprocessor was not fitted on.
    fn transform(&self, row: &EngineeredAttributes) -> Result<Vec<f64>, ModelError>;
}

/// A trained function mapping a feature vector to one continuous score.
pub trait Regressor: Send + Sync {
    /// Whether vectors of `width` values can be fed to `predict`.
    fn supports_input_width(&self, width: usize) -> bool;

    /// Predict a raw (unrounded, unclamped) score.
    ///
    /// # Errors
    /// Returns `ModelError::DimensionMismatch` if the vector has the wrong size.
    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;
}

/// One regressor per exam subject.
#[derive(Debug, Clone)]
pub struct SubjectModels<M> {
    pub math: M,
    pub reading: M,
    pub writing: M,
}

impl<M> SubjectModels<M> {
    /// Models paired with their subject, in response order.
    pub fn iter(&self) -> impl Iterator<Item = (Subject, &M)> {
        [
            (Subject::Math, &self.math),
            (Subject::Reading, &self.reading),
            (Subject::Writing, &self.writing),
        ]
        .into_iter()
    }
}

/// A fitted preprocessor together with the three subject regressors.
#[derive(Debug, Clone)]
pub struct ModelBundle<P, M> {
    pub preprocessor: P,
    pub models: SubjectModels<M>,
}
