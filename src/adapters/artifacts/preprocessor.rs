//! Column preprocessor artifact: scaling and one-hot encoding of a single row.
//!
//! The JSON layout mirrors a fitted scikit-learn `ColumnTransformer`: an
//! ordered list of transformers whose outputs are concatenated.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{column_kind, ColumnKind, EngineeredAttributes, FeatureValue};
use crate::ports::{ModelError, Preprocessor};

/// Behaviour of the one-hot encoder for categories not seen during fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

/// A single fitted column transformer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnTransformer {
    /// `(x - mean) / scale` per numeric column.
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// One indicator per known category, per categorical column.
    OneHot {
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
        #[serde(default)]
        drop_first: bool,
    },
    /// Numeric columns copied unchanged.
    Passthrough { columns: Vec<String> },
}

impl ColumnTransformer {
    fn columns(&self) -> &[String] {
        match self {
            Self::StandardScaler { columns, .. }
            | Self::OneHot { columns, .. }
            | Self::Passthrough { columns } => columns,
        }
    }

    fn expected_kind(&self) -> ColumnKind {
        match self {
            Self::OneHot { .. } => ColumnKind::Categorical,
            Self::StandardScaler { .. } | Self::Passthrough { .. } => ColumnKind::Numeric,
        }
    }

    fn output_width(&self) -> usize {
        match self {
            Self::StandardScaler { columns, .. } | Self::Passthrough { columns } => columns.len(),
            Self::OneHot {
                categories,
                drop_first,
                ..
            } => categories
                .iter()
                .map(|c| c.len().saturating_sub(usize::from(*drop_first)))
                .sum(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let columns = self.columns();
        if columns.is_empty() {
            return Err("transformer has no columns".into());
        }
        let expected = self.expected_kind();
        for column in columns {
            match column_kind(column) {
                None => return Err(format!("unknown column {column:?}")),
                Some(kind) if kind != expected => {
                    return Err(format!("column {column} is {kind:?}, expected {expected:?}"));
                }
                Some(_) => {}
            }
        }

        match self {
            Self::StandardScaler { mean, scale, .. } => {
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err("scaler mean/scale lengths do not match columns".into());
                }
                if mean.iter().any(|m| !m.is_finite()) {
                    return Err("scaler mean must be finite".into());
                }
                if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                    return Err("scaler scale must be finite and non-zero".into());
                }
            }
            Self::OneHot {
                categories,
                drop_first,
                ..
            } => {
                if categories.len() != columns.len() {
                    return Err("one-hot categories length does not match columns".into());
                }
                for (column, cats) in columns.iter().zip(categories) {
                    if cats.is_empty() {
                        return Err(format!("column {column} has no categories"));
                    }
                    if *drop_first && cats.len() < 2 {
                        return Err(format!(
                            "column {column} needs at least two categories with drop_first"
                        ));
                    }
                    let unique: HashSet<&String> = cats.iter().collect();
                    if unique.len() != cats.len() {
                        return Err(format!("column {column} has duplicate categories"));
                    }
                }
            }
            Self::Passthrough { .. } => {}
        }
        Ok(())
    }

    fn transform_into(
        &self,
        row: &EngineeredAttributes,
        out: &mut Vec<f64>,
    ) -> Result<(), ModelError> {
        match self {
            Self::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                for ((column, m), s) in columns.iter().zip(mean).zip(scale) {
                    out.push((numeric(row, column)? - m) / s);
                }
            }
            Self::Passthrough { columns } => {
                for column in columns {
                    out.push(numeric(row, column)?);
                }
            }
            Self::OneHot {
                columns,
                categories,
                handle_unknown,
                drop_first,
            } => {
                for (column, cats) in columns.iter().zip(categories) {
                    let value = categorical(row, column)?;
                    let skip = usize::from(*drop_first);
                    let start = out.len();
                    out.resize(start + cats.len().saturating_sub(skip), 0.0);

                    match cats.iter().position(|c| c == value) {
                        Some(idx) if idx >= skip => out[start + idx - skip] = 1.0,
                        Some(_) => {}
                        None if *handle_unknown == HandleUnknown::Ignore => {}
                        None => {
                            return Err(ModelError::UnknownCategory {
                                column: column.clone(),
                                value: value.to_string(),
                            })
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn numeric(row: &EngineeredAttributes, column: &str) -> Result<f64, ModelError> {
    match row.column(column) {
        Some(FeatureValue::Numeric(v)) => Ok(v),
        Some(FeatureValue::Categorical(_)) => Err(ModelError::ExpectedNumeric {
            column: column.to_string(),
        }),
        None => Err(ModelError::MissingColumn {
            column: column.to_string(),
        }),
    }
}

fn categorical<'a>(row: &'a EngineeredAttributes, column: &str) -> Result<&'a str, ModelError> {
    match row.column(column) {
        Some(FeatureValue::Categorical(v)) => Ok(v),
        Some(FeatureValue::Numeric(_)) => Err(ModelError::ExpectedCategorical {
            column: column.to_string(),
        }),
        None => Err(ModelError::MissingColumn {
            column: column.to_string(),
        }),
    }
}

/// Fitted preprocessor loaded from `preprocessor.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnPreprocessor {
    transformers: Vec<ColumnTransformer>,
}

impl ColumnPreprocessor {
    /// Build a preprocessor from transformers, validating their parameters.
    ///
    /// # Errors
    /// Returns a description of the first invalid transformer.
    pub fn new(transformers: Vec<ColumnTransformer>) -> Result<Self, String> {
        let preprocessor = Self { transformers };
        preprocessor.validate()?;
        Ok(preprocessor)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.transformers.is_empty() {
            return Err("preprocessor has no transformers".into());
        }
        for (i, transformer) in self.transformers.iter().enumerate() {
            transformer
                .validate()
                .map_err(|reason| format!("transformer {i}: {reason}"))?;
        }
        Ok(())
    }
}

impl Preprocessor for ColumnPreprocessor {
    fn output_width(&self) -> usize {
        self.transformers.iter().map(ColumnTransformer::output_width).sum()
    }

    fn transform(&self, row: &EngineeredAttributes) -> Result<Vec<f64>, ModelError> {
        let mut out = Vec::with_capacity(self.output_width());
        for transformer in &self.transformers {
            transformer.transform_into(row, &mut out)?;
        }
        Ok(out)
    }
}
