//! Scoring service: Orchestrates feature engineering and the three predictions.
//!
//! This service coordinates:
//! - Form parsing into typed attributes
//! - Feature engineering
//! - Preprocessing
//! - Math, reading and writing predictions
//! - Rounding, clamping, averaging and bucketing

use std::collections::HashMap;
use std::fmt::Display;

use crate::domain::{clamp_score, EngineeredAttributes, PredictionResult, StudentAttributes};
use crate::ports::{ModelBundle, ModelError, Preprocessor, Regressor};
use crate::ScorecastError;

/// Outcome of artifact initialization, fixed for the life of the process.
#[derive(Debug)]
pub enum ModelState<P, M> {
    Ready(ModelBundle<P, M>),
    Unavailable { reason: String },
}

/// Service for scoring student attributes.
///
/// Holds the read-only artifacts loaded at startup. Nothing is mutated after
/// construction, so a single instance can be shared across request handlers
/// behind an `Arc` without locking.
pub struct ScoringService<P, M>
where
    P: Preprocessor,
    M: Regressor,
{
    state: ModelState<P, M>,
}

impl<P, M> ScoringService<P, M>
where
    P: Preprocessor,
    M: Regressor,
{
    /// Create a service backed by loaded artifacts.
    pub fn new(bundle: ModelBundle<P, M>) -> Self {
        Self {
            state: ModelState::Ready(bundle),
        }
    }

    /// Create a service whose artifacts failed to load.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ModelState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Build the service from the result of loading artifacts.
    ///
    /// A load failure is logged once here; the service then rejects every
    /// prediction without retrying the load.
    pub fn from_load_result<E: Display>(result: Result<ModelBundle<P, M>, E>) -> Self {
        match result {
            Ok(bundle) => Self::new(bundle),
            Err(e) => {
                tracing::error!("Error loading models: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Check if the artifacts are loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    /// Why the artifacts are unavailable, if they are.
    #[must_use]
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            ModelState::Ready(_) => None,
            ModelState::Unavailable { reason } => Some(reason),
        }
    }

    fn bundle(&self) -> Result<&ModelBundle<P, M>, ScorecastError> {
        match &self.state {
            ModelState::Ready(bundle) => Ok(bundle),
            ModelState::Unavailable { .. } => Err(ScorecastError::ModelsUnavailable),
        }
    }

    /// Fail fast when the artifacts are unavailable.
    ///
    /// # Errors
    /// Returns `ScorecastError::ModelsUnavailable` if loading failed at startup.
    pub fn ensure_ready(&self) -> Result<(), ScorecastError> {
        self.bundle().map(|_| ())
    }

    /// Parse submitted form fields and score them.
    ///
    /// Availability is checked before the form is parsed.
    ///
    /// # Errors
    /// Returns error if the models are unavailable, a field is invalid, or
    /// inference fails.
    pub fn predict_form(
        &self,
        form: &HashMap<String, String>,
    ) -> Result<PredictionResult, ScorecastError> {
        self.ensure_ready()?;
        let attributes = StudentAttributes::from_form(form)?;
        self.predict(&attributes)
    }

    /// Run the full scoring pipeline on one student.
    ///
    /// Performs:
    /// 1. Feature engineering
    /// 2. Preprocessor transform
    /// 3. Math, reading and writing predictions
    /// 4. Round (ties to even) and clamp each score to [0, 100]
    /// 5. Average and bucket into a performance level
    ///
    /// # Errors
    /// Returns error if the models are unavailable or any step fails. No
    /// partial result is ever returned.
    pub fn predict(
        &self,
        attributes: &StudentAttributes,
    ) -> Result<PredictionResult, ScorecastError> {
        let bundle = self.bundle()?;

        let row = EngineeredAttributes::from_attributes(attributes.clone());
        let features = bundle.preprocessor.transform(&row)?;
        tracing::debug!("Transformed row into {} features", features.len());

        let mut scores = [0u8; 3];
        for (slot, (subject, model)) in scores.iter_mut().zip(bundle.models.iter()) {
            let raw = model.predict(&features)?;
            *slot = clamp_score(raw).ok_or_else(|| ModelError::NonFinite {
                subject: subject.to_string(),
            })?;
            tracing::debug!("{} prediction: raw={:.3}, score={}", subject, raw, slot);
        }

        let [math, reading, writing] = scores;
        let result = PredictionResult::from_scores(math, reading, writing);

        tracing::info!(
            "Prediction complete: math={}, reading={}, writing={}, avg={}, performance={}",
            result.math_score,
            result.reading_score,
            result.writing_score,
            result.avg_score,
            result.performance
        );

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! Deterministic stand-ins for the artifact ports.

    use crate::domain::EngineeredAttributes;
    use crate::ports::{ModelError, Preprocessor, Regressor};

    /// Emits `[NrSiblings]`, rejecting any gender other than female/male.
    pub struct SiblingsPreprocessor;

    impl Preprocessor for SiblingsPreprocessor {
        fn output_width(&self) -> usize {
            1
        }

        fn transform(&self, row: &EngineeredAttributes) -> Result<Vec<f64>, ModelError> {
            let gender = &row.attributes.gender;
            if gender != "female" && gender != "male" {
                return Err(ModelError::UnknownCategory {
                    column: "Gender".into(),
                    value: gender.clone(),
                });
            }
            Ok(vec![row.attributes.nr_siblings as f64])
        }
    }

    /// Always predicts the same raw value.
    pub struct ConstantRegressor(pub f64);

    impl Regressor for ConstantRegressor {
        fn supports_input_width(&self, _width: usize) -> bool {
            true
        }

        fn predict(&self, _features: &[f64]) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{ConstantRegressor, SiblingsPreprocessor};
    use super::*;
    use crate::adapters::artifacts::{fixtures, load_artifacts, LoadOptions};
    use crate::domain::{sample_form, AttributeError, PerformanceLevel};
    use crate::ports::SubjectModels;
    use tempfile::tempdir;

    fn constant_service(
        math: f64,
        reading: f64,
        writing: f64,
    ) -> ScoringService<SiblingsPreprocessor, ConstantRegressor> {
        ScoringService::new(ModelBundle {
            preprocessor: SiblingsPreprocessor,
            models: SubjectModels {
                math: ConstantRegressor(math),
                reading: ConstantRegressor(reading),
                writing: ConstantRegressor(writing),
            },
        })
    }

    fn attributes() -> StudentAttributes {
        StudentAttributes::from_form(&sample_form()).expect("Should parse")
    }

    #[test]
    fn test_scores_are_clamped() {
        let service = constant_service(-25.0, 140.2, 55.4);
        let result = service.predict(&attributes()).expect("Should predict");

        assert_eq!(result.math_score, 0);
        assert_eq!(result.reading_score, 100);
        assert_eq!(result.writing_score, 55);
        // 155 / 3 = 51.67
        assert_eq!(result.avg_score, 52);
        assert_eq!(result.performance, PerformanceLevel::NeedsImprovement);
    }

    #[test]
    fn test_average_uses_clamped_integers() {
        // 49.5 rounds to 50 (ties to even), 50.4 rounds to 50.
        let service = constant_service(49.5, 50.0, 50.4);
        let result = service.predict(&attributes()).expect("Should predict");
        assert_eq!(
            (result.math_score, result.reading_score, result.writing_score),
            (50, 50, 50)
        );
        assert_eq!(result.avg_score, 50);
        assert_eq!(result.performance, PerformanceLevel::NeedsImprovement);
    }

    #[test]
    fn test_performance_boundary_through_pipeline() {
        let excellent = constant_service(90.0, 90.0, 90.0)
            .predict(&attributes())
            .expect("Should predict");
        assert_eq!(excellent.performance, PerformanceLevel::Excellent);

        let very_good = constant_service(89.0, 89.0, 89.0)
            .predict(&attributes())
            .expect("Should predict");
        assert_eq!(very_good.performance, PerformanceLevel::VeryGood);

        let unsatisfactory = constant_service(49.0, 49.0, 49.0)
            .predict(&attributes())
            .expect("Should predict");
        assert_eq!(unsatisfactory.performance, PerformanceLevel::Unsatisfactory);
    }

    #[test]
    fn test_non_finite_prediction_fails() {
        let service = constant_service(70.0, f64::NAN, 70.0);
        let err = service.predict(&attributes()).expect_err("must fail");
        assert!(matches!(
            err,
            ScorecastError::Model(ModelError::NonFinite { ref subject }) if subject == "reading"
        ));
    }

    #[test]
    fn test_unknown_category_fails() {
        let service = constant_service(70.0, 70.0, 70.0);
        let mut attrs = attributes();
        attrs.gender = "unknown".into();

        let err = service.predict(&attrs).expect_err("must fail");
        assert!(matches!(
            err,
            ScorecastError::Model(ModelError::UnknownCategory { .. })
        ));
        assert!(!err.is_server_fault());
    }

    #[test]
    fn test_predict_form_rejects_malformed_siblings() {
        let service = constant_service(70.0, 70.0, 70.0);
        let mut form = sample_form();
        form.insert("nrSiblings".into(), "many".into());

        let err = service.predict_form(&form).expect_err("must fail");
        assert!(matches!(
            err,
            ScorecastError::Validation(AttributeError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn test_unavailable_service_never_runs_inference() {
        let service: ScoringService<SiblingsPreprocessor, ConstantRegressor> =
            ScoringService::unavailable("preprocessor.json missing");
        assert!(!service.is_ready());
        assert_eq!(service.unavailable_reason(), Some("preprocessor.json missing"));

        let err = service.predict(&attributes()).expect_err("must fail");
        assert!(matches!(err, ScorecastError::ModelsUnavailable));
        assert!(err.is_server_fault());

        // Availability is checked before the form is even parsed.
        let err = service.predict_form(&HashMap::new()).expect_err("must fail");
        assert!(matches!(err, ScorecastError::ModelsUnavailable));
        assert_eq!(err.to_string(), crate::MODELS_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_from_load_result() {
        let failed: Result<ModelBundle<SiblingsPreprocessor, ConstantRegressor>, String> =
            Err("boom".into());
        let service = ScoringService::from_load_result(failed);
        assert_eq!(service.unavailable_reason(), Some("boom"));
    }

    #[test]
    fn test_pipeline_with_loaded_artifacts() {
        let temp = tempdir().expect("tempdir");
        fixtures::write_all(temp.path());
        let service = ScoringService::from_load_result(load_artifacts(
            temp.path(),
            LoadOptions::default(),
        ));
        assert!(service.is_ready());

        let result = service
            .predict_form(&sample_form())
            .expect("Should predict");
        assert_eq!(result.math_score, 72);
        assert_eq!(result.reading_score, 79);
        assert_eq!(result.writing_score, 79);
        assert_eq!(result.avg_score, 77);
        assert_eq!(result.performance, PerformanceLevel::Good);

        // Same input, same output.
        assert_eq!(service.predict_form(&sample_form()).expect("again"), result);
    }
}
