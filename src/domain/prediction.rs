//! Prediction result types.
//!
//! Represents the output of the three subject regressors after rounding,
//! clamping and bucketing.

use serde::{Deserialize, Serialize};

/// Lowest possible exam score.
pub const MIN_SCORE: u8 = 0;

/// Highest possible exam score.
pub const MAX_SCORE: u8 = 100;

/// Exam subject predicted by one of the three regressors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Math,
    Reading,
    Writing,
}

impl Subject {
    /// All subjects, in response order.
    pub const ALL: [Subject; 3] = [Self::Math, Self::Reading, Self::Writing];

    /// Lowercase subject name used in artifact file names and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Reading => "reading",
            Self::Writing => "writing",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Qualitative performance classification of the average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceLevel {
    #[serde(rename = "Excellent")]
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Satisfactory")]
    Satisfactory,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    #[serde(rename = "Unsatisfactory")]
    Unsatisfactory,
}

impl PerformanceLevel {
    /// Classify an average score. Each band is closed on its lower bound.
    #[must_use]
    pub fn from_average(avg_score: u8) -> Self {
        match avg_score {
            90.. => Self::Excellent,
            80..=89 => Self::VeryGood,
            70..=79 => Self::Good,
            60..=69 => Self::Satisfactory,
            50..=59 => Self::NeedsImprovement,
            _ => Self::Unsatisfactory,
        }
    }

    /// Human-readable label, as serialized in responses.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Satisfactory => "Satisfactory",
            Self::NeedsImprovement => "Needs Improvement",
            Self::Unsatisfactory => "Unsatisfactory",
        }
    }
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Round a raw prediction to the nearest integer and clamp it to [0, 100].
///
/// Ties round to even. Returns `None` for NaN or infinite input.
#[must_use]
pub fn clamp_score(raw: f64) -> Option<u8> {
    if !raw.is_finite() {
        return None;
    }
    let rounded = raw.round_ties_even();
    Some(rounded.clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8)
}

/// Rounded arithmetic mean of three clamped scores.
///
/// A sum of three integers divided by 3 never lands on .5, so the tie rule
/// cannot change the result here.
#[must_use]
pub fn average_score(math: u8, reading: u8, writing: u8) -> u8 {
    let sum = f64::from(math) + f64::from(reading) + f64::from(writing);
    (sum / 3.0).round_ties_even() as u8
}

/// Final prediction returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub math_score: u8,
    pub reading_score: u8,
    pub writing_score: u8,
    pub avg_score: u8,
    pub performance: PerformanceLevel,
}

impl PredictionResult {
    /// Assemble a result from three already clamped subject scores.
    #[must_use]
    pub fn from_scores(math_score: u8, reading_score: u8, writing_score: u8) -> Self {
        let avg_score = average_score(math_score, reading_score, writing_score);
        Self {
            math_score,
            reading_score,
            writing_score,
            avg_score,
            performance: PerformanceLevel::from_average(avg_score),
        }
    }
}
