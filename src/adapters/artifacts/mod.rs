//! JSON artifact store: loads the fitted preprocessor and subject regressors.
//!
//! Artifacts are read once at startup from a single directory:
//! - `preprocessor.json`
//! - `math_model.json`, `reading_model.json`, `writing_model.json`
//!
//! # Integrity
//!
//! An optional `manifest.json` binds each artifact to its SHA-256 digest
//! (see the `write_manifest` binary). When present, every listed file must
//! exist and match, and all four artifacts must be listed. Loading without a
//! manifest can be refused with `LoadOptions::require_manifest`.

mod preprocessor;
mod regressor;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::Subject;
use crate::ports::{ModelBundle, Preprocessor, Regressor, SubjectModels};

pub use preprocessor::{ColumnPreprocessor, ColumnTransformer, HandleUnknown};
pub use regressor::{Aggregation, DecisionTree, RegressionModel, TreeEnsemble};

/// File name of the fitted preprocessor.
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";

/// File name of the integrity manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// File name of the regressor for `subject`.
#[must_use]
pub fn model_file(subject: Subject) -> String {
    format!("{}_model.json", subject.name())
}

/// Every artifact file name, preprocessor first.
#[must_use]
pub fn artifact_files() -> Vec<String> {
    std::iter::once(PREPROCESSOR_FILE.to_string())
        .chain(Subject::ALL.into_iter().map(model_file))
        .collect()
}

/// Artifacts as loaded from disk.
pub type ArtifactStore = ModelBundle<ColumnPreprocessor, RegressionModel>;

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid artifact format in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("File hash mismatch for {file}")]
    HashMismatch { file: String },

    #[error("{subject} model does not accept the {width} features produced by the preprocessor")]
    Incompatible { subject: Subject, width: usize },
}

/// Options controlling artifact loading.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Refuse to load when `manifest.json` is absent.
    pub require_manifest: bool,
}

/// Integrity manifest binding artifact files to SHA-256 digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

impl Manifest {
    /// Hash every artifact in `dir` into a new manifest.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if an artifact cannot be read.
    pub fn for_dir(dir: &Path) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in artifact_files() {
            let bytes = read_file(&dir.join(&name))?;
            files.insert(name, sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            files,
        })
    }

    fn read(dir: &Path) -> Result<Option<Self>, ArtifactError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = read_file(&path)?;
        let manifest: Self = serde_json::from_slice(&bytes)
            .map_err(|source| ArtifactError::Parse { path, source })?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Manifest(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }
        Ok(Some(manifest))
    }

    /// Check that every listed file in `dir` matches its recorded digest.
    fn verify(&self, dir: &Path) -> Result<(), ArtifactError> {
        let expected = artifact_files();
        for name in &expected {
            if !self.files.contains_key(name) {
                return Err(ArtifactError::Manifest(format!("{name} is not listed")));
            }
        }
        // Only known artifact names are ever joined onto `dir`.
        if let Some(name) = self.files.keys().find(|name| !expected.contains(name)) {
            return Err(ArtifactError::Manifest(format!("unexpected entry {name:?}")));
        }
        for (name, expected) in &self.files {
            let bytes = read_file(&dir.join(name))?;
            if !sha256_hex(&bytes).eq_ignore_ascii_case(expected.trim()) {
                return Err(ArtifactError::HashMismatch { file: name.clone() });
            }
        }
        Ok(())
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_json<T>(dir: &Path, name: &str) -> Result<T, ArtifactError>
where
    T: serde::de::DeserializeOwned,
{
    let path = dir.join(name);
    let bytes = read_file(&path)?;
    let value = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.clone(),
        source,
    })?;
    tracing::info!("Loaded {} from {:?} (sha256={})", name, path, sha256_hex(&bytes));
    Ok(value)
}

fn load_model(dir: &Path, subject: Subject) -> Result<RegressionModel, ArtifactError> {
    let name = model_file(subject);
    let model: RegressionModel = load_json(dir, &name)?;
    model
        .validate()
        .map_err(|reason| ArtifactError::Invalid { name, reason })?;
    Ok(model)
}

/// Load and validate all artifacts from `dir`.
///
/// # Errors
/// Returns error if a file is missing or malformed, the manifest does not
/// match, or a model cannot consume the preprocessor output.
pub fn load_artifacts(dir: &Path, options: LoadOptions) -> Result<ArtifactStore, ArtifactError> {
    match Manifest::read(dir)? {
        Some(manifest) => {
            manifest.verify(dir)?;
            tracing::info!(
                "Verified {} artifact digests against {}",
                manifest.files.len(),
                MANIFEST_FILE
            );
        }
        None if options.require_manifest => {
            return Err(ArtifactError::Manifest(format!(
                "{MANIFEST_FILE} is required but missing from {dir:?}"
            )));
        }
        None => tracing::warn!(
            "No {} in {:?}; artifact digests not verified",
            MANIFEST_FILE,
            dir
        ),
    }

    let preprocessor: ColumnPreprocessor = load_json(dir, PREPROCESSOR_FILE)?;
    preprocessor
        .validate()
        .map_err(|reason| ArtifactError::Invalid {
            name: PREPROCESSOR_FILE.to_string(),
            reason,
        })?;

    let models = SubjectModels {
        math: load_model(dir, Subject::Math)?,
        reading: load_model(dir, Subject::Reading)?,
        writing: load_model(dir, Subject::Writing)?,
    };

    let width = preprocessor.output_width();
    for (subject, model) in models.iter() {
        if !model.supports_input_width(width) {
            return Err(ArtifactError::Incompatible { subject, width });
        }
    }

    tracing::info!("Artifacts ready: preprocessor emits {} features", width);

    Ok(ModelBundle {
        preprocessor,
        models,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-fitted artifact set shared by tests.

    use std::path::Path;

    pub const PREPROCESSOR: &str = r#"{
        "transformers": [
            {"kind": "standard_scaler", "columns": ["NrSiblings"], "mean": [2.0], "scale": [1.0]},
            {"kind": "one_hot", "columns": ["Gender", "TestPrep"],
             "categories": [["female", "male"], ["completed", "none"]]},
            {"kind": "passthrough", "columns": ["GoodStudyHabits", "StableFamily"]}
        ]
    }"#;

    /// Features: [siblings_z, female, male, completed, none, good_habits, stable]
    pub const MATH_MODEL: &str =
        r#"{"kind": "linear", "coefficients": [0.0, -2.0, 4.0, 5.0, 0.0, 6.0, 3.0], "intercept": 60.0}"#;
    pub const READING_MODEL: &str =
        r#"{"kind": "linear", "coefficients": [0.0, 6.0, 0.0, 4.0, 0.0, 5.0, 2.0], "intercept": 62.0}"#;
    pub const WRITING_MODEL: &str = r#"{
        "kind": "tree_ensemble",
        "aggregation": "mean",
        "trees": [
            {"children_left": [1, -1, -1], "children_right": [2, -1, -1],
             "feature": [3, -2, -2], "threshold": [0.5, -2.0, -2.0],
             "value": [70.0, 65.0, 81.0]},
            {"children_left": [1, -1, -1], "children_right": [2, -1, -1],
             "feature": [1, -2, -2], "threshold": [0.5, -2.0, -2.0],
             "value": [70.0, 69.0, 77.0]}
        ]
    }"#;

    pub fn write_all(dir: &Path) {
        for (name, body) in [
            ("preprocessor.json", PREPROCESSOR),
            ("math_model.json", MATH_MODEL),
            ("reading_model.json", READING_MODEL),
            ("writing_model.json", WRITING_MODEL),
        ] {
            std::fs::write(dir.join(name), body).expect("write artifact");
        }
    }
}
