//! Multinomial-logistic backend loaded from a JSON artifact.
//!
//! The artifact captures a fitted preprocessing + model pipeline:
//!
//! ```text
//! {
//!   "classes":      ["Healthy", "Diabetes", "Anemia", "Both"],
//!   "numeric":      { "features": [...], "mean": [...], "scale": [...] },
//!   "categorical":  { "gender": [...], "smoking_history": [...] },
//!   "coefficients": [[...], [...], [...], [...]],
//!   "intercepts":   [...]
//! }
//! ```
//!
//! Numeric features are standardised with `mean`/`scale`; each categorical
//! column is one-hot encoded against its vocabulary, with unseen categories
//! encoded as all zeros.  The encoded row is `numeric ++ gender ++
//! smoking_history`, and every coefficient row must have that width.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::artifact;
use crate::error::AdapterError;

use super::{
    CATEGORICAL_COLUMNS, ClassProbabilities, Classifier, Condition, FeatureRecord,
    NUMERIC_COLUMNS, Prediction, to_percentage,
};

#[derive(Debug, Clone, Deserialize)]
struct NumericScaler {
    features: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoricalVocab {
    gender: Vec<String>,
    smoking_history: Vec<String>,
}

impl CategoricalVocab {
    fn for_column(&self, column: &str) -> &[String] {
        match column {
            "gender" => &self.gender,
            _ => &self.smoking_history,
        }
    }

    fn width(&self) -> usize {
        self.gender.len() + self.smoking_history.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ModelArtifact {
    classes: Vec<String>,
    numeric: NumericScaler,
    categorical: CategoricalVocab,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

/// Pretrained softmax classifier over the screening feature schema.
#[derive(Debug, Clone)]
pub struct SoftmaxModel {
    artifact: ModelArtifact,
}

/// A model loaded from disk plus the fingerprint of its artifact.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: SoftmaxModel,
    pub fingerprint: String,
}

impl SoftmaxModel {
    /// Read and validate the model artifact at `path`.
    pub fn load(path: &Path) -> Result<LoadedModel, AdapterError> {
        let source = artifact::read(path)
            .map_err(|e| AdapterError::Artifact(format!("cannot read {}: {e}", path.display())))?;
        let model = Self::from_json(&source.text)?;

        info!(
            path = %path.display(),
            classes = model.artifact.classes.len(),
            width = model.input_width(),
            fingerprint = %source.fingerprint,
            "classifier model loaded"
        );

        Ok(LoadedModel { model, fingerprint: source.fingerprint })
    }

    pub fn from_json(text: &str) -> Result<Self, AdapterError> {
        let artifact: ModelArtifact = serde_json::from_str(text)
            .map_err(|e| AdapterError::Artifact(format!("parse error: {e}")))?;
        validate(&artifact)?;
        Ok(Self { artifact })
    }

    /// Width of the encoded feature row.
    pub fn input_width(&self) -> usize {
        self.artifact.numeric.features.len() + self.artifact.categorical.width()
    }

    /// Standardise and one-hot encode `record` into the model's input row.
    fn encode(&self, record: &FeatureRecord) -> Result<Vec<f64>, AdapterError> {
        let scaler = &self.artifact.numeric;
        let mut row = Vec::with_capacity(self.input_width());

        for ((name, mean), scale) in scaler.features.iter().zip(&scaler.mean).zip(&scaler.scale) {
            let value = record
                .numeric(name)
                .ok_or_else(|| AdapterError::Schema(format!("unknown numeric feature '{name}'")))?;
            if !value.is_finite() {
                return Err(AdapterError::NonFinite(name.clone()));
            }
            row.push((value - mean) / scale);
        }

        for column in CATEGORICAL_COLUMNS {
            let value = record.categorical(column).unwrap_or_default();
            row.extend(
                self.artifact
                    .categorical
                    .for_column(column)
                    .iter()
                    .map(|category| if category == value { 1.0 } else { 0.0 }),
            );
        }

        if row.len() != self.input_width() {
            return Err(AdapterError::Schema(format!(
                "encoded {} features, model expects {}",
                row.len(),
                self.input_width()
            )));
        }
        Ok(row)
    }

    /// Class probabilities in [`Condition::ALL`] order.
    ///
    /// Extreme but finite inputs can overflow the decision scores; those are
    /// rejected rather than turned into NaN probabilities.
    fn probabilities(&self, row: &[f64]) -> Result<Vec<f64>, AdapterError> {
        let logits: Vec<f64> = self
            .artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(weights, bias)| weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect();
        if let Some(i) = logits.iter().position(|z| !z.is_finite()) {
            return Err(AdapterError::NonFinite(format!("decision score of class {i}")));
        }

        let probs = softmax(&logits);
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(AdapterError::NonFinite("class probabilities".into()));
        }
        Ok(probs)
    }
}

impl Classifier for SoftmaxModel {
    fn predict(&self, record: &FeatureRecord) -> Result<Prediction, AdapterError> {
        let row = self.encode(record)?;
        let probs = self.probabilities(&row)?;

        // First maximum wins.
        let mut best = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }
        let condition = Condition::from_index(best)
            .ok_or_else(|| AdapterError::Schema(format!("class index {best} out of range")))?;

        let probabilities: ClassProbabilities = Condition::ALL
            .iter()
            .zip(&probs)
            .map(|(c, p)| (*c, to_percentage(*p)))
            .collect();

        Ok(Prediction { condition, probabilities: Some(probabilities) })
    }

    fn backend_type(&self) -> &str {
        "softmax"
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn validate(a: &ModelArtifact) -> Result<(), AdapterError> {
    let expected: Vec<&str> = Condition::ALL.iter().map(|c| c.as_str()).collect();
    if a.classes != expected {
        return Err(AdapterError::Artifact(format!(
            "classes must be {expected:?}, got {:?}",
            a.classes
        )));
    }

    let n = a.numeric.features.len();
    if a.numeric.mean.len() != n || a.numeric.scale.len() != n {
        return Err(AdapterError::Artifact(format!(
            "numeric scaler has {n} features but {} means and {} scales",
            a.numeric.mean.len(),
            a.numeric.scale.len()
        )));
    }
    for name in &a.numeric.features {
        if !NUMERIC_COLUMNS.contains(&name.as_str()) {
            return Err(AdapterError::Artifact(format!("unknown numeric feature '{name}'")));
        }
    }
    for column in NUMERIC_COLUMNS {
        if !a.numeric.features.iter().any(|f| f == column) {
            return Err(AdapterError::Artifact(format!("numeric feature '{column}' missing")));
        }
    }
    if a.numeric.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
        return Err(AdapterError::Artifact("scale values must be finite and non-zero".into()));
    }

    let width = n + a.categorical.width();
    if a.coefficients.len() != Condition::ALL.len() || a.intercepts.len() != Condition::ALL.len() {
        return Err(AdapterError::Artifact(format!(
            "expected {} coefficient rows and intercepts, got {} and {}",
            Condition::ALL.len(),
            a.coefficients.len(),
            a.intercepts.len()
        )));
    }
    if let Some(row) = a.coefficients.iter().find(|row| row.len() != width) {
        return Err(AdapterError::Artifact(format!(
            "coefficient row has width {}, expected {width}",
            row.len()
        )));
    }
    Ok(())
}
