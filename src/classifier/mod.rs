//! Classifier adapter — wraps the pretrained condition model.
//!
//! The service only depends on the [`Classifier`] trait: a fixed-schema
//! [`FeatureRecord`] goes in, a [`Condition`] (plus optional per-class
//! percentages) comes out.  [`SoftmaxModel`] is the backend shipped with the
//! service; other backends can be slotted in behind the same trait.

mod softmax;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

pub use softmax::{LoadedModel, SoftmaxModel};

/// Feature columns in the order the model was trained on.
pub const FEATURE_COLUMNS: [&str; 11] = [
    "age",
    "gender",
    "bmi",
    "hbA1c",
    "blood_glucose_level",
    "hemoglobin",
    "insulin",
    "triglycerides",
    "hematocrit",
    "red_blood_cells",
    "smoking_history",
];

/// Numeric subset of [`FEATURE_COLUMNS`].
pub const NUMERIC_COLUMNS: [&str; 9] = [
    "age",
    "bmi",
    "hbA1c",
    "blood_glucose_level",
    "hemoglobin",
    "insulin",
    "triglycerides",
    "hematocrit",
    "red_blood_cells",
];

/// Categorical subset of [`FEATURE_COLUMNS`].
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["gender", "smoking_history"];

// ── Condition ─────────────────────────────────────────────────────────────────

/// Condition classes, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    Healthy,
    Diabetes,
    Anemia,
    /// Diabetes and anemia together.
    Both,
}

impl Condition {
    pub const ALL: [Condition; 4] =
        [Condition::Healthy, Condition::Diabetes, Condition::Anemia, Condition::Both];

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Healthy => "Healthy",
            Condition::Diabetes => "Diabetes",
            Condition::Anemia => "Anemia",
            Condition::Both => "Both",
        }
    }

    /// Model output index → class.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── FeatureRecord ─────────────────────────────────────────────────────────────

/// One subject's measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub age: f64,
    pub gender: String,
    pub bmi: f64,
    #[serde(rename = "hbA1c")]
    pub hba1c: f64,
    pub blood_glucose_level: f64,
    pub hemoglobin: f64,
    pub insulin: f64,
    pub triglycerides: f64,
    pub hematocrit: f64,
    pub red_blood_cells: f64,
    pub smoking_history: String,
}

impl FeatureRecord {
    /// Numeric value for a column of [`NUMERIC_COLUMNS`].
    pub fn numeric(&self, column: &str) -> Option<f64> {
        let v = match column {
            "age" => self.age,
            "bmi" => self.bmi,
            "hbA1c" => self.hba1c,
            "blood_glucose_level" => self.blood_glucose_level,
            "hemoglobin" => self.hemoglobin,
            "insulin" => self.insulin,
            "triglycerides" => self.triglycerides,
            "hematocrit" => self.hematocrit,
            "red_blood_cells" => self.red_blood_cells,
            _ => return None,
        };
        Some(v)
    }

    /// Category value for a column of [`CATEGORICAL_COLUMNS`].
    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            "gender" => Some(self.gender.as_str()),
            "smoking_history" => Some(self.smoking_history.as_str()),
            _ => None,
        }
    }
}

// ── Prediction ────────────────────────────────────────────────────────────────

/// Per-class percentages (0–100, two decimals).
pub type ClassProbabilities = BTreeMap<Condition, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub condition: Condition,
    /// `None` when the backend cannot produce calibrated scores.
    pub probabilities: Option<ClassProbabilities>,
}

/// Round a probability in `[0, 1]` to a percentage with two decimals.
pub fn to_percentage(p: f64) -> f64 {
    (p * 100.0 * 100.0).round() / 100.0
}

// ── Classifier ────────────────────────────────────────────────────────────────

/// Pluggable inference backend.
pub trait Classifier: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> Result<Prediction, AdapterError>;

    /// Backend identifier reported by the liveness probe.
    fn backend_type(&self) -> &str;
}
