//! Payload validation for `/predict` and `/recommend`.
//!
//! Bodies arrive as untyped JSON so that every rejection can name the
//! offending field instead of surfacing a generic deserializer message.

use std::num::NonZeroUsize;

use serde_json::{Map, Value};

use crate::classifier::{FEATURE_COLUMNS, FeatureRecord};
use crate::config::RecommendConfig;

use super::error::ApiError;

/// Minimum number of tokens: one condition plus at least one habit.
pub const MIN_RECOMMEND_TOKENS: usize = 2;

/// Validated `/recommend` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendRequest {
    pub tokens: Vec<String>,
    pub top_k: NonZeroUsize,
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ApiError> {
    body.as_object()
        .ok_or_else(|| ApiError::Validation("request body must be a JSON object".into()))
}

/// Check the 11 classifier fields and build a [`FeatureRecord`].
///
/// Numeric fields accept JSON numbers or numeric strings; `gender` and
/// `smoking_history` must be strings.
pub fn feature_record(body: &Value) -> Result<FeatureRecord, ApiError> {
    let obj = as_object(body)?;

    if let Some(missing) = FEATURE_COLUMNS
        .iter()
        .find(|col| obj.get(**col).is_none_or(Value::is_null))
    {
        return Err(ApiError::Validation(format!("missing field: {missing}")));
    }

    let number = |col: &str| -> Result<f64, ApiError> {
        let parsed = match &obj[col] {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| ApiError::Validation(format!("field '{col}' must be a number")))
    };
    let text = |col: &str| -> Result<String, ApiError> {
        obj[col]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation(format!("field '{col}' must be a string")))
    };

    Ok(FeatureRecord {
        age: number("age")?,
        gender: text("gender")?,
        bmi: number("bmi")?,
        hba1c: number("hbA1c")?,
        blood_glucose_level: number("blood_glucose_level")?,
        hemoglobin: number("hemoglobin")?,
        insulin: number("insulin")?,
        triglycerides: number("triglycerides")?,
        hematocrit: number("hematocrit")?,
        red_blood_cells: number("red_blood_cells")?,
        smoking_history: text("smoking_history")?,
    })
}

/// Check the `input` list and optional `top_k`.
pub fn recommend_request(body: &Value, limits: &RecommendConfig) -> Result<RecommendRequest, ApiError> {
    let obj = as_object(body)?;

    let Some(Value::Array(items)) = obj.get("input") else {
        return Err(ApiError::Validation("field \"input\" must be a list".into()));
    };

    let tokens = items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<String>>>()
        .ok_or_else(|| ApiError::Validation("entries of \"input\" must be strings".into()))?;

    if tokens.len() < MIN_RECOMMEND_TOKENS {
        return Err(ApiError::Validation(
            "at least a condition and one habit are required".into(),
        ));
    }

    let top_k = match obj.get("top_k") {
        None | Some(Value::Null) => limits.default_top_k,
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .and_then(NonZeroUsize::new)
            .filter(|k| *k <= limits.max_top_k)
            .ok_or_else(|| {
                ApiError::Validation(format!(
                    "\"top_k\" must be an integer between 1 and {}",
                    limits.max_top_k
                ))
            })?,
    };

    Ok(RecommendRequest { tokens, top_k })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> RecommendConfig {
        RecommendConfig {
            default_top_k: NonZeroUsize::new(1).unwrap(),
            max_top_k: NonZeroUsize::new(3).unwrap(),
        }
    }

    fn complete() -> Value {
        json!({
            "age": 52, "gender": "Male", "bmi": "31.4", "hbA1c": 7.9,
            "blood_glucose_level": 210, "hemoglobin": 14.2, "insulin": 18.5,
            "triglycerides": 190, "hematocrit": 42, "red_blood_cells": 4.9,
            "smoking_history": "former"
        })
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn complete_record_parses() {
        let r = feature_record(&complete()).unwrap();
        assert_eq!(r.age, 52.0);
        assert_eq!(r.bmi, 31.4);
        assert_eq!(r.hba1c, 7.9);
        assert_eq!(r.smoking_history, "former");
    }

    #[test]
    fn first_missing_field_is_named() {
        let mut body = complete();
        body.as_object_mut().unwrap().remove("hemoglobin");
        body.as_object_mut().unwrap().remove("insulin");
        assert_eq!(message(feature_record(&body).unwrap_err()), "missing field: hemoglobin");
    }

    #[test]
    fn null_counts_as_missing() {
        let mut body = complete();
        body["gender"] = Value::Null;
        assert_eq!(message(feature_record(&body).unwrap_err()), "missing field: gender");
    }

    #[test]
    fn non_numeric_value_rejected() {
        let mut body = complete();
        body["insulin"] = json!("lots");
        assert!(message(feature_record(&body).unwrap_err()).contains("'insulin'"));
    }

    #[test]
    fn categorical_must_be_string() {
        let mut body = complete();
        body["smoking_history"] = json!(3);
        assert!(message(feature_record(&body).unwrap_err()).contains("must be a string"));
    }

    #[test]
    fn non_object_body_rejected() {
        assert!(feature_record(&json!([1, 2])).is_err());
        assert!(recommend_request(&json!("x"), &limits()).is_err());
    }

    #[test]
    fn recommend_defaults_top_k() {
        let req = recommend_request(&json!({"input": ["Diabetes", "smokes"]}), &limits()).unwrap();
        assert_eq!(req.tokens, vec!["Diabetes", "smokes"]);
        assert_eq!(req.top_k.get(), 1);
    }

    #[test]
    fn recommend_requires_list() {
        let err = recommend_request(&json!({"input": "Diabetes"}), &limits()).unwrap_err();
        assert!(message(err).contains("must be a list"));
        let err = recommend_request(&json!({}), &limits()).unwrap_err();
        assert!(message(err).contains("must be a list"));
    }

    #[test]
    fn recommend_requires_two_tokens() {
        let err = recommend_request(&json!({"input": ["Diabetes"]}), &limits()).unwrap_err();
        assert!(message(err).contains("at least"));
    }

    #[test]
    fn recommend_rejects_non_string_tokens() {
        let err = recommend_request(&json!({"input": ["Diabetes", 4]}), &limits()).unwrap_err();
        assert!(message(err).contains("strings"));
    }

    #[test]
    fn top_k_bounds() {
        let ok = recommend_request(&json!({"input": ["a", "b"], "top_k": 3}), &limits()).unwrap();
        assert_eq!(ok.top_k.get(), 3);
        for bad in [json!(0), json!(4), json!(-1), json!("2"), json!(1.5)] {
            let body = json!({"input": ["a", "b"], "top_k": bad});
            assert!(recommend_request(&body, &limits()).is_err(), "accepted {body}");
        }
    }
}
