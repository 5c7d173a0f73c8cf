//! Numeric field coercion (confidence, review score)

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::constants::normalize::DEFAULT_CONFIDENCE;

/// Coerce a model-reported confidence into `[0, 1]`
///
/// Numbers are clamped. Numeric strings ("0.8") are accepted as numbers.
/// Anything else, including an absent field, yields the default of `0.5`.
pub fn normalize_confidence(raw: Option<&Value>) -> f64 {
    clamp_number(raw, 0.0, 1.0).unwrap_or(DEFAULT_CONFIDENCE)
}

/// Clamp a numeric JSON value into `[min, max]`; `None` when not numeric
pub fn clamp_number(raw: Option<&Value>, min: f64, max: f64) -> Option<f64> {
    let number = match raw? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    if number.is_nan() {
        return None;
    }
    Some(number.clamp(min, max))
}

/// Rewrite `field` of `object` in place with its normalized confidence
pub fn apply_confidence(object: &mut Map<String, Value>, field: &str) {
    let normalized = normalize_confidence(object.get(field));
    if object.get(field).and_then(Value::as_f64) != Some(normalized) {
        debug!(field, normalized, "Confidence normalized");
    }
    object.insert(field.to_string(), number(normalized));
}

/// JSON number from an `f64` known to be finite
pub(crate) fn number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamping() {
        assert_eq!(normalize_confidence(Some(&json!(-0.3))), 0.0);
        assert_eq!(normalize_confidence(Some(&json!(1.7))), 1.0);
        assert_eq!(normalize_confidence(Some(&json!(0.42))), 0.42);
        assert_eq!(normalize_confidence(Some(&json!(1))), 1.0);
    }

    #[test]
    fn test_missing_or_non_numeric() {
        assert_eq!(normalize_confidence(None), 0.5);
        assert_eq!(normalize_confidence(Some(&json!("high"))), 0.5);
        assert_eq!(normalize_confidence(Some(&json!(null))), 0.5);
        assert_eq!(normalize_confidence(Some(&json!([0.9]))), 0.5);
    }

    #[test]
    fn test_numeric_string() {
        assert_eq!(normalize_confidence(Some(&json!(" 0.8 "))), 0.8);
        assert_eq!(normalize_confidence(Some(&json!("7"))), 1.0);
    }

    #[test]
    fn test_apply_inserts_default() {
        let mut object = json!({"model": "Agile"}).as_object().cloned().unwrap();
        apply_confidence(&mut object, "confidence");
        assert_eq!(object["confidence"], json!(0.5));
    }

    #[test]
    fn test_clamp_score_range() {
        assert_eq!(clamp_number(Some(&json!(12)), 0.0, 10.0), Some(10.0));
        assert_eq!(clamp_number(Some(&json!(-2)), 0.0, 10.0), Some(0.0));
        assert_eq!(clamp_number(Some(&json!(true)), 0.0, 10.0), None);
    }
}
