//! HTTP request handlers

use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::preprocessing::FeatureRow;

use super::error::{Result, ServerError};
use super::state::AppState;

pub async fn index() -> Json<Value> {
    Json(json!({ "status": "success" }))
}

/// Predict the price of the property described by the JSON body
pub async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    let row = parse_feature_row(&body)?;
    debug!(features = row.len(), "Received prediction request");

    let predictor = Arc::clone(&state.predictor);
    let price = tokio::task::spawn_blocking(move || predictor.predict(&row))
        .await
        .map_err(|e| ServerError::Internal(format!("Prediction task failed: {}", e)))??;

    Ok(Json(json!({ "predicted_price": round_price(price) })))
}

/// Decode a request body into a feature row.
///
/// The body must be a JSON object. Values may be numbers, booleans,
/// numeric strings or `null`; `null` and blank strings mark a missing value.
pub fn parse_feature_row(body: &[u8]) -> Result<FeatureRow> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ServerError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| ServerError::BadRequest("Expected a JSON object of feature values".to_string()))?;

    let mut row = FeatureRow::with_capacity(object.len());
    for (name, v) in object {
        row.insert(name.clone(), parse_value(name, v)?);
    }
    Ok(row)
}

fn parse_value(name: &str, value: &Value) -> Result<Option<f64>> {
    let parsed = match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().parse::<f64>().map_err(|_| {
            ServerError::BadRequest(format!("Feature '{}' is not a number: {:?}", name, s))
        })?),
        Value::Array(_) | Value::Object(_) => {
            return Err(ServerError::BadRequest(format!(
                "Feature '{}' must be a number, boolean, numeric string or null",
                name
            )))
        }
    };

    match parsed {
        Some(v) if !v.is_finite() => Err(ServerError::BadRequest(format!(
            "Feature '{}' is not a finite number",
            name
        ))),
        other => Ok(other),
    }
}

/// Round to cents
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_values() {
        let row = parse_feature_row(br#"{"Area": 1200, "Gym": true, "Lift": "0", "Pool": null, "Beds": " 3 ", "Wifi": ""}"#).unwrap();

        assert_eq!(row["Area"], Some(1200.0));
        assert_eq!(row["Gym"], Some(1.0));
        assert_eq!(row["Lift"], Some(0.0));
        assert_eq!(row["Pool"], None);
        assert_eq!(row["Beds"], Some(3.0));
        assert_eq!(row["Wifi"], None);
    }

    #[test]
    fn test_parse_rejects_bad_bodies() {
        assert!(parse_feature_row(b"[1, 2]").is_err());
        assert!(parse_feature_row(b"not json").is_err());
        assert!(parse_feature_row(br#"{"Area": "big"}"#).is_err());
        assert!(parse_feature_row(br#"{"Area": [1]}"#).is_err());
        assert!(parse_feature_row(br#"{"Area": "NaN"}"#).is_err());
    }

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(1234.5678), 1234.57);
        assert_eq!(round_price(10.0), 10.0);
    }
}
