#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! JSON request and response types for the Getaround HTTP services.
//!
//! Both the pricing API and the delay dashboard share the error body and
//! health response defined here; the query parameter types are specific
//! to one service each.

use serde::{Deserialize, Serialize};

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Builds an error body from anything printable.
    #[must_use]
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Response of `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Daily rental price, rounded to two decimals.
    pub prediction: f64,
}

/// Query parameters for `GET /preview`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewParams {
    /// Makes the sample reproducible.
    pub seed: Option<u64>,
}

/// Query parameters for `GET /api/rentals`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RentalsParams {
    /// Number of rows to return. Defaults to 100.
    pub limit: Option<usize>,
}

/// Query parameters for `GET /api/distributions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionParams {
    /// Histogram bin width in minutes.
    pub bin_width: Option<f64>,
}

/// Query parameters for the flexibility-driven sweep endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlexibilityParams {
    /// Minutes a customer can shift their pick-up time.
    pub flexibility: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_shape() {
        let body = serde_json::to_value(ApiError::new("boom")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "boom"}));
    }

    #[test]
    fn distribution_params_are_camel_case() {
        let params: DistributionParams = serde_json::from_str(r#"{"binWidth": 5.0}"#).unwrap();
        assert_eq!(params.bin_width, Some(5.0));
    }

    #[test]
    fn prediction_body_shape() {
        let body = serde_json::to_value(PredictionResponse { prediction: 123.45 }).unwrap();
        assert_eq!(body, serde_json::json!({"prediction": 123.45}));
    }
}
