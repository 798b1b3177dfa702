#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing dataset access and the rental-price prediction pipeline.
//!
//! The pipeline is split into two independently persisted artifacts:
//!
//! - a [`preprocessor::Preprocessor`] that turns a
//!   [`PredictionFeatures`](getaround_pricing_models::PredictionFeatures)
//!   payload into a dense numeric row, and
//! - an [`estimator::SvrWithInverseScaler`] that fits a `linfa-svm` RBF
//!   support-vector regressor on a standardized target and maps its
//!   predictions back to euros per day.
//!
//! [`artifacts::predict_price`] reloads both files on every call, so a
//! running server picks up re-fitted artifacts without a restart.

pub mod artifacts;
pub mod dataset;
pub mod estimator;
pub mod preprocessor;
pub mod scaler;
pub mod svr;

use std::path::PathBuf;

use getaround_pricing_models::InvalidCategoryError;
use getaround_source::SourceError;

/// Errors that can occur in dataset access or the prediction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    /// Search value outside the column's allow-list.
    #[error(transparent)]
    InvalidCategory(#[from] InvalidCategoryError),

    /// Dataset could not be downloaded or read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Dataset could not be parsed as CSV.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// A model artifact is missing, unreadable, or malformed.
    #[error("Failed to load artifact {path}: {source}")]
    Artifact {
        /// Artifact file path.
        path: PathBuf,
        /// Underlying read or decode error.
        #[source]
        source: ArtifactError,
    },

    /// A model artifact could not be written.
    #[error("Failed to save artifact {path}: {source}")]
    ArtifactWrite {
        /// Artifact file path.
        path: PathBuf,
        /// Underlying encode or write error.
        #[source]
        source: ArtifactError,
    },

    /// The preprocessor could not encode the input.
    #[error("Transform error: {message}")]
    Transform {
        /// Description of what went wrong.
        message: String,
    },

    /// The regressor could not produce a prediction.
    #[error("Prediction error: {message}")]
    Prediction {
        /// Description of what went wrong.
        message: String,
    },

    /// Standard scaling failed inside `linfa-preprocessing`.
    #[error("Scaling error: {0}")]
    Scaling(#[from] linfa_preprocessing::PreprocessingError),

    /// The SVR solver failed.
    #[error("SVR error: {0}")]
    Svm(#[from] linfa_svm::SvmError),

    /// Fitting the scaler, preprocessor, or regressor was rejected before
    /// reaching the solver.
    #[error("Fit error: {message}")]
    Fit {
        /// Description of what went wrong.
        message: String,
    },
}

/// Cause of an artifact read or write failure.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// File system error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
