//! Fitted pipeline persistence and the prediction entry point.

use std::path::{Path, PathBuf};

use getaround_pricing_models::{PredictionFeatures, VehicleListing};
use ndarray::Array1;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{ArtifactError, PricingError};
use crate::estimator::SvrWithInverseScaler;
use crate::preprocessor::Preprocessor;
use crate::svr::SvrParams;

/// File name of the persisted [`Preprocessor`].
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";

/// File name of the persisted [`SvrWithInverseScaler`].
pub const MODEL_FILE: &str = "svr_model.json";

/// Both pipeline artifacts, as produced by [`fit_pipeline`].
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub preprocessor: Preprocessor,
    pub model: SvrWithInverseScaler,
}

impl Artifacts {
    /// Writes both artifacts into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::ArtifactWrite`] if the directory or either
    /// file cannot be written.
    pub fn save(&self, dir: &Path) -> Result<(), PricingError> {
        std::fs::create_dir_all(dir).map_err(|e| PricingError::ArtifactWrite {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        write_json(&dir.join(PREPROCESSOR_FILE), &self.preprocessor)?;
        write_json(&dir.join(MODEL_FILE), &self.model)?;
        log::info!("Saved artifacts to {}", dir.display());
        Ok(())
    }

    /// Reads both artifacts from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Artifact`] if either file is missing or
    /// malformed.
    pub fn load(dir: &Path) -> Result<Self, PricingError> {
        Ok(Self {
            preprocessor: load_preprocessor(dir)?,
            model: load_model(dir)?,
        })
    }

    /// Runs one payload through the preprocessor and the model.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Transform`] if encoding fails or the encoded
    /// width does not match the model, and [`PricingError::Prediction`] if
    /// the model fails.
    pub fn predict(&self, features: &PredictionFeatures) -> Result<f64, PricingError> {
        let row = self.preprocessor.transform(features)?;
        if row.len() != self.model.n_features() {
            return Err(PricingError::Transform {
                message: format!(
                    "preprocessor produced {} features but the model expects {}",
                    row.len(),
                    self.model.n_features()
                ),
            });
        }
        self.model.predict_row(row.view())
    }
}

/// Loads the preprocessor artifact from `dir`.
///
/// # Errors
///
/// Returns [`PricingError::Artifact`] if the file is missing or malformed.
pub fn load_preprocessor(dir: &Path) -> Result<Preprocessor, PricingError> {
    read_json(&dir.join(PREPROCESSOR_FILE))
}

/// Loads the model artifact from `dir`.
///
/// # Errors
///
/// Returns [`PricingError::Artifact`] if the file is missing or malformed.
pub fn load_model(dir: &Path) -> Result<SvrWithInverseScaler, PricingError> {
    read_json(&dir.join(MODEL_FILE))
}

/// Fits the preprocessor and the model on `listings`, using
/// `rental_price_per_day` as the target.
///
/// # Errors
///
/// Returns [`PricingError::Fit`] if there are no listings or a fit fails.
pub fn fit_pipeline<'a>(
    listings: impl IntoIterator<Item = &'a VehicleListing>,
    params: &SvrParams,
) -> Result<Artifacts, PricingError> {
    let (features, target): (Vec<PredictionFeatures>, Vec<f64>) = listings
        .into_iter()
        .map(|l| (l.features(), l.rental_price_per_day))
        .unzip();

    log::info!("Fitting pipeline on {} listings", features.len());

    let preprocessor = Preprocessor::fit(&features)?;
    let x = preprocessor.transform_all(&features)?;
    let model = SvrWithInverseScaler::fit(&x, &Array1::from(target), params)?;

    Ok(Artifacts {
        preprocessor,
        model,
    })
}

/// Reloads both artifacts from `dir` and predicts a daily rental price,
/// rounded to two decimals.
///
/// # Errors
///
/// See [`Artifacts::load`] and [`Artifacts::predict`].
pub fn predict_price(dir: &Path, features: &PredictionFeatures) -> Result<f64, PricingError> {
    let artifacts = Artifacts::load(dir)?;
    let price = artifacts.predict(features)?;
    Ok(round2(price))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PricingError> {
    let load = || -> Result<T, ArtifactError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    };
    load().map_err(|source| PricingError::Artifact {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PricingError> {
    let save = || -> Result<(), ArtifactError> {
        std::fs::write(path, serde_json::to_vec(value)?)?;
        Ok(())
    };
    save().map_err(|source| PricingError::ArtifactWrite {
        path: path.to_path_buf(),
        source,
    })
}
