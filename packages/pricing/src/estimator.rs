//! Support-vector regression on a standardized target.

use linfa::traits::Predict as _;
use linfa_svm::Svm;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::PricingError;
use crate::scaler::StandardScaler;
use crate::svr::{self, SvrParams};

/// Bundles a target [`StandardScaler`] with an RBF [`Svm`] regressor.
///
/// `fit` standardizes the target before fitting the regressor; `predict`
/// runs the regressor and maps the result back to the target's units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvrWithInverseScaler {
    n_features: usize,
    scaler: StandardScaler,
    svr: Svm<f64, f64>,
}

impl SvrWithInverseScaler {
    /// Fits the target scaler on `y`, then the regressor on `(x, scaled y)`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Fit`] if either fit fails.
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<f64>,
        params: &SvrParams,
    ) -> Result<Self, PricingError> {
        let scaler = StandardScaler::fit_column(y)?;
        let y_scaled = scaler
            .transform(y.clone().insert_axis(Axis(1)))?
            .column(0)
            .to_owned();
        let svr = svr::fit(x, &y_scaled, params)?;
        Ok(Self {
            n_features: x.ncols(),
            scaler,
            svr,
        })
    }

    /// Number of input features the regressor expects.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predicts every row of `x` in the target's original units.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Prediction`] if the row width differs from
    /// the fitted width.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, PricingError> {
        if x.ncols() != self.n_features {
            return Err(PricingError::Prediction {
                message: format!(
                    "regressor expects {} features, got {}",
                    self.n_features,
                    x.ncols()
                ),
            });
        }
        let scaled: Array1<f64> = self.svr.predict(x);
        let restored = self.scaler.inverse_transform(scaled.insert_axis(Axis(1)))?;
        Ok(restored.column(0).to_owned())
    }

    /// Predicts one row in the target's original units.
    ///
    /// # Errors
    ///
    /// See [`Self::predict`].
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64, PricingError> {
        let x = row.to_owned().insert_axis(Axis(0));
        Ok(self.predict(&x)?[0])
    }
}
