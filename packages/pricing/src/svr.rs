//! Epsilon support-vector regression with an RBF kernel, via `linfa-svm`.

use linfa::Dataset;
use linfa::traits::Fit as _;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::PricingError;

/// Kernel width selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// `1 / (n_features * Var(X))`, with the variance taken over every
    /// entry of the training matrix.
    Scale,
    /// Fixed value.
    Value(f64),
}

impl Gamma {
    /// Resolves the kernel coefficient for the training matrix `x`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resolve(self, x: &Array2<f64>) -> f64 {
        match self {
            Self::Value(gamma) => gamma,
            Self::Scale => {
                let mean = x.mean().unwrap_or(0.0);
                let variance = x.mapv(|v| (v - mean).powi(2)).mean().unwrap_or(0.0);
                let denominator = x.ncols() as f64 * variance;
                if denominator > 0.0 { 1.0 / denominator } else { 1.0 }
            }
        }
    }
}

/// Hyper-parameters for [`fit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvrParams {
    /// Box constraint on the dual coefficients.
    pub c: f64,
    /// Width of the insensitive tube.
    pub epsilon: f64,
    /// RBF kernel width.
    pub gamma: Gamma,
    /// Solver stopping tolerance.
    pub tolerance: f64,
}

impl Default for SvrParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.1,
            gamma: Gamma::Scale,
            tolerance: 1e-3,
        }
    }
}

/// Fits an epsilon-SVR on `x` and targets `y`.
///
/// The Gaussian kernel of `linfa` is `exp(-‖a - b‖² / w)`, so the width
/// passed to it is `1 / gamma`.
///
/// # Errors
///
/// Returns [`PricingError::Fit`] if the inputs are empty, have mismatched
/// lengths, contain non-finite values, or the hyper-parameters are
/// invalid, and [`PricingError::Svm`] if the solver fails.
pub fn fit(
    x: &Array2<f64>,
    y: &Array1<f64>,
    params: &SvrParams,
) -> Result<Svm<f64, f64>, PricingError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(PricingError::Fit {
            message: "cannot fit a regressor on an empty matrix".to_string(),
        });
    }
    if x.nrows() != y.len() {
        return Err(PricingError::Fit {
            message: format!("{} rows but {} targets", x.nrows(), y.len()),
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(PricingError::Fit {
            message: "training data contains non-finite values".to_string(),
        });
    }

    let gamma = params.gamma.resolve(x);
    if !(params.c > 0.0) || params.epsilon < 0.0 || !(params.tolerance > 0.0) || !(gamma > 0.0) {
        return Err(PricingError::Fit {
            message: format!(
                "invalid hyper-parameters: C={}, epsilon={}, gamma={gamma}, tolerance={}",
                params.c, params.epsilon, params.tolerance
            ),
        });
    }

    log::debug!(
        "Fitting SVR on {}x{} (C={}, epsilon={}, gamma={gamma})",
        x.nrows(),
        x.ncols(),
        params.c,
        params.epsilon
    );

    let dataset = Dataset::new(x.clone(), y.clone());
    let model = Svm::<f64, f64>::params()
        .c_svr(params.c, Some(params.epsilon))
        .eps(params.tolerance)
        .gaussian_kernel(1.0 / gamma)
        .fit(&dataset)?;

    log::debug!("SVR kept {} support vectors", model.nsupport());
    Ok(model)
}
