//! Per-column standardization backed by `linfa-preprocessing`.

use linfa::DatasetBase;
use linfa::traits::{Fit as _, Transformer as _};
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::PricingError;

/// Removes the mean and divides by the standard deviation of each column
/// seen at fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    width: usize,
    inner: LinearScaler<f64>,
}

impl StandardScaler {
    /// Fits the scaler on the columns of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Fit`] if `x` has no rows or contains
    /// non-finite values, and [`PricingError::Scaling`] if the fit itself
    /// fails.
    pub fn fit(x: &Array2<f64>) -> Result<Self, PricingError> {
        if x.nrows() == 0 {
            return Err(PricingError::Fit {
                message: "cannot fit a scaler on zero rows".to_string(),
            });
        }
        if let Some((row, _)) = x
            .axis_iter(Axis(0))
            .enumerate()
            .find(|(_, r)| r.iter().any(|v| !v.is_finite()))
        {
            return Err(PricingError::Fit {
                message: format!("row {row} contains a non-finite value"),
            });
        }

        let inner = LinearScaler::standard().fit(&DatasetBase::from(x.clone()))?;
        Ok(Self {
            width: x.ncols(),
            inner,
        })
    }

    /// Fits a single-column scaler, as used for regression targets.
    ///
    /// # Errors
    ///
    /// See [`Self::fit`].
    pub fn fit_column(values: &Array1<f64>) -> Result<Self, PricingError> {
        Self::fit(&values.clone().insert_axis(Axis(1)))
    }

    /// Number of columns the scaler was fitted on.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Standardizes every row of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Transform`] if the column count differs from
    /// the fitted width.
    pub fn transform(&self, x: Array2<f64>) -> Result<Array2<f64>, PricingError> {
        self.check_width(x.ncols())?;
        Ok(self.inner.transform(x))
    }

    /// Maps standardized rows back to the original units.
    ///
    /// Standardization is affine per column, so the inverse follows from
    /// the images of `0` and `1`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Transform`] if the column count differs from
    /// the fitted width.
    pub fn inverse_transform(&self, z: Array2<f64>) -> Result<Array2<f64>, PricingError> {
        self.check_width(z.ncols())?;
        let origin = self.inner.transform(Array2::zeros((1, self.width))).row(0).to_owned();
        let unit = self.inner.transform(Array2::ones((1, self.width))).row(0).to_owned();
        let slope = &unit - &origin;

        let mut x = z;
        for mut row in x.axis_iter_mut(Axis(0)) {
            row -= &origin;
            row /= &slope;
        }
        Ok(x)
    }

    fn check_width(&self, width: usize) -> Result<(), PricingError> {
        if width == self.width {
            Ok(())
        } else {
            Err(PricingError::Transform {
                message: format!("scaler expects {} columns, got {width}", self.width),
            })
        }
    }
}
