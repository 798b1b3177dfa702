//! Feature encoding for the price regressor.
//!
//! Output layout of [`Preprocessor::transform`]:
//!
//! 1. `mileage`, `engine_power`, standardized;
//! 2. one-hot blocks for `model_key`, `fuel`, `paint_color`, `car_type`,
//!    each over the categories seen at fit time in sorted order;
//! 3. the seven equipment flags as `0.0`/`1.0`.
//!
//! A category never seen at fit time encodes as an all-zero block.

use getaround_pricing_models::PredictionFeatures;
use ndarray::{Array1, Array2, ArrayViewMut1, Axis, s};
use serde::{Deserialize, Serialize};

use crate::PricingError;
use crate::scaler::StandardScaler;

/// One-hot encoder for a single categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotColumn {
    /// Column name.
    pub column: String,
    /// Known categories, sorted.
    pub categories: Vec<String>,
}

impl OneHotColumn {
    fn fit<'a>(column: &str, values: impl Iterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = values.map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        Self {
            column: column.to_string(),
            categories,
        }
    }

    /// Sets the slot of `value` in `block`, which must already be zeroed.
    fn encode_into(&self, value: &str, mut block: ArrayViewMut1<'_, f64>) {
        if let Ok(i) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            block[i] = 1.0;
        }
    }
}

/// Fitted feature encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: StandardScaler,
    categorical: Vec<OneHotColumn>,
}

const NUMERIC_COLUMNS: usize = 2;
const EQUIPMENT_FLAGS: usize = 7;

fn category<'a>(features: &'a PredictionFeatures, column: &str) -> &'a str {
    match column {
        "model_key" => &features.model_key,
        "fuel" => &features.fuel,
        "paint_color" => &features.paint_color,
        "car_type" => &features.car_type,
        _ => "",
    }
}

fn numeric_matrix(rows: &[PredictionFeatures]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), NUMERIC_COLUMNS), |(i, j)| {
        if j == 0 {
            rows[i].mileage
        } else {
            rows[i].engine_power
        }
    })
}

impl Preprocessor {
    /// Categorical columns, in output order.
    pub const CATEGORICAL_COLUMNS: [&'static str; 4] =
        ["model_key", "fuel", "paint_color", "car_type"];

    /// Fits the numeric scaler and the one-hot vocabularies.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Fit`] if `rows` is empty or a numeric value
    /// is not finite.
    pub fn fit(rows: &[PredictionFeatures]) -> Result<Self, PricingError> {
        let numeric = StandardScaler::fit(&numeric_matrix(rows))?;

        let categorical = Self::CATEGORICAL_COLUMNS
            .iter()
            .map(|column| OneHotColumn::fit(column, rows.iter().map(|r| category(r, column))))
            .collect();

        Ok(Self {
            numeric,
            categorical,
        })
    }

    /// Width of every transformed row.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.numeric.width()
            + self
                .categorical
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
            + EQUIPMENT_FLAGS
    }

    /// Encoders for the categorical columns.
    #[must_use]
    pub fn categorical(&self) -> &[OneHotColumn] {
        &self.categorical
    }

    /// Encodes one payload.
    ///
    /// # Errors
    ///
    /// See [`Self::transform_all`].
    pub fn transform(&self, features: &PredictionFeatures) -> Result<Array1<f64>, PricingError> {
        let encoded = self.transform_all(std::slice::from_ref(features))?;
        Ok(encoded.row(0).to_owned())
    }

    /// Encodes many payloads, one output row each.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Transform`] if a numeric field is not finite
    /// or the stored scaler does not have two columns.
    pub fn transform_all(
        &self,
        rows: &[PredictionFeatures],
    ) -> Result<Array2<f64>, PricingError> {
        if rows
            .iter()
            .any(|r| !r.mileage.is_finite() || !r.engine_power.is_finite())
        {
            return Err(PricingError::Transform {
                message: "mileage and engine_power must be finite numbers".to_string(),
            });
        }

        let mut out = Array2::zeros((rows.len(), self.n_features()));
        let numeric = self.numeric.transform(numeric_matrix(rows))?;
        out.slice_mut(s![.., ..NUMERIC_COLUMNS]).assign(&numeric);

        let mut offset = NUMERIC_COLUMNS;
        for encoder in &self.categorical {
            let width = encoder.categories.len();
            for (features, mut row) in rows.iter().zip(out.axis_iter_mut(Axis(0))) {
                encoder.encode_into(
                    category(features, &encoder.column),
                    row.slice_mut(s![offset..offset + width]),
                );
            }
            offset += width;
        }

        for (features, mut row) in rows.iter().zip(out.axis_iter_mut(Axis(0))) {
            for (slot, flag) in row
                .slice_mut(s![offset..])
                .iter_mut()
                .zip(features.equipment_flags())
            {
                *slot = if flag { 1.0 } else { 0.0 };
            }
        }
        Ok(out)
    }
}
