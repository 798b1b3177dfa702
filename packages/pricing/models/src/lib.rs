#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Vehicle listing records and category allow-lists.
//!
//! This crate defines the row type of the pricing dataset, the three
//! categorical columns that the search endpoints accept (model, body type,
//! fuel), and the feature payload accepted by the prediction endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Name of the target column in the pricing dataset.
pub const TARGET_COLUMN: &str = "rental_price_per_day";

/// Column order used when a listing table is serialized column-wise.
pub const LISTING_COLUMNS: [&str; 14] = [
    "model_key",
    "mileage",
    "engine_power",
    "fuel",
    "paint_color",
    "car_type",
    "private_parking_available",
    "has_gps",
    "has_air_conditioning",
    "automatic_car",
    "has_getaround_connect",
    "has_speed_regulator",
    "winter_tires",
    TARGET_COLUMN,
];

/// A categorical column that a search endpoint can filter on.
///
/// Implementors are closed allow-lists: parsing a value outside the list
/// fails with [`InvalidCategoryError`] carrying [`Self::INVALID_MESSAGE`].
pub trait ListingCategory: Sized + Copy + AsRef<str> + 'static {
    /// Dataset column holding this category.
    const COLUMN: &'static str;

    /// Message returned to clients for values outside the allow-list.
    const INVALID_MESSAGE: &'static str;

    /// Returns every allowed value.
    fn all() -> &'static [Self];

    /// Parses an exact, case-sensitive allow-list value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCategoryError`] if `value` is not in [`Self::all`].
    fn parse_allowed(value: &str) -> Result<Self, InvalidCategoryError> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_ref() == value)
            .ok_or_else(|| InvalidCategoryError {
                column: Self::COLUMN,
                value: value.to_string(),
                message: Self::INVALID_MESSAGE,
            })
    }
}

/// Error returned when a search value is outside its allow-list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvalidCategoryError {
    /// Column the value was checked against.
    pub column: &'static str,
    /// The rejected value.
    pub value: String,
    /// Client-facing message.
    pub message: &'static str,
}

/// Car manufacturer (`model_key` column).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ModelKey {
    #[serde(rename = "Citroën")]
    #[strum(serialize = "Citroën")]
    Citroen,
    Peugeot,
    #[serde(rename = "PGO")]
    #[strum(serialize = "PGO")]
    Pgo,
    Renault,
    Audi,
    #[serde(rename = "BMW")]
    #[strum(serialize = "BMW")]
    Bmw,
    Ford,
    Mercedes,
    Opel,
    Porsche,
    Volkswagen,
    #[serde(rename = "KIA Motors")]
    #[strum(serialize = "KIA Motors")]
    KiaMotors,
    #[serde(rename = "Alfa Romeo")]
    #[strum(serialize = "Alfa Romeo")]
    AlfaRomeo,
    Ferrari,
    Fiat,
    Lamborghini,
    Maserati,
    Honda,
    Mazda,
    Mitsubishi,
    Nissan,
    #[serde(rename = "SEAT")]
    #[strum(serialize = "SEAT")]
    Seat,
    Subaru,
    Toyota,
    Suzuki,
    Yamaha,
}

impl ListingCategory for ModelKey {
    const COLUMN: &'static str = "model_key";
    const INVALID_MESSAGE: &'static str = "You entered an input outside the allowed list of keys";

    fn all() -> &'static [Self] {
        &[
            Self::Citroen,
            Self::Peugeot,
            Self::Pgo,
            Self::Renault,
            Self::Audi,
            Self::Bmw,
            Self::Ford,
            Self::Mercedes,
            Self::Opel,
            Self::Porsche,
            Self::Volkswagen,
            Self::KiaMotors,
            Self::AlfaRomeo,
            Self::Ferrari,
            Self::Fiat,
            Self::Lamborghini,
            Self::Maserati,
            Self::Honda,
            Self::Mazda,
            Self::Mitsubishi,
            Self::Nissan,
            Self::Seat,
            Self::Subaru,
            Self::Toyota,
            Self::Suzuki,
            Self::Yamaha,
        ]
    }
}

/// Body type (`car_type` column).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CarType {
    Convertible,
    Coupe,
    Estate,
    Hatchback,
    Sedan,
    Subcompact,
    Suv,
    Van,
}

impl ListingCategory for CarType {
    const COLUMN: &'static str = "car_type";
    const INVALID_MESSAGE: &'static str =
        "You entered an input outside the allowed list of car types";

    fn all() -> &'static [Self] {
        &[
            Self::Convertible,
            Self::Coupe,
            Self::Estate,
            Self::Hatchback,
            Self::Sedan,
            Self::Subcompact,
            Self::Suv,
            Self::Van,
        ]
    }
}

/// Fuel type (`fuel` column).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Fuel {
    Diesel,
    Petrol,
    HybridPetrol,
    Electro,
}

impl ListingCategory for Fuel {
    // The search-by-fuel endpoint has always reused the car-type wording.
    const COLUMN: &'static str = "fuel";
    const INVALID_MESSAGE: &'static str =
        "You entered an input outside the allowed list of car types";

    fn all() -> &'static [Self] {
        &[Self::Diesel, Self::Petrol, Self::HybridPetrol, Self::Electro]
    }
}

/// One row of the pricing dataset.
///
/// Categorical columns stay as raw strings: the hosted file may contain
/// paint colors or future categories that are not part of any allow-list,
/// and filtering is an exact string comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleListing {
    pub model_key: String,
    pub mileage: f64,
    pub engine_power: f64,
    pub fuel: String,
    pub paint_color: String,
    pub car_type: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub private_parking_available: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_gps: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_air_conditioning: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub automatic_car: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_getaround_connect: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_speed_regulator: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub winter_tires: bool,
    pub rental_price_per_day: f64,
}

impl VehicleListing {
    /// Returns the string value of a categorical column, or `None` if
    /// `column` is not categorical.
    #[must_use]
    pub fn category_value(&self, column: &str) -> Option<&str> {
        match column {
            "model_key" => Some(&self.model_key),
            "fuel" => Some(&self.fuel),
            "paint_color" => Some(&self.paint_color),
            "car_type" => Some(&self.car_type),
            _ => None,
        }
    }

    /// Returns the feature part of this listing (everything but the target).
    #[must_use]
    pub fn features(&self) -> PredictionFeatures {
        PredictionFeatures {
            model_key: self.model_key.clone(),
            mileage: self.mileage,
            engine_power: self.engine_power,
            fuel: self.fuel.clone(),
            paint_color: self.paint_color.clone(),
            car_type: self.car_type.clone(),
            private_parking_available: self.private_parking_available,
            has_gps: self.has_gps,
            has_air_conditioning: self.has_air_conditioning,
            automatic_car: self.automatic_car,
            has_getaround_connect: self.has_getaround_connect,
            has_speed_regulator: self.has_speed_regulator,
            winter_tires: self.winter_tires,
        }
    }
}

/// Input of the prediction endpoint.
///
/// Categorical fields are deliberately plain strings: the preprocessor
/// encodes unseen categories as all-zero columns instead of rejecting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFeatures {
    pub model_key: String,
    pub mileage: f64,
    pub engine_power: f64,
    pub fuel: String,
    pub paint_color: String,
    pub car_type: String,
    pub private_parking_available: bool,
    pub has_gps: bool,
    pub has_air_conditioning: bool,
    pub automatic_car: bool,
    pub has_getaround_connect: bool,
    pub has_speed_regulator: bool,
    pub winter_tires: bool,
}

impl PredictionFeatures {
    /// The seven equipment flags, in dataset column order.
    #[must_use]
    pub const fn equipment_flags(&self) -> [bool; 7] {
        [
            self.private_parking_available,
            self.has_gps,
            self.has_air_conditioning,
            self.automatic_car,
            self.has_getaround_connect,
            self.has_speed_regulator,
            self.winter_tires,
        ]
    }
}

/// Accepts `true`/`false` in any letter case as well as `1`/`0`.
///
/// The hosted CSV was written by pandas and uses `True`/`False`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_sizes() {
        assert_eq!(ModelKey::all().len(), 26);
        assert_eq!(CarType::all().len(), 8);
        assert_eq!(Fuel::all().len(), 4);
    }

    #[test]
    fn parse_allowed_matches_display() {
        for key in ModelKey::all() {
            assert_eq!(ModelKey::parse_allowed(&key.to_string()).unwrap(), *key);
        }
        for car_type in CarType::all() {
            assert_eq!(CarType::parse_allowed(car_type.as_ref()).unwrap(), *car_type);
        }
        assert_eq!(Fuel::parse_allowed("hybrid_petrol").unwrap(), Fuel::HybridPetrol);
    }

    #[test]
    fn parse_allowed_is_case_sensitive() {
        let err = ModelKey::parse_allowed("porsche").unwrap_err();
        assert_eq!(
            err.to_string(),
            "You entered an input outside the allowed list of keys"
        );
        assert!(CarType::parse_allowed("SUV").is_err());
        assert!(Fuel::parse_allowed("gasoline").is_err());
    }

    #[test]
    fn invalid_category_displays_its_message() {
        let err = Fuel::parse_allowed("kerosene").unwrap_err();
        assert_eq!(err.column, "fuel");
        assert_eq!(err.value, "kerosene");
        assert_eq!(err.to_string(), err.message);
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn special_model_names_round_trip_through_serde() {
        let json = serde_json::to_string(&ModelKey::Citroen).unwrap();
        assert_eq!(json, "\"Citroën\"");
        let parsed: ModelKey = serde_json::from_str("\"KIA Motors\"").unwrap();
        assert_eq!(parsed, ModelKey::KiaMotors);
    }

    #[test]
    fn listing_columns_end_with_target() {
        assert_eq!(LISTING_COLUMNS.last(), Some(&TARGET_COLUMN));
    }
}
