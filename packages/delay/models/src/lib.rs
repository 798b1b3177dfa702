#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rental event records and delay-analysis result types.
//!
//! A [`RentalEvent`] is one row of the `rentals_data` sheet. Loading
//! derives a [`DerivedRental`] per event by joining each rental to the one
//! that ended before it on the same car. The remaining types are the
//! serialized outputs of the statistics and threshold sweeps.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How the driver checked in.
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
pub enum CheckinType {
    /// Rental agreement signed on the owner's smartphone.
    Mobile,
    /// Car unlocked through Getaround Connect, no owner present.
    Connect,
}

impl CheckinType {
    /// Returns every checkin type.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Mobile, Self::Connect]
    }
}

/// Final state of a rental.
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
pub enum RentalState {
    Ended,
    Canceled,
}

impl RentalState {
    /// Returns every rental state.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Ended, Self::Canceled]
    }
}

/// Whether the previous driver returned the car after the next checkin.
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
pub enum Lateness {
    #[serde(rename = "late")]
    #[strum(serialize = "late")]
    Late,
    #[serde(rename = "not late")]
    #[strum(serialize = "not late")]
    NotLate,
    /// No previous rental, a missing delay, or a return exactly on time.
    #[serde(rename = "unknown")]
    #[strum(serialize = "unknown")]
    Unknown,
}

impl Lateness {
    /// Label of the combined "not late" and "unknown" bucket.
    pub const NOT_LATE_OR_NO_INFO: &'static str = "not late or no info";

    /// Classifies `previous delay - time delta`, in minutes.
    ///
    /// Positive is late, negative is not late, zero or absent is unknown.
    #[must_use]
    pub const fn classify(minutes_passed_checkin_time: Option<f64>) -> Self {
        match minutes_passed_checkin_time {
            Some(m) if m > 0.0 => Self::Late,
            Some(m) if m < 0.0 => Self::NotLate,
            _ => Self::Unknown,
        }
    }

    /// Whether the classification is `late` or `not late`.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Two-way label: `late` or `not late or no info`.
    #[must_use]
    pub const fn binary_label(self) -> &'static str {
        match self {
            Self::Late => "late",
            Self::NotLate | Self::Unknown => Self::NOT_LATE_OR_NO_INFO,
        }
    }
}

/// One row of the `rentals_data` sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalEvent {
    pub rental_id: i64,
    pub car_id: i64,
    pub checkin_type: CheckinType,
    pub state: RentalState,
    /// Negative when the car was returned early.
    pub delay_at_checkout_in_minutes: Option<f64>,
    /// Rental that ended just before this one on the same car, if it ended
    /// less than 12 hours earlier.
    pub previous_ended_rental_id: Option<i64>,
    /// Planned gap between the previous rental's checkout and this
    /// rental's checkin.
    pub time_delta_with_previous_rental_in_minutes: Option<f64>,
}

/// A rental event plus the features derived from its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRental {
    #[serde(flatten)]
    pub event: RentalEvent,
    /// A second rental was booked within 12 hours of the previous one.
    pub second_rental: bool,
    /// Checkout delay of the previous rental on the same car.
    pub previous_drivers_delay_in_mins: Option<f64>,
    /// Previous delay minus the planned time delta.
    pub minutes_passed_checkin_time: Option<f64>,
    pub is_late_for_next_checkin: Lateness,
}

impl DerivedRental {
    /// Shorthand for the event's time delta.
    #[must_use]
    pub const fn time_delta(&self) -> Option<f64> {
        self.event.time_delta_with_previous_rental_in_minutes
    }
}

/// One row of the `Documentation` sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationEntry {
    pub field: String,
    pub comment: String,
}

/// Row count for one category label, as shown in a pie chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Counts behind the overview pie charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Total number of rentals.
    pub total_rentals: usize,
    /// Rentals per final state.
    pub state_counts: Vec<CategoryCount>,
    /// Rentals without (`0`) and with (`1`) a previous rental within 12h.
    pub second_rental_counts: Vec<CategoryCount>,
    /// `late` / `not late`, rows with an unknown classification excluded.
    pub lateness_counts: Vec<CategoryCount>,
    /// `late` / `not late or no info` over every rental.
    pub binary_lateness_counts: Vec<CategoryCount>,
}

/// A half-open histogram bin `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Fixed-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bin_width: f64,
    /// Number of values binned.
    pub total: usize,
    pub bins: Vec<HistogramBin>,
}

/// Open interval `(mean - std, mean + std)` of the checkout delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayBand {
    pub mean: f64,
    pub std: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Histograms behind the "time intervals and delays" charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distributions {
    /// Time deltas of every rental that has one.
    pub time_delta: Histogram,
    /// Checkout delays strictly inside [`Self::delay_band`].
    pub checkout_delay: Histogram,
    /// `None` when fewer than two delays are known.
    pub delay_band: Option<DelayBand>,
}

/// Share of one state inside one group, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRate {
    pub group: String,
    pub state: RentalState,
    pub percent: f64,
}

/// Cancelation rates among rentals that had a previous rental within 12h.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelationRates {
    /// Number of rentals considered.
    pub consecutive_rentals: usize,
    /// Percentage of canceled rentals; `0.0` when there are none.
    pub average_cancelation_percent: f64,
    pub by_checkin_type: Vec<GroupRate>,
    /// Known lateness only.
    pub by_lateness: Vec<GroupRate>,
}

/// Which threshold simulation to run.
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
pub enum SweepKind {
    /// Late returns that a threshold would have absorbed.
    Solved,
    /// Rentals a threshold would have blocked.
    Affected,
    /// Second rentals that would still have gone well.
    Successful,
}

impl SweepKind {
    /// Flexibility used when a client does not pick one.
    pub const DEFAULT_FLEXIBILITY: u32 = 10;

    /// Returns every sweep kind.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Solved, Self::Affected, Self::Successful]
    }

    /// Largest threshold evaluated, in minutes. Thresholds start at zero.
    #[must_use]
    pub const fn max_threshold(self) -> u32 {
        match self {
            Self::Solved => 500,
            Self::Affected | Self::Successful => 800,
        }
    }

    /// Largest accepted flexibility, in minutes. The solved sweep ignores
    /// flexibility, so only `0` is accepted for it.
    #[must_use]
    pub const fn max_flexibility(self) -> u32 {
        match self {
            Self::Solved => 0,
            Self::Affected => 800,
            Self::Successful => 720,
        }
    }
}

/// Result of one threshold sweep. Series values are indexed by threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sweep {
    pub kind: SweepKind,
    pub flexibility: u32,
    /// Thresholds in minutes, `0..=kind.max_threshold()`.
    pub thresholds: Vec<u32>,
    pub all_cars: Vec<usize>,
    pub connect_cars: Vec<usize>,
    pub mobile_cars: Vec<usize>,
    /// Current number of unproblematic second rentals, for the successful
    /// sweep only.
    pub baseline: Option<usize>,
}
