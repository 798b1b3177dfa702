//! Descriptive statistics over the derived rental table.

use std::collections::BTreeMap;

use getaround_delay_models::{
    CancelationRates, CategoryCount, DelayBand, DerivedRental, Distributions, GroupRate,
    Histogram, HistogramBin, Lateness, Overview, RentalState,
};

use crate::DelayError;
use crate::derive::RentalTable;

/// Histogram bin width used when a client does not pick one, in minutes.
pub const DEFAULT_BIN_WIDTH: f64 = 10.0;

/// Smallest accepted histogram bin width, in minutes.
pub const MIN_BIN_WIDTH: f64 = 1.0;

/// Largest accepted histogram bin width, in minutes.
pub const MAX_BIN_WIDTH: f64 = 1440.0;

fn count_by<'a, I>(labels: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
        })
        .collect()
}

/// Counts behind the overview pie charts. Labels are sorted.
#[must_use]
pub fn overview(table: &RentalTable) -> Overview {
    let rentals = table.rentals();
    Overview {
        total_rentals: rentals.len(),
        state_counts: count_by(rentals.iter().map(|r| r.event.state.as_ref())),
        second_rental_counts: count_by(
            rentals
                .iter()
                .map(|r| if r.second_rental { "1" } else { "0" }),
        ),
        lateness_counts: count_by(
            rentals
                .iter()
                .filter(|r| r.is_late_for_next_checkin.is_known())
                .map(|r| r.is_late_for_next_checkin.as_ref()),
        ),
        binary_lateness_counts: count_by(
            rentals
                .iter()
                .map(|r| r.is_late_for_next_checkin.binary_label()),
        ),
    }
}

fn check_bin_width(bin_width: f64) -> Result<(), DelayError> {
    if (MIN_BIN_WIDTH..=MAX_BIN_WIDTH).contains(&bin_width) {
        Ok(())
    } else {
        Err(DelayError::OutOfRange {
            parameter: "binWidth",
            value: bin_width,
            min: MIN_BIN_WIDTH,
            max: MAX_BIN_WIDTH,
        })
    }
}

/// Bins `values` into `[start, start + width)` buckets aligned on
/// multiples of `bin_width`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn histogram(values: &[f64], bin_width: f64) -> Histogram {
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Histogram {
            bin_width,
            total: 0,
            bins: Vec::new(),
        };
    };

    let start = (min / bin_width).floor() * bin_width;
    let bin_count = ((max - start) / bin_width).floor() as usize + 1;
    let mut counts = vec![0usize; bin_count];
    for value in values {
        let index = (((value - start) / bin_width).floor() as usize).min(bin_count - 1);
        counts[index] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = (i as f64).mul_add(bin_width, start);
            HistogramBin {
                start: lower,
                end: lower + bin_width,
                count,
            }
        })
        .collect();

    Histogram {
        bin_width,
        total: values.len(),
        bins,
    }
}

/// Mean and sample standard deviation of the known checkout delays.
///
/// Returns `None` with fewer than two known delays.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn delay_band(rentals: &[DerivedRental]) -> Option<DelayBand> {
    let delays: Vec<f64> = rentals
        .iter()
        .filter_map(|r| r.event.delay_at_checkout_in_minutes)
        .collect();
    if delays.len() < 2 {
        return None;
    }

    let n = delays.len() as f64;
    let mean = delays.iter().sum::<f64>() / n;
    let variance = delays.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();

    Some(DelayBand {
        mean,
        std,
        lower: mean - std,
        upper: mean + std,
    })
}

/// Time-delta histogram and the checkout-delay histogram restricted to
/// one standard deviation around the mean.
///
/// # Errors
///
/// Returns [`DelayError::OutOfRange`] if `bin_width` is outside
/// [`MIN_BIN_WIDTH`]..=[`MAX_BIN_WIDTH`].
pub fn distributions(table: &RentalTable, bin_width: f64) -> Result<Distributions, DelayError> {
    check_bin_width(bin_width)?;
    let rentals = table.rentals();

    let time_deltas: Vec<f64> = rentals.iter().filter_map(DerivedRental::time_delta).collect();

    let band = delay_band(rentals);
    let delays_in_band: Vec<f64> = band.map_or_else(Vec::new, |band| {
        rentals
            .iter()
            .filter_map(|r| r.event.delay_at_checkout_in_minutes)
            .filter(|d| *d > band.lower && *d < band.upper)
            .collect()
    });

    Ok(Distributions {
        time_delta: histogram(&time_deltas, bin_width),
        checkout_delay: histogram(&delays_in_band, bin_width),
        delay_band: band,
    })
}

#[allow(clippy::cast_precision_loss)]
fn group_rates<'a>(groups: impl Iterator<Item = (&'a str, RentalState)>) -> Vec<GroupRate> {
    let mut by_group: BTreeMap<&str, BTreeMap<RentalState, usize>> = BTreeMap::new();
    for (group, state) in groups {
        *by_group.entry(group).or_default().entry(state).or_default() += 1;
    }

    let mut rates = Vec::new();
    for (group, states) in by_group {
        let total: usize = states.values().sum();
        let mut ordered: Vec<(RentalState, usize)> = states.into_iter().collect();
        // Most frequent state first, as in a value count.
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rates.extend(ordered.into_iter().map(|(state, count)| GroupRate {
            group: group.to_string(),
            state,
            percent: count as f64 / total as f64 * 100.0,
        }));
    }
    rates
}

/// Cancelation rates among rentals that followed another rental on the
/// same car within 12 hours.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cancelation_rates(table: &RentalTable) -> CancelationRates {
    let consecutive: Vec<&DerivedRental> = table
        .rentals()
        .iter()
        .filter(|r| r.time_delta().is_some())
        .collect();

    let canceled = consecutive
        .iter()
        .filter(|r| r.event.state == RentalState::Canceled)
        .count();
    let average_cancelation_percent = if consecutive.is_empty() {
        0.0
    } else {
        canceled as f64 / consecutive.len() as f64 * 100.0
    };

    CancelationRates {
        consecutive_rentals: consecutive.len(),
        average_cancelation_percent,
        by_checkin_type: group_rates(
            consecutive
                .iter()
                .map(|r| (r.event.checkin_type.as_ref(), r.event.state)),
        ),
        by_lateness: group_rates(
            consecutive
                .iter()
                .filter(|r| r.is_late_for_next_checkin.is_known())
                .map(|r| (r.is_late_for_next_checkin.as_ref(), r.event.state)),
        ),
    }
}

/// Number of rentals classified `not late`.
#[must_use]
pub fn not_late_count(rentals: &[DerivedRental]) -> usize {
    rentals
        .iter()
        .filter(|r| r.is_late_for_next_checkin == Lateness::NotLate)
        .count()
}
