//! Threshold simulations.
//!
//! A threshold `t` hides a car from search until `t` minutes after its
//! planned checkout. For every integer threshold in a sweep's range these
//! functions count, per checkin-type scope, how the historical rentals
//! would have fared. A customer flexibility `f` means a rental is only
//! blocked when `time_delta + f < t`.

use getaround_delay_models::{CheckinType, DerivedRental, Lateness, Sweep, SweepKind};

use crate::DelayError;
use crate::derive::RentalTable;
use crate::stats::not_late_count;

struct Series {
    all: Vec<usize>,
    connect: Vec<usize>,
    mobile: Vec<usize>,
}

impl Series {
    const fn new() -> Self {
        Self {
            all: Vec::new(),
            connect: Vec::new(),
            mobile: Vec::new(),
        }
    }

    fn push(&mut self, all: usize, connect: usize, mobile: usize) {
        self.all.push(all);
        self.connect.push(connect);
        self.mobile.push(mobile);
    }

    fn into_sweep(self, kind: SweepKind, flexibility: u32, baseline: Option<usize>) -> Sweep {
        Sweep {
            kind,
            flexibility,
            thresholds: (0..=kind.max_threshold()).collect(),
            all_cars: self.all,
            connect_cars: self.connect,
            mobile_cars: self.mobile,
            baseline,
        }
    }
}

/// Counts `rows` matching `predicate`, overall and per checkin type.
fn scoped_counts<'a>(
    rows: impl Iterator<Item = &'a DerivedRental>,
    mut predicate: impl FnMut(&DerivedRental) -> bool,
) -> (usize, usize, usize) {
    let mut connect = 0;
    let mut mobile = 0;
    for row in rows.filter(|r| predicate(r)) {
        match row.event.checkin_type {
            CheckinType::Connect => connect += 1,
            CheckinType::Mobile => mobile += 1,
        }
    }
    (connect + mobile, connect, mobile)
}

fn check_flexibility(kind: SweepKind, flexibility: u32) -> Result<(), DelayError> {
    if flexibility <= kind.max_flexibility() {
        Ok(())
    } else {
        Err(DelayError::OutOfRange {
            parameter: "flexibility",
            value: f64::from(flexibility),
            min: 0.0,
            max: f64::from(kind.max_flexibility()),
        })
    }
}

fn thresholds(kind: SweepKind) -> impl Iterator<Item = f64> {
    (0..=kind.max_threshold()).map(f64::from)
}

/// Late returns whose delay stays under each threshold, for thresholds
/// `0..=500`.
#[must_use]
pub fn solved(table: &RentalTable) -> Sweep {
    let kind = SweepKind::Solved;
    let late: Vec<(&DerivedRental, f64)> = table
        .rentals()
        .iter()
        .filter(|r| r.is_late_for_next_checkin == Lateness::Late)
        .filter_map(|r| r.previous_drivers_delay_in_mins.map(|d| (r, d)))
        .collect();

    let mut series = Series::new();
    for t in thresholds(kind) {
        let (all, connect, mobile) = scoped_counts(
            late.iter().filter(|(_, delay)| *delay < t).map(|(r, _)| *r),
            |_| true,
        );
        series.push(all, connect, mobile);
    }
    series.into_sweep(kind, 0, None)
}

/// Rentals blocked at each threshold, for thresholds `0..=800`.
///
/// Rentals without a time delta are never blocked.
///
/// # Errors
///
/// Returns [`DelayError::OutOfRange`] if `flexibility` exceeds 800.
pub fn affected(table: &RentalTable, flexibility: u32) -> Result<Sweep, DelayError> {
    let kind = SweepKind::Affected;
    check_flexibility(kind, flexibility)?;
    let flex = f64::from(flexibility);

    let with_delta: Vec<(&DerivedRental, f64)> = table
        .rentals()
        .iter()
        .filter_map(|r| r.time_delta().map(|d| (r, d)))
        .collect();

    let mut series = Series::new();
    for t in thresholds(kind) {
        let (all, connect, mobile) = scoped_counts(
            with_delta
                .iter()
                .filter(|(_, delta)| delta + flex < t)
                .map(|(r, _)| *r),
            |_| true,
        );
        series.push(all, connect, mobile);
    }
    Ok(series.into_sweep(kind, flexibility, None))
}

/// Second rentals that would still have gone well at each threshold, for
/// thresholds `0..=800`.
///
/// Only rentals with a known lateness class are counted. A rental counts
/// when it is still allowed (`time_delta + flexibility >= t`) and the
/// previous driver's delay is below either the threshold or the planned
/// time delta. The connect series applies the threshold to connect cars
/// only, so it adds the mobile cars' current "not late" count, and the
/// mobile series does the converse. The baseline is the current number of
/// "not late" rentals.
///
/// # Errors
///
/// Returns [`DelayError::OutOfRange`] if `flexibility` exceeds 720.
pub fn successful(table: &RentalTable, flexibility: u32) -> Result<Sweep, DelayError> {
    let kind = SweepKind::Successful;
    check_flexibility(kind, flexibility)?;
    let flex = f64::from(flexibility);

    let known: Vec<(&DerivedRental, f64, f64)> = table
        .rentals()
        .iter()
        .filter(|r| r.is_late_for_next_checkin.is_known())
        .filter_map(|r| {
            r.previous_drivers_delay_in_mins
                .zip(r.time_delta())
                .map(|(delay, delta)| (r, delay, delta))
        })
        .collect();

    let (_, not_late_connect, not_late_mobile) = scoped_counts(
        known.iter().map(|(r, _, _)| *r),
        |r| r.is_late_for_next_checkin == Lateness::NotLate,
    );

    let mut series = Series::new();
    for t in thresholds(kind) {
        let (all, connect, mobile) = scoped_counts(
            known
                .iter()
                .filter(|(_, delay, delta)| delta + flex >= t && (*delay < t || delay < delta))
                .map(|(r, _, _)| *r),
            |_| true,
        );
        series.push(all, connect + not_late_mobile, mobile + not_late_connect);
    }

    let baseline = not_late_count(table.rentals());
    Ok(series.into_sweep(kind, flexibility, Some(baseline)))
}

/// Runs the sweep of `kind`.
///
/// # Errors
///
/// Returns [`DelayError::OutOfRange`] if `flexibility` exceeds the kind's
/// [`SweepKind::max_flexibility`].
pub fn run(table: &RentalTable, kind: SweepKind, flexibility: u32) -> Result<Sweep, DelayError> {
    match kind {
        SweepKind::Solved => {
            check_flexibility(kind, flexibility)?;
            Ok(solved(table))
        }
        SweepKind::Affected => affected(table, flexibility),
        SweepKind::Successful => successful(table, flexibility),
    }
}

#[cfg(test)]
mod tests {
    use getaround_delay_models::RentalState;

    use super::*;
    use crate::derive::tests::event;

    /// Three predecessor/successor pairs:
    /// - connect, previous delay 90 over a 60 minute gap: late;
    /// - mobile, previous delay 200 over a 30 minute gap: late;
    /// - mobile, previous delay 10 over a 120 minute gap: not late.
    /// Plus one rental without a predecessor.
    fn table() -> RentalTable {
        use CheckinType::{Connect, Mobile};
        use RentalState::{Canceled, Ended};

        RentalTable::derive(vec![
            event(1, Connect, Ended, Some(90.0), None, None),
            event(2, Connect, Canceled, None, Some(1), Some(60.0)),
            event(3, Mobile, Ended, Some(200.0), None, None),
            event(4, Mobile, Canceled, None, Some(3), Some(30.0)),
            event(5, Mobile, Ended, Some(10.0), None, None),
            event(6, Mobile, Ended, Some(5.0), Some(5), Some(120.0)),
            event(7, Connect, Ended, Some(-3.0), None, None),
        ])
        .unwrap()
    }

    #[test]
    fn solved_counts_late_returns_under_threshold() {
        let sweep = solved(&table());
        assert_eq!(sweep.thresholds.len(), 501);
        assert_eq!(sweep.all_cars.len(), 501);
        assert_eq!(sweep.all_cars[0], 0);
        assert_eq!(sweep.all_cars[90], 0);
        assert_eq!(sweep.all_cars[91], 1);
        assert_eq!(sweep.connect_cars[91], 1);
        assert_eq!(sweep.mobile_cars[91], 0);
        assert_eq!(sweep.all_cars[201], 2);
        assert_eq!(sweep.mobile_cars[500], 1);
        assert_eq!(sweep.baseline, None);
    }

    #[test]
    fn solved_is_non_decreasing() {
        let sweep = solved(&table());
        for series in [&sweep.all_cars, &sweep.connect_cars, &sweep.mobile_cars] {
            assert!(series.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn affected_counts_blocked_rentals() {
        let sweep = affected(&table(), 0).unwrap();
        assert_eq!(sweep.thresholds.len(), 801);
        assert_eq!(sweep.all_cars[30], 0);
        assert_eq!(sweep.all_cars[31], 1);
        assert_eq!(sweep.mobile_cars[31], 1);
        assert_eq!(sweep.all_cars[61], 2);
        assert_eq!(sweep.connect_cars[61], 1);
        assert_eq!(sweep.all_cars[800], 3);
        for series in [&sweep.all_cars, &sweep.connect_cars, &sweep.mobile_cars] {
            assert!(series.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn flexibility_shifts_affected_curve() {
        let strict = affected(&table(), 0).unwrap();
        let flexible = affected(&table(), 10).unwrap();
        for t in 0..=790 {
            assert_eq!(flexible.all_cars[t + 10], strict.all_cars[t]);
        }
        assert_eq!(flexible.flexibility, 10);
    }

    #[test]
    fn successful_at_zero_threshold_matches_current_outcome() {
        let sweep = successful(&table(), 10).unwrap();
        // At t = 0 every known rental is still allowed; only the not-late
        // one had a delay under its time delta.
        assert_eq!(sweep.baseline, Some(1));
        assert_eq!(sweep.all_cars[0], 1);
        // Connect scope: no connect rental passes, plus the mobile not-late.
        assert_eq!(sweep.connect_cars[0], 1);
        assert_eq!(sweep.mobile_cars[0], 1);
    }

    #[test]
    fn successful_counts_solved_and_blocked_rentals() {
        let sweep = successful(&table(), 0).unwrap();
        // t = 61: connect pair (delay 90, gap 60) is now blocked; mobile late
        // pair (gap 30) is blocked too; the not-late pair (gap 120) remains.
        assert_eq!(sweep.all_cars[61], 1);
        // t = 100: connect pair is blocked, so its solved delay does not count.
        assert_eq!(sweep.connect_cars[100], 1);
        // t = 121: everything is blocked.
        assert_eq!(sweep.all_cars[121], 0);
        assert_eq!(sweep.mobile_cars[121], 0);
    }

    #[test]
    fn flexibility_is_validated() {
        assert!(matches!(
            successful(&table(), 721),
            Err(DelayError::OutOfRange { .. })
        ));
        assert!(affected(&table(), 800).is_ok());
        assert!(affected(&table(), 801).is_err());
        assert!(run(&table(), SweepKind::Solved, 5).is_err());
        assert!(run(&table(), SweepKind::Solved, 0).is_ok());
    }
}
