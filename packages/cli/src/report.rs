//! Plain-text summary of the delay analysis.

use std::fmt::Write as _;

use dialoguer::Input;
use getaround_delay::DelayDataset;
use getaround_delay::stats;
use getaround_delay_models::{CategoryCount, Sweep, SweepKind};
use getaround_source::DataLocation;

/// Thresholds, in minutes, shown for each sweep.
const REPORTED_THRESHOLDS: [usize; 5] = [0, 30, 60, 120, 240];

/// Loads the workbook at `location` and prints the report.
pub async fn run(location: &DataLocation, flexibility: u32) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Loading rental events from {location}");
    let dataset = DelayDataset::fetch(location).await?;
    let report = tokio::task::spawn_blocking(move || render(&dataset, flexibility)).await??;
    print!("{report}");
    Ok(())
}

/// Prompts for the workbook location and flexibility, then prints the
/// report.
pub async fn interactive() -> Result<(), Box<dyn std::error::Error>> {
    let data: String = Input::new()
        .with_prompt("Delay workbook URL or path")
        .default(getaround_dashboard::DELAY_DATA_URL.to_string())
        .interact_text()?;

    let flexibility: u32 = Input::new()
        .with_prompt("Flexibility (minutes)")
        .default(SweepKind::DEFAULT_FLEXIBILITY)
        .interact_text()?;

    run(&DataLocation::parse(&data), flexibility).await
}

fn counts(out: &mut String, title: &str, counts: &[CategoryCount]) {
    let _ = writeln!(out, "{title}:");
    for c in counts {
        let _ = writeln!(out, "  {:<22} {}", c.label, c.count);
    }
}

fn sweep(out: &mut String, sweep: &Sweep) {
    let _ = writeln!(
        out,
        "{} sweep (flexibility {} min):",
        sweep.kind, sweep.flexibility
    );
    let _ = writeln!(out, "  {:>9} {:>8} {:>8} {:>8}", "threshold", "all", "connect", "mobile");
    for i in REPORTED_THRESHOLDS {
        if i >= sweep.thresholds.len() {
            break;
        }
        let _ = writeln!(
            out,
            "  {:>9} {:>8} {:>8} {:>8}",
            sweep.thresholds[i], sweep.all_cars[i], sweep.connect_cars[i], sweep.mobile_cars[i]
        );
    }
    if let Some(baseline) = sweep.baseline {
        let _ = writeln!(out, "  current unproblematic second rentals: {baseline}");
    }
}

/// Renders the overview counts, cancelation rates, and the three sweeps.
///
/// # Errors
///
/// Returns [`getaround_delay::DelayError::OutOfRange`] if `flexibility` is
/// too large for the affected or successful sweep.
pub fn render(
    dataset: &DelayDataset,
    flexibility: u32,
) -> Result<String, getaround_delay::DelayError> {
    let table = &dataset.table;
    let overview = stats::overview(table);
    let rates = stats::cancelation_rates(table);

    let mut out = String::new();
    let _ = writeln!(out, "Rentals: {}", overview.total_rentals);
    counts(&mut out, "By state", &overview.state_counts);
    counts(&mut out, "Previous rental within 12h", &overview.second_rental_counts);
    counts(&mut out, "Late for next checkin", &overview.lateness_counts);

    let _ = writeln!(
        out,
        "Consecutive rentals: {} ({:.2}% canceled)",
        rates.consecutive_rentals, rates.average_cancelation_percent
    );
    for rate in &rates.by_checkin_type {
        let _ = writeln!(out, "  {:<10} {:<9} {:>6.2}%", rate.group, rate.state, rate.percent);
    }

    sweep(&mut out, &getaround_delay::sweep::solved(table));
    sweep(&mut out, &getaround_delay::sweep::affected(table, flexibility)?);
    sweep(&mut out, &getaround_delay::sweep::successful(table, flexibility)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use getaround_delay::DelayError;
    use getaround_delay::derive::RentalTable;
    use getaround_delay_models::{CheckinType, RentalEvent, RentalState};

    use super::*;

    fn dataset() -> DelayDataset {
        let event = |rental_id, delay, previous, delta| RentalEvent {
            rental_id,
            car_id: 1,
            checkin_type: CheckinType::Connect,
            state: RentalState::Ended,
            delay_at_checkout_in_minutes: delay,
            previous_ended_rental_id: previous,
            time_delta_with_previous_rental_in_minutes: delta,
        };
        DelayDataset {
            table: RentalTable::derive(vec![
                event(1, Some(90.0), None, None),
                event(2, Some(0.0), Some(1), Some(60.0)),
            ])
            .unwrap(),
            documentation: Vec::new(),
        }
    }

    #[test]
    fn report_lists_counts_and_sweeps() {
        let report = render(&dataset(), 10).unwrap();
        assert!(report.starts_with("Rentals: 2\n"));
        assert!(report.contains("Consecutive rentals: 1 (0.00% canceled)"));
        assert!(report.contains("solved sweep (flexibility 0 min):"));
        assert!(report.contains("affected sweep (flexibility 10 min):"));
        assert!(report.contains("successful sweep (flexibility 10 min):"));
    }

    #[test]
    fn oversized_flexibility_is_rejected() {
        assert!(matches!(
            render(&dataset(), 10_000),
            Err(DelayError::OutOfRange { .. })
        ));
    }
}
