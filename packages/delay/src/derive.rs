//! Derived per-rental features.
//!
//! Each rental is left-joined to the rental named by its
//! `previous_ended_rental_id` to pick up the previous driver's checkout
//! delay. Both sides of that join must be unique: a repeated `rental_id`
//! or two rentals claiming the same predecessor is reported instead of
//! duplicating rows.

use std::collections::{HashMap, HashSet};

use getaround_delay_models::{DerivedRental, Lateness, RentalEvent};

use crate::DelayError;

/// The rentals sheet with derived columns, in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RentalTable {
    rentals: Vec<DerivedRental>,
}

impl RentalTable {
    /// Derives `second_rental`, the previous driver's delay, the minutes
    /// past the next checkin, and the lateness class for every event.
    ///
    /// # Errors
    ///
    /// Returns [`DelayError::DuplicateJoinKey`] if a `rental_id` repeats or
    /// two events share a `previous_ended_rental_id`.
    pub fn derive(events: Vec<RentalEvent>) -> Result<Self, DelayError> {
        let mut delays = HashMap::with_capacity(events.len());
        for event in &events {
            if delays
                .insert(event.rental_id, event.delay_at_checkout_in_minutes)
                .is_some()
            {
                return Err(DelayError::DuplicateJoinKey {
                    column: "rental_id",
                    id: event.rental_id,
                });
            }
        }

        let mut predecessors = HashSet::new();
        for id in events.iter().filter_map(|e| e.previous_ended_rental_id) {
            if !predecessors.insert(id) {
                return Err(DelayError::DuplicateJoinKey {
                    column: "previous_ended_rental_id",
                    id,
                });
            }
        }

        let rentals: Vec<DerivedRental> = events
            .into_iter()
            .map(|event| {
                let time_delta = event.time_delta_with_previous_rental_in_minutes;
                let previous_delay = event
                    .previous_ended_rental_id
                    .and_then(|id| delays.get(&id).copied().flatten());
                let minutes_passed = previous_delay.zip(time_delta).map(|(p, d)| p - d);

                DerivedRental {
                    second_rental: time_delta.is_some(),
                    previous_drivers_delay_in_mins: previous_delay,
                    minutes_passed_checkin_time: minutes_passed,
                    is_late_for_next_checkin: Lateness::classify(minutes_passed),
                    event,
                }
            })
            .collect();

        log::debug!(
            "Derived features for {} rentals, {} with a known predecessor delay",
            rentals.len(),
            rentals
                .iter()
                .filter(|r| r.previous_drivers_delay_in_mins.is_some())
                .count()
        );

        Ok(Self { rentals })
    }

    /// Number of rentals.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rentals.len()
    }

    /// Whether the table has no rentals.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rentals.is_empty()
    }

    /// Rentals in sheet order.
    #[must_use]
    pub fn rentals(&self) -> &[DerivedRental] {
        &self.rentals
    }

    /// The first `limit` rentals.
    #[must_use]
    pub fn head(&self, limit: usize) -> &[DerivedRental] {
        &self.rentals[..limit.min(self.rentals.len())]
    }
}
