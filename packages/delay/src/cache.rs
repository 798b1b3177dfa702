//! Memoized sweep results.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use getaround_delay_models::{Sweep, SweepKind};

use crate::DelayError;
use crate::derive::RentalTable;
use crate::sweep;

/// Sweep results keyed by `(kind, flexibility)`.
///
/// The cache does not hold the table; callers must always pass the same
/// immutable [`RentalTable`].
#[derive(Debug, Default)]
pub struct SweepCache {
    entries: Mutex<HashMap<(SweepKind, u32), Arc<Sweep>>>,
}

impl SweepCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached sweep, computing and storing it on first use.
    ///
    /// The lock is not held while computing, so two concurrent misses for
    /// the same key may both compute; the first result stored wins.
    ///
    /// # Errors
    ///
    /// See [`sweep::run`]. Errors are not cached.
    pub fn get_or_compute(
        &self,
        table: &RentalTable,
        kind: SweepKind,
        flexibility: u32,
    ) -> Result<Arc<Sweep>, DelayError> {
        let key = (kind, flexibility);
        if let Some(hit) = self.lock().get(&key) {
            log::debug!("Sweep cache hit for {kind} at flexibility {flexibility}");
            return Ok(Arc::clone(hit));
        }

        let computed = Arc::new(sweep::run(table, kind, flexibility)?);
        log::debug!("Computed {kind} sweep at flexibility {flexibility}");

        Ok(Arc::clone(self.lock().entry(key).or_insert(computed)))
    }

    /// Number of cached sweeps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(SweepKind, u32), Arc<Sweep>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use getaround_delay_models::{CheckinType, RentalState};

    use super::*;
    use crate::derive::tests::event;

    fn table() -> RentalTable {
        RentalTable::derive(vec![
            event(1, CheckinType::Connect, RentalState::Ended, Some(45.0), None, None),
            event(
                2,
                CheckinType::Connect,
                RentalState::Ended,
                None,
                Some(1),
                Some(15.0),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn second_lookup_reuses_result() {
        let cache = SweepCache::new();
        let table = table();

        let first = cache
            .get_or_compute(&table, SweepKind::Affected, 10)
            .unwrap();
        let second = cache
            .get_or_compute(&table, SweepKind::Affected, 10)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache
            .get_or_compute(&table, SweepKind::Affected, 20)
            .unwrap();
        cache.get_or_compute(&table, SweepKind::Solved, 0).unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = SweepCache::new();
        assert!(
            cache
                .get_or_compute(&table(), SweepKind::Successful, 9000)
                .is_err()
        );
        assert!(cache.is_empty());
    }
}
