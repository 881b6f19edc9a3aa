//! Undo log for allocations and cancellations.
//!
//! Every committed allocation and every cancellation of a request that held a
//! slot pushes one [`RollbackEntry`]. Entries are undone strictly last in,
//! first out. Because of that ordering, a slot named by an entry can only be
//! held by the entry's own request at the time the entry is undone: any later
//! holder was allocated after the entry was recorded and has already been
//! rolled back.

use serde::Serialize;

use crate::domain::facility::layout::{ParkingLayout, SlotRef};
use crate::domain::request::{ParkingRequest, RequestState};
use crate::domain::request_store::{RequestId, RequestStore};
use crate::domain::utils::analytics::ANALYTICS_TARGET;
use crate::error::{Error, Result};

/// One reversible state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RollbackEntry {
    #[serde(skip)]
    pub request: RequestId,
    pub slot: Option<SlotRef>,

    /// State the request held before the recorded operation.
    /// `Requested` marks an allocation, `Allocated` a cancellation.
    pub previous_state: RequestState,
}

#[derive(Debug, Default)]
pub struct RollbackManager {
    entries: Vec<RollbackEntry>,
}

impl RollbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Recording ---

    pub fn record_allocation(&mut self, request: RequestId, slot: SlotRef) {
        self.entries.push(RollbackEntry { request, slot: Some(slot), previous_state: RequestState::Requested });
    }

    /// Records the cancellation of `request`, capturing the slot it held.
    pub fn record_cancellation(&mut self, request_id: RequestId, request: &ParkingRequest) {
        self.entries.push(RollbackEntry { request: request_id, slot: request.get_allocated_slot(), previous_state: RequestState::Allocated });
    }

    // --- Rollback ---

    /// Undoes the most recent entry.
    ///
    /// The entry's slot is freed first, unconditionally. Then an allocation is
    /// undone by cancelling the request, and a cancellation is undone by putting
    /// the request back on its slot. A request transition that no longer
    /// applies (e.g. the vehicle was released since) is logged and skipped; the
    /// entry is consumed either way.
    pub fn rollback_last(&mut self, requests: &mut RequestStore, layout: &mut ParkingLayout) -> Result<()> {
        let entry = self.entries.pop().ok_or(Error::RollbackUnderflow { requested: 1, available: 0 })?;

        if let Some(slot) = entry.slot.and_then(|slot_ref| layout.slot_mut(slot_ref)) {
            slot.mark_free();
        }

        let Some(request) = requests.get_mut(entry.request) else {
            log::warn!("Rollback entry refers to a request that no longer exists; only the slot was freed.");
            return Ok(());
        };

        let outcome = match entry.previous_state {
            RequestState::Requested => request.cancel(layout),
            RequestState::Allocated => request.restore_allocation(layout),
            other => {
                log::error!("Rollback entry with unexpected previous state {} --> Signals an error in the implementation.", other);
                Ok(())
            }
        };

        match outcome {
            Ok(()) => tracing::info!(
                target: ANALYTICS_TARGET,
                request = request.get_request_id(),
                vehicle = %request.get_vehicle_number(),
                undone = %entry.previous_state,
                state = %request.get_state(),
                "rollback applied"
            ),
            Err(e) => log::warn!("Rollback of request {} left its state unchanged: {}", request.get_request_id(), e),
        }

        Ok(())
    }

    /// Undoes exactly `k` entries, or nothing at all.
    ///
    /// Fails without touching the log when `k <= 0` or fewer than `k` entries exist.
    pub fn rollback_k(&mut self, k: i64, requests: &mut RequestStore, layout: &mut ParkingLayout) -> Result<()> {
        if k <= 0 {
            return Err(Error::InvalidRollbackCount(k));
        }
        let requested = usize::try_from(k).unwrap_or(usize::MAX);
        if self.entries.len() < requested {
            return Err(Error::RollbackUnderflow { requested, available: self.entries.len() });
        }

        for _ in 0..requested {
            self.rollback_last(requests, layout)?;
        }
        Ok(())
    }

    // --- Utility ---

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> &[RollbackEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::FacilityConfig;
    use crate::domain::utils::id::VehicleNumber;
    use crate::domain::vehicle::{Vehicle, VehicleType};
    use tracing_test::traced_test;

    struct Fixture {
        layout: ParkingLayout,
        requests: RequestStore,
        rollback: RollbackManager,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture { layout: ParkingLayout::from_config(&FacilityConfig::with_shape(2, 1, 2).unwrap()), requests: RequestStore::new(), rollback: RollbackManager::new() }
        }

        /// Adds a request and allocates it onto `slot_ref`, recording the allocation.
        fn allocated(&mut self, number: &str, slot_ref: SlotRef) -> RequestId {
            let id = self.requests.len() as u32 + 1;
            let vehicle = Vehicle::new(VehicleNumber::new(number), VehicleType::Car, 1);
            let key = self.requests.add(ParkingRequest::new(id, vehicle, 1, 0));
            self.requests.get_mut(key).unwrap().allocate_slot(&mut self.layout, slot_ref).unwrap();
            self.rollback.record_allocation(key, slot_ref);
            key
        }

        fn state(&self, key: RequestId) -> RequestState {
            self.requests.get(key).unwrap().get_state()
        }

        fn is_free(&self, slot_ref: SlotRef) -> bool {
            self.layout.slot(slot_ref).unwrap().is_available()
        }
    }

    #[test]
    fn test_undo_allocation_cancels_request_and_frees_slot() {
        let mut fx = Fixture::new();
        let slot = SlotRef::new(0, 0, 0);
        let key = fx.allocated("A", slot);

        fx.rollback.rollback_last(&mut fx.requests, &mut fx.layout).unwrap();

        assert!(fx.is_free(slot));
        assert_eq!(fx.state(key), RequestState::Cancelled);
        assert!(fx.rollback.is_empty());
    }

    #[test]
    fn test_undo_cancellation_restores_allocation() {
        let mut fx = Fixture::new();
        let slot = SlotRef::new(1, 0, 1);
        let key = fx.allocated("A", slot);

        let request = fx.requests.get_mut(key).unwrap();
        request.cancel(&mut fx.layout).unwrap();
        fx.rollback.record_cancellation(key, fx.requests.get(key).unwrap());
        assert!(fx.is_free(slot));

        fx.rollback.rollback_last(&mut fx.requests, &mut fx.layout).unwrap();

        assert_eq!(fx.state(key), RequestState::Allocated);
        assert!(!fx.is_free(slot));
        assert_eq!(fx.rollback.len(), 1);
    }

    #[test]
    #[traced_test]
    fn test_undo_emits_analytics_event() {
        let mut fx = Fixture::new();
        fx.allocated("LEA-7", SlotRef::new(0, 0, 1));

        fx.rollback.rollback_last(&mut fx.requests, &mut fx.layout).unwrap();

        assert!(logs_contain("rollback applied"));
        assert!(logs_contain("state=CANCELLED"));
    }

    #[test]
    fn test_rollback_last_on_empty_log_fails() {
        let mut fx = Fixture::new();
        let result = fx.rollback.rollback_last(&mut fx.requests, &mut fx.layout);

        assert!(matches!(result, Err(Error::RollbackUnderflow { requested: 1, available: 0 })));
    }

    #[test]
    fn test_rollback_k_is_all_or_nothing() {
        let mut fx = Fixture::new();
        let slot = SlotRef::new(0, 0, 0);
        let key = fx.allocated("A", slot);

        let result = fx.rollback.rollback_k(2, &mut fx.requests, &mut fx.layout);

        assert!(matches!(result, Err(Error::RollbackUnderflow { requested: 2, available: 1 })));
        assert_eq!(fx.rollback.len(), 1);
        assert_eq!(fx.state(key), RequestState::Allocated);
        assert!(!fx.is_free(slot));
    }

    #[test]
    fn test_rollback_k_rejects_non_positive_counts() {
        let mut fx = Fixture::new();
        fx.allocated("A", SlotRef::new(0, 0, 0));

        assert!(matches!(fx.rollback.rollback_k(0, &mut fx.requests, &mut fx.layout), Err(Error::InvalidRollbackCount(0))));
        assert!(matches!(fx.rollback.rollback_k(-3, &mut fx.requests, &mut fx.layout), Err(Error::InvalidRollbackCount(-3))));
        assert_eq!(fx.rollback.len(), 1);
    }

    #[test]
    fn test_rollback_k_undoes_in_lifo_order() {
        let mut fx = Fixture::new();
        let slot = SlotRef::new(0, 0, 0);
        let first = fx.allocated("A", slot);

        // A cancels, B takes the same slot afterwards.
        fx.requests.get_mut(first).unwrap().cancel(&mut fx.layout).unwrap();
        fx.rollback.record_cancellation(first, fx.requests.get(first).unwrap());
        let second = fx.allocated("B", slot);

        fx.rollback.rollback_k(2, &mut fx.requests, &mut fx.layout).unwrap();

        assert_eq!(fx.state(second), RequestState::Cancelled);
        assert_eq!(fx.state(first), RequestState::Allocated);
        assert!(!fx.is_free(slot));
        assert_eq!(fx.rollback.len(), 1);
    }

    #[test]
    fn test_slot_is_freed_even_when_request_cannot_transition() {
        let mut fx = Fixture::new();
        let slot = SlotRef::new(0, 0, 1);
        let key = fx.allocated("A", slot);

        let request = fx.requests.get_mut(key).unwrap();
        request.occupy(10).unwrap();
        request.release(&mut fx.layout, 20).unwrap();
        fx.layout.slot_mut(slot).unwrap().mark_occupied();

        fx.rollback.rollback_last(&mut fx.requests, &mut fx.layout).unwrap();

        assert!(fx.is_free(slot));
        assert_eq!(fx.state(key), RequestState::Released);
    }
}
