use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::domain::request::{ParkingRequest, RequestState};
use crate::domain::utils::id::VehicleNumber;
use crate::domain::vehicle::VehicleType;

new_key_type! {
    pub struct RequestId;
}

/// Arena of every request submitted during the run.
///
/// Requests are never removed, so a `RequestId` handed out by this store keeps
/// resolving for as long as the store lives.
#[derive(Debug, Default)]
pub struct RequestStore {
    /// Request storage.
    requests: SlotMap<RequestId, ParkingRequest>,

    /// Submission order, oldest first.
    order: Vec<RequestId>,

    /// Every request per vehicle identity, oldest first.
    vehicle_index: HashMap<(VehicleNumber, VehicleType), Vec<RequestId>>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request to the store.
    ///
    /// # Returns
    /// Returns the RequestId (internal key for the RequestStore).
    pub fn add(&mut self, request: ParkingRequest) -> RequestId {
        let identity = (request.get_vehicle_number().clone(), request.get_vehicle_type());
        let key = self.requests.insert(request);

        self.order.push(key);
        self.vehicle_index.entry(identity).or_default().push(key);

        key
    }

    pub fn get(&self, key: RequestId) -> Option<&ParkingRequest> {
        self.requests.get(key)
    }

    pub fn get_mut(&mut self, key: RequestId) -> Option<&mut ParkingRequest> {
        self.requests.get_mut(key)
    }

    /// Latest request submitted for the vehicle identified by `(number, vehicle_type)`.
    pub fn find_latest_by_vehicle(&self, number: &VehicleNumber, vehicle_type: VehicleType) -> Option<RequestId> {
        self.vehicle_index.get(&(number.clone(), vehicle_type)).and_then(|keys| keys.last().copied())
    }

    /// The request the vehicle is currently working through.
    ///
    /// A rollback can bring an older request back to life while a newer one
    /// stays terminal, so the newest request holding a slot wins, then the
    /// newest non-terminal one, then simply the newest.
    pub fn find_current_by_vehicle(&self, number: &VehicleNumber, vehicle_type: VehicleType) -> Option<RequestId> {
        let keys = self.vehicle_index.get(&(number.clone(), vehicle_type))?;

        self.newest_matching(keys, RequestState::holds_slot)
            .or_else(|| self.newest_matching(keys, |state| !state.is_terminal()))
            .or_else(|| keys.last().copied())
    }

    /// `Requested` entries of vehicles that hold a slot through another request.
    ///
    /// Undoing a cancellation can restore an old allocation while a later
    /// booking attempt of the same vehicle is still pending.
    pub fn find_superseded_pending(&self) -> Vec<RequestId> {
        self.vehicle_index
            .values()
            .filter(|keys| self.newest_matching(keys, RequestState::holds_slot).is_some())
            .flat_map(|keys| keys.iter().copied())
            .filter(|key| self.requests.get(*key).is_some_and(|request| request.get_state() == RequestState::Requested))
            .collect()
    }

    fn newest_matching(&self, keys: &[RequestId], predicate: impl Fn(&RequestState) -> bool) -> Option<RequestId> {
        keys.iter().rev().copied().find(|key| self.requests.get(*key).is_some_and(|request| predicate(&request.get_state())))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All requests in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (RequestId, &ParkingRequest)> + '_ {
        self.order.iter().filter_map(|key| self.requests.get(*key).map(|request| (*key, request)))
    }

    /// Up to `count` requests, most recent first.
    pub fn iter_recent(&self, count: usize) -> impl Iterator<Item = (RequestId, &ParkingRequest)> + '_ {
        self.order.iter().rev().take(count).filter_map(|key| self.requests.get(*key).map(|request| (*key, request)))
    }
}
