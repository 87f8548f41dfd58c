// src/model/vehicle.rs

use serde::Serialize;

use crate::model::{total_quantity, ProductMap, Quantity, StoreId, VehicleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleState {
    Idle,
    EnRoute,
    Returning,
}

/// A delivery vehicle cycling through idle -> en_route -> returning.
///
/// `capacity` is a single scalar unit budget shared across all products.
/// ETAs live on the clock's monotone elapsed-minute axis.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub capacity: Quantity,
    pub current_load: ProductMap,
    pub state: VehicleState,
    pub destination: Option<StoreId>,
    pub departure_at: Option<u64>,
    pub arrival_at: Option<u64>,
}

/// Read-only view returned over the query protocol.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleSnapshot {
    pub vehicle_id: VehicleId,
    pub status: VehicleState,
    pub current_load: ProductMap,
    pub destination: Option<StoreId>,
    pub capacity: Quantity,
}

impl Vehicle {
    pub fn new(id: VehicleId, capacity: Quantity) -> Self {
        Self {
            id,
            capacity,
            current_load: ProductMap::new(),
            state: VehicleState::Idle,
            destination: None,
            departure_at: None,
            arrival_at: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == VehicleState::Idle
    }

    pub fn load_weight(&self) -> Quantity {
        total_quantity(&self.current_load)
    }

    /// idle -> en_route with a packed load. `departure` is the current
    /// elapsed minute; the arrival ETA is departure plus travel time.
    pub fn dispatch(
        &mut self,
        load: ProductMap,
        destination: StoreId,
        departure: u64,
        travel_minutes: u32,
    ) {
        debug_assert!(self.is_idle(), "dispatching a non-idle vehicle");
        debug_assert!(total_quantity(&load) <= self.capacity);
        self.current_load = load;
        self.destination = Some(destination);
        self.state = VehicleState::EnRoute;
        self.departure_at = Some(departure);
        self.arrival_at = Some(departure + u64::from(travel_minutes));
    }

    pub fn arrived(&self, elapsed: u64) -> bool {
        self.arrival_at.is_some_and(|eta| elapsed >= eta)
    }

    /// en_route -> returning after a successful hand-off. The load is
    /// gone; only the trip back remains.
    pub fn begin_return(&mut self, now: u64, travel_minutes: u32) {
        self.current_load.clear();
        self.state = VehicleState::Returning;
        self.departure_at = Some(now);
        self.arrival_at = Some(now + u64::from(travel_minutes));
    }

    /// returning -> idle back at the warehouse.
    pub fn complete_return(&mut self) {
        self.state = VehicleState::Idle;
        self.destination = None;
        self.departure_at = None;
        self.arrival_at = None;
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_id: self.id,
            status: self.state,
            current_load: self.current_load.clone(),
            destination: self.destination,
            capacity: self.capacity,
        }
    }
}
