// src/simulation/engine.rs

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::io::events::{EventLog, EventType};
use crate::model::store::{Store, StoreSnapshot};
use crate::model::vehicle::{Vehicle, VehicleSnapshot, VehicleState};
use crate::model::warehouse::{OrderOutcome, Warehouse};
use crate::model::{format_products, ProductMap, StoreId, VehicleId};
use crate::routing::Routes;
use crate::simulation::clock::{travel_minutes, SimClock};
use crate::simulation::config::{SimulationConfig, SimulationParams};
use crate::strategy::traits::PackingPolicy;

/// The whole simulated world: warehouse, stores, vehicles, clock, event
/// log and the seeded RNG every stochastic draw goes through.
///
/// Single-threaded by construction; one `step` runs to completion before
/// the next begins. Cross-agent effects flow through the defined
/// operations (dispatch, expected-delivery notification, hand-off),
/// never through foreign-field mutation.
pub struct World {
    pub clock: SimClock,
    pub warehouse: Warehouse,
    pub stores: Vec<Store>,
    pub vehicles: Vec<Vehicle>,
    pub routes: Routes,
    pub events: EventLog,
    params: SimulationParams,
    policy: Box<dyn PackingPolicy>,
    rng: StdRng,
}

impl World {
    /// Builds the world from a validated configuration. The seed fixes
    /// the per-tick agent shuffle and all stochastic draws, so equal
    /// seeds give equal runs.
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let routes = Routes::build(&config)?;

        let warehouse = Warehouse::new(config.warehouse.inventory.clone());
        let stores = config
            .stores
            .iter()
            .map(|s| {
                Store::new(
                    s.id,
                    s.name.clone(),
                    s.delivery_windows.clone(),
                    s.product_requirements.clone(),
                )
            })
            .collect();
        let vehicles = config
            .vehicles
            .iter()
            .map(|v| Vehicle::new(v.id, v.capacity))
            .collect();

        info!(
            stores = config.stores.len(),
            vehicles = config.vehicles.len(),
            seed,
            "world initialized"
        );

        Ok(Self {
            clock: SimClock::new(),
            warehouse,
            stores,
            vehicles,
            routes,
            events: EventLog::new(),
            policy: config.params.packing_policy.build(),
            params: config.params,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// One tick: advance the clock, then evaluate vehicles, stores and
    /// the warehouse in that phase order. Within a phase, agents run in
    /// a seeded random order; no invariant depends on it.
    pub fn step(&mut self) {
        self.clock.advance();
        debug!(time = %self.clock.now().hhmm(), "tick");

        // =============================================================
        // PHASE 1: vehicles check arrival and return conditions.
        // =============================================================
        let mut order: Vec<usize> = (0..self.vehicles.len()).collect();
        order.shuffle(&mut self.rng);
        for idx in order {
            self.step_vehicle(idx);
        }

        // =============================================================
        // PHASE 2: stores consume, evaluate demand and submit orders.
        // =============================================================
        let mut order: Vec<usize> = (0..self.stores.len()).collect();
        order.shuffle(&mut self.rng);
        for idx in order {
            self.step_store(idx);
        }

        // =============================================================
        // PHASE 3: warehouse restocks and retries deferred demand.
        // =============================================================
        self.step_warehouse();
    }

    fn step_vehicle(&mut self, idx: usize) {
        let elapsed = self.clock.elapsed();
        let now = self.clock.now();

        match self.vehicles[idx].state {
            VehicleState::Idle => {}
            VehicleState::EnRoute => {
                if !self.vehicles[idx].arrived(elapsed) {
                    return;
                }
                let Some(dest) = self.vehicles[idx].destination else {
                    return;
                };
                let Some(store_idx) = self.stores.iter().position(|s| s.id == dest) else {
                    return;
                };

                // The pre-dispatch projection already approved this
                // arrival, but the store may have drifted out of its
                // window; hold in place and retry next tick.
                if !self.stores[store_idx].can_accept(now.hour()) {
                    debug!(
                        vehicle = self.vehicles[idx].id,
                        store = %self.stores[store_idx].name,
                        "arrived outside window, holding"
                    );
                    return;
                }

                let load = self.vehicles[idx].current_load.clone();
                match self.stores[store_idx].receive_delivery(&load) {
                    Ok(()) => {
                        self.warehouse.complete_delivery(dest, &load);
                        let back = self.routes.to_warehouse(&self.stores[store_idx].name);
                        self.vehicles[idx].begin_return(elapsed, travel_minutes(back));
                        info!(
                            vehicle = self.vehicles[idx].id,
                            store = %self.stores[store_idx].name,
                            "delivery accepted"
                        );
                        self.events.record(
                            now,
                            EventType::DeliveryAccepted,
                            self.stores[store_idx].name.clone(),
                            format!(
                                "vehicle {} delivered {}",
                                self.vehicles[idx].id,
                                format_products(&load)
                            ),
                            "completed",
                        );
                    }
                    Err(err) => {
                        // Retry-in-place: the goods stay on the vehicle.
                        warn!(
                            vehicle = self.vehicles[idx].id,
                            store = %self.stores[store_idx].name,
                            error = %err,
                            "delivery rejected"
                        );
                        self.events.record(
                            now,
                            EventType::DeliveryRejected,
                            format!("vehicle_{}", self.vehicles[idx].id),
                            err.to_string(),
                            "rejected",
                        );
                    }
                }
            }
            VehicleState::Returning => {
                if !self.vehicles[idx].arrived(elapsed) {
                    return;
                }
                self.vehicles[idx].complete_return();
                debug!(vehicle = self.vehicles[idx].id, "back at warehouse");
                self.events.record(
                    now,
                    EventType::VehicleReturned,
                    format!("vehicle_{}", self.vehicles[idx].id),
                    "returned to warehouse".to_string(),
                    "idle",
                );
            }
        }
    }

    fn step_store(&mut self, idx: usize) {
        let now = self.clock.now();

        let consumed = self.stores[idx].consume(self.params.consumption_chance, &mut self.rng);
        if !consumed.is_empty() {
            debug!(
                store = %self.stores[idx].name,
                consumed = %format_products(&consumed),
                "stock consumed"
            );
        }

        let active = self.warehouse.active_orders_for(self.stores[idx].id);
        let Some(needed) = self.stores[idx].evaluate_demand(&active) else {
            return;
        };

        self.events.record(
            now,
            EventType::OrderReceived,
            self.stores[idx].name.clone(),
            format!("requested {}", format_products(&needed)),
            "pending",
        );
        self.dispatch_order(idx, &needed);
    }

    fn step_warehouse(&mut self) {
        let now = self.clock.now();

        for (product, added) in self.warehouse.restock(
            self.params.restock_threshold,
            self.params.restock_min,
            self.params.restock_max,
            &mut self.rng,
        ) {
            self.events.record(
                now,
                EventType::Restock,
                "warehouse",
                format!("{product}: +{added}"),
                "restocked",
            );
        }

        // Deferred retry: one candidate per tick, re-netted through the
        // normal order path.
        if let Some(store_id) =
            self.warehouse
                .find_best_store_for_delivery(&self.stores, &self.routes, &self.clock)
        {
            if let Some(needed) = self.warehouse.take_pending(store_id) {
                if let Some(idx) = self.stores.iter().position(|s| s.id == store_id) {
                    debug!(store = %self.stores[idx].name, "retrying deferred demand");
                    self.dispatch_order(idx, &needed);
                }
            }
        }
    }

    /// Runs the allocation engine for one store's need and records the
    /// outcome. Public so callers (and tests) can drive allocation
    /// without the stochastic parts of a full tick.
    pub fn dispatch_order(&mut self, store_idx: usize, needed: &ProductMap) -> OrderOutcome {
        let now = self.clock.now();
        let outcome = self.warehouse.process_order(
            &mut self.stores[store_idx],
            needed,
            &mut self.vehicles,
            &self.routes,
            &self.clock,
            &*self.policy,
        );

        let store_name = self.stores[store_idx].name.clone();
        match &outcome {
            OrderOutcome::AlreadyCovered => {}
            OrderOutcome::Deferred { arrival } => {
                self.events.record(
                    now,
                    EventType::OrderDeferred,
                    store_name,
                    format!("window closed at projected arrival {}", arrival.hhmm()),
                    "deferred",
                );
            }
            OrderOutcome::NoIdleVehicle => {
                self.events.record(
                    now,
                    EventType::OrderDeferred,
                    store_name,
                    "no idle vehicle".to_string(),
                    "no_vehicle",
                );
            }
            OrderOutcome::OutOfStock => {
                self.events.record(
                    now,
                    EventType::OrderDeferred,
                    store_name,
                    "requested products out of stock".to_string(),
                    "no_stock",
                );
            }
            OrderOutcome::Dispatched {
                vehicle,
                load,
                remainder,
            } => {
                info!(
                    vehicle,
                    store = %store_name,
                    load = %format_products(load),
                    "vehicle dispatched"
                );
                self.events.record(
                    now,
                    EventType::Dispatched,
                    format!("vehicle_{vehicle}"),
                    format!("{} for {store_name}", format_products(load)),
                    "en_route",
                );
                if !remainder.is_empty() {
                    debug!(
                        store = %store_name,
                        remainder = %format_products(remainder),
                        "remainder queued"
                    );
                }
            }
        }
        outcome
    }

    pub fn store_snapshot(&self, id: StoreId) -> Option<StoreSnapshot> {
        self.stores.iter().find(|s| s.id == id).map(Store::snapshot)
    }

    pub fn vehicle_snapshot(&self, id: VehicleId) -> Option<VehicleSnapshot> {
        self.vehicles
            .iter()
            .find(|v| v.id == id)
            .map(Vehicle::snapshot)
    }

    /// Checks the stock-ceiling and load-capacity invariants; used by
    /// tests after every mutation point.
    #[cfg(any(test, debug_assertions))]
    pub fn check_invariants(&self) {
        for store in &self.stores {
            let active = self.warehouse.active_orders_for(store.id);
            for (product, &ceiling) in &store.product_requirements {
                let on_hand = store.inventory.get(product).copied().unwrap_or(0);
                let expected = store.expected_deliveries.get(product).copied().unwrap_or(0);
                let committed = active.get(product).copied().unwrap_or(0);
                assert!(
                    on_hand + expected.max(committed) <= ceiling,
                    "store {} exceeds ceiling for {product}",
                    store.name
                );
            }
        }
        for vehicle in &self.vehicles {
            assert!(
                vehicle.load_weight() <= vehicle.capacity,
                "vehicle {} is overloaded",
                vehicle.id
            );
        }
    }
}
