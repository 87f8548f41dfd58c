// src/model/warehouse.rs

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use crate::model::store::Store;
use crate::model::vehicle::Vehicle;
use crate::model::{total_quantity, Product, ProductMap, Quantity, StoreId, VehicleId};
use crate::routing::Routes;
use crate::simulation::clock::{travel_minutes, SimClock, TimeOfDay};
use crate::strategy::traits::PackingPolicy;

/// The warehouse: stock ledger plus the allocation engine.
///
/// `active_orders` quantities were already debited from `inventory` at
/// assignment time and must never be double-counted by a later
/// `process_order` for the same store.
#[derive(Debug, Clone)]
pub struct Warehouse {
    pub inventory: ProductMap,
    /// Goods assigned to a vehicle but not yet delivered, per store.
    pub active_orders: BTreeMap<StoreId, ProductMap>,
    /// Net need that could not be dispatched yet (no vehicle or window
    /// closed), retried every tick.
    pub pending_stores: BTreeMap<StoreId, ProductMap>,
}

/// What `process_order` did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Everything requested is already covered by goods in flight.
    AlreadyCovered,
    /// The store would be closed at the projected arrival; queued.
    Deferred { arrival: TimeOfDay },
    /// No idle vehicle was available; queued.
    NoIdleVehicle,
    /// An idle vehicle was found but nothing requested is in stock; queued.
    OutOfStock,
    /// A vehicle was loaded and sent. Any remainder was queued.
    Dispatched {
        vehicle: VehicleId,
        load: ProductMap,
        remainder: ProductMap,
    },
}

impl Warehouse {
    pub fn new(inventory: ProductMap) -> Self {
        Self {
            inventory,
            active_orders: BTreeMap::new(),
            pending_stores: BTreeMap::new(),
        }
    }

    pub fn active_orders_for(&self, store: StoreId) -> ProductMap {
        self.active_orders.get(&store).cloned().unwrap_or_default()
    }

    /// Nets a request against everything already covering this store:
    /// on-hand stock, goods en route and goods assigned but not yet
    /// delivered, clamped to the store's ceiling. A stale request can
    /// never oversize an allocation past what the store may hold.
    fn remaining_need(&self, store: &Store, requested: &ProductMap) -> ProductMap {
        let active = self.active_orders.get(&store.id);
        let mut remaining = ProductMap::new();
        for (product, &qty) in requested {
            let ceiling = store
                .product_requirements
                .get(product)
                .copied()
                .unwrap_or(0);
            let on_hand = store.inventory.get(product).copied().unwrap_or(0);
            let expected = store
                .expected_deliveries
                .get(product)
                .copied()
                .unwrap_or(0);
            let in_flight = active
                .and_then(|orders| orders.get(product))
                .copied()
                .unwrap_or(0);
            let headroom = ceiling.saturating_sub(on_hand + expected + in_flight);
            let grant = qty.min(headroom);
            if grant > 0 {
                remaining.insert(product.clone(), grant);
            }
        }
        remaining
    }

    fn merge_pending(&mut self, store: StoreId, need: &ProductMap) {
        let entry = self.pending_stores.entry(store).or_default();
        for (product, &amount) in need {
            *entry.entry(product.clone()).or_insert(0) += amount;
        }
    }

    pub fn take_pending(&mut self, store: StoreId) -> Option<ProductMap> {
        self.pending_stores.remove(&store)
    }

    /// Converts a store's request into a dispatch, a deferral or a no-op.
    ///
    /// Warehouse stock is debited at assignment time (reservation
    /// semantics), not at delivery. One vehicle is engaged per call; any
    /// remainder waits in `pending_stores` for the per-tick retry.
    pub fn process_order(
        &mut self,
        store: &mut Store,
        requested: &ProductMap,
        vehicles: &mut [Vehicle],
        routes: &Routes,
        clock: &SimClock,
        policy: &dyn PackingPolicy,
    ) -> OrderOutcome {
        let remaining = self.remaining_need(store, requested);
        if remaining.is_empty() {
            debug!(store = %store.name, "request already covered by goods in flight");
            return OrderOutcome::AlreadyCovered;
        }

        let distance = routes.from_warehouse(&store.name);
        let minutes = travel_minutes(distance);
        let (_eta, arrival) = clock.eta_after(minutes);

        if !store.can_accept_at(arrival) {
            debug!(
                store = %store.name,
                arrival = %arrival.hhmm(),
                "store closed at projected arrival, deferring"
            );
            self.merge_pending(store.id, &remaining);
            return OrderOutcome::Deferred { arrival };
        }

        let Some(vehicle) = vehicles.iter_mut().find(|v| v.is_idle()) else {
            debug!(store = %store.name, "no idle vehicle, deferring");
            self.merge_pending(store.id, &remaining);
            return OrderOutcome::NoIdleVehicle;
        };

        let load = policy.pack(&remaining, &self.inventory, vehicle.capacity);
        if load.is_empty() {
            debug!(store = %store.name, "nothing requested is in stock, deferring");
            self.merge_pending(store.id, &remaining);
            return OrderOutcome::OutOfStock;
        }

        // Reserve the stock now; the goods are spoken for.
        for (product, &amount) in &load {
            if let Some(stock) = self.inventory.get_mut(product) {
                *stock = stock.saturating_sub(amount);
            }
        }

        let vehicle_id = vehicle.id;
        vehicle.dispatch(load.clone(), store.id, clock.elapsed(), minutes);
        store.add_expected_delivery(&load, vehicle_id);

        let active = self.active_orders.entry(store.id).or_default();
        for (product, &amount) in &load {
            *active.entry(product.clone()).or_insert(0) += amount;
        }

        let mut remainder = remaining;
        for (product, &amount) in &load {
            if let Some(left) = remainder.get_mut(product) {
                *left = left.saturating_sub(amount);
            }
            if remainder.get(product) == Some(&0) {
                remainder.remove(product);
            }
        }
        if !remainder.is_empty() {
            self.merge_pending(store.id, &remainder);
        }

        OrderOutcome::Dispatched {
            vehicle: vehicle_id,
            load,
            remainder,
        }
    }

    /// Picks which deferred store to retry this tick: among pending
    /// stores with no vehicle already on the way whose projected arrival
    /// passes the window check, the one with the largest outstanding
    /// total, ties broken by shorter distance.
    pub fn find_best_store_for_delivery(
        &self,
        stores: &[Store],
        routes: &Routes,
        clock: &SimClock,
    ) -> Option<StoreId> {
        let mut candidates: Vec<(StoreId, Quantity, u32)> = Vec::new();
        for (&store_id, needed) in &self.pending_stores {
            let Some(store) = stores.iter().find(|s| s.id == store_id) else {
                continue;
            };
            if store.awaiting_vehicle.is_some() {
                continue;
            }
            let distance = routes.from_warehouse(&store.name);
            let (_eta, arrival) = clock.eta_after(travel_minutes(distance));
            if !store.can_accept_at(arrival) {
                continue;
            }
            candidates.push((store_id, total_quantity(needed), distance));
        }
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
        candidates.first().map(|&(store_id, _, _)| store_id)
    }

    /// Reported by a vehicle after a successful hand-off: the delivered
    /// quantities leave both ledgers.
    pub fn complete_delivery(&mut self, store: StoreId, delivered: &ProductMap) {
        Self::net_out(&mut self.active_orders, store, delivered);
        Self::net_out(&mut self.pending_stores, store, delivered);
    }

    fn net_out(
        ledger: &mut BTreeMap<StoreId, ProductMap>,
        store: StoreId,
        delivered: &ProductMap,
    ) {
        if let Some(entry) = ledger.get_mut(&store) {
            for (product, &amount) in delivered {
                if let Some(qty) = entry.get_mut(product) {
                    *qty = qty.saturating_sub(amount);
                }
                if entry.get(product) == Some(&0) {
                    entry.remove(product);
                }
            }
            if entry.is_empty() {
                ledger.remove(&store);
            }
        }
    }

    /// Any product below `threshold` is topped up by a uniform draw from
    /// `min..=max`. Returns what was restocked for the event log.
    pub fn restock<R: Rng>(
        &mut self,
        threshold: Quantity,
        min: Quantity,
        max: Quantity,
        rng: &mut R,
    ) -> Vec<(Product, Quantity)> {
        let mut restocked = Vec::new();
        for (product, amount) in self.inventory.iter_mut() {
            if *amount < threshold {
                let added = rng.gen_range(min..=max);
                *amount += added;
                restocked.push((product.clone(), added));
            }
        }
        restocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::implementations::GreedyLargestFirst;

    fn map(entries: &[(&str, Quantity)]) -> ProductMap {
        entries
            .iter()
            .map(|&(p, q)| (p.to_string(), q))
            .collect()
    }

    fn store() -> Store {
        Store::new(
            1,
            "Central".to_string(),
            vec![(9, 22)],
            map(&[("water", 50)]),
        )
    }

    fn routes_for(store_name: &str, distance: u32) -> Routes {
        Routes::from_entries([(store_name.to_string(), distance, distance)])
    }

    #[test]
    fn packs_into_one_idle_vehicle_and_queues_the_rest() {
        let mut warehouse = Warehouse::new(map(&[("water", 40)]));
        let mut s = store();
        let mut vehicles = vec![Vehicle::new(1, 30)];
        let routes = routes_for("Central", 5);
        let clock = SimClock::new();

        let outcome = warehouse.process_order(
            &mut s,
            &map(&[("water", 50)]),
            &mut vehicles,
            &routes,
            &clock,
            &GreedyLargestFirst,
        );

        match outcome {
            OrderOutcome::Dispatched {
                vehicle,
                load,
                remainder,
            } => {
                assert_eq!(vehicle, 1);
                assert_eq!(load, map(&[("water", 30)]));
                assert_eq!(remainder, map(&[("water", 20)]));
            }
            other => panic!("expected dispatch, got {other:?}"),
        }

        // Stock is debited at assignment, not at delivery.
        assert_eq!(warehouse.inventory, map(&[("water", 10)]));
        assert_eq!(warehouse.active_orders_for(1), map(&[("water", 30)]));
        assert_eq!(warehouse.pending_stores.get(&1), Some(&map(&[("water", 20)])));
        assert_eq!(vehicles[0].current_load, map(&[("water", 30)]));
        assert!(!vehicles[0].is_idle());
        assert_eq!(s.awaiting_vehicle, Some(1));
        assert_eq!(s.expected_deliveries, map(&[("water", 30)]));
    }

    #[test]
    fn nets_against_goods_already_in_flight() {
        let mut warehouse = Warehouse::new(map(&[("water", 100)]));
        warehouse
            .active_orders
            .insert(1, map(&[("water", 30)]));
        let mut s = store();
        let mut vehicles = vec![Vehicle::new(1, 100)];
        let routes = routes_for("Central", 5);
        let clock = SimClock::new();

        let outcome = warehouse.process_order(
            &mut s,
            &map(&[("water", 50)]),
            &mut vehicles,
            &routes,
            &clock,
            &GreedyLargestFirst,
        );

        // Remaining need is 20, not 50.
        match outcome {
            OrderOutcome::Dispatched { load, .. } => {
                assert_eq!(load, map(&[("water", 20)]));
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn fully_covered_request_is_a_no_op() {
        let mut warehouse = Warehouse::new(map(&[("water", 100)]));
        warehouse
            .active_orders
            .insert(1, map(&[("water", 50)]));
        let mut s = store();
        let mut vehicles = vec![Vehicle::new(1, 100)];
        let routes = routes_for("Central", 5);
        let clock = SimClock::new();

        let outcome = warehouse.process_order(
            &mut s,
            &map(&[("water", 50)]),
            &mut vehicles,
            &routes,
            &clock,
            &GreedyLargestFirst,
        );
        assert_eq!(outcome, OrderOutcome::AlreadyCovered);
        assert_eq!(warehouse.inventory, map(&[("water", 100)]));
        assert!(vehicles[0].is_idle());
    }

    #[test]
    fn closed_window_defers_without_engaging_a_vehicle() {
        let mut warehouse = Warehouse::new(map(&[("water", 100)]));
        let mut s = Store::new(
            1,
            "Central".to_string(),
            vec![(16, 20)],
            map(&[("water", 50)]),
        );
        let mut vehicles = vec![Vehicle::new(1, 100)];
        let routes = routes_for("Central", 5);
        let clock = SimClock::new(); // 09:00, arrival 09:15, window opens 16:00

        let outcome = warehouse.process_order(
            &mut s,
            &map(&[("water", 50)]),
            &mut vehicles,
            &routes,
            &clock,
            &GreedyLargestFirst,
        );
        assert!(matches!(outcome, OrderOutcome::Deferred { .. }));
        assert!(vehicles[0].is_idle());
        assert_eq!(warehouse.inventory, map(&[("water", 100)]));
        assert_eq!(warehouse.pending_stores.get(&1), Some(&map(&[("water", 50)])));
    }

    #[test]
    fn no_idle_vehicle_queues_the_full_need() {
        let mut warehouse = Warehouse::new(map(&[("water", 100)]));
        let mut s = store();
        let mut vehicles = vec![Vehicle::new(1, 30)];
        vehicles[0].dispatch(map(&[("water", 10)]), 9, 0, 30);
        let routes = routes_for("Central", 5);
        let clock = SimClock::new();

        let outcome = warehouse.process_order(
            &mut s,
            &map(&[("water", 50)]),
            &mut vehicles,
            &routes,
            &clock,
            &GreedyLargestFirst,
        );
        assert_eq!(outcome, OrderOutcome::NoIdleVehicle);
        assert_eq!(warehouse.pending_stores.get(&1), Some(&map(&[("water", 50)])));
    }

    #[test]
    fn request_above_ceiling_is_clamped() {
        let mut warehouse = Warehouse::new(map(&[("water", 200)]));
        let mut s = store();
        let mut vehicles = vec![Vehicle::new(1, 200)];
        let routes = routes_for("Central", 5);
        let clock = SimClock::new();

        // A stale request for 120 against a ceiling of 50.
        let outcome = warehouse.process_order(
            &mut s,
            &map(&[("water", 120)]),
            &mut vehicles,
            &routes,
            &clock,
            &GreedyLargestFirst,
        );
        match outcome {
            OrderOutcome::Dispatched { load, .. } => {
                assert_eq!(load, map(&[("water", 50)]));
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn completion_clears_both_ledgers() {
        let mut warehouse = Warehouse::new(ProductMap::new());
        warehouse.active_orders.insert(1, map(&[("water", 30)]));
        warehouse.pending_stores.insert(1, map(&[("water", 20), ("bread", 5)]));

        warehouse.complete_delivery(1, &map(&[("water", 30)]));
        assert!(warehouse.active_orders.get(&1).is_none());
        assert_eq!(
            warehouse.pending_stores.get(&1),
            Some(&map(&[("bread", 5)]))
        );
    }

    #[test]
    fn retry_candidate_prefers_largest_outstanding_then_distance() {
        let warehouse = {
            let mut w = Warehouse::new(ProductMap::new());
            w.pending_stores.insert(1, map(&[("water", 10)]));
            w.pending_stores.insert(2, map(&[("water", 40)]));
            w
        };
        let stores = vec![
            Store::new(1, "Near".to_string(), vec![(9, 22)], map(&[("water", 50)])),
            Store::new(2, "Far".to_string(), vec![(9, 22)], map(&[("water", 50)])),
        ];
        let routes = Routes::from_entries([
            ("Near".to_string(), 2, 2),
            ("Far".to_string(), 9, 9),
        ]);
        let clock = SimClock::new();

        // Far has more outstanding, so distance does not save Near.
        assert_eq!(
            warehouse.find_best_store_for_delivery(&stores, &routes, &clock),
            Some(2)
        );
    }

    #[test]
    fn retry_skips_stores_already_awaiting_a_vehicle() {
        let mut warehouse = Warehouse::new(ProductMap::new());
        warehouse.pending_stores.insert(1, map(&[("water", 40)]));
        let mut s = store();
        s.awaiting_vehicle = Some(3);
        let routes = routes_for("Central", 5);
        let clock = SimClock::new();

        assert_eq!(
            warehouse.find_best_store_for_delivery(&[s], &routes, &clock),
            None
        );
    }

    #[test]
    fn restock_tops_up_low_products_only() {
        let mut warehouse = Warehouse::new(map(&[("water", 10), ("bread", 80)]));
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        let restocked = warehouse.restock(50, 50, 100, &mut rng);
        assert_eq!(restocked.len(), 1);
        assert_eq!(restocked[0].0, "water");
        assert!(warehouse.inventory["water"] >= 60);
        assert_eq!(warehouse.inventory["bread"], 80);
    }
}
