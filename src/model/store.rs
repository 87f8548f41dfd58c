// src/model/store.rs

use rand::Rng;
use serde::Serialize;

use crate::error::DeliveryError;
use crate::model::windows::{self, DeliveryWindow};
use crate::model::{ProductMap, Quantity, StoreId, VehicleId};
use crate::simulation::clock::TimeOfDay;

/// A retail store replenished from the warehouse.
///
/// `product_requirements` is a ceiling, not a flow target: stock plus
/// everything committed toward this store must never exceed it.
#[derive(Debug, Clone)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub delivery_windows: Vec<DeliveryWindow>,
    pub product_requirements: ProductMap,
    pub inventory: ProductMap,

    /// Goods a vehicle is currently carrying toward this store.
    pub expected_deliveries: ProductMap,
    /// Set while a vehicle is on its way here; at most one at a time.
    pub awaiting_vehicle: Option<VehicleId>,
}

/// Read-only view returned over the query protocol.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub store_id: StoreId,
    pub name: String,
    pub inventory: ProductMap,
    pub requirements: ProductMap,
    pub delivery_windows: Vec<DeliveryWindow>,
}

impl Store {
    pub fn new(
        id: StoreId,
        name: String,
        delivery_windows: Vec<DeliveryWindow>,
        product_requirements: ProductMap,
    ) -> Self {
        // Stores open empty; demand pulls stock in over the first ticks.
        let inventory = product_requirements
            .keys()
            .map(|product| (product.clone(), 0))
            .collect();
        Self {
            id,
            name,
            delivery_windows,
            product_requirements,
            inventory,
            expected_deliveries: ProductMap::new(),
            awaiting_vehicle: None,
        }
    }

    pub fn can_accept(&self, hour: u32) -> bool {
        windows::can_accept(&self.delivery_windows, hour)
    }

    pub fn can_accept_at(&self, arrival: TimeOfDay) -> bool {
        windows::can_accept_at(&self.delivery_windows, arrival)
    }

    /// Computes this store's unmet need, netting on-hand stock, goods en
    /// route and goods already committed by the warehouse.
    ///
    /// Returns `None` while any replenishment is outstanding (a non-empty
    /// active order or a vehicle on its way): at most one request is live
    /// per store at a time.
    pub fn evaluate_demand(&self, active_orders: &ProductMap) -> Option<ProductMap> {
        if !active_orders.is_empty() {
            return None;
        }
        if self.awaiting_vehicle.is_some() {
            return None;
        }

        let mut needed = ProductMap::new();
        for (product, &required) in &self.product_requirements {
            let on_hand = self.inventory.get(product).copied().unwrap_or(0);
            let expected = self.expected_deliveries.get(product).copied().unwrap_or(0);
            let committed = active_orders.get(product).copied().unwrap_or(0);
            let covered = on_hand + expected + committed;
            if covered < required {
                needed.insert(product.clone(), required - covered);
            }
        }

        if needed.is_empty() {
            None
        } else {
            Some(needed)
        }
    }

    /// Called by the dispatching vehicle so the store stops re-requesting
    /// goods that are already on the road.
    pub fn add_expected_delivery(&mut self, products: &ProductMap, vehicle: VehicleId) {
        for (product, &amount) in products {
            *self
                .expected_deliveries
                .entry(product.clone())
                .or_insert(0) += amount;
        }
        self.awaiting_vehicle = Some(vehicle);
    }

    /// Accepts or rejects a delivered batch.
    ///
    /// The whole batch is rejected if any product would push stock above
    /// its ceiling; there is no partial acceptance. Under correct
    /// allocation this re-check never fires.
    pub fn receive_delivery(&mut self, products: &ProductMap) -> Result<(), DeliveryError> {
        for (product, &amount) in products {
            let on_hand = self.inventory.get(product).copied().unwrap_or(0);
            let ceiling = self.product_requirements.get(product).copied().unwrap_or(0);
            if on_hand + amount > ceiling {
                return Err(DeliveryError::CapacityExceeded {
                    product: product.clone(),
                    amount,
                    ceiling,
                    on_hand,
                });
            }
        }

        for (product, &amount) in products {
            *self.inventory.entry(product.clone()).or_insert(0) += amount;
            if let Some(expected) = self.expected_deliveries.get_mut(product) {
                *expected = expected.saturating_sub(amount);
            }
            if self.expected_deliveries.get(product) == Some(&0) {
                self.expected_deliveries.remove(product);
            }
        }

        if self.expected_deliveries.is_empty() {
            self.awaiting_vehicle = None;
        }
        Ok(())
    }

    /// Stochastic consumption: each product with stock has `chance` odds
    /// of losing 20% of on-hand (at least one unit) this tick. This is
    /// what generates demand over time. Returns what was consumed.
    pub fn consume<R: Rng>(&mut self, chance: f64, rng: &mut R) -> ProductMap {
        let mut consumed = ProductMap::new();
        if chance <= 0.0 {
            return consumed;
        }
        for (product, amount) in self.inventory.iter_mut() {
            if *amount == 0 || !rng.gen_bool(chance) {
                continue;
            }
            let take = ((f64::from(*amount) * 0.2) as Quantity).max(1).min(*amount);
            *amount -= take;
            consumed.insert(product.clone(), take);
        }
        consumed
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            store_id: self.id,
            name: self.name.clone(),
            inventory: self.inventory.clone(),
            requirements: self.product_requirements.clone(),
            delivery_windows: self.delivery_windows.clone(),
        }
    }
}
