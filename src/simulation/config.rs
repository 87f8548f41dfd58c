// src/simulation/config.rs

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::windows::DeliveryWindow;
use crate::model::{ProductMap, Quantity, StoreId, VehicleId};
use crate::strategy::implementations::PackingPolicyKind;

/// The startup document, loaded once from JSON. The simulation does not
/// start if validation fails.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub warehouse: WarehouseConfig,
    pub stores: Vec<StoreConfig>,
    pub vehicles: Vec<VehicleConfig>,
    /// Node -> node -> distance units; must cover warehouse<->store both
    /// ways for every store.
    pub distances: BTreeMap<String, BTreeMap<String, u32>>,
    #[serde(default)]
    pub params: SimulationParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub inventory: ProductMap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub id: StoreId,
    pub name: String,
    pub delivery_windows: Vec<DeliveryWindow>,
    pub product_requirements: ProductMap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleConfig {
    pub id: VehicleId,
    pub capacity: Quantity,
}

/// Tunables with sensible defaults; all optional in the document.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationParams {
    /// Per-product odds of consumption each tick. Zero disables the
    /// stochastic demand driver, which deterministic runs rely on.
    #[serde(default = "default_consumption_chance")]
    pub consumption_chance: f64,
    /// Warehouse products below this level are restocked each tick.
    #[serde(default = "default_restock_threshold")]
    pub restock_threshold: Quantity,
    #[serde(default = "default_restock_min")]
    pub restock_min: Quantity,
    #[serde(default = "default_restock_max")]
    pub restock_max: Quantity,
    #[serde(default)]
    pub packing_policy: PackingPolicyKind,
}

fn default_consumption_chance() -> f64 {
    0.5
}

fn default_restock_threshold() -> Quantity {
    50
}

fn default_restock_min() -> Quantity {
    50
}

fn default_restock_max() -> Quantity {
    100
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            consumption_chance: default_consumption_chance(),
            restock_threshold: default_restock_threshold(),
            restock_min: default_restock_min(),
            restock_max: default_restock_max(),
            packing_policy: PackingPolicyKind::default(),
        }
    }
}

impl SimulationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stores.is_empty() {
            return Err(ConfigError::NoStores);
        }
        if self.vehicles.is_empty() {
            return Err(ConfigError::NoVehicles);
        }

        let mut store_ids = std::collections::BTreeSet::new();
        for store in &self.stores {
            if !store_ids.insert(store.id) {
                return Err(ConfigError::DuplicateStore(store.id));
            }
            for &(start, end) in &store.delivery_windows {
                if start >= end || end > 24 {
                    return Err(ConfigError::BadWindow {
                        store: store.name.clone(),
                        start,
                        end,
                    });
                }
            }
        }

        let mut vehicle_ids = std::collections::BTreeSet::new();
        for vehicle in &self.vehicles {
            if !vehicle_ids.insert(vehicle.id) {
                return Err(ConfigError::DuplicateVehicle(vehicle.id));
            }
            if vehicle.capacity == 0 {
                return Err(ConfigError::ZeroCapacity(vehicle.id));
            }
        }

        if !(0.0..=1.0).contains(&self.params.consumption_chance) {
            return Err(ConfigError::BadConsumptionChance(
                self.params.consumption_chance,
            ));
        }
        if self.params.restock_min > self.params.restock_max {
            return Err(ConfigError::BadRestockRange {
                min: self.params.restock_min,
                max: self.params.restock_max,
            });
        }

        // The distance pairs themselves are checked when the route table
        // is built, which reports the exact missing pair.
        Ok(())
    }
}
