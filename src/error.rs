use crate::model::{Product, Quantity, StoreId, VehicleId};
use thiserror::Error;

/// Fatal startup problems. The simulation does not start if any of these
/// fire; there is no partial-configuration mode.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("configuration defines no stores")]
    NoStores,

    #[error("configuration defines no vehicles")]
    NoVehicles,

    #[error("duplicate store id {0}")]
    DuplicateStore(StoreId),

    #[error("duplicate vehicle id {0}")]
    DuplicateVehicle(VehicleId),

    #[error("vehicle {0} has zero capacity")]
    ZeroCapacity(VehicleId),

    #[error("store {store}: delivery window [{start}, {end}) is invalid")]
    BadWindow {
        store: String,
        start: u32,
        end: u32,
    },

    #[error("distance table is missing the {from} -> {to} pair")]
    MissingDistance { from: String, to: String },

    #[error("params: consumption_chance {0} is not within 0.0..=1.0")]
    BadConsumptionChance(f64),

    #[error("params: restock_min {min} exceeds restock_max {max}")]
    BadRestockRange { min: Quantity, max: Quantity },
}

/// A delivery hand-off refused by the destination store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error(
        "{product} x{amount} would exceed the ceiling of {ceiling} (on hand: {on_hand})"
    )]
    CapacityExceeded {
        product: Product,
        amount: Quantity,
        ceiling: Quantity,
        on_hand: Quantity,
    },
}

/// Failures on the query-protocol boundary (client side).
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("connection closed by server")]
    ConnectionClosed,
}
