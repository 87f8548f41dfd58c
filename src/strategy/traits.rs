// src/strategy/traits.rs

use std::fmt::Debug;

use crate::model::{ProductMap, Quantity};

/// Decides how a store's outstanding need is packed into one vehicle's
/// capacity, given current warehouse stock.
///
/// Contract: the summed quantities of the returned load never exceed
/// `capacity`, no product exceeds the stock offered for it, and no
/// product exceeds its requested amount. An empty map means nothing
/// could be loaded.
pub trait PackingPolicy: Debug + Send + Sync {
    fn pack(
        &self,
        requested: &ProductMap,
        stock: &ProductMap,
        capacity: Quantity,
    ) -> ProductMap;
}
