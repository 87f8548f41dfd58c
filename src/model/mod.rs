pub mod store;
pub mod vehicle;
pub mod warehouse;
pub mod windows;

use std::collections::BTreeMap;

pub type Product = String;
pub type Quantity = u32;
pub type StoreId = u32;
pub type VehicleId = u32;

/// Product-to-quantity mapping used for stock, loads, orders and needs.
/// BTreeMap keeps iteration order stable across runs.
pub type ProductMap = BTreeMap<Product, Quantity>;

pub fn total_quantity(products: &ProductMap) -> Quantity {
    products.values().sum()
}

/// Renders a product map as "water: 30, bread: 10" for event details.
/// Display only; nothing ever parses this back.
pub fn format_products(products: &ProductMap) -> String {
    products
        .iter()
        .map(|(product, amount)| format!("{product}: {amount}"))
        .collect::<Vec<_>>()
        .join(", ")
}
