// src/strategy/implementations.rs

use serde::Deserialize;

use crate::model::{total_quantity, Product, ProductMap, Quantity};
use crate::strategy::traits::PackingPolicy;

/// Which packing policy the allocation engine uses. Selected in the
/// configuration document; greedy is the canonical choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackingPolicyKind {
    #[default]
    Greedy,
    Proportional,
}

impl PackingPolicyKind {
    pub fn build(self) -> Box<dyn PackingPolicy> {
        match self {
            PackingPolicyKind::Greedy => Box::new(GreedyLargestFirst),
            PackingPolicyKind::Proportional => Box::new(ProportionalSplit),
        }
    }
}

/// Packs products in descending requested quantity until capacity or
/// stock runs out. Ties break on product name so runs are reproducible.
#[derive(Debug, Clone, Copy)]
pub struct GreedyLargestFirst;

impl PackingPolicy for GreedyLargestFirst {
    fn pack(
        &self,
        requested: &ProductMap,
        stock: &ProductMap,
        capacity: Quantity,
    ) -> ProductMap {
        let mut items: Vec<(&Product, Quantity)> =
            requested.iter().map(|(p, &q)| (p, q)).collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut remaining = capacity;
        let mut load = ProductMap::new();
        for (product, needed) in items {
            if remaining == 0 {
                break;
            }
            let available = stock.get(product).copied().unwrap_or(0);
            let take = needed.min(available).min(remaining);
            if take > 0 {
                load.insert(product.clone(), take);
                remaining -= take;
            }
        }
        load
    }
}

/// Variant policy: when the request does not fit, every product gets a
/// share of capacity proportional to its requested quantity.
#[derive(Debug, Clone, Copy)]
pub struct ProportionalSplit;

impl PackingPolicy for ProportionalSplit {
    fn pack(
        &self,
        requested: &ProductMap,
        stock: &ProductMap,
        capacity: Quantity,
    ) -> ProductMap {
        let total = total_quantity(requested);
        if total == 0 || capacity == 0 {
            return ProductMap::new();
        }

        let mut load = ProductMap::new();
        for (product, &needed) in requested {
            let share = if total <= capacity {
                needed
            } else {
                // Floors can leave a little capacity unused; that is the
                // cost of keeping the split stable.
                ((u64::from(needed) * u64::from(capacity)) / u64::from(total)) as Quantity
            };
            let available = stock.get(product).copied().unwrap_or(0);
            let take = share.min(available);
            if take > 0 {
                load.insert(product.clone(), take);
            }
        }
        load
    }
}
