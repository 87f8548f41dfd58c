// src/routing.rs
//
// Distance lookup between the warehouse and the stores. The table comes
// from configuration and is validated once at startup, so lookups after
// construction are plain reads.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::simulation::config::SimulationConfig;

/// Node name the configuration uses for the warehouse side of a pair.
pub const WAREHOUSE_NODE: &str = "warehouse";

/// Validated warehouse<->store distances in abstract distance units.
#[derive(Debug, Clone)]
pub struct Routes {
    outbound: BTreeMap<String, u32>,
    inbound: BTreeMap<String, u32>,
}

impl Routes {
    /// Extracts the warehouse<->store pairs for every configured store.
    /// A missing pair in either direction is fatal.
    pub fn build(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let mut outbound = BTreeMap::new();
        let mut inbound = BTreeMap::new();

        for store in &config.stores {
            let out = config
                .distances
                .get(WAREHOUSE_NODE)
                .and_then(|row| row.get(&store.name))
                .copied()
                .ok_or_else(|| ConfigError::MissingDistance {
                    from: WAREHOUSE_NODE.to_string(),
                    to: store.name.clone(),
                })?;
            let back = config
                .distances
                .get(&store.name)
                .and_then(|row| row.get(WAREHOUSE_NODE))
                .copied()
                .ok_or_else(|| ConfigError::MissingDistance {
                    from: store.name.clone(),
                    to: WAREHOUSE_NODE.to_string(),
                })?;
            outbound.insert(store.name.clone(), out);
            inbound.insert(store.name.clone(), back);
        }

        Ok(Self { outbound, inbound })
    }

    /// Builds a table directly from (store, outbound, inbound) entries,
    /// bypassing the configuration document.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, u32, u32)>) -> Self {
        let mut outbound = BTreeMap::new();
        let mut inbound = BTreeMap::new();
        for (store, out, back) in entries {
            outbound.insert(store.clone(), out);
            inbound.insert(store, back);
        }
        Self { outbound, inbound }
    }

    /// Distance for the outbound warehouse -> store leg. Every configured
    /// store is present; an unknown name reads as zero distance.
    pub fn from_warehouse(&self, store: &str) -> u32 {
        self.outbound.get(store).copied().unwrap_or(0)
    }

    /// Distance for the return store -> warehouse leg.
    pub fn to_warehouse(&self, store: &str) -> u32 {
        self.inbound.get(store).copied().unwrap_or(0)
    }
}
