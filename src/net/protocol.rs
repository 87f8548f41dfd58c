// src/net/protocol.rs
//
// Wire types for the query boundary: newline-delimited JSON over TCP.
// Every well-formed request advances the simulation by exactly one tick
// before its snapshot is read.

use serde::{Deserialize, Serialize};

use crate::model::{StoreId, VehicleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    GetStoreStatus { store_id: StoreId },
    GetVehicleStatus { vehicle_id: VehicleId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success { data: serde_json::Value },
    Error { message: String },
}

impl Response {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}
