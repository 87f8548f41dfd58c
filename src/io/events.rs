// src/io/events.rs
//
// The append-only event record every state-changing operation emits.
// Records are typed at the source; `details` is display text and is
// never parsed back.

use serde::Serialize;

use crate::simulation::clock::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Restock,
    OrderReceived,
    OrderDeferred,
    Dispatched,
    DeliveryAccepted,
    DeliveryRejected,
    VehicleReturned,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub timestamp: TimeOfDay,
    pub event_type: EventType,
    pub agent_id: String,
    pub details: String,
    pub status: String,
}

#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        timestamp: TimeOfDay,
        event_type: EventType,
        agent_id: impl Into<String>,
        details: impl Into<String>,
        status: impl Into<String>,
    ) {
        self.records.push(EventRecord {
            timestamp,
            event_type,
            agent_id: agent_id.into(),
            details: details.into(),
            status: status.into(),
        });
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count_of(&self, event_type: EventType) -> usize {
        self.records
            .iter()
            .filter(|record| record.event_type == event_type)
            .count()
    }
}
