// src/io/schedule.rs
//
// One-shot schedule preview computed at startup: for each store, a rough
// departure/arrival estimate against its first reachable window, plus
// the delivery cost model. Planning output only; the dispatch engine
// does not read it.

use std::path::Path;

use serde::Serialize;

use crate::model::store::Store;
use crate::model::{total_quantity, Quantity};
use crate::routing::Routes;
use crate::simulation::clock::{TimeOfDay, DAY_START};

/// Preview estimate: 15 minutes per distance unit (a loaded round
/// including handling, coarser than the live 3 min/unit dispatch rate).
const PREVIEW_MINUTES_PER_UNIT: u32 = 15;

/// Unloading allowance between consecutive stops.
const UNLOAD_MINUTES: u32 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSlot {
    pub store: String,
    pub departure: TimeOfDay,
    pub arrival: TimeOfDay,
    pub products: String,
    pub distance: u32,
    pub cost: f64,
}

/// Cost model: base fee, per-unit-distance fee, a weight surcharge and a
/// time-of-day surcharge for early or late windows.
pub fn delivery_cost(distance: u32, window_start: u32, load_weight: Quantity) -> f64 {
    let base = 100.0;
    let distance_cost = f64::from(distance) * 10.0;
    let weight_cost = base * (f64::from(load_weight) / 1000.0);
    let time_cost = if window_start < 10 {
        base * 0.2
    } else if window_start > 16 {
        base * 0.3
    } else {
        0.0
    };
    let total = base + distance_cost + weight_cost + time_cost;
    (total * 100.0).round() / 100.0
}

/// Walks the stores in order, fitting each into the first window whose
/// end the estimated arrival still beats.
pub fn generate_schedule(stores: &[Store], routes: &Routes) -> Vec<ScheduleSlot> {
    let mut current = DAY_START;
    let mut slots = Vec::new();

    for store in stores {
        let distance = routes.from_warehouse(&store.name);
        let travel = PREVIEW_MINUTES_PER_UNIT * distance;
        let load_weight = total_quantity(&store.product_requirements);

        for &(start, end) in &store.delivery_windows {
            let arrival = current.plus_minutes(travel);
            if arrival.minutes_of_day() <= end * 60 {
                slots.push(ScheduleSlot {
                    store: store.name.clone(),
                    departure: current,
                    arrival,
                    products: crate::model::format_products(&store.product_requirements),
                    distance,
                    cost: delivery_cost(distance, start, load_weight),
                });
                current = arrival.plus_minutes(UNLOAD_MINUTES);
                break;
            }
        }
    }

    slots
}

pub fn write_schedule(
    file_path: impl AsRef<Path>,
    slots: &[ScheduleSlot],
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(file_path.as_ref())?;
    for slot in slots {
        wtr.serialize(slot)?;
    }
    wtr.flush()?;
    Ok(())
}
