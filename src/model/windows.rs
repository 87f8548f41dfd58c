// src/model/windows.rs

use crate::simulation::clock::TimeOfDay;

/// Half-open hour range `[start, end)` during which a store accepts
/// deliveries.
pub type DeliveryWindow = (u32, u32);

/// True iff `hour` falls inside any window. Used for the hand-off check
/// at the moment a vehicle actually arrives.
pub fn can_accept(windows: &[DeliveryWindow], hour: u32) -> bool {
    windows.iter().any(|&(start, end)| start <= hour && hour < end)
}

/// As `can_accept`, plus the grace rule: an arrival in the hour
/// immediately before a window opens is accepted if the arrival minute
/// is >= 45, i.e. within 15 minutes of opening. A vehicle already in
/// transit should not be deferred over a few minutes of misalignment.
pub fn can_accept_at(windows: &[DeliveryWindow], arrival: TimeOfDay) -> bool {
    let hour = arrival.hour();
    for &(start, end) in windows {
        if start <= hour && hour < end {
            return true;
        }
        if start > 0 && hour == start - 1 && arrival.minute() >= 45 {
            return true;
        }
    }
    false
}
