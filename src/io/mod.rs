pub mod events;
pub mod reporting;
pub mod schedule;
