pub mod error;
pub mod io;
pub mod model;
pub mod net;
pub mod routing;
pub mod simulation;
pub mod strategy;
