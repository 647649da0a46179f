// Domain layer: value types, the distance function and the ports the adapters implement.

pub mod coordinate;
pub mod distance;
pub mod model;
pub mod ports;
