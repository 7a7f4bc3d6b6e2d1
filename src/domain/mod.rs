// Domain layer: wire and canonical models plus the gateway port.

pub mod model;
pub mod ports;
