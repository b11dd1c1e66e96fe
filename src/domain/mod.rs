// Domain layer: caller-facing models and ports (interfaces) over the backend SDK.

pub mod model;
pub mod ports;
