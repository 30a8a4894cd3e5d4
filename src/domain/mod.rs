// Domain layer: core models and ports (interfaces). No HTTP or runtime dependencies here.

pub mod jurisdiction;
pub mod model;
pub mod ports;
