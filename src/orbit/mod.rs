mod catalog;
mod error;
pub mod frames;
mod heading;
mod parsing;
mod propagator;
mod smoother;
mod types;

pub use catalog::TleCatalog;
pub use error::OrbitError;
pub use heading::HeadingCalculator;
pub use propagator::{OrbitPropagator, OrbitSource, TleOrbit};
pub use smoother::PositionSmoother;
pub use types::{GeodeticPosition, SatelliteState};

#[cfg(test)]
pub(crate) use propagator::tests as fixtures;
