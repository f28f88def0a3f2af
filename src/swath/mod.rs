mod geometry;
mod group;
mod instance;

pub use geometry::{corners, offset_from_center, LonLat, SwathGeometry, EARTH_RADIUS_M};
pub use group::{SwathGroup, SwathGroupManager, SyncReport};
pub use instance::{SwathInstance, SwathManager, SwathMode, VisualizationOptions};
