mod accumulator;
mod grid;

pub use accumulator::{
    calculate_batch_size, calculate_batch_time, merge_geometries, Pulse, PulseBatchAccumulator,
};
pub use grid::{to_targets, GridSettings, PointTarget};
