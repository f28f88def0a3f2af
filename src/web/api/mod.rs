pub mod error;
pub mod groups;
pub mod tracking;
