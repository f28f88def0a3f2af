mod mission;
mod observer;
mod runner;

pub use mission::{Mission, MissionError, MissionSnapshot, MissionStatus, TickReport};
pub use observer::PositionUpdate;
pub use runner::{EchoDispatcher, PositionLogger, TickLoop};
