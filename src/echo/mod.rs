mod client;
mod decode;
mod error;
mod types;

pub use client::EchoClient;
pub use decode::EchoSamples;
pub use error::EchoError;
pub use types::{EchoRequest, EchoResponse};
