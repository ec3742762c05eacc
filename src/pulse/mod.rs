pub mod client;
pub mod error;
pub mod monitor;
pub mod state;

pub use client::PulseClient;
pub use error::PulseError;
pub use monitor::{SinkMonitor, SinkSource};
pub use state::SinkState;
