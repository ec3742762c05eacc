pub mod config;
pub mod osd;
pub mod pulse;

pub use config::{Config, OsdConfig, PulseConfig, StyleConfig, WindowPosition};
pub use pulse::{PulseClient, PulseError, SinkMonitor, SinkSource, SinkState};
