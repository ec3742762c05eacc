#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    #[error("Failed to connect to PulseAudio: {0}")]
    Connection(String),
    #[error("PulseAudio connection lost: {0}")]
    Disconnected(String),
    #[error("No default sink configured")]
    NoDefaultSink,
    #[error("Default sink vanished before it could be queried")]
    SinkVanished,
    #[error("PulseAudio operation cancelled")]
    OperationCancelled,
}

impl PulseError {
    /// Transient failures are skipped by the monitor loop; everything else
    /// tears the pipeline down.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NoDefaultSink | Self::SinkVanished)
    }
}
