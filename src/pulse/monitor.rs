use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::error::PulseError;
use super::state::SinkState;
use crate::config::PulseConfig;

/// The slice of the audio server the monitor loop needs: a state query and a
/// blocking wait for the next sink-change event. `PulseClient` is the real
/// implementation; tests script their own.
pub trait SinkSource {
    fn sink_state(&mut self) -> Result<SinkState, PulseError>;

    /// `Ok(true)` when an event arrived, `Ok(false)` when shutdown was
    /// requested.
    fn wait_event(&mut self, shutdown: &AtomicBool) -> Result<bool, PulseError>;
}

/// Watches the default sink and pushes every meaningful state transition into
/// the update queue. Change events are re-sampled and diffed against the last
/// observed state, so high-frequency or unrelated sink events collapse into
/// nothing.
pub struct SinkMonitor<S> {
    source: S,
    updates: mpsc::UnboundedSender<SinkState>,
    shutdown: Arc<AtomicBool>,
}

impl<S: SinkSource> SinkMonitor<S> {
    pub fn new(
        source: S,
        updates: mpsc::UnboundedSender<SinkState>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            updates,
            shutdown,
        }
    }

    /// Runs until shutdown is requested, the consumer goes away, or a fatal
    /// error occurs. Transient lookup failures (sink vanished mid-query, no
    /// default sink) drop the event and keep the loop alive.
    pub fn run(mut self) -> Result<(), PulseError> {
        let mut last = loop {
            match self.source.sink_state() {
                Ok(state) => break state,
                Err(e) if e.is_transient() => {
                    debug!("initial sink lookup failed: {e}");
                    if !self.source.wait_event(&self.shutdown)? {
                        return Ok(());
                    }
                }
                Err(e) => return Err(e),
            }
        };
        debug!(volume = last.volume, mute = last.mute, "initial sink state");

        while self.source.wait_event(&self.shutdown)? {
            let state = match self.source.sink_state() {
                Ok(state) => state,
                Err(e) if e.is_transient() => {
                    debug!("skipping sink event: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if state != last {
                debug!(volume = state.volume, mute = state.mute, "sink state changed");
                if self.updates.send(state).is_err() {
                    // Consumer hung up; nothing left to display to.
                    return Ok(());
                }
                last = state;
            }
        }

        Ok(())
    }
}

/// Spawns the monitor on its own thread: connect, subscribe, loop. The GUI
/// learns about a fatal stop by the sender side of the queue dropping.
pub fn spawn(
    config: PulseConfig,
    updates: mpsc::UnboundedSender<SinkState>,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("pulse-monitor".to_string())
        .spawn(move || {
            if let Err(e) = listen(&config, updates, shutdown) {
                error!("sink monitor stopped: {e}");
            }
        })
        .expect("Failed to spawn pulse-monitor thread")
}

fn listen(
    config: &PulseConfig,
    updates: mpsc::UnboundedSender<SinkState>,
    shutdown: Arc<AtomicBool>,
) -> Result<(), PulseError> {
    let client = super::client::PulseClient::connect(&config.client_name)?;
    client.subscribe()?;
    info!(client = %config.client_name, "listening for sink changes");
    SinkMonitor::new(client, updates, shutdown).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::Ordering;

    /// Plays back a fixed list of sample results; the first one answers the
    /// initial query, the rest are delivered one per change event.
    struct ScriptedSource {
        samples: VecDeque<Result<SinkState, PulseError>>,
    }

    impl ScriptedSource {
        fn new(samples: Vec<Result<SinkState, PulseError>>) -> Self {
            Self {
                samples: samples.into(),
            }
        }
    }

    impl SinkSource for ScriptedSource {
        fn sink_state(&mut self) -> Result<SinkState, PulseError> {
            self.samples
                .pop_front()
                .unwrap_or(Err(PulseError::Disconnected("script exhausted".into())))
        }

        fn wait_event(&mut self, shutdown: &AtomicBool) -> Result<bool, PulseError> {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(false);
            }
            Ok(!self.samples.is_empty())
        }
    }

    fn run_with(samples: Vec<Result<SinkState, PulseError>>) -> (Result<(), PulseError>, Vec<SinkState>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let result = SinkMonitor::new(ScriptedSource::new(samples), tx, shutdown).run();

        let mut sent = Vec::new();
        while let Ok(state) = rx.try_recv() {
            sent.push(state);
        }
        (result, sent)
    }

    #[test]
    fn test_duplicate_states_are_not_enqueued() {
        let (result, sent) = run_with(vec![
            Ok(SinkState::new(0.50, false)),
            Ok(SinkState::new(0.65, false)),
            Ok(SinkState::new(0.65, false)),
            Ok(SinkState::new(1.2, false)),
        ]);

        assert!(result.is_ok());
        assert_eq!(sent, vec![SinkState::new(0.65, false), SinkState::new(1.2, false)]);
    }

    #[test]
    fn test_updates_preserve_detection_order() {
        let (result, sent) = run_with(vec![
            Ok(SinkState::new(0.10, false)),
            Ok(SinkState::new(0.20, false)),
            Ok(SinkState::new(0.30, false)),
            Ok(SinkState::new(0.30, true)),
            Ok(SinkState::new(0.15, true)),
        ]);

        assert!(result.is_ok());
        assert_eq!(
            sent,
            vec![
                SinkState::new(0.20, false),
                SinkState::new(0.30, false),
                SinkState::new(0.30, true),
                SinkState::new(0.15, true),
            ]
        );
    }

    #[test]
    fn test_mute_toggle_alone_is_a_transition() {
        let (result, sent) = run_with(vec![
            Ok(SinkState::new(0.50, false)),
            Ok(SinkState::new(0.50, true)),
        ]);

        assert!(result.is_ok());
        assert_eq!(sent, vec![SinkState::new(0.50, true)]);
    }

    #[test]
    fn test_vanished_sink_is_skipped_silently() {
        let (result, sent) = run_with(vec![
            Ok(SinkState::new(0.50, false)),
            Err(PulseError::SinkVanished),
            Ok(SinkState::new(0.50, false)),
        ]);

        assert!(result.is_ok());
        assert!(sent.is_empty());
    }

    #[test]
    fn test_vanished_then_changed_still_delivers() {
        let (result, sent) = run_with(vec![
            Ok(SinkState::new(0.50, false)),
            Err(PulseError::NoDefaultSink),
            Ok(SinkState::new(0.65, false)),
        ]);

        assert!(result.is_ok());
        assert_eq!(sent, vec![SinkState::new(0.65, false)]);
    }

    #[test]
    fn test_fatal_error_stops_the_loop() {
        let (result, sent) = run_with(vec![
            Ok(SinkState::new(0.50, false)),
            Err(PulseError::Disconnected("server gone".into())),
        ]);

        assert!(result.is_err());
        assert!(sent.is_empty());
    }

    #[test]
    fn test_transient_failure_before_initial_state() {
        let (result, sent) = run_with(vec![
            Err(PulseError::NoDefaultSink),
            Ok(SinkState::new(0.50, false)),
            Ok(SinkState::new(0.65, false)),
        ]);

        assert!(result.is_ok());
        assert_eq!(sent, vec![SinkState::new(0.65, false)]);
    }

    #[test]
    fn test_shutdown_requested_exits_cleanly() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(true));
        let source = ScriptedSource::new(vec![
            Ok(SinkState::new(0.50, false)),
            Ok(SinkState::new(0.65, false)),
        ]);

        let result = SinkMonitor::new(source, tx, shutdown).run();

        assert!(result.is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_consumer_receives_updates_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource::new(vec![
            Ok(SinkState::new(0.50, false)),
            Ok(SinkState::new(0.65, false)),
            Ok(SinkState::new(1.2, false)),
        ]);

        SinkMonitor::new(source, tx, shutdown).run().unwrap();

        assert_eq!(rx.recv().await, Some(SinkState::new(0.65, false)));
        assert_eq!(rx.recv().await, Some(SinkState::new(1.2, false)));
        assert_eq!(rx.recv().await, None);
    }
}
