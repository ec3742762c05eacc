use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use libpulse_binding::callbacks::ListResult;
use libpulse_binding::context::subscribe::InterestMaskSet;
use libpulse_binding::context::{Context, FlagSet, State};
use libpulse_binding::mainloop::standard::{IterateResult, Mainloop};
use libpulse_binding::operation::{Operation, State as OperationState};
use libpulse_binding::volume::Volume;
use tracing::debug;

use super::error::PulseError;
use super::monitor::SinkSource;
use super::state::SinkState;

/// Blocking PulseAudio client built on the standard mainloop. It lives on the
/// monitor thread and is never touched by the GUI; every query runs its
/// operation to completion by iterating the mainloop in place.
pub struct PulseClient {
    mainloop: Rc<RefCell<Mainloop>>,
    context: Rc<RefCell<Context>>,
    /// Sink-change notifications observed by the subscribe callback but not
    /// yet consumed by `wait_event`.
    pending: Rc<Cell<u32>>,
}

impl PulseClient {
    /// Connects to the server under the given client name and waits for the
    /// context handshake to finish.
    pub fn connect(client_name: &str) -> Result<Self, PulseError> {
        let mainloop = Rc::new(RefCell::new(Mainloop::new().ok_or_else(|| {
            PulseError::Connection("mainloop allocation failed".to_string())
        })?));

        let context = Rc::new(RefCell::new(
            Context::new(&*mainloop.borrow(), client_name).ok_or_else(|| {
                PulseError::Connection("context allocation failed".to_string())
            })?,
        ));

        context
            .borrow_mut()
            .connect(None, FlagSet::NOFLAGS, None)
            .map_err(|e| PulseError::Connection(format!("{e}")))?;

        let client = Self {
            mainloop,
            context,
            pending: Rc::new(Cell::new(0)),
        };

        loop {
            client.iterate()?;
            match client.context.borrow().get_state() {
                State::Ready => break,
                State::Failed | State::Terminated => {
                    return Err(PulseError::Connection(
                        "context failed during handshake".to_string(),
                    ));
                }
                _ => {}
            }
        }

        debug!(client_name, "connected to PulseAudio");
        Ok(client)
    }

    /// Registers interest in sink-facility change events. Each notification
    /// bumps a counter that `wait_event` drains.
    pub fn subscribe(&self) -> Result<(), PulseError> {
        let pending = Rc::clone(&self.pending);
        self.context
            .borrow_mut()
            .set_subscribe_callback(Some(Box::new(move |_facility, _operation, _index| {
                pending.set(pending.get().saturating_add(1));
            })));

        let op = self
            .context
            .borrow_mut()
            .subscribe(InterestMaskSet::SINK, |_success| {});
        self.wait_for(op)
    }

    /// Blocks until at least one sink-change event arrived (`true`) or the
    /// shutdown flag was observed (`false`). The flag is cooperative: it is
    /// only checked between mainloop wakeups, so a signal may leave this
    /// thread parked until process teardown reaps it.
    pub fn wait_event(&self, shutdown: &AtomicBool) -> Result<bool, PulseError> {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(false);
            }
            if self.pending.get() > 0 {
                self.pending.set(self.pending.get() - 1);
                return Ok(true);
            }
            self.iterate()?;
        }
    }

    /// Fetches the current state of the default sink.
    ///
    /// Returns `SinkVanished` when the sink named by the server no longer
    /// resolves, which happens when the default sink is removed or replaced
    /// between the change event and this query.
    pub fn sink_state(&self) -> Result<SinkState, PulseError> {
        let name = self.default_sink_name()?;

        let introspect = self.context.borrow().introspect();
        let result = Rc::new(RefCell::new(None));
        let failed = Rc::new(Cell::new(false));

        let cb_result = Rc::clone(&result);
        let cb_failed = Rc::clone(&failed);
        let op = introspect.get_sink_info_by_name(&name, move |list| match list {
            ListResult::Item(sink) => {
                let volume = sink.volume.avg().0 as f32 / Volume::NORMAL.0 as f32;
                *cb_result.borrow_mut() = Some(SinkState::new(volume, sink.mute));
            }
            ListResult::End => {}
            ListResult::Error => cb_failed.set(true),
        });
        self.wait_for(op)?;

        if failed.get() {
            return Err(PulseError::SinkVanished);
        }
        let state = result.borrow_mut().take();
        state.ok_or(PulseError::SinkVanished)
    }

    fn default_sink_name(&self) -> Result<String, PulseError> {
        let introspect = self.context.borrow().introspect();
        let result = Rc::new(RefCell::new(None));

        let cb_result = Rc::clone(&result);
        let op = introspect.get_server_info(move |info| {
            *cb_result.borrow_mut() = info
                .default_sink_name
                .as_ref()
                .map(|name| name.to_string());
        });
        self.wait_for(op)?;

        let name = result.borrow_mut().take();
        name.ok_or(PulseError::NoDefaultSink)
    }

    fn wait_for<F: ?Sized>(&self, op: Operation<F>) -> Result<(), PulseError> {
        loop {
            match op.get_state() {
                OperationState::Done => return Ok(()),
                OperationState::Cancelled => return Err(PulseError::OperationCancelled),
                OperationState::Running => self.iterate()?,
            }
        }
    }

    fn iterate(&self) -> Result<(), PulseError> {
        match self.mainloop.borrow_mut().iterate(true) {
            IterateResult::Success(_) => Ok(()),
            IterateResult::Quit(_) => Err(PulseError::Disconnected("mainloop quit".to_string())),
            IterateResult::Err(e) => Err(PulseError::Disconnected(format!("{e}"))),
        }
    }
}

impl Drop for PulseClient {
    fn drop(&mut self) {
        self.context.borrow_mut().disconnect();
    }
}

impl SinkSource for PulseClient {
    fn sink_state(&mut self) -> Result<SinkState, PulseError> {
        PulseClient::sink_state(self)
    }

    fn wait_event(&mut self, shutdown: &AtomicBool) -> Result<bool, PulseError> {
        PulseClient::wait_event(self, shutdown)
    }
}
