use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use iced::futures::{SinkExt, Stream};
use iced::widget::{column, container, space, text};
use iced::window::{self, Mode};
use iced::{Alignment, Element, Length, Point, Size, Subscription, Task, Theme};
use once_cell::sync::OnceCell;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::overlay::Overlay;
use super::style::{self, Palette};
use crate::config::Config;
use crate::pulse::SinkState;

/// Inputs handed to the GUI before it starts. iced builds the application
/// state from a plain function, so the channel endpoints travel through a
/// process-wide cell instead of captured arguments.
struct Bridge {
    config: Config,
    updates: Mutex<Option<mpsc::UnboundedReceiver<SinkState>>>,
    shutdown: Arc<AtomicBool>,
}

static BRIDGE: OnceCell<Bridge> = OnceCell::new();

/// Must be called exactly once, before `run`.
pub fn install(
    config: Config,
    updates: mpsc::UnboundedReceiver<SinkState>,
    shutdown: Arc<AtomicBool>,
) {
    let installed = BRIDGE.set(Bridge {
        config,
        updates: Mutex::new(Some(updates)),
        shutdown,
    });
    if installed.is_err() {
        error!("osd::install called twice; keeping the first configuration");
    }
}

/// Runs the overlay event loop on the current thread until shutdown.
pub fn run() -> iced::Result {
    iced::daemon(OsdApp::new, OsdApp::update, OsdApp::view)
        .title(OsdApp::title)
        .theme(OsdApp::theme)
        .subscription(OsdApp::subscription)
        .run()
}

struct OsdWindow {
    id: window::Id,
    position: Point,
}

struct OsdApp {
    config: Config,
    palette: Palette,
    windows: Vec<OsdWindow>,
    state: Option<SinkState>,
    overlay: Overlay,
    shutdown: Arc<AtomicBool>,
}

#[derive(Debug, Clone)]
enum Message {
    WindowOpened(window::Id),
    VolumeChanged(SinkState),
    HideTimeout(u64),
    SamplerStopped,
    Shutdown,
}

impl OsdApp {
    fn new() -> (Self, Task<Message>) {
        let bridge = BRIDGE.get().expect("osd::install must run before osd::run");
        let config = bridge.config.clone();
        let palette = Palette::from_config(&config.style);

        let mut windows = Vec::new();
        let mut tasks = Vec::new();
        for position in &config.osd.positions {
            let point = Point::new(position.x, position.y);
            let (id, open) = window::open(window::Settings {
                size: Size::new(config.osd.window_width, config.osd.window_height),
                position: window::Position::Specific(point),
                visible: false,
                resizable: false,
                decorations: false,
                level: window::Level::AlwaysOnTop,
                exit_on_close_request: false,
                ..window::Settings::default()
            });
            windows.push(OsdWindow { id, position: point });
            tasks.push(open.map(Message::WindowOpened));
        }

        (
            Self {
                config,
                palette,
                windows,
                state: None,
                overlay: Overlay::new(),
                shutdown: Arc::clone(&bridge.shutdown),
            },
            Task::batch(tasks),
        )
    }

    fn title(&self, _window: window::Id) -> String {
        String::from("Volume")
    }

    fn theme(&self, _window: window::Id) -> Theme {
        Theme::Dark
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::WindowOpened(id) => {
                debug!(?id, "overlay window ready");
                Task::none()
            }
            Message::VolumeChanged(state) => {
                debug!(volume = state.volume, mute = state.mute, "showing update");
                self.state = Some(state);
                let generation = self.overlay.show();

                let mut tasks: Vec<Task<Message>> = self
                    .windows
                    .iter()
                    .flat_map(|win| {
                        [
                            window::move_to(win.id, win.position),
                            window::set_mode(win.id, Mode::Windowed),
                        ]
                    })
                    .collect();

                let timeout = self.config.osd.hide_timeout();
                tasks.push(Task::perform(tokio::time::sleep(timeout), move |_| {
                    Message::HideTimeout(generation)
                }));

                Task::batch(tasks)
            }
            Message::HideTimeout(generation) => {
                if self.overlay.hide_elapsed(generation) {
                    debug!("idle timeout, withdrawing overlay");
                    Task::batch(
                        self.windows
                            .iter()
                            .map(|win| window::set_mode(win.id, Mode::Hidden)),
                    )
                } else {
                    Task::none()
                }
            }
            Message::SamplerStopped => {
                error!("sink monitor stopped, exiting");
                self.shutdown.store(true, Ordering::Relaxed);
                iced::exit()
            }
            Message::Shutdown => {
                info!("shutdown signal received");
                self.shutdown.store(true, Ordering::Relaxed);
                iced::exit()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([Subscription::run(updates), Subscription::run(signals)])
    }

    fn view(&self, _window: window::Id) -> Element<'_, Message> {
        let state = self.state.unwrap_or(SinkState::new(0.0, false));
        let palette = self.palette;

        let glyph = text(if state.mute {
            style::MUTED_GLYPH
        } else {
            style::UNMUTED_GLYPH
        })
        .size(self.config.style.font_size)
        .color(palette.foreground);

        let label = text(state.label())
            .font(style::FONT)
            .size(self.config.style.font_size)
            .color(palette.foreground);

        container(
            column![glyph, self.view_bar(state), label]
                .spacing(8)
                .align_x(Alignment::Center),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .style(move |_theme| iced::widget::container::Style {
            background: Some(palette.background.into()),
            ..iced::widget::container::Style::default()
        })
        .into()
    }

    /// Vertical level bar: a trough with a bottom-anchored fill. The fill
    /// height is capped at the trough on screen; the underlying value is not
    /// clamped, so boosted levels simply pin the bar full.
    fn view_bar(&self, state: SinkState) -> Element<'_, Message> {
        let palette = self.palette;
        let trough = self.config.osd.bar_length;
        let fill = (trough * state.volume).clamp(0.0, trough);

        container(
            column![
                space().height(trough - fill),
                container(space())
                    .width(Length::Fill)
                    .height(fill)
                    .style(move |_theme| iced::widget::container::Style {
                        background: Some(palette.bar.into()),
                        ..iced::widget::container::Style::default()
                    }),
            ],
        )
        .width(self.config.style.bar_thickness)
        .height(trough)
        .style(move |_theme| iced::widget::container::Style {
            background: Some(palette.trough.into()),
            ..iced::widget::container::Style::default()
        })
        .into()
    }
}

/// Drains the update queue into GUI messages. When the producer side drops
/// (monitor thread stopped, fatally or otherwise) the daemon is told to exit.
fn updates() -> impl Stream<Item = Message> {
    iced::stream::channel(
        16,
        |mut output: iced::futures::channel::mpsc::Sender<Message>| async move {
        let Some(bridge) = BRIDGE.get() else {
            return;
        };
        let receiver = bridge.updates.lock().ok().and_then(|mut slot| slot.take());
        let Some(mut receiver) = receiver else {
            // Subscription restarted; the queue is already being drained.
            return;
        };

        while let Some(state) = receiver.recv().await {
            if output.send(Message::VolumeChanged(state)).await.is_err() {
                return;
            }
        }
        let _ = output.send(Message::SamplerStopped).await;
    })
}

/// SIGTERM, SIGHUP and SIGINT all funnel into the same shutdown message.
/// Repeated signals re-send it, which is harmless.
fn signals() -> impl Stream<Item = Message> {
    iced::stream::channel(
        4,
        |mut output: iced::futures::channel::mpsc::Sender<Message>| async move {
        use tokio::signal::unix::{signal, SignalKind};

        let Ok(mut terminate) = signal(SignalKind::terminate()) else {
            error!("failed to install SIGTERM handler");
            return;
        };
        let Ok(mut hangup) = signal(SignalKind::hangup()) else {
            error!("failed to install SIGHUP handler");
            return;
        };
        let Ok(mut interrupt) = signal(SignalKind::interrupt()) else {
            error!("failed to install SIGINT handler");
            return;
        };

        loop {
            tokio::select! {
                _ = terminate.recv() => {}
                _ = hangup.recv() => {}
                _ = interrupt.recv() => {}
            }
            if output.send(Message::Shutdown).await.is_err() {
                return;
            }
        }
    })
}
