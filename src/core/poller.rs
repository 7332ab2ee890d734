/// Poll loop: fetch, render, wait, repeat
///
/// One cycle runs at a time. The wait before the next cycle starts only after
/// the previous cycle finished, and its length is read from the settings at
/// that moment, so an interval change never shortens or extends a wait that
/// is already pending. Errors end the cycle, never the loop.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use super::client::MeasurementSource;
use super::error::PollError;
use super::measurement::NUM_OF_CHANNELS_TO_DISPLAY;
use super::view::{channel_views, render_measurements, ChannelView, ViewBatch};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2500);
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// When off, cycles are still scheduled but skip the fetch
    pub live_update: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            live_update: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
}

/// Progress reported to whoever owns the views
#[derive(Debug)]
pub enum PollEvent {
    Started,
    Updated {
        views: ViewBatch,
        at: DateTime<Local>,
    },
    Failed {
        error: String,
        at: DateTime<Local>,
    },
    /// Live update was off for this tick
    Skipped,
}

impl PollEvent {
    pub fn state(&self) -> PollState {
        match self {
            PollEvent::Started => PollState::Polling,
            _ => PollState::Idle,
        }
    }
}

/// Controls a running [`Poller`]. Dropping every handle stops the loop at
/// its next wait.
#[derive(Clone)]
pub struct PollerHandle {
    settings: Arc<watch::Sender<PollSettings>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl PollerHandle {
    pub fn settings(&self) -> PollSettings {
        *self.settings.borrow()
    }

    /// Applies from the next scheduled wait; the pending one is left alone
    pub fn set_interval(&self, interval: Duration) {
        let interval = interval.max(MIN_INTERVAL);
        self.settings.send_modify(|s| s.interval = interval);
        info!(interval_ms = interval.as_millis() as u64, "Polling interval changed");
    }

    pub fn set_live_update(&self, enabled: bool) {
        self.settings.send_modify(|s| s.live_update = enabled);
        info!(enabled, "Live update toggled");
    }

    pub fn toggle_live_update(&self) -> bool {
        let enabled = !self.settings().live_update;
        self.set_live_update(enabled);
        enabled
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

pub struct Poller<S> {
    source: S,
    views: [ChannelView; NUM_OF_CHANNELS_TO_DISPLAY],
    settings: watch::Receiver<PollSettings>,
    shutdown: watch::Receiver<bool>,
    events: mpsc::UnboundedSender<PollEvent>,
}

impl<S: MeasurementSource> Poller<S> {
    pub fn new(
        source: S,
        settings: PollSettings,
        events: mpsc::UnboundedSender<PollEvent>,
    ) -> (Self, PollerHandle) {
        let (settings_tx, settings_rx) = watch::channel(settings);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let poller = Self {
            source,
            views: channel_views(),
            settings: settings_rx,
            shutdown: shutdown_rx,
            events,
        };
        let handle = PollerHandle {
            settings: Arc::new(settings_tx),
            shutdown: Arc::new(shutdown_tx),
        };

        (poller, handle)
    }

    /// Fetch one frame and render both views into a batch
    pub async fn fetch_and_render(&self) -> Result<ViewBatch, PollError> {
        let frame = self.source.fetch_measurements().await?;
        debug!(channels = frame.len(), "Measurements received");

        let mut batch = ViewBatch::default();
        render_measurements(&frame, &self.views, &mut batch)?;
        Ok(batch)
    }

    /// One cycle. Failures are logged and reported, not returned.
    pub async fn poll_cycle(&self) -> bool {
        self.emit(PollEvent::Started);

        match self.fetch_and_render().await {
            Ok(views) => {
                if views.is_empty() {
                    debug!("No channel has been measured yet");
                } else {
                    debug!(writes = views.len(), "Views rendered");
                }
                self.emit(PollEvent::Updated {
                    views,
                    at: Local::now(),
                });
                true
            }
            Err(e) => {
                error!(network = e.is_network(), "{}", e);
                self.emit(PollEvent::Failed {
                    error: e.to_string(),
                    at: Local::now(),
                });
                false
            }
        }
    }

    /// Wait before the next cycle; false once shutdown was requested
    async fn schedule_next_poll(&mut self, interval: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(interval) => true,
            _ = self.shutdown.changed() => false,
        }
    }

    fn running(&self) -> bool {
        !*self.shutdown.borrow()
    }

    /// Immediate first poll, then one cycle per interval until shutdown
    pub async fn run(mut self) {
        let settings = *self.settings.borrow();
        info!(
            interval_ms = settings.interval.as_millis() as u64,
            live_update = settings.live_update,
            "Poller started"
        );

        self.poll_cycle().await;

        while self.running() {
            let interval = self.settings.borrow().interval;
            if !self.schedule_next_poll(interval).await {
                break;
            }

            if self.settings.borrow().live_update {
                self.poll_cycle().await;
            } else {
                debug!("Live update off, skipping fetch");
                self.emit(PollEvent::Skipped);
            }
        }

        info!("Poller stopped");
    }

    fn emit(&self, event: PollEvent) {
        // Receiver gone means nobody is watching; keep polling regardless
        let _ = self.events.send(event);
    }
}
