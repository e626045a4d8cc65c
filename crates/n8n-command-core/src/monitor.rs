use crate::config::{ConfigProvider, TransportConfig};
use crate::transport::Transport;
use crate::types::{ConnectivityState, CoreEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(90);

/// Hard cap on a single probe, on top of the transport's own timeout.
const PROBE_GRACE: Duration = Duration::from_secs(2);

/// What one probe outcome means for the reported state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// First outcome after start: `Unknown` settled into a real state.
    Established(ConnectivityState),
    /// Flipped between connected and disconnected.
    Changed {
        from: ConnectivityState,
        to: ConnectivityState,
    },
    /// Same as last reported.
    Unchanged,
}

/// Debounces raw probe outcomes into reportable transitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectivityTracker {
    last_reported: ConnectivityState,
}

impl ConnectivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectivityState {
        self.last_reported
    }

    pub fn observe(&mut self, probe_ok: bool) -> Observation {
        let current = ConnectivityState::from_probe(probe_ok);
        let previous = self.last_reported;
        if current == previous {
            return Observation::Unchanged;
        }
        self.last_reported = current;
        if previous == ConnectivityState::Unknown {
            Observation::Established(current)
        } else {
            Observation::Changed {
                from: previous,
                to: current,
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_reported = ConnectivityState::Unknown;
    }
}

struct MonitorState {
    tracker: ConnectivityTracker,
    stopped: bool,
}

/// Polls the health endpoint on a background task.
///
/// Probes once right away, then every `interval`. The transport config is
/// read from the provider on every tick, so a changed URL is picked up by the
/// next probe. A failed probe, or a config that no longer resolves, counts as
/// disconnected and polling carries on. After [`stop`](Self::stop) returns,
/// no further event is emitted.
pub struct ConnectivityMonitor {
    state: Arc<Mutex<MonitorState>>,
    abort_handle: Option<tokio::task::AbortHandle>,
}

impl ConnectivityMonitor {
    /// Spawn the polling task. A zero `interval` starts nothing and returns a
    /// monitor that is not running.
    pub fn start(
        transport: Arc<dyn Transport>,
        provider: Arc<dyn ConfigProvider>,
        interval: Duration,
        runtime: &tokio::runtime::Handle,
        event_tx: async_channel::Sender<CoreEvent>,
    ) -> Self {
        let state = Arc::new(Mutex::new(MonitorState {
            tracker: ConnectivityTracker::new(),
            stopped: false,
        }));

        if interval.is_zero() {
            log::warn!("Poll interval is zero, connectivity monitor not started");
            state.lock().stopped = true;
            return Self {
                state,
                abort_handle: None,
            };
        }

        let task_state = state.clone();
        log::info!("Checking n8n health every {}s", interval.as_secs());

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let ok = match TransportConfig::from_provider(&*provider) {
                    Ok(config) => {
                        let probe_limit = config.timeout + PROBE_GRACE;
                        tokio::time::timeout(probe_limit, transport.probe(&config))
                            .await
                            .unwrap_or(false)
                    }
                    Err(e) => {
                        log::debug!("Skipping health check: {}", e);
                        false
                    }
                };

                // Observe and emit under the lock so stop() cannot interleave.
                let mut guard = task_state.lock();
                if guard.stopped {
                    break;
                }
                let event = match guard.tracker.observe(ok) {
                    Observation::Unchanged => continue,
                    Observation::Established(state) => {
                        log::info!("n8n backend is {}", state);
                        CoreEvent::ConnectivityEstablished(state)
                    }
                    Observation::Changed { from, to } => {
                        log::info!("n8n backend went from {} to {}", from, to);
                        CoreEvent::ConnectivityChanged { from, to }
                    }
                };
                match event_tx.try_send(event) {
                    Ok(()) => {}
                    Err(async_channel::TrySendError::Full(_)) => {
                        log::warn!("Event queue full, dropping connectivity event");
                    }
                    Err(async_channel::TrySendError::Closed(_)) => {
                        log::debug!("Event receiver gone, stopping connectivity monitor");
                        break;
                    }
                }
            }
        });

        Self {
            state,
            abort_handle: Some(task.abort_handle()),
        }
    }

    /// Last state surfaced to the UI.
    pub fn state(&self) -> ConnectivityState {
        self.state.lock().tracker.state()
    }

    pub fn is_running(&self) -> bool {
        self.abort_handle.is_some()
    }

    /// Cancel polling. Safe to call repeatedly and while a probe is in flight.
    pub fn stop(&mut self) {
        let Some(handle) = self.abort_handle.take() else {
            return;
        };
        self.state.lock().stopped = true;
        handle.abort();
        log::info!("Connectivity monitor stopped");
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
