use crate::config::{ConfigProvider, TransportConfig};
use crate::dispatcher::{Dispatcher, HistoryPolicy};
use crate::history::{DEFAULT_HISTORY_CAPACITY, HistoryRing};
use crate::monitor::{ConnectivityMonitor, DEFAULT_POLL_INTERVAL};
use crate::transport::Transport;
use crate::types::{Command, ConnectivityState, CoreEvent, DispatchResult};
use std::sync::Arc;
use std::time::Duration;

/// Knobs the host picks when enabling a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub history_capacity: usize,
    pub history_policy: HistoryPolicy,
    pub poll_interval: Duration,
    /// Start the connectivity monitor on enable.
    pub monitor: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_policy: HistoryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            monitor: true,
        }
    }
}

/// Everything that lives between the host's enable and disable.
///
/// Created by [`Session::enable`]; [`Session::disable`] (or dropping it)
/// stops the monitor, discards late results, empties the history and closes
/// the event channel.
pub struct Session {
    dispatcher: Dispatcher,
    monitor: Option<ConnectivityMonitor>,
    event_tx: async_channel::Sender<CoreEvent>,
    enabled: bool,
}

impl Session {
    pub fn enable(
        provider: Arc<dyn ConfigProvider>,
        transport: Arc<dyn Transport>,
        options: SessionOptions,
        runtime: &tokio::runtime::Handle,
    ) -> (Self, async_channel::Receiver<CoreEvent>) {
        let (event_tx, event_rx) = async_channel::unbounded();
        let history = Arc::new(HistoryRing::new(options.history_capacity));

        let monitor = if options.monitor {
            match TransportConfig::from_provider(&*provider) {
                Ok(_) => Some(ConnectivityMonitor::start(
                    transport.clone(),
                    provider.clone(),
                    options.poll_interval,
                    runtime,
                    event_tx.clone(),
                )),
                Err(e) => {
                    log::warn!("Connectivity monitor not started: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let dispatcher = Dispatcher::new(
            provider,
            transport,
            history,
            options.history_policy,
            Some(event_tx.clone()),
        );

        log::info!(
            "Session enabled (history {} entries, {:?})",
            options.history_capacity.max(1),
            options.history_policy
        );

        (
            Self {
                dispatcher,
                monitor,
                event_tx,
                enabled: true,
            },
            event_rx,
        )
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// "User submitted text" callback.
    pub async fn send(&self, raw: &str) -> DispatchResult {
        self.dispatcher.send(raw).await
    }

    /// "History item selected" callback.
    pub async fn resend(&self, index: usize) -> Option<DispatchResult> {
        self.dispatcher.resend(index).await
    }

    pub fn history(&self) -> Vec<Command> {
        self.dispatcher.history().list()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.monitor
            .as_ref()
            .map(ConnectivityMonitor::state)
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Tear down. Safe to call more than once.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;

        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop();
        }
        self.dispatcher.close();
        self.dispatcher.history().clear();
        self.event_tx.close();

        log::info!("Session disabled");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disable();
    }
}
