use crate::config::{ConfigProvider, TransportConfig};
use crate::history::HistoryRing;
use crate::transport::Transport;
use crate::types::{Command, CoreEvent, DispatchResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which send attempts end up in the history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Every attempt that reached the transport, successful or not.
    #[default]
    RecordAll,
    /// Only commands the webhook accepted.
    SuccessOnly,
}

impl HistoryPolicy {
    pub fn should_record(self, result: &DispatchResult) -> bool {
        match self {
            HistoryPolicy::RecordAll => true,
            HistoryPolicy::SuccessOnly => result.is_ok(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "record_all" => Some(HistoryPolicy::RecordAll),
            "success" | "success_only" => Some(HistoryPolicy::SuccessOnly),
            _ => None,
        }
    }
}

struct Inner {
    provider: Arc<dyn ConfigProvider>,
    transport: Arc<dyn Transport>,
    history: Arc<HistoryRing>,
    policy: HistoryPolicy,
    event_tx: Option<async_channel::Sender<CoreEvent>>,
    /// Cleared on close. Held for reading while a result is being applied.
    open: RwLock<bool>,
}

/// Validates, sends and records one command per call.
///
/// Cheap to clone; clones share the history and the event channel. Calls may
/// overlap: history order then follows completion order.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn ConfigProvider>,
        transport: Arc<dyn Transport>,
        history: Arc<HistoryRing>,
        policy: HistoryPolicy,
        event_tx: Option<async_channel::Sender<CoreEvent>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                transport,
                history,
                policy,
                event_tx,
                open: RwLock::new(true),
            }),
        }
    }

    pub fn history(&self) -> &Arc<HistoryRing> {
        &self.inner.history
    }

    pub fn policy(&self) -> HistoryPolicy {
        self.inner.policy
    }

    /// Send the user's raw input.
    ///
    /// Blank input is skipped without touching the transport, the history or
    /// the event channel.
    pub async fn send(&self, raw: &str) -> DispatchResult {
        match Command::parse(raw) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => {
                log::debug!("Skipping dispatch: {}", e);
                e.into()
            }
        }
    }

    /// Send the history entry at `index` (oldest first) again.
    pub async fn resend(&self, index: usize) -> Option<DispatchResult> {
        let command = self.inner.history.get(index)?;
        Some(self.dispatch(command).await)
    }

    /// Stop dispatching. Later calls are skipped without reaching the
    /// transport. Calls still in flight return their result to the caller but
    /// no longer record or emit anything.
    pub fn close(&self) {
        *self.inner.open.write() = false;
    }

    pub fn is_open(&self) -> bool {
        *self.inner.open.read()
    }

    async fn dispatch(&self, command: Command) -> DispatchResult {
        if !self.is_open() {
            log::debug!("Session closed, not sending '{}'", command);
            return DispatchResult::skipped().with_command(command);
        }

        let config = match TransportConfig::from_provider(&*self.inner.provider) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Not sending '{}': {}", command, e);
                let result = DispatchResult::from(e).with_command(command);
                if self.is_open() {
                    self.emit(CoreEvent::DispatchComplete(result.clone()));
                }
                return result;
            }
        };

        log::debug!("Dispatching '{}' to {}", command, config.url);
        let result = self
            .inner
            .transport
            .send(&command, &config)
            .await
            .with_command(command.clone());

        self.apply(command, &result);
        result
    }

    fn apply(&self, command: Command, result: &DispatchResult) {
        let open = self.inner.open.read();
        if !*open {
            log::debug!("Session closed, discarding result for '{}'", command);
            return;
        }

        if self.inner.policy.should_record(result) {
            let snapshot = self.inner.history.record(command);
            self.emit(CoreEvent::HistoryChanged(snapshot));
        }
        self.emit(CoreEvent::DispatchComplete(result.clone()));
    }

    fn emit(&self, event: CoreEvent) {
        if let Some(tx) = &self.inner.event_tx {
            if tx.try_send(event).is_err() {
                log::debug!("Event receiver unavailable, dropping dispatch event");
            }
        }
    }
}
