use crate::config::TransportConfig;
use crate::transport::Transport;
use crate::types::{Command, DispatchResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Transport double: replays scripted outcomes and remembers what it was asked.
#[derive(Default)]
pub struct ScriptedTransport {
    probes: Mutex<VecDeque<bool>>,
    last_probe: Mutex<bool>,
    send_results: Mutex<VecDeque<DispatchResult>>,
    sent: Mutex<Vec<Command>>,
    probe_count: Mutex<usize>,
    probed_urls: Mutex<Vec<String>>,
    send_delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_probes(outcomes: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            probes: Mutex::new(outcomes.iter().copied().collect()),
            ..Self::default()
        })
    }

    pub fn with_send_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            send_delay: Some(delay),
            ..Self::default()
        })
    }

    /// Queue the result of the next send. Sends without a queued result succeed.
    pub fn push_send_result(&self, result: DispatchResult) {
        self.send_results.lock().push_back(result);
    }

    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().clone()
    }

    pub fn probe_count(&self) -> usize {
        *self.probe_count.lock()
    }

    /// Health URLs probed so far, in order.
    pub fn probed_urls(&self) -> Vec<String> {
        self.probed_urls.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, command: &Command, _config: &TransportConfig) -> DispatchResult {
        self.sent.lock().push(command.clone());
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.send_results.lock().pop_front();
        scripted.unwrap_or_else(|| DispatchResult::sent("ok"))
    }

    /// Once the script runs out, the last outcome repeats.
    async fn probe(&self, config: &TransportConfig) -> bool {
        *self.probe_count.lock() += 1;
        self.probed_urls.lock().push(config.health_url.clone());
        let next = self.probes.lock().pop_front();
        let mut last = self.last_probe.lock();
        if let Some(outcome) = next {
            *last = outcome;
        }
        *last
    }
}
