use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trimmed, non-empty command string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Command(String);

impl Command {
    /// Trim `raw` and reject it if nothing is left.
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DispatchError::EmptyCommand);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Command {
    type Error = DispatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Command::parse(&value)
    }
}

impl From<Command> for String {
    fn from(command: Command) -> Self {
        command.0
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a single send attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The webhook accepted the command (2xx).
    Sent,
    /// Nothing to send; the input was empty.
    Skipped,
    /// The request was attempted and failed.
    Failed,
    /// The request was never attempted because the config is unusable.
    Misconfigured,
}

/// Result of one send attempt, ready for the UI to render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub outcome: DispatchOutcome,
    /// Response body on success, diagnostic text otherwise.
    pub message: String,
    /// The command this result belongs to. `None` when skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
}

impl DispatchResult {
    pub fn sent(message: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Sent,
            message: message.into(),
            command: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            outcome: DispatchOutcome::Skipped,
            message: String::new(),
            command: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Failed,
            message: message.into(),
            command: None,
        }
    }

    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self {
            outcome: DispatchOutcome::Misconfigured,
            message: message.into(),
            command: None,
        }
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == DispatchOutcome::Sent
    }

    pub fn is_skipped(&self) -> bool {
        self.outcome == DispatchOutcome::Skipped
    }
}

impl From<DispatchError> for DispatchResult {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::EmptyCommand => DispatchResult::skipped(),
            ref e if e.is_config() => DispatchResult::misconfigured(e.to_string()),
            e => DispatchResult::failed(e.diagnostic()),
        }
    }
}

/// Backend reachability as last reported to the UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// No probe has completed yet.
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectivityState {
    pub fn from_probe(ok: bool) -> Self {
        if ok {
            ConnectivityState::Connected
        } else {
            ConnectivityState::Disconnected
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ConnectivityState::Unknown => "Unknown",
            ConnectivityState::Connected => "Connected",
            ConnectivityState::Disconnected => "Disconnected",
        }
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Event sent from the core to the UI thread via async_channel.
#[derive(Clone, Debug, PartialEq)]
pub enum CoreEvent {
    /// A send attempt finished (sent, failed or misconfigured)
    DispatchComplete(DispatchResult),
    /// First probe after enable settled the connectivity state
    ConnectivityEstablished(ConnectivityState),
    /// Backend flipped between connected and disconnected
    ConnectivityChanged {
        from: ConnectivityState,
        to: ConnectivityState,
    },
    /// History contents after a record, oldest first
    HistoryChanged(Vec<Command>),
}
