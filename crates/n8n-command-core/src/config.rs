use crate::error::DispatchError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Webhook URL key.
pub const KEY_URL: &str = "n8n-url";
/// Whether pressing Enter in the entry sends the command.
pub const KEY_SEND_ON_ENTER: &str = "send-on-enter";
/// Panel button color as `#rgb` or `#rrggbb`.
pub const KEY_BUTTON_COLOR: &str = "button-color";
/// Whether a notification is shown after a successful send.
pub const KEY_SHOW_SEND_NOTIFY: &str = "show-send-notify";
/// JSON field name carrying the command (`text` or `cmd`).
pub const KEY_PAYLOAD_FIELD: &str = "payload-field";
/// Transport strategy (`http`, `curl` or `shell`).
pub const KEY_TRANSPORT: &str = "transport";

pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5678/webhook/command-input";
pub const DEFAULT_BUTTON_COLOR: &str = "#3584e4";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CURL_PROGRAM: &str = "curl";

/// Read-only access to the host's settings store.
///
/// Returns `None` for keys the store does not know about; callers fall back
/// to their defaults.
pub trait ConfigProvider: Send + Sync + 'static {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

#[derive(Clone, Debug)]
enum ConfigValue {
    Str(String),
    Bool(bool),
}

/// In-memory [`ConfigProvider`], filled by the host at startup.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    values: RwLock<HashMap<String, ConfigValue>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(self, key: &str, value: impl Into<String>) -> Self {
        self.set_string(key, value);
        self
    }

    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.set_bool(key, value);
        self
    }

    pub fn set_string(&self, key: &str, value: impl Into<String>) {
        self.values
            .write()
            .insert(key.to_string(), ConfigValue::Str(value.into()));
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.values
            .write()
            .insert(key.to_string(), ConfigValue::Bool(value));
    }

    pub fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

impl ConfigProvider for MemoryConfig {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.read().get(key) {
            Some(ConfigValue::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.read().get(key) {
            Some(ConfigValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

/// Name of the single JSON field carrying the command text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadField {
    #[default]
    Text,
    Cmd,
}

impl PayloadField {
    pub fn key(self) -> &'static str {
        match self {
            PayloadField::Text => "text",
            PayloadField::Cmd => "cmd",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(PayloadField::Text),
            "cmd" => Some(PayloadField::Cmd),
            _ => None,
        }
    }
}

/// How the request leaves the process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// In-process HTTP client
    #[default]
    Http,
    /// `curl` spawned directly, payload on stdin
    Curl,
    /// `curl` through `sh -c`, payload inline and shell-quoted
    Shell,
}

impl TransportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Some(TransportKind::Http),
            "curl" => Some(TransportKind::Curl),
            "shell" => Some(TransportKind::Shell),
            _ => None,
        }
    }
}

/// Where and how to send commands. Built fresh for every dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    pub url: String,
    pub health_url: String,
    pub field: PayloadField,
    pub kind: TransportKind,
    pub timeout: Duration,
    pub curl_program: String,
}

impl TransportConfig {
    /// Validate `url` and derive the health endpoint from it.
    pub fn new(url: &str) -> Result<Self, DispatchError> {
        let url = url.trim();
        let health_url = health_url_for(url)?;
        Ok(Self {
            url: url.to_string(),
            health_url,
            field: PayloadField::default(),
            kind: TransportKind::default(),
            timeout: DEFAULT_TIMEOUT,
            curl_program: DEFAULT_CURL_PROGRAM.to_string(),
        })
    }

    /// Read the transport settings from the host's store.
    ///
    /// A missing or unusable URL is an error. Unknown field or transport
    /// names fall back to the defaults with a warning.
    pub fn from_provider(provider: &dyn ConfigProvider) -> Result<Self, DispatchError> {
        let url = provider
            .get_string(KEY_URL)
            .filter(|u| !u.trim().is_empty())
            .ok_or(DispatchError::MissingUrl)?;
        let mut config = Self::new(&url)?;

        if let Some(raw) = provider.get_string(KEY_PAYLOAD_FIELD) {
            match PayloadField::parse(&raw) {
                Some(field) => config.field = field,
                None => log::warn!("Unknown payload field '{}', using '{}'", raw, config.field.key()),
            }
        }

        if let Some(raw) = provider.get_string(KEY_TRANSPORT) {
            match TransportKind::parse(&raw) {
                Some(kind) => config.kind = kind,
                None => log::warn!("Unknown transport '{}', using {:?}", raw, config.kind),
            }
        }

        Ok(config)
    }

    pub fn with_field(mut self, field: PayloadField) -> Self {
        self.field = field;
        self
    }

    pub fn with_kind(mut self, kind: TransportKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_health_url(mut self, health_url: impl Into<String>) -> Self {
        self.health_url = health_url.into();
        self
    }

    pub fn with_curl_program(mut self, program: impl Into<String>) -> Self {
        self.curl_program = program.into();
        self
    }
}

/// `http://host:5678/webhook/command-input` -> `http://host:5678/health`
pub fn health_url_for(url: &str) -> Result<String, DispatchError> {
    let invalid = |reason: String| DispatchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let mut parsed = reqwest::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    parsed.set_path("/health");
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

/// Presentation settings the host reads alongside the transport config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiPreferences {
    pub send_on_enter: bool,
    pub button_color: String,
    pub show_send_notify: bool,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            send_on_enter: true,
            button_color: DEFAULT_BUTTON_COLOR.to_string(),
            show_send_notify: true,
        }
    }
}

impl UiPreferences {
    pub fn from_provider(provider: &dyn ConfigProvider) -> Self {
        let mut prefs = Self::default();

        if let Some(v) = provider.get_bool(KEY_SEND_ON_ENTER) {
            prefs.send_on_enter = v;
        }
        if let Some(v) = provider.get_bool(KEY_SHOW_SEND_NOTIFY) {
            prefs.show_send_notify = v;
        }
        if let Some(color) = provider.get_string(KEY_BUTTON_COLOR) {
            if is_hex_color(&color) {
                prefs.button_color = color.trim().to_string();
            } else {
                log::warn!("Invalid button color '{}', using {}", color, DEFAULT_BUTTON_COLOR);
            }
        }

        prefs
    }
}

/// `#rgb` or `#rrggbb`.
pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.trim().strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}
