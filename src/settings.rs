//! Host settings module
//!
//! Reads `N8N_COMMAND_*` environment variables once at startup and fills the
//! in-memory store the core reads its keys from. Anything unparsable is
//! logged and replaced by its default.

use n8n_command_core::config::{
    DEFAULT_WEBHOOK_URL, KEY_BUTTON_COLOR, KEY_PAYLOAD_FIELD, KEY_SEND_ON_ENTER,
    KEY_SHOW_SEND_NOTIFY, KEY_TRANSPORT, KEY_URL,
};
use n8n_command_core::{HistoryPolicy, MemoryConfig, SessionOptions};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_URL: &str = "N8N_COMMAND_URL";
pub const ENV_FIELD: &str = "N8N_COMMAND_FIELD";
pub const ENV_TRANSPORT: &str = "N8N_COMMAND_TRANSPORT";
pub const ENV_SEND_ON_ENTER: &str = "N8N_COMMAND_SEND_ON_ENTER";
pub const ENV_BUTTON_COLOR: &str = "N8N_COMMAND_BUTTON_COLOR";
pub const ENV_NOTIFY: &str = "N8N_COMMAND_NOTIFY";
pub const ENV_HISTORY_SIZE: &str = "N8N_COMMAND_HISTORY_SIZE";
pub const ENV_HISTORY_POLICY: &str = "N8N_COMMAND_HISTORY_POLICY";
pub const ENV_POLL_SECS: &str = "N8N_COMMAND_POLL_SECS";
pub const ENV_DESKTOP_NOTIFY: &str = "N8N_COMMAND_DESKTOP_NOTIFY";

/// Present when a desktop session bus is available.
const ENV_DBUS: &str = "DBUS_SESSION_BUS_ADDRESS";

/// Everything the host needs to enable a session.
pub struct HostSettings {
    pub config: Arc<MemoryConfig>,
    pub session: SessionOptions,
    /// Show notifications on the desktop as well as on stdout.
    pub desktop_notifications: bool,
}

/// Load host settings from the process environment.
pub fn load_settings() -> HostSettings {
    settings_from(|key| std::env::var(key).ok())
}

/// Build settings from any key lookup.
pub fn settings_from(lookup: impl Fn(&str) -> Option<String>) -> HostSettings {
    let config = MemoryConfig::new();

    let url = lookup(ENV_URL).unwrap_or_else(|| {
        log::info!("{} not set, using {}", ENV_URL, DEFAULT_WEBHOOK_URL);
        DEFAULT_WEBHOOK_URL.to_string()
    });
    config.set_string(KEY_URL, url);

    if let Some(v) = lookup(ENV_FIELD) {
        config.set_string(KEY_PAYLOAD_FIELD, v);
    }
    if let Some(v) = lookup(ENV_TRANSPORT) {
        config.set_string(KEY_TRANSPORT, v);
    }
    if let Some(v) = lookup(ENV_BUTTON_COLOR) {
        config.set_string(KEY_BUTTON_COLOR, v);
    }
    if let Some(v) = read_bool(&lookup, ENV_SEND_ON_ENTER) {
        config.set_bool(KEY_SEND_ON_ENTER, v);
    }
    if let Some(v) = read_bool(&lookup, ENV_NOTIFY) {
        config.set_bool(KEY_SHOW_SEND_NOTIFY, v);
    }

    let mut session = SessionOptions::default();

    if let Some(raw) = lookup(ENV_HISTORY_SIZE) {
        match raw.trim().parse::<usize>() {
            Ok(size) if size > 0 => session.history_capacity = size,
            _ => log::warn!(
                "Could not parse {}={:?}, using {}",
                ENV_HISTORY_SIZE,
                raw,
                session.history_capacity
            ),
        }
    }

    if let Some(raw) = lookup(ENV_HISTORY_POLICY) {
        match HistoryPolicy::parse(&raw) {
            Some(policy) => session.history_policy = policy,
            None => log::warn!(
                "Could not parse {}={:?}, using {:?}",
                ENV_HISTORY_POLICY,
                raw,
                session.history_policy
            ),
        }
    }

    if let Some(raw) = lookup(ENV_POLL_SECS) {
        match raw.trim().parse::<u64>() {
            Ok(0) => session.monitor = false,
            Ok(secs) => session.poll_interval = Duration::from_secs(secs),
            Err(_) => log::warn!(
                "Could not parse {}={:?}, polling every {}s",
                ENV_POLL_SECS,
                raw,
                session.poll_interval.as_secs()
            ),
        }
    }

    let desktop_notifications =
        read_bool(&lookup, ENV_DESKTOP_NOTIFY).unwrap_or_else(|| lookup(ENV_DBUS).is_some());

    HostSettings {
        config: Arc::new(config),
        session,
        desktop_notifications,
    }
}

fn read_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            log::warn!("Could not parse {}={:?} as a boolean, ignoring", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_command_core::{ConfigProvider, PayloadField, TransportConfig, TransportKind, UiPreferences};
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> HostSettings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        settings_from(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let s = settings(&[]);
        assert_eq!(s.config.get_string(KEY_URL).as_deref(), Some(DEFAULT_WEBHOOK_URL));
        assert_eq!(s.session, SessionOptions::default());
        assert!(!s.desktop_notifications);
        assert_eq!(UiPreferences::from_provider(&*s.config), UiPreferences::default());
    }

    #[test]
    fn environment_overrides_reach_core_config() {
        let s = settings(&[
            (ENV_URL, "http://n8n.lan:5678/webhook/command-entry"),
            (ENV_FIELD, "cmd"),
            (ENV_TRANSPORT, "curl"),
            (ENV_SEND_ON_ENTER, "no"),
            (ENV_NOTIFY, "0"),
            (ENV_BUTTON_COLOR, "#222"),
            (ENV_HISTORY_SIZE, "5"),
            (ENV_HISTORY_POLICY, "success"),
            (ENV_POLL_SECS, "30"),
            (ENV_DBUS, "unix:path=/run/user/1000/bus"),
        ]);

        let transport = TransportConfig::from_provider(&*s.config).unwrap();
        assert_eq!(transport.url, "http://n8n.lan:5678/webhook/command-entry");
        assert_eq!(transport.field, PayloadField::Cmd);
        assert_eq!(transport.kind, TransportKind::Curl);

        let prefs = UiPreferences::from_provider(&*s.config);
        assert!(!prefs.send_on_enter);
        assert!(!prefs.show_send_notify);
        assert_eq!(prefs.button_color, "#222");

        assert_eq!(s.session.history_capacity, 5);
        assert_eq!(s.session.history_policy, HistoryPolicy::SuccessOnly);
        assert_eq!(s.session.poll_interval, Duration::from_secs(30));
        assert!(s.desktop_notifications);
    }

    #[test]
    fn garbage_values_fall_back() {
        let s = settings(&[
            (ENV_SEND_ON_ENTER, "maybe"),
            (ENV_HISTORY_SIZE, "0"),
            (ENV_HISTORY_POLICY, "sometimes"),
            (ENV_POLL_SECS, "soon"),
        ]);
        assert_eq!(s.config.get_bool(KEY_SEND_ON_ENTER), None);
        assert_eq!(s.session, SessionOptions::default());
    }

    #[test]
    fn zero_poll_interval_disables_monitor() {
        let s = settings(&[(ENV_POLL_SECS, "0")]);
        assert!(!s.session.monitor);
    }

    #[test]
    fn desktop_notifications_can_be_forced_off() {
        let s = settings(&[(ENV_DBUS, "unix:path=/bus"), (ENV_DESKTOP_NOTIFY, "off")]);
        assert!(!s.desktop_notifications);
    }
}
