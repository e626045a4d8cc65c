use std::time::Duration;

/// How long a desktop notification stays up.
const NOTICE_TTL: Duration = Duration::from_secs(5);

const APP_NAME: &str = "n8n Command";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeLevel {
    fn icon_char(self) -> &'static str {
        match self {
            NoticeLevel::Success => "✓",
            NoticeLevel::Error => "✗",
            NoticeLevel::Warning => "⚠",
            NoticeLevel::Info => "ℹ",
        }
    }

    fn icon_name(self) -> &'static str {
        match self {
            NoticeLevel::Success | NoticeLevel::Info => "dialog-information",
            NoticeLevel::Error => "dialog-error",
            NoticeLevel::Warning => "dialog-warning",
        }
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    fn new(level: NoticeLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, body)
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, body)
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, body)
    }

    /// One-line rendering for the terminal.
    pub fn line(&self) -> String {
        if self.body.is_empty() {
            format!("{} {}", self.level.icon_char(), self.title)
        } else {
            format!("{} {}: {}", self.level.icon_char(), self.title, self.body)
        }
    }
}

/// Shows notices on stdout and, when enabled, on the desktop.
#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    desktop: bool,
}

impl Notifier {
    pub fn new(desktop: bool) -> Self {
        Self { desktop }
    }

    pub fn show(&self, notice: Notice) {
        println!("{}", notice.line());
        if !self.desktop {
            return;
        }

        // D-Bus calls block; keep them off the event loop.
        tokio::task::spawn_blocking(move || {
            let result = notify_rust::Notification::new()
                .appname(APP_NAME)
                .summary(&notice.title)
                .body(&notice.body)
                .icon(notice.level.icon_name())
                .timeout(notify_rust::Timeout::Milliseconds(NOTICE_TTL.as_millis() as u32))
                .show();
            if let Err(e) = result {
                log::warn!("Failed to show desktop notification: {}", e);
            }
        });
    }
}
