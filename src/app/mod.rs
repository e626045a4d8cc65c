mod entry;

pub use entry::{CommandEntry, Trigger};

use crate::notify::{Notice, Notifier};
use crate::settings::HostSettings;
use anyhow::{Context, Result};
use n8n_command_core::{
    ConnectivityState, CoreEvent, DispatchOutcome, SelectingTransport, Session, Transport,
    UiPreferences,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of stdin, read as a UI action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Text typed into the entry followed by Enter
    Text(String),
    /// `:send` - activate the Send menu item
    Send,
    /// `:history` - open the history submenu
    History,
    /// `:resend N` - pick history item N (1 = oldest)
    Resend(usize),
    /// `:quit` - disable and exit
    Quit,
    /// Anything else starting with `:`
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    let Some(directive) = trimmed.strip_prefix(':') else {
        return Input::Text(line.to_string());
    };

    let mut parts = directive.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("send"), None) => Input::Send,
        (Some("history"), None) => Input::History,
        (Some("quit"), None) => Input::Quit,
        (Some("resend"), Some(n)) => match n.parse() {
            Ok(n) => Input::Resend(n),
            Err(_) => Input::Unknown(trimmed.to_string()),
        },
        _ => Input::Unknown(trimmed.to_string()),
    }
}

/// What the user should see for a core event, if anything.
pub fn notice_for(event: &CoreEvent, prefs: &UiPreferences) -> Option<Notice> {
    match event {
        CoreEvent::DispatchComplete(result) => match result.outcome {
            DispatchOutcome::Sent if prefs.show_send_notify => Some(Notice::success(
                "Command sent",
                result
                    .command
                    .as_ref()
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            )),
            DispatchOutcome::Sent | DispatchOutcome::Skipped => None,
            DispatchOutcome::Failed => Some(Notice::error("Error", result.message.clone())),
            DispatchOutcome::Misconfigured => {
                Some(Notice::error("Not configured", result.message.clone()))
            }
        },
        CoreEvent::ConnectivityChanged { to, .. } => match to {
            ConnectivityState::Connected => Some(Notice::info("n8n connected", "")),
            ConnectivityState::Disconnected => Some(Notice::warning(
                "n8n unreachable",
                "Commands may not be delivered",
            )),
            ConnectivityState::Unknown => None,
        },
        CoreEvent::ConnectivityEstablished(_) | CoreEvent::HistoryChanged(_) => None,
    }
}

/// Headless stand-in for the panel indicator: an entry, a history menu and
/// notifications, driven by stdin instead of widgets.
pub struct HeadlessApp {
    session: Session,
    entry: CommandEntry,
}

impl HeadlessApp {
    /// Enable a session and start rendering its events.
    pub fn enable(settings: HostSettings, transport: Arc<dyn Transport>, notifier: Notifier) -> Self {
        let prefs = UiPreferences::from_provider(&*settings.config);
        log::debug!("Button color {}", prefs.button_color);

        let (session, events) = Session::enable(
            settings.config,
            transport,
            settings.session,
            &tokio::runtime::Handle::current(),
        );

        let entry = CommandEntry::new(prefs.send_on_enter);

        // Runs until disable closes the channel.
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match &event {
                    CoreEvent::ConnectivityEstablished(state) => {
                        println!("n8n: {}", state);
                    }
                    CoreEvent::HistoryChanged(list) => {
                        log::debug!("History now holds {} entries", list.len());
                    }
                    _ => {}
                }
                if let Some(notice) = notice_for(&event, &prefs) {
                    notifier.show(notice);
                }
            }
        });

        Self { session, entry }
    }

    pub fn entry(&self) -> &CommandEntry {
        &self.entry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Act on one input. Returns `false` once the user asked to quit.
    pub async fn handle(&mut self, input: Input) -> bool {
        match input {
            Input::Text(text) => {
                self.entry.set_text(text);
                self.submit(Trigger::Enter).await;
            }
            Input::Send => self.submit(Trigger::Button).await,
            Input::History => self.print_history(),
            Input::Resend(n) => {
                let picked = n.checked_sub(1).filter(|i| *i < self.session.history().len());
                match picked {
                    Some(index) => {
                        self.session.resend(index).await;
                    }
                    None => println!("No history entry {}", n),
                }
            }
            Input::Quit => return false,
            Input::Unknown(directive) => {
                println!("Unknown {}; try :send, :history, :resend N or :quit", directive);
            }
        }
        true
    }

    async fn submit(&mut self, trigger: Trigger) {
        let Some(text) = self.entry.submission(trigger) else {
            println!("Enter does not send; type :send");
            return;
        };
        let result = self.session.send(&text).await;
        self.entry.finish(&text, &result);
    }

    fn print_history(&self) {
        let history = self.session.history();
        if history.is_empty() {
            println!("History is empty");
            return;
        }
        for (i, command) in history.iter().enumerate() {
            println!("{:>2}. {}", i + 1, command);
        }
    }

    pub fn disable(&mut self) {
        self.session.disable();
    }
}

/// Enable, read stdin until EOF or `:quit`, disable.
pub async fn run(settings: HostSettings) -> Result<()> {
    let notifier = Notifier::new(settings.desktop_notifications);
    let transport: Arc<dyn Transport> = Arc::new(SelectingTransport::new());
    let mut app = HeadlessApp::enable(settings, transport, notifier);

    println!("Type a command and press Enter (:send, :history, :resend N, :quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if !app.handle(parse_input(&line)).await {
            break;
        }
    }

    app.disable();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ENV_POLL_SECS, ENV_SEND_ON_ENTER, settings_from};
    use async_trait::async_trait;
    use n8n_command_core::{Command, DispatchResult, TransportConfig};
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Fails the first `failures` sends, then accepts everything.
    struct FlakyTransport {
        failures: Mutex<VecDeque<()>>,
        sent: Mutex<Vec<String>>,
    }

    impl FlakyTransport {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures: Mutex::new(std::iter::repeat_n((), failures).collect()),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn send(&self, command: &Command, _config: &TransportConfig) -> DispatchResult {
            self.sent.lock().push(command.to_string());
            if self.failures.lock().pop_front().is_some() {
                DispatchResult::failed("server error")
            } else {
                DispatchResult::sent("ok")
            }
        }

        async fn probe(&self, _config: &TransportConfig) -> bool {
            true
        }
    }

    fn app(transport: Arc<FlakyTransport>, send_on_enter: bool) -> HeadlessApp {
        let settings = settings_from(|key| match key {
            ENV_POLL_SECS => Some("0".to_string()),
            ENV_SEND_ON_ENTER => Some(send_on_enter.to_string()),
            _ => None,
        });
        HeadlessApp::enable(settings, transport, Notifier::new(false))
    }

    #[test]
    fn parse_input_directives() {
        assert_eq!(parse_input("restart service"), Input::Text("restart service".into()));
        assert_eq!(parse_input(" :send "), Input::Send);
        assert_eq!(parse_input(":history"), Input::History);
        assert_eq!(parse_input(":resend 2"), Input::Resend(2));
        assert_eq!(parse_input(":quit"), Input::Quit);
        assert_eq!(parse_input(":resend two"), Input::Unknown(":resend two".into()));
        assert_eq!(parse_input(":dance"), Input::Unknown(":dance".into()));
    }

    #[test]
    fn notices_follow_outcome_and_preferences() {
        let prefs = UiPreferences::default();
        let sent = CoreEvent::DispatchComplete(
            DispatchResult::sent("ok").with_command(Command::parse("deploy").unwrap()),
        );
        assert_eq!(
            notice_for(&sent, &prefs),
            Some(Notice::success("Command sent", "deploy"))
        );

        let quiet = UiPreferences {
            show_send_notify: false,
            ..UiPreferences::default()
        };
        assert_eq!(notice_for(&sent, &quiet), None);

        let failed = CoreEvent::DispatchComplete(DispatchResult::failed("server error"));
        assert_eq!(
            notice_for(&failed, &quiet),
            Some(Notice::error("Error", "server error"))
        );

        let down = CoreEvent::ConnectivityChanged {
            from: ConnectivityState::Connected,
            to: ConnectivityState::Disconnected,
        };
        assert!(matches!(notice_for(&down, &prefs), Some(n) if n.title == "n8n unreachable"));
        assert_eq!(
            notice_for(&CoreEvent::ConnectivityEstablished(ConnectivityState::Connected), &prefs),
            None
        );
    }

    #[tokio::test]
    async fn entry_kept_after_failure_and_cleared_after_success() {
        let transport = FlakyTransport::new(1);
        let mut app = app(transport.clone(), true);

        assert!(app.handle(Input::Text("deploy".into())).await);
        assert_eq!(app.entry().text(), "deploy");

        assert!(app.handle(Input::Send).await);
        assert_eq!(app.entry().text(), "");

        assert_eq!(*transport.sent.lock(), vec!["deploy", "deploy"]);
        assert_eq!(app.session().history().len(), 2);
        app.disable();
    }

    #[tokio::test]
    async fn enter_without_send_on_enter_only_fills_entry() {
        let transport = FlakyTransport::new(0);
        let mut app = app(transport.clone(), false);

        app.handle(Input::Text("deploy".into())).await;
        assert!(transport.sent.lock().is_empty());
        assert_eq!(app.entry().text(), "deploy");

        app.handle(Input::Send).await;
        assert_eq!(transport.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn resend_is_one_based_and_bounded() {
        let transport = FlakyTransport::new(0);
        let mut app = app(transport.clone(), true);

        app.handle(Input::Text("first".into())).await;
        app.handle(Input::Text("second".into())).await;
        app.handle(Input::Resend(1)).await;
        app.handle(Input::Resend(0)).await;
        app.handle(Input::Resend(9)).await;

        assert_eq!(
            *transport.sent.lock(),
            vec!["first", "second", "first"]
        );
        assert!(!app.handle(Input::Quit).await);
    }
}
