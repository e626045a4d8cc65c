use n8n_command_core::DispatchResult;

/// What made the user submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Enter pressed inside the entry
    Enter,
    /// The "Send" menu item
    Button,
}

/// The text entry in the popup menu.
///
/// Text is only cleared once the webhook accepted it, so a failed send never
/// loses what the user typed.
#[derive(Debug, Clone, Default)]
pub struct CommandEntry {
    text: String,
    send_on_enter: bool,
}

impl CommandEntry {
    pub fn new(send_on_enter: bool) -> Self {
        Self {
            text: String::new(),
            send_on_enter,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Text to dispatch for `trigger`, or `None` if this trigger does not
    /// send (Enter with send-on-enter off).
    pub fn submission(&self, trigger: Trigger) -> Option<String> {
        if trigger == Trigger::Enter && !self.send_on_enter {
            return None;
        }
        Some(self.text.clone())
    }

    /// Apply the outcome of sending `submitted`.
    pub fn finish(&mut self, submitted: &str, result: &DispatchResult) {
        if result.is_ok() && self.text == submitted {
            self.text.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_respects_send_on_enter() {
        let mut entry = CommandEntry::new(false);
        entry.set_text("deploy");
        assert_eq!(entry.submission(Trigger::Enter), None);
        assert_eq!(entry.submission(Trigger::Button).as_deref(), Some("deploy"));

        let mut entry = CommandEntry::new(true);
        entry.set_text("deploy");
        assert_eq!(entry.submission(Trigger::Enter).as_deref(), Some("deploy"));
    }

    #[test]
    fn cleared_only_on_success() {
        let mut entry = CommandEntry::new(true);
        entry.set_text("deploy");

        entry.finish("deploy", &DispatchResult::failed("server error"));
        assert_eq!(entry.text(), "deploy");

        entry.finish("deploy", &DispatchResult::sent("ok"));
        assert_eq!(entry.text(), "");
    }

    #[test]
    fn newer_text_survives_a_late_success() {
        let mut entry = CommandEntry::new(true);
        entry.set_text("second draft");
        entry.finish("first", &DispatchResult::sent("ok"));
        assert_eq!(entry.text(), "second draft");
    }
}
