use std::time::Duration;

/// Everything that can stop a command from reaching the webhook.
///
/// None of these escape the [`Transport`](crate::Transport) or
/// [`Dispatcher`](crate::Dispatcher) boundary: they are folded into a
/// [`DispatchResult`](crate::DispatchResult) before the caller sees them.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Empty or whitespace-only input. Skipped silently.
    #[error("command is empty")]
    EmptyCommand,
    #[error("no webhook URL configured")]
    MissingUrl,
    #[error("invalid webhook URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Network(String),
    #[error("request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    #[error("HTTP {status}")]
    HttpStatus { status: u16, body: String },
    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("{program} {}", exit_label(.code))]
    Subprocess {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("unexpected response: {0}")]
    MalformedResponse(String),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DispatchError {
    /// Configuration problems: the request was never attempted.
    pub fn is_config(&self) -> bool {
        matches!(self, DispatchError::MissingUrl | DispatchError::InvalidUrl { .. })
    }

    /// Text shown to the user. Prefers what the server or subprocess said over
    /// our own description of the failure.
    pub fn diagnostic(&self) -> String {
        match self {
            DispatchError::HttpStatus { body, .. } if !body.trim().is_empty() => body.clone(),
            DispatchError::Subprocess { stderr, .. } if !stderr.trim().is_empty() => {
                stderr.trim().to_string()
            }
            other => other.to_string(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_diagnostic_prefers_body() {
        let err = DispatchError::HttpStatus {
            status: 500,
            body: "server error".to_string(),
        };
        assert_eq!(err.diagnostic(), "server error");

        let empty = DispatchError::HttpStatus {
            status: 502,
            body: "  ".to_string(),
        };
        assert_eq!(empty.diagnostic(), "HTTP 502");
    }

    #[test]
    fn subprocess_diagnostic_falls_back_to_exit_status() {
        let err = DispatchError::Subprocess {
            program: "curl".to_string(),
            code: Some(7),
            stderr: String::new(),
        };
        assert_eq!(err.diagnostic(), "curl exited with status 7");

        let signalled = DispatchError::Subprocess {
            program: "curl".to_string(),
            code: None,
            stderr: "curl: (28) Operation timed out\n".to_string(),
        };
        assert_eq!(signalled.diagnostic(), "curl: (28) Operation timed out");
    }

    #[test]
    fn config_errors_are_flagged() {
        assert!(DispatchError::MissingUrl.is_config());
        assert!(
            DispatchError::InvalidUrl {
                url: "nope".to_string(),
                reason: "relative URL without a base".to_string(),
            }
            .is_config()
        );
        assert!(!DispatchError::Network("refused".to_string()).is_config());
    }
}
