//! Getting a command to the webhook, and asking the backend if it is alive.

mod curl;
mod http;

pub use curl::CurlTransport;
pub use http::HttpTransport;

use crate::config::{PayloadField, TransportConfig, TransportKind};
use crate::error::DispatchError;
use crate::types::{Command, DispatchResult};
use async_trait::async_trait;

/// One way of delivering a command.
///
/// Implementations must not fail past this boundary: every error becomes a
/// failed [`DispatchResult`] or a `false` probe. They hold no per-call state,
/// so concurrent calls are independent.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// POST `command` to `config.url`. No retries.
    async fn send(&self, command: &Command, config: &TransportConfig) -> DispatchResult;

    /// GET `config.health_url`. `true` only for HTTP 200.
    async fn probe(&self, config: &TransportConfig) -> bool;
}

/// Serialize the command as `{"<field>": "<command>"}`.
pub fn encode_payload(command: &Command, field: PayloadField) -> Result<String, DispatchError> {
    let mut body = serde_json::Map::new();
    body.insert(
        field.key().to_string(),
        serde_json::Value::String(command.as_str().to_string()),
    );
    Ok(serde_json::to_string(&serde_json::Value::Object(body))?)
}

/// 2xx is success and yields the body, anything else is a failure.
pub(crate) fn judge_response(status: u16, body: String) -> Result<String, DispatchError> {
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(DispatchError::HttpStatus { status, body })
    }
}

/// Routes each call to the strategy named by [`TransportConfig::kind`].
#[derive(Default)]
pub struct SelectingTransport {
    http: HttpTransport,
    curl: CurlTransport,
}

impl SelectingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn pick(&self, kind: TransportKind) -> &dyn Transport {
        match kind {
            TransportKind::Http => &self.http,
            TransportKind::Curl | TransportKind::Shell => &self.curl,
        }
    }
}

#[async_trait]
impl Transport for SelectingTransport {
    async fn send(&self, command: &Command, config: &TransportConfig) -> DispatchResult {
        self.pick(config.kind).send(command, config).await
    }

    async fn probe(&self, config: &TransportConfig) -> bool {
        self.pick(config.kind).probe(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DispatchOutcome;

    #[test]
    fn payload_uses_configured_field() {
        let cmd = Command::parse("restart service").unwrap();
        assert_eq!(
            encode_payload(&cmd, PayloadField::Text).unwrap(),
            r#"{"text":"restart service"}"#
        );
        assert_eq!(
            encode_payload(&cmd, PayloadField::Cmd).unwrap(),
            r#"{"cmd":"restart service"}"#
        );
    }

    #[test]
    fn payload_escapes_quotes_backslashes_and_control_chars() {
        let cmd = Command::parse("say \"hi\" \\done\nnext\tline\u{1}").unwrap();
        let json = encode_payload(&cmd, PayloadField::Text).unwrap();

        assert!(json.contains(r#"\"hi\""#));
        assert!(json.contains(r#"\\done"#));
        assert!(json.contains(r#"\n"#));
        assert!(json.contains(r#"\u0001"#));

        let decoded: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded["text"], cmd.as_str());
    }

    #[test]
    fn judge_response_accepts_only_2xx() {
        assert_eq!(judge_response(200, "ok".into()).unwrap(), "ok");
        assert_eq!(judge_response(204, String::new()).unwrap(), "");

        let result: DispatchResult = judge_response(500, "server error".into()).unwrap_err().into();
        assert_eq!(result.outcome, DispatchOutcome::Failed);
        assert_eq!(result.message, "server error");

        assert!(judge_response(301, String::new()).is_err());
    }
}
