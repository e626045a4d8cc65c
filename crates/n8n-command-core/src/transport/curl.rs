use super::{Transport, encode_payload, judge_response};
use crate::config::{TransportConfig, TransportKind};
use crate::error::DispatchError;
use crate::process::{command, shell_join};
use crate::types::{Command, DispatchResult};
use async_trait::async_trait;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// `-w` template appending the status code on its own line. curl expands
/// the `\n` itself.
const STATUS_SUFFIX: &str = "\\n%{http_code}";

/// Interpreter for [`TransportKind::Shell`].
const SHELL: &str = "sh";

/// Extra time given to the child on top of curl's own `--max-time`.
const KILL_GRACE: Duration = Duration::from_secs(1);

/// Talks to the webhook by spawning `curl`.
///
/// With [`TransportKind::Curl`] curl is executed directly and reads the JSON
/// payload from stdin, so the command text never touches a shell. With
/// [`TransportKind::Shell`] the whole invocation goes through `sh -c`: the
/// payload is JSON-encoded first, then every argument is shell-quoted.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurlTransport;

impl CurlTransport {
    pub fn new() -> Self {
        Self
    }

    /// Full argv (program first) for a POST whose body comes from `data`.
    ///
    /// `data` is either `@-` (read stdin) or the payload itself.
    pub fn post_argv(config: &TransportConfig, data_flag: &str, data: &str) -> Vec<String> {
        vec![
            config.curl_program.clone(),
            "-sS".to_string(),
            "-X".to_string(),
            "POST".to_string(),
            "-H".to_string(),
            "Content-Type: application/json".to_string(),
            "--max-time".to_string(),
            max_time(config.timeout),
            data_flag.to_string(),
            data.to_string(),
            "-w".to_string(),
            STATUS_SUFFIX.to_string(),
            config.url.clone(),
        ]
    }

    /// Full argv (program first) for a health check printing only the status.
    pub fn probe_argv(config: &TransportConfig) -> Vec<String> {
        vec![
            config.curl_program.clone(),
            "-sS".to_string(),
            "-o".to_string(),
            null_device().to_string(),
            "-w".to_string(),
            "%{http_code}".to_string(),
            "--max-time".to_string(),
            max_time(config.timeout),
            config.health_url.clone(),
        ]
    }

    /// The `sh -c` line used by [`TransportKind::Shell`].
    pub fn shell_line(payload: &str, config: &TransportConfig) -> String {
        shell_join(&Self::post_argv(config, "--data-raw", payload))
    }

    async fn post(&self, command: &Command, config: &TransportConfig) -> Result<String, DispatchError> {
        let payload = encode_payload(command, config.field)?;

        let (program, output) = match config.kind {
            TransportKind::Shell => {
                let line = Self::shell_line(&payload, config);
                (SHELL, run(&shell_argv(line), None, config.timeout).await?)
            }
            _ => {
                let argv = Self::post_argv(config, "--data-binary", "@-");
                (
                    config.curl_program.as_str(),
                    run(&argv, Some(&payload), config.timeout).await?,
                )
            }
        };

        let stdout = check_exit(program, output)?;
        let (body, status) = split_status(&stdout)?;
        judge_response(status, body.to_string())
    }

    async fn check_health(&self, config: &TransportConfig) -> Result<bool, DispatchError> {
        let argv = Self::probe_argv(config);
        let (program, output) = match config.kind {
            TransportKind::Shell => (
                SHELL,
                run(&shell_argv(shell_join(&argv)), None, config.timeout).await?,
            ),
            _ => (
                config.curl_program.as_str(),
                run(&argv, None, config.timeout).await?,
            ),
        };
        let stdout = check_exit(program, output)?;
        Ok(stdout.trim() == "200")
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn send(&self, command: &Command, config: &TransportConfig) -> DispatchResult {
        match self.post(command, config).await {
            Ok(body) => {
                log::info!("Command delivered to {} via {}", config.url, config.curl_program);
                DispatchResult::sent(body)
            }
            Err(e) => {
                log::warn!("Failed to deliver command to {}: {}", config.url, e);
                e.into()
            }
        }
    }

    async fn probe(&self, config: &TransportConfig) -> bool {
        match self.check_health(config).await {
            Ok(healthy) => healthy,
            Err(e) => {
                log::debug!("Health check {} failed: {}", config.health_url, e);
                false
            }
        }
    }
}

/// Spawn `argv`, optionally feed `stdin`, and collect the output.
///
/// The child is killed if it outlives `timeout` plus a short grace period.
async fn run(argv: &[String], stdin: Option<&str>, timeout: Duration) -> Result<Output, DispatchError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| DispatchError::MalformedResponse("empty command line".to_string()))?;

    let mut cmd = command(program);
    cmd.args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() });

    let mut child = cmd.spawn().map_err(|e| DispatchError::Spawn {
        program: program.clone(),
        reason: e.to_string(),
    })?;

    let write_stdin = child.stdin.take();
    let finish = async move {
        if let (Some(mut pipe), Some(data)) = (write_stdin, stdin) {
            pipe.write_all(data.as_bytes()).await?;
            pipe.shutdown().await?;
        }
        child.wait_with_output().await
    };

    match tokio::time::timeout(timeout + KILL_GRACE, finish).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(DispatchError::Spawn {
            program: program.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Err(DispatchError::Timeout(timeout)),
    }
}

fn shell_argv(line: String) -> Vec<String> {
    vec![SHELL.to_string(), "-c".to_string(), line]
}

fn check_exit(program: &str, output: Output) -> Result<String, DispatchError> {
    if !output.status.success() {
        return Err(DispatchError::Subprocess {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Split curl's stdout into the response body and the trailing status code.
fn split_status(stdout: &str) -> Result<(&str, u16), DispatchError> {
    let (body, code) = stdout.rsplit_once('\n').unwrap_or(("", stdout));
    let status = code
        .trim()
        .parse::<u16>()
        .map_err(|_| DispatchError::MalformedResponse(format!("no HTTP status in curl output: {:?}", code)))?;
    Ok((body, status))
}

fn max_time(timeout: Duration) -> String {
    format!("{:.3}", timeout.as_secs_f64())
}

fn null_device() -> &'static str {
    if cfg!(windows) { "NUL" } else { "/dev/null" }
}
