//! # Secret Retrieval
//!
//! Resolves secrets (e.g. the configuration server's access token) through
//! an external secret manager command-line tool.
//!
//! Every invocation is bounded by a timeout; a tool that hangs is killed and
//! reported as [`errors::ErrorKind::Timeout`].

use async_trait::async_trait;
use config::SecretSettings;
use errors::{CoreError, Result};
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

const DEFAULT_COMMAND: &str = "bws";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Returns the plain value of the secret identified by `secret_id`.
    async fn get(&self, secret_id: &str) -> Result<String>;
}

/// Output of `bws get secret`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BitwardenSecret {
    #[serde(default)]
    id: String,
    #[serde(default)]
    key: String,
    value: String,
}

/// Secret provider backed by the Bitwarden Secrets Manager CLI.
///
/// Runs `{command} get secret {secret_id} --access-token {token}` and reads
/// the `value` field of the JSON printed on stdout.
pub struct BitwardenProvider {
    command: String,
    access_token: String,
    timeout: Duration,
}

impl BitwardenProvider {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            access_token: access_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &SecretSettings) -> Result<Self> {
        let access_token = settings.access_token.clone().ok_or_else(|| {
            CoreError::invalid_input(
                "secret.access_token",
                "no secret manager access token configured",
            )
        })?;

        Ok(Self::new(access_token)
            .with_command(settings.command.clone())
            .with_timeout(settings.timeout()))
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_failure(&self, reason: impl Into<String>) -> CoreError {
        CoreError::CommandFailure {
            command: self.command.clone(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Debug for BitwardenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitwardenProvider")
            .field("command", &self.command)
            .field("access_token", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl SecretProvider for BitwardenProvider {
    async fn get(&self, secret_id: &str) -> Result<String> {
        if secret_id.is_empty() {
            return Err(CoreError::invalid_input("secret_id", "secret id must not be empty"));
        }

        let mut cmd = Command::new(&self.command);
        cmd.args(["get", "secret", secret_id, "--access-token", &self.access_token])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.command_failure(format!("failed to run: {e}"))),
            Err(_) => {
                warn!(
                    "Secret manager '{}' did not answer within {:?}",
                    self.command, self.timeout
                );
                return Err(CoreError::timeout(
                    format!("secret manager '{}'", self.command),
                    self.timeout,
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.command_failure(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let secret: BitwardenSecret =
            serde_json::from_slice(&output.stdout).map_err(|e| CoreError::SerializationFailure {
                reason: format!("failed to extract secret from '{}' output: {e}", self.command),
            })?;

        debug!(secret_id = %secret.id, key = %secret.key, "Resolved secret");

        Ok(secret.value)
    }
}
