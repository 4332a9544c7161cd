mod parser;

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use crate::domain::{EndpointId, ProbeParams, ProbeReport};
use crate::ports::{ProbeError, Prober};

/// Prober backed by the platform `ping` binary.
///
/// Raw ICMP sockets need privileges the service usually does not have, while
/// the system `ping` is setuid or capability-enabled on most hosts.
#[derive(Debug, Clone)]
pub struct SystemPingProber {
    binary: PathBuf,
}

impl SystemPingProber {
    pub fn new() -> Self {
        Self::with_binary("ping")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, endpoint: &EndpointId, params: &ProbeParams) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-n")
            .arg("-c")
            .arg(params.packet_count.to_string())
            .arg("-i")
            .arg(format!("{:.1}", params.packet_interval.as_secs_f64().max(0.2)));

        // iputils takes the reply timeout in seconds, BSD ping in milliseconds
        if cfg!(target_os = "macos") {
            command.arg("-W").arg(params.timeout.as_millis().max(1).to_string());
        } else {
            command.arg("-W").arg(timeout_secs(params.timeout).to_string());
        }

        command
            .arg(endpoint.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for SystemPingProber {
    fn default() -> Self {
        Self::new()
    }
}

fn timeout_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl Prober for SystemPingProber {
    async fn probe(&self, endpoint: &EndpointId, params: &ProbeParams) -> Result<ProbeReport, ProbeError> {
        if endpoint.as_str().starts_with('-') {
            // Would be read as a flag by ping
            return Err(ProbeError::Unresolvable(endpoint.to_string()));
        }
        if params.packet_count == 0 {
            return Ok(ProbeReport::default());
        }

        let deadline = params.deadline();
        let output = tokio::time::timeout(deadline, self.command(endpoint, params).output())
            .await
            .map_err(|_| ProbeError::TimedOut(deadline))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        trace!(endpoint = %endpoint, status = ?output.status, "ping finished");

        if parser::is_resolution_failure(&stderr) || parser::is_resolution_failure(&stdout) {
            return Err(ProbeError::Unresolvable(endpoint.to_string()));
        }

        match parser::parse_ping_output(&stdout) {
            Ok(summary) => Ok(summary.into_report()),
            Err(e) if stderr.trim().is_empty() => Err(ProbeError::Output(e.to_string())),
            Err(e) => Err(ProbeError::Output(format!("{}: {}", e, stderr.trim()))),
        }
    }
}
