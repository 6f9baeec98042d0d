use std::env;

use crate::compliance::{PrefixPolicy, DEFAULT_ALLOWED_PREFIXES};
use crate::utils::SshTarget;

/// Upper bound for SSH_TIMEOUT_SECS
pub const MAX_SSH_TIMEOUT_SECS: u64 = 3600;

/// Where rendered reports are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsTarget {
    /// A directory on the host running the check
    Local,
    /// The device's own flash, over SCP
    Device,
}

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub device_host: String,
    pub device_ssh_port: u16,
    pub device_user: String,
    pub device_pass: String,
    pub ssh_timeout_secs: u64,
    pub router_path: String,
    pub running_command: String,
    pub candidate_command: String,
    pub allowed_prefixes: Vec<String>,
    pub results_target: ResultsTarget,
    pub results_dir: String,
    pub results_device_dir: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let default_prefixes = DEFAULT_ALLOWED_PREFIXES.join(",");

        Self {
            device_host: get("DEVICE_HOST", "127.0.0.1"),
            device_ssh_port: get("DEVICE_SSH_PORT", "22").parse().unwrap_or(22),
            device_user: get("DEVICE_USER", "admin"),
            device_pass: get("DEVICE_PASS", ""),
            ssh_timeout_secs: get("SSH_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            router_path: get("ROUTER_PATH", r#"/nokia-conf:configure/router[router-name="Base"]"#),
            running_command: get("RUNNING_COMMAND", "info running json {path}"),
            candidate_command: get("CANDIDATE_COMMAND", "info candidate json {path}"),
            allowed_prefixes: parse_prefixes(&get("ALLOWED_PREFIXES", &default_prefixes)),
            results_target: match get("RESULTS_TARGET", "local").to_lowercase().as_str() {
                "device" => ResultsTarget::Device,
                _ => ResultsTarget::Local,
            },
            results_dir: get("RESULTS_DIR", "/var/lib/iface-guard/results"),
            results_device_dir: get("RESULTS_DEVICE_DIR", "cf3:"),
        }
    }

    /// Check values that would otherwise fail later in a confusing way
    pub fn validate(&self) -> anyhow::Result<()> {
        if !crate::utils::is_valid_hostname(&self.device_host) {
            anyhow::bail!("DEVICE_HOST is not a valid host: {:?}", self.device_host);
        }
        if self.ssh_timeout_secs == 0 {
            anyhow::bail!("SSH_TIMEOUT_SECS must be greater than zero");
        }
        if self.ssh_timeout_secs > MAX_SSH_TIMEOUT_SECS {
            anyhow::bail!(
                "SSH_TIMEOUT_SECS must be at most {} (got {})",
                MAX_SSH_TIMEOUT_SECS,
                self.ssh_timeout_secs
            );
        }
        if self.device_pass.is_empty() {
            tracing::warn!("DEVICE_PASS not set - authenticating with an empty password");
        }
        Ok(())
    }

    pub fn ssh_target(&self) -> SshTarget {
        SshTarget {
            host: self.device_host.clone(),
            port: self.device_ssh_port,
            user: self.device_user.clone(),
            pass: self.device_pass.clone(),
            timeout_secs: self.ssh_timeout_secs,
        }
    }

    pub fn naming_policy(&self) -> PrefixPolicy {
        PrefixPolicy::new(self.allowed_prefixes.iter().cloned())
    }
}

/// Split a comma-separated prefix list, dropping blanks
fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
