use anyhow::Result;

use super::{DeviceSession, RouterConfig, SessionError};
use crate::models::Datastore;
use crate::report::ResultsStore;
use crate::utils::{self, SshTarget};

/// Placeholder in command templates replaced by the MD-CLI path
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Convert a model instance path such as
/// `/nokia-conf:configure/router[router-name="Base"]` into MD-CLI form
/// `/configure router "Base"`. Anything that does not parse as an instance
/// path is returned unchanged.
pub fn md_cli_path(path: &str) -> String {
    let segment_re = match regex_lite::Regex::new(r#"/(?:[\w.-]+:)?([\w.-]+)((?:\[[\w.-]+="[^"]*"\])*)"#) {
        Ok(re) => re,
        Err(_) => return path.to_string(),
    };
    let key_re = match regex_lite::Regex::new(r#"\[[\w.-]+="([^"]*)"\]"#) {
        Ok(re) => re,
        Err(_) => return path.to_string(),
    };

    let mut out = String::new();
    let mut consumed = 0;
    for caps in segment_re.captures_iter(path) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => return path.to_string(),
        };
        if whole.start() != consumed {
            return path.to_string();
        }
        consumed = whole.end();

        out.push(if out.is_empty() { '/' } else { ' ' });
        out.push_str(&caps[1]);
        let keys = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        for key in key_re.captures_iter(keys) {
            out.push_str(&format!(" \"{}\"", &key[1]));
        }
    }

    if out.is_empty() || consumed != path.len() {
        return path.to_string();
    }
    out
}

/// SshSession queries configuration through the device CLI over SSH
pub struct SshSession {
    target: SshTarget,
    session: ssh2::Session,
    running_command: String,
    candidate_command: String,
}

impl SshSession {
    /// Open and authenticate the SSH session
    pub async fn connect(
        target: SshTarget,
        running_command: String,
        candidate_command: String,
    ) -> Result<Self, SessionError> {
        tracing::info!("Connecting to {}:{} as {}", target.host, target.port, target.user);
        let session = utils::ssh_connect_async(&target)
            .await
            .map_err(SessionError::Connect)?;

        Ok(Self {
            target,
            session,
            running_command,
            candidate_command,
        })
    }

    /// Results store on the device's own flash, sharing this session
    pub fn flash(&self, dir: &str) -> DeviceFlash {
        DeviceFlash {
            host: self.target.host.clone(),
            session: self.session.clone(),
            dir: dir.to_string(),
        }
    }

    fn command_for(&self, datastore: Datastore, path: &str) -> String {
        let template = match datastore {
            Datastore::Running => &self.running_command,
            Datastore::Candidate => &self.candidate_command,
        };
        render_command(template, path)
    }
}

/// Fill a command template with the MD-CLI form of `path`
pub fn render_command(template: &str, path: &str) -> String {
    template.replace(PATH_PLACEHOLDER, &md_cli_path(path))
}

#[async_trait::async_trait]
impl DeviceSession for SshSession {
    async fn get(&self, datastore: Datastore, path: &str) -> Result<RouterConfig, SessionError> {
        let command = self.command_for(datastore, path);
        tracing::debug!("Running on {}: {}", self.target.host, command);

        let output = utils::ssh_exec_async(&self.session, &command)
            .await
            .map_err(|reason| SessionError::Query {
                datastore,
                path: path.to_string(),
                reason,
            })?;

        let json = utils::extract_json_object(&output).ok_or_else(|| {
            SessionError::Malformed(format!("no JSON in {} output", datastore))
        })?;
        RouterConfig::from_json_str(json)
    }
}

/// DeviceFlash writes reports to a directory on the device, e.g. "cf3:"
pub struct DeviceFlash {
    host: String,
    session: ssh2::Session,
    dir: String,
}

/// Join a device directory and a file name. "cf3:" and "cf3:/" both give "cf3:/name".
pub fn flash_path(dir: &str, file_name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file_name)
}

#[async_trait::async_trait]
impl ResultsStore for DeviceFlash {
    fn location(&self, file_name: &str) -> String {
        format!("{}:{}", self.host, flash_path(&self.dir, file_name))
    }

    async fn write(&self, file_name: &str, contents: &str) -> Result<()> {
        let remote = flash_path(&self.dir, file_name);
        utils::ssh_upload_async(&self.session, &remote, contents)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
