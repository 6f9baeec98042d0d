use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Where and how to reach a device over SSH
#[derive(Debug, Clone)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub timeout_secs: u64,
}

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Validate a hostname.
/// Allows alphanumeric, hyphens, dots, colons (IPv6) and underscores. No path separators or shell metacharacters.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 253 {
        return false;
    }
    hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == ':')
}

/// libssh2 takes its timeout in u32 milliseconds; saturate rather than wrap
pub fn timeout_millis(secs: u64) -> u32 {
    u32::try_from(secs.saturating_mul(1000)).unwrap_or(u32::MAX)
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// Returns the authenticated Session. Uses the ssh2 crate (libssh2).
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(target: &SshTarget) -> Result<ssh2::Session, String> {
    let timeout = Duration::from_secs(target.timeout_secs);
    let addr = (target.host.as_str(), target.port)
        .to_socket_addrs()
        .map_err(|e| format!("Invalid address {}:{}: {}", target.host, target.port, e))?
        .next()
        .ok_or_else(|| format!("No address found for {}", target.host))?;

    let tcp = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| format!("TCP connection failed: {}", e))?;

    tcp.set_read_timeout(Some(timeout)).ok();
    tcp.set_write_timeout(Some(timeout)).ok();

    let mut session = ssh2::Session::new()
        .map_err(|e| format!("Failed to create SSH session: {}", e))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(timeout_millis(target.timeout_secs));
    session.handshake()
        .map_err(|e| format!("SSH handshake failed: {}", e))?;

    // Try password auth first
    match session.userauth_password(&target.user, &target.pass) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // SR OS and similar may only offer keyboard-interactive
    let mut prompter = PasswordPrompt { password: target.pass.clone() };
    let _ = session.userauth_keyboard_interactive(&target.user, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        Err("SSH authentication failed: all methods exhausted".to_string())
    }
}

/// Run a single command on an authenticated session, returning the output.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_exec(session: &ssh2::Session, command: &str) -> Result<String, String> {
    let mut channel = session.channel_session()
        .map_err(|e| format!("Failed to open channel: {}", e))?;

    channel.exec(command)
        .map_err(|e| format!("Failed to execute command: {}", e))?;

    let mut output = String::new();
    channel.read_to_string(&mut output)
        .map_err(|e| format!("Failed to read output: {}", e))?;

    channel.wait_close()
        .map_err(|e| format!("Failed to close channel: {}", e))?;

    match channel.exit_status() {
        Ok(0) => Ok(output),
        Ok(code) => Err(format!("Command exited with status {}: {}", code, output.trim())),
        Err(e) => Err(format!("Failed to read exit status: {}", e)),
    }
}

/// Async wrapper for ssh_connect - runs in a blocking thread pool
pub async fn ssh_connect_async(target: &SshTarget) -> Result<ssh2::Session, String> {
    let target = target.clone();

    tokio::task::spawn_blocking(move || {
        ssh_connect(&target)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Async wrapper for ssh_exec - runs in a blocking thread pool
pub async fn ssh_exec_async(session: &ssh2::Session, command: &str) -> Result<String, String> {
    let session = session.clone();
    let command = command.to_string();

    tokio::task::spawn_blocking(move || {
        ssh_exec(&session, &command)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Copy a text file to the device with SCP.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_upload(session: &ssh2::Session, remote_path: &str, contents: &str) -> Result<(), String> {
    let bytes = contents.as_bytes();

    let mut channel = session
        .scp_send(Path::new(remote_path), 0o644, bytes.len() as u64, None)
        .map_err(|e| format!("Failed to start SCP to {}: {}", remote_path, e))?;

    channel.write_all(bytes)
        .map_err(|e| format!("Failed to write {}: {}", remote_path, e))?;

    // Signal EOF and wait for the remote side to finish
    channel.send_eof().map_err(|e| format!("Failed to send EOF: {}", e))?;
    channel.wait_eof().map_err(|e| format!("Failed to wait for EOF: {}", e))?;
    channel.close().map_err(|e| format!("Failed to close channel: {}", e))?;
    channel.wait_close()
        .map_err(|e| format!("Failed to close channel: {}", e))?;

    Ok(())
}

/// Async wrapper for ssh_upload - runs in a blocking thread pool
pub async fn ssh_upload_async(session: &ssh2::Session, remote_path: &str, contents: &str) -> Result<(), String> {
    let session = session.clone();
    let remote_path = remote_path.to_string();
    let contents = contents.to_string();

    tokio::task::spawn_blocking(move || {
        ssh_upload(&session, &remote_path, &contents)
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Cut the JSON document out of CLI output that may carry banners or prompts
/// around it. The document starts at the first line beginning with "{".
/// Returns None when there is no such line.
pub fn extract_json_object(output: &str) -> Option<&str> {
    let mut offset = 0;
    let mut start = None;
    for line in output.split_inclusive('\n') {
        if line.trim_start().starts_with('{') {
            start = Some(offset + (line.len() - line.trim_start().len()));
            break;
        }
        offset += line.len();
    }
    let start = start?;
    let end = output.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&output[start..=end])
}
