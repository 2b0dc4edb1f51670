use crate::app::errors::RemoteError;
use crate::app::models::{RepoSlug, ToolStatus};
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Parses `git@host:owner/repo[.git]` and `scheme://host/owner/repo[.git]` remotes.
pub fn parse_remote(raw: &str) -> Result<RepoSlug, RemoteError> {
    let trimmed = raw.trim();
    let url = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let path = if let Some((_, rest)) = url.split_once("://") {
        // scheme://host/owner/repo
        match rest.split_once('/') {
            Some((host, path)) if !host.is_empty() => path,
            _ => return Err(RemoteError::Unrecognized(trimmed.to_string())),
        }
    } else if let Some((user_host, path)) = url.split_once(':') {
        // user@host:owner/repo
        match user_host.split_once('@') {
            Some((user, host)) if !user.is_empty() && !host.is_empty() => path,
            _ => return Err(RemoteError::Unrecognized(trimmed.to_string())),
        }
    } else {
        return Err(RemoteError::Unrecognized(trimmed.to_string()));
    };

    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(RepoSlug {
            owner: owner.to_string(),
            name: name.to_string(),
        }),
        _ => Err(RemoteError::BadPath(trimmed.to_string())),
    }
}

/// Reads `origin` from the local git checkout. `None` on any failure.
pub fn detect_remote_repo() -> Option<RepoSlug> {
    let output = Command::new("git")
        .args(["remote", "get-url", "origin"])
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        log::debug!("git remote get-url origin exited with {}", output.status);
        return None;
    }

    match parse_remote(&String::from_utf8_lossy(&output.stdout)) {
        Ok(slug) => Some(slug),
        Err(err) => {
            log::debug!("ignoring origin remote: {}", err);
            None
        }
    }
}

pub fn tool_available(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Runs `<name> auth status`; absence of the tool counts as unauthenticated.
pub fn tool_authenticated(name: &str) -> bool {
    Command::new(name)
        .args(["auth", "status"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Probes `asc`, `xcodebuild` and `gh`, plus whether `gh` is logged in.
pub fn probe_tools() -> ToolStatus {
    let gh = tool_available("gh");
    ToolStatus {
        asc: tool_available("asc"),
        xcodebuild: tool_available("xcodebuild"),
        gh,
        gh_authenticated: gh && tool_authenticated("gh"),
    }
}

/// Runs a command and returns its stdout if it exits successfully before `timeout`.
/// The child is killed once the deadline passes.
pub fn output_with_timeout(mut command: Command, timeout: Duration) -> Option<Vec<u8>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| log::debug!("spawn failed: {}", err))
        .ok()?;

    let mut stdout = child.stdout.take()?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                log::debug!("command timed out after {:?}", timeout);
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => thread::sleep(Duration::from_millis(25)),
            Err(err) => {
                log::debug!("wait failed: {}", err);
                return None;
            }
        }
    };

    // a leftover grandchild can hold the pipe open past the child's exit
    let remaining = deadline.saturating_duration_since(Instant::now());
    let buf = match rx.recv_timeout(remaining) {
        Ok(read) => read.ok()?,
        Err(_) => {
            log::debug!("output still open after {:?}", timeout);
            return None;
        }
    };
    status.success().then_some(buf)
}
