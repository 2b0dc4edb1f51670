use crate::app::errors::GitHubError;
use crate::app::models::RepoSlug;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

/// Where repository secrets get published.
pub trait SecretStore {
    /// Sets every secret independently. One failure never stops the rest.
    fn set_secrets(
        &self,
        repo: &RepoSlug,
        secrets: &BTreeMap<String, String>,
    ) -> BTreeMap<String, Result<(), GitHubError>>;
}

/// Publishes secrets through the `gh` CLI.
pub struct GitHubCli {
    program: OsString,
}

impl Default for GitHubCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl GitHubCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `gh secret set NAME --repo owner/name`, value on stdin.
    fn set_secret(&self, repo: &RepoSlug, name: &str, value: &str) -> Result<(), GitHubError> {
        let mut child = Command::new(&self.program)
            .args(["secret", "set", name, "--repo"])
            .arg(repo.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(value.as_bytes()) {
                // gh may bail out before reading; its exit status tells the story
                if err.kind() != ErrorKind::BrokenPipe {
                    return Err(err.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(GitHubError::Failed {
                status: output.status,
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl SecretStore for GitHubCli {
    fn set_secrets(
        &self,
        repo: &RepoSlug,
        secrets: &BTreeMap<String, String>,
    ) -> BTreeMap<String, Result<(), GitHubError>> {
        secrets
            .iter()
            .map(|(name, value)| {
                let result = self.set_secret(repo, name, value);
                if let Err(err) = &result {
                    log::warn!("failed to set secret {} on {}: {}", name, repo, err);
                }
                (name.clone(), result)
            })
            .collect()
    }
}
