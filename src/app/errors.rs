use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("unrecognized remote URL format: {0}")]
    Unrecognized(String),
    #[error("unexpected remote path in {0}")]
    BadPath(String),
}

#[derive(Debug, Error)]
pub enum AscError {
    #[error("invalid private key base64: {0}")]
    InvalidKey(#[from] base64::DecodeError),
    #[error("failed to prepare credential workspace: {0}")]
    Io(#[from] std::io::Error),
    #[error("asc auth login failed ({status})\n{output}")]
    Login { status: ExitStatus, output: String },
    #[error("asc apps list failed ({status})\n{output}")]
    List { status: ExitStatus, output: String },
    #[error("failed to parse asc output: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("could not run gh: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("gh exited with {status}: {output}")]
    Failed { status: ExitStatus, output: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("workspace path does not exist: {0}")]
    WorkspaceMissing(String),
    #[error("ASC private key is not valid base64")]
    InvalidBase64,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to render workflow template: {0}")]
    Render(#[from] minijinja::Error),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),
}

/// Terminal conditions of the wizard flow.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("wizard canceled")]
    Canceled,
    #[error("{0} CLI is required")]
    MissingTool(&'static str),
    #[error("failed to validate App Store Connect credentials: {0}")]
    Credentials(#[source] AscError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("p8 file not found: {0}")]
    KeyFileMissing(PathBuf),
    #[error("could not read .p8 file {0}: {1}")]
    KeyFileRead(PathBuf, #[source] std::io::Error),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
    #[error(transparent)]
    Output(#[from] std::io::Error),
}

impl WizardError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, WizardError::Canceled)
    }
}
