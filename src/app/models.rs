use std::fmt;
use std::path::PathBuf;

/// Represents the final configuration after merging the config file with defaults.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub workflow_path: PathBuf,
    pub skip_dirs: Vec<String>,
}

/// Everything the wizard collects. Each phase fills its own subset of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    pub workspace: String,
    pub scheme: String,
    pub bundle_id: String,
    pub team_id: String,
    pub app_id: String,
    pub app_name: Option<String>,
    pub asc_key_id: String,
    pub asc_issuer_id: String,
    pub asc_private_key_b64: String,
    pub github_repo: Option<RepoSlug>,
    pub secrets_were_set: bool,
    pub workflow_was_written: bool,
    pub workflow_path: String,
}

/// An app registered in App Store Connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AscApp {
    pub id: String,
    pub name: String,
    pub bundle_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Best-effort results of scanning the current directory for an Xcode project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDetection {
    /// Workspace bundles relative to the scan root, sorted.
    pub workspaces: Vec<String>,
    pub schemes: Vec<String>,
    pub team_id: Option<String>,
}

/// Which external tools the wizard can lean on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolStatus {
    pub asc: bool,
    pub xcodebuild: bool,
    pub gh: bool,
    pub gh_authenticated: bool,
}
