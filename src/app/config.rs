use crate::app::models::RuntimeConfig;
use crate::app::scanner::build_globset;
use crate::app::workflow::DEFAULT_WORKFLOW_PATH;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Directories never descended into while looking for Xcode projects.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    ".git",
    "Pods",
    "Carthage",
    ".build",
    "DerivedData",
    "node_modules",
    ".swiftpm",
];

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    workflow_path: Option<String>,
    skip_dirs: Option<Vec<String>>,
}

fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home
        .join(".config")
        .join("releasekit-ios")
        .join("config.toml"))
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {:?}", path))?;

    toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

fn merge_vecs(defaults: &[&str], extra: Option<Vec<String>>) -> Vec<String> {
    let mut combined: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
    combined.extend(extra.unwrap_or_default());
    // Deduplicate while keeping order
    let mut seen = std::collections::HashSet::new();
    combined.retain(|item| seen.insert(item.clone()));
    combined
}

/// The workflow must stay under `.github/workflows/` as a YAML file.
fn check_workflow_path(raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw);
    let inside = path.starts_with(".github/workflows")
        && path.components().all(|c| matches!(c, Component::Normal(_)))
        && path.components().count() > 2;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    );
    if !inside || !yaml {
        bail!(
            "workflow_path must be a .yml/.yaml file under .github/workflows/, got {}",
            raw
        );
    }
    Ok(path)
}

fn resolve(file: ConfigFile) -> Result<RuntimeConfig> {
    let workflow_path = match file.workflow_path {
        Some(raw) => check_workflow_path(&raw)?,
        None => PathBuf::from(DEFAULT_WORKFLOW_PATH),
    };

    let skip_dirs = merge_vecs(DEFAULT_SKIP_DIRS, file.skip_dirs);
    build_globset(&skip_dirs).context("skip_dirs contains an invalid pattern")?;

    Ok(RuntimeConfig {
        workflow_path,
        skip_dirs,
    })
}

pub fn resolve_config() -> Result<RuntimeConfig> {
    let path = config_path()?;
    let file = load_config_file(&path)?;
    log::debug!("config resolved from {:?}", path);
    resolve(file)
}
