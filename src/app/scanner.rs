use crate::app::models::ProjectDetection;
use crate::app::probe::output_with_timeout;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use pathdiff::diff_paths;
use regex::Regex;
use serde::Deserialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

const WORKSPACE_PATTERN: &str = "*.xcworkspace";
const PBXPROJ_NAME: &str = "project.pbxproj";
const XCODEPROJ_SUFFIX: &str = ".xcodeproj";

pub const SCHEME_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

static TEAM_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"DEVELOPMENT_TEAM\s*=\s*([A-Z0-9]{10})\s*;").expect("valid team id regex")
});

/// Walks a directory tree looking for Xcode workspace bundles.
pub struct ProjectScanner {
    root: PathBuf,
    skip_set: GlobSet,
    bundle_set: GlobSet,
}

impl ProjectScanner {
    pub fn new(root: PathBuf, skip_dirs: &[String]) -> Result<Self> {
        Ok(Self {
            root,
            skip_set: build_globset(skip_dirs)?,
            bundle_set: build_globset(&[WORKSPACE_PATTERN.to_string()])?,
        })
    }

    /// Every workspace bundle under the root, relative and sorted.
    pub fn find_all_workspaces(&self) -> Vec<String> {
        let mut matches = Vec::new();

        for result in self.walker(&self.root) {
            match result {
                Ok(entry) => {
                    if let Some(relative) = self.bundle_match(&entry) {
                        matches.push(relative);
                    }
                }
                Err(err) => log::debug!("Error walking entry: {}", err),
            }
        }

        matches.sort();
        matches
    }

    /// The lexicographically first workspace bundle, if any.
    pub fn find_workspace(&self) -> Option<String> {
        self.find_all_workspaces().into_iter().next()
    }

    /// Finds the first `project.pbxproj` inside an `.xcodeproj` next to the workspace
    /// and returns its most frequent `DEVELOPMENT_TEAM`.
    pub fn detect_team_id(&self, workspace: &Path) -> Option<String> {
        let parent = match workspace.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let pbxproj = self.walker(&parent).flatten().find(|entry| {
            entry.file_type().is_some_and(|t| t.is_file())
                && entry.file_name() == PBXPROJ_NAME
                && entry.path().to_string_lossy().contains(XCODEPROJ_SUFFIX)
        })?;

        match fs::read_to_string(pbxproj.path()) {
            Ok(content) => most_frequent_team_id(&content),
            Err(err) => {
                log::debug!("could not read {}: {}", pbxproj.path().display(), err);
                None
            }
        }
    }

    fn walker(&self, root: &Path) -> ignore::Walk {
        let skip_set = self.skip_set.clone();
        let bundle_set = self.bundle_set.clone();

        WalkBuilder::new(root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if is_dir(entry) && skip_set.is_match(entry.file_name()) {
                    return false;
                }
                // Bundles are reported but never descended into.
                let inside_bundle = entry.depth() > 1
                    && entry
                        .path()
                        .parent()
                        .and_then(|p| p.file_name())
                        .is_some_and(|name| bundle_set.is_match(name));
                !inside_bundle
            })
            .build()
    }

    fn bundle_match(&self, entry: &DirEntry) -> Option<String> {
        if entry.depth() == 0 || !is_dir(entry) || !self.bundle_set.is_match(entry.file_name()) {
            return None;
        }
        let relative = diff_paths(entry.path(), &self.root)?;
        Some(relative.to_string_lossy().replace('\\', "/"))
    }
}

fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|t| t.is_dir())
}

/// Counts `DEVELOPMENT_TEAM = XXXXXXXXXX;` assignments. Ties go to the first value seen.
pub fn most_frequent_team_id(content: &str) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for caps in TEAM_ID_RE.captures_iter(content) {
        let id = caps.get(1)?.as_str();
        match counts.iter_mut().find(|(seen, _)| *seen == id) {
            Some((_, count)) => *count += 1,
            None => counts.push((id, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (id, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((id, count));
        }
    }
    best.map(|(id, _)| id.to_string())
}

#[derive(Deserialize)]
struct XcodeList {
    #[serde(default)]
    workspace: XcodeListWorkspace,
}

#[derive(Deserialize, Default)]
struct XcodeListWorkspace {
    #[serde(default)]
    schemes: Vec<String>,
}

/// Parses `xcodebuild -list -json`. `None` when the output is not the expected JSON.
pub fn parse_scheme_list(raw: &[u8]) -> Option<Vec<String>> {
    match serde_json::from_slice::<XcodeList>(raw) {
        Ok(list) => Some(list.workspace.schemes),
        Err(err) => {
            log::debug!("unexpected xcodebuild -list output: {}", err);
            None
        }
    }
}

/// Asks `xcodebuild` for the workspace schemes. Empty on any failure.
pub fn detect_schemes(workspace: &Path) -> Vec<String> {
    list_schemes("xcodebuild", workspace)
}

fn list_schemes(program: impl AsRef<OsStr>, workspace: &Path) -> Vec<String> {
    let mut command = Command::new(program);
    command
        .arg("-list")
        .arg("-workspace")
        .arg(workspace)
        .arg("-json");

    output_with_timeout(command, SCHEME_PROBE_TIMEOUT)
        .and_then(|raw| parse_scheme_list(&raw))
        .unwrap_or_default()
}

/// Bundle discovery plus, for a single unambiguous workspace, scheme and team id hints.
pub fn detect_project(root: &Path, skip_dirs: &[String], probe_schemes: bool) -> ProjectDetection {
    let scanner = match ProjectScanner::new(root.to_path_buf(), skip_dirs) {
        Ok(scanner) => scanner,
        Err(err) => {
            log::warn!("project detection disabled: {:#}", err);
            return ProjectDetection::default();
        }
    };

    let workspaces = scanner.find_all_workspaces();
    let mut detection = ProjectDetection {
        workspaces,
        ..ProjectDetection::default()
    };

    if let [only] = detection.workspaces.as_slice() {
        let path = root.join(only);
        if probe_schemes {
            detection.schemes = detect_schemes(&path);
        }
        detection.team_id = scanner.detect_team_id(&path);
    }

    log::debug!(
        "detected {} workspace(s), {} scheme(s), team id {:?}",
        detection.workspaces.len(),
        detection.schemes.len(),
        detection.team_id
    );
    detection
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat).context(format!("Invalid glob pattern: {}", pat))?);
    }
    Ok(builder.build()?)
}
