use crate::app::errors::AscError;
use crate::app::models::AscApp;
use crate::app::validate::normalize_base64;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const PROFILE_NAME: &str = "releasekit-ios-wizard";
const KEY_FILE_NAME: &str = "AuthKey.p8";

/// Variables the `asc` subprocess must only ever see with our values.
pub const CONTROLLED_ENV: [&str; 5] = [
    "HOME",
    "ASC_BYPASS_KEYCHAIN",
    "ASC_KEY_ID",
    "ASC_ISSUER_ID",
    "ASC_PRIVATE_KEY_PATH",
];

#[derive(Deserialize)]
struct AppRecord {
    id: String,
    #[serde(default)]
    attributes: AppAttributes,
}

#[derive(Deserialize, Default)]
struct AppAttributes {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "bundleId")]
    bundle_id: String,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<AppRecord>,
}

impl From<AppRecord> for AscApp {
    fn from(record: AppRecord) -> Self {
        AscApp {
            id: record.id,
            name: record.attributes.name,
            bundle_id: record.attributes.bundle_id,
        }
    }
}

/// Accepts both a bare JSON array and a `{"data": [...]}` envelope.
pub fn parse_applications(raw: &[u8]) -> Result<Vec<AscApp>, AscError> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<AppRecord> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        serde_json::from_str::<Envelope>(trimmed)?.data
    };
    Ok(records.into_iter().map(AscApp::from).collect())
}

/// Credentials as handed to the `asc` subprocess.
struct AscSession<'a> {
    home: PathBuf,
    key_id: &'a str,
    issuer_id: &'a str,
    key_path: PathBuf,
}

/// Copies the ambient environment minus [`CONTROLLED_ENV`], then appends the session values.
fn build_asc_env<I>(ambient: I, session: &AscSession<'_>) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: Vec<(OsString, OsString)> = ambient
        .into_iter()
        .filter(|(name, _)| !CONTROLLED_ENV.iter().any(|c| OsStr::new(c) == name))
        .collect();

    env.push(("HOME".into(), session.home.clone().into_os_string()));
    env.push(("ASC_BYPASS_KEYCHAIN".into(), "1".into()));
    env.push(("ASC_KEY_ID".into(), session.key_id.into()));
    env.push(("ASC_ISSUER_ID".into(), session.issuer_id.into()));
    env.push((
        "ASC_PRIVATE_KEY_PATH".into(),
        session.key_path.clone().into_os_string(),
    ));
    env
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text.trim().to_string()
}

#[cfg(unix)]
fn write_private_key(path: &Path, key: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(key)
}

#[cfg(not(unix))]
fn write_private_key(path: &Path, key: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(key)
}

/// Validates App Store Connect credentials by listing the account's apps.
pub trait CredentialClient {
    fn list_applications(
        &self,
        key_id: &str,
        issuer_id: &str,
        private_key_b64: &str,
    ) -> Result<Vec<AscApp>, AscError>;
}

/// Client for the App Store Connect `asc` CLI.
pub struct AscClient {
    program: OsString,
}

impl Default for AscClient {
    fn default() -> Self {
        Self::new("asc")
    }
}

impl AscClient {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CredentialClient for AscClient {
    /// Logs in with an isolated `asc` home and lists the account's apps.
    /// The decoded key lives in a temp dir that is removed on every return path.
    fn list_applications(
        &self,
        key_id: &str,
        issuer_id: &str,
        private_key_b64: &str,
    ) -> Result<Vec<AscApp>, AscError> {
        let key = STANDARD.decode(normalize_base64(private_key_b64))?;

        let workdir = tempfile::Builder::new()
            .prefix("releasekit-wizard-")
            .tempdir()?;
        let key_path = workdir.path().join(KEY_FILE_NAME);
        write_private_key(&key_path, &key)?;

        let home = workdir.path().join("asc-home");
        fs::create_dir_all(&home)?;

        let session = AscSession {
            home,
            key_id,
            issuer_id,
            key_path,
        };
        let env = build_asc_env(std::env::vars_os(), &session);

        log::debug!("running asc auth login");
        let login = Command::new(&self.program)
            .args(["auth", "login", "--bypass-keychain", "--skip-validation"])
            .args(["--name", PROFILE_NAME])
            .args(["--key-id", key_id, "--issuer-id", issuer_id])
            .arg("--private-key")
            .arg(&session.key_path)
            .env_clear()
            .envs(env.iter().cloned())
            .output()?;
        if !login.status.success() {
            return Err(AscError::Login {
                status: login.status,
                output: combined_output(&login),
            });
        }

        log::debug!("running asc apps list");
        let list = Command::new(&self.program)
            .args(["apps", "list", "--output", "json"])
            .env_clear()
            .envs(env)
            .output()?;
        if !list.status.success() {
            return Err(AscError::List {
                status: list.status,
                output: combined_output(&list),
            });
        }

        let apps = parse_applications(&list.stdout)?;
        log::info!("asc returned {} app(s)", apps.len());
        Ok(apps)
    }
}
