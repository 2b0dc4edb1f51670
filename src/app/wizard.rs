use crate::app::asc::CredentialClient;
use crate::app::errors::WizardError;
use crate::app::github::SecretStore;
use crate::app::models::{AscApp, Inputs, ProjectDetection, RepoSlug, RuntimeConfig, ToolStatus};
use crate::app::prompt::{Prompter, Question};
use crate::app::scanner::detect_project;
use crate::app::summary::print_summary;
use crate::app::theme::{with_spinner, Theme};
use crate::app::validate::{encode_file_base64, normalize_base64, validate_inputs};
use crate::app::workflow::{render_workflow, write_workflow};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

const ASC_INSTALL_HINT: &str = "brew install rudrankriyam/tap/asc";

const API_KEY_NOTE: &str = "1. Go to appstoreconnect.apple.com > Users and Access > Integrations > API Keys\n\
2. Create a key with the App Manager role\n\
3. Download the .p8 file (it can only be downloaded once)\n\
4. Note the Key ID and Issuer ID shown on that page";

/// Where the App Store Connect private key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    File,
    Paste,
}

impl KeySource {
    pub const ALL: [KeySource; 2] = [KeySource::File, KeySource::Paste];

    pub fn label(self) -> &'static str {
        match self {
            KeySource::File => "Local .p8 file (recommended)",
            KeySource::Paste => "Paste base64",
        }
    }

    /// The one follow-up question this source needs.
    pub fn question(self) -> Question<'static> {
        match self {
            KeySource::File => {
                Question::new("Path to .p8 file").hint("/path/to/AuthKey_ABC123XY45.p8")
            }
            KeySource::Paste => Question::new("Base64 private key").hint("LS0tLS1CRUdJTi..."),
        }
    }

    /// Turns the answer into base64 key material.
    pub fn resolve(self, answer: &str) -> Result<String, WizardError> {
        match self {
            KeySource::File => {
                let path = expand_home(answer.trim());
                if !path.is_file() {
                    return Err(WizardError::KeyFileMissing(path));
                }
                encode_file_base64(&path).map_err(|e| WizardError::KeyFileRead(path, e))
            }
            KeySource::Paste => Ok(normalize_base64(answer)),
        }
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

fn check_line(out: &mut dyn Write, theme: &Theme, name: &str, ok: bool) -> std::io::Result<()> {
    if ok {
        writeln!(out, "  {} {}", theme.success("✓"), name)
    } else {
        writeln!(out, "  {} {}", theme.muted("✗"), name)
    }
}

/// Reports the tool probe. Only a missing `asc` stops the wizard.
pub fn check_prerequisites(
    out: &mut dyn Write,
    theme: &Theme,
    tools: ToolStatus,
) -> Result<ToolStatus, WizardError> {
    writeln!(out, "{}", theme.section("Prerequisites"))?;
    check_line(out, theme, "asc", tools.asc)?;
    check_line(out, theme, "xcodebuild", tools.xcodebuild)?;
    check_line(out, theme, "gh", tools.gh)?;

    if tools.gh {
        if tools.gh_authenticated {
            writeln!(out, "  {} gh authenticated", theme.success("✓"))?;
        } else {
            writeln!(
                out,
                "  {} gh not authenticated (run: gh auth login)",
                theme.muted("○")
            )?;
        }
    }
    writeln!(out)?;

    if !tools.asc {
        writeln!(out, "{}", theme.error("asc CLI not found. Install it with:"))?;
        writeln!(out, "{}", theme.value(&format!("  {}", ASC_INSTALL_HINT)))?;
        writeln!(out)?;
        return Err(WizardError::MissingTool("asc"));
    }
    Ok(tools)
}

/// Phase 1: issuer id, key id and the private key.
pub fn collect_credentials(
    prompter: &mut dyn Prompter,
    mut inputs: Inputs,
) -> Result<Inputs, WizardError> {
    prompter.note("App Store Connect API Key", API_KEY_NOTE)?;

    inputs.asc_issuer_id = prompter
        .input(Question::new("Issuer ID").hint("xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"))?
        .trim()
        .to_string();
    inputs.asc_key_id = prompter
        .input(Question::new("Key ID").hint("ABC123XY45"))?
        .trim()
        .to_string();

    let labels: Vec<String> = KeySource::ALL.iter().map(|s| s.label().to_string()).collect();
    let source = KeySource::ALL[prompter.select("Private key source", &labels)?];

    let answer = prompter.input(source.question())?;
    inputs.asc_private_key_b64 = source.resolve(&answer)?;
    Ok(inputs)
}

/// Phase 2: pick a fetched app, or type the identifiers when none came back.
pub fn select_application(
    prompter: &mut dyn Prompter,
    apps: &[AscApp],
    mut inputs: Inputs,
) -> Result<Inputs, WizardError> {
    if apps.is_empty() {
        inputs.app_id = prompter
            .input(Question::new("App Store Connect App ID").hint("1234567890"))?
            .trim()
            .to_string();
        inputs.bundle_id = prompter
            .input(Question::new("Bundle ID").hint("com.example.myapp"))?
            .trim()
            .to_string();
        inputs.app_name = None;
        return Ok(inputs);
    }

    let labels: Vec<String> = apps
        .iter()
        .map(|app| format!("{} ({})", app.name, app.bundle_id))
        .collect();
    let app = &apps[prompter.select("Select your app", &labels)?];

    inputs.app_id = app.id.clone();
    inputs.app_name = Some(app.name.clone());
    inputs.bundle_id = app.bundle_id.clone();
    Ok(inputs)
}

/// Phase 3: workspace, scheme, team id and bundle id, seeded by detection.
pub fn configure_project(
    prompter: &mut dyn Prompter,
    detection: &ProjectDetection,
    mut inputs: Inputs,
) -> Result<Inputs, WizardError> {
    inputs.workspace = match detection.workspaces.as_slice() {
        [] => prompter.input(Question::new("Xcode workspace path").hint("MyApp.xcworkspace"))?,
        [only] => {
            prompter.note("Xcode Workspace", &format!("Detected: {}", only))?;
            only.clone()
        }
        many => many[prompter.select("Select Xcode workspace", many)?].clone(),
    }
    .trim()
    .to_string();

    inputs.scheme = if detection.schemes.is_empty() {
        prompter.input(Question::new("Xcode scheme"))?
    } else {
        detection.schemes[prompter.select("Select Xcode scheme", &detection.schemes)?].clone()
    }
    .trim()
    .to_string();

    let use_detected = match &detection.team_id {
        Some(team_id) => {
            prompter.confirm(&format!("Use detected Apple Team ID: {}?", team_id), true)?
        }
        None => false,
    };
    inputs.team_id = match (&detection.team_id, use_detected) {
        (Some(team_id), true) => team_id.clone(),
        _ => prompter
            .input(Question::new("Apple Team ID").hint("XXXXXXXXXX"))?
            .trim()
            .to_string(),
    };

    let prefill = inputs.bundle_id.clone();
    let mut bundle_question = Question::new("Bundle ID").hint("com.example.myapp");
    if !prefill.is_empty() {
        bundle_question = bundle_question.initial(&prefill);
    }
    inputs.bundle_id = prompter.input(bundle_question)?.trim().to_string();
    Ok(inputs)
}

/// What phase 4 can rely on.
pub struct RepositorySetup<'a> {
    pub gh_authenticated: bool,
    pub repo: Option<RepoSlug>,
    pub workflow_path: &'a Path,
    pub store: &'a dyn SecretStore,
}

fn secret_values(inputs: &Inputs) -> BTreeMap<String, String> {
    [
        ("ASC_KEY_ID", &inputs.asc_key_id),
        ("ASC_ISSUER_ID", &inputs.asc_issuer_id),
        ("ASC_PRIVATE_KEY_B64", &inputs.asc_private_key_b64),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.clone()))
    .collect()
}

/// Phase 4: optional secret publishing, then optional workflow generation.
pub fn setup_repository(
    out: &mut dyn Write,
    theme: &Theme,
    prompter: &mut dyn Prompter,
    setup: RepositorySetup<'_>,
    mut inputs: Inputs,
) -> Result<Inputs, WizardError> {
    inputs.github_repo = setup.repo.clone();

    if let Some(repo) = setup.repo.as_ref().filter(|_| setup.gh_authenticated) {
        let title = format!("Set GitHub secrets automatically for {}?", repo);
        if prompter.confirm(&title, false)? {
            let results = setup.store.set_secrets(repo, &secret_values(&inputs));
            for (name, result) in &results {
                match result {
                    Ok(()) => writeln!(out, "  {} {} set", theme.success("✓"), name)?,
                    Err(err) => writeln!(
                        out,
                        "  {} Failed to set {}: {}",
                        theme.error("✗"),
                        name,
                        err
                    )?,
                }
            }
            inputs.secrets_were_set = !results.is_empty() && results.values().all(Result::is_ok);
            writeln!(out)?;
        }
    }

    let path = setup.workflow_path;
    if !prompter.confirm(&format!("Generate {}?", path.display()), false)? {
        return Ok(inputs);
    }
    inputs.workflow_path = path.display().to_string();

    if path.exists() {
        let title = format!("{} already exists. Overwrite?", path.display());
        if !prompter.confirm(&title, false)? {
            log::info!("keeping existing {}", path.display());
            return Ok(inputs);
        }
    }

    let content = render_workflow(&inputs)?;
    write_workflow(path, &content)?;
    inputs.workflow_was_written = true;
    writeln!(out, "  {} {} written", theme.success("✓"), path.display())?;
    writeln!(out)?;
    Ok(inputs)
}

/// Everything the flow talks to outside the prompter.
pub struct Services<'a> {
    pub tools: ToolStatus,
    pub credentials: &'a dyn CredentialClient,
    pub secrets: &'a dyn SecretStore,
    pub detect_remote: fn() -> Option<RepoSlug>,
    /// Where Xcode bundles are searched for.
    pub project_root: &'a Path,
}

/// Runs every phase in order. Any fatal error ends the whole flow.
pub fn run(
    config: &RuntimeConfig,
    services: &Services<'_>,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<Inputs, WizardError> {
    let theme = Theme::new();

    writeln!(out, "{}", theme.title("ReleaseKit-iOS Wizard"))?;
    writeln!(
        out,
        "{}",
        theme.muted("Guided setup for distributing iOS apps to the App Store.")
    )?;
    writeln!(out)?;

    let tools = check_prerequisites(out, &theme, services.tools)?;

    writeln!(out, "{}", theme.section("Phase 1: App Store Connect Credentials"))?;
    writeln!(out)?;
    let inputs = collect_credentials(prompter, Inputs::default())?;

    let apps = with_spinner("Validating App Store Connect credentials…", || {
        services.credentials.list_applications(
            &inputs.asc_key_id,
            &inputs.asc_issuer_id,
            &inputs.asc_private_key_b64,
        )
    })
    .map_err(WizardError::Credentials)?;
    writeln!(
        out,
        "{} App Store Connect credentials validated ({} apps found)",
        theme.success("✓"),
        apps.len()
    )?;
    writeln!(out)?;

    writeln!(out, "{}", theme.section("Phase 2: App Selection"))?;
    writeln!(out)?;
    let inputs = select_application(prompter, &apps, inputs)?;

    writeln!(out, "{}", theme.section("Phase 3: Xcode Project"))?;
    writeln!(out)?;
    let detection = with_spinner("Detecting Xcode project…", || {
        detect_project(services.project_root, &config.skip_dirs, tools.xcodebuild)
    });
    let inputs = configure_project(prompter, &detection, inputs)?;
    validate_inputs(&inputs)?;

    writeln!(out, "{}", theme.section("Phase 4: GitHub Setup"))?;
    writeln!(out)?;
    let repo = if tools.gh_authenticated {
        with_spinner("Detecting git repository…", services.detect_remote)
    } else {
        None
    };
    let setup = RepositorySetup {
        gh_authenticated: tools.gh_authenticated,
        repo,
        workflow_path: &config.workflow_path,
        store: services.secrets,
    };
    let inputs = setup_repository(out, &theme, prompter, setup, inputs)?;

    print_summary(out, &theme, &inputs)?;
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::DEFAULT_SKIP_DIRS;
    use crate::app::errors::{AscError, GitHubError, ValidationError};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;

    #[derive(Debug)]
    enum Answer {
        Text(String),
        /// Keep the pre-filled value.
        Accept,
        Choice(usize),
        Yes,
        No,
        Cancel,
    }

    fn text(value: &str) -> Answer {
        Answer::Text(value.to_string())
    }

    #[derive(Default)]
    struct ScriptedPrompter {
        answers: VecDeque<Answer>,
        asked: Vec<String>,
        confirm_defaults: Vec<bool>,
    }

    impl ScriptedPrompter {
        fn new(answers: Vec<Answer>) -> Self {
            Self {
                answers: answers.into(),
                ..Self::default()
            }
        }

        fn next(&mut self, asked: String) -> Answer {
            self.asked.push(asked.clone());
            self.answers
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted answer for {asked}"))
        }

        fn finished(&self) -> bool {
            self.answers.is_empty()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn note(&mut self, title: &str, _body: &str) -> Result<(), WizardError> {
            self.asked.push(format!("note: {title}"));
            Ok(())
        }

        fn input(&mut self, question: Question<'_>) -> Result<String, WizardError> {
            match self.next(format!("input: {}", question.title)) {
                Answer::Text(text) => Ok(text),
                Answer::Accept => Ok(question.initial.unwrap_or_default().to_string()),
                Answer::Cancel => Err(WizardError::Canceled),
                other => panic!("{other:?} does not answer {}", question.title),
            }
        }

        fn select(&mut self, title: &str, items: &[String]) -> Result<usize, WizardError> {
            match self.next(format!("select: {title}")) {
                Answer::Choice(i) if i < items.len() => Ok(i),
                Answer::Cancel => Err(WizardError::Canceled),
                other => panic!("{other:?} does not answer {title}"),
            }
        }

        fn confirm(&mut self, title: &str, default: bool) -> Result<bool, WizardError> {
            self.confirm_defaults.push(default);
            match self.next(format!("confirm: {title}")) {
                Answer::Yes => Ok(true),
                Answer::No => Ok(false),
                Answer::Cancel => Err(WizardError::Canceled),
                other => panic!("{other:?} does not answer {title}"),
            }
        }
    }

    /// Records what was published and fails the named secrets.
    #[derive(Default)]
    struct FakeStore {
        failing: Vec<&'static str>,
        published: RefCell<Vec<(String, String)>>,
    }

    impl SecretStore for FakeStore {
        fn set_secrets(
            &self,
            repo: &RepoSlug,
            secrets: &BTreeMap<String, String>,
        ) -> BTreeMap<String, Result<(), GitHubError>> {
            secrets
                .iter()
                .map(|(name, value)| {
                    self.published
                        .borrow_mut()
                        .push((format!("{repo}:{name}"), value.clone()));
                    let result = if self.failing.contains(&name.as_str()) {
                        Err(GitHubError::Spawn(std::io::Error::other("boom")))
                    } else {
                        Ok(())
                    };
                    (name.clone(), result)
                })
                .collect()
        }
    }

    fn apps() -> Vec<AscApp> {
        vec![
            AscApp {
                id: "1".into(),
                name: "App One".into(),
                bundle_id: "com.one".into(),
            },
            AscApp {
                id: "2".into(),
                name: "App Two".into(),
                bundle_id: "com.two".into(),
            },
        ]
    }

    fn configured_inputs() -> Inputs {
        Inputs {
            workspace: "App.xcworkspace".into(),
            scheme: "App".into(),
            bundle_id: "com.example.app".into(),
            team_id: "ABCDE12345".into(),
            app_id: "123".into(),
            asc_key_id: "KEY".into(),
            asc_issuer_id: "ISSUER".into(),
            asc_private_key_b64: "cHJpdmF0ZS1rZXk=".into(),
            ..Inputs::default()
        }
    }

    fn repo() -> RepoSlug {
        RepoSlug {
            owner: "acme".into(),
            name: "app".into(),
        }
    }

    #[test]
    fn key_sources_ask_exactly_one_question() {
        assert_eq!(KeySource::File.question().title, "Path to .p8 file");
        assert_eq!(KeySource::Paste.question().title, "Base64 private key");
        assert_eq!(KeySource::ALL.len(), 2);
    }

    #[test]
    fn pasted_key_is_normalized() {
        let mut prompter = ScriptedPrompter::new(vec![
            text(" issuer-1 "),
            text("KEY123"),
            Answer::Choice(1),
            text("YWJj\n ZGVm\t"),
        ]);

        let inputs = collect_credentials(&mut prompter, Inputs::default()).unwrap();
        assert_eq!(inputs.asc_issuer_id, "issuer-1");
        assert_eq!(inputs.asc_key_id, "KEY123");
        assert_eq!(inputs.asc_private_key_b64, "YWJjZGVm");
        assert_eq!(
            prompter.asked,
            vec![
                "note: App Store Connect API Key",
                "input: Issuer ID",
                "input: Key ID",
                "select: Private key source",
                "input: Base64 private key",
            ]
        );
    }

    #[test]
    fn key_file_is_read_and_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AuthKey_TEST.p8");
        fs::write(&path, "abc").unwrap();

        let mut prompter = ScriptedPrompter::new(vec![
            text("issuer"),
            text("key"),
            Answer::Choice(0),
            text(&path.display().to_string()),
        ]);
        let inputs = collect_credentials(&mut prompter, Inputs::default()).unwrap();
        assert_eq!(inputs.asc_private_key_b64, "YWJj");
        assert_eq!(prompter.asked.last().unwrap(), "input: Path to .p8 file");
    }

    #[test]
    fn missing_key_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.p8");
        assert!(matches!(
            KeySource::File.resolve(&missing.display().to_string()),
            Err(WizardError::KeyFileMissing(p)) if p == missing
        ));
    }

    #[test]
    fn cancel_stops_credential_collection() {
        let mut prompter = ScriptedPrompter::new(vec![text("issuer"), Answer::Cancel]);
        let err = collect_credentials(&mut prompter, Inputs::default()).unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(err.to_string(), "wizard canceled");
    }

    #[test]
    fn fetched_apps_are_offered_as_a_list() {
        let mut prompter = ScriptedPrompter::new(vec![Answer::Choice(1)]);
        let inputs = select_application(&mut prompter, &apps(), Inputs::default()).unwrap();
        assert_eq!(inputs.app_id, "2");
        assert_eq!(inputs.app_name.as_deref(), Some("App Two"));
        assert_eq!(inputs.bundle_id, "com.two");
        assert!(prompter.finished());
    }

    #[test]
    fn no_apps_falls_back_to_manual_entry() {
        let mut prompter =
            ScriptedPrompter::new(vec![text(" 6449 "), text("com.example.app")]);
        let inputs = select_application(&mut prompter, &[], Inputs::default()).unwrap();
        assert_eq!(inputs.app_id, "6449");
        assert_eq!(inputs.bundle_id, "com.example.app");
        assert_eq!(inputs.app_name, None);
        assert_eq!(
            prompter.asked,
            vec!["input: App Store Connect App ID", "input: Bundle ID"]
        );
    }

    #[test]
    fn nothing_detected_means_typing_everything() {
        let mut prompter = ScriptedPrompter::new(vec![
            text("App.xcworkspace"),
            text("App"),
            text("ABCDE12345"),
            Answer::Accept,
        ]);
        let seed = Inputs {
            bundle_id: "com.two".into(),
            ..Inputs::default()
        };

        let inputs =
            configure_project(&mut prompter, &ProjectDetection::default(), seed).unwrap();
        assert_eq!(inputs.workspace, "App.xcworkspace");
        assert_eq!(inputs.scheme, "App");
        assert_eq!(inputs.team_id, "ABCDE12345");
        assert_eq!(inputs.bundle_id, "com.two");
        assert_eq!(
            prompter.asked,
            vec![
                "input: Xcode workspace path",
                "input: Xcode scheme",
                "input: Apple Team ID",
                "input: Bundle ID",
            ]
        );
    }

    #[test]
    fn single_detection_is_used_without_asking() {
        let detection = ProjectDetection {
            workspaces: vec!["App.xcworkspace".into()],
            schemes: vec!["App".into(), "AppTests".into()],
            team_id: Some("ABCDE12345".into()),
        };
        let mut prompter = ScriptedPrompter::new(vec![
            Answer::Choice(0),
            Answer::Yes,
            text("com.edited"),
        ]);

        let inputs = configure_project(&mut prompter, &detection, Inputs::default()).unwrap();
        assert_eq!(inputs.workspace, "App.xcworkspace");
        assert_eq!(inputs.scheme, "App");
        assert_eq!(inputs.team_id, "ABCDE12345");
        assert_eq!(inputs.bundle_id, "com.edited");
        assert_eq!(
            prompter.asked,
            vec![
                "note: Xcode Workspace",
                "select: Select Xcode scheme",
                "confirm: Use detected Apple Team ID: ABCDE12345?",
                "input: Bundle ID",
            ]
        );
    }

    #[test]
    fn rejected_team_id_is_typed_instead() {
        let detection = ProjectDetection {
            workspaces: vec!["A.xcworkspace".into(), "sub/B.xcworkspace".into()],
            schemes: Vec::new(),
            team_id: Some("ABCDE12345".into()),
        };
        let mut prompter = ScriptedPrompter::new(vec![
            Answer::Choice(1),
            text("B"),
            Answer::No,
            text("ZZZZZ99999"),
            text("com.b"),
        ]);

        let inputs = configure_project(&mut prompter, &detection, Inputs::default()).unwrap();
        assert_eq!(inputs.workspace, "sub/B.xcworkspace");
        assert_eq!(inputs.team_id, "ZZZZZ99999");
        assert_eq!(prompter.asked[0], "select: Select Xcode workspace");
        assert!(prompter.finished());
    }

    #[test]
    fn missing_asc_is_fatal_with_hint() {
        let mut out = Vec::new();
        let err = check_prerequisites(&mut out, &Theme::plain(), ToolStatus::default())
            .unwrap_err();
        assert!(matches!(err, WizardError::MissingTool("asc")));
        assert_eq!(err.to_string(), "asc CLI is required");
        assert!(String::from_utf8(out).unwrap().contains(ASC_INSTALL_HINT));
    }

    #[test]
    fn optional_tools_only_degrade() {
        let tools = ToolStatus {
            asc: true,
            xcodebuild: false,
            gh: true,
            gh_authenticated: false,
        };
        let mut out = Vec::new();
        assert_eq!(
            check_prerequisites(&mut out, &Theme::plain(), tools).unwrap(),
            tools
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("✗ xcodebuild"));
        assert!(text.contains("gh not authenticated (run: gh auth login)"));
    }

    #[test]
    fn publishes_secrets_and_writes_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".github/workflows/release.yml");
        let store = FakeStore::default();
        let mut prompter = ScriptedPrompter::new(vec![Answer::Yes, Answer::Yes]);
        let mut out = Vec::new();

        let setup = RepositorySetup {
            gh_authenticated: true,
            repo: Some(repo()),
            workflow_path: &path,
            store: &store,
        };
        let inputs = setup_repository(
            &mut out,
            &Theme::plain(),
            &mut prompter,
            setup,
            configured_inputs(),
        )
        .unwrap();

        assert!(inputs.secrets_were_set);
        assert!(inputs.workflow_was_written);
        assert_eq!(inputs.github_repo, Some(repo()));
        assert_eq!(
            store.published.borrow().iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec![
                "acme/app:ASC_ISSUER_ID",
                "acme/app:ASC_KEY_ID",
                "acme/app:ASC_PRIVATE_KEY_B64",
            ]
        );
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("workspace: App.xcworkspace"));
    }

    #[test]
    fn one_failed_secret_clears_the_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.yml");
        let store = FakeStore {
            failing: vec!["ASC_KEY_ID"],
            ..FakeStore::default()
        };
        let mut prompter = ScriptedPrompter::new(vec![Answer::Yes, Answer::No]);
        let mut out = Vec::new();

        let setup = RepositorySetup {
            gh_authenticated: true,
            repo: Some(repo()),
            workflow_path: &path,
            store: &store,
        };
        let inputs = setup_repository(
            &mut out,
            &Theme::plain(),
            &mut prompter,
            setup,
            configured_inputs(),
        )
        .unwrap();

        assert!(!inputs.secrets_were_set);
        assert!(!inputs.workflow_was_written);
        assert_eq!(store.published.borrow().len(), 3);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Failed to set ASC_KEY_ID: could not run gh: boom"));
        assert!(text.contains("✓ ASC_ISSUER_ID set"));
    }

    #[test]
    fn unauthenticated_gh_skips_publishing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.yml");
        let store = FakeStore::default();
        let mut prompter = ScriptedPrompter::new(vec![Answer::No]);

        let setup = RepositorySetup {
            gh_authenticated: false,
            repo: Some(repo()),
            workflow_path: &path,
            store: &store,
        };
        let inputs = setup_repository(
            &mut Vec::new(),
            &Theme::plain(),
            &mut prompter,
            setup,
            configured_inputs(),
        )
        .unwrap();

        assert!(store.published.borrow().is_empty());
        assert_eq!(prompter.asked, vec![format!("confirm: Generate {}?", path.display())]);
        assert!(!inputs.secrets_were_set);
    }

    #[test]
    fn existing_workflow_is_kept_when_overwrite_declined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.yml");
        fs::write(&path, "mine").unwrap();
        let store = FakeStore::default();
        let mut prompter = ScriptedPrompter::new(vec![Answer::Yes, Answer::No]);

        let setup = RepositorySetup {
            gh_authenticated: true,
            repo: None,
            workflow_path: &path,
            store: &store,
        };
        let inputs = setup_repository(
            &mut Vec::new(),
            &Theme::plain(),
            &mut prompter,
            setup,
            configured_inputs(),
        )
        .unwrap();

        assert!(!inputs.workflow_was_written);
        assert_eq!(inputs.workflow_path, path.display().to_string());
        assert_eq!(fs::read_to_string(&path).unwrap(), "mine");
        assert_eq!(
            prompter.asked.last().unwrap(),
            &format!("confirm: {} already exists. Overwrite?", path.display())
        );
    }

    #[test]
    fn cancel_at_overwrite_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.yml");
        fs::write(&path, "mine").unwrap();
        let store = FakeStore::default();
        let mut prompter = ScriptedPrompter::new(vec![Answer::Yes, Answer::Cancel]);

        let setup = RepositorySetup {
            gh_authenticated: false,
            repo: None,
            workflow_path: &path,
            store: &store,
        };
        let err = setup_repository(
            &mut Vec::new(),
            &Theme::plain(),
            &mut prompter,
            setup,
            configured_inputs(),
        )
        .unwrap_err();
        assert!(err.is_canceled());
        assert_eq!(fs::read_to_string(&path).unwrap(), "mine");
    }

    #[test]
    fn publishing_and_generation_default_to_no() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("release.yml");
        let store = FakeStore::default();
        let mut prompter = ScriptedPrompter::new(vec![Answer::No, Answer::No]);

        let setup = RepositorySetup {
            gh_authenticated: true,
            repo: Some(repo()),
            workflow_path: &path,
            store: &store,
        };
        setup_repository(
            &mut Vec::new(),
            &Theme::plain(),
            &mut prompter,
            setup,
            configured_inputs(),
        )
        .unwrap();

        assert_eq!(prompter.confirm_defaults, vec![false, false]);
    }

    /// Returns `apps`, or fails like an unreachable `asc` when `apps` is `None`.
    struct FakeCredentials {
        apps: Option<Vec<AscApp>>,
        calls: RefCell<Vec<(String, String, String)>>,
    }

    impl FakeCredentials {
        fn returning(apps: Vec<AscApp>) -> Self {
            Self {
                apps: Some(apps),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                apps: None,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CredentialClient for FakeCredentials {
        fn list_applications(
            &self,
            key_id: &str,
            issuer_id: &str,
            private_key_b64: &str,
        ) -> Result<Vec<AscApp>, AscError> {
            self.calls.borrow_mut().push((
                key_id.to_string(),
                issuer_id.to_string(),
                private_key_b64.to_string(),
            ));
            self.apps
                .clone()
                .ok_or_else(|| AscError::Io(std::io::Error::other("asc unreachable")))
        }
    }

    const ALL_TOOLS: ToolStatus = ToolStatus {
        asc: true,
        xcodebuild: false,
        gh: true,
        gh_authenticated: true,
    };

    /// A scratch directory with an empty project root and a workflow path inside it.
    struct Sandbox {
        dir: tempfile::TempDir,
        config: RuntimeConfig,
    }

    impl Sandbox {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir(dir.path().join("project")).unwrap();
            let config = RuntimeConfig {
                workflow_path: dir.path().join(".github/workflows/release.yml"),
                skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            };
            Self { dir, config }
        }

        fn project_root(&self) -> PathBuf {
            self.dir.path().join("project")
        }

        fn run(
            &self,
            tools: ToolStatus,
            credentials: &FakeCredentials,
            store: &FakeStore,
            prompter: &mut ScriptedPrompter,
        ) -> (Result<Inputs, WizardError>, String) {
            let root = self.project_root();
            let services = Services {
                tools,
                credentials,
                secrets: store,
                detect_remote: || {
                    Some(RepoSlug {
                        owner: "acme".into(),
                        name: "app".into(),
                    })
                },
                project_root: &root,
            };
            let mut out = Vec::new();
            let result = run(&self.config, &services, prompter, &mut out);
            (result, String::from_utf8(out).unwrap())
        }
    }

    fn credential_answers() -> Vec<Answer> {
        vec![
            text("issuer"),
            text("KEY123"),
            Answer::Choice(1),
            text("cHJpdmF0ZS1rZXk="),
        ]
    }

    #[test]
    fn full_flow_publishes_and_writes() {
        let sandbox = Sandbox::new();
        let workspace = sandbox.dir.path().join("App.xcworkspace");
        fs::create_dir(&workspace).unwrap();

        let credentials = FakeCredentials::returning(apps());
        let store = FakeStore::default();
        let mut answers = credential_answers();
        answers.extend([
            Answer::Choice(0),
            text(&workspace.display().to_string()),
            text("App"),
            text("ABCDE12345"),
            Answer::Accept,
            Answer::Yes,
            Answer::Yes,
        ]);
        let mut prompter = ScriptedPrompter::new(answers);

        let (result, out) = sandbox.run(ALL_TOOLS, &credentials, &store, &mut prompter);
        let inputs = result.unwrap();

        assert!(prompter.finished());
        assert_eq!(
            credentials.calls.borrow().as_slice(),
            &[(
                "KEY123".to_string(),
                "issuer".to_string(),
                "cHJpdmF0ZS1rZXk=".to_string()
            )]
        );
        assert_eq!(inputs.app_name.as_deref(), Some("App One"));
        assert_eq!(inputs.bundle_id, "com.one");
        assert!(inputs.secrets_were_set);
        assert!(inputs.workflow_was_written);
        assert_eq!(store.published.borrow().len(), 3);
        assert!(sandbox.config.workflow_path.is_file());
        assert!(out.contains("(2 apps found)"));
        assert!(out.contains("Wizard Completed"));
    }

    #[test]
    fn credential_failure_stops_before_app_selection() {
        let sandbox = Sandbox::new();
        let credentials = FakeCredentials::failing();
        let store = FakeStore::default();
        let mut prompter = ScriptedPrompter::new(credential_answers());

        let (result, out) = sandbox.run(ALL_TOOLS, &credentials, &store, &mut prompter);

        let err = result.unwrap_err();
        assert!(matches!(err, WizardError::Credentials(AscError::Io(_))));
        assert!(!err.is_canceled());
        assert_eq!(prompter.asked.last().unwrap(), "input: Base64 private key");
        assert!(prompter.finished());
        assert!(!out.contains("Phase 2"));
        assert!(!out.contains("Phase 3"));
        assert!(store.published.borrow().is_empty());
        assert!(!sandbox.config.workflow_path.exists());
    }

    #[test]
    fn validation_failure_stops_before_github_setup() {
        let sandbox = Sandbox::new();
        let missing = sandbox.dir.path().join("Missing.xcworkspace");
        let credentials = FakeCredentials::returning(Vec::new());
        let store = FakeStore::default();
        let mut answers = credential_answers();
        answers.extend([
            text("6449"),
            text("com.example.app"),
            text(&missing.display().to_string()),
            text("App"),
            text("ABCDE12345"),
            Answer::Accept,
        ]);
        let mut prompter = ScriptedPrompter::new(answers);

        let (result, out) = sandbox.run(ALL_TOOLS, &credentials, &store, &mut prompter);

        assert!(matches!(
            result,
            Err(WizardError::Validation(ValidationError::WorkspaceMissing(_)))
        ));
        assert!(prompter.finished());
        assert_eq!(prompter.asked.last().unwrap(), "input: Bundle ID");
        assert!(prompter.asked.iter().all(|q| !q.starts_with("confirm:")));
        assert!(!out.contains("Phase 4"));
        assert!(store.published.borrow().is_empty());
        assert!(!sandbox.config.workflow_path.exists());
    }

    #[test]
    fn cancel_mid_flow_ends_the_run() {
        let sandbox = Sandbox::new();
        let credentials = FakeCredentials::returning(apps());
        let store = FakeStore::default();
        let mut answers = credential_answers();
        answers.extend([Answer::Choice(1), text("App.xcworkspace"), Answer::Cancel]);
        let mut prompter = ScriptedPrompter::new(answers);

        let (result, out) = sandbox.run(ALL_TOOLS, &credentials, &store, &mut prompter);

        assert!(result.unwrap_err().is_canceled());
        assert!(prompter.finished());
        assert_eq!(prompter.asked.last().unwrap(), "input: Xcode scheme");
        assert!(!out.contains("Phase 4"));
        assert!(!out.contains("Wizard Completed"));
        assert!(store.published.borrow().is_empty());
        assert!(!sandbox.config.workflow_path.exists());
    }

    #[test]
    fn missing_asc_stops_before_any_prompt() {
        let sandbox = Sandbox::new();
        let credentials = FakeCredentials::returning(apps());
        let store = FakeStore::default();
        let mut prompter = ScriptedPrompter::default();
        let tools = ToolStatus {
            asc: false,
            ..ALL_TOOLS
        };

        let (result, out) = sandbox.run(tools, &credentials, &store, &mut prompter);

        assert!(matches!(result, Err(WizardError::MissingTool("asc"))));
        assert!(prompter.asked.is_empty());
        assert!(credentials.calls.borrow().is_empty());
        assert!(out.contains(ASC_INSTALL_HINT));
    }
}
