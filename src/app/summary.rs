use crate::app::models::Inputs;
use crate::app::theme::Theme;
use std::io::{self, Write};

fn print_kv(out: &mut dyn Write, theme: &Theme, label: &str, value: &str) -> io::Result<()> {
    writeln!(
        out,
        "  {} {}",
        theme.label(&format!("{:<12}", format!("{}:", label))),
        theme.value(value)
    )
}

fn next_steps(inputs: &Inputs) -> Vec<String> {
    let mut steps = Vec::new();
    if !inputs.secrets_were_set {
        steps.push("Add the GitHub Secrets above to your repository".to_string());
    }
    steps.push("Add the GitHub Variables above to your repository".to_string());
    if inputs.workflow_was_written && !inputs.workflow_path.is_empty() {
        steps.push(format!("Commit and push {}", inputs.workflow_path));
    } else {
        steps.push("Add a release workflow (see docs for a template)".to_string());
    }
    steps.push("Push a v* tag to trigger your release".to_string());
    steps
}

/// Prints everything the wizard collected plus what is left to do.
pub fn print_summary(out: &mut dyn Write, theme: &Theme, inputs: &Inputs) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", theme.section("Wizard Completed"))?;
    writeln!(out, "{}", theme.muted("Setup values collected successfully."))?;
    writeln!(out)?;

    writeln!(out, "{}", theme.section("Configuration"))?;
    if let Some(name) = inputs.app_name.as_deref().filter(|n| !n.is_empty()) {
        print_kv(out, theme, "App Name", name)?;
    }
    print_kv(out, theme, "Workspace", &inputs.workspace)?;
    print_kv(out, theme, "Scheme", &inputs.scheme)?;
    print_kv(out, theme, "Bundle ID", &inputs.bundle_id)?;
    print_kv(out, theme, "Team ID", &inputs.team_id)?;
    print_kv(out, theme, "App ID", &inputs.app_id)?;
    if let Some(repo) = &inputs.github_repo {
        print_kv(out, theme, "Repository", &repo.to_string())?;
    }
    writeln!(out)?;

    let mut secrets_title = theme.section("GitHub Secrets");
    if inputs.secrets_were_set {
        secrets_title.push(' ');
        secrets_title.push_str(&theme.success("(✓ set automatically)"));
    }
    writeln!(out, "{}", secrets_title)?;
    for (name, value) in [
        ("ASC_KEY_ID", &inputs.asc_key_id),
        ("ASC_ISSUER_ID", &inputs.asc_issuer_id),
        ("ASC_PRIVATE_KEY_B64", &inputs.asc_private_key_b64),
    ] {
        writeln!(out, "  {}", theme.value(&format!("{}={}", name, value)))?;
    }
    writeln!(out)?;

    writeln!(out, "{}", theme.section("GitHub Variables"))?;
    for (name, value) in [
        ("ASC_APP_ID", &inputs.app_id),
        ("ASC_TEAM_ID", &inputs.team_id),
        ("BUNDLE_ID", &inputs.bundle_id),
    ] {
        writeln!(out, "  {}", theme.value(&format!("{}={}", name, value)))?;
    }
    writeln!(out)?;

    writeln!(out, "{}", theme.section("Next Steps"))?;
    for (i, step) in next_steps(inputs).iter().enumerate() {
        writeln!(out, "{}", theme.muted(&format!("  {}) {}", i + 1, step)))?;
    }
    Ok(())
}
