use crate::app::errors::WorkflowError;
use crate::app::models::Inputs;
use minijinja::syntax::SyntaxConfig;
use minijinja::{context, Environment};
use std::fs;
use std::path::Path;

pub const DEFAULT_WORKFLOW_PATH: &str = ".github/workflows/release.yml";

/// GitHub Actions owns `${{ ... }}`, so the template only reacts to `[[ ... ]]`.
const WORKFLOW_TEMPLATE: &str = r#"name: Release iOS App

on:
  workflow_dispatch:
  push:
    tags:
      - 'v*'

jobs:
  archive:
    name: Archive
    runs-on: macos-latest
    outputs:
      ipa-path: ${{ steps.archive.outputs.ipa_path }}

    steps:
      - uses: actions/checkout@v4

      - name: Setup ASC
        uses: rudrankriyam/setup-asc@v1

      - name: Archive
        id: archive
        uses: vinceglb/releasekit-ios/actions/archive@v0
        with:
          workspace: [[ workspace ]]
          scheme: [[ scheme ]]
          bundle-id: ${{ vars.BUNDLE_ID }}
          team-id: ${{ vars.ASC_TEAM_ID }}
          asc-key-id: ${{ secrets.ASC_KEY_ID }}
          asc-issuer-id: ${{ secrets.ASC_ISSUER_ID }}
          asc-private-key-b64: ${{ secrets.ASC_PRIVATE_KEY_B64 }}

  upload:
    name: Upload
    runs-on: macos-latest
    needs: archive

    steps:
      - uses: actions/checkout@v4

      - name: Setup ASC
        uses: rudrankriyam/setup-asc@v1

      - name: Upload
        uses: vinceglb/releasekit-ios/actions/upload@v0
        with:
          ipa-path: ${{ needs.archive.outputs.ipa-path }}
          app-id: ${{ vars.ASC_APP_ID }}
          asc-key-id: ${{ secrets.ASC_KEY_ID }}
          asc-issuer-id: ${{ secrets.ASC_ISSUER_ID }}
          asc-private-key-b64: ${{ secrets.ASC_PRIVATE_KEY_B64 }}
"#;

fn environment() -> Result<Environment<'static>, WorkflowError> {
    let syntax = SyntaxConfig::builder()
        .block_delimiters("[%", "%]")
        .variable_delimiters("[[", "]]")
        .comment_delimiters("[#", "#]")
        .build()?;

    let mut env = Environment::new();
    env.set_syntax(syntax);
    env.set_keep_trailing_newline(true);
    env.add_template("release.yml", WORKFLOW_TEMPLATE)?;
    Ok(env)
}

/// Renders the release workflow with the workspace and scheme filled in.
pub fn render_workflow(inputs: &Inputs) -> Result<String, WorkflowError> {
    let env = environment()?;
    let template = env.get_template("release.yml")?;
    let rendered = template.render(context! {
        workspace => inputs.workspace,
        scheme => inputs.scheme,
    })?;
    Ok(rendered)
}

/// Writes the workflow, creating parent directories and replacing any existing file.
pub fn write_workflow(path: &Path, content: &str) -> Result<(), WorkflowError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| WorkflowError::Write(parent.to_path_buf(), e))?;
    }
    fs::write(path, content).map_err(|e| WorkflowError::Write(path.to_path_buf(), e))
}
