// Declare modules
pub mod asc;
pub mod cli;
pub mod config;
pub mod errors;
pub mod github;
pub mod models;
pub mod probe;
pub mod prompt;
pub mod scanner;
pub mod summary;
pub mod theme;
pub mod validate;
pub mod version;
pub mod wizard;
pub mod workflow;

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io;
use std::path::Path;

use self::asc::AscClient;
use self::cli::{Cli, Commands};
use self::config::resolve_config;
use self::github::GitHubCli;
use self::probe::{detect_remote_repo, probe_tools};
use self::prompt::TerminalPrompter;
use self::wizard::Services;

/// Parses the command line and dispatches to the chosen command.
pub fn run() -> Result<()> {
    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            print!("{}", version::render());
            Ok(())
        }
        Commands::Wizard => {
            let config = resolve_config()?;
            log::debug!("workflow path: {}", config.workflow_path.display());

            let credentials = AscClient::default();
            let secrets = GitHubCli::default();
            let services = Services {
                tools: probe_tools(),
                credentials: &credentials,
                secrets: &secrets,
                detect_remote: detect_remote_repo,
                project_root: Path::new("."),
            };

            let mut prompter = TerminalPrompter::default();
            let mut stdout = io::stdout();
            // wizard errors already carry their causes in the message
            wizard::run(&config, &services, &mut prompter, &mut stdout)
                .map_err(|err| anyhow!("{}", err))?;
            Ok(())
        }
    }
}
