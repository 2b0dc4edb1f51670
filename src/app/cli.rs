use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "releasekit-ios",
    about = "ReleaseKit-iOS CLI",
    long_about = "ReleaseKit-iOS CLI for onboarding and setup workflows."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print CLI version information
    Version,
    /// Run guided setup wizard
    Wizard,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["releasekit-ios", "wizard"]).unwrap();
        assert_eq!(cli.command, Commands::Wizard);
        let cli = Cli::try_parse_from(["releasekit-ios", "version"]).unwrap();
        assert_eq!(cli.command, Commands::Version);
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(Cli::try_parse_from(["releasekit-ios", "deploy"]).is_err());
        assert!(Cli::try_parse_from(["releasekit-ios"]).is_err());
    }
}
