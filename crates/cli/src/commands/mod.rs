//! CLI command definitions and execution
//!
//! The bare form `skycp <src> <dst>` copies; `region` and `completions` are
//! informational subcommands.

use clap::{Parser, Subcommand};
use skycp_core::{Config, ConfigManager};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod completions;
pub mod cp;
mod region;

/// skycp - copy files to and from S3 and Google Cloud Storage
///
/// Remote addresses use a short notation:
/// `s3:<region>:<bucket>:<key>` or `gs://<bucket>/<key>`.
/// A key ending in `/` (or an empty key) names a folder.
#[derive(Parser, Debug)]
#[command(name = "skycp")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub copy: cp::CpArgs,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the regions accepted in s3: addresses
    #[command(visible_alias = "reg")]
    Region,

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let flags = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    match cli.command {
        Some(Commands::Region) => region::execute(flags),
        Some(Commands::Completions(args)) => completions::execute(args),
        None => copy(cli.copy, flags).await,
    }
}

/// The config file only feeds copies; the informational commands never read it
async fn copy(args: cp::CpArgs, flags: OutputConfig) -> ExitCode {
    let file_config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            Formatter::new(flags).error(&format!("Failed to load config: {e}"));
            return ExitCode::from(&e);
        }
    };

    let output_config = flags.with_defaults(&file_config.defaults);
    cp::execute(args, &file_config, output_config).await
}

fn load_config() -> skycp_core::Result<Config> {
    ConfigManager::new()?.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_copy_flags() {
        let cli = Cli::try_parse_from([
            "skycp",
            "-p",
            "--storage",
            "standard_ia",
            "./file",
            "s3:us-east-1:bucket:path/",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert!(cli.copy.public);
        assert_eq!(cli.copy.storage.as_deref(), Some("standard_ia"));
        assert_eq!(cli.copy.source.as_deref(), Some("./file"));
        assert_eq!(cli.copy.target.as_deref(), Some("s3:us-east-1:bucket:path/"));
    }

    #[test]
    fn test_parse_region_alias() {
        let cli = Cli::try_parse_from(["skycp", "reg"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Region)));
    }

    #[test]
    fn test_parse_without_paths() {
        let cli = Cli::try_parse_from(["skycp", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.copy.source.is_none());
        assert!(cli.command.is_none());
    }
}
