//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// buildfleet: builds every SDK library configuration in parallel.
#[derive(Debug, Parser)]
#[command(name = "buildfleet", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./buildfleet.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log orchestration events to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the SDK library from source for all supported configurations.
    Build {
        /// Maximum number of builds to run at once.
        #[arg(long, short, value_parser = clap::value_parser!(u16).range(1..))]
        jobs: Option<u16>,

        /// Print each status change on a new line instead of redrawing.
        #[arg(long)]
        plain: bool,

        /// Build even if the current directory is not the SDK repository root.
        #[arg(long)]
        skip_repo_check: bool,

        /// Write a JSON summary of the run to this path.
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_build_defaults() {
        let cli = Cli::parse_from(["buildfleet", "build"]);
        let Command::Build {
            jobs,
            plain,
            skip_repo_check,
            summary,
        } = cli.command;
        assert!(jobs.is_none());
        assert!(!plain);
        assert!(!skip_repo_check);
        assert!(summary.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn cli_parses_build_flags() {
        let cli = Cli::parse_from([
            "buildfleet",
            "--verbose",
            "--config",
            "ci.toml",
            "build",
            "-j",
            "2",
            "--plain",
            "--summary",
            "out.json",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
        let Command::Build {
            jobs,
            plain,
            summary,
            ..
        } = cli.command;
        assert_eq!(jobs, Some(2));
        assert!(plain);
        assert_eq!(summary, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn cli_rejects_zero_jobs() {
        let result = Cli::try_parse_from(["buildfleet", "build", "--jobs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
