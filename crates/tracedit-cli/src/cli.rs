use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tracedit",
    about = "tracedit: inspect graphics API traces and debugging sessions",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Editor configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show trace metadata and call statistics
    Inspect(InspectArgs),
    /// Export the call list as text
    Calls(CallsArgs),
    /// Search the call list
    Search(SearchArgs),
    /// Inspect or check session files
    Session(SessionArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    pub trace: PathBuf,
}

#[derive(Args)]
pub struct CallsArgs {
    pub trace: PathBuf,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct SearchArgs {
    pub trace: PathBuf,
    pub text: String,
    /// Start after this call index
    #[arg(long)]
    pub from: Option<u64>,
    /// Search backward
    #[arg(long)]
    pub prev: bool,
    #[arg(long)]
    pub case_sensitive: bool,
    #[arg(long, conflicts_with = "all")]
    pub wrap: bool,
    /// List every match
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Print a session document
    Show { session: PathBuf },
    /// Load a session against its base trace and report skipped records
    Check { session: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_inspect() {
        let cli = Cli::try_parse_from(["tracedit", "inspect", "game.json"]).unwrap();
        if let Command::Inspect(args) = cli.command {
            assert_eq!(args.trace, PathBuf::from("game.json"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_calls_output() {
        let cli = Cli::try_parse_from(["tracedit", "calls", "game.json", "-o", "calls.txt"]).unwrap();
        if let Command::Calls(args) = cli.command {
            assert_eq!(args.output, Some(PathBuf::from("calls.txt")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_search() {
        let cli = Cli::try_parse_from([
            "tracedit", "search", "game.json", "glDraw", "--from", "40", "--prev", "--case-sensitive",
        ])
        .unwrap();
        if let Command::Search(args) = cli.command {
            assert_eq!(args.text, "glDraw");
            assert_eq!(args.from, Some(40));
            assert!(args.prev);
            assert!(args.case_sensitive);
            assert!(!args.wrap);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_search_wrap_conflicts_with_all() {
        assert!(Cli::try_parse_from(["tracedit", "search", "t.json", "x", "--wrap", "--all"]).is_err());
        assert!(Cli::try_parse_from(["tracedit", "search", "t.json", "x", "--all"]).is_ok());
    }

    #[test]
    fn parse_session_show() {
        let cli = Cli::try_parse_from(["tracedit", "session", "show", "s.json"]).unwrap();
        if let Command::Session(args) = cli.command {
            assert!(matches!(args.action, SessionAction::Show { .. }));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_session_check() {
        let cli = Cli::try_parse_from(["tracedit", "session", "check", "s.json"]).unwrap();
        if let Command::Session(args) = cli.command {
            assert!(matches!(args.action, SessionAction::Check { session } if session == PathBuf::from("s.json")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "tracedit", "--verbose", "--config", "editor.toml", "--format", "json", "inspect", "t.json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("editor.toml")));
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn session_requires_action() {
        assert!(Cli::try_parse_from(["tracedit", "session"]).is_err());
    }
}
