mod cmd_config;
mod cmd_decode;
mod cmd_open;
mod config;
mod logging;
#[cfg(feature = "tui")]
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stagehand",
    version,
    about = "Terminal client for a version-control engine"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open a repository in the working-set view
    Open {
        /// Repository directory (defaults to whatever the engine picks)
        path: Option<PathBuf>,
        /// Engine command line, e.g. "vcs-engine --stdio"
        #[arg(long)]
        engine: Option<String>,
        /// Author recorded on commits
        #[arg(long)]
        author: Option<String>,
        /// Write logs here instead of the default location
        #[arg(long)]
        log_file: Option<PathBuf>,
        /// Print one line per engine notification instead of the terminal UI
        #[arg(long)]
        plain: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Decode a record batch and print its records
    Decode {
        /// Batch text, e.g. "5:a.txt3:b.c"
        batch: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = config::config_path();

    match cli.cmd {
        Command::Open {
            path,
            engine,
            author,
            log_file,
            plain,
        } => cmd_open::execute(
            cmd_open::OpenParams {
                path,
                overrides: config::Overrides {
                    engine,
                    author,
                    log_file,
                },
                plain,
            },
            &config_path,
        ),
        Command::Config { cmd } => cmd_config::run(cmd, &config_path),
        Command::Decode { batch } => cmd_decode::execute(&batch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_open_with_flags() {
        let cli = Cli::try_parse_from([
            "stagehand",
            "open",
            "/work/repo",
            "--engine",
            "vcs-engine --stdio",
            "--author",
            "ada",
            "--plain",
        ])
        .unwrap();
        match cli.cmd {
            Command::Open {
                path,
                engine,
                author,
                plain,
                ..
            } => {
                assert_eq!(path, Some(PathBuf::from("/work/repo")));
                assert_eq!(engine.as_deref(), Some("vcs-engine --stdio"));
                assert_eq!(author.as_deref(), Some("ada"));
                assert!(plain);
            }
            _ => panic!("expected open"),
        }
    }
}
