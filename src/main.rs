use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use release_toolkit::cli::{self, ReleaseArgs};

const LOG_ENV: &str = "RELEASE_TOOLKIT_LOG";

#[derive(Parser)]
#[command(
    name = "release-toolkit",
    version,
    about = "Release workspaces of a repository from their commit history"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, global = true, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Release every configured workspace (default)
    Release,
    /// Check a commit message file against the configured patterns
    CommitLint {
        /// File holding the commit message, e.g. .git/COMMIT_EDITMSG
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command.unwrap_or(Command::Release) {
        Command::Release => {
            let release_args = ReleaseArgs {
                config_path: args.config,
                dry_run: args.dry_run,
            };
            if cli::run_release(release_args).await.is_err() {
                std::process::exit(1);
            }
        }
        Command::CommitLint { file } => {
            match cli::run_commit_lint(args.config.as_deref(), &file) {
                Ok(true) => {}
                Ok(false) => std::process::exit(1),
                Err(e) => {
                    release_toolkit::ui::display_error(&format!("{:#}", e));
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
