#![warn(clippy::pedantic)]

//! # tfget
//!
//! Downloads Terraform releases into a local cache and switches between them
//! by retargeting a single link, `<cache root>/terraform`.
//!
//! ## Subcommands
//!
//! - `list` / `list-local` - List cached versions, marking the active one
//! - `list-remote` - List versions published on the release index
//! - `download <selector>` - Cache a version
//! - `switch <selector>` / `use <selector>` - Cache and activate a version
//! - `which` / `which-version` - Print the active version
//!
//! A selector is `latest`, a full version, or a fragment matched as a
//! substring against the release index (newest first).
//!
//! ## Examples
//!
//! ```bash
//! tfget switch 1.5.7
//! export PATH="$HOME/.tfget/versions:$PATH"
//! terraform version
//! ```

mod commands;
mod config;
mod errors;
mod logging;
mod toolchain;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{SelectorArgs, download, list, list_remote, switch, which};
use errors::TfgetError;

/// Terraform version manager.
#[derive(Parser)]
#[command(
    name = "tfget",
    author,
    version,
    about = "Download, cache and switch between Terraform versions",
    disable_help_subcommand = true,
    after_help = "\
ENVIRONMENT VARIABLES:
    TFGET_HOME                Cache directory (default: ~/.tfget/versions)
    TFGET_RELEASES_URL        Release index (default: https://releases.hashicorp.com/terraform/)
    TFGET_SYSTEM_INSTALL      System-wide install that blocks switching (default: /usr/local/bin/terraform)
    TFGET_TIMEOUT_SECS        HTTP request deadline in seconds (default: 10)
    TFGET_MAX_EXTRACT_BYTES   Extraction size limit (default: 1073741824)
    TFGET_LOG                 Log filter, e.g. debug (falls back to RUST_LOG)"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the tfget CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// List cached versions.
    #[command(visible_alias = "list-local")]
    List,

    /// List versions available on the release index, newest first.
    ListRemote,

    /// Download a version into the cache without activating it.
    Download(SelectorArgs),

    /// Download a version if needed and make it the active one.
    #[command(visible_alias = "use")]
    Switch(SelectorArgs),

    /// Print the active version.
    #[command(visible_alias = "which-version")]
    Which,

    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Logs the error and returns the exit code for it.
///
/// Usage errors exit with 2, everything else with 1.
fn handle_error(e: &anyhow::Error) -> i32 {
    tracing::error!("{e:#}");
    e.downcast_ref::<TfgetError>()
        .map_or(1, TfgetError::exit_code)
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => list::execute(),
        Some(Commands::ListRemote) => list_remote::execute().await,
        Some(Commands::Download(args)) => download::execute(&args).await,
        Some(Commands::Switch(args)) => switch::execute(&args).await,
        Some(Commands::Which) => which::execute(),
        Some(Commands::Unknown(args)) => Err(TfgetError::unknown_command(format!(
            "unknown command '{}'",
            args.first().map_or("", String::as_str)
        ))
        .into()),
        None => Err(TfgetError::unknown_command("no command given").into()),
    }
}
