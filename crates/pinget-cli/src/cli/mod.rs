//! CLI for pinget.

mod commands;
mod progress;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use pinget_core::config;
use std::path::PathBuf;

use commands::{
    run_checksum, run_completions, run_extract, run_fetch, run_list, run_probe, run_verify,
};

/// Top-level CLI for pinget.
#[derive(Debug, Parser)]
#[command(name = "pinget", version)]
#[command(
    about = "pinget: pinned-TLS resumable archive download, verification and extraction",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the SHA-256 fingerprint of the leaf certificate a host presents.
    Probe {
        /// Host name or IP address.
        host: String,
        #[arg(long, default_value = "443")]
        port: u16,
    },

    /// Download an archive over pinned TLS, verify it, optionally extract it,
    /// and print its SHA-256.
    Fetch(FetchArgs),

    /// Check every member of a zip archive.
    Verify {
        /// Path to the archive.
        path: PathBuf,
    },

    /// Extract a zip archive into a directory.
    Extract {
        /// Path to the archive.
        path: PathBuf,
        /// Output directory (created if missing).
        out: PathBuf,
        /// Only extract members whose path contains this (case-insensitive).
        #[arg(long)]
        filter: Option<String>,
    },

    /// List the members of a zip archive.
    List {
        /// Path to the archive.
        path: PathBuf,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print shell completions to stdout.
    Completions {
        shell: Shell,
    },
}

/// Options for `pinget fetch`. Flags override the config file.
#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// HTTPS URL of the archive.
    pub url: String,

    /// Destination file; an existing partial file is resumed.
    pub dest: PathBuf,

    /// Expected SHA-256 of the server's leaf certificate (hex, `:` separators allowed).
    #[arg(long, conflicts_with = "trust_on_first_use")]
    pub pin: Option<String>,

    /// Pin whatever leaf certificate the host presents right now.
    #[arg(long)]
    pub trust_on_first_use: bool,

    /// Upstream HTTP proxy.
    #[arg(long, env = "HTTPS_PROXY")]
    pub proxy: Option<String>,

    #[arg(long)]
    pub proxy_user: Option<String>,

    #[arg(long)]
    pub proxy_password: Option<String>,

    /// Maximum number of attempts.
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Linear backoff unit in seconds.
    #[arg(long, value_name = "SECS")]
    pub backoff: Option<f64>,

    /// Transfer chunk size in bytes.
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Fail when the final size differs from the advertised size.
    #[arg(long)]
    pub strict_size: bool,

    /// Extract the archive into this directory after verification.
    #[arg(long, value_name = "DIR")]
    pub extract_to: Option<PathBuf>,

    /// With --extract-to, only extract members whose path contains this.
    #[arg(long, requires = "extract_to")]
    pub filter: Option<String>,

    /// Skip the archive integrity check.
    #[arg(long)]
    pub skip_verify: bool,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        // The transport section may hold proxy credentials; keep it out of the log.
        tracing::debug!(retry = ?cfg.retry, chunk_size = cfg.chunk_size, "loaded config");

        match cli.command {
            CliCommand::Probe { host, port } => run_probe(&cfg, &host, port)?,
            CliCommand::Fetch(args) => run_fetch(&cfg, &args)?,
            CliCommand::Verify { path } => run_verify(&path)?,
            CliCommand::Extract { path, out, filter } => run_extract(&path, &out, filter)?,
            CliCommand::List { path } => run_list(&path)?,
            CliCommand::Checksum { path } => run_checksum(&path)?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
