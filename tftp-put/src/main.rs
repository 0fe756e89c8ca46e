//! Entry point for `tftp-put`.
//!
//! Parses CLI arguments, opens the local file (or stdin) and uploads it.
//! All protocol work is delegated to library modules; `main.rs` owns only
//! process setup (logging, argument parsing).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tftp_put::{put, ReaderSource, TransferConfig, TransferMode};

/// Upload a file to a TFTP server.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Server address, `host` or `host:port` (port defaults to 69).
    server: String,

    /// Local file to upload, or `-` for stdin.
    file: PathBuf,

    /// Name to store the file under on the server (defaults to the local file name).
    #[arg(short, long)]
    remote: Option<String>,

    /// Transfer mode sent in the write request.
    #[arg(short, long, default_value = "octet")]
    mode: TransferMode,

    /// Seconds to wait for each acknowledgement before retransmitting.
    #[arg(short, long, default_value_t = 5)]
    timeout: u64,

    /// Attempts per packet before giving up.
    #[arg(short = 'n', long, default_value_t = 5)]
    retries: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();
    let config = TransferConfig::default()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_retry_count(cli.retries);

    let from_stdin = cli.file.as_os_str() == "-";
    let remote = match (cli.remote, from_stdin) {
        (Some(name), _) => name,
        (None, true) => anyhow::bail!("--remote is required when reading stdin"),
        (None, false) => cli
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .context("cannot derive a remote name from the file path")?,
    };

    let summary = if from_stdin {
        let mut source = ReaderSource::new(tokio::io::stdin());
        put(&cli.server, &remote, cli.mode, &mut source, config).await?
    } else {
        let file = tokio::fs::File::open(&cli.file)
            .await
            .with_context(|| format!("cannot open {}", cli.file.display()))?;
        let mut source = ReaderSource::new(file);
        put(&cli.server, &remote, cli.mode, &mut source, config).await?
    };

    log::info!(
        "Sent {} bytes to {} as {remote:?}",
        summary.bytes,
        summary.peer
    );
    Ok(())
}
