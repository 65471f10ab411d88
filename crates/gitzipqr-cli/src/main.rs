#![forbid(unsafe_code)]

//! gitzipqr: encrypted QR-code backups for files and directories.

mod auth;
mod commands;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use tracing_subscriber::EnvFilter;

use gitzipqr_core::pipeline::cancel_flag;

use crate::commands::{decode, encode};

#[derive(Parser)]
#[command(name = "gitzipqr")]
#[command(author, version, about = "Turn any file or folder into encrypted QR-code images and back")]
#[command(propagate_version = true)]
struct Cli {
    /// Password (insecure on the command line; prefer the interactive
    /// prompt or the GITZIPQR_PASSWORD env var). Repeat for
    /// multi-password derivation.
    #[arg(long, env = "GITZIPQR_PASSWORD", hide_env_values = true, global = true)]
    password: Vec<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file or directory into QR symbols
    Encode(encode::EncodeArgs),

    /// Decode a directory of QR symbols back into the original
    Decode(decode::DecodeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(std::io::stderr)
        .init();

    // First Ctrl-C (or SIGTERM) sets the cancellation flag: the control
    // thread aborts between steps, in-flight workers finish their
    // current job, and the temporary directory is removed on unwind.
    // A second signal exits immediately.
    let cancel = cancel_flag();
    for &sig in TERM_SIGNALS {
        flag::register_conditional_shutdown(sig, 1, Arc::clone(&cancel))?;
        flag::register(sig, Arc::clone(&cancel))?;
    }
    {
        let cancel = Arc::clone(&cancel);
        std::thread::spawn(move || {
            while !cancel.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(50));
            }
            eprintln!("\ninterrupt received, stopping after in-flight work (Ctrl+C again to force exit)");
        });
    }

    match cli.command {
        Commands::Encode(args) => encode::execute(args, &cli.password, &cancel),
        Commands::Decode(args) => decode::execute(args, &cli.password, &cancel),
    }
}
