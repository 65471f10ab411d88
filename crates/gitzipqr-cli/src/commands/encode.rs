use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gitzipqr_core::pipeline::{self, CancelFlag};

use super::ConfigArgs;
use crate::auth;

#[derive(Args, Debug, Clone)]
pub struct EncodeArgs {
    /// File or directory to encode
    pub input: PathBuf,

    /// Directory for the rendered qr-NNNNNN.png symbols
    #[arg(default_value = "qrcodes")]
    pub output: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn execute(args: EncodeArgs, passwords: &[String], cancel: &CancelFlag) -> Result<()> {
    let cfg = args.config.build()?;
    let passwords = auth::resolve_passwords(passwords, true)?;

    let summary = pipeline::encode(&args.input, &args.output, &passwords, &cfg, cancel)
        .with_context(|| format!("encoding {}", args.input.display()))?;

    tracing::info!(
        symbols = summary.total_chunks,
        output = %summary.output_dir.display(),
        "done"
    );
    Ok(())
}
