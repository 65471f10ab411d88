use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gitzipqr_core::pipeline::{self, CancelFlag};

use super::ConfigArgs;
use crate::auth;

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Directory of qr-*.png / *.jpg symbols, or a legacy *.bin.json fragment
    pub input: PathBuf,

    /// Directory for the restored file(s)
    #[arg(default_value = ".")]
    pub output: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn execute(args: DecodeArgs, passwords: &[String], cancel: &CancelFlag) -> Result<()> {
    let cfg = args.config.build()?;
    let passwords = auth::resolve_passwords(passwords, false)?;

    let outputs = pipeline::decode(&args.input, &args.output, &passwords, &cfg, cancel)
        .with_context(|| format!("decoding {}", args.input.display()))?;

    for path in &outputs {
        println!("restored {}", path.display());
    }
    Ok(())
}
