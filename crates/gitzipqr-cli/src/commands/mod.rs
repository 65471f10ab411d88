pub mod decode;
pub mod encode;

use anyhow::{Context, Result};
use clap::Args;
use gitzipqr_core::Config;

/// Pipeline knobs shared by both subcommands. Every flag has an
/// environment-variable fallback, so batch jobs can configure the tool
/// without touching the command line.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// scrypt cost parameter N (power of two)
    #[arg(long, env = "SCRYPT_N")]
    pub scrypt_n: Option<u32>,

    /// scrypt block size r
    #[arg(long, env = "SCRYPT_r")]
    pub scrypt_r: Option<u32>,

    /// scrypt parallelization p (default: CPU count)
    #[arg(long, env = "SCRYPT_p")]
    pub scrypt_p: Option<u32>,

    /// QR error-correction level: L, M, Q or H
    #[arg(long, env = "QR_ECL")]
    pub ecl: Option<String>,

    /// Quiet-zone width around each symbol, in modules
    #[arg(long, env = "QR_MARGIN")]
    pub margin: Option<u32>,

    /// Worker pool size (default: CPU count)
    #[arg(long, env = "QR_WORKERS")]
    pub workers: Option<usize>,

    /// Override the calibrated chunk size, in raw bytes
    #[arg(long, env = "CHUNK_SIZE")]
    pub chunk_size: Option<usize>,
}

impl ConfigArgs {
    pub fn build(&self) -> Result<Config> {
        let mut cfg = Config::default();
        if let Some(n) = self.scrypt_n {
            cfg.scrypt_n = n;
        }
        if let Some(r) = self.scrypt_r {
            cfg.scrypt_r = r;
        }
        if let Some(p) = self.scrypt_p {
            cfg.scrypt_p = p;
        }
        if let Some(ecl) = &self.ecl {
            cfg.ecl = ecl
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("invalid QR_ECL")?;
        }
        if let Some(margin) = self.margin {
            cfg.margin = margin;
        }
        if let Some(workers) = self.workers {
            cfg.workers = workers.max(1);
        }
        cfg.chunk_size = self.chunk_size;
        Ok(cfg)
    }
}
