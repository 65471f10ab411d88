//! Pipeline configuration.
//!
//! The configuration is a plain value struct built once at the entry
//! point and threaded through the pipeline explicitly; nothing in the
//! core reads process-wide state at call sites.

use std::str::FromStr;

/// QR error-correction level. Lower redundancy means higher payload
/// capacity per symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecl {
    L,
    M,
    Q,
    H,
}

impl Ecl {
    pub fn as_str(self) -> &'static str {
        match self {
            Ecl::L => "L",
            Ecl::M => "M",
            Ecl::Q => "Q",
            Ecl::H => "H",
        }
    }

    pub(crate) fn to_qrcode(self) -> qrcode::EcLevel {
        match self {
            Ecl::L => qrcode::EcLevel::L,
            Ecl::M => qrcode::EcLevel::M,
            Ecl::Q => qrcode::EcLevel::Q,
            Ecl::H => qrcode::EcLevel::H,
        }
    }
}

impl FromStr for Ecl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Ecl::L),
            "M" => Ok(Ecl::M),
            "Q" => Ok(Ecl::Q),
            "H" => Ok(Ecl::H),
            other => Err(format!("invalid error-correction level {other:?} (expected L, M, Q or H)")),
        }
    }
}

impl std::fmt::Display for Ecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs for one encode or decode run.
#[derive(Debug, Clone)]
pub struct Config {
    /// scrypt cost parameter N (power of two).
    pub scrypt_n: u32,
    /// scrypt block size r.
    pub scrypt_r: u32,
    /// scrypt parallelization p.
    pub scrypt_p: u32,
    /// Error-correction level for rendered symbols.
    pub ecl: Ecl,
    /// Quiet-zone width around each symbol, in modules.
    pub margin: u32,
    /// Worker pool size for rendering and recognition.
    pub workers: usize,
    /// Explicit chunk size override; `None` means calibrate.
    pub chunk_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        let cpus = available_cpus();
        Self {
            scrypt_n: 1 << 15,
            scrypt_r: 8,
            scrypt_p: cpus as u32,
            ecl: Ecl::Q,
            margin: 1,
            workers: cpus,
            chunk_size: None,
        }
    }
}

pub fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
