//! Configuration module.
//!
//! This module defines the command-line interface (CLI) for `ctrcode`
//! using `clap`. It handles parsing arguments like the input ELF and
//! the output code-image path.

use clap::Parser;
use std::path::PathBuf;

/// Builds a 3DS ExeFS ".code" image from an ELF executable.
///
/// The input must be a 32-bit little-endian ARM executable. Its text,
/// read-only data and read-write data segments are packed into a flat
/// page-aligned binary; the optional SDK module-id blob can be exported
/// separately.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Input ELF executable
    pub input: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "code.bin", help = "Path to the output code image")]
    pub output: PathBuf,

    /// Pack segments back to back instead of page-aligning each one
    #[arg(long)]
    pub no_code_padding: bool,

    /// Alignment of the exported module-id blob, in bytes (power of two)
    #[arg(long, default_value_t = 0x200)]
    pub block_size: u32,

    /// Write the SDK module-id blob here when the input carries one
    #[arg(long)]
    pub plain_region: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}
