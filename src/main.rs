//! Entry point for ctrcode.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Map the input ELF into memory.
//! 3. Run the build pipeline: parse, plain region, code image.
//! 4. Write the resulting buffers to disk.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use std::fs::File;
use tracing_subscriber::EnvFilter;

use ctrcode::builder::{self, BuildSettings};
use ctrcode::config::Config;

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    anyhow::ensure!(
        config.block_size.is_power_of_two(),
        "--block-size must be a power of two"
    );

    // Map the input ELF into memory
    let file = File::open(&config.input)
        .with_context(|| format!("failed to open {}", config.input.display()))?;
    let mmap = unsafe { Mmap::map(&file)? };

    let settings = BuildSettings {
        block_size: config.block_size,
        no_code_padding: config.no_code_padding,
    };
    let output = builder::build(&mmap, &settings)
        .with_context(|| format!("failed to build code image from {}", config.input.display()))?;

    let layout = &output.layout;
    tracing::info!(
        "text:   address={:#010x} pages={} size={:#x}",
        layout.text.address,
        layout.text.max_pages,
        layout.text.size
    );
    tracing::info!(
        "rodata: address={:#010x} pages={} size={:#x}",
        layout.rodata.address,
        layout.rodata.max_pages,
        layout.rodata.size
    );
    tracing::info!(
        "rwdata: address={:#010x} pages={} size={:#x} bss={:#x}",
        layout.rwdata.address,
        layout.rwdata.max_pages,
        layout.rwdata.size,
        layout.bss_size
    );

    std::fs::write(&config.output, &output.code)
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    if let Some(path) = &config.plain_region {
        match &output.plain_region {
            Some(region) => std::fs::write(path, region)
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => tracing::warn!(
                "input has no module-id segment, skipping {}",
                path.display()
            ),
        }
    }

    println!(
        "Packed {} bytes to {}",
        output.code.len(),
        config.output.display()
    );
    Ok(())
}
