use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eyre::eyre;
use sha2::{Digest, Sha256};
use wan::{error::AmbiguityWarning, Sprite};

use super::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct RoundtripCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decodes and re-encodes a sprite, then compares checksums
    Roundtrip {
        /// Path to .wan file
        path: PathBuf,
        /// Writes the re-encoded sprite here
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn first_difference(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b)
        .position(|(a, b)| a != b)
        .unwrap_or(a.len().min(b.len()))
}

fn roundtrip(path: &Path, output: Option<&Path>, config: &Config) -> eyre::Result<()> {
    let bytes = std::fs::read(path)?;
    let decoded = Sprite::decode(&bytes, &config.decode_options())?;

    if config.fail_on_fallback {
        if let Some(warning) = decoded
            .warnings
            .iter()
            .find(|warning| matches!(warning, AmbiguityWarning::TileArrangementFallback { .. }))
        {
            return Err(eyre!("{warning}"));
        }
    }

    let encoded = decoded.sprite.write_to_bytes()?;

    if let Some(output) = output {
        decoded.sprite.write_to_file(output)?;
        println!("wrote {}", display(output));
    }

    let before = Sha256::digest(&bytes);
    let after = Sha256::digest(&encoded);

    if before != after {
        return Err(eyre!(
            "re-encoded file differs from {} at {:#x} ({} bytes, now {} bytes)",
            display(path),
            first_difference(&bytes, &encoded),
            bytes.len(),
            encoded.len()
        ));
    }

    println!("{} round trips, sha256 {:x}", display(path), after);

    Ok(())
}

pub struct Roundtrip;
impl Cli for Roundtrip {
    fn name(&self) -> &'static str {
        "roundtrip"
    }

    fn cli(&self) -> CliRes {
        let cli = RoundtripCli::parse();

        let Commands::Roundtrip {
            path,
            output,
            common,
        } = cli.command;

        finish(setup(&common).and_then(|config| roundtrip(&path, output.as_deref(), &config)))
    }
}
