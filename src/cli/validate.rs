use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eyre::eyre;
use wan::{DecodeOptions, Sprite};

use super::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct ValidateCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Lists consistency issues and decoding ambiguities
    Validate {
        /// Path to .wan file
        path: PathBuf,
        /// Also fails on ambiguity warnings
        #[arg(long)]
        warnings: bool,
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn validate(path: &Path, fail_on_warnings: bool) -> eyre::Result<()> {
    // issues are reported here, not turned into a decode error
    let decoded = Sprite::decode_file(path, &DecodeOptions { strict: false })?;

    decoded
        .warnings
        .iter()
        .for_each(|warning| println!("warning: {warning}"));

    decoded
        .report
        .issues
        .iter()
        .for_each(|issue| println!("issue: {issue}"));

    if !decoded.report.is_consistent() {
        return Err(eyre!(
            "{} has {} consistency issues",
            display(path),
            decoded.report.issues.len()
        ));
    }

    if fail_on_warnings && !decoded.warnings.is_empty() {
        return Err(eyre!(
            "{} decoded with {} warnings",
            display(path),
            decoded.warnings.len()
        ));
    }

    println!("{} is consistent", display(path));

    Ok(())
}

pub struct Validate;
impl Cli for Validate {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn cli(&self) -> CliRes {
        let cli = ValidateCli::parse();

        let Commands::Validate {
            path,
            warnings,
            common,
        } = cli.command;

        finish(setup(&common).and_then(|_| validate(&path, warnings)))
    }
}
