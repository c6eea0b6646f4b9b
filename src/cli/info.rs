use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use wan::{Decoded, Sprite};

use super::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct InfoCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints what a sprite file contains
    Info {
        /// Path to .wan file
        path: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn info(path: &Path, config: &Config) -> eyre::Result<()> {
    let Decoded {
        sprite,
        warnings,
        report,
    } = Sprite::decode_file(path, &config.decode_options())?;

    let info = &sprite.info;

    println!("{}", display(path));
    println!("layout: {:?}", sprite.layout());
    println!("category: {:?}", info.category);
    println!(
        "{:?} bit, assembled from {:?}",
        info.bit_depth, info.assembly_mode
    );
    println!(
        "palette: {} colors, {} max colors used, {} slots used",
        sprite.palette.len(),
        info.max_colors_used,
        info.palette_slots_used
    );
    println!("chunks: {}", sprite.chunks.len());
    println!(
        "frame descriptors: {} in {} groups",
        sprite.frame_descriptors.len(),
        sprite.frame_groups.len()
    );
    println!(
        "animation groups: {}, sequences: {}",
        sprite.anim_groups.len(),
        sprite.anim_sequences.len()
    );
    println!("particle offsets: {}", sprite.particle_offsets.len());
    println!("max memory used: {}", info.max_memory_used);

    if let Some(base_kind) = report.base_kind {
        println!("shared base file: {base_kind:?}");
    }

    if let Some(required) = report.requires_base {
        println!("needs a {required:?} base file");
    }

    warnings
        .iter()
        .for_each(|warning| println!("warning: {warning}"));

    if !report.is_consistent() {
        println!(
            "{} consistency issues, run validate for details",
            report.issues.len()
        );
    }

    Ok(())
}

pub struct Info;
impl Cli for Info {
    fn name(&self) -> &'static str {
        "info"
    }

    fn cli(&self) -> CliRes {
        let cli = InfoCli::parse();

        let Commands::Info { path, common } = cli.command;

        finish(setup(&common).and_then(|config| info(&path, &config)))
    }
}
