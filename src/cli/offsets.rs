use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sir0::Sir0;

use super::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct OffsetsCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints the SIR0 header and every relocated pointer
    Offsets {
        /// Path to a SIR0 wrapped file
        path: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|value| value.try_into().ok())
        .map(u32::from_le_bytes)
}

fn offsets(path: &Path) -> eyre::Result<()> {
    let bytes = std::fs::read(path)?;
    let sir0 = Sir0::open_from_bytes(&bytes)?;

    println!("{}", display(path));
    println!("sub-header: {:#x}", sir0.header.subheader_ptr);
    println!("pointer list: {:#x}", sir0.header.pointer_list_ptr);
    println!("{} pointers", sir0.pointer_offsets.len());

    for &offset in &sir0.pointer_offsets {
        match read_u32(sir0.content, offset as usize) {
            Some(value) => println!("{offset:#010x} -> {value:#010x}"),
            None => println!("{offset:#010x} -> outside the content"),
        }
    }

    Ok(())
}

pub struct Offsets;
impl Cli for Offsets {
    fn name(&self) -> &'static str {
        "offsets"
    }

    fn cli(&self) -> CliRes {
        let cli = OffsetsCli::parse();

        let Commands::Offsets { path, common } = cli.command;

        finish(setup(&common).and_then(|_| offsets(&path)))
    }
}
