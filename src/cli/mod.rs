use std::path::{Path, PathBuf};

use clap::Args;

use crate::config::{parse_config, parse_config_from_file, Config};

use self::{info::Info, offsets::Offsets, roundtrip::Roundtrip, validate::Validate};

mod info;
mod offsets;
mod roundtrip;
mod validate;

pub enum CliRes {
    Ok,
    Err,
}

pub trait Cli {
    fn name(&self) -> &'static str;
    /// Each module has to handle the arguments by itself.
    fn cli(&self) -> CliRes;
}

/// Arguments every module takes.
#[derive(Debug, Args)]
struct CommonArgs {
    /// Path to a config file, defaults to wanimation.toml next to the binary
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Loads the config and installs the logger.
fn setup(common: &CommonArgs) -> eyre::Result<Config> {
    let config = match &common.config {
        Some(path) => parse_config_from_file(path)?,
        None => parse_config()?,
    };

    let filter = config.log_filter.as_deref().unwrap_or("warn");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    log::debug!("{config:?}");

    Ok(config)
}

/// Prints the error instead of panicking.
fn finish(res: eyre::Result<()>) -> CliRes {
    match res {
        Ok(()) => CliRes::Ok,
        Err(err) => {
            println!("{err:#}");
            CliRes::Err
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Runs command-line options
pub fn cli() -> CliRes {
    let mut args = std::env::args().skip(1);

    // Add new modules here.
    let modules: &[&dyn Cli] = &[&Info, &Validate, &Roundtrip, &Offsets];

    let help = || {
        println!(
            "\
wanimation

Available modules:"
        );
        for module in modules {
            println!("{}", module.name());
        }
    };

    let Some(command) = args.next() else {
        help();
        return CliRes::Err;
    };

    for module in modules {
        if command == module.name() {
            return module.cli();
        }
    }

    // In case nothing fits then prints this again.
    help();

    CliRes::Err
}
