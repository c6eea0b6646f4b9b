//! Parses config file
use std::{
    env,
    fs::OpenOptions,
    io::Read,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use wan::DecodeOptions;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// Consistency issues fail the decode.
    pub strict: bool,
    /// Default `env_logger` filter, `RUST_LOG` still wins.
    pub log_filter: Option<String>,
    /// `roundtrip` fails when a chunk size had to be guessed.
    pub fail_on_fallback: bool,
}

impl Config {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            strict: self.strict,
        }
    }
}

pub static CONFIG_FILE_NAME: &str = "wanimation.toml";

/// Parse `wanimation.toml` in the same folder as the binary
///
/// A missing file is the default config.
pub fn parse_config() -> eyre::Result<Config> {
    let path = match env::current_exe() {
        Ok(path) => path
            .parent()
            .map(|parent| parent.join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
        Err(_) => PathBuf::from(CONFIG_FILE_NAME),
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    parse_config_from_file(path.as_path())
}

pub fn parse_config_from_file(path: &Path) -> eyre::Result<Config> {
    let mut file = OpenOptions::new().read(true).open(path.as_os_str())?;
    let mut buffer = String::new();

    file.read_to_string(&mut buffer)?;

    let config: Config = toml::from_str(&buffer)?;

    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            "\
strict = true
log_filter = \"wan=debug\"
fail_on_fallback = true
",
        )
        .unwrap();

        assert!(config.strict);
        assert!(config.fail_on_fallback);
        assert_eq!(config.log_filter.as_deref(), Some("wan=debug"));
        assert!(config.decode_options().strict);
    }

    #[test]
    fn empty_config() {
        let config: Config = toml::from_str("").unwrap();

        assert!(!config.strict);
        assert!(!config.fail_on_fallback);
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn missing_file() {
        assert!(parse_config_from_file(Path::new("/does/not/exist/wanimation.toml")).is_err());
    }
}
