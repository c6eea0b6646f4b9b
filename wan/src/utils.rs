use std::{
    ffi::OsStr,
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use crate::{
    error::WanError,
    parser::{DecodeOptions, Decoded},
    types::Sprite,
};

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> WanError + '_ {
    move |op| WanError::IOError {
        source: op,
        path: path.to_path_buf(),
    }
}

impl Sprite {
    pub fn open_from_file(path: impl AsRef<Path> + AsRef<OsStr>) -> Result<Self, WanError> {
        let path: &Path = path.as_ref();
        let bytes = std::fs::read(path).map_err(io_error(path))?;

        Self::open_from_bytes(&bytes)
    }

    pub fn decode_file(
        path: impl AsRef<Path> + AsRef<OsStr>,
        options: &DecodeOptions,
    ) -> Result<Decoded, WanError> {
        let path: &Path = path.as_ref();
        let bytes = std::fs::read(path).map_err(io_error(path))?;

        Self::decode(&bytes, options)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path> + AsRef<OsStr>) -> Result<(), WanError> {
        let path: &Path = path.as_ref();
        let bytes = self.write_to_bytes()?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(io_error(path))?;

        file.write_all(&bytes).map_err(io_error(path))?;
        file.flush().map_err(io_error(path))?;

        Ok(())
    }
}
