#[derive(Debug, thiserror::Error)]
pub enum Sir0Error {
    #[error("File is too short for a SIR0 header: {length} bytes")]
    TooShort { length: usize },
    #[error("Unknown SIR0 magic: {magic:#010x}")]
    UnknownMagic { magic: u32 },
    #[error("Sub-header pointer {pointer:#x} is not past the header or the end of file ({length} bytes)")]
    InvalidSubHeaderPointer { pointer: u32, length: usize },
    #[error("Pointer offset list pointer {pointer:#x} is not past the header or the end of file ({length} bytes)")]
    InvalidPointerListPointer { pointer: u32, length: usize },
    #[error("Pointer offset list is not terminated")]
    UnterminatedPointerList,
    #[error("Pointer offset {offset:#x} comes before the previous offset {previous:#x}")]
    UnorderedPointerOffset { offset: u32, previous: u32 },
    #[error("Pointer offset delta {delta:#x} does not fit in four 7-bit groups")]
    DeltaTooLarge { delta: u32 },
    #[error("Content of {length} bytes does not fit in 32-bit offsets")]
    ContentTooLarge { length: usize },
}
