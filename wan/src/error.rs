use std::path::PathBuf;

use sir0::error::Sir0Error;

#[derive(Debug, thiserror::Error)]
pub enum WanError {
    #[error("Bad SIR0 wrapper: {source}")]
    Sir0 {
        #[from]
        source: Sir0Error,
    },
    #[error("Cannot read {structure} at {offset:#x}, file is {length} bytes")]
    Truncated {
        structure: &'static str,
        offset: usize,
        length: usize,
    },
    #[error("Animation group {group} has a null pointer for sequence {sequence}")]
    NullSequencePointer { group: usize, sequence: usize },
    #[error("{table} at {offset:#x} ends before it starts, at {end:#x}")]
    BadTable {
        table: &'static str,
        offset: usize,
        end: usize,
    },
    #[error("Frame group {group} refers to frame descriptor {descriptor} but there are {count}")]
    FrameDescriptorOutOfRange {
        group: usize,
        descriptor: usize,
        count: usize,
    },
    #[error("Animation group {group} refers to sequence {sequence} but there are {count}")]
    SequenceOutOfRange {
        group: usize,
        sequence: usize,
        count: usize,
    },
    #[error("Cannot write an empty palette")]
    EmptyPalette,
    #[error("Chunk {chunk} has a pixel run of {length} bytes, more than 16 bits can hold")]
    RunTooLong { chunk: usize, length: usize },
    #[error("Offset {offset:#x} does not fit in 32 bits")]
    OffsetTooLarge { offset: usize },
    #[error("Too many {what}: {count}")]
    TooMany { what: &'static str, count: usize },
    #[error("Sprite is inconsistent:\n{}", format_issues(.issues))]
    Inconsistent { issues: Vec<ConsistencyIssue> },
    #[error("Cannot open file `{path}`: {source}")]
    IOError {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

fn format_issues(issues: &[ConsistencyIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A sprite that can be written and read but that the game would not draw correctly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyIssue {
    #[error("Sprite must have at least one {what}")]
    Missing { what: &'static str },
    #[error("Chunk {chunk} is {width}x{height}, not one of the chunk sizes")]
    InvalidChunkSize {
        chunk: usize,
        width: usize,
        height: usize,
    },
    #[error("Frame descriptor {descriptor} refers to chunk {chunk} but there are {count}")]
    ChunkOutOfRange {
        descriptor: usize,
        chunk: i16,
        count: usize,
    },
    #[error("Every frame descriptor uses tile memory but the tiles mode flag is not set")]
    TilesModeNotSet,
    #[error("Tile memory needs {required} blocks but chunks only provide {available}")]
    TileMemoryDeficit { required: usize, available: usize },
    #[error("Frame group {group} refers to frame descriptor {descriptor} but there are {count}")]
    FrameDescriptorOutOfRange {
        group: usize,
        descriptor: usize,
        count: usize,
    },
    #[error("Frame group {group} is empty")]
    EmptyFrameGroup { group: usize },
    #[error("Sequence {sequence} frame {frame} refers to frame group {frame_group} but there are {count}")]
    FrameGroupOutOfRange {
        sequence: usize,
        frame: usize,
        frame_group: u16,
        count: usize,
    },
    #[error("Animation group {group} refers to sequence {sequence} but there are {count}")]
    SequenceOutOfRange {
        group: usize,
        sequence: usize,
        count: usize,
    },
    #[error("Sequence {sequence} is not used by any animation group and will not be written")]
    UnreferencedSequence { sequence: usize },
    #[error("Sequence {sequence} frame {frame} is all zero and would end the sequence early")]
    NullFrameInSequence { sequence: usize, frame: usize },
    #[error("Palette has {count} colors, more than 256")]
    PaletteTooLarge { count: usize },
    #[error("Palette has {count} colors, not a whole number of 16 color slots")]
    PartialPaletteSlot { count: usize },
    #[error("max_colors_used ({max_colors_used}) is more than the palette size ({count})")]
    MaxColorsAbovePalette { max_colors_used: u16, count: usize },
    #[error("Sprite uses {used} colors but only {allowed} are available")]
    ColorBudgetExceeded { used: u16, allowed: usize },
    #[error("palette_slots_used is {actual}, expected {expected}")]
    PaletteSlotsMismatch { actual: u16, expected: u16 },
    #[error("max_memory_used ({declared}) is lower than the frame descriptors need ({required})")]
    MemoryBudgetExceeded { declared: u16, required: usize },
    #[error("Too many {what}: {count}")]
    TooMany { what: &'static str, count: usize },
}

/// Something the decoder had to guess.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmbiguityWarning {
    #[error("Chunk {chunk} has {tiles} tiles and no matching frame descriptor, guessed {tiles_x}x{tiles_y} tiles")]
    TileArrangementFallback {
        chunk: usize,
        tiles: usize,
        tiles_x: usize,
        tiles_y: usize,
    },
    #[error("Frame descriptor {descriptor} has unknown resolution code {code:#x}, drawn as 64x64")]
    UnknownResolution { descriptor: usize, code: u8 },
    #[error("Relocation offset {offset:#x} appears more than once")]
    DuplicateRelocation { offset: u32 },
    #[error("Relocation offset {offset:#x} is outside the content, which ends at {end:#x}")]
    RelocationOutOfBounds { offset: u32, end: u32 },
    #[error("Relocation list cannot be read: {reason}")]
    UnreadableRelocations { reason: String },
    #[error("Image info {field} flag is {value}, read as set")]
    NonStandardFlag { field: &'static str, value: u16 },
}

impl WanError {
    pub fn to_result<T>(self) -> Result<T, Self> {
        Err(self)
    }
}
