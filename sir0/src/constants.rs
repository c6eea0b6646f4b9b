/// "SIR0" read as a big endian u32.
pub const SIR0_MAGIC: u32 = 0x53495230;
pub const SIR0_HEADER_LENGTH: usize = 16;

/// Byte used for every alignment gap in the file.
pub const PADDING_BYTE: u8 = 0xAA;
pub const CONTENT_ALIGNMENT: usize = 16;

/// The two header pointer fields. The reference encoder always lists them first.
pub const HEADER_POINTER_OFFSETS: [u32; 2] = [4, 8];

/// Four 7-bit groups per encoded delta.
pub const MAX_POINTER_DELTA: u32 = (1 << 28) - 1;
