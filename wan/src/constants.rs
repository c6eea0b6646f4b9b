pub const FRAME_DESCRIPTOR_LENGTH: usize = 10;
pub const ANIM_FRAME_LENGTH: usize = 12;
pub const PIXEL_SOURCE_ENTRY_LENGTH: usize = 12;
pub const ANIM_GROUP_ENTRY_LENGTH: usize = 8;
pub const PARTICLE_OFFSET_LENGTH: usize = 4;
pub const POINTER_LENGTH: usize = 4;

/// Chunk index of a frame descriptor drawn from tile memory.
pub const ASSEMBLED_CHUNK_INDEX: i16 = -1;

pub const TILE_SIZE: usize = 8;
pub const TILE_AREA: usize = TILE_SIZE * TILE_SIZE;

/// Alpha byte written after every palette color.
pub const PALETTE_ALPHA: u8 = 0x80;
pub const MAX_PALETTE_COLORS: usize = 256;
pub const PALETTE_SLOT_COLOR_COUNT: usize = 16;
/// First palette slot owned by the sprite itself, lower slots belong to a base file.
pub const PALETTE_SLOT_4BPP_BASE: usize = 4;
pub const PALETTE_SLOT_8BPP_BASE: usize = 13;
pub const PALETTE_SLOT_COUNT: usize = 16;
/// `palette_offset` of a frame descriptor is `PALETTE_OFFSET_BASE + 16 * slot`.
pub const PALETTE_OFFSET_BASE: u8 = 12;

/// Pixels per memory block addressed by `memory_offset`.
pub const MEMORY_BLOCK_PIXELS_4BPP: usize = 256;
pub const MEMORY_BLOCK_PIXELS_8BPP: usize = 128;

/// Alignment after the animation sequences.
pub const ANIMATION_ALIGNMENT: usize = 4;

// frame descriptor Y field
pub const Y_RESOLUTION_MASK: u16 = 0xC000;
pub const Y_DEPTH_FLAG_BIT: u16 = 13;
pub const Y_MOSAIC_BIT: u16 = 12;
pub const Y_RESERVED_11_BIT: u16 = 11;
pub const Y_RESERVED_10_BIT: u16 = 10;
pub const Y_OFFSET_MASK: u16 = 0x03FF;

// frame descriptor X field
pub const X_RESOLUTION_MASK: u16 = 0xC000;
pub const X_V_FLIP_BIT: u16 = 13;
pub const X_H_FLIP_BIT: u16 = 12;
pub const X_LAST_IN_GROUP_BIT: u16 = 11;
pub const X_ABSOLUTE_PALETTE_BIT: u16 = 10;
pub const X_RESERVED_9_BIT: u16 = 9;
pub const X_OFFSET_MASK: u16 = 0x01FF;
