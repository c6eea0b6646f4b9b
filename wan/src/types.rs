use crate::{
    constants::{
        ASSEMBLED_CHUNK_INDEX, MEMORY_BLOCK_PIXELS_4BPP, MEMORY_BLOCK_PIXELS_8BPP, TILE_SIZE,
    },
    resolution::Resolution,
};

pub type Rgb = [u8; 3];
pub type Palette = Vec<Rgb>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Four,
    Eight,
}

impl BitDepth {
    pub fn from_flag(flag: u16) -> Self {
        if flag == 0 {
            Self::Four
        } else {
            Self::Eight
        }
    }

    pub fn flag(self) -> u16 {
        match self {
            Self::Four => 0,
            Self::Eight => 1,
        }
    }

    /// How many pixels one `memory_offset` step covers.
    pub fn memory_block_pixels(self) -> usize {
        match self {
            Self::Four => MEMORY_BLOCK_PIXELS_4BPP,
            Self::Eight => MEMORY_BLOCK_PIXELS_8BPP,
        }
    }

    /// Memory blocks allocated for a `width` x `height` chunk.
    pub fn memory_blocks(self, width: usize, height: usize) -> usize {
        (width * height).div_ceil(self.memory_block_pixels())
    }
}

/// How frame descriptors find their pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssemblyMode {
    /// Each descriptor points at one pixel chunk.
    #[default]
    Chunks,
    /// Chunks are loaded into one flat tile memory and descriptors address it by offset.
    Tiles,
}

impl AssemblyMode {
    pub fn from_flag(flag: u16) -> Self {
        if flag == 0 {
            Self::Chunks
        } else {
            Self::Tiles
        }
    }

    pub fn flag(self) -> u16 {
        match self {
            Self::Chunks => 0,
            Self::Tiles => 1,
        }
    }
}

/// Sprite type from the sub-header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteCategory {
    /// Objects and effects.
    #[default]
    Object,
    /// Characters. The only category whose pixel data is zero-tile compressed.
    Monster,
    /// Shared image or animation sets that other files link against.
    Shared,
    Other(u16),
}

impl From<u16> for SpriteCategory {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Object,
            1 => Self::Monster,
            2 => Self::Shared,
            other => Self::Other(other),
        }
    }
}

impl From<SpriteCategory> for u16 {
    fn from(value: SpriteCategory) -> Self {
        match value {
            SpriteCategory::Object => 0,
            SpriteCategory::Monster => 1,
            SpriteCategory::Shared => 2,
            SpriteCategory::Other(other) => other,
        }
    }
}

impl SpriteCategory {
    pub fn is_compressible(self) -> bool {
        self == Self::Monster
    }
}

/// Sprite wide values spread over the sub-header and the info blocks.
///
/// The `unk` fields have no known meaning and are only kept for writing back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpriteInfo {
    pub category: SpriteCategory,
    pub bit_depth: BitDepth,
    pub assembly_mode: AssemblyMode,
    pub palette_slots_used: u16,
    pub max_colors_used: u16,
    pub max_memory_used: u16,
    // palette info
    pub palette_flag: u16,
    pub palette_unk4: u16,
    pub palette_unk5: u16,
    // animation info
    pub anim_unk7: u16,
    pub anim_unk8: u16,
    pub anim_flag: u16,
    pub anim_unk10: u16,
    // sub-header
    pub subheader_unk12: u16,
    /// Raw image info flags that were neither 0 nor 1, written back as read.
    pub raw_depth_flag: Option<u16>,
    pub raw_assembly_flag: Option<u16>,
}

impl SpriteInfo {
    pub fn depth_flag(&self) -> u16 {
        self.raw_depth_flag
            .filter(|&flag| BitDepth::from_flag(flag) == self.bit_depth)
            .unwrap_or(self.bit_depth.flag())
    }

    pub fn assembly_flag(&self) -> u16 {
        self.raw_assembly_flag
            .filter(|&flag| AssemblyMode::from_flag(flag) == self.assembly_mode)
            .unwrap_or(self.assembly_mode.flag())
    }
}

/// Indexed pixels, row major. Width and height are multiples of 8.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelChunk {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl PixelChunk {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn blank(width: usize, height: usize) -> Self {
        Self::new(width, height, vec![0; width * height])
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width {
            return None;
        }

        self.pixels.get(x + y * self.width).copied()
    }

    pub fn tiles_x(&self) -> usize {
        self.width.div_ceil(TILE_SIZE)
    }

    pub fn tiles_y(&self) -> usize {
        self.height.div_ceil(TILE_SIZE)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles_x() * self.tiles_y()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// One positioned piece of a pose.
///
/// The "last in group" bit of the X field is not stored here, it comes from the
/// descriptor's place in its [`FrameGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// Index into the pixel chunks, or [`ASSEMBLED_CHUNK_INDEX`].
    pub chunk_index: i16,
    pub tag: u16,
    /// 10-bit Y field value.
    pub offset_y: u16,
    /// 9-bit X field value.
    pub offset_x: u16,
    pub resolution: Resolution,
    pub v_flip: bool,
    pub h_flip: bool,
    pub mosaic: bool,
    pub absolute_palette: bool,
    /// Bit 13 of the Y field, set by the game's tools depending on bit depth.
    pub depth_flag: bool,
    pub y_reserved_11: bool,
    pub y_reserved_10: bool,
    pub x_reserved_9: bool,
    /// In memory blocks, see [`BitDepth::memory_blocks`].
    pub memory_offset: u8,
    pub palette_offset: u8,
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        Self {
            chunk_index: ASSEMBLED_CHUNK_INDEX,
            tag: 0,
            offset_y: 0,
            offset_x: 0,
            resolution: Resolution::default(),
            v_flip: false,
            h_flip: false,
            mosaic: false,
            absolute_palette: false,
            depth_flag: false,
            y_reserved_11: false,
            y_reserved_10: false,
            x_reserved_9: false,
            memory_offset: 0,
            palette_offset: 0,
        }
    }
}

impl FrameDescriptor {
    pub fn is_assembled(&self) -> bool {
        self.chunk_index == ASSEMBLED_CHUNK_INDEX
    }

    /// The referenced chunk, `None` when drawn from tile memory.
    pub fn chunk(&self) -> Option<usize> {
        usize::try_from(self.chunk_index).ok()
    }
}

/// Frame descriptor indices drawn together as one pose.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameGroup {
    pub frames: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimFrame {
    pub duration: u16,
    /// Index into the frame groups. Past the end means a blank frame in tiles mode.
    pub frame_group: u16,
    pub offset_x: i16,
    pub offset_y: i16,
    pub shadow_offset_x: i16,
    pub shadow_offset_y: i16,
}

impl AnimFrame {
    /// The all-zero frame terminates a sequence in the file.
    pub fn is_null(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimSequence {
    pub frames: Vec<AnimFrame>,
}

/// Sequence indices, usually one per facing direction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimGroup {
    pub sequences: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticleOffset {
    pub x: i16,
    pub y: i16,
}

/// Which parts of the container a sprite carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Full,
    /// Pixels and palette only, linked by animation-only files.
    ImageOnly,
    /// Descriptors and animations only, drawn with another file's pixels and palette.
    AnimationOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sprite {
    pub info: SpriteInfo,
    pub palette: Palette,
    pub chunks: Vec<PixelChunk>,
    /// Render order hint per chunk.
    pub chunk_z_indices: Vec<u32>,
    pub frame_descriptors: Vec<FrameDescriptor>,
    pub frame_groups: Vec<FrameGroup>,
    pub anim_sequences: Vec<AnimSequence>,
    pub anim_groups: Vec<AnimGroup>,
    pub particle_offsets: Vec<ParticleOffset>,
}

impl Sprite {
    pub fn has_image_data(&self) -> bool {
        !self.chunks.is_empty() || !self.palette.is_empty()
    }

    pub fn has_animation_data(&self) -> bool {
        !self.frame_descriptors.is_empty()
            || !self.anim_groups.is_empty()
            || !self.anim_sequences.is_empty()
    }

    pub fn layout(&self) -> Layout {
        match (self.has_image_data(), self.has_animation_data()) {
            (true, false) => Layout::ImageOnly,
            (false, true) => Layout::AnimationOnly,
            _ => Layout::Full,
        }
    }

    pub fn chunk_z_index(&self, chunk_index: usize) -> u32 {
        self.chunk_z_indices
            .get(chunk_index)
            .copied()
            .unwrap_or_default()
    }
}
