//! Fixed width records as they sit in the file.
//!
//! Pointers are absolute file offsets. Everything is little endian.
use byte_writer::ByteWriter;
use nom::{
    combinator::map,
    number::complete::{le_i16, le_u16, le_u32, le_u8},
    IResult as _IResult, Parser,
};

use crate::{
    constants::{
        X_ABSOLUTE_PALETTE_BIT, X_H_FLIP_BIT, X_LAST_IN_GROUP_BIT, X_OFFSET_MASK,
        X_RESERVED_9_BIT, X_V_FLIP_BIT, Y_DEPTH_FLAG_BIT, Y_MOSAIC_BIT, Y_OFFSET_MASK,
        Y_RESERVED_10_BIT, Y_RESERVED_11_BIT,
    },
    resolution::Resolution,
    types::{AnimFrame, FrameDescriptor, ParticleOffset},
};

pub type IResult<'a, T> = _IResult<&'a [u8], T>;

pub trait WriteToWriter {
    fn write_to_writer(&self, writer: &mut ByteWriter);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubHeader {
    pub anim_info_ptr: u32,
    pub image_info_ptr: u32,
    pub category: u16,
    pub unk12: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimInfo {
    pub frame_group_table_ptr: u32,
    pub particle_table_ptr: u32,
    pub anim_group_table_ptr: u32,
    pub anim_group_count: u16,
    pub max_memory_used: u16,
    pub unk7: u16,
    pub unk8: u16,
    pub flag: u16,
    pub unk10: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageInfo {
    pub chunk_table_ptr: u32,
    pub palette_info_ptr: u32,
    pub tiles_mode: u16,
    pub is_8bpp: u16,
    pub palette_slots_used: u16,
    pub chunk_count: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaletteInfo {
    pub colors_ptr: u32,
    pub flag: u16,
    pub max_colors_used: u16,
    pub unk4: u16,
    pub unk5: u16,
    pub reserved: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimGroupEntry {
    pub sequence_table_ptr: u32,
    pub sequence_count: u32,
}

/// One run of a chunk's pixel source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelSourceEntry {
    /// Where the packed bytes are, `0` for a run of zeroes.
    pub source_ptr: u32,
    /// Packed bytes in the run.
    pub amount: u16,
    pub unk: u16,
    pub z_index: u32,
}

impl PixelSourceEntry {
    pub fn is_null(&self) -> bool {
        self.source_ptr == 0 && self.amount == 0 && self.z_index == 0
    }

    pub fn is_zero_fill(&self) -> bool {
        self.source_ptr == 0
    }
}

/// Frame descriptor with both offset fields still packed.
///
/// Y field: `[15:14]` shape, `[13]` depth flag, `[12]` mosaic, `[11:10]` reserved, `[9:0]` offset.
///
/// X field: `[15:14]` size, `[13]` v flip, `[12]` h flip, `[11]` last in group,
/// `[10]` absolute palette, `[9]` reserved, `[8:0]` offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameDescriptorRecord {
    pub chunk_index: i16,
    pub tag: u16,
    pub y_field: u16,
    pub x_field: u16,
    pub memory_offset: u8,
    pub palette_offset: u8,
}

fn bit(field: u16, index: u16) -> bool {
    (field >> index) & 1 == 1
}

fn set_bit(value: bool, index: u16) -> u16 {
    (value as u16) << index
}

impl FrameDescriptorRecord {
    pub fn resolution(&self) -> Resolution {
        Resolution::from_fields(self.y_field, self.x_field)
    }

    pub fn offset_y(&self) -> u16 {
        self.y_field & Y_OFFSET_MASK
    }

    pub fn offset_x(&self) -> u16 {
        self.x_field & X_OFFSET_MASK
    }

    pub fn depth_flag(&self) -> bool {
        bit(self.y_field, Y_DEPTH_FLAG_BIT)
    }

    pub fn mosaic(&self) -> bool {
        bit(self.y_field, Y_MOSAIC_BIT)
    }

    pub fn y_reserved_11(&self) -> bool {
        bit(self.y_field, Y_RESERVED_11_BIT)
    }

    pub fn y_reserved_10(&self) -> bool {
        bit(self.y_field, Y_RESERVED_10_BIT)
    }

    pub fn v_flip(&self) -> bool {
        bit(self.x_field, X_V_FLIP_BIT)
    }

    pub fn h_flip(&self) -> bool {
        bit(self.x_field, X_H_FLIP_BIT)
    }

    pub fn is_last_in_group(&self) -> bool {
        bit(self.x_field, X_LAST_IN_GROUP_BIT)
    }

    pub fn absolute_palette(&self) -> bool {
        bit(self.x_field, X_ABSOLUTE_PALETTE_BIT)
    }

    pub fn x_reserved_9(&self) -> bool {
        bit(self.x_field, X_RESERVED_9_BIT)
    }

    pub fn from_descriptor(descriptor: &FrameDescriptor, last_in_group: bool) -> Self {
        let y_field = descriptor.resolution.y_field_bits()
            | set_bit(descriptor.depth_flag, Y_DEPTH_FLAG_BIT)
            | set_bit(descriptor.mosaic, Y_MOSAIC_BIT)
            | set_bit(descriptor.y_reserved_11, Y_RESERVED_11_BIT)
            | set_bit(descriptor.y_reserved_10, Y_RESERVED_10_BIT)
            | (descriptor.offset_y & Y_OFFSET_MASK);

        let x_field = descriptor.resolution.x_field_bits()
            | set_bit(descriptor.v_flip, X_V_FLIP_BIT)
            | set_bit(descriptor.h_flip, X_H_FLIP_BIT)
            | set_bit(last_in_group, X_LAST_IN_GROUP_BIT)
            | set_bit(descriptor.absolute_palette, X_ABSOLUTE_PALETTE_BIT)
            | set_bit(descriptor.x_reserved_9, X_RESERVED_9_BIT)
            | (descriptor.offset_x & X_OFFSET_MASK);

        Self {
            chunk_index: descriptor.chunk_index,
            tag: descriptor.tag,
            y_field,
            x_field,
            memory_offset: descriptor.memory_offset,
            palette_offset: descriptor.palette_offset,
        }
    }

    pub fn to_descriptor(&self) -> FrameDescriptor {
        FrameDescriptor {
            chunk_index: self.chunk_index,
            tag: self.tag,
            offset_y: self.offset_y(),
            offset_x: self.offset_x(),
            resolution: self.resolution(),
            v_flip: self.v_flip(),
            h_flip: self.h_flip(),
            mosaic: self.mosaic(),
            absolute_palette: self.absolute_palette(),
            depth_flag: self.depth_flag(),
            y_reserved_11: self.y_reserved_11(),
            y_reserved_10: self.y_reserved_10(),
            x_reserved_9: self.x_reserved_9(),
            memory_offset: self.memory_offset,
            palette_offset: self.palette_offset,
        }
    }
}

pub fn parse_sub_header(i: &[u8]) -> IResult<'_, SubHeader> {
    map(
        (le_u32, le_u32, le_u16, le_u16),
        |(anim_info_ptr, image_info_ptr, category, unk12)| SubHeader {
            anim_info_ptr,
            image_info_ptr,
            category,
            unk12,
        },
    )
    .parse(i)
}

pub fn parse_anim_info(i: &[u8]) -> IResult<'_, AnimInfo> {
    map(
        (
            le_u32, le_u32, le_u32, le_u16, le_u16, le_u16, le_u16, le_u16, le_u16,
        ),
        |(
            frame_group_table_ptr,
            particle_table_ptr,
            anim_group_table_ptr,
            anim_group_count,
            max_memory_used,
            unk7,
            unk8,
            flag,
            unk10,
        )| AnimInfo {
            frame_group_table_ptr,
            particle_table_ptr,
            anim_group_table_ptr,
            anim_group_count,
            max_memory_used,
            unk7,
            unk8,
            flag,
            unk10,
        },
    )
    .parse(i)
}

pub fn parse_image_info(i: &[u8]) -> IResult<'_, ImageInfo> {
    map(
        (le_u32, le_u32, le_u16, le_u16, le_u16, le_u16),
        |(chunk_table_ptr, palette_info_ptr, tiles_mode, is_8bpp, palette_slots_used, chunk_count)| {
            ImageInfo {
                chunk_table_ptr,
                palette_info_ptr,
                tiles_mode,
                is_8bpp,
                palette_slots_used,
                chunk_count,
            }
        },
    )
    .parse(i)
}

pub fn parse_palette_info(i: &[u8]) -> IResult<'_, PaletteInfo> {
    map(
        (le_u32, le_u16, le_u16, le_u16, le_u16, le_u32),
        |(colors_ptr, flag, max_colors_used, unk4, unk5, reserved)| PaletteInfo {
            colors_ptr,
            flag,
            max_colors_used,
            unk4,
            unk5,
            reserved,
        },
    )
    .parse(i)
}

pub fn parse_anim_group_entry(i: &[u8]) -> IResult<'_, AnimGroupEntry> {
    map((le_u32, le_u32), |(sequence_table_ptr, sequence_count)| {
        AnimGroupEntry {
            sequence_table_ptr,
            sequence_count,
        }
    })
    .parse(i)
}

pub fn parse_pixel_source_entry(i: &[u8]) -> IResult<'_, PixelSourceEntry> {
    map(
        (le_u32, le_u16, le_u16, le_u32),
        |(source_ptr, amount, unk, z_index)| PixelSourceEntry {
            source_ptr,
            amount,
            unk,
            z_index,
        },
    )
    .parse(i)
}

pub fn parse_frame_descriptor(i: &[u8]) -> IResult<'_, FrameDescriptorRecord> {
    map(
        (le_i16, le_u16, le_u16, le_u16, le_u8, le_u8),
        |(chunk_index, tag, y_field, x_field, memory_offset, palette_offset)| {
            FrameDescriptorRecord {
                chunk_index,
                tag,
                y_field,
                x_field,
                memory_offset,
                palette_offset,
            }
        },
    )
    .parse(i)
}

pub fn parse_anim_frame(i: &[u8]) -> IResult<'_, AnimFrame> {
    map(
        (le_u16, le_u16, le_i16, le_i16, le_i16, le_i16),
        |(duration, frame_group, offset_x, offset_y, shadow_offset_x, shadow_offset_y)| {
            AnimFrame {
                duration,
                frame_group,
                offset_x,
                offset_y,
                shadow_offset_x,
                shadow_offset_y,
            }
        },
    )
    .parse(i)
}

pub fn parse_particle_offset(i: &[u8]) -> IResult<'_, ParticleOffset> {
    map((le_i16, le_i16), |(x, y)| ParticleOffset { x, y }).parse(i)
}

pub fn parse_pointer(i: &[u8]) -> IResult<'_, u32> {
    le_u32(i)
}

impl WriteToWriter for SubHeader {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_pointer(self.anim_info_ptr);
        writer.append_pointer(self.image_info_ptr);
        writer.append_u16(self.category);
        writer.append_u16(self.unk12);
    }
}

impl WriteToWriter for AnimInfo {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_pointer(self.frame_group_table_ptr);
        writer.append_pointer(self.particle_table_ptr);
        writer.append_pointer(self.anim_group_table_ptr);
        writer.append_u16(self.anim_group_count);
        writer.append_u16(self.max_memory_used);
        writer.append_u16(self.unk7);
        writer.append_u16(self.unk8);
        writer.append_u16(self.flag);
        writer.append_u16(self.unk10);
    }
}

impl WriteToWriter for ImageInfo {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_pointer(self.chunk_table_ptr);
        writer.append_pointer(self.palette_info_ptr);
        writer.append_u16(self.tiles_mode);
        writer.append_u16(self.is_8bpp);
        writer.append_u16(self.palette_slots_used);
        writer.append_u16(self.chunk_count);
    }
}

impl WriteToWriter for PaletteInfo {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_pointer(self.colors_ptr);
        writer.append_u16(self.flag);
        writer.append_u16(self.max_colors_used);
        writer.append_u16(self.unk4);
        writer.append_u16(self.unk5);
        writer.append_u32(self.reserved);
    }
}

impl WriteToWriter for AnimGroupEntry {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_pointer(self.sequence_table_ptr);
        writer.append_u32(self.sequence_count);
    }
}

impl WriteToWriter for PixelSourceEntry {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_pointer(self.source_ptr);
        writer.append_u16(self.amount);
        writer.append_u16(self.unk);
        writer.append_u32(self.z_index);
    }
}

impl WriteToWriter for FrameDescriptorRecord {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_i16(self.chunk_index);
        writer.append_u16(self.tag);
        writer.append_u16(self.y_field);
        writer.append_u16(self.x_field);
        writer.append_u8(self.memory_offset);
        writer.append_u8(self.palette_offset);
    }
}

impl WriteToWriter for AnimFrame {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_u16(self.duration);
        writer.append_u16(self.frame_group);
        writer.append_i16(self.offset_x);
        writer.append_i16(self.offset_y);
        writer.append_i16(self.shadow_offset_x);
        writer.append_i16(self.shadow_offset_y);
    }
}

impl WriteToWriter for ParticleOffset {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        writer.append_i16(self.x);
        writer.append_i16(self.y);
    }
}
