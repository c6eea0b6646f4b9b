use std::collections::HashMap;

use byte_writer::ByteWriter;
use rayon::prelude::*;
use sir0::constants::PADDING_BYTE;

use crate::{
    constants::{ANIMATION_ALIGNMENT, PALETTE_ALPHA},
    error::WanError,
    pixel::{encode_chunk, SourceRun},
    records::{
        AnimGroupEntry, AnimInfo, FrameDescriptorRecord, ImageInfo, PaletteInfo,
        PixelSourceEntry, SubHeader, WriteToWriter,
    },
    types::{AnimFrame, Layout, Sprite, SpriteCategory},
};

const FINAL_ALIGNMENT: usize = 16;

fn u16_count(what: &'static str, count: usize) -> Result<u16, WanError> {
    u16::try_from(count).map_err(|_| WanError::TooMany { what, count })
}

/// Block positions gathered while writing, all absolute.
///
/// Zero means the block was not written.
#[derive(Default)]
struct Positions {
    frame_groups: Vec<u32>,
    sequences: HashMap<usize, u32>,
    sequence_lists: Vec<u32>,
    chunk_tables: Vec<u32>,
    frame_group_table: u32,
    particle_table: u32,
    anim_group_table: u32,
    chunk_table: u32,
    palette_info: u32,
    anim_info: u32,
    image_info: u32,
}

struct WanWriter<'a> {
    sprite: &'a Sprite,
    writer: ByteWriter,
    positions: Positions,
}

impl<'a> WanWriter<'a> {
    fn new(sprite: &'a Sprite) -> Self {
        Self {
            sprite,
            writer: sir0::content_writer(),
            positions: Positions::default(),
        }
    }

    fn offset(&self) -> Result<u32, WanError> {
        let offset = self.writer.get_offset();

        u32::try_from(offset).map_err(|_| WanError::OffsetTooLarge { offset })
    }

    /// Fails on anything that would be dereferenced out of range while writing.
    fn check_references(&self) -> Result<(), WanError> {
        let sprite = self.sprite;

        for (group_index, group) in sprite.frame_groups.iter().enumerate() {
            if let Some(&descriptor) = group
                .frames
                .iter()
                .find(|&&descriptor| descriptor >= sprite.frame_descriptors.len())
            {
                return WanError::FrameDescriptorOutOfRange {
                    group: group_index,
                    descriptor,
                    count: sprite.frame_descriptors.len(),
                }
                .to_result();
            }
        }

        for (group_index, group) in sprite.anim_groups.iter().enumerate() {
            if let Some(&sequence) = group
                .sequences
                .iter()
                .find(|&&sequence| sequence >= sprite.anim_sequences.len())
            {
                return WanError::SequenceOutOfRange {
                    group: group_index,
                    sequence,
                    count: sprite.anim_sequences.len(),
                }
                .to_result();
            }
        }

        u16_count("chunks", sprite.chunks.len())?;
        u16_count("animation groups", sprite.anim_groups.len())?;

        Ok(())
    }

    fn write_frame_descriptors(&mut self) -> Result<(), WanError> {
        let sprite = self.sprite;

        if sprite.frame_descriptors.is_empty() || sprite.frame_groups.is_empty() {
            return Ok(());
        }

        for group in &sprite.frame_groups {
            let offset = self.offset()?;
            self.positions.frame_groups.push(offset);

            for (member, &descriptor_index) in group.frames.iter().enumerate() {
                let last_in_group = member + 1 == group.frames.len();

                FrameDescriptorRecord::from_descriptor(
                    &sprite.frame_descriptors[descriptor_index],
                    last_in_group,
                )
                .write_to_writer(&mut self.writer);
            }
        }

        Ok(())
    }

    /// Each sequence is written once, in order of first use.
    fn write_sequences(&mut self) -> Result<(), WanError> {
        let sprite = self.sprite;

        if sprite.anim_groups.is_empty() || sprite.anim_sequences.is_empty() {
            return Ok(());
        }

        for group in &sprite.anim_groups {
            for &sequence_index in &group.sequences {
                if self.positions.sequences.contains_key(&sequence_index) {
                    continue;
                }

                let offset = self.offset()?;
                self.positions.sequences.insert(sequence_index, offset);

                let sequence = &sprite.anim_sequences[sequence_index];

                sequence
                    .frames
                    .iter()
                    .chain(std::iter::once(&AnimFrame::default()))
                    .for_each(|frame| frame.write_to_writer(&mut self.writer));
            }
        }

        Ok(())
    }

    fn write_chunks(&mut self) -> Result<(), WanError> {
        let sprite = self.sprite;
        let bit_depth = sprite.info.bit_depth;
        let compress = sprite.info.category.is_compressible();

        let encoded = sprite
            .chunks
            .par_iter()
            .map(|chunk| encode_chunk(chunk, bit_depth, compress))
            .collect::<Vec<_>>();

        for (chunk_index, runs) in encoded.iter().enumerate() {
            let z_index = sprite.chunk_z_index(chunk_index);
            let mut entries = Vec::with_capacity(runs.len());

            for run in runs {
                let amount = u16::try_from(run.len()).map_err(|_| WanError::RunTooLong {
                    chunk: chunk_index,
                    length: run.len(),
                })?;

                let source_ptr = match run {
                    SourceRun::Zero(_) => 0,
                    SourceRun::Data(data) => {
                        let offset = self.offset()?;
                        self.writer.append_u8_slice(data);
                        offset
                    }
                };

                entries.push(PixelSourceEntry {
                    source_ptr,
                    amount,
                    unk: 0,
                    z_index,
                });
            }

            let table = self.offset()?;
            self.positions.chunk_tables.push(table);

            entries
                .iter()
                .chain(std::iter::once(&PixelSourceEntry::default()))
                .for_each(|entry| entry.write_to_writer(&mut self.writer));
        }

        log::debug!(
            "wrote {} chunks, compressed: {compress}",
            sprite.chunks.len()
        );

        Ok(())
    }

    fn write_palette(&mut self) -> Result<(), WanError> {
        let sprite = self.sprite;

        if sprite.palette.is_empty() {
            return WanError::EmptyPalette.to_result();
        }

        let colors_ptr = self.offset()?;

        sprite.palette.iter().for_each(|&[r, g, b]| {
            self.writer.append_u8_slice(&[r, g, b, PALETTE_ALPHA]);
        });

        self.positions.palette_info = self.offset()?;

        PaletteInfo {
            colors_ptr,
            flag: sprite.info.palette_flag,
            max_colors_used: sprite.info.max_colors_used,
            unk4: sprite.info.palette_unk4,
            unk5: sprite.info.palette_unk5,
            reserved: 0,
        }
        .write_to_writer(&mut self.writer);

        Ok(())
    }

    fn write_frame_group_table(&mut self) -> Result<(), WanError> {
        self.positions.frame_group_table = self.offset()?;

        for &offset in &self.positions.frame_groups {
            self.writer.append_pointer(offset);
        }

        Ok(())
    }

    /// Monster sprites without particles point the particle table at the frame group table.
    fn write_particle_offsets(&mut self) -> Result<(), WanError> {
        let sprite = self.sprite;

        if sprite.particle_offsets.is_empty() {
            self.positions.particle_table = if sprite.info.category == SpriteCategory::Monster {
                self.positions.frame_group_table
            } else {
                0
            };

            return Ok(());
        }

        self.positions.particle_table = self.offset()?;

        sprite
            .particle_offsets
            .iter()
            .for_each(|particle| particle.write_to_writer(&mut self.writer));

        Ok(())
    }

    /// Empty groups get a null placeholder instead of a list.
    fn write_sequence_lists(&mut self) -> Result<(), WanError> {
        let sprite = self.sprite;

        for group in &sprite.anim_groups {
            if group.sequences.is_empty() {
                self.writer.append_pointer(0);
                continue;
            }

            let offset = self.offset()?;
            self.positions.sequence_lists.push(offset);

            for sequence_index in &group.sequences {
                let pointer = self
                    .positions
                    .sequences
                    .get(sequence_index)
                    .copied()
                    .unwrap_or_default();

                self.writer.append_pointer(pointer);
            }
        }

        Ok(())
    }

    fn write_anim_group_table(&mut self) -> Result<(), WanError> {
        let sprite = self.sprite;

        self.positions.anim_group_table = self.offset()?;

        let mut lists = self.positions.sequence_lists.iter();

        for group in &sprite.anim_groups {
            let entry = if group.sequences.is_empty() {
                AnimGroupEntry::default()
            } else {
                AnimGroupEntry {
                    sequence_table_ptr: lists.next().copied().unwrap_or_default(),
                    sequence_count: group.sequences.len() as u32,
                }
            };

            entry.write_to_writer(&mut self.writer);
        }

        Ok(())
    }

    fn write_chunk_table(&mut self) -> Result<(), WanError> {
        self.positions.chunk_table = self.offset()?;

        for &offset in &self.positions.chunk_tables {
            self.writer.append_pointer(offset);
        }

        Ok(())
    }

    fn write_anim_info(&mut self) -> Result<(), WanError> {
        let info = &self.sprite.info;

        self.positions.anim_info = self.offset()?;

        AnimInfo {
            frame_group_table_ptr: self.positions.frame_group_table,
            particle_table_ptr: self.positions.particle_table,
            anim_group_table_ptr: self.positions.anim_group_table,
            anim_group_count: u16_count("animation groups", self.sprite.anim_groups.len())?,
            max_memory_used: info.max_memory_used,
            unk7: info.anim_unk7,
            unk8: info.anim_unk8,
            flag: info.anim_flag,
            unk10: info.anim_unk10,
        }
        .write_to_writer(&mut self.writer);

        Ok(())
    }

    fn write_image_info(&mut self) -> Result<(), WanError> {
        let info = &self.sprite.info;

        self.positions.image_info = self.offset()?;

        ImageInfo {
            chunk_table_ptr: self.positions.chunk_table,
            palette_info_ptr: self.positions.palette_info,
            tiles_mode: info.assembly_flag(),
            is_8bpp: info.depth_flag(),
            palette_slots_used: info.palette_slots_used,
            chunk_count: u16_count("chunks", self.sprite.chunks.len())?,
        }
        .write_to_writer(&mut self.writer);

        Ok(())
    }

    /// Only points at the info blocks, so it goes last.
    fn write_sub_header(&mut self) -> Result<u32, WanError> {
        let offset = self.offset()?;

        SubHeader {
            anim_info_ptr: self.positions.anim_info,
            image_info_ptr: self.positions.image_info,
            category: self.sprite.info.category.into(),
            unk12: self.sprite.info.subheader_unk12,
        }
        .write_to_writer(&mut self.writer);

        Ok(offset)
    }

    fn write(mut self) -> Result<Vec<u8>, WanError> {
        self.check_references()?;

        let layout = self.sprite.layout();
        let writes_animation = layout != Layout::ImageOnly;
        let writes_image = layout != Layout::AnimationOnly;

        log::debug!("writing {layout:?} sprite");

        if writes_animation {
            self.write_frame_descriptors()?;
            self.write_sequences()?;
            self.writer.pad_to(ANIMATION_ALIGNMENT, PADDING_BYTE);
        }

        if writes_image {
            self.write_chunks()?;
            self.write_palette()?;
        }

        if writes_animation {
            self.write_frame_group_table()?;
            self.write_particle_offsets()?;
            self.write_sequence_lists()?;
            self.write_anim_group_table()?;
        }

        if writes_image {
            self.write_chunk_table()?;
        }

        if writes_animation {
            self.write_anim_info()?;
        }

        if writes_image {
            self.write_image_info()?;
        }

        let sub_header = self.write_sub_header()?;
        self.writer.pad_to(FINAL_ALIGNMENT, PADDING_BYTE);

        log::debug!(
            "sub-header at {sub_header:#x}, {} pointers",
            self.writer.pointer_offsets().len()
        );

        Ok(sir0::wrap(self.writer, sub_header)?)
    }
}

impl Sprite {
    pub fn write_to_bytes(&self) -> Result<Vec<u8>, WanError> {
        WanWriter::new(self).write()
    }
}
