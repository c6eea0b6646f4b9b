use std::collections::{hash_map::Entry, BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use sir0::{decode_pointer_offsets, Sir0Header};

use crate::{
    constants::{
        ANIM_FRAME_LENGTH, ANIM_GROUP_ENTRY_LENGTH, FRAME_DESCRIPTOR_LENGTH,
        PARTICLE_OFFSET_LENGTH, PIXEL_SOURCE_ENTRY_LENGTH, POINTER_LENGTH, TILE_AREA,
    },
    error::{AmbiguityWarning, WanError},
    pixel::decode_chunk,
    records::{
        parse_anim_frame, parse_anim_group_entry, parse_anim_info, parse_frame_descriptor,
        parse_image_info, parse_palette_info, parse_particle_offset, parse_pixel_source_entry,
        parse_pointer, parse_sub_header, AnimInfo, IResult, ImageInfo, PaletteInfo, SubHeader,
    },
    resolution::FALLBACK_DIMENSIONS,
    types::{
        AnimGroup, AnimSequence, AssemblyMode, BitDepth, FrameDescriptor, FrameGroup, Palette,
        ParticleOffset, PixelChunk, Sprite, SpriteInfo,
    },
    validate::ValidationReport,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Fail with [`WanError::Inconsistent`] instead of returning a sprite with issues.
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct Decoded {
    pub sprite: Sprite,
    pub warnings: Vec<AmbiguityWarning>,
    pub report: ValidationReport,
}

fn read_at<'a, T>(
    bytes: &'a [u8],
    offset: usize,
    structure: &'static str,
    parser: impl Fn(&'a [u8]) -> IResult<'a, T>,
) -> Result<T, WanError> {
    let truncated = || WanError::Truncated {
        structure,
        offset,
        length: bytes.len(),
    };

    let input = bytes.get(offset..).ok_or_else(truncated)?;

    parser(input).map(|(_, res)| res).map_err(|_| truncated())
}

fn table_length(
    table: &'static str,
    start: usize,
    end: usize,
    entry_length: usize,
) -> Result<usize, WanError> {
    end.checked_sub(start)
        .map(|length| length / entry_length)
        .ok_or(WanError::BadTable {
            table,
            offset: start,
            end,
        })
}

fn descriptor_dimensions(descriptor: &FrameDescriptor) -> (usize, usize) {
    descriptor.resolution.dimensions().unwrap_or(FALLBACK_DIMENSIONS)
}

/// Pixel size of each chunk as the frame descriptors see it.
///
/// In tiles mode chunks are matched to descriptors by the rank of their memory offset.
pub fn chunk_dimensions(
    descriptors: &[FrameDescriptor],
    assembly_mode: AssemblyMode,
) -> HashMap<usize, (usize, usize)> {
    match assembly_mode {
        AssemblyMode::Tiles => {
            let mut by_offset = BTreeMap::new();

            descriptors
                .iter()
                .filter(|descriptor| descriptor.is_assembled())
                .for_each(|descriptor| {
                    by_offset
                        .entry(descriptor.memory_offset)
                        .or_insert_with(|| descriptor_dimensions(descriptor));
                });

            by_offset.into_values().enumerate().collect()
        }
        AssemblyMode::Chunks => {
            let mut res = HashMap::new();

            descriptors.iter().for_each(|descriptor| {
                if let Some(chunk) = descriptor.chunk() {
                    res.entry(chunk)
                        .or_insert_with(|| descriptor_dimensions(descriptor));
                }
            });

            res
        }
    }
}

struct DecodedChunk {
    chunk: PixelChunk,
    z_index: u32,
    warning: Option<AmbiguityWarning>,
}

struct WanReader<'a> {
    bytes: &'a [u8],
    sub_header: SubHeader,
    anim_info: Option<AnimInfo>,
    image_info: Option<ImageInfo>,
    palette_info: Option<PaletteInfo>,
    warnings: Vec<AmbiguityWarning>,
}

impl<'a> WanReader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self, WanError> {
        // the relocation list is not needed to find anything, only the header is checked
        let header = Sir0Header::read(bytes)?;

        let sub_header = read_at(
            bytes,
            header.subheader_ptr as usize,
            "sub-header",
            parse_sub_header,
        )?;

        let anim_info = (sub_header.anim_info_ptr != 0)
            .then(|| {
                read_at(
                    bytes,
                    sub_header.anim_info_ptr as usize,
                    "animation info",
                    parse_anim_info,
                )
            })
            .transpose()?;

        let image_info = (sub_header.image_info_ptr != 0)
            .then(|| {
                read_at(
                    bytes,
                    sub_header.image_info_ptr as usize,
                    "image info",
                    parse_image_info,
                )
            })
            .transpose()?;

        let palette_info = image_info
            .filter(|image_info| image_info.palette_info_ptr != 0)
            .map(|image_info| {
                read_at(
                    bytes,
                    image_info.palette_info_ptr as usize,
                    "palette info",
                    parse_palette_info,
                )
            })
            .transpose()?;

        log::debug!(
            "sub-header at {:#x}, animation info: {}, image info: {}",
            header.subheader_ptr,
            anim_info.is_some(),
            image_info.is_some()
        );

        let mut reader = Self {
            bytes,
            sub_header,
            anim_info,
            image_info,
            palette_info,
            warnings: vec![],
        };

        reader.check_relocations(&header);

        Ok(reader)
    }

    fn warn(&mut self, warning: AmbiguityWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    fn check_relocations(&mut self, header: &Sir0Header) {
        let end = header.pointer_list_ptr;
        let list = self.bytes.get(end as usize..).unwrap_or_default();

        let offsets = match decode_pointer_offsets(list) {
            Ok(offsets) => offsets,
            Err(err) => {
                self.warn(AmbiguityWarning::UnreadableRelocations {
                    reason: err.to_string(),
                });
                return;
            }
        };

        let mut seen = HashSet::new();

        for offset in offsets {
            if !seen.insert(offset) {
                self.warn(AmbiguityWarning::DuplicateRelocation { offset });
            } else if offset as usize + POINTER_LENGTH > end as usize {
                self.warn(AmbiguityWarning::RelocationOutOfBounds { offset, end });
            }
        }
    }

    fn sprite_info(&mut self) -> SpriteInfo {
        let mut info = SpriteInfo {
            category: self.sub_header.category.into(),
            subheader_unk12: self.sub_header.unk12,
            ..Default::default()
        };

        if let Some(image_info) = self.image_info {
            info.bit_depth = BitDepth::from_flag(image_info.is_8bpp);
            info.assembly_mode = AssemblyMode::from_flag(image_info.tiles_mode);
            info.palette_slots_used = image_info.palette_slots_used;

            for (field, value, raw) in [
                ("8-bit", image_info.is_8bpp, &mut info.raw_depth_flag),
                ("tiles mode", image_info.tiles_mode, &mut info.raw_assembly_flag),
            ] {
                if value > 1 {
                    *raw = Some(value);
                    self.warn(AmbiguityWarning::NonStandardFlag { field, value });
                }
            }
        }

        if let Some(palette_info) = self.palette_info {
            info.max_colors_used = palette_info.max_colors_used;
            info.palette_flag = palette_info.flag;
            info.palette_unk4 = palette_info.unk4;
            info.palette_unk5 = palette_info.unk5;
        }

        if let Some(anim_info) = self.anim_info {
            info.max_memory_used = anim_info.max_memory_used;
            info.anim_unk7 = anim_info.unk7;
            info.anim_unk8 = anim_info.unk8;
            info.anim_flag = anim_info.flag;
            info.anim_unk10 = anim_info.unk10;
        }

        info
    }

    fn read_pointer(&self, offset: usize, structure: &'static str) -> Result<u32, WanError> {
        read_at(self.bytes, offset, structure, parse_pointer)
    }

    /// Colors sit right before the palette info block.
    fn read_palette(&self) -> Result<Palette, WanError> {
        let (Some(image_info), Some(palette_info)) = (self.image_info, self.palette_info) else {
            return Ok(vec![]);
        };

        if palette_info.colors_ptr == 0 {
            return Ok(vec![]);
        }

        let start = palette_info.colors_ptr as usize;
        let count = table_length(
            "palette",
            start,
            image_info.palette_info_ptr as usize,
            4,
        )?;

        let colors = self
            .bytes
            .get(start..start + count * 4)
            .ok_or(WanError::Truncated {
                structure: "palette",
                offset: start,
                length: self.bytes.len(),
            })?;

        Ok(colors
            .chunks_exact(4)
            .map(|color| [color[0], color[1], color[2]])
            .collect())
    }

    /// Where the sequence pointer lists begin, which is also where the particle table ends.
    ///
    /// Empty animation groups leave a 4 byte placeholder in front of the first list.
    fn sequence_table_start(&self, anim_info: &AnimInfo) -> Result<usize, WanError> {
        let table = anim_info.anim_group_table_ptr as usize;
        let end_boundary = match self.image_info {
            Some(image_info) => image_info.chunk_table_ptr as usize,
            None => table + anim_info.anim_group_count as usize * ANIM_GROUP_ENTRY_LENGTH,
        };

        let mut null_groups = 0;
        let mut pos = table;

        while pos < end_boundary {
            if self.read_pointer(pos, "animation group table")? != 0 {
                break;
            }

            null_groups += 1;
            pos += ANIM_GROUP_ENTRY_LENGTH;
        }

        let placeholders = null_groups * POINTER_LENGTH;
        let first_non_null = table + null_groups * ANIM_GROUP_ENTRY_LENGTH;

        let hit_chunk_table = self
            .image_info
            .is_some_and(|image_info| first_non_null == image_info.chunk_table_ptr as usize);

        let base = if hit_chunk_table || first_non_null >= end_boundary {
            table
        } else {
            self.read_pointer(first_non_null, "animation group table")? as usize
        };

        base.checked_sub(placeholders).ok_or(WanError::BadTable {
            table: "sequence pointer table",
            offset: base,
            end: placeholders,
        })
    }

    fn read_frame_groups(&mut self) -> Result<(Vec<FrameDescriptor>, Vec<FrameGroup>), WanError> {
        let Some(anim_info) = self
            .anim_info
            .filter(|anim_info| anim_info.frame_group_table_ptr != 0)
        else {
            return Ok((vec![], vec![]));
        };

        let table = anim_info.frame_group_table_ptr as usize;
        let particle_table = anim_info.particle_table_ptr as usize;

        // a particle table placed on the frame group table is a placeholder
        let end = if particle_table != 0 && particle_table != table {
            particle_table
        } else {
            self.sequence_table_start(&anim_info)?
        };

        let count = table_length("frame group table", table, end, POINTER_LENGTH)?;

        let mut descriptors = vec![];
        let mut groups = vec![];

        for group_index in 0..count {
            let group_ptr =
                self.read_pointer(table + group_index * POINTER_LENGTH, "frame group table")?;
            let mut pos = group_ptr as usize;
            let mut group = FrameGroup::default();

            loop {
                let record = read_at(self.bytes, pos, "frame descriptor", parse_frame_descriptor)?;
                let resolution = record.resolution();

                if resolution.dimensions().is_none() {
                    self.warn(AmbiguityWarning::UnknownResolution {
                        descriptor: descriptors.len(),
                        code: resolution.code(),
                    });
                }

                group.frames.push(descriptors.len());
                descriptors.push(record.to_descriptor());
                pos += FRAME_DESCRIPTOR_LENGTH;

                if record.is_last_in_group() {
                    break;
                }
            }

            groups.push(group);
        }

        log::debug!(
            "read {} frame descriptors in {} groups",
            descriptors.len(),
            groups.len()
        );

        Ok((descriptors, groups))
    }

    fn read_sequence(&self, offset: usize) -> Result<AnimSequence, WanError> {
        let mut sequence = AnimSequence::default();
        let mut pos = offset;

        loop {
            let frame = read_at(self.bytes, pos, "animation frame", parse_anim_frame)?;

            if frame.is_null() {
                break;
            }

            sequence.frames.push(frame);
            pos += ANIM_FRAME_LENGTH;
        }

        Ok(sequence)
    }

    /// Sequences shared between groups are read once.
    fn read_animations(&self) -> Result<(Vec<AnimGroup>, Vec<AnimSequence>), WanError> {
        let Some(anim_info) = self
            .anim_info
            .filter(|anim_info| anim_info.anim_group_table_ptr != 0)
        else {
            return Ok((vec![], vec![]));
        };

        let table = anim_info.anim_group_table_ptr as usize;
        let mut groups = vec![];
        let mut sequences = vec![];
        let mut locations: HashMap<u32, usize> = HashMap::new();

        for group_index in 0..anim_info.anim_group_count as usize {
            let entry = read_at(
                self.bytes,
                table + group_index * ANIM_GROUP_ENTRY_LENGTH,
                "animation group",
                parse_anim_group_entry,
            )?;

            let mut group = AnimGroup::default();

            if entry.sequence_table_ptr != 0 && entry.sequence_count != 0 {
                for sequence_index in 0..entry.sequence_count as usize {
                    let pointer = self.read_pointer(
                        entry.sequence_table_ptr as usize + sequence_index * POINTER_LENGTH,
                        "sequence pointer table",
                    )?;

                    if pointer == 0 {
                        return WanError::NullSequencePointer {
                            group: group_index,
                            sequence: sequence_index,
                        }
                        .to_result();
                    }

                    let index = match locations.entry(pointer) {
                        Entry::Occupied(entry) => *entry.get(),
                        Entry::Vacant(entry) => {
                            sequences.push(self.read_sequence(pointer as usize)?);
                            *entry.insert(sequences.len() - 1)
                        }
                    };

                    group.sequences.push(index);
                }
            }

            groups.push(group);
        }

        log::debug!(
            "read {} animation groups, {} distinct sequences",
            groups.len(),
            sequences.len()
        );

        Ok((groups, sequences))
    }

    fn read_particle_offsets(&self) -> Result<Vec<ParticleOffset>, WanError> {
        let Some(anim_info) = self.anim_info else {
            return Ok(vec![]);
        };

        let table = anim_info.particle_table_ptr as usize;

        if table == 0 || anim_info.particle_table_ptr == anim_info.frame_group_table_ptr {
            return Ok(vec![]);
        }

        let end = self.sequence_table_start(&anim_info)?;
        let count = table_length("particle table", table, end, PARTICLE_OFFSET_LENGTH)?;

        (0..count)
            .map(|index| {
                read_at(
                    self.bytes,
                    table + index * PARTICLE_OFFSET_LENGTH,
                    "particle offset",
                    parse_particle_offset,
                )
            })
            .collect()
    }

    fn read_chunk(
        &self,
        chunk_index: usize,
        offset: usize,
        bit_depth: BitDepth,
        expected: Option<(usize, usize)>,
    ) -> Result<DecodedChunk, WanError> {
        let mut entries = vec![];
        let mut pos = offset;

        loop {
            let entry = read_at(self.bytes, pos, "pixel source entry", parse_pixel_source_entry)?;

            if entry.is_null() {
                break;
            }

            entries.push(entry);
            pos += PIXEL_SOURCE_ENTRY_LENGTH;
        }

        let Some(first) = entries.first() else {
            return Ok(DecodedChunk {
                chunk: PixelChunk::default(),
                z_index: 0,
                warning: None,
            });
        };

        let mut packed = vec![];

        for entry in &entries {
            let amount = entry.amount as usize;

            if entry.is_zero_fill() {
                packed.resize(packed.len() + amount, 0);
                continue;
            }

            let start = entry.source_ptr as usize;
            let source = self
                .bytes
                .get(start..start + amount)
                .ok_or(WanError::Truncated {
                    structure: "pixel data",
                    offset: start,
                    length: self.bytes.len(),
                })?;

            packed.extend_from_slice(source);
        }

        let (chunk, arrangement) = decode_chunk(&packed, bit_depth, expected);

        let warning = (!arrangement.exact).then(|| AmbiguityWarning::TileArrangementFallback {
            chunk: chunk_index,
            tiles: bit_depth
                .codec()
                .pixel_count(packed.len())
                .div_ceil(TILE_AREA),
            tiles_x: arrangement.tiles_x,
            tiles_y: arrangement.tiles_y,
        });

        Ok(DecodedChunk {
            chunk,
            z_index: first.z_index,
            warning,
        })
    }

    fn read_chunks(
        &mut self,
        info: &SpriteInfo,
        descriptors: &[FrameDescriptor],
    ) -> Result<(Vec<PixelChunk>, Vec<u32>), WanError> {
        let Some(image_info) = self.image_info else {
            return Ok((vec![], vec![]));
        };

        let dimensions = chunk_dimensions(descriptors, info.assembly_mode);
        let table = image_info.chunk_table_ptr as usize;

        let pointers = (0..image_info.chunk_count as usize)
            .map(|index| self.read_pointer(table + index * POINTER_LENGTH, "chunk table"))
            .collect::<Result<Vec<_>, _>>()?;

        let reader = &*self;
        let decoded = pointers
            .par_iter()
            .enumerate()
            .map(|(index, &pointer)| {
                reader.read_chunk(
                    index,
                    pointer as usize,
                    info.bit_depth,
                    dimensions.get(&index).copied(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("read {} chunks", decoded.len());

        let mut chunks = Vec::with_capacity(decoded.len());
        let mut z_indices = Vec::with_capacity(decoded.len());

        for DecodedChunk {
            chunk,
            z_index,
            warning,
        } in decoded
        {
            if let Some(warning) = warning {
                self.warn(warning);
            }

            chunks.push(chunk);
            z_indices.push(z_index);
        }

        Ok((chunks, z_indices))
    }

    fn read_sprite(&mut self) -> Result<Sprite, WanError> {
        let info = self.sprite_info();
        let palette = self.read_palette()?;
        let (frame_descriptors, frame_groups) = self.read_frame_groups()?;
        let (anim_groups, anim_sequences) = self.read_animations()?;
        let particle_offsets = self.read_particle_offsets()?;
        let (chunks, chunk_z_indices) = self.read_chunks(&info, &frame_descriptors)?;

        Ok(Sprite {
            info,
            palette,
            chunks,
            chunk_z_indices,
            frame_descriptors,
            frame_groups,
            anim_sequences,
            anim_groups,
            particle_offsets,
        })
    }
}

impl Sprite {
    pub fn open_from_bytes(bytes: &[u8]) -> Result<Self, WanError> {
        Self::decode(bytes, &DecodeOptions::default()).map(|decoded| decoded.sprite)
    }

    /// Decodes a complete file and validates the result.
    pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<Decoded, WanError> {
        let mut reader = WanReader::new(bytes)?;
        let sprite = reader.read_sprite()?;

        log::debug!("decoded {:?} sprite", sprite.layout());

        let report = sprite.validate();

        if options.strict && !report.is_consistent() {
            return WanError::Inconsistent {
                issues: report.issues,
            }
            .to_result();
        }

        Ok(Decoded {
            sprite,
            warnings: reader.warnings,
            report,
        })
    }
}
