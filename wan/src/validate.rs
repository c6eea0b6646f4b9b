use crate::{
    constants::{
        MAX_PALETTE_COLORS, PALETTE_OFFSET_BASE, PALETTE_SLOT_4BPP_BASE, PALETTE_SLOT_8BPP_BASE,
        PALETTE_SLOT_COLOR_COUNT, PALETTE_SLOT_COUNT,
    },
    error::ConsistencyIssue,
    resolution::{Resolution, FALLBACK_DIMENSIONS},
    types::{AssemblyMode, BitDepth, Sprite, SpriteCategory},
};

/// Shared file kinds that other sprites link against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    /// 8-bit pixels and palette only.
    ImageBase,
    /// Descriptors and animations only.
    AnimationBase,
    /// Complete 4-bit sprite whose palette slots other 4-bit sprites borrow.
    FourBitBase,
}

/// Which shared file must be loaded alongside this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredBase {
    Animation,
    Image,
    FourBit,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub issues: Vec<ConsistencyIssue>,
    pub base_kind: Option<BaseKind>,
    pub requires_base: Option<RequiredBase>,
    /// Some descriptor draws a discrete chunk instead of tile memory.
    pub chunk_mode: bool,
}

impl ValidationReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

const MAX_U16_COUNT: usize = u16::MAX as usize;

fn palette_slot_base(bit_depth: BitDepth) -> usize {
    match bit_depth {
        BitDepth::Four => PALETTE_SLOT_4BPP_BASE,
        BitDepth::Eight => PALETTE_SLOT_8BPP_BASE,
    }
}

fn descriptor_dimensions(resolution: Resolution) -> (usize, usize) {
    resolution.dimensions().unwrap_or(FALLBACK_DIMENSIONS)
}

impl Sprite {
    pub fn base_kind(&self) -> Option<BaseKind> {
        if self.info.category != SpriteCategory::Shared {
            return None;
        }

        let has_chunks = !self.chunks.is_empty();
        let has_descriptors = !self.frame_descriptors.is_empty();
        let has_sequences = !self.anim_sequences.is_empty();

        match self.info.bit_depth {
            BitDepth::Four if has_chunks && has_descriptors && has_sequences => {
                Some(BaseKind::FourBitBase)
            }
            _ if !has_chunks && has_descriptors && has_sequences => Some(BaseKind::AnimationBase),
            BitDepth::Eight if has_chunks && !has_descriptors && !has_sequences => {
                Some(BaseKind::ImageBase)
            }
            _ => None,
        }
    }

    /// Checks everything the game relies on that the file format cannot express.
    pub fn validate(&self) -> ValidationReport {
        let mut issues = vec![];

        let info = &self.info;
        let bit_depth = info.bit_depth;
        let palette_count = self.palette.len();

        let base_kind = self.base_kind();
        let is_image_base = base_kind == Some(BaseKind::ImageBase);
        let is_animation_base = base_kind == Some(BaseKind::AnimationBase);
        let is_four_bit_base = base_kind == Some(BaseKind::FourBitBase);
        let is_blank = self.chunks.is_empty()
            && self.frame_descriptors.is_empty()
            && self.anim_sequences.is_empty();

        if !is_animation_base && !is_blank && self.chunks.is_empty() {
            issues.push(ConsistencyIssue::Missing { what: "chunk" });
        }

        if !is_image_base && !is_blank {
            [
                (self.frame_descriptors.is_empty(), "frame descriptor"),
                (self.frame_groups.is_empty(), "frame group"),
                (self.anim_sequences.is_empty(), "animation sequence"),
                (self.anim_groups.is_empty(), "animation group"),
            ]
            .into_iter()
            .filter(|(missing, _)| *missing)
            .for_each(|(_, what)| issues.push(ConsistencyIssue::Missing { what }));
        }

        [
            (self.chunks.len(), "chunks"),
            (self.frame_groups.len(), "frame groups"),
            (self.anim_groups.len(), "animation groups"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > MAX_U16_COUNT)
        .for_each(|(count, what)| issues.push(ConsistencyIssue::TooMany { what, count }));

        let mut available_blocks = 0;

        for (chunk_index, chunk) in self.chunks.iter().enumerate() {
            if chunk.is_empty() {
                continue;
            }

            if Resolution::from_dimensions(chunk.width, chunk.height).is_none() {
                issues.push(ConsistencyIssue::InvalidChunkSize {
                    chunk: chunk_index,
                    width: chunk.width,
                    height: chunk.height,
                });
            }

            available_blocks += bit_depth.memory_blocks(chunk.width, chunk.height);
        }

        let mut required_blocks = 0;
        let mut memory_used = 0;
        let mut uses_tile_memory = false;
        let mut chunk_mode = false;

        for (descriptor_index, descriptor) in self.frame_descriptors.iter().enumerate() {
            let (width, height) = descriptor_dimensions(descriptor.resolution);
            let blocks = bit_depth.memory_blocks(width, height);
            let end = descriptor.memory_offset as usize + blocks;

            if descriptor.is_assembled() {
                uses_tile_memory = true;
                required_blocks = required_blocks.max(end);
            } else {
                chunk_mode = true;

                let in_range = descriptor
                    .chunk()
                    .is_some_and(|chunk| chunk < self.chunks.len());

                if !in_range {
                    issues.push(ConsistencyIssue::ChunkOutOfRange {
                        descriptor: descriptor_index,
                        chunk: descriptor.chunk_index,
                        count: self.chunks.len(),
                    });
                }
            }

            memory_used = memory_used.max(end);
        }

        let tiles_mode = uses_tile_memory && !chunk_mode;

        if tiles_mode && !is_animation_base {
            if info.assembly_mode != AssemblyMode::Tiles {
                issues.push(ConsistencyIssue::TilesModeNotSet);
            }

            if available_blocks < required_blocks {
                issues.push(ConsistencyIssue::TileMemoryDeficit {
                    required: required_blocks,
                    available: available_blocks,
                });
            }
        }

        for (group_index, group) in self.frame_groups.iter().enumerate() {
            if group.frames.is_empty() {
                issues.push(ConsistencyIssue::EmptyFrameGroup { group: group_index });
            }

            group
                .frames
                .iter()
                .filter(|&&descriptor| descriptor >= self.frame_descriptors.len())
                .for_each(|&descriptor| {
                    issues.push(ConsistencyIssue::FrameDescriptorOutOfRange {
                        group: group_index,
                        descriptor,
                        count: self.frame_descriptors.len(),
                    })
                });
        }

        for (sequence_index, sequence) in self.anim_sequences.iter().enumerate() {
            for (frame_index, frame) in sequence.frames.iter().enumerate() {
                if frame.is_null() {
                    issues.push(ConsistencyIssue::NullFrameInSequence {
                        sequence: sequence_index,
                        frame: frame_index,
                    });
                }

                // past the end is a blank frame in tiles mode
                if !tiles_mode && frame.frame_group as usize >= self.frame_groups.len() {
                    issues.push(ConsistencyIssue::FrameGroupOutOfRange {
                        sequence: sequence_index,
                        frame: frame_index,
                        frame_group: frame.frame_group,
                        count: self.frame_groups.len(),
                    });
                }
            }
        }

        let mut referenced = vec![false; self.anim_sequences.len()];

        for (group_index, group) in self.anim_groups.iter().enumerate() {
            for &sequence in &group.sequences {
                match referenced.get_mut(sequence) {
                    Some(seen) => *seen = true,
                    None => issues.push(ConsistencyIssue::SequenceOutOfRange {
                        group: group_index,
                        sequence,
                        count: self.anim_sequences.len(),
                    }),
                }
            }
        }

        referenced
            .iter()
            .enumerate()
            .filter(|(_, seen)| !**seen)
            .for_each(|(sequence, _)| {
                issues.push(ConsistencyIssue::UnreferencedSequence { sequence })
            });

        if palette_count > MAX_PALETTE_COLORS {
            issues.push(ConsistencyIssue::PaletteTooLarge {
                count: palette_count,
            });
        }

        if palette_count % PALETTE_SLOT_COLOR_COUNT != 0 {
            issues.push(ConsistencyIssue::PartialPaletteSlot {
                count: palette_count,
            });
        }

        if info.max_colors_used as usize > palette_count {
            issues.push(ConsistencyIssue::MaxColorsAbovePalette {
                max_colors_used: info.max_colors_used,
                count: palette_count,
            });
        }

        let slot_base = palette_slot_base(bit_depth);

        let allowed_colors = if is_four_bit_base || is_image_base {
            Some(slot_base * PALETTE_SLOT_COLOR_COUNT)
        } else if !is_animation_base {
            Some((PALETTE_SLOT_COUNT - slot_base) * PALETTE_SLOT_COLOR_COUNT)
        } else {
            None
        };

        if let Some(allowed) = allowed_colors {
            if info.max_colors_used as usize > allowed {
                issues.push(ConsistencyIssue::ColorBudgetExceeded {
                    used: info.max_colors_used,
                    allowed,
                });
            }
        }

        let expected_slots = match bit_depth {
            BitDepth::Eight => 1,
            BitDepth::Four => info.max_colors_used / PALETTE_SLOT_COLOR_COUNT as u16,
        };

        if info.palette_slots_used != expected_slots && !is_image_base && !is_four_bit_base {
            issues.push(ConsistencyIssue::PaletteSlotsMismatch {
                actual: info.palette_slots_used,
                expected: expected_slots,
            });
        }

        if (info.max_memory_used as usize) < memory_used {
            issues.push(ConsistencyIssue::MemoryBudgetExceeded {
                declared: info.max_memory_used,
                required: memory_used,
            });
        }

        ValidationReport {
            issues,
            base_kind,
            requires_base: self.required_base(base_kind),
            chunk_mode,
        }
    }

    fn required_base(&self, base_kind: Option<BaseKind>) -> Option<RequiredBase> {
        match base_kind {
            Some(BaseKind::ImageBase) => return Some(RequiredBase::Animation),
            Some(BaseKind::AnimationBase) => return Some(RequiredBase::Image),
            Some(BaseKind::FourBitBase) => return None,
            None => (),
        }

        let bit_depth = self.info.bit_depth;
        let slot_base = palette_slot_base(bit_depth) as i32;

        let borrows_slot = self
            .frame_descriptors
            .iter()
            .filter(|descriptor| bit_depth == BitDepth::Eight || descriptor.absolute_palette)
            .any(|descriptor| {
                let slot = (descriptor.palette_offset as i32 - PALETTE_OFFSET_BASE as i32)
                    .div_euclid(PALETTE_SLOT_COLOR_COUNT as i32);

                slot < slot_base
            });

        if !borrows_slot {
            return None;
        }

        match bit_depth {
            BitDepth::Eight => Some(RequiredBase::Image),
            BitDepth::Four => Some(RequiredBase::FourBit),
        }
    }
}
