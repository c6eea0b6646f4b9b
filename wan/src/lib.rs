//! WAN sprite container.
//!
//! Pixel chunks, a palette, frame descriptors and animations, wrapped in SIR0.
//! [`Sprite::open_from_bytes`] and [`Sprite::write_to_bytes`] convert between the
//! model and the file, and files written by the game's own tools come back byte for byte.
pub mod constants;
pub mod error;
mod parser;
pub mod pixel;
pub mod records;
mod resolution;
mod types;
mod utils;
mod validate;
mod writer;

pub use parser::{chunk_dimensions, DecodeOptions, Decoded};
pub use resolution::*;
pub use types::*;
pub use validate::*;

#[cfg(test)]
mod test {
    use sha2::{Digest, Sha256};

    use crate::{
        constants::PALETTE_OFFSET_BASE,
        error::{AmbiguityWarning, ConsistencyIssue, WanError},
        records::{parse_image_info, parse_pixel_source_entry, parse_pointer, parse_sub_header},
        AnimFrame, AnimGroup, AnimSequence, AssemblyMode, BitDepth, DecodeOptions,
        FrameDescriptor, FrameGroup, Layout, ParticleOffset, PixelChunk, Resolution, Sprite,
        SpriteCategory,
    };

    fn patterned(width: usize, height: usize, colors: u8, seed: usize) -> PixelChunk {
        let pixels = (0..width * height)
            .map(|i| ((i % width + (i / width) * seed) % (colors as usize - 1) + 1) as u8)
            .collect();

        PixelChunk::new(width, height, pixels)
    }

    fn descriptor(chunk_index: i16, width: usize, height: usize) -> FrameDescriptor {
        FrameDescriptor {
            chunk_index,
            resolution: Resolution::from_dimensions(width, height).unwrap(),
            ..Default::default()
        }
    }

    fn frame(duration: u16, frame_group: u16) -> AnimFrame {
        AnimFrame {
            duration,
            frame_group,
            ..Default::default()
        }
    }

    fn grey_palette(count: usize) -> Vec<[u8; 3]> {
        (0..count).map(|i| [i as u8, i as u8, i as u8]).collect()
    }

    /// 4-bit monster, zero tiles in some chunks, a shared sequence and an empty group.
    fn monster() -> Sprite {
        let mut sprite = Sprite::default();

        sprite.info.category = SpriteCategory::Monster;
        sprite.info.bit_depth = BitDepth::Four;
        sprite.info.max_colors_used = 16;
        sprite.info.palette_slots_used = 1;
        sprite.info.max_memory_used = 3;
        sprite.info.palette_flag = 1;
        sprite.info.anim_flag = 1;
        sprite.palette = grey_palette(16);

        // left half of the first chunk is blank
        let mut half_blank = patterned(32, 16, 16, 3);
        for (i, pixel) in half_blank.pixels.iter_mut().enumerate() {
            if i % 32 < 16 {
                *pixel = 0;
            }
        }

        sprite.chunks = vec![half_blank, patterned(16, 16, 16, 5), PixelChunk::blank(8, 8)];
        sprite.chunk_z_indices = vec![0, 1, 0];

        sprite.frame_descriptors = vec![
            FrameDescriptor {
                offset_x: 100,
                offset_y: 200,
                h_flip: true,
                palette_offset: PALETTE_OFFSET_BASE + 64,
                ..descriptor(0, 32, 16)
            },
            FrameDescriptor {
                memory_offset: 2,
                mosaic: true,
                depth_flag: true,
                tag: 7,
                ..descriptor(1, 16, 16)
            },
            FrameDescriptor {
                v_flip: true,
                offset_x: 0x1FF,
                offset_y: 0x3FF,
                ..descriptor(2, 8, 8)
            },
        ];
        sprite.frame_groups = vec![
            FrameGroup { frames: vec![0, 1] },
            FrameGroup { frames: vec![2] },
        ];
        sprite.anim_sequences = vec![
            AnimSequence {
                frames: vec![
                    AnimFrame {
                        offset_x: -4,
                        offset_y: 12,
                        ..frame(4, 0)
                    },
                    frame(6, 1),
                ],
            },
            AnimSequence {
                frames: vec![AnimFrame {
                    shadow_offset_x: -1,
                    shadow_offset_y: 2,
                    ..frame(3, 1)
                }],
            },
        ];
        sprite.anim_groups = vec![
            AnimGroup {
                sequences: vec![0, 1],
            },
            AnimGroup::default(),
            AnimGroup {
                sequences: vec![1, 0],
            },
        ];

        sprite
    }

    /// 8-bit object with particle offsets, stored uncompressed.
    fn object_8bpp() -> Sprite {
        let mut sprite = Sprite::default();

        sprite.info.category = SpriteCategory::Object;
        sprite.info.bit_depth = BitDepth::Eight;
        sprite.info.max_colors_used = 32;
        sprite.info.palette_slots_used = 1;
        sprite.info.max_memory_used = 17;
        sprite.palette = grey_palette(32);

        sprite.chunks = vec![patterned(8, 16, 32, 2), patterned(64, 32, 32, 7)];
        sprite.chunk_z_indices = vec![1, 1];

        sprite.frame_descriptors = vec![
            descriptor(0, 8, 16),
            FrameDescriptor {
                memory_offset: 1,
                ..descriptor(1, 64, 32)
            },
        ];
        sprite.frame_groups = vec![FrameGroup { frames: vec![0, 1] }];
        sprite.anim_sequences = vec![AnimSequence {
            frames: vec![frame(2, 0), frame(2, 0)],
        }];
        sprite.anim_groups = vec![AnimGroup {
            sequences: vec![0],
        }];
        sprite.particle_offsets = vec![
            ParticleOffset { x: 1, y: -2 },
            ParticleOffset { x: 3, y: 4 },
        ];

        sprite
    }

    /// Every descriptor draws from tile memory, one animation frame is blank.
    fn tiles_mode() -> Sprite {
        let mut sprite = Sprite::default();

        sprite.info.category = SpriteCategory::Monster;
        sprite.info.assembly_mode = AssemblyMode::Tiles;
        sprite.info.max_colors_used = 16;
        sprite.info.palette_slots_used = 1;
        sprite.info.max_memory_used = 5;
        sprite.palette = grey_palette(16);

        sprite.chunks = vec![patterned(16, 16, 16, 1), patterned(32, 32, 16, 9)];
        sprite.chunk_z_indices = vec![0, 0];

        sprite.frame_descriptors = vec![
            descriptor(-1, 16, 16),
            FrameDescriptor {
                memory_offset: 1,
                ..descriptor(-1, 32, 32)
            },
            descriptor(-1, 16, 16),
        ];
        sprite.frame_groups = vec![
            FrameGroup { frames: vec![0, 1] },
            FrameGroup { frames: vec![2] },
        ];
        sprite.anim_sequences = vec![AnimSequence {
            frames: vec![frame(1, 0), frame(1, 1), frame(8, 7)],
        }];
        sprite.anim_groups = vec![AnimGroup {
            sequences: vec![0],
        }];

        sprite
    }

    /// Pixels and palette only.
    fn image_only() -> Sprite {
        let mut sprite = Sprite::default();

        sprite.info.category = SpriteCategory::Shared;
        sprite.info.bit_depth = BitDepth::Eight;
        sprite.info.max_colors_used = 16;
        sprite.info.palette_slots_used = 1;
        sprite.palette = grey_palette(16);

        sprite.chunks = vec![patterned(16, 16, 16, 4), patterned(32, 16, 16, 6)];
        sprite.chunk_z_indices = vec![2, 3];

        sprite
    }

    /// Descriptors and animations only, drawn with another file's chunks.
    fn animation_only() -> Sprite {
        let mut sprite = Sprite::default();

        sprite.info.category = SpriteCategory::Monster;
        sprite.info.max_memory_used = 4;
        sprite.info.anim_unk7 = 2;

        sprite.frame_descriptors = vec![descriptor(3, 32, 32), descriptor(0, 8, 8)];
        sprite.frame_groups = vec![FrameGroup { frames: vec![0] }, FrameGroup { frames: vec![1] }];
        sprite.anim_sequences = vec![
            AnimSequence {
                frames: vec![frame(5, 1)],
            },
            AnimSequence {
                frames: vec![frame(5, 0), frame(5, 1)],
            },
        ];
        sprite.anim_groups = vec![
            AnimGroup::default(),
            AnimGroup::default(),
            AnimGroup {
                sequences: vec![0, 1],
            },
        ];

        sprite
    }

    fn all_fixtures() -> Vec<(&'static str, Sprite)> {
        vec![
            ("monster", monster()),
            ("object_8bpp", object_8bpp()),
            ("tiles_mode", tiles_mode()),
            ("image_only", image_only()),
            ("animation_only", animation_only()),
        ]
    }

    fn digest(bytes: &[u8]) -> Vec<u8> {
        Sha256::digest(bytes).to_vec()
    }

    #[test]
    fn model_round_trip() {
        for (name, sprite) in all_fixtures() {
            let bytes = sprite.write_to_bytes().unwrap();
            let decoded = Sprite::open_from_bytes(&bytes).unwrap();

            assert_eq!(decoded, sprite, "{name}");
        }
    }

    #[test]
    fn byte_round_trip() {
        for (name, sprite) in all_fixtures() {
            let bytes = sprite.write_to_bytes().unwrap();
            let again = Sprite::open_from_bytes(&bytes)
                .unwrap()
                .write_to_bytes()
                .unwrap();

            assert_eq!(digest(&again), digest(&bytes), "{name}");
        }
    }

    #[test]
    fn fixtures_are_consistent() {
        // the animation-only monster draws chunks it does not carry
        for (name, sprite) in all_fixtures()
            .into_iter()
            .filter(|(_, sprite)| sprite.layout() != Layout::AnimationOnly)
        {
            let bytes = sprite.write_to_bytes().unwrap();
            let decoded = Sprite::decode(&bytes, &DecodeOptions { strict: true }).unwrap();

            assert!(decoded.report.is_consistent(), "{name}: {:?}", decoded.report);
        }
    }

    #[test]
    fn file_alignment_and_padding() {
        for (name, sprite) in all_fixtures() {
            let bytes = sprite.write_to_bytes().unwrap();

            assert_eq!(bytes.len() % 16, 0, "{name}");
            assert_eq!(&bytes[..4], b"SIR0", "{name}");
            assert_eq!(&bytes[12..16], [0, 0, 0, 0], "{name}");
        }
    }

    #[test]
    fn every_pointer_is_relocated() {
        for (name, sprite) in all_fixtures() {
            let bytes = sprite.write_to_bytes().unwrap();
            let sir0 = sir0::Sir0::open_from_bytes(&bytes).unwrap();
            let list_start = sir0.header.pointer_list_ptr;

            assert_eq!(sir0.pointer_offsets[..2], [4, 8], "{name}");
            assert!(sir0.pointer_offsets.windows(2).all(|w| w[0] < w[1]), "{name}");

            for &offset in &sir0.pointer_offsets[2..] {
                let (_, value) = parse_pointer(&bytes[offset as usize..]).unwrap();

                assert_ne!(value, 0, "{name} at {offset:#x}");
                assert!(value < list_start, "{name} at {offset:#x}");
            }
        }
    }

    #[test]
    fn layouts() {
        assert_eq!(monster().layout(), Layout::Full);
        assert_eq!(image_only().layout(), Layout::ImageOnly);
        assert_eq!(animation_only().layout(), Layout::AnimationOnly);
    }

    #[test]
    fn animation_only_has_no_image_info() {
        let bytes = animation_only().write_to_bytes().unwrap();

        let sub_header_ptr = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let (_, sub_header) = parse_sub_header(&bytes[sub_header_ptr..]).unwrap();

        assert_ne!(sub_header.anim_info_ptr, 0);
        assert_eq!(sub_header.image_info_ptr, 0);

        let decoded = Sprite::open_from_bytes(&bytes).unwrap();
        assert!(decoded.chunks.is_empty());
        assert!(decoded.palette.is_empty());
    }

    #[test]
    fn image_only_guesses_chunk_sizes() {
        let bytes = image_only().write_to_bytes().unwrap();

        let sub_header_ptr = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let (_, sub_header) = parse_sub_header(&bytes[sub_header_ptr..]).unwrap();
        assert_eq!(sub_header.anim_info_ptr, 0);

        let decoded = Sprite::decode(&bytes, &DecodeOptions::default()).unwrap();

        assert_eq!(
            decoded.warnings,
            [
                AmbiguityWarning::TileArrangementFallback {
                    chunk: 0,
                    tiles: 4,
                    tiles_x: 2,
                    tiles_y: 2
                },
                AmbiguityWarning::TileArrangementFallback {
                    chunk: 1,
                    tiles: 8,
                    tiles_x: 4,
                    tiles_y: 2
                },
            ]
        );
    }

    #[test]
    fn blank_chunk_is_one_zero_run() {
        let mut sprite = monster();
        sprite.chunks[2] = PixelChunk::blank(16, 16);
        sprite.chunk_z_indices[2] = 9;
        sprite.frame_descriptors[2].resolution = Resolution::from_dimensions(16, 16).unwrap();

        let bytes = sprite.write_to_bytes().unwrap();

        let sub_header_ptr = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let (_, sub_header) = parse_sub_header(&bytes[sub_header_ptr..]).unwrap();
        let (_, image_info) =
            parse_image_info(&bytes[sub_header.image_info_ptr as usize..]).unwrap();

        let table_entry = image_info.chunk_table_ptr as usize + 2 * 4;
        let (_, table) = parse_pointer(&bytes[table_entry..]).unwrap();

        let (rest, entry) = parse_pixel_source_entry(&bytes[table as usize..]).unwrap();
        assert_eq!(entry.source_ptr, 0);
        assert_eq!(entry.amount, 128);
        assert_eq!(entry.z_index, 9);

        let (_, terminator) = parse_pixel_source_entry(rest).unwrap();
        assert!(terminator.is_null());

        let decoded = Sprite::open_from_bytes(&bytes).unwrap();
        assert_eq!(decoded.chunks[2].pixels, vec![0; 256]);
    }

    #[test]
    fn uncompressed_categories_write_one_run() {
        let mut sprite = monster();
        sprite.info.category = SpriteCategory::Object;

        let bytes = sprite.write_to_bytes().unwrap();

        let sub_header_ptr = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let (_, sub_header) = parse_sub_header(&bytes[sub_header_ptr..]).unwrap();
        let (_, image_info) =
            parse_image_info(&bytes[sub_header.image_info_ptr as usize..]).unwrap();

        // the blank 8x8 chunk is still stored as data
        let table_entry = image_info.chunk_table_ptr as usize + 2 * 4;
        let (_, table) = parse_pointer(&bytes[table_entry..]).unwrap();
        let (rest, entry) = parse_pixel_source_entry(&bytes[table as usize..]).unwrap();

        assert_ne!(entry.source_ptr, 0);
        assert_eq!(entry.amount, 32);
        assert!(parse_pixel_source_entry(rest).unwrap().1.is_null());

        assert_eq!(Sprite::open_from_bytes(&bytes).unwrap(), sprite);
    }

    #[test]
    fn strict_decode_rejects_issues() {
        let mut sprite = monster();
        sprite.info.max_memory_used = 1;

        let bytes = sprite.write_to_bytes().unwrap();

        let decoded = Sprite::decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(
            decoded.report.issues,
            [ConsistencyIssue::MemoryBudgetExceeded {
                declared: 1,
                required: 3
            }]
        );

        let err = Sprite::decode(&bytes, &DecodeOptions { strict: true }).unwrap_err();
        assert!(matches!(err, WanError::Inconsistent { .. }));
    }

    #[test]
    fn truncated_file() {
        // sub-header at 0x20 points at animation info far past the end
        let mut bytes = vec![0xAA; 0x40];
        bytes[..4].copy_from_slice(b"SIR0");
        bytes[4..8].copy_from_slice(&0x20u32.to_le_bytes());
        bytes[8..12].copy_from_slice(&0x30u32.to_le_bytes());
        bytes[12..16].copy_from_slice(&[0; 4]);
        bytes[0x20..0x2C].copy_from_slice(&[0x00, 0x10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        bytes[0x30..].copy_from_slice(&[0; 16]);

        assert!(matches!(
            Sprite::open_from_bytes(&bytes),
            Err(WanError::Truncated {
                structure: "animation info",
                offset: 0x1000,
                length: 0x40
            })
        ));
    }

    #[test]
    fn damaged_relocation_list_is_a_warning() {
        let mut bytes = monster().write_to_bytes().unwrap();

        let list_start = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        bytes[list_start..].fill(0x81);

        let decoded = Sprite::decode(&bytes, &DecodeOptions::default()).unwrap();

        assert_eq!(decoded.sprite, monster());
        assert_eq!(decoded.warnings.len(), 1);
        assert!(matches!(
            decoded.warnings[0],
            AmbiguityWarning::UnreadableRelocations { .. }
        ));
    }

    #[test]
    fn odd_flag_is_kept() {
        let mut bytes = image_only().write_to_bytes().unwrap();

        let sub_header_ptr = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let (_, sub_header) = parse_sub_header(&bytes[sub_header_ptr..]).unwrap();
        let is_8bpp = sub_header.image_info_ptr as usize + 10;
        bytes[is_8bpp..is_8bpp + 2].copy_from_slice(&2u16.to_le_bytes());

        let decoded = Sprite::decode(&bytes, &DecodeOptions::default()).unwrap();

        assert_eq!(decoded.sprite.info.bit_depth, BitDepth::Eight);
        assert_eq!(decoded.sprite.info.raw_depth_flag, Some(2));
        assert!(decoded
            .warnings
            .contains(&AmbiguityWarning::NonStandardFlag {
                field: "8-bit",
                value: 2
            }));
        assert_eq!(decoded.sprite.write_to_bytes().unwrap(), bytes);

        // a changed depth drops the raw flag
        let mut sprite = decoded.sprite;
        sprite.info.bit_depth = BitDepth::Four;
        assert_eq!(sprite.info.depth_flag(), 0);
    }

    /// One 8x8 chunk, one descriptor, one sequence.
    fn tiny_monster() -> Sprite {
        let mut sprite = Sprite::default();

        sprite.info.category = SpriteCategory::Monster;
        sprite.info.max_colors_used = 16;
        sprite.info.palette_slots_used = 1;
        sprite.info.max_memory_used = 1;
        sprite.palette = grey_palette(16);

        sprite.chunks = vec![PixelChunk::new(8, 8, vec![1; 64])];
        sprite.chunk_z_indices = vec![0];
        sprite.frame_descriptors = vec![descriptor(0, 8, 8)];
        sprite.frame_groups = vec![FrameGroup { frames: vec![0] }];
        sprite.anim_sequences = vec![AnimSequence {
            frames: vec![frame(1, 0)],
        }];
        sprite.anim_groups = vec![AnimGroup {
            sequences: vec![0],
        }];

        sprite
    }

    #[test]
    fn exact_file_layout() {
        let mut expected: Vec<u8> = vec![];

        // header: sub-header at 0xF8, pointer list at 0x110
        expected.extend_from_slice(b"SIR0");
        expected.extend_from_slice(&[0xF8, 0, 0, 0, 0x10, 0x01, 0, 0, 0, 0, 0, 0]);
        // 0x10 frame descriptor, last in group
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0x00, 0x08, 0, 0]);
        // 0x1A sequence and its terminator
        expected.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[0; 12]);
        // 0x32 alignment
        expected.extend_from_slice(&[0xAA, 0xAA]);
        // 0x34 pixels, two index 1 pixels per byte
        expected.extend_from_slice(&[0x11; 32]);
        // 0x54 pixel source table
        expected.extend_from_slice(&[0x34, 0, 0, 0, 0x20, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[0; 12]);
        // 0x6C colors
        for i in 0..16 {
            expected.extend_from_slice(&[i, i, i, 0x80]);
        }
        // 0xAC palette info
        expected.extend_from_slice(&[0x6C, 0, 0, 0, 0, 0, 0x10, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        // 0xBC frame group table
        expected.extend_from_slice(&[0x10, 0, 0, 0]);
        // 0xC0 sequence pointers of the only animation group
        expected.extend_from_slice(&[0x1A, 0, 0, 0]);
        // 0xC4 animation group table
        expected.extend_from_slice(&[0xC0, 0, 0, 0, 1, 0, 0, 0]);
        // 0xCC chunk table
        expected.extend_from_slice(&[0x54, 0, 0, 0]);
        // 0xD0 animation info, particle table on the frame group table
        expected.extend_from_slice(&[0xBC, 0, 0, 0, 0xBC, 0, 0, 0, 0xC4, 0, 0, 0]);
        expected.extend_from_slice(&[1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        // 0xE8 image info
        expected.extend_from_slice(&[0xCC, 0, 0, 0, 0xAC, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0]);
        // 0xF8 sub-header
        expected.extend_from_slice(&[0xD0, 0, 0, 0, 0xE8, 0, 0, 0, 1, 0, 0, 0]);
        // 0x104 alignment
        expected.extend_from_slice(&[0xAA; 12]);
        // 0x110 pointer offsets: 4, 8, 0x54, 0xAC, 0xBC, 0xC0, 0xC4, 0xCC, 0xD0, 0xD4,
        // 0xD8, 0xE8, 0xEC, 0xF8, 0xFC
        expected.extend_from_slice(&[
            0x04, 0x04, 0x4C, 0x58, 0x10, 0x04, 0x04, 0x08, 0x04, 0x04, 0x04, 0x10, 0x04,
            0x0C, 0x04, 0x00,
        ]);

        assert_eq!(expected.len(), 0x120);

        let bytes = tiny_monster().write_to_bytes().unwrap();
        assert_eq!(bytes, expected);

        assert_eq!(Sprite::open_from_bytes(&expected).unwrap(), tiny_monster());
    }

    #[test]
    fn bad_magic() {
        let mut bytes = monster().write_to_bytes().unwrap();
        bytes[0] = b'X';

        assert!(matches!(
            Sprite::open_from_bytes(&bytes),
            Err(WanError::Sir0 { .. })
        ));
    }

    #[test]
    fn null_sequence_pointer() {
        let mut bytes = object_8bpp().write_to_bytes().unwrap();

        let sub_header_ptr = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let (_, sub_header) = parse_sub_header(&bytes[sub_header_ptr..]).unwrap();
        let anim_info = sub_header.anim_info_ptr as usize;
        let anim_group_table =
            u32::from_le_bytes(bytes[anim_info + 8..anim_info + 12].try_into().unwrap()) as usize;
        let list =
            u32::from_le_bytes(bytes[anim_group_table..anim_group_table + 4].try_into().unwrap())
                as usize;

        bytes[list..list + 4].copy_from_slice(&[0, 0, 0, 0]);

        assert!(matches!(
            Sprite::open_from_bytes(&bytes),
            Err(WanError::NullSequencePointer {
                group: 0,
                sequence: 0
            })
        ));
    }
}
