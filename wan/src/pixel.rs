//! Tiled pixel storage.
//!
//! Chunks are stored as consecutive 8x8 tiles, left to right then top to bottom.
//! The packed bytes are split into runs, each either a zero fill or a copy of
//! literal bytes. Run lengths are always in packed bytes.
use crate::{
    constants::{TILE_AREA, TILE_SIZE},
    types::{BitDepth, PixelChunk},
};

/// Packing of palette indices into bytes.
pub trait DepthCodec: Sync {
    fn pixels_per_byte(&self) -> usize;

    fn pack(&self, pixels: &[u8]) -> Vec<u8>;

    fn unpack(&self, bytes: &[u8]) -> Vec<u8>;

    fn tile_bytes(&self) -> usize {
        TILE_AREA / self.pixels_per_byte()
    }

    fn pixel_count(&self, byte_count: usize) -> usize {
        byte_count * self.pixels_per_byte()
    }
}

/// Two pixels per byte, first pixel in the low nibble.
pub struct FourBit;

/// One pixel per byte.
pub struct EightBit;

impl DepthCodec for FourBit {
    fn pixels_per_byte(&self) -> usize {
        2
    }

    fn pack(&self, pixels: &[u8]) -> Vec<u8> {
        pixels
            .chunks(2)
            .map(|pair| {
                let low = pair[0] & 0x0F;
                let high = pair.get(1).map(|p| p & 0x0F).unwrap_or(0);

                low | (high << 4)
            })
            .collect()
    }

    fn unpack(&self, bytes: &[u8]) -> Vec<u8> {
        bytes
            .iter()
            .flat_map(|byte| [byte & 0x0F, byte >> 4])
            .collect()
    }
}

impl DepthCodec for EightBit {
    fn pixels_per_byte(&self) -> usize {
        1
    }

    fn pack(&self, pixels: &[u8]) -> Vec<u8> {
        pixels.to_vec()
    }

    fn unpack(&self, bytes: &[u8]) -> Vec<u8> {
        bytes.to_vec()
    }
}

impl BitDepth {
    pub fn codec(self) -> &'static dyn DepthCodec {
        match self {
            Self::Four => &FourBit,
            Self::Eight => &EightBit,
        }
    }
}

/// One pixel source entry before it gets a file offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRun {
    /// Packed bytes that are all zero and not stored.
    Zero(usize),
    Data(Vec<u8>),
}

impl SourceRun {
    pub fn len(&self) -> usize {
        match self {
            Self::Zero(length) => *length,
            Self::Data(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reorders a chunk into tiles. Partial tiles at the edges are padded with zero.
pub fn tile_pixels(chunk: &PixelChunk) -> Vec<u8> {
    let tiles_x = chunk.tiles_x();
    let tiles_y = chunk.tiles_y();
    let mut res = vec![0u8; tiles_x * tiles_y * TILE_AREA];

    for tile_y in 0..tiles_y {
        for tile_x in 0..tiles_x {
            let tile_start = (tile_y * tiles_x + tile_x) * TILE_AREA;

            for row in 0..TILE_SIZE {
                for column in 0..TILE_SIZE {
                    let x = tile_x * TILE_SIZE + column;
                    let y = tile_y * TILE_SIZE + row;

                    if let Some(pixel) = chunk.get(x, y) {
                        res[tile_start + row * TILE_SIZE + column] = pixel;
                    }
                }
            }
        }
    }

    res
}

/// Lays `tiled` out on a `tiles_x` by `tiles_y` grid.
///
/// Only whole tiles are placed. Grid cells without a tile stay zero.
pub fn untile_pixels(tiled: &[u8], tiles_x: usize, tiles_y: usize) -> PixelChunk {
    let mut chunk = PixelChunk::blank(tiles_x * TILE_SIZE, tiles_y * TILE_SIZE);
    let width = chunk.width;

    tiled
        .chunks_exact(TILE_AREA)
        .take(tiles_x * tiles_y)
        .enumerate()
        .for_each(|(tile_index, tile)| {
            let origin_x = (tile_index % tiles_x) * TILE_SIZE;
            let origin_y = (tile_index / tiles_x) * TILE_SIZE;

            tile.chunks_exact(TILE_SIZE)
                .enumerate()
                .for_each(|(row, pixels)| {
                    let start = (origin_y + row) * width + origin_x;
                    chunk.pixels[start..start + TILE_SIZE].copy_from_slice(pixels);
                });
        });

    chunk
}

fn is_zero_tile(bytes: &[u8], start: usize, tile_bytes: usize) -> bool {
    start % tile_bytes == 0
        && start + tile_bytes <= bytes.len()
        && bytes[start..start + tile_bytes].iter().all(|&byte| byte == 0)
}

/// Splits packed bytes into runs.
///
/// Uncompressed output is always one data run. Compressed output turns every
/// stretch of whole zero tiles into one zero run, and everything between them into
/// data runs.
pub fn split_runs(packed: &[u8], tile_bytes: usize, compress: bool) -> Vec<SourceRun> {
    if !compress {
        return vec![SourceRun::Data(packed.to_vec())];
    }

    let mut res = vec![];
    let mut pos = 0;

    while pos < packed.len() {
        if is_zero_tile(packed, pos, tile_bytes) {
            let start = pos;

            while is_zero_tile(packed, pos, tile_bytes) {
                pos += tile_bytes;
            }

            res.push(SourceRun::Zero(pos - start));
            continue;
        }

        let start = pos;

        loop {
            // next tile boundary
            pos = ((pos / tile_bytes) + 1) * tile_bytes;

            if pos >= packed.len() {
                pos = packed.len();
                break;
            }

            if is_zero_tile(packed, pos, tile_bytes) {
                break;
            }
        }

        res.push(SourceRun::Data(packed[start..pos].to_vec()));
    }

    res
}

/// Tiles, packs and splits one chunk.
pub fn encode_chunk(chunk: &PixelChunk, bit_depth: BitDepth, compress: bool) -> Vec<SourceRun> {
    let codec = bit_depth.codec();
    let packed = codec.pack(&tile_pixels(chunk));

    split_runs(&packed, codec.tile_bytes(), compress)
}

/// Size of a decoded chunk in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileArrangement {
    pub tiles_x: usize,
    pub tiles_y: usize,
    /// Whether the size came from a frame descriptor rather than a guess.
    pub exact: bool,
}

/// Picks the tile grid for `tile_count` tiles.
///
/// `expected` is the pixel size a frame descriptor gives the chunk. It is used when
/// its tile count matches, otherwise the most square looking grid is guessed.
pub fn tile_arrangement(tile_count: usize, expected: Option<(usize, usize)>) -> TileArrangement {
    if let Some((width, height)) = expected {
        let tiles_x = width / TILE_SIZE;
        let tiles_y = height / TILE_SIZE;

        if tiles_x * tiles_y == tile_count {
            return TileArrangement {
                tiles_x,
                tiles_y,
                exact: true,
            };
        }
    }

    let (tiles_x, tiles_y) = match tile_count {
        0 | 1 => (1, 1),
        4 => (2, 2),
        8 => (4, 2),
        16 => (4, 4),
        _ => {
            let mut best = (1, tile_count);
            let mut best_ratio = f64::INFINITY;

            for tiles_x in [1usize, 2, 4, 8, 16, 32] {
                if tile_count % tiles_x != 0 {
                    continue;
                }

                let tiles_y = tile_count / tiles_x;
                let ratio = tiles_x.max(tiles_y) as f64 / tiles_x.min(tiles_y) as f64;

                if ratio < best_ratio {
                    best_ratio = ratio;
                    best = (tiles_x, tiles_y);
                }
            }

            best
        }
    };

    TileArrangement {
        tiles_x,
        tiles_y,
        exact: false,
    }
}

/// Rebuilds a chunk from its packed bytes, runs already concatenated.
pub fn decode_chunk(
    packed: &[u8],
    bit_depth: BitDepth,
    expected: Option<(usize, usize)>,
) -> (PixelChunk, TileArrangement) {
    let tiled = bit_depth.codec().unpack(packed);
    let tile_count = tiled.len().div_ceil(TILE_AREA);

    let arrangement = tile_arrangement(tile_count, expected);

    (
        untile_pixels(&tiled, arrangement.tiles_x, arrangement.tiles_y),
        arrangement,
    )
}
