use crate::constants::{TILE_SIZE, X_RESOLUTION_MASK, Y_RESOLUTION_MASK};

const SQUARE: [(usize, usize); 4] = [(8, 8), (16, 16), (32, 32), (64, 64)];
const WIDE: [(usize, usize); 4] = [(16, 8), (32, 8), (32, 16), (64, 32)];
const TALL: [(usize, usize); 4] = [(8, 16), (8, 32), (16, 32), (32, 64)];

/// What the game draws when the shape bits are not one it knows.
pub const FALLBACK_DIMENSIONS: (usize, usize) = (64, 64);

/// 4-bit chunk rectangle code of a frame descriptor.
///
/// Bits 1:0 are the shape (square, wide, tall), stored in bits 15:14 of the Y field.
/// Bits 3:2 are the size step, stored in bits 15:14 of the X field.
/// Shape `3` does not exist in the game but is kept so it can be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Resolution(u8);

impl Resolution {
    pub fn from_code(code: u8) -> Self {
        Self(code & 0x0F)
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn from_fields(y_field: u16, x_field: u16) -> Self {
        let shape = (y_field & Y_RESOLUTION_MASK) >> 14;
        let size = (x_field & X_RESOLUTION_MASK) >> 14;

        Self(((size << 2) | shape) as u8)
    }

    pub fn y_field_bits(self) -> u16 {
        ((self.0 & 0b11) as u16) << 14
    }

    pub fn x_field_bits(self) -> u16 {
        ((self.0 >> 2) as u16) << 14
    }

    /// Width and height in pixels, `None` for an unknown shape.
    pub fn dimensions(self) -> Option<(usize, usize)> {
        let size = (self.0 >> 2) as usize;

        match self.0 & 0b11 {
            0 => Some(SQUARE[size]),
            1 => Some(WIDE[size]),
            2 => Some(TALL[size]),
            _ => None,
        }
    }

    pub fn from_dimensions(width: usize, height: usize) -> Option<Self> {
        Self::all().find(|res| res.dimensions() == Some((width, height)))
    }

    pub fn tile_count(self) -> Option<usize> {
        self.dimensions()
            .map(|(width, height)| (width / TILE_SIZE) * (height / TILE_SIZE))
    }

    /// The 12 rectangles the format can express.
    pub fn all() -> impl Iterator<Item = Self> {
        (0u8..16).map(Self).filter(|res| res.0 & 0b11 != 0b11)
    }
}

/// Every chunk rectangle, largest area first.
pub fn chunk_sizes() -> Vec<(usize, usize)> {
    let mut res = Resolution::all()
        .filter_map(Resolution::dimensions)
        .collect::<Vec<_>>();

    res.sort_by_key(|&(width, height)| std::cmp::Reverse((width * height, width.max(height))));

    res
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn twelve_unique_codes() {
        let all = Resolution::all().collect::<Vec<_>>();
        assert_eq!(all.len(), 12);

        let dimensions = all
            .iter()
            .filter_map(|res| res.dimensions())
            .collect::<HashSet<_>>();
        assert_eq!(dimensions.len(), 12);
    }

    #[test]
    fn dimensions_round_trip() {
        for (width, height) in chunk_sizes() {
            let res = Resolution::from_dimensions(width, height).unwrap();
            assert_eq!(res.dimensions(), Some((width, height)));

            let back = Resolution::from_fields(res.y_field_bits(), res.x_field_bits());
            assert_eq!(back, res);
        }
    }

    #[test]
    fn known_codes() {
        // shape in the Y field, size in the X field
        assert_eq!(Resolution::from_fields(0, 0).dimensions(), Some((8, 8)));
        assert_eq!(
            Resolution::from_fields(0, 0xC000).dimensions(),
            Some((64, 64))
        );
        assert_eq!(
            Resolution::from_fields(0x4000, 0x4000).dimensions(),
            Some((32, 8))
        );
        assert_eq!(
            Resolution::from_fields(0x8000, 0xC000).dimensions(),
            Some((32, 64))
        );
        assert_eq!(Resolution::from_dimensions(16, 32).unwrap().code(), 0b1010);
    }

    #[test]
    fn unknown_shape() {
        let res = Resolution::from_fields(0xC000, 0x4000);

        assert_eq!(res.code(), 0b0111);
        assert_eq!(res.dimensions(), None);
        assert_eq!(res.y_field_bits(), 0xC000);
        assert_eq!(res.x_field_bits(), 0x4000);
    }

    #[test]
    fn non_chunk_size() {
        assert_eq!(Resolution::from_dimensions(24, 8), None);
        assert_eq!(Resolution::from_dimensions(64, 16), None);
    }

    #[test]
    fn sizes_largest_first() {
        let sizes = chunk_sizes();

        assert_eq!(sizes[0], (64, 64));
        assert_eq!(sizes[11], (8, 8));
    }
}
