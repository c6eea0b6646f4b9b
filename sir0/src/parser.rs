use nom::{
    combinator::map,
    number::complete::{be_u32, le_u32},
    IResult as _IResult, Parser,
};

use crate::{
    constants::{SIR0_HEADER_LENGTH, SIR0_MAGIC},
    error::Sir0Error,
    types::{Sir0, Sir0Header},
};

pub type IResult<'a, T> = _IResult<&'a [u8], T>;

pub fn parse_header(i: &[u8]) -> IResult<'_, Sir0Header> {
    map(
        (be_u32, le_u32, le_u32, le_u32),
        |(magic, subheader_ptr, pointer_list_ptr, padding)| Sir0Header {
            magic,
            subheader_ptr,
            pointer_list_ptr,
            padding,
        },
    )
    .parse(i)
}

impl Sir0Header {
    /// Reads and validates the header of a file of `bytes.len()` bytes.
    pub fn read(bytes: &[u8]) -> Result<Self, Sir0Error> {
        let length = bytes.len();

        let (_, header) = parse_header(bytes).map_err(|_| Sir0Error::TooShort { length })?;

        header.validate(length)?;

        Ok(header)
    }

    pub fn validate(&self, length: usize) -> Result<(), Sir0Error> {
        if self.magic != SIR0_MAGIC {
            return Err(Sir0Error::UnknownMagic { magic: self.magic });
        }

        let in_bounds =
            |pointer: u32| pointer as usize > SIR0_HEADER_LENGTH && (pointer as usize) < length;

        if !in_bounds(self.subheader_ptr) {
            return Err(Sir0Error::InvalidSubHeaderPointer {
                pointer: self.subheader_ptr,
                length,
            });
        }

        if !in_bounds(self.pointer_list_ptr) {
            return Err(Sir0Error::InvalidPointerListPointer {
                pointer: self.pointer_list_ptr,
                length,
            });
        }

        Ok(())
    }
}

/// Decodes a pointer offset list into absolute offsets.
///
/// Stops at the first zero byte that does not follow a continuation byte.
pub fn decode_pointer_offsets(i: &[u8]) -> Result<Vec<u32>, Sir0Error> {
    let mut offsets = vec![];
    let mut offset_sum: u64 = 0;
    let mut buffer: u64 = 0;
    let mut continued = false;

    for &byte in i {
        if byte == 0 && !continued {
            return Ok(offsets);
        }

        buffer |= (byte & 0x7F) as u64;

        if byte & 0x80 != 0 {
            continued = true;
            buffer <<= 7;

            if buffer > u32::MAX as u64 {
                return Err(Sir0Error::DeltaTooLarge {
                    delta: u32::MAX,
                });
            }
        } else {
            continued = false;
            offset_sum += buffer;
            buffer = 0;

            let offset = u32::try_from(offset_sum).map_err(|_| Sir0Error::DeltaTooLarge {
                delta: u32::MAX,
            })?;

            offsets.push(offset);
        }
    }

    Err(Sir0Error::UnterminatedPointerList)
}

impl<'a> Sir0<'a> {
    pub fn open_from_bytes(bytes: &'a [u8]) -> Result<Self, Sir0Error> {
        let header = Sir0Header::read(bytes)?;
        let list_start = header.pointer_list_ptr as usize;

        let pointer_offsets = decode_pointer_offsets(&bytes[list_start..])?;

        Ok(Self {
            header,
            content: &bytes[..list_start],
            pointer_offsets,
        })
    }
}
