use byte_writer::ByteWriter;

use crate::{
    constants::{
        CONTENT_ALIGNMENT, HEADER_POINTER_OFFSETS, MAX_POINTER_DELTA, PADDING_BYTE,
        SIR0_HEADER_LENGTH, SIR0_MAGIC,
    },
    error::Sir0Error,
};

/// Writer for content that will be wrapped, with the header space already reserved.
///
/// Offsets taken from it are absolute file offsets.
pub fn content_writer() -> ByteWriter {
    ByteWriter::with_reserved(SIR0_HEADER_LENGTH)
}

/// Encodes absolute offsets as base-128 deltas, terminated with a zero byte.
///
/// Groups go most significant first. Leading zero groups are skipped but the last
/// group is always written, so a zero delta is still one byte.
pub fn encode_deltas(offsets: &[u32]) -> Result<Vec<u8>, Sir0Error> {
    let mut res = vec![];
    let mut previous = 0u32;

    for &offset in offsets {
        let delta = offset
            .checked_sub(previous)
            .ok_or(Sir0Error::UnorderedPointerOffset { offset, previous })?;

        if delta > MAX_POINTER_DELTA {
            return Err(Sir0Error::DeltaTooLarge { delta });
        }

        previous = offset;

        let mut started = false;

        for group_index in (1..4).rev() {
            let group = ((delta >> (7 * group_index)) & 0x7F) as u8;

            if group != 0 || started {
                res.push(group | 0x80);
                started = true;
            }
        }

        res.push((delta & 0x7F) as u8);
    }

    res.push(0);

    Ok(res)
}

/// Encodes the pointer offset list the way the game's tools do, header fields first.
pub fn encode_pointer_offsets(offsets: &[u32]) -> Result<Vec<u8>, Sir0Error> {
    let all = HEADER_POINTER_OFFSETS
        .iter()
        .chain(offsets)
        .copied()
        .collect::<Vec<u32>>();

    encode_deltas(&all)
}

/// Finishes a writer from [`content_writer`] into a complete file.
///
/// `subheader_ptr` is the absolute offset of the wrapped format's header.
pub fn wrap(writer: ByteWriter, subheader_ptr: u32) -> Result<Vec<u8>, Sir0Error> {
    let (data, pointer_offsets) = writer.into_parts();
    let mut writer = ByteWriter::new();

    writer.append_u8_slice(&data);
    writer.pad_to(CONTENT_ALIGNMENT, PADDING_BYTE);

    let pointer_list_ptr = u32::try_from(writer.get_offset()).map_err(|_| {
        Sir0Error::ContentTooLarge {
            length: writer.get_offset(),
        }
    })?;

    log::debug!(
        "wrapping {} content bytes, {} pointers, list at {pointer_list_ptr:#x}",
        data.len(),
        pointer_offsets.len()
    );

    writer.append_u8_slice(&encode_pointer_offsets(&pointer_offsets)?);
    writer.pad_to(CONTENT_ALIGNMENT, PADDING_BYTE);

    let mut header = ByteWriter::new();
    header.append_u32_be(SIR0_MAGIC);
    header.append_u32(subheader_ptr);
    header.append_u32(pointer_list_ptr);
    header.append_u32(0);

    writer.replace(0, &header.data);

    Ok(writer.data)
}
