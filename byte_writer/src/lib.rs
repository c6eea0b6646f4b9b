//! Little-endian byte writer that remembers where it wrote pointers.
//!
//! Every non-null pointer goes through [`ByteWriter::append_pointer`], which logs the
//! absolute position of the field. The log is append-only and in write order, so a
//! relocation table can be built from it once all writes are done.

pub struct ByteWriter {
    pub data: Vec<u8>,
    pointer_offsets: Vec<u32>,
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            pointer_offsets: Vec::new(),
        }
    }

    /// Starts with `length` zero bytes already written, e.g. space for a header
    /// that is filled in with [`ByteWriter::replace`] at the end.
    pub fn with_reserved(length: usize) -> Self {
        Self {
            data: vec![0u8; length],
            pointer_offsets: Vec::new(),
        }
    }

    pub fn get_offset(&self) -> usize {
        self.data.len()
    }

    pub fn append_u8(&mut self, i: u8) {
        self.data.push(i);
    }

    pub fn append_u16(&mut self, i: u16) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_i16(&mut self, i: i16) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_u32(&mut self, i: u32) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_u32_be(&mut self, i: u32) {
        self.data.extend(i.to_be_bytes());
    }

    pub fn append_u8_slice(&mut self, i: &[u8]) {
        self.data.extend_from_slice(i);
    }

    /// Writes a 4 byte absolute pointer.
    ///
    /// Null pointers are written but not logged, nothing needs relocating there.
    pub fn append_pointer(&mut self, pointer: u32) {
        if pointer != 0 {
            self.pointer_offsets.push(self.get_offset() as u32);
        }

        self.append_u32(pointer);
    }

    /// Fills with `fill` until the length is a multiple of `alignment`.
    pub fn pad_to(&mut self, alignment: usize, fill: u8) {
        let remainder = self.get_offset() % alignment;

        if remainder != 0 {
            self.data
                .resize(self.data.len() + alignment - remainder, fill);
        }
    }

    pub fn replace(&mut self, start: usize, slice: &[u8]) {
        self.data[start..(start + slice.len())].copy_from_slice(slice);
    }

    pub fn replace_with_u32(&mut self, start: usize, val: u32) {
        self.replace(start, &val.to_le_bytes());
    }

    /// Positions of every non-null pointer, in the order they were written.
    pub fn pointer_offsets(&self) -> &[u32] {
        &self.pointer_offsets
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<u32>) {
        (self.data, self.pointer_offsets)
    }
}
