#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sir0Header {
    pub magic: u32,
    /// Absolute offset of the wrapped format's own header.
    pub subheader_ptr: u32,
    /// Absolute offset of the encoded pointer offset list.
    pub pointer_list_ptr: u32,
    pub padding: u32,
}

/// An unwrapped file.
///
/// `content` keeps the header bytes in front so every pointer inside it is still a
/// valid absolute offset.
#[derive(Debug, Clone)]
pub struct Sir0<'a> {
    pub header: Sir0Header,
    pub content: &'a [u8],
    /// Absolute positions of pointer fields, including the two header fields.
    pub pointer_offsets: Vec<u32>,
}
