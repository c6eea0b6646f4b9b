//! SIR0 relocation container.
//!
//! A 16 byte header, the wrapped content, then a list of every absolute offset inside
//! the content that holds a pointer, so a loader can rebase them.
pub mod constants;
pub mod error;
mod parser;
mod types;
mod writer;

pub use parser::{decode_pointer_offsets, parse_header};
pub use types::*;
pub use writer::{content_writer, encode_deltas, encode_pointer_offsets, wrap};
