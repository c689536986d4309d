//! Low-level input cursors
//!
//! [`ByteCursor`] reads fixed-width integers and byte spans from a binary
//! buffer; [`TokenStream`] splits delimited text. Both only move forward and
//! report reads past the end as [`ParseError::UnexpectedEndOfInput`].
//!
//! [`ParseError::UnexpectedEndOfInput`]: medbridge_record::ParseError::UnexpectedEndOfInput

mod bytes;
mod text;

pub use bytes::{ByteCursor, Endian};
pub use text::TokenStream;
