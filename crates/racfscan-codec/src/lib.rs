//! Primitive codec and tag-driven binary decoder for RACF database images.
//!
//! A RACF database mixes EBCDIC text, big-endian integers, packed BCD
//! dates and times, bit-packed flag bytes, and 48-bit relative byte
//! addresses. This crate provides:
//!
//! - **Primitive types** — [`EbcdicStr`], [`Date`], [`Time`], [`Flag`],
//!   [`Rba`], [`HexBytes`] with the renderings used by the extraction
//!   tool.
//! - **Big-endian reads** — checked 1/2/4/8-byte decodes plus a
//!   zero-pad-left path for odd widths (3, 6, 7 bytes).
//! - **Tag-driven decoder** — static layout tables ([`FieldSpec`] /
//!   [`Kind`]) paired with a compact tag syntax (`size=6`,
//!   `size=LenName`, `bit=3`, `final`) that drive a single decode engine
//!   over raw bytes, producing a [`DecodedRecord`] and the number of
//!   bytes consumed.
//!
//! Field layouts for profile data are not known at build time — they come
//! from the database itself — so the decoder is a runtime engine rather
//! than a derive macro.

pub mod decode;
pub mod ebcdic;
pub mod error;
pub mod tag;
pub mod types;

pub use decode::{decode_struct, DecodedField, DecodedRecord, FieldSpec, Kind, Value};
pub use ebcdic::{
    ascii_to_ebcdic, ascii_to_ebcdic_byte, ebcdic_to_ascii, ebcdic_to_ascii_byte, EbcdicStr,
};
pub use error::CodecError;
pub use tag::{TagSet, TagValue};
pub use types::{
    read_i16, read_i32, read_i64, read_u16, read_u32, read_u64, read_uint, zero_pad_left, Date,
    Flag, HexBytes, Rba, Time,
};

/// Convenience result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
