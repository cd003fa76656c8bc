//! Database parsing error types.

use racfscan_codec::{CodecError, Rba};
use thiserror::Error;

/// Errors produced while parsing a RACF database image.
///
/// Variants carry the relative byte address of the offending structure
/// where one exists, so a message chain identifies the failing unit.
#[derive(Debug, Error)]
pub enum DbError {
    /// A primitive or layout decode failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The ICB could not be decoded.
    #[error("malformed inventory control block")]
    Icb(#[source] CodecError),

    /// A template directory entry points outside the file image.
    #[error("template {number} region [{rba} + {len}] is outside the file image")]
    TemplateOutOfBounds {
        /// Template number from the directory entry.
        number: u8,
        /// Region start.
        rba: Rba,
        /// Region length.
        len: u32,
    },

    /// A template region is not a whole number of 17-byte descriptors.
    #[error("template {number} region at {rba} has a truncated descriptor ({len} bytes)")]
    TruncatedTemplate {
        /// Template number from the directory entry.
        number: u8,
        /// Region start.
        rba: Rba,
        /// Region length.
        len: u32,
    },

    /// An index block lies outside the file image.
    #[error("index block at {rba} is outside the file image")]
    IndexBlockOutOfBounds {
        /// Block address.
        rba: Rba,
    },

    /// An index block failed to decode.
    #[error("malformed index block at {rba}")]
    IndexBlock {
        /// Block address.
        rba: Rba,
        /// Underlying decode failure.
        #[source]
        source: CodecError,
    },

    /// The first entry of an index block carries a compression count.
    #[error("index block at {rba}: first entry has front-end compression count {count}")]
    BadCompression {
        /// Block address.
        rba: Rba,
        /// The offending compression count.
        count: u16,
    },

    /// A profile segment failed to decode.
    #[error("malformed profile segment at {rba}")]
    Segment {
        /// Segment address.
        rba: Rba,
        /// Underlying decode failure.
        #[source]
        source: CodecError,
    },

    /// A decoded segment name has no entry in the class schema.
    #[error("segment '{segment}' is not in the {class} schema")]
    UnknownSegment {
        /// Profile class name.
        class: String,
        /// The segment name from the on-disk header.
        segment: String,
    },
}
