//! Block Availability Map blocks.
//!
//! BAM blocks account for free space: each covers a run of 4 KB blocks
//! with a two-byte mask per block. The profile decode never consumes
//! them; the pipeline decodes the first BAM block for diagnostics when
//! the ICB carries a chain head.

use racfscan_codec::{decode_struct, CodecError, FieldSpec, Kind, Rba, Value};

const BAM_LAYOUT: &[FieldSpec] = &[
    // RBA of the previous BAM block (0 for the first)
    FieldSpec::new("Prev", Kind::Rba, "size=6"),
    // RBA of the next BAM block (0 for the last)
    FieldSpec::new("Next", Kind::Rba, "size=6"),
    // RBA of the first 4 KB block this BAM block covers
    FieldSpec::new("First", Kind::Rba, "size=6"),
    // Number of covered blocks
    FieldSpec::new("Num", Kind::U16, ""),
    FieldSpec::new("Mask", Kind::Seq(&Kind::U16), "size=Num"),
];

/// One decoded BAM block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BamBlock {
    /// Previous block in the chain.
    pub prev: Rba,
    /// Next block in the chain.
    pub next: Rba,
    /// First covered 4 KB block.
    pub first: Rba,
    /// Per-block availability masks.
    pub masks: Vec<u16>,
}

impl BamBlock {
    /// Decode a BAM block from the front of `data`.
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, CodecError> {
        let (record, _) = decode_struct(data, BAM_LAYOUT)?;
        let masks = record
            .array("Mask")?
            .iter()
            .filter_map(|v| match v {
                Value::Int(n) => Some(*n as u16),
                _ => None,
            })
            .collect();
        Ok(Self {
            prev: record.rba("Prev")?,
            next: record.rba("Next")?,
            first: record.rba("First")?,
            masks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bam_decode() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        data.extend_from_slice(&0x9000u64.to_be_bytes()[2..]);
        data.extend_from_slice(&0x1000u64.to_be_bytes()[2..]);
        data.extend_from_slice(&3u16.to_be_bytes());
        for mask in [0xFFFFu16, 0x00FF, 0x0000] {
            data.extend_from_slice(&mask.to_be_bytes());
        }

        let bam = BamBlock::from_bytes(&data).unwrap();
        assert!(bam.prev.is_null());
        assert_eq!(bam.next, Rba::new(0x9000));
        assert_eq!(bam.first, Rba::new(0x1000));
        assert_eq!(bam.masks, vec![0xFFFF, 0x00FF, 0x0000]);
    }

    #[test]
    fn test_bam_truncated() {
        let data = [0u8; 19];
        assert!(BamBlock::from_bytes(&data).is_err());
    }
}
