//! Index blocks and the level-1 sequence set.
//!
//! Profiles are catalogued in 4 KB index blocks. The level-1 blocks form
//! a chain (the sequence set); each block holds a run of index entries
//! plus, at the header's last-entry offset, a chain pointer to the next
//! block. Entry names use front-end compression: an entry stores only
//! the tail of its name plus the count of leading bytes shared with the
//! previous entry.

use std::collections::HashSet;

use racfscan_codec::{decode_struct, EbcdicStr, FieldSpec, Kind, Rba, Value};

use crate::error::DbError;
use crate::Result;

/// Index blocks are always 4 KB.
pub const INDEX_BLOCK_SIZE: usize = 0x1000;

/// First block identifier byte.
pub const INDEX_BLOCK_ID1: u8 = 0x8A;

/// Second block identifier byte.
pub const INDEX_BLOCK_ID2: u8 = 0x4E;

/// Identifier of the sequence-set chain pointer entry.
pub const SEQUENCE_SET_CHAIN_ID: u16 = 0x2066;

const HEADER_LAYOUT: &[FieldSpec] = &[
    // Block identifiers
    FieldSpec::new("Id1", Kind::U8, ""),
    FieldSpec::new("Len", Kind::U16, ""),
    FieldSpec::new("Id2", Kind::U8, ""),
    // 0 regular, 1 alias
    FieldSpec::new("FormatId", Kind::U8, ""),
    // Index level (level 1 is the sequence set)
    FieldSpec::new("Level", Kind::U8, ""),
    // In a level-1 block the last entry is the chain pointer
    FieldSpec::new("OffsetLast", Kind::U16, ""),
    FieldSpec::new("OffsetFree", Kind::U16, ""),
    FieldSpec::new("OffsetTable", Kind::U16, ""),
    FieldSpec::new("EntryNum", Kind::U16, ""),
];

const SEGMENT_DATA_LAYOUT: &[FieldSpec] = &[
    FieldSpec::new("Id", Kind::U8, ""),
    FieldSpec::new("RBA", Kind::Rba, "size=6"),
];

const SEGMENT_AREA_LAYOUT: &[FieldSpec] = &[
    // Number of segment-data fields; also the profile's segment count
    FieldSpec::new("Num", Kind::U8, ""),
    FieldSpec::new("Data", Kind::Seq(&Kind::Struct(SEGMENT_DATA_LAYOUT)), "size=Num"),
];

const ENTRY_LAYOUT: &[FieldSpec] = &[
    // 0x21 normal, 0x22 duplicate, 0x23 alias
    FieldSpec::new("Id", Kind::U8, ""),
    // Profile class: 1 group, 2 user, 4 data set, 5 general resource
    FieldSpec::new("Type", Kind::U8, ""),
    FieldSpec::new("LenEntry", Kind::U16, ""),
    // Offset from entry start to the segment data area
    FieldSpec::new("Offset", Kind::U16, ""),
    // Front-end compression count
    FieldSpec::new("CompressCount", Kind::U16, ""),
    FieldSpec::new("LenName", Kind::U16, ""),
    FieldSpec::new("", Kind::Skip, "size=2"),
    // The stored name tail
    FieldSpec::new("Name", Kind::Ebcdic, "size=LenName"),
    FieldSpec::new("Data", Kind::Struct(SEGMENT_AREA_LAYOUT), ""),
];

const CHAIN_LAYOUT: &[FieldSpec] = &[
    FieldSpec::new("Id", Kind::U16, ""),
    // RBA of the next level-1 block; 0 ends the chain
    FieldSpec::new("RBA", Kind::Rba, "size=6"),
];

/// Display name of an index entry kind byte.
pub fn entry_kind_name(kind: u8) -> Option<&'static str> {
    match kind {
        0x21 => Some("Normal index entry"),
        0x22 => Some("Duplicate index entry"),
        0x23 => Some("Alias index entry"),
        _ => None,
    }
}

/// Display name of a profile class id.
pub fn class_display_name(class_id: u8) -> Option<&'static str> {
    match class_id {
        1 => Some("Group"),
        2 => Some("User"),
        4 => Some("Data set"),
        5 => Some("General resource"),
        _ => None,
    }
}

/// Display name of a segment id within a class.
pub fn segment_display_name(class_id: u8, segment_id: u8) -> Option<&'static str> {
    match (class_id, segment_id) {
        (1, 0x1) => Some("BASE"),
        (1, 0x2) => Some("DFP"),
        (1, 0x3) => Some("OMVS"),
        (1, 0x4) => Some("OVM"),
        (1, 0x5) => Some("TME"),
        (1, 0x6) => Some("CSDATA"),
        (2, 0x1) => Some("BASE"),
        (2, 0x2) => Some("DFP"),
        (2, 0x3) => Some("TSO"),
        (2, 0x4) => Some("CICS"),
        (2, 0x5) => Some("LANGUAGE"),
        (2, 0x6) => Some("OPERPARM"),
        (2, 0x7) => Some("WORKATTR"),
        (2, 0x8) => Some("OMVS"),
        (2, 0x9) => Some("NETVIEW"),
        (2, 0xA) => Some("DCE"),
        (2, 0xB) => Some("OVM"),
        (2, 0xC) => Some("LNOTES"),
        (2, 0xD) => Some("NDS"),
        (2, 0xE) => Some("KERB"),
        (2, 0xF) => Some("PROXY"),
        (2, 0x10) => Some("EIM"),
        (2, 0x11) => Some("CSDATA"),
        (4, 0x1) => Some("BASE"),
        (4, 0x2) => Some("DFP"),
        (4, 0x3) => Some("TME"),
        (5, 0x1) => Some("BASE"),
        (5, 0x2) => Some("SESSION"),
        (5, 0x3) => Some("DLFDATA"),
        (5, 0x4) => Some("SSIGNON"),
        (5, 0x5) => Some("STDATA"),
        (5, 0x6) => Some("SVFMR"),
        (5, 0x7) => Some("CERTDATA"),
        (5, 0x8) => Some("TME"),
        (5, 0x9) => Some("KERB"),
        (5, 0xA) => Some("PROXY"),
        (5, 0xB) => Some("EIM"),
        (5, 0xC) => Some("ALIAS"),
        (5, 0xD) => Some("CDTINFO"),
        (5, 0xE) => Some("ICTX"),
        (5, 0xF) => Some("CFDEF"),
        (5, 0x10) => Some("SIGVER"),
        (5, 0x11) => Some("ICSF"),
        _ => None,
    }
}

/// Index block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBlockHeader {
    /// First identifier byte (0x8A).
    pub id1: u8,
    /// Block length (0x1000).
    pub len: u16,
    /// Second identifier byte (0x4E).
    pub id2: u8,
    /// 0 for regular blocks, 1 for alias blocks.
    pub format: u8,
    /// Index level (1 for the sequence set).
    pub level: u8,
    /// Offset of the last entry.
    pub offset_last: u16,
    /// Offset of free space.
    pub offset_free: u16,
    /// Offset of the entry-offset table.
    pub offset_table: u16,
    /// Number of index entries.
    pub entry_count: u16,
}

/// A segment-data pair: which segment, and where its record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPointer {
    /// Segment id within the profile's class.
    pub id: u8,
    /// Address of the segment record.
    pub rba: Rba,
}

/// One index entry with its decompressed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Entry kind byte.
    pub kind: u8,
    /// Profile class id.
    pub class_id: u8,
    /// Total entry length.
    pub entry_len: u16,
    /// Offset to the segment data area.
    pub data_offset: u16,
    /// Front-end compression count (already applied to `name`).
    pub compress_count: u16,
    /// Full entry name, reconstructed from the previous entry when the
    /// compression count is non-zero.
    pub name: EbcdicStr,
    /// Segment-data pairs.
    pub segments: Vec<SegmentPointer>,
}

/// One decoded level-1 index block.
#[derive(Debug, Clone)]
pub struct IndexBlock {
    /// Block address.
    pub rba: Rba,
    /// Block header.
    pub header: IndexBlockHeader,
    /// Entries with decompressed names.
    pub entries: Vec<IndexEntry>,
    /// Next block in the sequence set; 0 ends the chain.
    pub next: Rba,
}

fn entry_from_record(record: &racfscan_codec::DecodedRecord) -> std::result::Result<IndexEntry, racfscan_codec::CodecError> {
    let mut segments = Vec::new();
    if let Some(Value::Record(area)) = record.get("Data") {
        for item in area.array("Data")? {
            if let Value::Record(pair) = item {
                segments.push(SegmentPointer {
                    id: pair.int("Id")? as u8,
                    rba: pair.rba("RBA")?,
                });
            }
        }
    }
    Ok(IndexEntry {
        kind: record.int("Id")? as u8,
        class_id: record.int("Type")? as u8,
        entry_len: record.int("LenEntry")? as u16,
        data_offset: record.int("Offset")? as u16,
        compress_count: record.int("CompressCount")? as u16,
        name: record.ebcdic("Name")?.clone(),
        segments,
    })
}

impl IndexBlock {
    /// Decode one 4 KB block, applying front-end name decompression.
    pub fn from_bytes(data: &[u8], rba: Rba) -> Result<Self> {
        let wrap = |source| DbError::IndexBlock { rba, source };

        let (header_record, header_len) = decode_struct(data, HEADER_LAYOUT).map_err(wrap)?;
        let header = IndexBlockHeader {
            id1: header_record.int("Id1").map_err(wrap)? as u8,
            len: header_record.int("Len").map_err(wrap)? as u16,
            id2: header_record.int("Id2").map_err(wrap)? as u8,
            format: header_record.int("FormatId").map_err(wrap)? as u8,
            level: header_record.int("Level").map_err(wrap)? as u8,
            offset_last: header_record.int("OffsetLast").map_err(wrap)? as u16,
            offset_free: header_record.int("OffsetFree").map_err(wrap)? as u16,
            offset_table: header_record.int("OffsetTable").map_err(wrap)? as u16,
            entry_count: header_record.int("EntryNum").map_err(wrap)? as u16,
        };

        let mut entries: Vec<IndexEntry> = Vec::with_capacity(header.entry_count as usize);
        let mut pos = header_len;
        for i in 0..header.entry_count {
            let rest = data.get(pos..).unwrap_or(&[]);
            let (record, _) = decode_struct(rest, ENTRY_LAYOUT).map_err(wrap)?;
            let mut entry = entry_from_record(&record).map_err(wrap)?;

            if entry.compress_count > 0 {
                let count = entry.compress_count as usize;
                let Some(previous) = i.checked_sub(1).and_then(|p| entries.get(p as usize)) else {
                    return Err(DbError::BadCompression {
                        rba,
                        count: entry.compress_count,
                    });
                };
                let prefix = previous.name.as_bytes();
                if prefix.len() < count {
                    return Err(wrap(racfscan_codec::CodecError::InsufficientData {
                        expected: count,
                        actual: prefix.len(),
                    }));
                }
                let mut full = prefix[..count].to_vec();
                full.extend_from_slice(entry.name.as_bytes());
                entry.name = EbcdicStr::new(full);
            }

            // Entries are packed back to back; the declared entry length
            // is authoritative for the stride.
            pos += entry.entry_len as usize;
            entries.push(entry);
        }

        let chain_data = data.get(header.offset_last as usize..).unwrap_or(&[]);
        let (chain, _) = decode_struct(chain_data, CHAIN_LAYOUT).map_err(wrap)?;
        let next = chain.rba("RBA").map_err(wrap)?;

        Ok(Self {
            rba,
            header,
            entries,
            next,
        })
    }
}

/// Walk the sequence set from its first block, returning every level-1
/// block in chain order.
pub fn walk_sequence_set(data: &[u8], first: Rba) -> Result<Vec<IndexBlock>> {
    let mut blocks = Vec::new();
    let mut seen = HashSet::new();
    let mut rba = first;

    while !rba.is_null() {
        if !seen.insert(rba.value()) {
            // A repeated chain address would loop forever.
            tracing::warn!("index chain revisits block {rba}, stopping the walk");
            break;
        }
        let start = rba.offset();
        let end = start
            .checked_add(INDEX_BLOCK_SIZE)
            .filter(|&e| e <= data.len())
            .ok_or(DbError::IndexBlockOutOfBounds { rba })?;
        let block = IndexBlock::from_bytes(&data[start..end], rba)?;
        rba = block.next;
        blocks.push(block);
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a synthetic 4 KB level-1 block from (compress, name,
    /// class, segments) tuples.
    pub(crate) fn build_block(
        entries: &[(u16, &[u8], u8, &[(u8, u64)])],
        next: u64,
    ) -> Vec<u8> {
        let mut block = vec![0u8; INDEX_BLOCK_SIZE];
        let mut pos = 14usize;
        for (compress, name, class, segments) in entries {
            let entry_len = 12 + name.len() + 1 + segments.len() * 7;
            block[pos] = 0x21;
            block[pos + 1] = *class;
            block[pos + 2..pos + 4].copy_from_slice(&(entry_len as u16).to_be_bytes());
            let data_offset = (12 + name.len()) as u16;
            block[pos + 4..pos + 6].copy_from_slice(&data_offset.to_be_bytes());
            block[pos + 6..pos + 8].copy_from_slice(&compress.to_be_bytes());
            block[pos + 8..pos + 10].copy_from_slice(&(name.len() as u16).to_be_bytes());
            block[pos + 12..pos + 12 + name.len()].copy_from_slice(name);
            let mut sp = pos + 12 + name.len();
            block[sp] = segments.len() as u8;
            sp += 1;
            for (id, rba) in *segments {
                block[sp] = *id;
                block[sp + 1..sp + 7].copy_from_slice(&rba.to_be_bytes()[2..]);
                sp += 7;
            }
            pos += entry_len;
        }

        // Header: identifiers, length, level 1, chain pointer offset.
        block[0] = INDEX_BLOCK_ID1;
        block[1..3].copy_from_slice(&(INDEX_BLOCK_SIZE as u16).to_be_bytes());
        block[3] = INDEX_BLOCK_ID2;
        block[4] = 0;
        block[5] = 1;
        block[6..8].copy_from_slice(&(pos as u16).to_be_bytes());
        block[12..14].copy_from_slice(&(entries.len() as u16).to_be_bytes());

        // Sequence-set chain pointer.
        block[pos..pos + 2].copy_from_slice(&SEQUENCE_SET_CHAIN_ID.to_be_bytes());
        block[pos + 2..pos + 8].copy_from_slice(&next.to_be_bytes()[2..]);
        block
    }

    #[test]
    fn test_block_decode() {
        // "SYS1" in EBCDIC.
        let name = [0xE2, 0xE8, 0xE2, 0xF1];
        let data = build_block(&[(0, &name, 1, &[(1, 0x3000), (3, 0x4000)])], 0);
        let block = IndexBlock::from_bytes(&data, Rba::new(0x2000)).unwrap();

        assert_eq!(block.header.id1, INDEX_BLOCK_ID1);
        assert_eq!(block.header.level, 1);
        assert_eq!(block.entries.len(), 1);
        let entry = &block.entries[0];
        assert_eq!(entry.kind, 0x21);
        assert_eq!(entry.class_id, 1);
        assert_eq!(entry.name.to_text(), "SYS1");
        assert_eq!(
            entry.segments,
            vec![
                SegmentPointer {
                    id: 1,
                    rba: Rba::new(0x3000)
                },
                SegmentPointer {
                    id: 3,
                    rba: Rba::new(0x4000)
                },
            ]
        );
        assert!(block.next.is_null());
    }

    #[test]
    fn test_name_decompression() {
        // First entry "GRO", second stores "OUP2" with three shared
        // leading bytes: full name "GROOUP2".
        let first = [0xC7, 0xD9, 0xD6];
        let second = [0xD6, 0xE4, 0xD7, 0xF2];
        let data = build_block(
            &[(0, &first, 1, &[(1, 0x3000)]), (3, &second, 1, &[(1, 0x5000)])],
            0,
        );
        let block = IndexBlock::from_bytes(&data, Rba::new(0x2000)).unwrap();
        assert_eq!(block.entries[1].name.to_text(), "GROOUP2");
        // Shared prefix property: the first C bytes match.
        assert_eq!(
            block.entries[1].name.as_bytes()[..3],
            block.entries[0].name.as_bytes()[..3]
        );
    }

    #[test]
    fn test_first_entry_with_compression_is_rejected() {
        let name = [0xC1, 0xC2];
        let data = build_block(&[(2, &name, 1, &[])], 0);
        assert!(matches!(
            IndexBlock::from_bytes(&data, Rba::new(0x2000)),
            Err(DbError::BadCompression { count: 2, .. })
        ));
    }

    #[test]
    fn test_chain_walk() {
        let name_a = [0xC1];
        let name_b = [0xC2];
        let block1 = build_block(&[(0, &name_a, 1, &[])], 0x2000);
        let block2 = build_block(&[(0, &name_b, 2, &[])], 0);

        let mut image = vec![0u8; 0x3000];
        image[0x1000..0x2000].copy_from_slice(&block1);
        image[0x2000..0x3000].copy_from_slice(&block2);

        let blocks = walk_sequence_set(&image, Rba::new(0x1000)).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].entries[0].name.to_text(), "A");
        assert_eq!(blocks[1].entries[0].name.to_text(), "B");
    }

    #[test]
    fn test_chain_out_of_bounds() {
        let image = vec![0u8; 0x100];
        assert!(matches!(
            walk_sequence_set(&image, Rba::new(0x1000)),
            Err(DbError::IndexBlockOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_display_tables() {
        assert_eq!(entry_kind_name(0x21), Some("Normal index entry"));
        assert_eq!(class_display_name(2), Some("User"));
        assert_eq!(segment_display_name(2, 0x3), Some("TSO"));
        assert_eq!(segment_display_name(5, 0x10), Some("SIGVER"));
        assert_eq!(segment_display_name(3, 0x1), None);
    }
}
