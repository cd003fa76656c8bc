//! End-to-end extraction over small synthetic database images.

use racfscan_db::{extract, ClassifierMode, FieldValue};

const ICB_IMAGE_SIZE: usize = 0x1000;

fn ebcdic(text: &str) -> Vec<u8> {
    text.bytes()
        .map(|ch| match ch {
            b'A'..=b'I' => 0xC1 + (ch - b'A'),
            b'J'..=b'R' => 0xD1 + (ch - b'J'),
            b'S'..=b'Z' => 0xE2 + (ch - b'S'),
            b'0'..=b'9' => 0xF0 + (ch - b'0'),
            _ => 0x40,
        })
        .collect()
}

fn template_field(name: &str, id: u8, flag1: u8, flag2: u8, len: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(17);
    let mut padded = ebcdic(name);
    padded.resize(8, 0x40);
    buf.extend_from_slice(&padded);
    buf.push(id);
    buf.push(flag1);
    buf.push(flag2);
    buf.push(0);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.push(0);
    buf
}

/// A builder for one-file synthetic databases.
struct ImageBuilder {
    data: Vec<u8>,
    template_slot: usize,
}

impl ImageBuilder {
    fn new() -> Self {
        Self {
            data: vec![0u8; ICB_IMAGE_SIZE],
            template_slot: 0,
        }
    }

    fn put_rba(&mut self, at: usize, value: u64) {
        self.data[at..at + 6].copy_from_slice(&value.to_be_bytes()[2..]);
    }

    fn set_index_rba(&mut self, rba: u64) {
        self.put_rba(14, rba);
    }

    /// Append a template directory entry pointing at `bytes` placed at
    /// the current end of the image.
    fn add_template(&mut self, number: u8, bytes: &[u8]) -> u64 {
        let rba = self.data.len() as u64;
        self.data.extend_from_slice(bytes);
        let at = 34 + self.template_slot * 16;
        self.data[at..at + 2].copy_from_slice(&(bytes.len() as u16).to_be_bytes());
        self.data[at + 2] = number;
        let rba_bytes = rba.to_be_bytes();
        self.data[at + 4..at + 10].copy_from_slice(&rba_bytes[2..]);
        self.template_slot += 1;
        rba
    }

    /// Append arbitrary bytes, returning their address.
    fn add_region(&mut self, bytes: &[u8]) -> u64 {
        let rba = self.data.len() as u64;
        self.data.extend_from_slice(bytes);
        rba
    }

    /// Append a level-1 index block built from
    /// (compress, name, class, segment pointers) tuples.
    fn add_index_block(&mut self, entries: &[(u16, Vec<u8>, u8, Vec<(u8, u64)>)], next: u64) -> u64 {
        let mut block = vec![0u8; 0x1000];
        let mut pos = 14usize;
        for (compress, name, class, segments) in entries {
            let entry_len = 12 + name.len() + 1 + segments.len() * 7;
            block[pos] = 0x21;
            block[pos + 1] = *class;
            block[pos + 2..pos + 4].copy_from_slice(&(entry_len as u16).to_be_bytes());
            block[pos + 4..pos + 6].copy_from_slice(&((12 + name.len()) as u16).to_be_bytes());
            block[pos + 6..pos + 8].copy_from_slice(&compress.to_be_bytes());
            block[pos + 8..pos + 10].copy_from_slice(&(name.len() as u16).to_be_bytes());
            block[pos + 12..pos + 12 + name.len()].copy_from_slice(name);
            let mut sp = pos + 12 + name.len();
            block[sp] = segments.len() as u8;
            sp += 1;
            for (id, rba) in segments {
                block[sp] = *id;
                block[sp + 1..sp + 7].copy_from_slice(&rba.to_be_bytes()[2..]);
                sp += 7;
            }
            pos += entry_len;
        }
        block[0] = 0x8A;
        block[1..3].copy_from_slice(&0x1000u16.to_be_bytes());
        block[3] = 0x4E;
        block[5] = 1;
        block[6..8].copy_from_slice(&(pos as u16).to_be_bytes());
        block[12..14].copy_from_slice(&(entries.len() as u16).to_be_bytes());
        block[pos..pos + 2].copy_from_slice(&0x2066u16.to_be_bytes());
        block[pos + 2..pos + 8].copy_from_slice(&next.to_be_bytes()[2..]);
        self.add_region(&block)
    }

    /// Append a segment record, returning its address.
    fn add_segment(&mut self, profile: &str, segment: &str, slots: &[(u8, Vec<u8>)]) -> u64 {
        let name = ebcdic(profile);
        let mut body = Vec::new();
        for (id, value) in slots {
            body.push(*id);
            body.push(value.len() as u8);
            body.extend_from_slice(value);
        }
        let header_len = 22 + name.len();
        let logical_len = (header_len + body.len()) as u32;

        let mut record = Vec::new();
        record.push(0x83);
        record.extend_from_slice(&(logical_len + 32).to_be_bytes());
        record.extend_from_slice(&logical_len.to_be_bytes());
        let mut seg = ebcdic(segment);
        seg.resize(8, 0x40);
        record.extend_from_slice(&seg);
        record.extend_from_slice(&(name.len() as u16).to_be_bytes());
        record.push(0);
        record.extend_from_slice(&name);
        record.extend_from_slice(&body);
        self.add_region(&record)
    }
}

fn group_template() -> Vec<u8> {
    [
        template_field("GROUP", 1, 0, 0, 0),
        template_field("ENTYPE", 2, 0, 0, 1),
        template_field("SUPGROUP", 3, 0, 0, 0),
        template_field("AUTHDATE", 4, 0, 0x20, 3),
    ]
    .concat()
}

fn text_of(value: &FieldValue) -> String {
    match value {
        FieldValue::Ebcdic(s) => s.to_text(),
        FieldValue::Date(d) => d.to_string(),
        other => panic!("unexpected value {other:?}"),
    }
}

#[test]
fn test_single_group_profile() {
    let mut image = ImageBuilder::new();
    let _ = image.add_template(1, &group_template());
    let seg_rba = image.add_segment(
        "SYS1",
        "BASE",
        &[
            (2, vec![0x01]),
            (3, ebcdic("SYS1    ")),
            (4, vec![0x23, 0x04, 0x5C]),
        ],
    );
    let index_rba = image.add_index_block(&[(0, ebcdic("SYS1"), 1, vec![(1, seg_rba)])], 0);
    image.set_index_rba(index_rba);

    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();

    assert_eq!(db.profiles.len(), 1);
    let profile = &db.profiles[0];
    assert_eq!(profile.name, "SYS1");
    assert_eq!(profile.class.name, "GROUP");
    assert_eq!(profile.class.id, 1);
    assert_eq!(profile.segments.len(), 1);

    let segment = &profile.segments[0];
    assert_eq!(segment.name, "BASE");
    assert_eq!(segment.id, 1);
    let record = &segment.record;
    assert_eq!(record.get("ENTYPE").unwrap().as_int(), Some(1));
    assert_eq!(text_of(record.get("SUPGROUP").unwrap()), "SYS1    ");
    assert_eq!(text_of(record.get("AUTHDATE").unwrap()), "2023, day 45");
}

#[test]
fn test_raw_is_the_hex_logical_prefix() {
    let mut image = ImageBuilder::new();
    let _ = image.add_template(1, &group_template());
    let seg_rba = image.add_segment("SYS1", "BASE", &[(2, vec![0x01])]);
    let index_rba = image.add_index_block(&[(0, ebcdic("SYS1"), 1, vec![(1, seg_rba)])], 0);
    image.set_index_rba(index_rba);

    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();
    let segment = &db.profiles[0].segments[0];

    assert_eq!(segment.raw.len(), 2 * segment.logical_len as usize);

    // The raw prefix re-encodes the header: magic, lengths, names.
    let bytes = hex::decode(&segment.raw).unwrap();
    assert_eq!(bytes[0], 0x83);
    assert_eq!(
        u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]),
        segment.logical_len
    );
    let mut expected_name = ebcdic("BASE");
    expected_name.resize(8, 0x40);
    assert_eq!(&bytes[9..17], expected_name.as_slice());
    assert_eq!(
        u16::from_be_bytes([bytes[17], bytes[18]]) as usize,
        "SYS1".len()
    );
    assert_eq!(bytes[19], 0);
    assert_eq!(&bytes[20..24], ebcdic("SYS1").as_slice());
}

#[test]
fn test_record_field_set_equals_schema() {
    let mut image = ImageBuilder::new();
    let _ = image.add_template(1, &group_template());
    // Only one of the three fields present on disk.
    let seg_rba = image.add_segment("SYS1", "BASE", &[(2, vec![0x01])]);
    let index_rba = image.add_index_block(&[(0, ebcdic("SYS1"), 1, vec![(1, seg_rba)])], 0);
    image.set_index_rba(index_rba);

    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();
    let record = &db.profiles[0].segments[0].record;
    let schema = db.schema.segment("GROUP", "BASE").unwrap();

    let record_names: Vec<&str> = record.fields().iter().map(|(n, _)| n.as_str()).collect();
    let schema_names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(record_names, schema_names);
}

#[test]
fn test_compressed_names_across_entries() {
    let mut image = ImageBuilder::new();
    let _ = image.add_template(1, &group_template());
    let seg_a = image.add_segment("GRO", "BASE", &[(2, vec![0x01])]);
    let seg_b = image.add_segment("GROOUP2", "BASE", &[(2, vec![0x02])]);
    let index_rba = image.add_index_block(
        &[
            (0, ebcdic("GRO"), 1, vec![(1, seg_a)]),
            (3, ebcdic("OUP2"), 1, vec![(1, seg_b)]),
        ],
        0,
    );
    image.set_index_rba(index_rba);

    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();
    assert_eq!(db.profiles.len(), 2);
    assert_eq!(db.profiles[0].name, "GRO");
    assert_eq!(db.profiles[1].name, "GROOUP2");
}

#[test]
fn test_split_template_directory_merges() {
    // Two directory entries share template number 2; the merged USER
    // template serves fields from both regions.
    let part1 = [
        template_field("USER", 1, 0, 0, 0),
        template_field("ENTYPE", 2, 0, 0, 1),
    ]
    .concat();
    let part2 = template_field("PWDCNT", 3, 0, 0, 1);

    let mut image = ImageBuilder::new();
    let _ = image.add_template(2, &part1);
    let _ = image.add_template(2, &part2);
    let seg_rba = image.add_segment("IBMUSER", "BASE", &[(2, vec![0x02]), (3, vec![0x05])]);
    let index_rba = image.add_index_block(&[(0, ebcdic("IBMUSER"), 2, vec![(1, seg_rba)])], 0);
    image.set_index_rba(index_rba);

    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();
    assert_eq!(db.templates[&2].fields().len(), 3);

    let record = &db.profiles[0].segments[0].record;
    assert_eq!(record.get("ENTYPE").unwrap().as_int(), Some(2));
    assert_eq!(record.get("PWDCNT").unwrap().as_int(), Some(5));
}

#[test]
fn test_unknown_field_id_does_not_kill_the_profile() {
    let mut image = ImageBuilder::new();
    let _ = image.add_template(1, &group_template());
    let seg_rba = image.add_segment("SYS1", "BASE", &[(99, vec![0xAA]), (2, vec![0x07])]);
    let index_rba = image.add_index_block(&[(0, ebcdic("SYS1"), 1, vec![(1, seg_rba)])], 0);
    image.set_index_rba(index_rba);

    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();
    let record = &db.profiles[0].segments[0].record;
    assert_eq!(record.get("ENTYPE").unwrap().as_int(), Some(7));
}

#[test]
fn test_bad_segment_is_skipped_profile_survives() {
    let mut image = ImageBuilder::new();
    let _ = image.add_template(1, &group_template());
    let good = image.add_segment("SYS1", "BASE", &[(2, vec![0x01])]);
    // The second pointer aims past the end of the image.
    let index_rba = image.add_index_block(
        &[(0, ebcdic("SYS1"), 1, vec![(1, good), (3, 0xFF_0000)])],
        0,
    );
    image.set_index_rba(index_rba);

    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();
    assert_eq!(db.profiles.len(), 1);
    assert_eq!(db.profiles[0].segments.len(), 1);
}

#[test]
fn test_empty_database_decodes_to_no_profiles() {
    // No index chain at all: ICISSRBA stays zero.
    let mut image = ImageBuilder::new();
    let _ = image.add_template(1, &group_template());
    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();
    assert!(db.profiles.is_empty());
    assert!(db.schema.segment("GROUP", "BASE").is_some());
}

#[test]
fn test_repeat_group_end_to_end() {
    let user_template = [
        template_field("USER", 1, 0, 0, 0),
        template_field("CLCNT", 2, 0x10, 0, 2),
        template_field("CLNAME", 3, 0x80, 0, 0),
    ]
    .concat();

    let mut head = vec![0x00, 0x02];
    for name in ["TSO", "DB2"] {
        head.push(1);
        head.push(3);
        head.extend_from_slice(&ebcdic(name));
    }

    let mut image = ImageBuilder::new();
    let _ = image.add_template(2, &user_template);
    let seg_rba = image.add_segment("IBMUSER", "BASE", &[(2, head)]);
    let index_rba = image.add_index_block(&[(0, ebcdic("IBMUSER"), 2, vec![(1, seg_rba)])], 0);
    image.set_index_rba(index_rba);

    let db = extract(&image.data, ClassifierMode::Catalog).unwrap();
    let record = &db.profiles[0].segments[0].record;
    assert_eq!(record.get("CLCNT").unwrap().as_int(), Some(2));
    match record.get("CLCNT_RG").unwrap() {
        FieldValue::Group(records) => {
            // The group holds exactly as many records as the head count.
            assert_eq!(records.len(), 2);
        }
        other => panic!("expected group, got {other:?}"),
    }
}
