//! Profile segment records.
//!
//! Each (profile, segment) pair the index catalogs points at one on-disk
//! record: a fixed header followed by a self-describing field stream.
//! Every field slot is `id, length, value` where the length prefix is a
//! single byte unless its high bit is set, in which case it is four
//! bytes whose low 31 bits hold the length.
//!
//! Repeat groups pack further records inside a head field's value: the
//! head integer is the group count, and beyond the head's own width lie
//! that many records, each a member count followed by length-prefixed
//! member values.
//!
//! Decoding is lenient at the field level: an unknown field id, a short
//! integer, or a malformed group record logs a warning and leaves the
//! rest of the segment intact.

use racfscan_codec::{
    decode_struct, read_uint, CodecError, Date, EbcdicStr, FieldSpec, Flag, HexBytes, Kind, Time,
};
use tracing::warn;

use crate::model::{FieldValue, GroupRecord, SegmentRecord};
use crate::schema::{FieldType, SegmentSchema};
use crate::template::Template;

/// Segment record identifier byte.
pub const SEGMENT_MAGIC: u8 = 0x83;

const HEADER_LAYOUT: &[FieldSpec] = &[
    // Record identifier (0x83)
    FieldSpec::new("Magic", Kind::U8, ""),
    // Physical record length
    FieldSpec::new("PhysicLen", Kind::U32, ""),
    // Logical record length: the populated prefix
    FieldSpec::new("LogicLen", Kind::U32, ""),
    FieldSpec::new("SegmentName", Kind::Ebcdic, "size=8"),
    FieldSpec::new("ProfileNameLen", Kind::U16, ""),
    FieldSpec::new("", Kind::Skip, "size=1"),
    FieldSpec::new("ProfileName", Kind::Ebcdic, "size=ProfileNameLen"),
];

/// Decoded segment header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Record identifier byte.
    pub magic: u8,
    /// Physical record length.
    pub physical_len: u32,
    /// Logical record length.
    pub logical_len: u32,
    /// Segment name, blank padded.
    pub segment_name: EbcdicStr,
    /// Profile name.
    pub profile_name: EbcdicStr,
    /// Header size in bytes (the field stream starts here).
    pub header_len: usize,
}

impl SegmentHeader {
    /// Decode the header from the front of a segment record.
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, CodecError> {
        let (record, header_len) = decode_struct(data, HEADER_LAYOUT)?;
        Ok(Self {
            magic: record.int("Magic")? as u8,
            physical_len: record.int("PhysicLen")? as u32,
            logical_len: record.int("LogicLen")? as u32,
            segment_name: record.ebcdic("SegmentName")?.clone(),
            profile_name: record.ebcdic("ProfileName")?.clone(),
            header_len,
        })
    }
}

/// Read a 1-or-4-byte length prefix. Returns (length, prefix size).
fn read_length_prefix(data: &[u8]) -> std::result::Result<(usize, usize), CodecError> {
    match data.first() {
        None => Err(CodecError::InsufficientData {
            expected: 1,
            actual: 0,
        }),
        Some(b) if b & 0x80 == 0 => Ok((*b as usize, 1)),
        Some(_) => {
            let word = read_uint(data, 4)? as u32;
            Ok(((word & 0x7FFF_FFFF) as usize, 4))
        }
    }
}

/// One field slot from the segment stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    /// Field reference number (keys into the template).
    pub id: u8,
    /// Value bytes, exactly the declared length.
    pub value: Vec<u8>,
}

/// A parsed segment: header plus raw field slots.
#[derive(Debug, Clone)]
pub struct RawSegment {
    /// The fixed header.
    pub header: SegmentHeader,
    /// Field slots in stream order.
    pub slots: Vec<FieldSlot>,
}

impl RawSegment {
    /// Parse the header and walk the field stream up to the logical
    /// length.
    pub fn parse(data: &[u8]) -> std::result::Result<Self, CodecError> {
        let header = SegmentHeader::from_bytes(data)?;
        let logical_len = header.logical_len as usize;
        if data.len() < logical_len {
            return Err(CodecError::InsufficientData {
                expected: logical_len,
                actual: data.len(),
            });
        }

        let mut slots = Vec::new();
        let mut pos = header.header_len;
        while pos < logical_len {
            let id = data[pos];
            let (len, prefix) = read_length_prefix(&data[pos + 1..])?;
            let start = pos + 1 + prefix;
            let end = start + len;
            if end > data.len() {
                return Err(CodecError::InsufficientData {
                    expected: end,
                    actual: data.len(),
                });
            }
            slots.push(FieldSlot {
                id,
                value: data[start..end].to_vec(),
            });
            pos = end;
        }

        Ok(Self { header, slots })
    }
}

/// Convert a slot value to a typed field value.
///
/// Integers read big-endian at the schema width and zero-fill when the
/// slot is short; byte-backed kinds copy the slot bytes as-is.
fn convert_value(data: &[u8], ty: &FieldType) -> (FieldValue, bool) {
    match ty {
        FieldType::Int(width) => {
            let n = width.bytes();
            match read_uint(data, n) {
                Ok(value) => (
                    FieldValue::Int {
                        value,
                        width: *width,
                    },
                    false,
                ),
                Err(_) => (
                    FieldValue::Int {
                        value: 0,
                        width: *width,
                    },
                    true,
                ),
            }
        }
        FieldType::Ebcdic => (FieldValue::Ebcdic(EbcdicStr::new(data.to_vec())), false),
        FieldType::Hex => (FieldValue::Hex(HexBytes::new(data.to_vec())), false),
        FieldType::Date => (FieldValue::Date(Date::new(data.to_vec())), false),
        FieldType::Time => (FieldValue::Time(Time::from_slice(data)), false),
        FieldType::Flag => (FieldValue::Flag(Flag::new(data.to_vec())), false),
        FieldType::Bytes => (FieldValue::Bytes(data.to_vec()), false),
        FieldType::Group(_) => (FieldValue::Group(Vec::new()), false),
    }
}

/// One repeat-group record: a member count then that many
/// length-prefixed values. Returns the values and the bytes consumed.
fn parse_group_record(data: &[u8]) -> std::result::Result<(Vec<Vec<u8>>, usize), CodecError> {
    let count = *data.first().ok_or(CodecError::InsufficientData {
        expected: 1,
        actual: 0,
    })? as usize;
    let mut values = Vec::with_capacity(count);
    let mut pos = 1usize;
    for _ in 0..count {
        let rest = data.get(pos..).unwrap_or(&[]);
        let (len, prefix) = read_length_prefix(rest)?;
        let start = pos + prefix;
        let end = start + len;
        if end > data.len() {
            return Err(CodecError::InsufficientData {
                expected: end,
                actual: data.len(),
            });
        }
        values.push(data[start..end].to_vec());
        pos = end;
    }
    Ok((values, pos))
}

/// Expand a repeat-group head slot into member records.
///
/// The head's integer value is the record count; the packed records
/// start right after the head's width inside the same slot value.
fn expand_repeat_group(
    slot: &FieldSlot,
    head_width: usize,
    count: u64,
    members: &[crate::schema::SchemaField],
    profile: &str,
    segment: &str,
    group_name: &str,
) -> Vec<GroupRecord> {
    let mut records = Vec::with_capacity(count as usize);
    let mut pos = head_width;
    for i in 0..count {
        let rest = slot.value.get(pos..).unwrap_or(&[]);
        let (values, consumed) = match parse_group_record(rest) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(
                    "profile {profile} segment {segment}: repeat group {group_name} record {i}: {err}"
                );
                break;
            }
        };
        pos += consumed;

        if values.len() != members.len() {
            warn!(
                "profile {profile} segment {segment}: repeat group {group_name} record {i} has \
                 {} values for {} members",
                values.len(),
                members.len()
            );
        }
        let mut fields = Vec::with_capacity(members.len());
        for (j, member) in members.iter().enumerate() {
            let value = match values.get(j) {
                Some(bytes) => {
                    let (value, short) = convert_value(bytes, &member.ty);
                    if short {
                        warn!(
                            "profile {profile} segment {segment}: zero value for {} in repeat \
                             group {group_name} record {i}",
                            member.name
                        );
                    }
                    value
                }
                None => FieldValue::default_for(&member.ty),
            };
            fields.push((member.name.clone(), value));
        }
        records.push(GroupRecord { fields });
    }
    records
}

/// Decode a parsed segment into its schema-shaped record.
///
/// Field-level problems (unknown id, short value, malformed group) warn
/// and continue; the record always carries the full schema field set.
pub fn decode_segment(
    raw: &RawSegment,
    template: &Template,
    schema: &SegmentSchema,
) -> SegmentRecord {
    let segment_name = raw.header.segment_name.trimmed();
    let profile_name = raw.header.profile_name.to_text();
    let mut record = SegmentRecord::from_schema(schema);

    for slot in &raw.slots {
        let Some(descriptor) = template.field_by_id(slot.id, &segment_name) else {
            warn!(
                "profile {profile_name} segment {segment_name}: field id {} not in the template, \
                 skipping",
                slot.id
            );
            continue;
        };
        let field_name = descriptor.trimmed_name();
        let Some(schema_field) = schema.get(&field_name) else {
            warn!(
                "profile {profile_name} segment {segment_name}: field {field_name} not in the \
                 segment record, skipping"
            );
            continue;
        };

        let (value, short) = convert_value(&slot.value, &schema_field.ty);
        if short {
            warn!(
                "profile {profile_name} segment {segment_name}: zero value set for {field_name} \
                 ({} bytes for {:?})",
                slot.value.len(),
                schema_field.ty
            );
        }
        let head_count = value.as_int();
        record.set(&field_name, value);

        if descriptor.is_repeat_group_head() {
            let group_name = format!("{field_name}_RG");
            let Some(group_field) = schema.get(&group_name) else {
                warn!(
                    "profile {profile_name} segment {segment_name}: no {group_name} in the \
                     segment record, skipping"
                );
                continue;
            };
            let FieldType::Group(members) = &group_field.ty else {
                warn!(
                    "profile {profile_name} segment {segment_name}: {group_name} is not a repeat \
                     group"
                );
                continue;
            };
            let head_width = match &schema_field.ty {
                FieldType::Int(width) => width.bytes(),
                _ => {
                    warn!(
                        "profile {profile_name} segment {segment_name}: repeat group head \
                         {field_name} is not an integer"
                    );
                    continue;
                }
            };
            let count = head_count.unwrap_or(0);
            let records = expand_repeat_group(
                slot,
                head_width,
                count,
                members,
                &profile_name,
                &segment_name,
                &group_name,
            );
            record.set(&group_name, FieldValue::Group(records));
        }
    }

    record
}
