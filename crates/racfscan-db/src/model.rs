//! The in-memory result model: decoded profiles and their segment
//! records, plus the two text renderings the output sinks use.
//!
//! Segment records are dynamic: an ordered list of (name, value) pairs
//! whose shape is the [`crate::schema::SegmentSchema`] for the owning
//! (class, segment) pair. Every schema field is present in the record —
//! fields missing from the on-disk stream keep their default value — so
//! a record's field set always equals its schema's.

use serde::Serialize;

use racfscan_codec::{Date, EbcdicStr, Flag, HexBytes, Rba, Time};

use crate::schema::{FieldType, IntWidth, SchemaField, SegmentSchema};

/// A decoded field value; the schema carries the parallel discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldValue {
    /// Unsigned integer with its decoded width.
    Int {
        /// The value.
        value: u64,
        /// Decoded width, for the packed-time display heuristic.
        width: IntWidth,
    },
    /// EBCDIC text.
    Ebcdic(EbcdicStr),
    /// Hex-rendered bytes.
    Hex(HexBytes),
    /// Packed BCD date.
    Date(Date),
    /// Packed 4-byte time.
    Time(Time),
    /// Flag byte(s).
    Flag(Flag),
    /// Unclassified raw bytes.
    Bytes(Vec<u8>),
    /// Repeat-group member records.
    Group(Vec<GroupRecord>),
}

impl FieldValue {
    /// Default value for a schema field type.
    pub fn default_for(ty: &FieldType) -> Self {
        match ty {
            FieldType::Int(width) => FieldValue::Int {
                value: 0,
                width: *width,
            },
            FieldType::Ebcdic => FieldValue::Ebcdic(EbcdicStr::default()),
            FieldType::Hex => FieldValue::Hex(HexBytes::default()),
            FieldType::Date => FieldValue::Date(Date::default()),
            FieldType::Time => FieldValue::Time(Time::default()),
            FieldType::Flag => FieldValue::Flag(Flag::default()),
            FieldType::Bytes => FieldValue::Bytes(Vec::new()),
            FieldType::Group(_) => FieldValue::Group(Vec::new()),
        }
    }

    /// The integer value, if this is an integer field.
    pub fn as_int(&self) -> Option<u64> {
        match self {
            FieldValue::Int { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// One record of a repeat group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    /// Member values in schema order.
    pub fields: Vec<(String, FieldValue)>,
}

impl GroupRecord {
    /// Member value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// A decoded segment record, shaped by its schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentRecord {
    fields: Vec<(String, FieldValue)>,
}

impl SegmentRecord {
    /// Build a record with every schema field at its default value.
    pub fn from_schema(schema: &SegmentSchema) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|SchemaField { name, ty }| (name.clone(), FieldValue::default_for(ty)))
            .collect();
        Self { fields }
    }

    /// All fields in schema order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Replace a field's value. Returns false when the record has no
    /// such field.
    pub fn set(&mut self, name: &str, value: FieldValue) -> bool {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// A profile class reference: name plus on-disk id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRef {
    /// Class name from the template (GROUP, USER, ...).
    pub name: String,
    /// Class id from the index entry.
    pub id: u8,
}

/// One decoded profile segment.
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    /// Segment name from the on-disk header, trimmed.
    pub name: String,
    /// Segment id from the index entry.
    pub id: u8,
    /// On-disk address of the segment.
    pub rba: Rba,
    /// Physical record length.
    pub physical_len: u32,
    /// Logical record length (the populated prefix).
    pub logical_len: u32,
    /// Hex encoding of the logical-length prefix of the on-disk bytes.
    pub raw: String,
    /// The decoded record.
    pub record: SegmentRecord,
}

/// One decoded profile.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    /// Profile name (decompressed index entry name).
    pub name: String,
    /// Owning class.
    pub class: ClassRef,
    /// Decoded segments in index-entry order.
    pub segments: Vec<Segment>,
}

// ---------------------------------------------------------------------------
//  Text renderings
// ---------------------------------------------------------------------------

fn bcd_pair(b: u8) -> Option<u32> {
    let hi = (b >> 4) as u32;
    let lo = (b & 0xF) as u32;
    if hi > 9 || lo > 9 {
        return None;
    }
    Some(hi * 10 + lo)
}

/// Best-effort display of a 32-bit value as a packed time (hhmmssms).
///
/// Only a display guess for catalogue-less counters; the canonical time
/// type is the fixed 4-byte [`Time`]. The trailing pair repeats the
/// seconds byte.
pub(crate) fn packed_time_text(v: u32) -> Option<String> {
    if v < 0xFF {
        return None;
    }
    let hh = bcd_pair((v >> 24) as u8).filter(|&n| n <= 24)?;
    let mm = bcd_pair((v >> 16) as u8).filter(|&n| n <= 60)?;
    let ss = bcd_pair((v >> 8) as u8).filter(|&n| n <= 60)?;
    let ms = ss;
    Some(format!("{hh}:{mm:02}:{ss:02} ({ms:02} ms)"))
}

/// Plain rendering of a value (the tabular-export form).
///
/// Group values render empty; the sinks expand them member by member.
pub fn render_plain(value: &FieldValue) -> String {
    match value {
        FieldValue::Int { value, width } => {
            if *width == IntWidth::W32 {
                if let Some(text) = packed_time_text(*value as u32) {
                    return text;
                }
            }
            value.to_string()
        }
        FieldValue::Ebcdic(s) => {
            if s.is_printable() {
                s.to_text()
            } else {
                s.hex()
            }
        }
        FieldValue::Hex(h) => h.to_string(),
        FieldValue::Date(d) => d.to_string(),
        FieldValue::Time(t) => t.to_string(),
        FieldValue::Flag(f) => f.to_string(),
        FieldValue::Bytes(b) => hex::encode(b),
        FieldValue::Group(_) => String::new(),
    }
}

/// Rendering with the raw hex in parentheses (the plain-text dump form).
///
/// Non-printable EBCDIC renders as hex only.
pub fn render_with_hex(value: &FieldValue) -> String {
    match value {
        FieldValue::Int { value, .. } => format!("{value} ({value:x})"),
        FieldValue::Ebcdic(s) => {
            if s.is_printable() {
                format!("{} ({})", s.to_text(), s.hex())
            } else {
                s.hex()
            }
        }
        FieldValue::Hex(h) => h.to_string(),
        FieldValue::Date(d) => format!("{} ({})", d, d.hex()),
        FieldValue::Time(t) => format!("{} ({})", t, t.hex()),
        FieldValue::Flag(f) => format!("{} ({})", f, f.hex()),
        FieldValue::Bytes(b) => hex::encode(b),
        FieldValue::Group(_) => String::new(),
    }
}
