//! Field-definition templates.
//!
//! Each profile class (GROUP, USER, CONNECT, DATASET, GENERAL) carries a
//! template: an ordered run of 17-byte field descriptors embedded in the
//! database. The descriptor stream doubles as the segment table — a
//! descriptor with id 1 and every other non-name byte zero introduces a
//! new segment, and the first segment is implicitly BASE.
//!
//! Template regions listed in the ICB directory under the same template
//! number are concatenated into one logical template before use.

use racfscan_codec::{decode_struct, EbcdicStr, FieldSpec, Kind, Rba};

use crate::error::DbError;
use crate::Result;

/// On-disk size of one field descriptor.
pub const TEMPLATE_FIELD_SIZE: usize = 17;

const FIELD_LAYOUT: &[FieldSpec] = &[
    // Field name, blank padded
    FieldSpec::new("Name", Kind::Ebcdic, "size=8"),
    // Reference number of the field
    FieldSpec::new("ID", Kind::U8, ""),
    FieldSpec::new("Flag1", Kind::U8, ""),
    FieldSpec::new("Flag2", Kind::U8, ""),
    FieldSpec::new("", Kind::Skip, "size=1"),
    // Field length; 0 means variable
    FieldSpec::new("Len", Kind::U32, ""),
    FieldSpec::new("DefaultValue", Kind::U8, ""),
];

/// One 17-byte template field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateField {
    /// Field name (blank padded to 8 EBCDIC bytes on disk).
    pub name: EbcdicStr,
    /// Reference number; profile segment streams key fields by this id.
    pub id: u8,
    /// First flag byte.
    pub flag1: u8,
    /// Second flag byte.
    pub flag2: u8,
    /// Declared field length; 0 for variable-length fields.
    pub len: u32,
    /// Field default byte.
    pub default_value: u8,
}

impl TemplateField {
    /// Decode one descriptor from the front of `data`.
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, racfscan_codec::CodecError> {
        let (record, _) = decode_struct(data, FIELD_LAYOUT)?;
        Ok(Self {
            name: record.ebcdic("Name")?.clone(),
            id: record.int("ID")? as u8,
            flag1: record.int("Flag1")? as u8,
            flag2: record.int("Flag2")? as u8,
            len: record.int("Len")? as u32,
            default_value: record.int("DefaultValue")? as u8,
        })
    }

    /// Field name with the blank padding removed.
    pub fn trimmed_name(&self) -> String {
        self.name.trimmed()
    }

    /// True for a segment delimiter: id 1 with every other non-name
    /// field zero. The delimiter's name is the segment name (or the
    /// class name for the first descriptor of a template).
    pub fn is_segment_delimiter(&self) -> bool {
        self.id == 1
            && self.flag1 == 0
            && self.flag2 == 0
            && self.len == 0
            && self.default_value == 0
    }

    /// True for a repeat-group head field.
    pub fn is_repeat_group_head(&self) -> bool {
        self.flag1 & 0x10 != 0
    }

    /// True for a member of the current repeat group.
    pub fn is_repeat_group_member(&self) -> bool {
        self.flag1 & 0x80 != 0
    }

    /// True for a combination field; these are skipped entirely.
    pub fn is_combination(&self) -> bool {
        self.flag1 & 0x40 != 0
    }

    /// True when the field value is encrypted (e.g. PASSWORD).
    pub fn is_encrypted(&self) -> bool {
        self.flag1 & 0x04 != 0
    }

    /// True when the field is a flag byte.
    pub fn is_flag_byte(&self) -> bool {
        self.flag1 & 0x20 != 0
    }

    /// True when the field is a 3-byte date.
    pub fn is_three_byte_date(&self) -> bool {
        self.flag2 & 0x20 != 0
    }
}

/// An ordered run of field descriptors for one profile class.
#[derive(Debug, Clone, Default)]
pub struct Template {
    fields: Vec<TemplateField>,
}

impl Template {
    /// Parse one directory region into descriptors. The region must be a
    /// whole number of 17-byte descriptors.
    pub fn parse(data: &[u8], number: u8, rba: Rba) -> Result<Self> {
        if data.len() % TEMPLATE_FIELD_SIZE != 0 {
            return Err(DbError::TruncatedTemplate {
                number,
                rba,
                len: data.len() as u32,
            });
        }
        let mut fields = Vec::with_capacity(data.len() / TEMPLATE_FIELD_SIZE);
        for chunk in data.chunks_exact(TEMPLATE_FIELD_SIZE) {
            fields.push(TemplateField::from_bytes(chunk)?);
        }
        Ok(Self { fields })
    }

    /// All descriptors in template order.
    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    /// The class name: the first descriptor's trimmed name.
    pub fn class_name(&self) -> String {
        self.fields
            .first()
            .map(TemplateField::trimmed_name)
            .unwrap_or_default()
    }

    /// Append another directory region's descriptors. Regions sharing a
    /// template number form one logical template.
    pub fn append(&mut self, other: Template) {
        self.fields.extend(other.fields);
    }

    /// Find a field by reference number within the named segment.
    ///
    /// Walks descriptors with a segment cursor; BASE is the implicit
    /// first segment. The scan is bounded: once inside the requested
    /// segment, the next delimiter ends it.
    pub fn field_by_id(&self, id: u8, segment: &str) -> Option<&TemplateField> {
        let mut in_segment = segment == "BASE";
        for (i, field) in self.fields.iter().enumerate() {
            let is_delimiter = field.is_segment_delimiter();
            // The first descriptor names the class and opens BASE; it is
            // a delimiter but never closes the segment being scanned.
            if in_segment && is_delimiter && i > 0 {
                return None;
            }
            if !in_segment {
                if is_delimiter && field.trimmed_name() == segment {
                    in_segment = true;
                }
                continue;
            }
            if is_delimiter {
                continue;
            }
            if field.id == id {
                return Some(field);
            }
        }
        None
    }
}
