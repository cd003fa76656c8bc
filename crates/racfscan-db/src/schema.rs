//! Semantic classification and per-segment record shapes.
//!
//! Templates declare field layout but not data type, so each descriptor
//! is classified: first through the static per-class catalog (when
//! enabled), then through a flag-byte heuristic for names the catalog
//! does not know. The classified descriptors are folded into one record
//! shape per (class, segment), with repeat-group members collected into
//! a child record type named `<head>_RG`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{self, CatalogType};
use crate::template::{Template, TemplateField};

/// Decoded width of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntWidth {
    /// One byte.
    W8,
    /// Two bytes.
    W16,
    /// Four bytes.
    W32,
    /// Eight bytes.
    W64,
}

impl IntWidth {
    /// Width in bytes.
    pub fn bytes(&self) -> usize {
        match self {
            IntWidth::W8 => 1,
            IntWidth::W16 => 2,
            IntWidth::W32 => 4,
            IntWidth::W64 => 8,
        }
    }

    /// Width for a declared field length; lengths outside {1, 2, 4}
    /// fall back to eight bytes.
    pub fn for_len(len: u32) -> Self {
        match len {
            1 => IntWidth::W8,
            2 => IntWidth::W16,
            4 => IntWidth::W32,
            _ => IntWidth::W64,
        }
    }
}

/// Semantic type of a schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldType {
    /// Unsigned big-endian integer.
    Int(IntWidth),
    /// EBCDIC text.
    Ebcdic,
    /// Hex-rendered bytes (encrypted or undocumented binary).
    Hex,
    /// Packed BCD date.
    Date,
    /// Packed 4-byte time.
    Time,
    /// Flag byte(s).
    Flag,
    /// Unclassified raw bytes.
    Bytes,
    /// Repeat group: a sequence of child records with these members.
    Group(Vec<SchemaField>),
}

/// One named, typed field of a segment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    /// Field name from the template descriptor.
    pub name: String,
    /// Classified semantic type.
    pub ty: FieldType,
}

/// The record shape of one (class, segment) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentSchema {
    /// Fields in template order.
    pub fields: Vec<SchemaField>,
}

impl SegmentSchema {
    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// How descriptors are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    /// Consult the static per-class catalog first (default).
    Catalog,
    /// Flag-byte heuristic only.
    Heuristic,
}

/// The full dynamic schema: class → segment → record shape.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    classes: BTreeMap<String, BTreeMap<String, SegmentSchema>>,
}

impl Schema {
    /// Register one class's segment schemas.
    pub fn insert_class(&mut self, class: String, segments: BTreeMap<String, SegmentSchema>) {
        self.classes.insert(class, segments);
    }

    /// The record shape for a (class, segment) pair.
    pub fn segment(&self, class: &str, segment: &str) -> Option<&SegmentSchema> {
        self.classes.get(class)?.get(segment)
    }

    /// All segment schemas of a class.
    pub fn class(&self, class: &str) -> Option<&BTreeMap<String, SegmentSchema>> {
        self.classes.get(class)
    }

    /// Iterate (class, segment, schema) triples in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &SegmentSchema)> {
        self.classes.iter().flat_map(|(class, segments)| {
            segments
                .iter()
                .map(move |(segment, schema)| (class.as_str(), segment.as_str(), schema))
        })
    }
}

/// Classify one descriptor.
pub fn classify(class: &str, field: &TemplateField, mode: ClassifierMode) -> FieldType {
    if mode == ClassifierMode::Catalog {
        if let Some(ty) = catalog::lookup(class, &field.trimmed_name()) {
            return match ty {
                CatalogType::Int => FieldType::Int(IntWidth::for_len(field.len)),
                CatalogType::Char => {
                    if field.is_encrypted() {
                        FieldType::Hex
                    } else {
                        FieldType::Ebcdic
                    }
                }
                CatalogType::Date => FieldType::Date,
                CatalogType::Time => FieldType::Time,
                CatalogType::Bin => {
                    if field.is_flag_byte() {
                        FieldType::Flag
                    } else {
                        FieldType::Hex
                    }
                }
                CatalogType::Flag => FieldType::Flag,
            };
        }
    }
    classify_heuristic(field)
}

/// Flag-byte heuristic for names the catalog does not cover. Time fields
/// cannot be recognized this way; they surface as 4-byte integers.
fn classify_heuristic(field: &TemplateField) -> FieldType {
    if field.is_encrypted() {
        FieldType::Hex
    } else if field.is_three_byte_date() {
        FieldType::Date
    } else if field.is_flag_byte() {
        FieldType::Flag
    } else if matches!(field.len, 1 | 2 | 4) {
        FieldType::Int(IntWidth::for_len(field.len))
    } else if field.len >= 8 || field.len == 0 {
        FieldType::Ebcdic
    } else {
        FieldType::Bytes
    }
}

/// Fold a class template into one record shape per segment.
///
/// Walk the descriptors with a segment cursor and a pending repeat
/// group. A group closes on the first non-member descriptor, on a
/// segment delimiter, and at template end; the closing also flushes the
/// final segment, so trailing fields are never lost.
pub fn build_segment_schemas(
    template: &Template,
    mode: ClassifierMode,
) -> BTreeMap<String, SegmentSchema> {
    let class = template.class_name();
    let mut segments = BTreeMap::new();

    let mut segment_name = "BASE".to_string();
    let mut fields: Vec<SchemaField> = Vec::new();
    let mut group: Option<(String, Vec<SchemaField>)> = None;

    for (i, field) in template.fields().iter().enumerate() {
        if field.is_combination() {
            continue;
        }

        if field.is_segment_delimiter() {
            if let Some((name, members)) = group.take() {
                fields.push(SchemaField {
                    name,
                    ty: FieldType::Group(members),
                });
            }
            if !fields.is_empty() {
                segments.insert(
                    std::mem::take(&mut segment_name),
                    SegmentSchema {
                        fields: std::mem::take(&mut fields),
                    },
                );
            }
            segment_name = if i == 0 {
                "BASE".to_string()
            } else {
                field.trimmed_name()
            };
            continue;
        }

        if let Some((_, members)) = group.as_mut() {
            if field.is_repeat_group_member() {
                members.push(SchemaField {
                    name: field.trimmed_name(),
                    ty: classify(&class, field, mode),
                });
                continue;
            }
            let (name, members) = group.take().unwrap();
            fields.push(SchemaField {
                name,
                ty: FieldType::Group(members),
            });
        }

        if field.is_repeat_group_head() {
            group = Some((format!("{}_RG", field.trimmed_name()), Vec::new()));
        }

        if !field.trimmed_name().is_empty() {
            fields.push(SchemaField {
                name: field.trimmed_name(),
                ty: classify(&class, field, mode),
            });
        }
    }

    if let Some((name, members)) = group.take() {
        fields.push(SchemaField {
            name,
            ty: FieldType::Group(members),
        });
    }
    if !fields.is_empty() {
        segments.insert(segment_name, SegmentSchema { fields });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TEMPLATE_FIELD_SIZE;
    use racfscan_codec::Rba;

    fn raw_field(name: &str, id: u8, flag1: u8, flag2: u8, len: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(TEMPLATE_FIELD_SIZE);
        let mut ebcdic_name = [0x40u8; 8];
        for (dst, ch) in ebcdic_name.iter_mut().zip(name.bytes()) {
            *dst = match ch {
                b'A'..=b'I' => 0xC1 + (ch - b'A'),
                b'J'..=b'R' => 0xD1 + (ch - b'J'),
                b'S'..=b'Z' => 0xE2 + (ch - b'S'),
                b'0'..=b'9' => 0xF0 + (ch - b'0'),
                _ => 0x40,
            };
        }
        buf.extend_from_slice(&ebcdic_name);
        buf.push(id);
        buf.push(flag1);
        buf.push(flag2);
        buf.push(0);
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(0);
        buf
    }

    fn parse(descriptors: &[Vec<u8>]) -> Template {
        let data: Vec<u8> = descriptors.concat();
        Template::parse(&data, 1, Rba::new(0)).unwrap()
    }

    #[test]
    fn test_catalog_classification() {
        let t = parse(&[
            raw_field("GROUP", 1, 0, 0, 0),
            raw_field("ENTYPE", 2, 0, 0, 1),
            raw_field("SUPGROUP", 3, 0, 0, 0),
            raw_field("AUTHDATE", 4, 0, 0x20, 3),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Catalog);
        let base = &segments["BASE"];
        assert_eq!(base.get("ENTYPE").unwrap().ty, FieldType::Int(IntWidth::W8));
        assert_eq!(base.get("SUPGROUP").unwrap().ty, FieldType::Ebcdic);
        assert_eq!(base.get("AUTHDATE").unwrap().ty, FieldType::Date);
    }

    #[test]
    fn test_encrypted_field_is_hex_even_when_catalogued() {
        let t = parse(&[
            raw_field("USER", 1, 0, 0, 0),
            raw_field("PASSWORD", 2, 0x04, 0, 8),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Catalog);
        assert_eq!(segments["BASE"].get("PASSWORD").unwrap().ty, FieldType::Hex);
    }

    #[test]
    fn test_heuristic_fallback_for_unknown_name() {
        let t = parse(&[
            raw_field("GROUP", 1, 0, 0, 0),
            raw_field("MYSTERY1", 2, 0, 0, 4),
            raw_field("MYSTERY2", 3, 0, 0x20, 3),
            raw_field("MYSTERY3", 4, 0x20, 0, 1),
            raw_field("MYSTERY4", 5, 0, 0, 12),
            raw_field("MYSTERY5", 6, 0, 0, 5),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Catalog);
        let base = &segments["BASE"];
        assert_eq!(base.get("MYSTERY1").unwrap().ty, FieldType::Int(IntWidth::W32));
        assert_eq!(base.get("MYSTERY2").unwrap().ty, FieldType::Date);
        assert_eq!(base.get("MYSTERY3").unwrap().ty, FieldType::Flag);
        assert_eq!(base.get("MYSTERY4").unwrap().ty, FieldType::Ebcdic);
        assert_eq!(base.get("MYSTERY5").unwrap().ty, FieldType::Bytes);
    }

    #[test]
    fn test_heuristic_mode_ignores_catalog() {
        // AUTHDATE is a catalogued date, but without the date flag the
        // heuristic sees a 3-byte field and calls it raw bytes.
        let t = parse(&[
            raw_field("GROUP", 1, 0, 0, 0),
            raw_field("AUTHDATE", 2, 0, 0, 3),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Heuristic);
        assert_eq!(segments["BASE"].get("AUTHDATE").unwrap().ty, FieldType::Bytes);
    }

    #[test]
    fn test_segment_split_and_delimiter_name_exclusion() {
        let t = parse(&[
            raw_field("GROUP", 1, 0, 0, 0),
            raw_field("ENTYPE", 2, 0, 0, 1),
            raw_field("OMVS", 1, 0, 0, 0),
            raw_field("GID", 2, 0, 0, 4),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Catalog);
        assert_eq!(segments.len(), 2);
        // The delimiter's own name never becomes a field.
        assert!(segments["BASE"].get("GROUP").is_none());
        assert!(segments["OMVS"].get("OMVS").is_none());
        assert!(segments["OMVS"].get("GID").is_some());
    }

    #[test]
    fn test_repeat_group_assembly() {
        let t = parse(&[
            raw_field("USER", 1, 0, 0, 0),
            raw_field("CLCNT", 2, 0x10, 0, 2),
            raw_field("CLNAME", 3, 0x80, 0, 0),
            raw_field("SECLABEL", 4, 0, 0, 8),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Catalog);
        let base = &segments["BASE"];
        let names: Vec<&str> = base.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["CLCNT", "CLCNT_RG", "SECLABEL"]);
        match &base.get("CLCNT_RG").unwrap().ty {
            FieldType::Group(members) => {
                assert_eq!(members.len(), 1);
                assert_eq!(members[0].name, "CLNAME");
                assert_eq!(members[0].ty, FieldType::Ebcdic);
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_repeat_group_closed_by_segment_end() {
        let t = parse(&[
            raw_field("USER", 1, 0, 0, 0),
            raw_field("CLCNT", 2, 0x10, 0, 2),
            raw_field("CLNAME", 3, 0x80, 0, 0),
            raw_field("TSO", 1, 0, 0, 0),
            raw_field("TACCNT", 2, 0, 0, 0),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Catalog);
        assert!(segments["BASE"].get("CLCNT_RG").is_some());
        assert!(segments["TSO"].get("CLCNT_RG").is_none());
        assert!(segments["TSO"].get("TACCNT").is_some());
    }

    #[test]
    fn test_final_segment_is_flushed() {
        let t = parse(&[
            raw_field("USER", 1, 0, 0, 0),
            raw_field("ENTYPE", 2, 0, 0, 1),
            raw_field("OMVS", 1, 0, 0, 0),
            raw_field("UID", 2, 0, 0, 4),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Catalog);
        assert!(segments.contains_key("OMVS"));
    }

    #[test]
    fn test_combination_fields_skipped() {
        let t = parse(&[
            raw_field("GROUP", 1, 0, 0, 0),
            raw_field("ENTYPE", 2, 0, 0, 1),
            raw_field("COMBO", 3, 0x40, 0, 0),
        ]);
        let segments = build_segment_schemas(&t, ClassifierMode::Catalog);
        assert!(segments["BASE"].get("COMBO").is_none());
        assert_eq!(segments["BASE"].fields.len(), 1);
    }

    #[test]
    fn test_merged_directory_entries_reparse_identically() {
        // Two directory regions with the same template number produce
        // the same schema as one region of combined length.
        let part1 = [
            raw_field("USER", 1, 0, 0, 0),
            raw_field("ENTYPE", 2, 0, 0, 1),
        ]
        .concat();
        let part2 = [
            raw_field("PWDCNT", 3, 0, 0, 1),
            raw_field("TSO", 1, 0, 0, 0),
            raw_field("TACCNT", 2, 0, 0, 0),
        ]
        .concat();

        let mut merged = Template::parse(&part1, 2, Rba::new(0x1000)).unwrap();
        merged.append(Template::parse(&part2, 2, Rba::new(0x7000)).unwrap());

        let combined: Vec<u8> = [part1, part2].concat();
        let single = Template::parse(&combined, 2, Rba::new(0x1000)).unwrap();

        assert_eq!(
            build_segment_schemas(&merged, ClassifierMode::Catalog),
            build_segment_schemas(&single, ClassifierMode::Catalog)
        );
    }
}
