//! Plain-text dump sink.
//!
//! One profile per record: a profile line, then per segment a header
//! line, an offset/size line, the raw hex line, and one line per
//! decoded field. Repeat-group members render as a nested indexed
//! block. Values print as text with the raw hex in parentheses;
//! non-printable EBCDIC prints hex only.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use racfscan_db::model::render_with_hex;
use racfscan_db::{FieldValue, Profile};

/// Render one profile in the dump format.
pub fn format_profile(profile: &Profile) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Profile: {} ({}; {})",
        profile.name, profile.class.name, profile.class.id
    );
    for (i, segment) in profile.segments.iter().enumerate() {
        let _ = writeln!(out, "\t[{}] Segment: {} ({})", i + 1, segment.name, segment.id);
        let _ = writeln!(
            out,
            "\t\tOffset: {} ; Physical Size: {} (0x{:x}) ; Logical Size: {} (0x{:x})",
            segment.rba,
            segment.physical_len,
            segment.physical_len,
            segment.logical_len,
            segment.logical_len
        );
        let _ = writeln!(out, "\t\tRaw: {}", segment.raw);

        for (name, value) in segment.record.fields() {
            match value {
                FieldValue::Group(records) if records.is_empty() => {
                    let _ = writeln!(out, "\t\t{name}: (empty)");
                }
                FieldValue::Group(records) => {
                    let _ = writeln!(out, "\t\t{name}:");
                    for (j, record) in records.iter().enumerate() {
                        for (k, (member, member_value)) in record.fields.iter().enumerate() {
                            let prefix = if k == 0 {
                                format!("\t\t\t[{j}]: ")
                            } else {
                                "\t\t\t\t".to_string()
                            };
                            let _ = writeln!(
                                out,
                                "{prefix}{member}: {}",
                                render_with_hex(member_value)
                            );
                        }
                    }
                }
                other => {
                    let _ = writeln!(out, "\t\t{name}: {}", render_with_hex(other));
                }
            }
        }
    }
    out
}

/// Write every profile to `path`.
pub fn write_dump(profiles: &[Profile], path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for profile in profiles {
        tracing::debug!("dumping profile {} ({})", profile.name, profile.class.name);
        writeln!(writer, "{}", format_profile(profile))?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use racfscan_codec::{EbcdicStr, Rba};
    use racfscan_db::{ClassRef, GroupRecord, Segment, SegmentRecord};
    use racfscan_db::{FieldType, IntWidth, SchemaField, SegmentSchema};

    fn sample_profile() -> Profile {
        let schema = SegmentSchema {
            fields: vec![
                SchemaField {
                    name: "ENTYPE".into(),
                    ty: FieldType::Int(IntWidth::W8),
                },
                SchemaField {
                    name: "SUPGROUP".into(),
                    ty: FieldType::Ebcdic,
                },
                SchemaField {
                    name: "CLCNT_RG".into(),
                    ty: FieldType::Group(vec![SchemaField {
                        name: "CLNAME".into(),
                        ty: FieldType::Ebcdic,
                    }]),
                },
            ],
        };
        let mut record = SegmentRecord::from_schema(&schema);
        record.set(
            "ENTYPE",
            FieldValue::Int {
                value: 1,
                width: IntWidth::W8,
            },
        );
        record.set(
            "SUPGROUP",
            FieldValue::Ebcdic(EbcdicStr::new(vec![0xE2, 0xE8, 0xE2, 0xF1])),
        );
        record.set(
            "CLCNT_RG",
            FieldValue::Group(vec![GroupRecord {
                fields: vec![(
                    "CLNAME".into(),
                    FieldValue::Ebcdic(EbcdicStr::new(vec![0xE3, 0xE2, 0xD6])),
                )],
            }]),
        );

        Profile {
            name: "SYS1".into(),
            class: ClassRef {
                name: "GROUP".into(),
                id: 1,
            },
            segments: vec![Segment {
                name: "BASE".into(),
                id: 1,
                rba: Rba::new(0x1000),
                physical_len: 128,
                logical_len: 64,
                raw: "83".repeat(64),
                record,
            }],
        }
    }

    #[test]
    fn test_format_profile() {
        let text = format_profile(&sample_profile());
        assert!(text.starts_with("Profile: SYS1 (GROUP; 1)\n"));
        assert!(text.contains("[1] Segment: BASE (1)"));
        assert!(text.contains("Offset: 0x00001000"));
        assert!(text.contains("ENTYPE: 1 (1)"));
        assert!(text.contains("SUPGROUP: SYS1 (e2e8e2f1)"));
        assert!(text.contains("CLCNT_RG:\n"));
        assert!(text.contains("[0]: CLNAME: TSO (e3e2d6)"));
    }

    #[test]
    fn test_write_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.txt");
        write_dump(&[sample_profile()], &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Profile: SYS1"));
    }
}
