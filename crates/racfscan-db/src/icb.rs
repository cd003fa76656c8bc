//! The Inventory Control Block — the root header of a RACF database.
//!
//! The ICB is a fixed-layout structure at file offset zero. It carries
//! the template directory (where each class's field definitions live),
//! the address of the first level-1 index block, the BAM chain head, and
//! a large amount of SETROPTS state: global flags, password rules, audit
//! and protection class masks.
//!
//! Only the template directory and the index sequence set address are
//! consumed by the extraction pipeline; everything else is decoded so it
//! can be surfaced in diagnostic output.

use std::fmt::Write as _;

use racfscan_codec::{decode_struct, DecodedRecord, FieldSpec, Kind, Rba, Value};

use crate::error::DbError;
use crate::Result;

/// Total decoded size of the ICB, in bytes.
pub const ICB_SIZE: usize = 2605;

/// Template directory entry: one region of field definitions.
const DEFNS_LAYOUT: &[FieldSpec] = &[
    // Template length
    FieldSpec::new("ICTMPL", Kind::U16, ""),
    // Template number (class: 1=GROUP, 2=USER, 4=DATASET, 5=GENERAL)
    FieldSpec::new("ICTMPN", Kind::U8, ""),
    // Align to half-word boundary
    FieldSpec::new("ICTMRSV1", Kind::U8, ""),
    // RBA of the field definition table
    FieldSpec::new("ICTMPRBA", Kind::Rba, "size=6"),
    // Reserved
    FieldSpec::new("ICTMRSV2", Kind::U64, "size=6"),
];

/// Password syntax rule slot.
const PASS_RULE_LAYOUT: &[FieldSpec] = &[
    // Starting length value
    FieldSpec::new("ICBPSLEN", Kind::U8, ""),
    // Ending length value
    FieldSpec::new("ICBPELEN", Kind::U8, ""),
    // Content rules
    FieldSpec::new("ICBPRULS", Kind::Bytes, "size=8"),
];

/// The complete fixed ICB layout.
const ICB_LAYOUT: &[FieldSpec] = &[
    FieldSpec::new("ICBCHAIN", Kind::I32, ""),
    // Number of BAM blocks in the data set
    FieldSpec::new("ICBBAMNO", Kind::I32, ""),
    // RBA of the highest-level CIB
    FieldSpec::new("ICCIBRBA", Kind::Rba, "size=6"),
    // RBA of the first block of the index sequence set
    FieldSpec::new("ICISSRBA", Kind::Rba, "size=6"),
    // RBA of the first BAM block
    FieldSpec::new("ICBAMRBA", Kind::Rba, "size=6"),
    // Data set extension and format flags
    FieldSpec::new("ICBEXTND", Kind::Bool, "size=1,bit=0"),
    FieldSpec::new("ICBEDAT", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBDSFMT", Kind::Bool, "size=1,bit=3"),
    FieldSpec::new("ICBWIP", Kind::Bool, "size=1,bit=4,final"),
    // Number of templates
    FieldSpec::new("ICTMPCNT", Kind::I8, ""),
    // BAM high-water mark
    FieldSpec::new("ICBAMHWM", Kind::Rba, "size=6"),
    // Template directory
    FieldSpec::new("ICBTEMP", Kind::Array(9, &Kind::Struct(DEFNS_LAYOUT)), ""),
    FieldSpec::new("", Kind::Skip, "size=16"),
    // Data set attribute flags
    FieldSpec::new("ICBNLS", Kind::Bool, "size=1,bit=1"),
    FieldSpec::new("ICBNDSS", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBNTVS", Kind::Bool, "size=1,bit=3"),
    FieldSpec::new("ICBNDVS", Kind::Bool, "size=1,bit=4"),
    FieldSpec::new("ICBNTMS", Kind::Bool, "size=1,bit=5"),
    FieldSpec::new("ICBNADS", Kind::Bool, "size=1,bit=6"),
    FieldSpec::new("ICBEGN", Kind::Bool, "size=1,bit=7"),
    FieldSpec::new("ICBEXTA", Kind::U8, ""),
    // Volume protection and JES options
    FieldSpec::new("ICBTAPE", Kind::Bool, "size=1,bit=0"),
    FieldSpec::new("ICBDASD", Kind::Bool, "size=1,bit=1"),
    FieldSpec::new("ICBDGEN", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBDGCM", Kind::Bool, "size=1,bit=3"),
    FieldSpec::new("ICBRDSN", Kind::Bool, "size=1,bit=4"),
    FieldSpec::new("ICBJXAL", Kind::Bool, "size=1,bit=5"),
    FieldSpec::new("ICBJCHK", Kind::Bool, "size=1,bit=6"),
    FieldSpec::new("ICBJALL", Kind::Bool, "size=1,bit=7"),
    // Audit options
    FieldSpec::new("ICBAGRO", Kind::Bool, "size=1,bit=1"),
    FieldSpec::new("ICBAUSE", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBADAT", Kind::Bool, "size=1,bit=3"),
    FieldSpec::new("ICBADAS", Kind::Bool, "size=1,bit=4"),
    FieldSpec::new("ICBATAP", Kind::Bool, "size=1,bit=5"),
    FieldSpec::new("ICBATER", Kind::Bool, "size=1,bit=6"),
    FieldSpec::new("ICBAOPR", Kind::Bool, "size=1,bit=7"),
    FieldSpec::new("ICBAXTA", Kind::U8, ""),
    // Terminal and modelling options
    FieldSpec::new("ICBTERP", Kind::Bool, "size=1,bit=0"),
    FieldSpec::new("ICBTUAC", Kind::Bool, "size=1,bit=1"),
    FieldSpec::new("ICBAVIO", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBSAUD", Kind::Bool, "size=1,bit=3"),
    FieldSpec::new("ICBMGDG", Kind::Bool, "size=1,bit=4"),
    FieldSpec::new("ICBMUSR", Kind::Bool, "size=1,bit=5"),
    FieldSpec::new("ICBMGRP", Kind::Bool, "size=1,bit=6"),
    FieldSpec::new("ICBLGRP", Kind::Bool, "size=1,bit=7"),
    // Change counts for all index-block levels
    FieldSpec::new("ICBCHCT", Kind::Array(10, &Kind::I32), ""),
    // Global maximum password interval
    FieldSpec::new("ICBPINV", Kind::U8, ""),
    // Class statistics / audit / protection masks
    FieldSpec::new("ICBCSTA", Kind::U32, ""),
    FieldSpec::new("ICBCAUD", Kind::U32, ""),
    FieldSpec::new("ICBCPRO", Kind::U32, ""),
    // Password history / revoke / warning values
    FieldSpec::new("ICBPHIST", Kind::U8, ""),
    FieldSpec::new("ICBPRVOK", Kind::U8, ""),
    FieldSpec::new("ICBPWARN", Kind::U8, ""),
    // Password syntax rules
    FieldSpec::new("ICBPSYN", Kind::Array(8, &Kind::Struct(PASS_RULE_LAYOUT)), ""),
    // INACTIVATE interval
    FieldSpec::new("ICBINACT", Kind::U8, ""),
    // Generic profile checking / generic command class masks
    FieldSpec::new("ICBCGEN", Kind::U32, ""),
    FieldSpec::new("ICBCGCM", Kind::U32, ""),
    // SETROPTS option word
    FieldSpec::new("ICBFPDS", Kind::Bool, "size=4,bit=0"),
    FieldSpec::new("ICBTDSN", Kind::Bool, "size=4,bit=1"),
    FieldSpec::new("ICBPRO", Kind::Bool, "size=4,bit=8"),
    FieldSpec::new("ICBPROF", Kind::Bool, "size=4,bit=9"),
    FieldSpec::new("ICBEOS", Kind::Bool, "size=4,bit=10"),
    FieldSpec::new("ICBEOSL", Kind::Bool, "size=4,bit=11"),
    FieldSpec::new("ICBEOSA", Kind::Bool, "size=4,bit=12"),
    FieldSpec::new("ICBPLC", Kind::Bool, "size=4,bit=13"),
    FieldSpec::new("ICBPSC", Kind::Bool, "size=4,bit=14"),
    FieldSpec::new("ICBPROG", Kind::Bool, "size=4,bit=16,final"),
    // Class fastpath mask
    FieldSpec::new("ICBFPTH", Kind::U32, ""),
    // Security level for erase-on-scratch
    FieldSpec::new("ICBSLVL", Kind::U8, ""),
    // Security retention period
    FieldSpec::new("ICBRETP", Kind::U16, ""),
    // Single-level data set name prefix
    FieldSpec::new("ICBQLLN", Kind::U8, ""),
    FieldSpec::new("ICBQUAL", Kind::Ebcdic, "size=9"),
    // SECLEVEL to audit
    FieldSpec::new("ICBSLAU", Kind::U8, ""),
    // Application identity mapping byte
    FieldSpec::new("ICBALIAS", Kind::U8, ""),
    // Change count for data blocks
    FieldSpec::new("ICBCHCTD", Kind::U32, ""),
    // RVARY passwords
    FieldSpec::new("ICBSWPW", Kind::Bytes, "size=8"),
    FieldSpec::new("ICBINPW", Kind::Bytes, "size=8"),
    // CDT-anchored and option class masks
    FieldSpec::new("ICBLRCL", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLGNL", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLSTAC", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLAUDC", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLPROC", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLGENC", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLGCMC", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLFPTC", Kind::Bytes, "size=16"),
    // SETROPTS PASSWORD(MINCHANGE)
    FieldSpec::new("ICBPMIN", Kind::I8, ""),
    // Number of new templates
    FieldSpec::new("ICNTMPCT", Kind::U8, ""),
    // Release and APAR levels
    FieldSpec::new("ICBTMPRL", Kind::Ebcdic, "size=8"),
    FieldSpec::new("ICBTMPAL", Kind::Ebcdic, "size=8"),
    // Template extensions
    FieldSpec::new("ICBTXRBA", Kind::Rba, "size=6"),
    FieldSpec::new("ICBTXLN", Kind::I16, ""),
    FieldSpec::new("", Kind::Skip, "size=136"),
    // VM sync counters and profile names
    FieldSpec::new("ICBVMSSP", Kind::U32, ""),
    FieldSpec::new("ICBVMSXA", Kind::U32, ""),
    FieldSpec::new("ICBBMAPA", Kind::Ebcdic, "size=8"),
    FieldSpec::new("ICBBMAPP", Kind::Ebcdic, "size=8"),
    FieldSpec::new("ICBMAPSZ", Kind::U16, ""),
    FieldSpec::new("ICBDIAL", Kind::U8, ""),
    FieldSpec::new("ICBPRMSG", Kind::U8, ""),
    // ACI bit-map events
    FieldSpec::new("ICBEVENT", Kind::Bytes, "size=88"),
    // LU session interval
    FieldSpec::new("ICBSINT", Kind::I16, ""),
    // LOGOPTIONS class masks
    FieldSpec::new("ICBLGAL", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLNVR", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLGSU", Kind::Bytes, "size=16"),
    FieldSpec::new("ICBLGFL", Kind::Bytes, "size=16"),
    // SETROPTS JES user ids
    FieldSpec::new("ICBJSYS", Kind::Ebcdic, "size=8"),
    FieldSpec::new("ICBJUND", Kind::Ebcdic, "size=8"),
    // Group data synchronization value
    FieldSpec::new("ICBRCGSN", Kind::I32, ""),
    // DATASET class LOGOPTIONS
    FieldSpec::new("ICBDLGA", Kind::Bool, "size=1,bit=0"),
    FieldSpec::new("ICBDLGN", Kind::Bool, "size=1,bit=1"),
    FieldSpec::new("ICBDLGS", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBDLGF", Kind::Bool, "size=1,bit=3,final"),
    // Compatibility and MLS options
    FieldSpec::new("ICBCMPM", Kind::Bool, "size=1,bit=0"),
    FieldSpec::new("ICBMLSF", Kind::Bool, "size=1,bit=1"),
    FieldSpec::new("ICBMLAF", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBCATF", Kind::Bool, "size=1,bit=3"),
    FieldSpec::new("ICBAAPL", Kind::Bool, "size=1,bit=4"),
    FieldSpec::new("ICBNOADC", Kind::Bool, "size=1,bit=5,final"),
    // VM/SP profile names
    FieldSpec::new("ICBSPAUD", Kind::Ebcdic, "size=8"),
    FieldSpec::new("ICBSPCTL", Kind::Ebcdic, "size=8"),
    // SECLABEL and MLS state
    FieldSpec::new("ICBSLCL", Kind::Bool, "size=1,bit=0"),
    FieldSpec::new("ICBCATD", Kind::Bool, "size=1,bit=1"),
    FieldSpec::new("ICBMLQT", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBMLST", Kind::Bool, "size=1,bit=3"),
    FieldSpec::new("ICBMLS", Kind::Bool, "size=1,bit=4"),
    FieldSpec::new("ICBMLAC", Kind::Bool, "size=1,bit=5"),
    FieldSpec::new("ICBGNOW", Kind::Bool, "size=1,bit=6"),
    FieldSpec::new("ICBAUSL", Kind::Bool, "size=1,bit=7"),
    // Language defaults
    FieldSpec::new("ICBNL1", Kind::Ebcdic, "size=3"),
    FieldSpec::new("ICBNL2", Kind::Ebcdic, "size=3"),
    // SESSIONINTERVAL dirty bit
    FieldSpec::new("ICBSESS", Kind::Bool, "size=1,bit=0,final"),
    // File system / IPC security label options
    FieldSpec::new("ICBMLFS", Kind::Bool, "size=1,bit=0"),
    FieldSpec::new("ICBMLIP", Kind::Bool, "size=1,bit=1"),
    FieldSpec::new("ICBMLNM", Kind::Bool, "size=1,bit=2"),
    FieldSpec::new("ICBSBYS", Kind::Bool, "size=1,bit=3,final"),
    FieldSpec::new("", Kind::Skip, "size=85"),
    // Alias index addresses
    FieldSpec::new("ICBALRBA", Kind::U64, "size=6"),
    FieldSpec::new("ICBASRBA", Kind::U64, "size=6"),
    // VLF purge counter
    FieldSpec::new("ICBSMCT", Kind::U32, ""),
    // SETROPTS KERBLVL
    FieldSpec::new("ICBKRBLV", Kind::U8, ""),
    FieldSpec::new("", Kind::Skip, "size=1"),
    // Identifier and version, filled during IRRMIN00 initialization
    FieldSpec::new("ICBID", Kind::Ebcdic, "size=8"),
    FieldSpec::new("ICBVRMN", Kind::Ebcdic, "size=6"),
    // Segment table
    FieldSpec::new("ICTSEGLN", Kind::I16, ""),
    FieldSpec::new("ICTSEGRB", Kind::U64, "size=6"),
    // ICB fully initialized flag
    FieldSpec::new("ICBINITF", Kind::Bool, "size=1,bit=0,final"),
    FieldSpec::new("", Kind::Skip, "size=3"),
    // ACEE data repository change counts and VLF purge counters
    FieldSpec::new("ICBUSCT", Kind::U32, ""),
    FieldSpec::new("ICBGPCT", Kind::U32, ""),
    FieldSpec::new("ICBGRCT", Kind::U32, ""),
    FieldSpec::new("ICBUMCT", Kind::U32, ""),
    FieldSpec::new("ICBGMCT", Kind::U32, ""),
    // Template level value
    FieldSpec::new("ICBTMPLV", Kind::Ebcdic, "size=7"),
    // Long-format class masks
    FieldSpec::new("ICBVPROC", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVGENC", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVGCMC", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVRCL", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVGNL", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVFPTC", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVAUDC", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVSTAC", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVLGA", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVLNV", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVLGS", Kind::Bytes, "size=128"),
    FieldSpec::new("ICBVLGF", Kind::Bytes, "size=128"),
    // Number of template extensions
    FieldSpec::new("ICTMPXCT", Kind::U8, ""),
    // Password algorithm repetition / memory factors and selector
    FieldSpec::new("ICBPREP", Kind::U16, ""),
    FieldSpec::new("ICBPMEM", Kind::U16, ""),
    FieldSpec::new("ICBPALG", Kind::U8, ""),
];

/// One template directory entry with a live region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDirEntry {
    /// Region length in bytes.
    pub len: u16,
    /// Template number identifying the profile class.
    pub number: u8,
    /// Region start address.
    pub rba: Rba,
}

/// The decoded Inventory Control Block.
#[derive(Debug, Clone)]
pub struct Icb {
    record: DecodedRecord,
    /// Template directory entries with a non-zero region address, in
    /// directory order. Entries sharing a template number form one
    /// logical template per class.
    pub template_directory: Vec<TemplateDirEntry>,
    /// RBA of the first block of the index sequence set.
    pub index_sequence_rba: Rba,
    /// RBA of the first BAM block.
    pub bam_rba: Rba,
    /// Number of BAM blocks in the data set.
    pub bam_count: i64,
}

impl Icb {
    /// Decode the ICB from the front of the file image.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (record, _) = decode_struct(data, ICB_LAYOUT).map_err(DbError::Icb)?;

        let mut template_directory = Vec::new();
        for entry in record.array("ICBTEMP").map_err(DbError::Icb)? {
            let Value::Record(defns) = entry else {
                continue;
            };
            let rba = defns.rba("ICTMPRBA").map_err(DbError::Icb)?;
            if rba.is_null() {
                // A zero address terminates the directory.
                break;
            }
            template_directory.push(TemplateDirEntry {
                len: defns.int("ICTMPL").map_err(DbError::Icb)? as u16,
                number: defns.int("ICTMPN").map_err(DbError::Icb)? as u8,
                rba,
            });
        }

        let index_sequence_rba = record.rba("ICISSRBA").map_err(DbError::Icb)?;
        let bam_rba = record.rba("ICBAMRBA").map_err(DbError::Icb)?;
        let bam_count = match record.get("ICBBAMNO") {
            Some(Value::SInt(n)) => *n,
            _ => 0,
        };

        Ok(Self {
            record,
            template_directory,
            index_sequence_rba,
            bam_rba,
            bam_count,
        })
    }

    /// The full decoded record, for callers that need fields beyond the
    /// functionally-required ones.
    pub fn record(&self) -> &DecodedRecord {
        &self.record
    }

    /// Render every decoded field with its size and offset. Emitted at
    /// debug level so a database's global settings can be inspected.
    pub fn render_diagnostic(&self) -> String {
        let mut out = String::from("Inventory Control Block\n");
        for field in self.record.fields() {
            match (field.name, &field.value) {
                ("ICBTEMP", Value::Array(entries)) => {
                    let _ = writeln!(
                        out,
                        "\t{} (size: {}; offset: 0x{:02x}):",
                        field.name, field.size, field.offset
                    );
                    for (i, entry) in entries.iter().enumerate() {
                        if let Value::Record(defns) = entry {
                            let _ = writeln!(
                                out,
                                "\t\t[{i}] length: {}; number: {}; rba: {}",
                                defns.get("ICTMPL").map(ToString::to_string).unwrap_or_default(),
                                defns.get("ICTMPN").map(ToString::to_string).unwrap_or_default(),
                                defns.get("ICTMPRBA").map(ToString::to_string).unwrap_or_default(),
                            );
                        }
                    }
                }
                (_, Value::Ebcdic(s)) => {
                    let _ = writeln!(
                        out,
                        "\t{}: {} (origin: {}; size: {}; offset: 0x{:02x})",
                        field.name,
                        s.to_text(),
                        s.hex(),
                        field.size,
                        field.offset
                    );
                }
                (_, value) => {
                    let _ = writeln!(
                        out,
                        "\t{}: {} (size: {}; offset: 0x{:02x})",
                        field.name, value, field.size, field.offset
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_u16(buf: &mut [u8], at: usize, v: u16) {
        buf[at..at + 2].copy_from_slice(&v.to_be_bytes());
    }

    fn put_rba(buf: &mut [u8], at: usize, v: u64) {
        buf[at..at + 6].copy_from_slice(&v.to_be_bytes()[2..]);
    }

    #[test]
    fn test_icb_total_size() {
        let data = vec![0u8; ICB_SIZE];
        let (_, consumed) = decode_struct(&data, ICB_LAYOUT).unwrap();
        assert_eq!(consumed, ICB_SIZE);
    }

    #[test]
    fn test_icb_extraction() {
        let mut data = vec![0u8; 4096];
        // ICISSRBA at offset 14.
        put_rba(&mut data, 14, 0x2000);
        // ICBAMRBA at offset 20.
        put_rba(&mut data, 20, 0x9000);
        // Template directory starts at offset 34; entries are 16 bytes.
        // Entry 0: GROUP template, 340 bytes at 0x3000.
        put_u16(&mut data, 34, 340);
        data[36] = 1;
        put_rba(&mut data, 38, 0x3000);
        // Entry 1: USER template, 120×17 bytes at 0x4000.
        put_u16(&mut data, 50, 2040);
        data[52] = 2;
        put_rba(&mut data, 54, 0x4000);
        // Entry 2 has RBA 0 and terminates the directory even though a
        // later entry is populated.
        put_u16(&mut data, 82, 17);
        data[84] = 5;
        put_rba(&mut data, 86, 0x5000);

        let icb = Icb::from_bytes(&data).unwrap();
        assert_eq!(icb.index_sequence_rba, Rba::new(0x2000));
        assert_eq!(icb.bam_rba, Rba::new(0x9000));
        assert_eq!(icb.template_directory.len(), 2);
        assert_eq!(icb.template_directory[0].number, 1);
        assert_eq!(icb.template_directory[0].len, 340);
        assert_eq!(icb.template_directory[0].rba, Rba::new(0x3000));
        assert_eq!(icb.template_directory[1].number, 2);
    }

    #[test]
    fn test_icb_truncated_input() {
        let data = vec![0u8; 100];
        assert!(matches!(Icb::from_bytes(&data), Err(DbError::Icb(_))));
    }

    #[test]
    fn test_diagnostic_rendering_mentions_core_fields() {
        let data = vec![0u8; ICB_SIZE];
        let icb = Icb::from_bytes(&data).unwrap();
        let text = icb.render_diagnostic();
        assert!(text.contains("ICISSRBA"));
        assert!(text.contains("ICBTEMP"));
        assert!(text.contains("ICBPALG"));
    }
}
