//! The end-to-end extraction pipeline.
//!
//! Raw bytes → ICB → templates → schema → index chain → profiles.
//! Structural failures (a malformed ICB, template region, or index
//! block) abort the extraction; everything downstream depends on them.
//! Per-profile and per-segment failures warn and skip, so one corrupt
//! record never hides the rest of the database.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::bam::BamBlock;
use crate::error::DbError;
use crate::icb::Icb;
use crate::index::{self, walk_sequence_set};
use crate::model::{ClassRef, Profile, Segment};
use crate::profile::{decode_segment, RawSegment};
use crate::schema::{build_segment_schemas, ClassifierMode, Schema};
use crate::template::Template;
use crate::Result;

/// The decoded database: schema, templates, and the profile list.
///
/// Built once by [`extract`] and handed to the output sinks; nothing is
/// mutated afterwards.
#[derive(Debug)]
pub struct RacfDatabase {
    /// The decoded file header.
    pub icb: Icb,
    /// One merged template per class id.
    pub templates: BTreeMap<u8, Template>,
    /// Class id → class name, from each template's first descriptor.
    pub class_names: BTreeMap<u8, String>,
    /// The dynamic schema: class → segment → record shape.
    pub schema: Schema,
    /// Every decoded profile, in index order.
    pub profiles: Vec<Profile>,
}

/// Decode a whole database image.
pub fn extract(data: &[u8], mode: ClassifierMode) -> Result<RacfDatabase> {
    info!("extracting inventory control block");
    let icb = Icb::from_bytes(data)?;
    debug!("{}", icb.render_diagnostic());

    info!("extracting templates");
    let mut templates: BTreeMap<u8, Template> = BTreeMap::new();
    for entry in &icb.template_directory {
        let start = entry.rba.offset();
        let end = start
            .checked_add(entry.len as usize)
            .filter(|&e| e <= data.len())
            .ok_or(DbError::TemplateOutOfBounds {
                number: entry.number,
                rba: entry.rba,
                len: entry.len as u32,
            })?;
        let parsed = Template::parse(&data[start..end], entry.number, entry.rba)?;
        debug!(
            "template {} ({}) at {}: {} bytes",
            entry.number,
            parsed.class_name(),
            entry.rba,
            entry.len
        );
        match templates.get_mut(&entry.number) {
            Some(template) => template.append(parsed),
            None => {
                templates.insert(entry.number, parsed);
            }
        }
    }

    info!("building profile record shapes from templates");
    let mut schema = Schema::default();
    let mut class_names = BTreeMap::new();
    for (number, template) in &templates {
        let class = template.class_name();
        debug!("class {class} (template {number}): {} descriptors", template.fields().len());
        schema.insert_class(class.clone(), build_segment_schemas(template, mode));
        class_names.insert(*number, class);
    }

    info!("extracting index blocks");
    let blocks = walk_sequence_set(data, icb.index_sequence_rba)?;
    debug!("{} level-1 index blocks", blocks.len());

    if !icb.bam_rba.is_null() {
        match data
            .get(icb.bam_rba.offset()..)
            .ok_or(DbError::IndexBlockOutOfBounds { rba: icb.bam_rba })
            .and_then(|bytes| BamBlock::from_bytes(bytes).map_err(DbError::Codec))
        {
            Ok(bam) => debug!(
                "first BAM block at {}: {} covered blocks from {}, next {}",
                icb.bam_rba,
                bam.masks.len(),
                bam.first,
                bam.next
            ),
            Err(err) => warn!("could not decode the first BAM block: {err}"),
        }
    }

    info!("extracting profiles");
    let mut profiles = Vec::new();
    for block in &blocks {
        for entry in &block.entries {
            debug!(
                "index entry {} kind 0x{:02x} ({}) class {} ({})",
                entry.name.to_text(),
                entry.kind,
                index::entry_kind_name(entry.kind).unwrap_or("?"),
                entry.class_id,
                index::class_display_name(entry.class_id).unwrap_or("?"),
            );
            let Some(class_name) = class_names.get(&entry.class_id) else {
                warn!(
                    "index entry {} has class id {} with no template, skipping",
                    entry.name.to_text(),
                    entry.class_id
                );
                continue;
            };
            let template = &templates[&entry.class_id];

            let mut profile = Profile {
                name: entry.name.to_text(),
                class: ClassRef {
                    name: class_name.clone(),
                    id: entry.class_id,
                },
                segments: Vec::new(),
            };

            for pointer in &entry.segments {
                debug!(
                    "profile {} ({}) segment id {} ({}) at {}",
                    profile.name,
                    class_name,
                    pointer.id,
                    index::segment_display_name(entry.class_id, pointer.id).unwrap_or("?"),
                    pointer.rba
                );
                match decode_one_segment(data, class_name, template, &schema, pointer) {
                    Ok(segment) => profile.segments.push(segment),
                    Err(err) => {
                        warn!(
                            "cannot extract segment of {} ({}) at {}: {err}",
                            profile.name, class_name, pointer.rba
                        );
                    }
                }
            }

            profiles.push(profile);
        }
    }
    info!("{} profiles extracted", profiles.len());

    Ok(RacfDatabase {
        icb,
        templates,
        class_names,
        schema,
        profiles,
    })
}

fn decode_one_segment(
    data: &[u8],
    class_name: &str,
    template: &Template,
    schema: &Schema,
    pointer: &index::SegmentPointer,
) -> Result<Segment> {
    let rba = pointer.rba;
    let start = rba.offset();
    let bytes = data
        .get(start..)
        .ok_or(DbError::Segment {
            rba,
            source: racfscan_codec::CodecError::InsufficientData {
                expected: start,
                actual: data.len(),
            },
        })?;

    let raw = RawSegment::parse(bytes).map_err(|source| DbError::Segment { rba, source })?;
    let segment_name = raw.header.segment_name.trimmed();
    let seg_schema =
        schema
            .segment(class_name, &segment_name)
            .ok_or_else(|| DbError::UnknownSegment {
                class: class_name.to_string(),
                segment: segment_name.clone(),
            })?;

    let record = decode_segment(&raw, template, seg_schema);
    let logical_len = raw.header.logical_len as usize;

    Ok(Segment {
        name: segment_name,
        id: pointer.id,
        rba,
        physical_len: raw.header.physical_len,
        logical_len: raw.header.logical_len,
        raw: hex::encode(&bytes[..logical_len]),
        record,
    })
}
