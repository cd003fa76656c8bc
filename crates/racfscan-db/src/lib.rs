//! RACF database structure parsing.
//!
//! A RACF database is a single file image whose layout is self-describing:
//! the Inventory Control Block (ICB) at offset zero points at per-class
//! field-definition templates, the index sequence set, and the BAM chain.
//! This crate walks those structures and decodes every profile segment
//! into typed records shaped by a schema built from the templates:
//!
//! 1. [`icb`] — the fixed file header and its template directory;
//! 2. [`template`] — 17-byte field descriptors grouped by profile class;
//! 3. [`schema`] — semantic classification and per-segment record shapes;
//! 4. [`index`] — the level-1 index block chain cataloguing profiles;
//! 5. [`profile`] — self-describing segment field streams;
//! 6. [`database`] — the end-to-end extraction pipeline.
//!
//! Field layouts come from the file itself, so decoded segments are
//! dynamic records ([`model::SegmentRecord`]) rather than build-time
//! structs; the [`schema::Schema`] carries the parallel type information
//! the output sinks key into.

pub mod bam;
pub mod catalog;
pub mod database;
pub mod error;
pub mod icb;
pub mod index;
pub mod model;
pub mod profile;
pub mod schema;
pub mod template;

pub use database::{extract, RacfDatabase};
pub use error::DbError;
pub use icb::{Icb, TemplateDirEntry, ICB_SIZE};
pub use model::{ClassRef, FieldValue, GroupRecord, Profile, Segment, SegmentRecord};
pub use schema::{ClassifierMode, FieldType, IntWidth, Schema, SchemaField, SegmentSchema};
pub use template::{Template, TemplateField, TEMPLATE_FIELD_SIZE};

/// Convenience result type for database parsing.
pub type Result<T> = std::result::Result<T, DbError>;
