//! SQLite export sink.
//!
//! One table per (class, segment) pair, named `CLASS_SEGMENT`, with a
//! synthetic autoincrement key and TEXT columns: `ProfileName`,
//! `Offset`, `RawData`, then one column per schema field. Repeat-group
//! members are flattened — each member column holds the "; "-joined
//! values of that member across the group's records.

use std::path::Path;

use rusqlite::{params_from_iter, Connection};

use racfscan_db::model::render_plain;
use racfscan_db::{FieldType, FieldValue, Profile, Schema, SegmentSchema};

/// SQLite-backed export of the decoded profile list.
pub struct SqliteSink {
    conn: Connection,
}

/// Quote an identifier for use in DDL, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column names for one segment schema, with repeat groups expanded.
fn column_names(schema: &SegmentSchema) -> Vec<String> {
    let mut columns = vec![
        "ProfileName".to_string(),
        "Offset".to_string(),
        "RawData".to_string(),
    ];
    for field in &schema.fields {
        match &field.ty {
            FieldType::Group(members) => {
                columns.extend(members.iter().map(|m| m.name.clone()));
            }
            _ => columns.push(field.name.clone()),
        }
    }
    columns
}

fn table_name(class: &str, segment: &str) -> String {
    format!("{class}_{segment}")
}

impl SqliteSink {
    /// Create (or open) the database file.
    pub fn create(path: &Path) -> rusqlite::Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create every (class, segment) table, then insert all profiles.
    pub fn export(&mut self, schema: &Schema, profiles: &[Profile]) -> rusqlite::Result<()> {
        self.init(schema)?;
        self.insert_profiles(schema, profiles)
    }

    /// Create one table per (class, segment) pair.
    pub fn init(&self, schema: &Schema) -> rusqlite::Result<()> {
        for (class, segment, seg_schema) in schema.iter() {
            let table = table_name(class, segment);
            tracing::debug!("creating table {table}");
            let columns: Vec<String> = column_names(seg_schema)
                .iter()
                .map(|c| format!("{} TEXT", quote_ident(c)))
                .collect();
            let ddl = format!(
                "CREATE TABLE {} (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, {})",
                quote_ident(&table),
                columns.join(", ")
            );
            self.conn.execute(&ddl, [])?;
        }
        Ok(())
    }

    /// Insert every profile segment into its table.
    pub fn insert_profiles(
        &mut self,
        schema: &Schema,
        profiles: &[Profile],
    ) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        for profile in profiles {
            for segment in &profile.segments {
                let Some(seg_schema) = schema.segment(&profile.class.name, &segment.name) else {
                    tracing::warn!(
                        "no schema for {} segment {}, skipping insert",
                        profile.class.name,
                        segment.name
                    );
                    continue;
                };
                let table = table_name(&profile.class.name, &segment.name);
                tracing::debug!("inserting profile {} into {table}", profile.name);

                let mut values = vec![
                    profile.name.clone(),
                    segment.rba.to_string(),
                    segment.raw.clone(),
                ];
                for field in &seg_schema.fields {
                    let value = segment.record.get(&field.name);
                    match (&field.ty, value) {
                        (FieldType::Group(members), Some(FieldValue::Group(records))) => {
                            for member in members {
                                let joined: Vec<String> = records
                                    .iter()
                                    .map(|r| {
                                        r.get(&member.name).map(render_plain).unwrap_or_default()
                                    })
                                    .collect();
                                values.push(joined.join("; "));
                            }
                        }
                        (FieldType::Group(members), _) => {
                            values.extend(std::iter::repeat(String::new()).take(members.len()));
                        }
                        (_, Some(value)) => values.push(render_plain(value)),
                        (_, None) => values.push(String::new()),
                    }
                }

                let columns = column_names(seg_schema);
                let placeholders: Vec<String> =
                    (1..=columns.len()).map(|i| format!("?{i}")).collect();
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    quote_ident(&table),
                    columns
                        .iter()
                        .map(|c| quote_ident(c))
                        .collect::<Vec<_>>()
                        .join(", "),
                    placeholders.join(", ")
                );
                tx.execute(&sql, params_from_iter(values.iter()))?;
            }
        }
        tx.commit()
    }
}
