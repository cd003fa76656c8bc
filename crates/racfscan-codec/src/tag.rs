//! The field-tag mini-DSL used by layout descriptors.
//!
//! A tag set is a comma-separated list of `key` or `key=value` items,
//! where `value` is either a decimal literal or the name of an earlier
//! sibling field whose decoded integer supplies the size:
//!
//! - `size=6` — the field occupies six bytes;
//! - `size=LenName` — the field's length is the value of the sibling
//!   `LenName`;
//! - `bit=3` — a packed boolean occupying bit 3 (MSB = 0) of its word;
//! - `final` — the last boolean consumed from the current packed word.
//!
//! Parsing and stringifying round-trip: `parse(to_string(t)) == t`.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::CodecError;
use crate::Result;

/// The value attached to a tag key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    /// Bare key with no `=value` part (e.g. `final`).
    Flag,
    /// Decimal literal value.
    Int(u32),
    /// Reference to an earlier sibling field by name.
    Ref(String),
}

/// A parsed tag set: key → value, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: BTreeMap<String, TagValue>,
}

impl TagSet {
    /// Parse the compact comma-separated syntax. Empty input yields an
    /// empty set; empty items between commas are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for item in text.split(',') {
            if item.is_empty() {
                continue;
            }
            match item.split_once('=') {
                None => {
                    entries.insert(item.to_string(), TagValue::Flag);
                }
                Some((key, value)) => {
                    if key.is_empty() || value.is_empty() {
                        return Err(CodecError::TagSyntax {
                            tag: item.to_string(),
                        });
                    }
                    let parsed = match value.parse::<u32>() {
                        Ok(n) => TagValue::Int(n),
                        Err(_) => TagValue::Ref(value.to_string()),
                    };
                    entries.insert(key.to_string(), parsed);
                }
            }
        }
        Ok(Self { entries })
    }

    /// Look up a tag by key.
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.entries.get(key)
    }

    /// True if the key is present (with any value).
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The `bit` tag as an integer, if present.
    pub fn bit(&self) -> Option<u32> {
        match self.entries.get("bit") {
            Some(TagValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// True if the `final` marker is present.
    pub fn is_final(&self) -> bool {
        self.has("final")
    }

    /// Resolve the `size` tag against earlier-decoded sibling values.
    ///
    /// Returns `Ok(None)` when no size tag is present. A reference to a
    /// sibling missing from `ctx` is an error naming both fields.
    pub fn size(&self, field: &str, ctx: &BTreeMap<String, u64>) -> Result<Option<usize>> {
        match self.entries.get("size") {
            None => Ok(None),
            Some(TagValue::Int(n)) => Ok(Some(*n as usize)),
            Some(TagValue::Ref(name)) => match ctx.get(name) {
                Some(v) => Ok(Some(*v as usize)),
                None => Err(CodecError::UnresolvedRef {
                    field: field.to_string(),
                    reference: name.clone(),
                }),
            },
            Some(TagValue::Flag) => Err(CodecError::TagSyntax {
                tag: "size".to_string(),
            }),
        }
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            match value {
                TagValue::Flag => write!(f, "{key}")?,
                TagValue::Int(n) => write!(f, "{key}={n}")?,
                TagValue::Ref(name) => write!(f, "{key}={name}")?,
            }
        }
        Ok(())
    }
}
