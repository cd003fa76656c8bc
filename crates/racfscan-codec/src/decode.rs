//! Tag-driven decoding of fixed-layout on-disk structures.
//!
//! A structure is described by a static table of [`FieldSpec`] rows; each
//! row names the field, gives its [`Kind`], and attaches a tag string in
//! the [`crate::tag`] syntax. The engine walks the table over a byte
//! buffer, keeping a cursor and a per-struct context of earlier integer
//! fields so later rows can size themselves by reference (`size=LenName`).
//!
//! Cursor discipline for bit-packed booleans: a boolean with a `size` tag
//! reads its packed word at the current position without advancing; only
//! the boolean marked `final` (or occupying the last bit of the word)
//! moves the cursor past the word. This lets a run of layout rows share
//! one flag byte.
//!
//! The engine returns the number of bytes consumed; every higher layer
//! (ICB, index blocks, segment headers) advances by that count.

use std::collections::BTreeMap;
use std::fmt;

use crate::ebcdic::EbcdicStr;
use crate::error::CodecError;
use crate::tag::TagSet;
use crate::types::{read_uint, Rba};
use crate::Result;

// ---------------------------------------------------------------------------
//  Layout descriptors
// ---------------------------------------------------------------------------

/// The shape of one layout field.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit big-endian integer.
    U16,
    /// Signed 16-bit big-endian integer.
    I16,
    /// Unsigned 32-bit big-endian integer.
    U32,
    /// Signed 32-bit big-endian integer.
    I32,
    /// Unsigned 64-bit big-endian integer; a `size=N` tag shrinks the
    /// read to N bytes, zero-padded on the left.
    U64,
    /// Signed 64-bit big-endian integer; `size=N` as for [`Kind::U64`].
    I64,
    /// Boolean. With a `size` tag, a bit inside a packed word (see the
    /// module docs); without one, a single nonzero byte.
    Bool,
    /// Raw byte run; requires a `size` tag.
    Bytes,
    /// EBCDIC byte run; requires a `size` tag.
    Ebcdic,
    /// Relative byte address; usually `size=6`, 8 bytes without a tag.
    Rba,
    /// Reserved space; requires a `size` tag, produces no value.
    Skip,
    /// Fixed-length array of contiguous elements.
    Array(usize, &'static Kind),
    /// Dynamic sequence of contiguous elements; requires a `size` tag
    /// (the element count, usually by sibling reference).
    Seq(&'static Kind),
    /// Nested structure with its own layout table and sibling context.
    Struct(&'static [FieldSpec]),
}

/// One row of a layout table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name; keys the decoded record and sibling references.
    pub name: &'static str,
    /// Field shape.
    pub kind: Kind,
    /// Tag string in the [`crate::tag`] syntax (may be empty).
    pub tags: &'static str,
}

impl FieldSpec {
    /// Construct a layout row.
    pub const fn new(name: &'static str, kind: Kind, tags: &'static str) -> Self {
        Self { name, kind, tags }
    }
}

// ---------------------------------------------------------------------------
//  Decoded values
// ---------------------------------------------------------------------------

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Unsigned integer (all unsigned widths and padded sub-word reads).
    Int(u64),
    /// Signed integer.
    SInt(i64),
    /// Packed or plain boolean.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// EBCDIC text.
    Ebcdic(EbcdicStr),
    /// Relative byte address.
    Rba(Rba),
    /// Array or sequence elements.
    Array(Vec<Value>),
    /// Nested structure.
    Record(DecodedRecord),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::SInt(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Bytes(b) => f.write_str(&hex::encode(b)),
            Value::Ebcdic(s) => f.write_str(&s.to_text()),
            Value::Rba(a) => write!(f, "{a}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(r) => write!(f, "{{{} fields}}", r.fields().len()),
        }
    }
}

/// One decoded field with its position inside the structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedField {
    /// Layout field name.
    pub name: &'static str,
    /// Decoded value.
    pub value: Value,
    /// Byte offset of the field within the structure.
    pub offset: usize,
    /// Field size for display (the tagged size for packed booleans).
    pub size: usize,
}

/// An ordered collection of decoded fields with by-name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedRecord {
    fields: Vec<DecodedField>,
}

impl DecodedRecord {
    /// All fields in layout order.
    pub fn fields(&self) -> &[DecodedField] {
        &self.fields
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| CodecError::MissingField {
            name: name.to_string(),
        })
    }

    /// An unsigned integer field.
    pub fn int(&self, name: &str) -> Result<u64> {
        match self.require(name)? {
            Value::Int(n) => Ok(*n),
            _ => Err(CodecError::WrongKind {
                name: name.to_string(),
                expected: "integer",
            }),
        }
    }

    /// A relative byte address field.
    pub fn rba(&self, name: &str) -> Result<Rba> {
        match self.require(name)? {
            Value::Rba(a) => Ok(*a),
            _ => Err(CodecError::WrongKind {
                name: name.to_string(),
                expected: "rba",
            }),
        }
    }

    /// An EBCDIC field.
    pub fn ebcdic(&self, name: &str) -> Result<&EbcdicStr> {
        match self.require(name)? {
            Value::Ebcdic(s) => Ok(s),
            _ => Err(CodecError::WrongKind {
                name: name.to_string(),
                expected: "ebcdic string",
            }),
        }
    }

    /// An array or sequence field.
    pub fn array(&self, name: &str) -> Result<&[Value]> {
        match self.require(name)? {
            Value::Array(items) => Ok(items),
            _ => Err(CodecError::WrongKind {
                name: name.to_string(),
                expected: "array",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
//  Engine
// ---------------------------------------------------------------------------

/// Decode a structure described by `layout` from the front of `data`.
///
/// Returns the decoded record and the number of bytes consumed.
pub fn decode_struct(data: &[u8], layout: &'static [FieldSpec]) -> Result<(DecodedRecord, usize)> {
    let mut ctx: BTreeMap<String, u64> = BTreeMap::new();
    let mut fields = Vec::with_capacity(layout.len());
    let mut pos = 0usize;

    for spec in layout {
        let tags = TagSet::parse(spec.tags)?;
        let rest = data.get(pos..).unwrap_or(&[]);
        let (value, consumed) = decode_field(rest, spec, &tags, &ctx)?;
        let size = tags.size(spec.name, &ctx)?.unwrap_or(consumed);
        if let Some(value) = value {
            if let Value::Int(n) = &value {
                ctx.insert(spec.name.to_string(), *n);
            }
            fields.push(DecodedField {
                name: spec.name,
                value,
                offset: pos,
                size,
            });
        }
        pos += consumed;
    }

    Ok((DecodedRecord { fields }, pos))
}

/// Decode one field; the tag set must already be parsed and sibling
/// references resolve against `ctx`.
fn decode_field(
    data: &[u8],
    spec: &FieldSpec,
    tags: &TagSet,
    ctx: &BTreeMap<String, u64>,
) -> Result<(Option<Value>, usize)> {
    let size = tags.size(spec.name, ctx)?;

    match spec.kind {
        Kind::U8 => Ok((Some(Value::Int(read_uint(data, 1)?)), 1)),
        Kind::I8 => {
            let b = read_uint(data, 1)? as u8;
            Ok((Some(Value::SInt(b as i8 as i64)), 1))
        }
        Kind::U16 => Ok((Some(Value::Int(read_uint(data, 2)?)), 2)),
        Kind::I16 => {
            let n = read_uint(data, 2)? as u16;
            Ok((Some(Value::SInt(n as i16 as i64)), 2))
        }
        Kind::U32 => Ok((Some(Value::Int(read_uint(data, 4)?)), 4)),
        Kind::I32 => {
            let n = read_uint(data, 4)? as u32;
            Ok((Some(Value::SInt(n as i32 as i64)), 4))
        }
        Kind::U64 => {
            let n = size.unwrap_or(8);
            Ok((Some(Value::Int(read_uint(data, n)?)), n))
        }
        Kind::I64 => {
            let n = size.unwrap_or(8);
            Ok((Some(Value::SInt(read_uint(data, n)? as i64)), n))
        }
        Kind::Bool => match size {
            None => Ok((Some(Value::Bool(read_uint(data, 1)? != 0)), 1)),
            Some(n) => {
                let word = read_uint(data, n)?;
                let bits = (8 * n) as u32;
                let value = match tags.bit() {
                    None => word != 0,
                    Some(k) => {
                        if k >= bits {
                            return Err(CodecError::TagSyntax {
                                tag: format!("bit={k}"),
                            });
                        }
                        (word >> (bits - 1 - k)) & 1 != 0
                    }
                };
                let advances = tags.is_final() || tags.bit() == Some(bits - 1);
                Ok((Some(Value::Bool(value)), if advances { n } else { 0 }))
            }
        },
        Kind::Bytes => {
            let n = size.ok_or_else(|| missing_size(spec))?;
            check(data, n)?;
            Ok((Some(Value::Bytes(data[..n].to_vec())), n))
        }
        Kind::Ebcdic => {
            let n = size.ok_or_else(|| missing_size(spec))?;
            check(data, n)?;
            Ok((Some(Value::Ebcdic(EbcdicStr::new(data[..n].to_vec()))), n))
        }
        Kind::Rba => {
            let n = size.unwrap_or(8);
            Ok((Some(Value::Rba(Rba::new(read_uint(data, n)?))), n))
        }
        Kind::Skip => {
            let n = size.ok_or_else(|| missing_size(spec))?;
            check(data, n)?;
            Ok((None, n))
        }
        Kind::Array(len, elem) => {
            let (items, consumed) = decode_elements(data, spec.name, elem, len)?;
            Ok((Some(Value::Array(items)), consumed))
        }
        Kind::Seq(elem) => {
            let count = size.ok_or_else(|| missing_size(spec))?;
            let (items, consumed) = decode_elements(data, spec.name, elem, count)?;
            Ok((Some(Value::Array(items)), consumed))
        }
        Kind::Struct(layout) => {
            let (record, consumed) = decode_struct(data, layout)?;
            Ok((Some(Value::Record(record)), consumed))
        }
    }
}

fn decode_elements(
    data: &[u8],
    name: &'static str,
    elem: &'static Kind,
    count: usize,
) -> Result<(Vec<Value>, usize)> {
    let elem_spec = FieldSpec::new(name, *elem, "");
    let empty = TagSet::default();
    let empty_ctx = BTreeMap::new();
    let mut items = Vec::with_capacity(count);
    let mut pos = 0usize;
    for _ in 0..count {
        let rest = data.get(pos..).unwrap_or(&[]);
        let (value, consumed) = decode_field(rest, &elem_spec, &empty, &empty_ctx)?;
        if let Some(value) = value {
            items.push(value);
        }
        pos += consumed;
    }
    Ok((items, pos))
}

fn check(data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(CodecError::InsufficientData {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn missing_size(spec: &FieldSpec) -> CodecError {
    CodecError::MissingSize {
        field: spec.name.to_string(),
    }
}
