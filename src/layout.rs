//! Record layout: the field table every encoder and decoder shares.
//!
//! A [`RecordLayout`] is built once from an ordered list of
//! `(name, kind, width)` triples. Offsets are computed left to right from the
//! widths with no alignment padding, so the table is the only place where
//! the binary shape of a record is described. Both the writer and every
//! reader construct the same layout instead of deriving offsets by hand.
use crate::codec;
use crate::error::{DecodeError, LayoutError, UnknownFieldError};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

/// Primitive kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Unsigned 32-bit integer, little-endian.
    U32,
    /// IEEE-754 binary64, little-endian.
    F64,
    /// Fixed-length byte string, right-padded with `0x00`.
    Text,
    /// Single unsigned byte (enumeration codes).
    U8,
}

impl FieldKind {
    /// Width imposed by the kind itself; `None` for `Text`, whose width is declared.
    pub fn natural_width(self) -> Option<usize> {
        match self {
            FieldKind::U32 => Some(4),
            FieldKind::F64 => Some(8),
            FieldKind::U8 => Some(1),
            FieldKind::Text => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::U32 => "u32",
            FieldKind::F64 => "f64",
            FieldKind::Text => "text",
            FieldKind::U8 => "u8",
        })
    }
}

/// One field of a layout, with its resolved offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub width: usize,
    pub offset: usize,
}

impl Field {
    /// Byte range of this field inside a block.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.width
    }

    /// Decode only this field's bytes out of `block`.
    ///
    /// The rest of the block is never touched, so resolving the field once
    /// with [`RecordLayout::field`] and calling `read` per record is the
    /// cheapest way to pull a single column out of a large file.
    pub fn read(&self, block: &[u8]) -> Result<Value, DecodeError> {
        let end = self.offset + self.width;
        if block.len() < end {
            return Err(DecodeError::ShortBlock { name: self.name.clone(), needed: end, actual: block.len() });
        }
        Ok(codec::read_value(self.kind, &block[self.offset..end]))
    }
}

/// Ordered, immutable field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    total_size: usize,
}

impl RecordLayout {
    /// Build a layout from `(name, kind, width)` triples in record order.
    pub fn define<I, S>(fields: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = (S, FieldKind, usize)>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        let mut index = HashMap::new();
        let mut offset = 0usize;
        for (name, kind, width) in fields {
            let name = name.into();
            if width == 0 {
                return Err(LayoutError::ZeroWidth(name));
            }
            if let Some(expected) = kind.natural_width() {
                if width != expected {
                    return Err(LayoutError::WidthMismatch { name, kind, expected, width });
                }
            }
            if index.contains_key(&name) {
                return Err(LayoutError::DuplicateField(name));
            }
            index.insert(name.clone(), out.len());
            out.push(Field { name, kind, width, offset });
            offset += width;
        }
        if out.is_empty() {
            return Err(LayoutError::Empty);
        }
        Ok(Self { fields: out, index, total_size: offset })
    }

    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::default()
    }

    /// Size in bytes of every block under this layout.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Result<&Field, UnknownFieldError> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| UnknownFieldError(name.to_owned()))
    }

    pub fn offset_of(&self, name: &str) -> Result<usize, UnknownFieldError> {
        self.field(name).map(|f| f.offset)
    }

    /// Split a byte length into whole records and the trailing remainder.
    pub fn split_len(&self, byte_len: u64) -> (u64, u64) {
        let size = self.total_size as u64;
        (byte_len / size, byte_len % size)
    }
}

/// Fluent builder over [`RecordLayout::define`].
#[derive(Debug, Default, Clone)]
pub struct LayoutBuilder {
    fields: Vec<(String, FieldKind, usize)>,
}

impl LayoutBuilder {
    pub fn u32(mut self, name: &str) -> Self {
        self.fields.push((name.to_owned(), FieldKind::U32, 4));
        self
    }

    pub fn f64(mut self, name: &str) -> Self {
        self.fields.push((name.to_owned(), FieldKind::F64, 8));
        self
    }

    pub fn text(mut self, name: &str, width: usize) -> Self {
        self.fields.push((name.to_owned(), FieldKind::Text, width));
        self
    }

    pub fn u8(mut self, name: &str) -> Self {
        self.fields.push((name.to_owned(), FieldKind::U8, 1));
        self
    }

    pub fn build(self) -> Result<RecordLayout, LayoutError> {
        RecordLayout::define(self.fields)
    }
}
