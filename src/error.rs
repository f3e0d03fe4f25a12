//! Error types for layout definition, encoding, decoding and I/O.
//!
//! Each stage has its own error so callers can tell a bad field table
//! (raised once, at definition time) from a bad input record (local to one
//! record) or a corrupt block (fatal to the read session). [`Error`] wraps
//! all of them for code that drives a whole pipeline.
use crate::layout::FieldKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout has no fields")]
    Empty,
    #[error("field `{0}` has zero width")]
    ZeroWidth(String),
    #[error("duplicate field name `{0}`")]
    DuplicateField(String),
    #[error("field `{name}` of kind {kind} must be {expected} bytes wide, got {width}")]
    WidthMismatch { name: String, kind: FieldKind, expected: usize, width: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field `{0}`")]
pub struct UnknownFieldError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("record is missing field `{0}`")]
    MissingField(String),
    #[error("value {value} does not fit {kind} field `{name}`")]
    Overflow { name: String, kind: FieldKind, value: i128 },
    #[error("field `{name}` is {kind}, cannot store {found} value")]
    KindMismatch { name: String, kind: FieldKind, found: &'static str },
    #[error("output buffer is {actual} bytes, layout needs {expected}")]
    BufferSize { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("block is {actual} bytes, layout expects {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("block is {actual} bytes, field `{name}` needs {needed}")]
    ShortBlock { name: String, needed: usize, actual: usize },
    #[error("record has no field `{0}`")]
    MissingField(String),
    #[error("field `{name}` should hold a {expected} value")]
    UnexpectedKind { name: String, expected: FieldKind },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    UnknownField(#[from] UnknownFieldError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
