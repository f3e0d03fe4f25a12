//! Fixed-width sales record codec.
//!
//! This crate provides the core types and logic used by the `sales_records`
//! ETL binary and the `scan` tool:
//!
//! - `layout`: the field table (kind, width, offset) shared by writer and
//!   readers, so offsets are computed once instead of derived by hand
//! - `codec`: encode a record into a fixed-size block, decode it back, or
//!   decode a single field by offset without touching the rest of the block
//! - `reader`: chunked sequential reader that yields whole blocks and drops a
//!   truncated trailing record at end of stream
//! - `writer`: buffered appender of encoded blocks
//! - `record`: the canonical 192-byte sales-order layout and its enumerations
//! - `import`: parser for the order generator's CSV lines
//!
//! Record files are a flat sequence of blocks with no header, count or
//! checksum; the file size is a multiple of the record size when every
//! write completed.
pub mod codec;
pub mod error;
pub mod import;
pub mod layout;
pub mod logging;
pub mod reader;
pub mod record;
pub mod value;
pub mod writer;

pub use codec::{decode, decode_field, encode, encode_into};
pub use error::{DecodeError, EncodeError, Error, LayoutError, Result, UnknownFieldError};
pub use layout::{Field, FieldKind, LayoutBuilder, RecordLayout};
pub use reader::{ReaderOptions, RecordReader, DEFAULT_CHUNK_RECORDS, MAX_CHUNK_BYTES};
pub use record::{sales_order_layout, OrderStatus, PaymentMethod, SalesOrder};
pub use value::{Record, Value};
pub use writer::RecordWriter;
