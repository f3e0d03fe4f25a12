//! Encode and decode fixed-width blocks under a [`RecordLayout`].
//!
//! Block format, per field in layout order:
//! - `u32`: 4 bytes little-endian
//! - `f64`: 8 bytes IEEE-754 little-endian
//! - `text`: UTF-8 bytes truncated to the field width (never inside a
//!   character), right-padded with `0x00`
//! - `u8`: 1 byte
//!
//! There is no framing, version or checksum inside a block; its length is
//! always `layout.total_size()`.
use crate::error::{DecodeError, EncodeError, Result};
use crate::layout::{Field, FieldKind, RecordLayout};
use crate::value::{Record, Value};

/// Encode `record` into a freshly allocated block.
pub fn encode(layout: &RecordLayout, record: &Record) -> std::result::Result<Vec<u8>, EncodeError> {
    let mut block = vec![0u8; layout.total_size()];
    encode_into(layout, record, &mut block)?;
    Ok(block)
}

/// Encode `record` into `block`, which must be exactly `layout.total_size()` bytes.
pub fn encode_into(layout: &RecordLayout, record: &Record, block: &mut [u8]) -> std::result::Result<(), EncodeError> {
    if block.len() != layout.total_size() {
        return Err(EncodeError::BufferSize { expected: layout.total_size(), actual: block.len() });
    }
    for field in layout.fields() {
        let value = record.get(&field.name).ok_or_else(|| EncodeError::MissingField(field.name.clone()))?;
        write_value(field, value, &mut block[field.range()])?;
    }
    Ok(())
}

/// Decode a whole block back into a [`Record`] in layout order.
pub fn decode(layout: &RecordLayout, block: &[u8]) -> std::result::Result<Record, DecodeError> {
    if block.len() != layout.total_size() {
        return Err(DecodeError::LengthMismatch { expected: layout.total_size(), actual: block.len() });
    }
    let mut record = Record::with_capacity(layout.len());
    for field in layout.fields() {
        record.set(&field.name, read_value(field.kind, &block[field.range()]));
    }
    Ok(record)
}

/// Decode a single field by name, reading only that field's bytes.
pub fn decode_field(layout: &RecordLayout, block: &[u8], name: &str) -> Result<Value> {
    Ok(layout.field(name)?.read(block)?)
}

/// Largest integer magnitude an `f64` holds exactly.
const F64_EXACT_INT: i64 = 1 << 53;

fn overflow(field: &Field, value: i128) -> EncodeError {
    EncodeError::Overflow { name: field.name.clone(), kind: field.kind, value }
}

fn mismatch(field: &Field, value: &Value) -> EncodeError {
    EncodeError::KindMismatch { name: field.name.clone(), kind: field.kind, found: value.kind_name() }
}

fn write_value(field: &Field, value: &Value, dst: &mut [u8]) -> std::result::Result<(), EncodeError> {
    match field.kind {
        FieldKind::U32 => {
            let v = match *value {
                Value::U32(v) => v,
                Value::U8(v) => v as u32,
                Value::Int(v) => u32::try_from(v).map_err(|_| overflow(field, v as i128))?,
                _ => return Err(mismatch(field, value)),
            };
            dst.copy_from_slice(&v.to_le_bytes());
        }
        FieldKind::F64 => {
            let v = match *value {
                Value::F64(v) => v,
                Value::U32(v) => v as f64,
                Value::U8(v) => v as f64,
                Value::Int(v) if v.unsigned_abs() <= F64_EXACT_INT as u64 => v as f64,
                Value::Int(v) => return Err(overflow(field, v as i128)),
                Value::Text(_) => return Err(mismatch(field, value)),
            };
            dst.copy_from_slice(&v.to_le_bytes());
        }
        FieldKind::U8 => {
            dst[0] = match *value {
                Value::U8(v) => v,
                Value::U32(v) => u8::try_from(v).map_err(|_| overflow(field, v as i128))?,
                Value::Int(v) => u8::try_from(v).map_err(|_| overflow(field, v as i128))?,
                _ => return Err(mismatch(field, value)),
            };
        }
        FieldKind::Text => {
            let Value::Text(s) = value else { return Err(mismatch(field, value)) };
            let bytes = truncate_utf8(s, dst.len());
            dst[..bytes.len()].copy_from_slice(bytes);
            dst[bytes.len()..].fill(0);
        }
    }
    Ok(())
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
fn truncate_utf8(s: &str, max: usize) -> &[u8] {
    if s.len() <= max {
        return s.as_bytes();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s.as_bytes()[..end]
}

/// Convert the raw bytes of one field. `bytes` is exactly the field's width.
pub(crate) fn read_value(kind: FieldKind, bytes: &[u8]) -> Value {
    match kind {
        FieldKind::U32 => {
            let mut tmp = [0u8; 4];
            tmp.copy_from_slice(&bytes[..4]);
            Value::U32(u32::from_le_bytes(tmp))
        }
        FieldKind::F64 => {
            let mut tmp = [0u8; 8];
            tmp.copy_from_slice(&bytes[..8]);
            Value::F64(f64::from_le_bytes(tmp))
        }
        FieldKind::U8 => Value::U8(bytes[0]),
        FieldKind::Text => {
            let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            Value::Text(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UnknownFieldError};

    fn small() -> RecordLayout {
        RecordLayout::builder().u32("id").f64("price").u8("code").build().unwrap()
    }

    #[test]
    fn small_layout_roundtrip() {
        let l = small();
        let r = Record::new().with("id", 7u32).with("price", 19.99).with("code", 2u8);
        let block = encode(&l, &r).unwrap();
        assert_eq!(block.len(), 13);
        assert_eq!(&block[0..4], &7u32.to_le_bytes());
        assert_eq!(&block[4..12], &19.99f64.to_le_bytes());
        assert_eq!(block[12], 2);
        assert_eq!(decode(&l, &block).unwrap(), r);
    }

    #[test]
    fn decode_field_reads_only_its_bytes() {
        let l = small();
        let r = Record::new().with("id", 7u32).with("price", 19.99).with("code", 2u8);
        let mut block = encode(&l, &r).unwrap();
        // scribble over every byte outside the price field
        block[0..4].fill(0xFF);
        block[12] = 0xFF;
        assert_eq!(decode_field(&l, &block, "price").unwrap(), Value::F64(19.99));
        // a block cut right after the price field is still enough
        assert_eq!(decode_field(&l, &block[..12], "price").unwrap(), Value::F64(19.99));
    }

    #[test]
    fn decode_field_errors() {
        let l = small();
        let block = vec![0u8; 13];
        assert!(matches!(decode_field(&l, &block, "nope"), Err(Error::UnknownField(UnknownFieldError(n))) if n == "nope"));
        assert!(matches!(
            decode_field(&l, &block[..8], "price"),
            Err(Error::Decode(DecodeError::ShortBlock { needed: 12, actual: 8, .. }))
        ));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let l = small();
        assert_eq!(decode(&l, &[0u8; 12]), Err(DecodeError::LengthMismatch { expected: 13, actual: 12 }));
        assert_eq!(decode(&l, &[0u8; 14]), Err(DecodeError::LengthMismatch { expected: 13, actual: 14 }));
    }

    #[test]
    fn text_is_padded_truncated_and_trimmed() {
        let l = RecordLayout::builder().text("name", 6).u8("flag").build().unwrap();
        let block = encode(&l, &Record::new().with("name", "ab").with("flag", 1u8)).unwrap();
        assert_eq!(&block[..6], b"ab\0\0\0\0");
        assert_eq!(decode(&l, &block).unwrap().get("name"), Some(&Value::Text("ab".into())));

        let block = encode(&l, &Record::new().with("name", "abcdefgh").with("flag", 1u8)).unwrap();
        assert_eq!(block.len(), 7);
        assert_eq!(decode_field(&l, &block, "name").unwrap(), Value::Text("abcdef".into()));

        // "Maitê" is 6 bytes; cutting at 5 would split the ê
        let l = RecordLayout::builder().text("name", 5).build().unwrap();
        let block = encode(&l, &Record::new().with("name", "Maitê")).unwrap();
        assert_eq!(&block, b"Mait\0");
        assert_eq!(decode_field(&l, &block, "name").unwrap(), Value::Text("Mait".into()));
    }

    #[test]
    fn empty_text_is_all_nulls() {
        let l = RecordLayout::builder().text("coupon", 8).build().unwrap();
        let block = encode(&l, &Record::new().with("coupon", "")).unwrap();
        assert_eq!(block, vec![0u8; 8]);
        assert_eq!(decode_field(&l, &block, "coupon").unwrap(), Value::Text(String::new()));
    }

    #[test]
    fn encode_errors() {
        let l = small();
        let missing = Record::new().with("id", 1u32).with("price", 1.0);
        assert_eq!(encode(&l, &missing), Err(EncodeError::MissingField("code".into())));

        let too_big = Record::new().with("id", 1i64 << 32).with("price", 1.0).with("code", 0u8);
        assert_eq!(
            encode(&l, &too_big),
            Err(EncodeError::Overflow { name: "id".into(), kind: FieldKind::U32, value: 1 << 32 })
        );

        let negative = Record::new().with("id", -1i64).with("price", 1.0).with("code", 0u8);
        assert!(matches!(encode(&l, &negative), Err(EncodeError::Overflow { value: -1, .. })));

        let wide_code = Record::new().with("id", 1u32).with("price", 1.0).with("code", 256u32);
        assert!(matches!(encode(&l, &wide_code), Err(EncodeError::Overflow { kind: FieldKind::U8, .. })));

        let text_id = Record::new().with("id", "seven").with("price", 1.0).with("code", 0u8);
        assert_eq!(
            encode(&l, &text_id),
            Err(EncodeError::KindMismatch { name: "id".into(), kind: FieldKind::U32, found: "text" })
        );
    }

    #[test]
    fn loose_integers_are_accepted_when_in_range() {
        let l = small();
        let r = Record::new().with("id", 42i64).with("price", 3i64).with("code", 4i64);
        let out = decode(&l, &encode(&l, &r).unwrap()).unwrap();
        assert_eq!(out.get("id"), Some(&Value::U32(42)));
        assert_eq!(out.get("price"), Some(&Value::F64(3.0)));
        assert_eq!(out.get("code"), Some(&Value::U8(4)));
    }

    #[test]
    fn integers_beyond_f64_precision_are_rejected() {
        let l = RecordLayout::builder().f64("total").build().unwrap();
        let exact = 1i64 << 53;
        for v in [exact, -exact] {
            let block = encode(&l, &Record::new().with("total", v)).unwrap();
            assert_eq!(decode_field(&l, &block, "total").unwrap(), Value::F64(v as f64));
        }
        for v in [exact + 1, -exact - 1, i64::MAX, i64::MIN] {
            assert_eq!(
                encode(&l, &Record::new().with("total", v)),
                Err(EncodeError::Overflow { name: "total".into(), kind: FieldKind::F64, value: v as i128 })
            );
        }
    }

    #[test]
    fn encode_into_checks_buffer() {
        let l = small();
        let r = Record::new().with("id", 1u32).with("price", 1.0).with("code", 0u8);
        let mut buf = [0u8; 10];
        assert_eq!(encode_into(&l, &r, &mut buf), Err(EncodeError::BufferSize { expected: 13, actual: 10 }));
    }

    #[test]
    fn extra_record_fields_are_ignored() {
        let l = small();
        let r = Record::new().with("id", 1u32).with("price", 1.0).with("code", 0u8).with("note", "x");
        assert_eq!(encode(&l, &r).unwrap().len(), l.total_size());
    }
}
