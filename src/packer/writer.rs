//! MessagePack serialization of an object tree.

use bytes::BufMut;

use crate::config::WireFormat;
use crate::error::{Error, Result};
use crate::object::{Arena, Object, RawKind};

/// Writes objects into an output buffer using the smallest encoding for
/// each integer and length.
pub(crate) struct Writer<'a> {
    buf: &'a mut Vec<u8>,
    format: WireFormat,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut Vec<u8>, format: WireFormat) -> Self {
        Self { buf, format }
    }

    pub(crate) fn write(&mut self, arena: &Arena, object: &Object) -> Result<()> {
        match object {
            Object::Vacant => {
                return Err(Error::Serialization {
                    message: "object slot was never filled".to_owned(),
                });
            }
            Object::Nil => self.buf.put_u8(0xc0),
            Object::Boolean(b) => self.buf.put_u8(if *b { 0xc3 } else { 0xc2 }),
            Object::PositiveInteger(n) => self.write_u64(*n),
            Object::NegativeInteger(n) => self.write_i64(*n),
            Object::Float(f) => {
                self.buf.put_u8(0xcb);
                self.buf.put_f64(*f);
            }
            Object::Raw(raw) => self.write_raw(arena.raw_bytes(raw), raw.kind())?,
            Object::Array { len, .. } => {
                let len = wire_len(*len, "array")?;
                if len < 16 {
                    self.buf.put_u8(0x90 | len as u8);
                } else {
                    self.write_len16_32(0xdc, 0xdd, len);
                }
                for child in arena.children(object) {
                    self.write(arena, child)?;
                }
            }
            Object::Map { len, .. } => {
                let len = wire_len(*len, "map")?;
                if len < 16 {
                    self.buf.put_u8(0x80 | len as u8);
                } else {
                    self.write_len16_32(0xde, 0xdf, len);
                }
                for child in arena.children(object) {
                    self.write(arena, child)?;
                }
            }
        }
        Ok(())
    }

    fn write_u64(&mut self, n: u64) {
        if n < 0x80 {
            self.buf.put_u8(n as u8);
        } else if n <= u8::MAX as u64 {
            self.buf.put_u8(0xcc);
            self.buf.put_u8(n as u8);
        } else if n <= u16::MAX as u64 {
            self.buf.put_u8(0xcd);
            self.buf.put_u16(n as u16);
        } else if n <= u32::MAX as u64 {
            self.buf.put_u8(0xce);
            self.buf.put_u32(n as u32);
        } else {
            self.buf.put_u8(0xcf);
            self.buf.put_u64(n);
        }
    }

    fn write_i64(&mut self, n: i64) {
        if n < -(1 << 5) {
            if n < -(1 << 15) {
                if n < -(1 << 31) {
                    self.buf.put_u8(0xd3);
                    self.buf.put_i64(n);
                } else {
                    self.buf.put_u8(0xd2);
                    self.buf.put_i32(n as i32);
                }
            } else if n < -(1 << 7) {
                self.buf.put_u8(0xd1);
                self.buf.put_i16(n as i16);
            } else {
                self.buf.put_u8(0xd0);
                self.buf.put_i8(n as i8);
            }
        } else if n < (1 << 7) {
            // positive or negative fixint
            self.buf.put_i8(n as i8);
        } else {
            self.write_u64(n as u64);
        }
    }

    fn write_raw(&mut self, bytes: &[u8], kind: RawKind) -> Result<()> {
        let len = wire_len(bytes.len(), "raw")?;
        match (self.format, kind) {
            (WireFormat::Modern, RawKind::Binary) => {
                if len <= u8::MAX as u32 {
                    self.buf.put_u8(0xc4);
                    self.buf.put_u8(len as u8);
                } else {
                    self.write_len16_32(0xc5, 0xc6, len);
                }
            }
            (WireFormat::Modern, RawKind::Text) => {
                if len < 32 {
                    self.buf.put_u8(0xa0 | len as u8);
                } else if len <= u8::MAX as u32 {
                    self.buf.put_u8(0xd9);
                    self.buf.put_u8(len as u8);
                } else {
                    self.write_len16_32(0xda, 0xdb, len);
                }
            }
            (WireFormat::Legacy, _) => {
                if len < 32 {
                    self.buf.put_u8(0xa0 | len as u8);
                } else {
                    self.write_len16_32(0xda, 0xdb, len);
                }
            }
        }
        self.buf.put_slice(bytes);
        Ok(())
    }

    fn write_len16_32(&mut self, tag16: u8, tag32: u8, len: u32) {
        if len <= u16::MAX as u32 {
            self.buf.put_u8(tag16);
            self.buf.put_u16(len as u16);
        } else {
            self.buf.put_u8(tag32);
            self.buf.put_u32(len);
        }
    }
}

fn wire_len(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::Serialization {
        message: format!("{what} length {len} exceeds the 32-bit wire limit"),
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::object::Raw;

    fn encode(object: &Object, format: WireFormat) -> Vec<u8> {
        let arena = Arena::new();
        let mut buf = Vec::new();
        Writer::new(&mut buf, format).write(&arena, object).unwrap();
        buf
    }

    fn int(n: i64) -> Vec<u8> {
        if n > 0 {
            encode(&Object::PositiveInteger(n as u64), WireFormat::Legacy)
        } else {
            encode(&Object::NegativeInteger(n), WireFormat::Legacy)
        }
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(int(0), [0x00]);
        assert_eq!(int(127), [0x7f]);
        assert_eq!(int(128), [0xcc, 0x80]);
        assert_eq!(int(256), [0xcd, 0x01, 0x00]);
        assert_eq!(int(65536), [0xce, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(int(1 << 32)[0], 0xcf);
        assert_eq!(int(-1), [0xff]);
        assert_eq!(int(-32), [0xe0]);
        assert_eq!(int(-33), [0xd0, 0xdf]);
        assert_eq!(int(-129), [0xd1, 0xff, 0x7f]);
        assert_eq!(int(-32769)[0], 0xd2);
        assert_eq!(int(i64::MIN)[0], 0xd3);
    }

    #[test]
    fn test_float_is_always_64_bit() {
        let bytes = encode(&Object::Float(1.5), WireFormat::Legacy);
        assert_eq!(bytes[0], 0xcb);
        assert_eq!(bytes.len(), 9);
    }

    #[test]
    fn test_raw_headers_by_format() {
        let text = Raw::shared(Bytes::from(vec![b'a'; 40]), RawKind::Text);
        let bin = Raw::shared(Bytes::from(vec![0u8; 3]), RawKind::Binary);

        assert_eq!(encode(&Object::Raw(text.clone()), WireFormat::Legacy)[..3], [0xda, 0, 40]);
        assert_eq!(encode(&Object::Raw(text), WireFormat::Modern)[..2], [0xd9, 40]);
        assert_eq!(encode(&Object::Raw(bin.clone()), WireFormat::Legacy)[0], 0xa3);
        assert_eq!(encode(&Object::Raw(bin), WireFormat::Modern)[..2], [0xc4, 3]);
    }

    #[test]
    fn test_vacant_slot_fails() {
        let arena = Arena::new();
        let mut buf = Vec::new();
        let err = Writer::new(&mut buf, WireFormat::Legacy)
            .write(&arena, &Object::Vacant)
            .unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }
}
