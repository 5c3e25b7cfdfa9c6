//! Minimal protobuf wire-format reader.
//!
//! Hand-rolled rather than generated: the decoder's job per spec is to
//! tolerate unknown fields by wire type and to fail with a typed error on
//! truncated/overflowing input, which is easiest to guarantee by owning
//! the byte-level walk rather than going through a derive macro.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEof(usize),
    #[error("varint overflowed 64 bits at offset {0}")]
    VarintOverflow(usize),
    #[error("unsupported wire type {0} at offset {1}")]
    InvalidWireType(u64, usize),
    #[error("length-delimited field length {0} overruns the buffer")]
    LengthOverrun(usize),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// A wire type as defined by the protobuf encoding spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    fn from_u64(v: u64, offset: usize) -> DecodeResult<WireType> {
        match v {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(DecodeError::InvalidWireType(other, offset)),
        }
    }
}

/// A cursor over a byte slice with protobuf-aware primitives.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Read a base-128 varint, tolerating both 32- and 64-bit encodings
    /// uniformly as `u64` (callers narrow later).
    pub fn read_varint(&mut self) -> DecodeResult<u64> {
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            if shift >= 64 || (shift == 63 && byte > 1) {
                return Err(DecodeError::VarintOverflow(self.pos));
            }
            result |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or(DecodeError::UnexpectedEof(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    /// Read `(field_number, wire_type)` from a varint-encoded tag.
    pub fn read_tag(&mut self) -> DecodeResult<(u64, WireType)> {
        let tag = self.read_varint()?;
        let wire_type = WireType::from_u64(tag & 0x7, self.pos)?;
        Ok((tag >> 3, wire_type))
    }

    /// Read a length-delimited field's payload as a byte slice.
    pub fn read_bytes(&mut self) -> DecodeResult<&'a [u8]> {
        let len = self.read_varint()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&e| e <= self.buf.len())
            .ok_or(DecodeError::LengthOverrun(len))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_fixed64(&mut self) -> DecodeResult<u64> {
        if self.pos + 8 > self.buf.len() {
            return Err(DecodeError::UnexpectedEof(self.pos));
        }
        let bytes: [u8; 8] = self.buf[self.pos..self.pos + 8]
            .try_into()
            .map_err(|_| DecodeError::UnexpectedEof(self.pos))?;
        self.pos += 8;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_fixed32(&mut self) -> DecodeResult<u32> {
        if self.pos + 4 > self.buf.len() {
            return Err(DecodeError::UnexpectedEof(self.pos));
        }
        let bytes: [u8; 4] = self.buf[self.pos..self.pos + 4]
            .try_into()
            .map_err(|_| DecodeError::UnexpectedEof(self.pos))?;
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Skip a field's payload given its wire type, without interpreting it.
    pub fn skip_field(&mut self, wire_type: WireType) -> DecodeResult<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.read_fixed64()?;
            }
            WireType::LengthDelimited => {
                self.read_bytes()?;
            }
            WireType::Fixed32 => {
                self.read_fixed32()?;
            }
        }
        Ok(())
    }
}

/// Decode a packed-or-unpacked repeated varint field. pprof encoders may
/// emit `Sample.location_id`/`value` either packed (single
/// length-delimited blob of varints) or unpacked (one varint per tag) —
/// callers pass the wire type they just read to pick the right path.
pub fn read_repeated_varint(
    reader: &mut Reader<'_>,
    wire_type: WireType,
    out: &mut Vec<u64>,
) -> DecodeResult<()> {
    match wire_type {
        WireType::LengthDelimited => {
            let bytes = reader.read_bytes()?;
            let mut inner = Reader::new(bytes);
            while !inner.is_empty() {
                out.push(inner.read_varint()?);
            }
            Ok(())
        }
        WireType::Varint => {
            out.push(reader.read_varint()?);
            Ok(())
        }
        other => Err(DecodeError::InvalidWireType(wire_type_tag(other), reader.offset())),
    }
}

fn wire_type_tag(wt: WireType) -> u64 {
    match wt {
        WireType::Varint => 0,
        WireType::Fixed64 => 1,
        WireType::LengthDelimited => 2,
        WireType::Fixed32 => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_roundtrip_small() {
        let mut r = Reader::new(&[0x01]);
        assert_eq!(r.read_varint().unwrap(), 1);
    }

    #[test]
    fn varint_multi_byte() {
        // 300 = 0b1_0010_1100 -> LSB group 0101100 | cont, next group 10
        let mut r = Reader::new(&[0xac, 0x02]);
        assert_eq!(r.read_varint().unwrap(), 300);
    }

    #[test]
    fn varint_overflow_detected() {
        let bytes = [0xff; 11];
        let mut r = Reader::new(&bytes);
        assert!(matches!(
            r.read_varint(),
            Err(DecodeError::VarintOverflow(_))
        ));
    }

    #[test]
    fn unexpected_eof_on_truncated_varint() {
        let mut r = Reader::new(&[0x80]);
        assert!(matches!(r.read_varint(), Err(DecodeError::UnexpectedEof(_))));
    }

    #[test]
    fn length_delimited_overrun_is_an_error() {
        // length byte says 10 bytes follow, but only 1 is present
        let mut r = Reader::new(&[0x0a, 0x01]);
        assert!(matches!(r.read_bytes(), Err(DecodeError::LengthOverrun(_))));
    }

    #[test]
    fn tag_decodes_field_number_and_wire_type() {
        // field 1, wire type 2 (length-delimited): (1 << 3) | 2 = 0x0a
        let mut r = Reader::new(&[0x0a]);
        let (field, wt) = r.read_tag().unwrap();
        assert_eq!(field, 1);
        assert_eq!(wt, WireType::LengthDelimited);
    }

    #[test]
    fn invalid_wire_type_rejected() {
        // wire type 6 is not defined
        let mut r = Reader::new(&[0x0e]);
        assert!(matches!(r.read_tag(), Err(DecodeError::InvalidWireType(6, _))));
    }

    #[test]
    fn skip_field_advances_past_unknown_fields() {
        let mut r = Reader::new(&[0x03, b'a', b'b', b'c', 0x2a]);
        r.skip_field(WireType::LengthDelimited).unwrap();
        assert_eq!(r.read_varint().unwrap(), 0x2a);
    }
}
