//! Little-endian binary reader and writer
//!
//! Shared by the ABI decoder and the transaction hasher. Variable-length
//! fields are prefixed with a LEB128 `varuint32` length.

use crate::{Error, Result};

/// Cursor over a byte slice
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Take the next `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::AbiDecode(format!(
                "unexpected end of data: need {} bytes at offset {}, {} left",
                len,
                self.position,
                self.remaining()
            )));
        }
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// LEB128 unsigned 32-bit integer
    pub fn read_varuint32(&mut self) -> Result<u32> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 35 {
                return Err(Error::AbiDecode("varuint32 is too long".into()));
            }
        }
        u32::try_from(value).map_err(|_| Error::AbiDecode("varuint32 overflow".into()))
    }

    /// Length-prefixed byte string
    pub fn read_blob(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varuint32()? as usize;
        self.read_bytes(len)
    }

    /// Length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_blob()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::AbiDecode(format!("invalid utf-8 string: {}", e)))
    }
}

/// Growable little-endian output buffer
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_varuint32(&mut self, mut v: u32) -> &mut Self {
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if v == 0 {
                break;
            }
        }
        self
    }

    /// Length-prefixed byte string. Lengths above `u32::MAX` are not
    /// representable on the wire and are clamped.
    pub fn write_blob(&mut self, bytes: &[u8]) -> &mut Self {
        let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        self.write_varuint32(len);
        self.buf.extend_from_slice(&bytes[..len as usize]);
        self
    }

    pub fn write_string(&mut self, s: &str) -> &mut Self {
        self.write_blob(s.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
