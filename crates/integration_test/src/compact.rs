//! A compact, self-describing binary driver.
//!
//! # Format Overview
//!
//! Every value starts with a one-byte tag, followed by its payload:
//!
//! - **Integers**: LEB128-style varints; signed integers are zigzag encoded
//!   first. With `optimum_size`, integers in `0..0x80` are written as the
//!   bare tag byte.
//! - **Floats**: little-endian IEEE 754. With `optimum_size`, an `f64` that
//!   fits an `f32` exactly is written as an `f32`.
//! - **Strings/bytes/extensions**: varint length, then the bytes.
//! - **Containers**: varint element count; maps count key/value pairs.
//! - **Times**: zigzag varint seconds since the Unix epoch, then varint
//!   subsecond nanoseconds.
//!
//! [`tokens`] reads the format back into a flat [`Token`] list for
//! assertions.

use std::{
    io::{self, Read, Write},
    time::{SystemTime, UNIX_EPOCH},
};

use trellis_codec::{CodecOptions, Driver, EncWriter};

/// Leading bytes of each encoded value.
pub mod tag {
    pub const NIL: u8 = 0xc0;
    pub const FALSE: u8 = 0xc2;
    pub const TRUE: u8 = 0xc3;
    pub const BYTES: u8 = 0xc4;
    pub const EXT: u8 = 0xc7;
    pub const F32: u8 = 0xca;
    pub const F64: u8 = 0xcb;
    pub const INT: u8 = 0xd0;
    pub const UINT: u8 = 0xd1;
    pub const TIME: u8 = 0xd6;
    pub const STR: u8 = 0xd9;
    pub const ARRAY: u8 = 0xdc;
    pub const MAP: u8 = 0xde;
}

// =============================================================================
// Varint helper functions
// =============================================================================

const MAX_VARINT_U64_BYTES: usize = 10;

/// Encodes an unsigned 64-bit integer as a varint into the buffer.
/// Returns the number of bytes written.
#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn encode_varint_u64(
    mut value: u64,
    buf: &mut [u8; MAX_VARINT_U64_BYTES],
) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

#[inline]
#[allow(clippy::cast_sign_loss)]
const fn zigzag_encode_i64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
#[allow(clippy::cast_possible_wrap)]
const fn zigzag_decode_i64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ (-((value & 1) as i64))
}

fn emit_varint(w: &mut EncWriter, value: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT_U64_BYTES];
    let len = encode_varint_u64(value, &mut buf);
    w.write_all(&buf[..len])
}

fn emit_len(w: &mut EncWriter, len: usize) -> io::Result<()> {
    emit_varint(w, len as u64)
}

/// Splits a time into whole seconds relative to the epoch and a
/// non-negative subsecond part.
fn split_time(time: SystemTime) -> (i64, u32) {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => {
            (i64::try_from(d.as_secs()).unwrap_or(i64::MAX), d.subsec_nanos())
        }
        Err(before) => {
            let d = before.duration();
            let secs = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);

            if d.subsec_nanos() == 0 {
                (-secs, 0)
            } else {
                (-secs - 1, 1_000_000_000 - d.subsec_nanos())
            }
        }
    }
}

// =============================================================================
// Compact
// =============================================================================

/// The compact binary driver.
#[derive(Debug, Default)]
pub struct Compact {
    optimum_size: bool,
    finished: usize,
}

impl Compact {
    /// Number of times the end-of-encode hook has run.
    #[must_use]
    pub const fn finished(&self) -> usize { self.finished }

    fn emit_tagged(
        w: &mut EncWriter,
        tag: u8,
        payload: &[u8],
    ) -> io::Result<()> {
        w.write_u8(tag)?;
        emit_len(w, payload.len())?;
        w.write_all(payload)
    }
}

impl Driver for Compact {
    fn encode_nil(&mut self, w: &mut EncWriter) -> io::Result<()> {
        w.write_u8(tag::NIL)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn encode_int(&mut self, w: &mut EncWriter, v: i64) -> io::Result<()> {
        if self.optimum_size && (0..0x80).contains(&v) {
            return w.write_u8(v as u8);
        }

        w.write_u8(tag::INT)?;
        emit_varint(w, zigzag_encode_i64(v))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_uint(&mut self, w: &mut EncWriter, v: u64) -> io::Result<()> {
        if self.optimum_size && v < 0x80 {
            return w.write_u8(v as u8);
        }

        w.write_u8(tag::UINT)?;
        emit_varint(w, v)
    }

    fn encode_bool(&mut self, w: &mut EncWriter, v: bool) -> io::Result<()> {
        w.write_u8(if v { tag::TRUE } else { tag::FALSE })
    }

    fn encode_f32(&mut self, w: &mut EncWriter, v: f32) -> io::Result<()> {
        w.write_u8(tag::F32)?;
        w.write_all(&v.to_le_bytes())
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn encode_f64(&mut self, w: &mut EncWriter, v: f64) -> io::Result<()> {
        let narrow = v as f32;
        if self.optimum_size && f64::from(narrow) == v {
            return self.encode_f32(w, narrow);
        }

        w.write_u8(tag::F64)?;
        w.write_all(&v.to_le_bytes())
    }

    fn encode_string(&mut self, w: &mut EncWriter, v: &str) -> io::Result<()> {
        Self::emit_tagged(w, tag::STR, v.as_bytes())
    }

    fn encode_string_bytes_raw(
        &mut self,
        w: &mut EncWriter,
        v: &[u8],
    ) -> io::Result<()> {
        Self::emit_tagged(w, tag::BYTES, v)
    }

    fn encode_time(
        &mut self,
        w: &mut EncWriter,
        v: SystemTime,
    ) -> io::Result<()> {
        let (secs, nanos) = split_time(v);

        w.write_u8(tag::TIME)?;
        emit_varint(w, zigzag_encode_i64(secs))?;
        emit_varint(w, u64::from(nanos))
    }

    fn encode_ext(
        &mut self,
        w: &mut EncWriter,
        tag: u64,
        data: &[u8],
    ) -> io::Result<()> {
        w.write_u8(tag::EXT)?;
        emit_varint(w, tag)?;
        emit_len(w, data.len())?;
        w.write_all(data)
    }

    fn write_array_start(
        &mut self,
        w: &mut EncWriter,
        len: usize,
    ) -> io::Result<()> {
        w.write_u8(tag::ARRAY)?;
        emit_len(w, len)
    }

    fn write_map_start(
        &mut self,
        w: &mut EncWriter,
        len: usize,
    ) -> io::Result<()> {
        w.write_u8(tag::MAP)?;
        emit_len(w, len)
    }

    fn reset(&mut self, options: &CodecOptions) {
        self.optimum_size = options.optimum_size;
    }

    fn at_end_of_encode(&mut self, _: &mut EncWriter) -> io::Result<()> {
        self.finished += 1;
        Ok(())
    }
}

// =============================================================================
// Reading back
// =============================================================================

/// One decoded item of the compact format. Containers are flattened: a
/// `Map(n)` is followed by its `2 * n` keys and values.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Time(i64, u32),
    Ext(u64, Vec<u8>),
    Array(usize),
    Map(usize),
}

impl Token {
    /// Shorthand for a string token.
    #[must_use]
    pub fn str(s: &str) -> Self { Self::Str(s.to_owned()) }
}

struct Reader<R> {
    reader: R,
}

impl<R: Read> Reader<R> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn expect_byte(&mut self) -> io::Result<u8> {
        self.read_byte()?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "truncated value")
        })
    }

    fn read_varint_u64(&mut self) -> io::Result<u64> {
        let mut result: u64 = 0;
        let mut shift = 0;

        loop {
            let byte = self.expect_byte()?;

            if shift >= 64 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "varint too long for u64",
                ));
            }

            result |= u64::from(byte & 0x7F) << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }

            shift += 7;
        }
    }

    fn read_len(&mut self) -> io::Result<usize> {
        usize::try_from(self.read_varint_u64()?).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "length overflow")
        })
    }

    fn read_payload(&mut self) -> io::Result<Vec<u8>> {
        let len = self.read_len()?;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_token(&mut self, first: u8) -> io::Result<Token> {
        Ok(match first {
            b if b < 0x80 => Token::Uint(u64::from(b)),
            tag::NIL => Token::Nil,
            tag::FALSE => Token::Bool(false),
            tag::TRUE => Token::Bool(true),
            tag::INT => {
                Token::Int(zigzag_decode_i64(self.read_varint_u64()?))
            }
            tag::UINT => Token::Uint(self.read_varint_u64()?),
            tag::F32 => Token::F32(f32::from_le_bytes(self.read_array()?)),
            tag::F64 => Token::F64(f64::from_le_bytes(self.read_array()?)),
            tag::STR => {
                let bytes = self.read_payload()?;
                Token::Str(String::from_utf8(bytes).map_err(|e| {
                    io::Error::new(io::ErrorKind::InvalidData, e)
                })?)
            }
            tag::BYTES => Token::Bytes(self.read_payload()?),
            tag::TIME => {
                let secs = zigzag_decode_i64(self.read_varint_u64()?);
                let nanos = u32::try_from(self.read_varint_u64()?).map_err(
                    |e| io::Error::new(io::ErrorKind::InvalidData, e),
                )?;
                Token::Time(secs, nanos)
            }
            tag::EXT => {
                let tag = self.read_varint_u64()?;
                Token::Ext(tag, self.read_payload()?)
            }
            tag::ARRAY => Token::Array(self.read_len()?),
            tag::MAP => Token::Map(self.read_len()?),
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown tag {other:#04x}"),
                ));
            }
        })
    }
}

/// Reads `bytes` back into a flat token list.
///
/// # Errors
///
/// Returns an error if `bytes` is not a sequence of well-formed values.
pub fn tokens(bytes: &[u8]) -> io::Result<Vec<Token>> {
    let mut reader = Reader { reader: bytes };
    let mut out = Vec::new();

    while let Some(first) = reader.read_byte()? {
        out.push(reader.read_token(first)?);
    }

    Ok(out)
}
