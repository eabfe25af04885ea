//! Binary wire codec shared by instruction payloads and account state.
//!
//! The format is fixed and versionless:
//! - integers are fixed-width little-endian
//! - strings are a 4-byte little-endian length followed by UTF-8 bytes
//! - options are a single tag byte: `0x00` absent, `0x01` followed by the payload
//! - booleans are `0x00` / `0x01`; any other byte is a framing error
//!
//! Messages carry no outer length prefix and no version byte, so the field
//! order of every message is part of the contract. Decoding never recovers
//! from a short buffer: the first field that does not fit fails the read.

use bytes::{Buf, BufMut};
use solana_program::pubkey::Pubkey;
use thiserror::Error;

/// Framing and decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("short buffer reading `{field}` at offset {offset}: need {needed} bytes, {remaining} remaining")]
    ShortBuffer {
        field: &'static str,
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid tag {tag:#04x} for `{field}` at offset {offset}")]
    InvalidTag {
        field: &'static str,
        offset: usize,
        tag: u8,
    },

    #[error("`{field}` at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str, offset: usize },

    #[error("`{field}` is {len} bytes, limit is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{remaining} trailing bytes after {what}")]
    TrailingBytes { what: &'static str, remaining: usize },

    #[error("unknown {what} discriminator {found:#04x}")]
    UnknownDiscriminator { what: &'static str, found: u8 },

    #[error("account discriminator mismatch for {type_name}: expected {}, found {}", hex::encode(.expected), hex::encode(.found))]
    DiscriminatorMismatch {
        type_name: &'static str,
        expected: [u8; 8],
        found: [u8; 8],
    },
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Encode a u64 as 8 little-endian bytes.
pub fn encode_u64(n: u64) -> [u8; 8] {
    n.to_le_bytes()
}

/// Encode a string as a 4-byte little-endian length followed by its UTF-8 bytes.
pub fn encode_length_prefixed_string(s: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.string(s);
    w.into_inner()
}

/// Encode an optional, already-encoded payload behind a one-byte presence tag.
pub fn encode_option(payload: Option<&[u8]>) -> Vec<u8> {
    match payload {
        None => vec![0x00],
        Some(p) => {
            let mut out = Vec::with_capacity(1 + p.len());
            out.push(0x01);
            out.extend_from_slice(p);
            out
        }
    }
}

/// Decode a u64 from the front of `data`.
pub fn decode_u64(data: &[u8]) -> CodecResult<u64> {
    Reader::new(data).u64("u64")
}

/// Decode a length-prefixed string from the front of `data`.
pub fn decode_length_prefixed_string(data: &[u8]) -> CodecResult<String> {
    Reader::new(data).string("string")
}

/// Append-only encoder.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Start a message with its one-byte operation discriminator.
    pub fn with_discriminator(tag: u8) -> Self {
        let mut w = Self::new();
        w.u8(tag);
        w
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.put_u8(v);
        self
    }

    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.buf.put_u8(u8::from(v));
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.put_u16_le(v);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.put_u32_le(v);
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.put_u64_le(v);
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.put_i64_le(v);
        self
    }

    pub fn u128(&mut self, v: u128) -> &mut Self {
        self.buf.put_u128_le(v);
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    pub fn pubkey(&mut self, key: &Pubkey) -> &mut Self {
        self.raw(key.as_ref())
    }

    /// Length-prefixed UTF-8. Length limits are enforced by the caller before encoding.
    pub fn string(&mut self, s: &str) -> &mut Self {
        // Payload strings are bounded far below u32::MAX by the message limits.
        self.buf.put_u32_le(s.len() as u32);
        self.buf.put_slice(s.as_bytes());
        self
    }

    pub fn option<T>(&mut self, v: Option<&T>, mut f: impl FnMut(&mut Self, &T)) -> &mut Self
    where
        T: ?Sized,
    {
        match v {
            None => {
                self.buf.put_u8(0);
            }
            Some(inner) => {
                self.buf.put_u8(1);
                f(self, inner);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor-style decoder that tracks the absolute offset for error context.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    rest: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { rest: data, offset: 0 }
    }

    /// Start reading at `offset`; fails if the buffer is shorter than that.
    pub fn at(data: &'a [u8], offset: usize, field: &'static str) -> CodecResult<Self> {
        let mut r = Self::new(data);
        r.skip(field, offset)?;
        Ok(r)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    fn need(&self, field: &'static str, needed: usize) -> CodecResult<()> {
        if self.rest.remaining() < needed {
            return Err(CodecError::ShortBuffer {
                field,
                offset: self.offset,
                needed,
                remaining: self.rest.remaining(),
            });
        }
        Ok(())
    }

    pub fn skip(&mut self, field: &'static str, n: usize) -> CodecResult<()> {
        self.need(field, n)?;
        self.rest.advance(n);
        self.offset += n;
        Ok(())
    }

    pub fn u8(&mut self, field: &'static str) -> CodecResult<u8> {
        self.need(field, 1)?;
        self.offset += 1;
        Ok(self.rest.get_u8())
    }

    pub fn bool(&mut self, field: &'static str) -> CodecResult<bool> {
        let offset = self.offset;
        match self.u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(CodecError::InvalidTag { field, offset, tag }),
        }
    }

    pub fn u16(&mut self, field: &'static str) -> CodecResult<u16> {
        self.need(field, 2)?;
        self.offset += 2;
        Ok(self.rest.get_u16_le())
    }

    pub fn u32(&mut self, field: &'static str) -> CodecResult<u32> {
        self.need(field, 4)?;
        self.offset += 4;
        Ok(self.rest.get_u32_le())
    }

    pub fn u64(&mut self, field: &'static str) -> CodecResult<u64> {
        self.need(field, 8)?;
        self.offset += 8;
        Ok(self.rest.get_u64_le())
    }

    pub fn i64(&mut self, field: &'static str) -> CodecResult<i64> {
        self.need(field, 8)?;
        self.offset += 8;
        Ok(self.rest.get_i64_le())
    }

    pub fn u128(&mut self, field: &'static str) -> CodecResult<u128> {
        self.need(field, 16)?;
        self.offset += 16;
        Ok(self.rest.get_u128_le())
    }

    pub fn array<const N: usize>(&mut self, field: &'static str) -> CodecResult<[u8; N]> {
        self.need(field, N)?;
        let mut out = [0u8; N];
        self.rest.copy_to_slice(&mut out);
        self.offset += N;
        Ok(out)
    }

    pub fn pubkey(&mut self, field: &'static str) -> CodecResult<Pubkey> {
        Ok(Pubkey::new_from_array(self.array::<32>(field)?))
    }

    pub fn string(&mut self, field: &'static str) -> CodecResult<String> {
        let len = self.u32(field)? as usize;
        let start = self.offset;
        self.need(field, len)?;
        let bytes = self.rest[..len].to_vec();
        self.rest.advance(len);
        self.offset += len;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 {
            field,
            offset: start,
        })
    }

    pub fn option<T>(
        &mut self,
        field: &'static str,
        f: impl FnOnce(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Option<T>> {
        let offset = self.offset;
        match self.u8(field)? {
            0 => Ok(None),
            1 => f(self).map(Some),
            tag => Err(CodecError::InvalidTag { field, offset, tag }),
        }
    }

    /// Require that the whole buffer was consumed.
    pub fn finish(&self, what: &'static str) -> CodecResult<()> {
        if !self.rest.is_empty() {
            return Err(CodecError::TrailingBytes {
                what,
                remaining: self.rest.len(),
            });
        }
        Ok(())
    }
}

/// Reject a string field longer than `max` bytes.
pub fn check_len(field: &'static str, s: &str, max: usize) -> CodecResult<()> {
    if s.len() > max {
        return Err(CodecError::TooLong {
            field,
            len: s.len(),
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn u64_is_little_endian() {
        assert_eq!(encode_u64(1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_u64(0x0102), [2, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn string_has_u32_prefix() {
        assert_eq!(encode_length_prefixed_string("ab"), vec![2, 0, 0, 0, b'a', b'b']);
        assert_eq!(encode_length_prefixed_string(""), vec![0, 0, 0, 0]);
    }

    #[test]
    fn option_tags() {
        assert_eq!(encode_option(None), vec![0]);
        assert_eq!(encode_option(Some(&[7, 8])), vec![1, 7, 8]);
    }

    #[test]
    fn short_buffer_reports_field_and_offset() {
        let mut r = Reader::new(&[1, 2, 3]);
        r.u8("tag").unwrap();
        let err = r.u64("amount").unwrap_err();
        assert_eq!(
            err,
            CodecError::ShortBuffer {
                field: "amount",
                offset: 1,
                needed: 8,
                remaining: 2
            }
        );
    }

    #[test]
    fn string_length_beyond_buffer_is_fatal() {
        let data = [10, 0, 0, 0, b'a'];
        assert_matches!(
            decode_length_prefixed_string(&data),
            Err(CodecError::ShortBuffer { field: "string", offset: 4, needed: 10, .. })
        );
    }

    #[test]
    fn bool_rejects_other_bytes() {
        let mut r = Reader::new(&[2]);
        assert_matches!(r.bool("vote"), Err(CodecError::InvalidTag { tag: 2, .. }));
    }

    #[test]
    fn option_rejects_bad_tag() {
        let mut r = Reader::new(&[9]);
        assert_matches!(
            r.option("proposal", |r| r.pubkey("proposal")),
            Err(CodecError::InvalidTag { tag: 9, offset: 0, .. })
        );
    }

    #[test]
    fn invalid_utf8_detected() {
        let data = [2, 0, 0, 0, 0xff, 0xfe];
        assert_matches!(
            decode_length_prefixed_string(&data),
            Err(CodecError::InvalidUtf8 { offset: 4, .. })
        );
    }

    #[test]
    fn finish_flags_trailing_bytes() {
        let mut r = Reader::new(&[1, 0]);
        r.u8("a").unwrap();
        assert_matches!(r.finish("msg"), Err(CodecError::TrailingBytes { remaining: 1, .. }));
    }

    #[test]
    fn reader_at_offset() {
        let data = [0u8, 0, 0, 5];
        let mut r = Reader::at(&data, 3, "skip").unwrap();
        assert_eq!(r.u8("x").unwrap(), 5);
        assert!(Reader::at(&data, 5, "skip").is_err());
    }

    proptest! {
        #[test]
        fn scalar_fields_decode_what_was_encoded(
            a in any::<u64>(),
            b in any::<i64>(),
            c in any::<u128>(),
            s in ".{0,64}",
            o in proptest::option::of(any::<[u8; 32]>()),
        ) {
            let key = o.map(Pubkey::new_from_array);
            let mut w = Writer::new();
            w.u64(a).i64(b).u128(c).string(&s).option(key.as_ref(), |w, k| {
                w.pubkey(k);
            });
            let bytes = w.into_inner();

            let mut r = Reader::new(&bytes);
            prop_assert_eq!(r.u64("a").unwrap(), a);
            prop_assert_eq!(r.i64("b").unwrap(), b);
            prop_assert_eq!(r.u128("c").unwrap(), c);
            prop_assert_eq!(r.string("s").unwrap(), s);
            prop_assert_eq!(r.option("o", |r| r.pubkey("o")).unwrap(), key);
            prop_assert!(r.finish("fields").is_ok());
        }
    }
}
