//! BER reader
//!
//! Decodes TLV records from an immutable buffer, one value per call, in the
//! order the caller asks for them.
//!
//! # Usage Example
//!
//! ```rust
//! use ber_codec::Reader;
//!
//! let mut reader = Reader::new(vec![0x02, 0x02, 0x30, 0x39]);
//! assert_eq!(reader.read_int()?, Some(12345));
//! # Ok::<(), ber_core::BerError>(())
//! ```

use std::collections::HashMap;

use ber_core::{Asn1Tag, BerError, BerResult};
use bytes::Bytes;
use log::trace;

use crate::oid;

/// End-of-contents marker closing an indefinite-length value
const END_OF_CONTENTS: [u8; 2] = [0x00, 0x00];

/// Length byte announcing an indefinite-length value
const INDEFINITE_LENGTH: u8 = 0x80;

/// BER reader over an in-memory buffer
///
/// # Position Tracking
///
/// The reader keeps a cursor that advances as values are decoded, plus the
/// length of the most recently resolved TLV (see [`Reader::length`]), which
/// stays valid until the next call that resolves a length.
///
/// # Incomplete Input
///
/// Every read returns `BerResult<Option<T>>`. `Ok(None)` means the buffer
/// ends before the value does; the cursor is left where it was so the same
/// read can be retried on a longer buffer. Malformed input is an `Err` and
/// also leaves the cursor in place.
///
/// # Indefinite Lengths
///
/// A length byte of `0x80` is resolved by scanning forward over the nested
/// values until the `0x00 0x00` end-of-contents marker. Scan results are
/// cached per content offset; the buffer never changes, so the cache is never
/// invalidated.
#[derive(Debug)]
pub struct Reader {
    buf: Bytes,
    len: usize,
    offset: usize,
    blocks: HashMap<usize, usize>,
    block_scans: usize,
}

impl Reader {
    /// Create a new reader over `data`
    ///
    /// Accepts anything convertible to [`Bytes`] (`Vec<u8>`, `&'static [u8]`,
    /// `Bytes` itself) without copying.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            buf: data.into(),
            len: 0,
            offset: 0,
            blocks: HashMap::new(),
            block_scans: 0,
        }
    }

    /// Value length of the most recently resolved TLV
    pub fn length(&self) -> usize {
        self.len
    }

    /// Offset of the next unread byte
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total buffer size
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Number of unread bytes
    pub fn remain(&self) -> usize {
        self.size() - self.offset
    }

    /// The unread part of the buffer
    pub fn buffer(&self) -> &[u8] {
        &self.buf[self.offset..]
    }

    /// The unread part of the buffer as a shared handle, e.g. to re-frame the
    /// leftover bytes of one read as the start of the next message
    pub fn remainder(&self) -> Bytes {
        self.buf.slice(self.offset..)
    }

    /// Number of indefinite-length blocks scanned so far (cache hits excluded)
    pub fn block_scans(&self) -> usize {
        self.block_scans
    }

    /// Read a single byte, advancing the cursor unless `peek` is set
    ///
    /// Returns `None` if the buffer is exhausted.
    pub fn read_byte(&mut self, peek: bool) -> Option<u8> {
        let b = *self.buf.get(self.offset)?;
        if !peek {
            self.offset += 1;
        }
        Some(b)
    }

    /// Byte at the cursor, without advancing
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.offset).copied()
    }

    /// Resolve the length field whose first byte is at `offset` (default:
    /// the cursor)
    ///
    /// Returns the offset just past the length field, i.e. where the content
    /// starts, and records the resolved length in [`Reader::length`]. The
    /// cursor itself is not moved.
    ///
    /// # Error Handling
    /// - More than 4 length octets is `BerError::LengthTooLong`
    /// - An indefinite-length block with no end-of-contents marker is
    ///   `BerError::UnterminatedBlock`
    /// - Too few bytes for the stated length octets is `Ok(None)`
    pub fn read_length(&mut self, offset: Option<usize>) -> BerResult<Option<usize>> {
        let offset = offset.unwrap_or(self.offset);
        match self.resolve_length(offset)? {
            Some((len, content)) => {
                self.len = len;
                Ok(Some(content))
            }
            None => Ok(None),
        }
    }

    fn resolve_length(&mut self, offset: usize) -> BerResult<Option<(usize, usize)>> {
        let Some(&first) = self.buf.get(offset) else {
            return Ok(None);
        };
        let content = offset + 1;

        if first & 0x80 == 0 {
            return Ok(Some((first as usize, content)));
        }

        let count = (first & 0x7F) as usize;
        if count == 0 {
            let len = self.read_block(content)?;
            return Ok(Some((len, content)));
        }
        if count > 4 {
            return Err(BerError::LengthTooLong(count));
        }
        if self.size() - content < count {
            return Ok(None);
        }

        let len = self.buf[content..content + count]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        Ok(Some((len, content + count)))
    }

    /// Resolve the content length of an indefinite-length value whose content
    /// starts at `offset`
    ///
    /// The returned length excludes the end-of-contents marker. Nested
    /// indefinite-length blocks met on the way are resolved and cached too.
    ///
    /// # Error Handling
    /// Returns `BerError::UnterminatedBlock` with the content offset of the
    /// innermost open block if the buffer ends before its end-of-contents
    /// marker, including when `offset` lies past the end of the buffer.
    pub fn read_block(&mut self, offset: usize) -> BerResult<usize> {
        if let Some(&len) = self.blocks.get(&offset) {
            trace!("indefinite block at {} cached: {} bytes", offset, len);
            return Ok(len);
        }

        let size = self.size();
        // Content offsets of the blocks being scanned, innermost last.
        let mut pending = vec![offset];
        self.block_scans += 1;
        let mut pos = offset;

        while let Some(&start) = pending.last() {
            if pos >= size || size - pos < END_OF_CONTENTS.len() {
                return Err(BerError::UnterminatedBlock(start));
            }

            if self.buf[pos..pos + 2] == END_OF_CONTENTS {
                let len = pos - start;
                trace!("indefinite block at {} scanned: {} bytes", start, len);
                self.blocks.insert(start, len);
                pending.pop();
                if pending.is_empty() {
                    return Ok(len);
                }
                pos += END_OF_CONTENTS.len();
                continue;
            }

            // Nested value: one tag byte, then its length field.
            let header = pos + 1;
            if self.buf[header] == INDEFINITE_LENGTH {
                let content = header + 1;
                if let Some(&len) = self.blocks.get(&content) {
                    pos = content + len + END_OF_CONTENTS.len();
                } else {
                    pending.push(content);
                    self.block_scans += 1;
                    pos = content;
                }
                continue;
            }

            let Some((len, content)) = self.resolve_length(header)? else {
                return Err(BerError::UnterminatedBlock(start));
            };
            if len > size - content {
                return Err(BerError::UnterminatedBlock(start));
            }
            pos = content + len;
        }

        Err(BerError::UnterminatedBlock(offset))
    }

    /// Read the header of a sequence (or any constructed value)
    ///
    /// Checks the tag against `tag` if given, moves the cursor to the first
    /// byte of the content and returns the tag. The content length is then
    /// available through [`Reader::length`]; reading exactly that much is up
    /// to the caller.
    pub fn read_sequence(&mut self, tag: Option<u8>) -> BerResult<Option<u8>> {
        let Some(found) = self.peek() else {
            return Ok(None);
        };
        if let Some(expected) = tag {
            if expected != found {
                return Err(BerError::UnexpectedTag { expected, found });
            }
        }

        let Some(content) = self.read_length(Some(self.offset + 1))? else {
            return Ok(None);
        };
        self.offset = content;
        Ok(Some(found))
    }

    /// Consume the `0x00 0x00` marker that closes an indefinite-length value
    pub fn read_end_of_contents(&mut self) -> BerResult<Option<()>> {
        if self.remain() < END_OF_CONTENTS.len() {
            return Ok(None);
        }
        if self.buf[self.offset..self.offset + 2] != END_OF_CONTENTS {
            return Err(BerError::InvalidAsn1(format!(
                "expected end-of-contents at offset {}",
                self.offset
            )));
        }
        self.offset += END_OF_CONTENTS.len();
        Ok(Some(()))
    }

    /// Read an INTEGER
    pub fn read_int(&mut self) -> BerResult<Option<i64>> {
        self.read_tag(Asn1Tag::Integer.value())
    }

    /// Read a BOOLEAN; any non-zero content is `true`
    pub fn read_boolean(&mut self) -> BerResult<Option<bool>> {
        Ok(self.read_tag(Asn1Tag::Boolean.value())?.map(|value| value != 0))
    }

    /// Read an ENUMERATED
    pub fn read_enumeration(&mut self) -> BerResult<Option<i64>> {
        self.read_tag(Asn1Tag::Enumeration.value())
    }

    /// Read a NULL
    pub fn read_null(&mut self, tag: Option<u8>) -> BerResult<Option<()>> {
        let tag = tag.unwrap_or(Asn1Tag::Null.value());
        let Some((value, end)) = self.take_primitive(tag)? else {
            return Ok(None);
        };
        if !value.is_empty() {
            return Err(BerError::InvalidAsn1(format!(
                "NULL with {} content bytes",
                value.len()
            )));
        }
        self.offset = end;
        Ok(Some(()))
    }

    /// Read a string value (OCTET STRING unless `tag` says otherwise) as UTF-8
    pub fn read_string(&mut self, tag: Option<u8>) -> BerResult<Option<String>> {
        let tag = tag.unwrap_or(Asn1Tag::OctetString.value());
        let Some((value, end)) = self.take_primitive(tag)? else {
            return Ok(None);
        };
        let s = std::str::from_utf8(&value)
            .map_err(|e| BerError::InvalidAsn1(format!("string is not UTF-8: {}", e)))?
            .to_owned();
        self.offset = end;
        Ok(Some(s))
    }

    /// Read a string value (OCTET STRING unless `tag` says otherwise) as raw
    /// bytes, sharing the reader's buffer
    pub fn read_buffer(&mut self, tag: Option<u8>) -> BerResult<Option<Bytes>> {
        let tag = tag.unwrap_or(Asn1Tag::OctetString.value());
        let Some((value, end)) = self.take_primitive(tag)? else {
            return Ok(None);
        };
        self.offset = end;
        Ok(Some(value))
    }

    /// Read an OBJECT IDENTIFIER in dotted form, e.g. `"1.2.840.113549"`
    pub fn read_oid(&mut self, tag: Option<u8>) -> BerResult<Option<String>> {
        let tag = tag.unwrap_or(Asn1Tag::Oid.value());
        let Some((value, end)) = self.take_primitive(tag)? else {
            return Ok(None);
        };
        let oid = oid::decode_absolute(&value)?;
        self.offset = end;
        Ok(Some(oid))
    }

    /// Read a RELATIVE-OID in dotted form
    pub fn read_relative_oid(&mut self, tag: Option<u8>) -> BerResult<Option<String>> {
        let tag = tag.unwrap_or(Asn1Tag::RelativeOid.value());
        let Some((value, end)) = self.take_primitive(tag)? else {
            return Ok(None);
        };
        let oid = oid::decode_relative(&value)?;
        self.offset = end;
        Ok(Some(oid))
    }

    /// Shared decode for INTEGER, BOOLEAN and ENUMERATED
    ///
    /// Content is big-endian two's complement, at most 8 octets. An empty
    /// content decodes to 0.
    fn read_tag(&mut self, tag: u8) -> BerResult<Option<i64>> {
        let Some(content) = self.read_primitive_header(tag)? else {
            return Ok(None);
        };
        if self.len > 8 {
            return Err(BerError::IntegerTooLong(self.len));
        }
        if self.len > self.size() - content {
            return Ok(None);
        }

        let end = content + self.len;
        let value = decode_integer(&self.buf[content..end]);
        self.offset = end;
        Ok(Some(value))
    }

    /// Check the tag of a primitive value and resolve its length
    ///
    /// Returns the content offset. The cursor is not moved.
    fn read_primitive_header(&mut self, tag: u8) -> BerResult<Option<usize>> {
        let Some(found) = self.peek() else {
            return Ok(None);
        };
        if found != tag {
            return Err(BerError::UnexpectedTag { expected: tag, found });
        }
        if self.buf.get(self.offset + 1) == Some(&INDEFINITE_LENGTH) {
            return Err(BerError::InvalidAsn1(
                "indefinite length primitive value".to_string(),
            ));
        }
        self.read_length(Some(self.offset + 1))
    }

    /// Slice out the content of a primitive value
    ///
    /// Returns the content and the offset just past it, leaving it to the
    /// caller to commit the cursor once the content has been validated.
    fn take_primitive(&mut self, tag: u8) -> BerResult<Option<(Bytes, usize)>> {
        let Some(content) = self.read_primitive_header(tag)? else {
            return Ok(None);
        };
        if self.len > self.size() - content {
            return Ok(None);
        }
        if self.len == 0 {
            return Ok(Some((Bytes::new(), content)));
        }
        let end = content + self.len;
        Ok(Some((self.buf.slice(content..end), end)))
    }
}

/// Big-endian two's complement to `i64`, sign-extending from the top bit of
/// the first octet
fn decode_integer(bytes: &[u8]) -> i64 {
    let Some(&first) = bytes.first() else {
        return 0;
    };

    let mut value = 0i64;
    for &byte in bytes {
        value = (value << 8) | byte as i64;
    }

    if first & 0x80 != 0 && bytes.len() < 8 {
        let shift = 64 - bytes.len() * 8;
        value = (value << shift) >> shift;
    }
    value
}
