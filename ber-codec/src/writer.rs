//! BER writer
//!
//! # Usage Example
//!
//! ```rust
//! use ber_codec::Writer;
//!
//! let mut writer = Writer::new();
//! writer.write_int(12345, None)?;
//! assert_eq!(writer.buffer()?, &[0x02, 0x02, 0x30, 0x39]);
//! # Ok::<(), ber_core::BerError>(())
//! ```

use ber_core::{Asn1Tag, BerError, BerResult};
use bytes::Bytes;
use log::debug;

use crate::oid;
use crate::options::WriterOptions;

/// Bytes reserved for a sequence length until the sequence is closed
const RESERVED_LENGTH: usize = 3;

/// Largest length this writer emits (`0x83` + 3 octets)
const MAX_LENGTH: usize = 0xFF_FFFF;

/// BER writer into a growable arena
///
/// Every value is written as a TLV triplet. Sequences are written before
/// their length is known: [`Writer::start_sequence`] reserves three length
/// bytes and [`Writer::end_sequence`] rewrites them with the minimal length
/// form, shifting the content left or right when the final form is narrower
/// or wider than the reservation.
///
/// # Memory Management
///
/// The arena starts at [`WriterOptions::size`] bytes and is multiplied by
/// [`WriterOptions::growth_factor`] whenever a write would not fit, which
/// gives amortized constant-time appends. `ensure` is the only place that
/// allocates.
#[derive(Debug)]
pub struct Writer {
    buf: Vec<u8>,
    offset: usize,
    options: WriterOptions,
    // Offsets of the reserved length bytes of open sequences, innermost last.
    seq: Vec<usize>,
}

impl Writer {
    /// Create a writer with default options
    pub fn new() -> Self {
        Self::build(WriterOptions::default())
    }

    /// Create a writer with custom buffer sizing
    ///
    /// # Error Handling
    /// Returns `BerError::InvalidArgument` if `growth_factor` is 0.
    pub fn with_options(options: WriterOptions) -> BerResult<Self> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: WriterOptions) -> Self {
        Self {
            buf: vec![0; options.size],
            offset: 0,
            options,
            seq: Vec::new(),
        }
    }

    /// Number of bytes written so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Current arena size in bytes
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Number of sequences started but not yet ended
    pub fn open_sequences(&self) -> usize {
        self.seq.len()
    }

    /// The encoded message
    ///
    /// # Error Handling
    /// Returns `BerError::UnendedSequences` while any sequence is still open.
    pub fn buffer(&self) -> BerResult<&[u8]> {
        if !self.seq.is_empty() {
            return Err(BerError::UnendedSequences(self.seq.len()));
        }
        Ok(&self.buf[..self.offset])
    }

    /// The encoded message, copied into a [`Bytes`] handle for a transport
    pub fn to_bytes(&self) -> BerResult<Bytes> {
        self.buffer().map(Bytes::copy_from_slice)
    }

    /// The encoded message, reusing the arena
    pub fn into_vec(mut self) -> BerResult<Vec<u8>> {
        if !self.seq.is_empty() {
            return Err(BerError::UnendedSequences(self.seq.len()));
        }
        self.buf.truncate(self.offset);
        Ok(self.buf)
    }

    /// Write a length field in its minimal form
    ///
    /// # Error Handling
    /// Returns `BerError::LengthTooLong` for lengths above `0xFFFFFF`.
    pub fn write_length(&mut self, len: usize) -> BerResult<()> {
        self.ensure(4);

        if len <= 0x7F {
            self.put(len as u8);
        } else if len <= 0xFF {
            self.put(0x81);
            self.put(len as u8);
        } else if len <= 0xFFFF {
            self.put(0x82);
            self.put((len >> 8) as u8);
            self.put(len as u8);
        } else if len <= MAX_LENGTH {
            self.put(0x83);
            self.put((len >> 16) as u8);
            self.put((len >> 8) as u8);
            self.put(len as u8);
        } else {
            return Err(BerError::LengthTooLong(len));
        }
        Ok(())
    }

    /// Write a single raw byte
    pub fn write_byte(&mut self, b: u8) -> BerResult<()> {
        self.ensure(1);
        self.put(b);
        Ok(())
    }

    /// Write an INTEGER (or any integer-valued `tag`)
    ///
    /// # Minimal Encoding
    /// Leading octets that only repeat the sign are dropped: 127 is `0x7F`,
    /// 128 is `0x00 0x80`, -128 is `0x80` and -129 is `0xFF 0x7F`.
    pub fn write_int(&mut self, value: i64, tag: Option<u8>) -> BerResult<()> {
        let tag = tag.unwrap_or(Asn1Tag::Integer.value());
        let bytes = value.to_be_bytes();

        let mut start = 0;
        while start < bytes.len() - 1 {
            let (b, next) = (bytes[start], bytes[start + 1]);
            let redundant = (b == 0x00 && next & 0x80 == 0) || (b == 0xFF && next & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        let content = &bytes[start..];

        self.ensure(2 + content.len());
        self.put(tag);
        self.put(content.len() as u8);
        self.put_slice(content);
        Ok(())
    }

    /// Write an ENUMERATED
    pub fn write_enumeration(&mut self, value: i64, tag: Option<u8>) -> BerResult<()> {
        self.write_int(value, Some(tag.unwrap_or(Asn1Tag::Enumeration.value())))
    }

    /// Write a BOOLEAN; `true` is encoded as `0xFF`
    pub fn write_boolean(&mut self, value: bool, tag: Option<u8>) -> BerResult<()> {
        let tag = tag.unwrap_or(Asn1Tag::Boolean.value());
        self.ensure(3);
        self.put(tag);
        self.put(0x01);
        self.put(if value { 0xFF } else { 0x00 });
        Ok(())
    }

    /// Write a NULL
    pub fn write_null(&mut self) -> BerResult<()> {
        self.ensure(2);
        self.put(Asn1Tag::Null.value());
        self.put(0x00);
        Ok(())
    }

    /// Write a UTF-8 string (OCTET STRING unless `tag` says otherwise)
    pub fn write_string(&mut self, value: &str, tag: Option<u8>) -> BerResult<()> {
        let tag = tag.unwrap_or(Asn1Tag::OctetString.value());
        self.write_buffer(value.as_bytes(), tag)
    }

    /// Write each string as an OCTET STRING
    pub fn write_string_array<S: AsRef<str>>(&mut self, values: &[S]) -> BerResult<()> {
        for value in values {
            self.write_string(value.as_ref(), None)?;
        }
        Ok(())
    }

    /// Write raw bytes under `tag`
    pub fn write_buffer(&mut self, value: &[u8], tag: u8) -> BerResult<()> {
        if value.len() > MAX_LENGTH {
            return Err(BerError::LengthTooLong(value.len()));
        }
        self.write_byte(tag)?;
        self.write_length(value.len())?;
        if !value.is_empty() {
            self.ensure(value.len());
            self.put_slice(value);
        }
        Ok(())
    }

    /// Write an OBJECT IDENTIFIER from dotted form, e.g. `"1.2.840.113549.1.1.5"`
    ///
    /// # Error Handling
    /// Returns `BerError::InvalidOid` unless the input is at least four
    /// dot-separated decimal arcs that each fit a `u32`.
    pub fn write_oid(&mut self, dotted: &str, tag: Option<u8>) -> BerResult<()> {
        let tag = tag.unwrap_or(Asn1Tag::Oid.value());
        let bytes = oid::encode_absolute(dotted)?;
        self.write_buffer(&bytes, tag)
    }

    /// Write a RELATIVE-OID from dotted form
    pub fn write_relative_oid(&mut self, dotted: &str, tag: Option<u8>) -> BerResult<()> {
        let tag = tag.unwrap_or(Asn1Tag::RelativeOid.value());
        let bytes = oid::encode_relative(dotted)?;
        self.write_buffer(&bytes, tag)
    }

    /// Open a sequence (default tag `SEQUENCE | Constructor`, 0x30)
    ///
    /// The length is written when the matching [`Writer::end_sequence`] is
    /// called.
    pub fn start_sequence(&mut self, tag: Option<u8>) -> BerResult<()> {
        let tag = tag.unwrap_or(Asn1Tag::Sequence | Asn1Tag::Constructor);
        self.write_byte(tag)?;
        self.seq.push(self.offset);
        self.ensure(RESERVED_LENGTH);
        self.offset += RESERVED_LENGTH;
        Ok(())
    }

    /// Close the innermost open sequence and backpatch its length
    ///
    /// Only bytes after the reserved length move, so the stored offsets of
    /// still-open outer sequences stay valid.
    ///
    /// # Error Handling
    /// - `BerError::InvalidArgument` if no sequence is open
    /// - `BerError::SequenceTooLong` if the content exceeds `0xFFFFFF` bytes
    pub fn end_sequence(&mut self) -> BerResult<()> {
        let seq = *self.seq.last().ok_or_else(|| {
            BerError::InvalidArgument("end_sequence without an open sequence".to_string())
        })?;
        let start = seq + RESERVED_LENGTH;
        let len = self.offset - start;
        // A frame that fails to close stays open.
        if len > MAX_LENGTH {
            return Err(BerError::SequenceTooLong(len));
        }
        self.seq.pop();

        if len <= 0x7F {
            self.shift(start, len, -2);
            self.buf[seq] = len as u8;
        } else if len <= 0xFF {
            self.shift(start, len, -1);
            self.buf[seq] = 0x81;
            self.buf[seq + 1] = len as u8;
        } else if len <= 0xFFFF {
            self.buf[seq] = 0x82;
            self.buf[seq + 1] = (len >> 8) as u8;
            self.buf[seq + 2] = len as u8;
        } else {
            self.ensure(1);
            self.shift(start, len, 1);
            self.buf[seq] = 0x83;
            self.buf[seq + 1] = (len >> 16) as u8;
            self.buf[seq + 2] = (len >> 8) as u8;
            self.buf[seq + 3] = len as u8;
        }
        Ok(())
    }

    /// Move `len` content bytes at `start` by `shift` and move the cursor
    /// with them
    fn shift(&mut self, start: usize, len: usize, shift: isize) {
        let dest = start.saturating_add_signed(shift);
        debug!("backpatch: moving {} bytes from {} to {}", len, start, dest);
        self.buf.copy_within(start..start + len, dest);
        self.offset = self.offset.saturating_add_signed(shift);
    }

    /// Make room for `len` more bytes
    fn ensure(&mut self, len: usize) {
        let size = self.buf.len();
        if size - self.offset >= len {
            return;
        }

        let mut grown = size.saturating_mul(self.options.growth_factor);
        if grown - self.offset < len {
            grown += len;
        }
        debug!("growing writer arena from {} to {} bytes", size, grown);
        self.buf.resize(grown, 0);
    }

    fn put(&mut self, b: u8) {
        self.buf[self.offset] = b;
        self.offset += 1;
    }

    fn put_slice(&mut self, bytes: &[u8]) {
        self.buf[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
