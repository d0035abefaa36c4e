//! BER (Basic Encoding Rules) reader and writer for ASN.1
//!
//! # ASN.1 BER Encoding Overview
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127, bit 8 clear.
//! - **Long form**: first byte `0x80 | n`, followed by `n` big-endian length
//!   octets. This codec reads 1-4 octets and writes up to 3.
//! - **Indefinite form**: a single `0x80`. The content runs until a two byte
//!   end-of-contents marker `0x00 0x00`.
//!
//! # Pull-parser model
//!
//! Neither side is schema driven. The [`Writer`] emits values in the order the
//! caller writes them and backpatches sequence lengths when a sequence is
//! closed. The [`Reader`] hands out values in the order the caller asks for
//! them; it is the caller's grammar that decides what comes next.
//!
//! ```
//! use ber_codec::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.start_sequence(None)?;
//! writer.write_int(5, None)?;
//! writer.write_string("abc", None)?;
//! writer.end_sequence()?;
//!
//! let mut reader = Reader::new(writer.to_bytes()?);
//! assert_eq!(reader.read_sequence(Some(0x30))?, Some(0x30));
//! assert_eq!(reader.read_int()?, Some(5));
//! assert_eq!(reader.read_string(None)?.as_deref(), Some("abc"));
//! assert_eq!(reader.remain(), 0);
//! # Ok::<(), ber_core::BerError>(())
//! ```
//!
//! # Incomplete input
//!
//! Reads return `BerResult<Option<T>>`. `Err` means the bytes are malformed
//! and the message must be rejected; `Ok(None)` means the buffer ends before
//! the value does, so the caller should wait for more bytes and retry.

pub mod oid;
pub mod options;
pub mod reader;
pub mod writer;

pub use options::WriterOptions;
pub use reader::Reader;
pub use writer::Writer;
