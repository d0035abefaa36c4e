//! ASN.1 BER codec
//!
//! A pull-style reader and a backpatching writer for BER tag-length-value
//! records, as used by LDAP, SNMP and similar protocols.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ber-core`: Error taxonomy and the ASN.1 tag table
//! - `ber-codec`: `Reader` and `Writer`
//!
//! # Usage
//!
//! ```
//! use ber::{Asn1Tag, Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.start_sequence(None)?;
//! writer.write_oid("1.2.840.113549.1.1.5", None)?;
//! writer.write_null()?;
//! writer.end_sequence()?;
//!
//! let mut reader = Reader::new(writer.to_bytes()?);
//! reader.read_sequence(Some(Asn1Tag::Sequence | Asn1Tag::Constructor))?;
//! assert_eq!(reader.read_oid(None)?.as_deref(), Some("1.2.840.113549.1.1.5"));
//! assert_eq!(reader.read_null(None)?, Some(()));
//! # Ok::<(), ber::BerError>(())
//! ```

// Re-export core types
pub use ber_core::{Asn1Tag, BerError, BerResult, ErrorKind, TagClass};
pub use ber_core::tag::{is_constructed, tag_number};

// Re-export codec API
pub use ber_codec::{Reader, Writer, WriterOptions};

pub mod oid {
    pub use ber_codec::oid::*;
}
