//! ASN.1 tag constants
//!
//! Tags in this codec are single bytes:
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//!
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number
//!
//! See <http://www.oss.com/asn1/resources/reference/asn1-reference-card.html>

use std::fmt;
use std::ops::BitOr;

/// Universal tag numbers plus the constructed and context flag bits
///
/// Combine flags with `|`, which yields the raw tag byte:
///
/// ```
/// use ber_core::Asn1Tag;
///
/// assert_eq!(Asn1Tag::Sequence | Asn1Tag::Constructor, 0x30);
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asn1Tag {
    Eoc = 0,
    Boolean = 1,
    Integer = 2,
    BitString = 3,
    OctetString = 4,
    Null = 5,
    Oid = 6,
    ObjectDescriptor = 7,
    External = 8,
    Real = 9,
    Enumeration = 10,
    Pdv = 11,
    Utf8String = 12,
    RelativeOid = 13,
    Sequence = 16,
    Set = 17,
    NumericString = 18,
    PrintableString = 19,
    T61String = 20,
    VideotexString = 21,
    Ia5String = 22,
    UtcTime = 23,
    GeneralizedTime = 24,
    GraphicString = 25,
    VisibleString = 26,
    GeneralString = 28,
    UniversalString = 29,
    CharacterString = 30,
    BmpString = 31,
    Constructor = 0x20,
    Context = 0x80,
}

impl Asn1Tag {
    const ALL: [Asn1Tag; 31] = [
        Asn1Tag::Eoc,
        Asn1Tag::Boolean,
        Asn1Tag::Integer,
        Asn1Tag::BitString,
        Asn1Tag::OctetString,
        Asn1Tag::Null,
        Asn1Tag::Oid,
        Asn1Tag::ObjectDescriptor,
        Asn1Tag::External,
        Asn1Tag::Real,
        Asn1Tag::Enumeration,
        Asn1Tag::Pdv,
        Asn1Tag::Utf8String,
        Asn1Tag::RelativeOid,
        Asn1Tag::Sequence,
        Asn1Tag::Set,
        Asn1Tag::NumericString,
        Asn1Tag::PrintableString,
        Asn1Tag::T61String,
        Asn1Tag::VideotexString,
        Asn1Tag::Ia5String,
        Asn1Tag::UtcTime,
        Asn1Tag::GeneralizedTime,
        Asn1Tag::GraphicString,
        Asn1Tag::VisibleString,
        Asn1Tag::GeneralString,
        Asn1Tag::UniversalString,
        Asn1Tag::CharacterString,
        Asn1Tag::BmpString,
        Asn1Tag::Constructor,
        Asn1Tag::Context,
    ];

    /// Raw byte value of the tag
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Look up a table entry by its exact byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.value() == value)
    }

    /// Build a context-specific tag byte, e.g. `[3]` or `[0] IMPLICIT SEQUENCE`
    ///
    /// Tag numbers above 30 need the extended form, which this codec does
    /// not emit, so only the low 5 bits of `number` are kept.
    pub const fn context(number: u8, constructed: bool) -> u8 {
        let constructed_bit = if constructed { Asn1Tag::Constructor as u8 } else { 0 };
        Asn1Tag::Context as u8 | constructed_bit | (number & 0x1F)
    }

    /// Build an application tag byte (LDAP protocol ops use these)
    pub const fn application(number: u8, constructed: bool) -> u8 {
        let constructed_bit = if constructed { Asn1Tag::Constructor as u8 } else { 0 };
        TagClass::Application.to_bits() | constructed_bit | (number & 0x1F)
    }
}

impl From<Asn1Tag> for u8 {
    fn from(tag: Asn1Tag) -> u8 {
        tag.value()
    }
}

impl BitOr for Asn1Tag {
    type Output = u8;

    fn bitor(self, rhs: Asn1Tag) -> u8 {
        self.value() | rhs.value()
    }
}

impl BitOr<u8> for Asn1Tag {
    type Output = u8;

    fn bitor(self, rhs: u8) -> u8 {
        self.value() | rhs
    }
}

impl fmt::Display for Asn1Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:02x})", self, self.value())
    }
}

/// Tag class, bits 8-7 of a tag byte
///
/// Tag classes allow different applications to reuse tag numbers without
/// conflicts: tag 1 in the Universal class is BOOLEAN, but tag 1 in the
/// Application class is whatever the protocol says it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get the class of a tag byte
    pub const fn of(tag: u8) -> Self {
        match (tag >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Convert tag class to its bit pattern in a tag byte
    pub const fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Whether the constructed bit of a tag byte is set
pub const fn is_constructed(tag: u8) -> bool {
    tag & Asn1Tag::Constructor as u8 != 0
}

/// Tag number of a tag byte (low 5 bits)
pub const fn tag_number(tag: u8) -> u8 {
    tag & 0x1F
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_tag() {
        assert_eq!(Asn1Tag::Sequence | Asn1Tag::Constructor, 0x30);
        assert_eq!(Asn1Tag::Set | Asn1Tag::Constructor, 0x31);
    }

    #[test]
    fn test_context_tag() {
        assert_eq!(Asn1Tag::context(0, false), 0x80);
        assert_eq!(Asn1Tag::context(3, true), 0xa3);
        assert_eq!(TagClass::of(0xa3), TagClass::ContextSpecific);
        assert!(is_constructed(0xa3));
        assert_eq!(tag_number(0xa3), 3);
    }

    #[test]
    fn test_application_tag() {
        // LDAP BindRequest
        assert_eq!(Asn1Tag::application(0, true), 0x60);
        assert_eq!(TagClass::of(0x60), TagClass::Application);
    }

    #[test]
    fn test_from_u8() {
        assert_eq!(Asn1Tag::from_u8(0x06), Some(Asn1Tag::Oid));
        assert_eq!(Asn1Tag::from_u8(0x80), Some(Asn1Tag::Context));
        assert_eq!(Asn1Tag::from_u8(27), None);
        assert_eq!(Asn1Tag::Oid.to_string(), "Oid(0x06)");
        for tag in Asn1Tag::ALL {
            assert_eq!(Asn1Tag::from_u8(tag.value()), Some(tag));
        }
    }
}
