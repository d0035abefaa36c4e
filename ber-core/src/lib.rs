//! Core types shared by the BER reader and writer
//!
//! This crate provides the error taxonomy and the ASN.1 universal tag table
//! consumed by both sides of the codec.

pub mod error;
pub mod tag;

pub use error::{BerError, BerResult, ErrorKind};
pub use tag::{Asn1Tag, TagClass};
