//! End-to-end encode/decode of LDAP-shaped messages through the public API.

use ber::{Asn1Tag, BerError, BerResult, ErrorKind, Reader, Writer};
use bytes::{Bytes, BytesMut};
use hex_literal::hex;

const LDAP_MESSAGE: u8 = 0x30;
const BIND_REQUEST: u8 = Asn1Tag::application(0, true);
const SIMPLE_AUTH: u8 = Asn1Tag::context(0, false);

#[derive(Debug, PartialEq)]
struct BindRequest {
    message_id: i64,
    version: i64,
    name: String,
    password: Bytes,
}

fn encode_bind(request: &BindRequest) -> BerResult<Bytes> {
    let mut writer = Writer::new();
    writer.start_sequence(Some(LDAP_MESSAGE))?;
    writer.write_int(request.message_id, None)?;
    writer.start_sequence(Some(BIND_REQUEST))?;
    writer.write_int(request.version, None)?;
    writer.write_string(&request.name, None)?;
    writer.write_buffer(&request.password, SIMPLE_AUTH)?;
    writer.end_sequence()?;
    writer.end_sequence()?;
    writer.to_bytes()
}

/// `Ok(None)` while the message is still incomplete.
fn decode_bind(reader: &mut Reader) -> BerResult<Option<BindRequest>> {
    macro_rules! need {
        ($e:expr) => {
            match $e? {
                Some(value) => value,
                None => return Ok(None),
            }
        };
    }

    need!(reader.read_sequence(Some(LDAP_MESSAGE)));
    let message_id = need!(reader.read_int());
    need!(reader.read_sequence(Some(BIND_REQUEST)));
    let version = need!(reader.read_int());
    let name = need!(reader.read_string(None));
    let password = need!(reader.read_buffer(Some(SIMPLE_AUTH)));
    Ok(Some(BindRequest { message_id, version, name, password }))
}

fn sample() -> BindRequest {
    BindRequest {
        message_id: 1,
        version: 3,
        name: "cn=admin".to_string(),
        password: Bytes::from_static(b"secret"),
    }
}

#[test]
fn test_sequence_int_string_scenario() {
    let mut writer = Writer::new();
    writer.start_sequence(None).unwrap();
    writer.write_int(5, None).unwrap();
    writer.write_string("abc", None).unwrap();
    writer.end_sequence().unwrap();

    let mut reader = Reader::new(writer.to_bytes().unwrap());
    assert_eq!(reader.read_sequence(None).unwrap(), Some(0x30));
    assert_eq!(reader.read_int().unwrap(), Some(5));
    assert_eq!(reader.read_string(None).unwrap().as_deref(), Some("abc"));
    assert_eq!(reader.offset(), reader.size());
}

#[test]
fn test_bind_request_wire_format() {
    let encoded = encode_bind(&sample()).unwrap();
    assert_eq!(
        encoded.as_ref(),
        &hex!(
            "30 1a 02 01 01 60 15 02 01 03"
            "04 08 63 6e 3d 61 64 6d 69 6e"
            "80 06 73 65 63 72 65 74"
        )
    );

    let mut reader = Reader::new(encoded);
    assert_eq!(decode_bind(&mut reader).unwrap(), Some(sample()));
    assert_eq!(reader.remain(), 0);
}

#[test]
fn test_bind_request_streamed_in_chunks() {
    let encoded = encode_bind(&sample()).unwrap();
    let mut received = BytesMut::new();
    let mut decoded = None;

    for chunk in encoded.chunks(3) {
        received.extend_from_slice(chunk);
        let mut reader = Reader::new(received.clone().freeze());
        if let Some(request) = decode_bind(&mut reader).unwrap() {
            decoded = Some(request);
            break;
        }
    }

    assert_eq!(decoded, Some(sample()));
}

#[test]
fn test_back_to_back_messages() {
    let first = encode_bind(&sample()).unwrap();
    let second = encode_bind(&BindRequest { message_id: 2, ..sample() }).unwrap();
    let mut wire = BytesMut::new();
    wire.extend_from_slice(&first);
    wire.extend_from_slice(&second);

    let mut reader = Reader::new(wire.freeze());
    assert_eq!(decode_bind(&mut reader).unwrap().unwrap().message_id, 1);
    assert_eq!(reader.remainder(), second);

    let mut reader = Reader::new(reader.remainder());
    assert_eq!(decode_bind(&mut reader).unwrap().unwrap().message_id, 2);
}

#[test]
fn test_indefinite_length_envelope() {
    // The same bind request, with an indefinite-length outer envelope.
    let encoded = encode_bind(&sample()).unwrap();
    let mut wire = BytesMut::new();
    wire.extend_from_slice(&[0x30, 0x80]);
    wire.extend_from_slice(&encoded[2..]);
    wire.extend_from_slice(&[0x00, 0x00]);

    let mut reader = Reader::new(wire.freeze());
    assert_eq!(decode_bind(&mut reader).unwrap(), Some(sample()));
    assert_eq!(reader.read_end_of_contents().unwrap(), Some(()));
    assert_eq!(reader.remain(), 0);
}

#[test]
fn test_malformed_messages_rejected() {
    // Wrong protocol op tag.
    let mut reader = Reader::new(hex!("30 03 02 01 01 61 00").to_vec());
    let err = decode_bind(&mut reader).unwrap_err();
    assert_eq!(err, BerError::UnexpectedTag { expected: 0x60, found: 0x61 });
    assert_eq!(err.kind(), ErrorKind::MalformedEncoding);

    // Length-of-length above 4.
    let mut reader = Reader::new(hex!("30 85 00 00 00 00 10").to_vec());
    assert_eq!(decode_bind(&mut reader).unwrap_err(), BerError::LengthTooLong(5));

    // Message id wider than 8 octets.
    let mut reader = Reader::new(hex!("30 0b 02 09 01 02 03 04 05 06 07 08 09").to_vec());
    assert_eq!(decode_bind(&mut reader).unwrap_err(), BerError::IntegerTooLong(9));
}
