// MIT License
// Integration tests for the envelope signing pipeline

use lares_ws_bridge::checksum::compute_checksum;
use lares_ws_bridge::protocol::{Command, CommandFactory, Envelope, StatusKind};
use lares_ws_bridge::Model;

// Reference texts generated with the upstream crc16() routine, fixed
// timestamps so the checksum is reproducible.

const LOGIN_TEXT: &str = "{\"SENDER\":\"test\",\"RECEIVER\":\"\",\"CMD\":\"LOGIN\",\"ID\":\"1\",\"PAYLOAD_TYPE\":\"UNKNOWN\",\"PAYLOAD\":{\"PIN\":\"1234\"},\"TIMESTAMP\":\"1700000000\",\"CRC_16\":\"0x0000\"}";

const READ_TEXT: &str = "{\"SENDER\":\"caf\u{e9}\",\"RECEIVER\":\"\",\"CMD\":\"READ\",\"ID\":\"2\",\"PAYLOAD_TYPE\":\"MULTI_TYPES\",\"PAYLOAD\":{\"ID_LOGIN\":\"6a8f\",\"ID_READ\":\"1\",\"TYPES\":[\"STATUS_ZONES\"]},\"TIMESTAMP\":\"1700000001\",\"CRC_16\":\"0x0000\"}";

#[test]
fn login_envelope_known_checksum() {
    assert_eq!(compute_checksum(LOGIN_TEXT).unwrap(), "0xdbfc");
}

#[test]
fn read_envelope_with_multibyte_sender_known_checksum() {
    // The two-byte é in the sender shifts the checksum window by one byte;
    // a char-offset window would produce a different value.
    assert_eq!(compute_checksum(READ_TEXT).unwrap(), "0xe7cd");
}

#[test]
fn serializer_reproduces_reference_envelope_text() {
    // The wire format depends on serializing fields in declaration order
    // with compact separators; lock that against the reference text.
    let envelope: Envelope = serde_json::from_str(LOGIN_TEXT).unwrap();
    assert_eq!(serde_json::to_string(&envelope).unwrap(), LOGIN_TEXT);

    let envelope: Envelope = serde_json::from_str(READ_TEXT).unwrap();
    assert_eq!(serde_json::to_string(&envelope).unwrap(), READ_TEXT);
}

#[test]
fn factory_signed_login_round_trips() {
    let mut factory = CommandFactory::new("test", "1234");
    let signed = factory.build_command(&Command::Login, Model::Lares4).unwrap();

    // Wire text parses back to the structured envelope.
    let parsed: Envelope = serde_json::from_str(&signed.text).unwrap();
    assert_eq!(parsed.cmd, "LOGIN");
    assert_eq!(parsed.id, "1");
    assert_eq!(parsed.payload_type, "UNKNOWN");
    assert_eq!(parsed.crc, signed.envelope.crc);

    // Restoring the placeholder in the exact wire text reproduces the
    // spliced checksum.
    let restored = signed.text.replace(
        &format!("\"CRC_16\":\"{}\"", signed.envelope.crc),
        "\"CRC_16\":\"0x0000\"",
    );
    assert_eq!(compute_checksum(&restored).unwrap(), signed.envelope.crc);
}

#[test]
fn factory_signed_read_with_multibyte_sender_round_trips() {
    let mut factory = CommandFactory::new("caf\u{e9}", "1234");
    factory.set_login_token("6a8f");
    let signed = factory
        .build_command(
            &Command::Read {
                kinds: vec![StatusKind::Zones],
            },
            Model::Lares4,
        )
        .unwrap();

    let restored = signed.text.replace(
        &format!("\"CRC_16\":\"{}\"", signed.envelope.crc),
        "\"CRC_16\":\"0x0000\"",
    );
    assert_eq!(compute_checksum(&restored).unwrap(), signed.envelope.crc);
    assert_eq!(restored.len(), signed.text.len());
}
