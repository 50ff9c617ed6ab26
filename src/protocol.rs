// MIT License
// Rust translation of CommandFactory and the command catalog from
// ksenia_lares/lares4_api.py

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::checksum::compute_checksum;
use crate::config::Model;
use crate::error::{LaresError, Result};

/// Fixed placeholder the checksum is computed against before splicing.
pub const CRC_PLACEHOLDER: &str = "0x0000";

/// Payload key replaced with the login-session token at build time.
pub const ID_LOGIN_KEY: &str = "ID_LOGIN";

/// Payload key replaced with the configured PIN at build time.
pub const PIN_KEY: &str = "PIN";

/// The complete command or response message exchanged over the connection.
///
/// Field order matters for outgoing envelopes: the declaration order below
/// is the serialization order, and the checksum window depends on `CRC_16`
/// being the final field. Incoming frames deserialize into the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "SENDER")]
    pub sender: String,
    /// Reserved by the protocol; always empty on outgoing commands.
    #[serde(rename = "RECEIVER", default)]
    pub receiver: String,
    #[serde(rename = "CMD")]
    pub cmd: String,
    /// Decimal string of the per-connection command counter.
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "PAYLOAD_TYPE", default)]
    pub payload_type: String,
    #[serde(rename = "PAYLOAD", default)]
    pub payload: Map<String, Value>,
    /// Unix time in whole seconds, as a decimal string.
    #[serde(rename = "TIMESTAMP", default)]
    pub timestamp: String,
    #[serde(rename = "CRC_16", default)]
    pub crc: String,
}

impl Envelope {
    /// The `RESULT` field of the payload, if present.
    pub fn result(&self) -> Option<&str> {
        self.payload.get("RESULT").and_then(Value::as_str)
    }

    /// Whether the panel reported `RESULT: "OK"`.
    pub fn is_ok_result(&self) -> bool {
        self.result() == Some("OK")
    }
}

/// A finished command: the structured envelope plus the exact serialized
/// text the checksum was computed over.
///
/// Transports must send `text` verbatim. Re-serializing `envelope` could
/// reorder keys or alter whitespace and invalidate the checksum.
#[derive(Debug, Clone)]
pub struct SignedCommand {
    /// Numeric command ID, for response correlation.
    pub id: u64,
    pub envelope: Envelope,
    pub text: String,
}

/// Status-type tags the panel reports on, a closed enumeration.
///
/// Used both in `READ`/`REALTIME` request payloads (`TYPES`) and as the
/// payload keys of responses and realtime change pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Zones,
    Partitions,
    Scenarios,
    Outputs,
    /// Bus peripherals (DOMUS sensors and similar).
    Peripherals,
    Temperatures,
    System,
}

impl StatusKind {
    /// The wire tag (request `TYPES` entry / response payload key).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Zones => "STATUS_ZONES",
            Self::Partitions => "STATUS_PARTITIONS",
            Self::Scenarios => "STATUS_SCENARIOS",
            Self::Outputs => "STATUS_OUTPUTS",
            Self::Peripherals => "STATUS_BUS_HA_SENSORS",
            Self::Temperatures => "STATUS_TEMPERATURES",
            Self::System => "STATUS_SYSTEM",
        }
    }

    /// Parse a wire tag back into a kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "STATUS_ZONES" => Some(Self::Zones),
            "STATUS_PARTITIONS" => Some(Self::Partitions),
            "STATUS_SCENARIOS" => Some(Self::Scenarios),
            "STATUS_OUTPUTS" => Some(Self::Outputs),
            "STATUS_BUS_HA_SENSORS" => Some(Self::Peripherals),
            "STATUS_TEMPERATURES" => Some(Self::Temperatures),
            "STATUS_SYSTEM" => Some(Self::System),
            _ => None,
        }
    }
}

/// Zone bypass state for `CMD_BYP_ZONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneBypass {
    On,
    Off,
}

impl ZoneBypass {
    pub fn to_wire_str(&self) -> &'static str {
        match self {
            Self::On => "YES",
            Self::Off => "NO",
        }
    }
}

/// Commands that can be sent to a Lares 4 panel.
///
/// Each command maps to a (`CMD`, `PAYLOAD_TYPE`, `PAYLOAD`) triple; the
/// payload carries `ID_LOGIN`/`PIN` sentinel keys where the panel expects
/// live session state, filled in by [`CommandFactory::build_command`].
#[derive(Debug, Clone)]
pub enum Command {
    /// `LOGIN` — authenticate with the PIN. The panel replies `LOGIN_RES`
    /// with the session token in `PAYLOAD.ID_LOGIN`.
    /// `PAYLOAD_TYPE` is model dependent: `UNKNOWN` on Lares 4, `USER` on
    /// BTicino 4200.
    Login,
    /// `LOGOUT` — end the session.
    Logout,
    /// `READ`/`MULTI_TYPES` — one-shot status read for the given kinds.
    Read { kinds: Vec<StatusKind> },
    /// `REALTIME`/`REGISTER` — subscribe to change pushes for the given
    /// kinds. The panel answers once, then pushes `CHANGES` frames.
    Register { kinds: Vec<StatusKind> },
    /// `CMD_USR`/`CMD_EXE_SCENARIO` — execute a scenario (arm, disarm, ...).
    ExecuteScenario { id: u32 },
    /// `CMD_USR`/`CMD_BYP_ZONE` — set or clear a zone bypass.
    BypassZone { id: u32, bypass: ZoneBypass },
}

impl Command {
    /// The `CMD` field value.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login => "LOGIN",
            Command::Logout => "LOGOUT",
            Command::Read { .. } => "READ",
            Command::Register { .. } => "REALTIME",
            Command::ExecuteScenario { .. } | Command::BypassZone { .. } => "CMD_USR",
        }
    }

    /// The `PAYLOAD_TYPE` field value for the given panel model.
    pub fn payload_type(&self, model: Model) -> &'static str {
        match self {
            Command::Login => model.login_payload_type(),
            Command::Logout => "UNKNOWN",
            Command::Read { .. } => "MULTI_TYPES",
            Command::Register { .. } => "REGISTER",
            Command::ExecuteScenario { .. } => "CMD_EXE_SCENARIO",
            Command::BypassZone { .. } => "CMD_BYP_ZONE",
        }
    }

    /// The raw payload, with `ID_LOGIN`/`PIN` sentinels where augmentation
    /// is expected.
    pub fn payload(&self) -> Map<String, Value> {
        let value = match self {
            Command::Login => json!({ PIN_KEY: true }),
            Command::Logout => json!({ ID_LOGIN_KEY: true }),
            Command::Read { kinds } => json!({
                ID_LOGIN_KEY: true,
                "ID_READ": "1",
                "TYPES": tags(kinds),
            }),
            Command::Register { kinds } => json!({
                ID_LOGIN_KEY: true,
                "TYPES": tags(kinds),
            }),
            // The panel expects the misspelled "SCENARION" key; kept
            // verbatim for firmware compatibility.
            Command::ExecuteScenario { id } => json!({
                ID_LOGIN_KEY: true,
                PIN_KEY: true,
                "SCENARION": { "ID": id },
            }),
            Command::BypassZone { id, bypass } => json!({
                ID_LOGIN_KEY: true,
                PIN_KEY: true,
                "ZONE": { "ID": id, "BYP": bypass.to_wire_str() },
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => unreachable!("command payloads are JSON objects"),
        }
    }
}

fn tags(kinds: &[StatusKind]) -> Vec<&'static str> {
    kinds.iter().map(StatusKind::tag).collect()
}

/// Per-connection factory for signed command envelopes.
///
/// Owns the command counter, the sender identifier, the PIN, and (after a
/// successful login round-trip) the session token. One instance per
/// connection; nothing persists across connections.
#[derive(Debug)]
pub struct CommandFactory {
    sender: String,
    pin: String,
    command_id: u64,
    login_id: Option<String>,
}

impl CommandFactory {
    pub fn new(sender: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            pin: pin.into(),
            command_id: 0,
            login_id: None,
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The most recently issued command ID (0 before the first envelope).
    pub fn current_command_id(&self) -> u64 {
        self.command_id
    }

    /// Increment and return the connection-scoped counter. First call
    /// returns 1; the counter never repeats or decreases.
    pub fn next_command_id(&mut self) -> u64 {
        self.command_id += 1;
        self.command_id
    }

    /// Store the session token from a successful `LOGIN_RES`.
    pub fn set_login_token(&mut self, token: impl Into<String>) {
        self.login_id = Some(token.into());
    }

    pub fn login_token(&self) -> Option<&str> {
        self.login_id.as_deref()
    }

    /// Replace sentinel payload keys with live session state: `ID_LOGIN`
    /// with the login token, `PIN` with the configured PIN. Every other
    /// key passes through untouched.
    ///
    /// Requesting `ID_LOGIN` before a token is set fails with
    /// [`LaresError::LoginTokenMissing`] rather than sending an empty
    /// value the panel would reject anyway.
    fn augment_payload(&self, mut payload: Map<String, Value>) -> Result<Map<String, Value>> {
        if payload.contains_key(ID_LOGIN_KEY) {
            let token = self
                .login_id
                .as_ref()
                .ok_or(LaresError::LoginTokenMissing)?;
            payload.insert(ID_LOGIN_KEY.to_string(), Value::String(token.clone()));
        }
        if payload.contains_key(PIN_KEY) {
            payload.insert(PIN_KEY.to_string(), Value::String(self.pin.clone()));
        }
        Ok(payload)
    }

    /// Assemble, serialize, and sign a command envelope.
    ///
    /// The envelope is serialized exactly once, with the `0x0000`
    /// placeholder in `CRC_16`; the checksum is computed over that text and
    /// spliced into it in place (the placeholder and the checksum are both
    /// six bytes, so the window is unchanged).
    pub fn build_envelope(
        &mut self,
        cmd: &str,
        payload_type: &str,
        payload: Map<String, Value>,
    ) -> Result<SignedCommand> {
        let id = self.next_command_id();
        let payload = self.augment_payload(payload)?;
        let mut envelope = Envelope {
            sender: self.sender.clone(),
            receiver: String::new(),
            cmd: cmd.to_string(),
            id: id.to_string(),
            payload_type: payload_type.to_string(),
            payload,
            timestamp: Utc::now().timestamp().to_string(),
            crc: CRC_PLACEHOLDER.to_string(),
        };

        let mut text = serde_json::to_string(&envelope)?;
        let crc = compute_checksum(&text)?;

        // Compact serialization puts `"CRC_16":"<placeholder>"` last; the
        // placeholder value starts 10 bytes after the key's opening quote.
        let value_start = text
            .rfind("\"CRC_16\"")
            .ok_or(LaresError::ChecksumFieldMissing)?
            + 10;
        text.replace_range(value_start..value_start + CRC_PLACEHOLDER.len(), &crc);
        envelope.crc = crc;

        Ok(SignedCommand { id, envelope, text })
    }

    /// Build a signed envelope for a catalog [`Command`].
    pub fn build_command(&mut self, command: &Command, model: Model) -> Result<SignedCommand> {
        self.build_envelope(
            command.name(),
            command.payload_type(model),
            command.payload(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::compute_checksum;

    fn factory() -> CommandFactory {
        CommandFactory::new("test-sender", "1234")
    }

    #[test]
    fn test_command_ids_start_at_one_and_increase() {
        let mut f = factory();
        assert_eq!(f.current_command_id(), 0);
        assert_eq!(f.next_command_id(), 1);
        assert_eq!(f.next_command_id(), 2);
        assert_eq!(f.next_command_id(), 3);
        assert_eq!(f.current_command_id(), 3);
    }

    #[test]
    fn test_envelope_ids_are_distinct_and_sequential() {
        let mut f = factory();
        let a = f.build_envelope("READ", "MULTI_TYPES", Map::new()).unwrap();
        let b = f.build_envelope("READ", "MULTI_TYPES", Map::new()).unwrap();
        assert_eq!(a.envelope.id, "1");
        assert_eq!(b.envelope.id, "2");
        assert_eq!(b.id, a.id + 1);
    }

    #[test]
    fn test_payload_without_sentinels_passes_through() {
        let mut f = factory();
        let mut payload = Map::new();
        payload.insert("ID_READ".into(), Value::String("1".into()));
        payload.insert("TYPES".into(), serde_json::json!(["STATUS_ZONES"]));
        let signed = f
            .build_envelope("READ", "MULTI_TYPES", payload.clone())
            .unwrap();
        assert_eq!(signed.envelope.payload, payload);
    }

    #[test]
    fn test_pin_augmentation() {
        let mut f = factory();
        let mut payload = Map::new();
        payload.insert("PIN".into(), Value::Bool(true));
        let signed = f.build_envelope("LOGIN", "UNKNOWN", payload).unwrap();
        assert_eq!(
            signed.envelope.payload.get("PIN"),
            Some(&Value::String("1234".into()))
        );
    }

    #[test]
    fn test_id_login_before_token_fails_loudly() {
        let mut f = factory();
        let mut payload = Map::new();
        payload.insert("ID_LOGIN".into(), Value::Bool(true));
        let err = f.build_envelope("READ", "MULTI_TYPES", payload).unwrap_err();
        assert!(matches!(err, LaresError::LoginTokenMissing));
        // The failed attempt still consumed an ID; uniqueness holds.
        assert_eq!(f.current_command_id(), 1);
    }

    #[test]
    fn test_id_login_uses_latest_token() {
        let mut f = factory();
        let mut payload = Map::new();
        payload.insert("ID_LOGIN".into(), Value::Bool(true));

        f.set_login_token("aaaa");
        let first = f
            .build_envelope("READ", "MULTI_TYPES", payload.clone())
            .unwrap();
        assert_eq!(
            first.envelope.payload.get("ID_LOGIN"),
            Some(&Value::String("aaaa".into()))
        );

        f.set_login_token("bbbb");
        let second = f.build_envelope("READ", "MULTI_TYPES", payload).unwrap();
        assert_eq!(
            second.envelope.payload.get("ID_LOGIN"),
            Some(&Value::String("bbbb".into()))
        );
    }

    #[test]
    fn test_signed_text_round_trips() {
        let mut f = factory();
        f.set_login_token("6a8f");
        let signed = f
            .build_command(
                &Command::Read {
                    kinds: vec![StatusKind::Zones],
                },
                Model::Lares4,
            )
            .unwrap();

        // The spliced checksum must reproduce when the placeholder is
        // restored in the exact wire text.
        assert_eq!(signed.envelope.crc.len(), 6);
        let restored = signed.text.replace(
            &format!("\"CRC_16\":\"{}\"", signed.envelope.crc),
            "\"CRC_16\":\"0x0000\"",
        );
        assert_eq!(compute_checksum(&restored).unwrap(), signed.envelope.crc);

        // Splicing preserved the overall length.
        assert_eq!(restored.len(), signed.text.len());
    }

    #[test]
    fn test_wire_text_field_order() {
        let mut f = factory();
        let signed = f.build_envelope("LOGIN", "UNKNOWN", Map::new()).unwrap();
        let text = &signed.text;
        let order = [
            "\"SENDER\"",
            "\"RECEIVER\"",
            "\"CMD\"",
            "\"ID\"",
            "\"PAYLOAD_TYPE\"",
            "\"PAYLOAD\"",
            "\"TIMESTAMP\"",
            "\"CRC_16\"",
        ];
        let mut last = 0;
        for key in order {
            let pos = text[last..].find(key).map(|p| p + last);
            let pos = pos.unwrap_or_else(|| panic!("{key} missing or out of order"));
            last = pos + key.len();
        }
        assert!(text.ends_with('}'));
    }

    #[test]
    fn test_wire_text_parses_back() {
        let mut f = factory();
        f.set_login_token("tok");
        let signed = f
            .build_command(&Command::ExecuteScenario { id: 3 }, Model::Lares4)
            .unwrap();
        let parsed: Envelope = serde_json::from_str(&signed.text).unwrap();
        assert_eq!(parsed.cmd, "CMD_USR");
        assert_eq!(parsed.payload_type, "CMD_EXE_SCENARIO");
        assert_eq!(parsed.id, signed.envelope.id);
        assert_eq!(parsed.crc, signed.envelope.crc);
        assert_eq!(
            parsed.payload.get("SCENARION"),
            signed.envelope.payload.get("SCENARION")
        );
    }

    #[test]
    fn test_login_payload_type_by_model() {
        assert_eq!(Command::Login.payload_type(Model::Lares4), "UNKNOWN");
        assert_eq!(Command::Login.payload_type(Model::Bticino4200), "USER");
    }

    #[test]
    fn test_command_wire_parts() {
        let read = Command::Read {
            kinds: vec![StatusKind::Zones, StatusKind::Partitions],
        };
        assert_eq!(read.name(), "READ");
        assert_eq!(read.payload_type(Model::Lares4), "MULTI_TYPES");
        let payload = read.payload();
        assert_eq!(
            payload.get("TYPES"),
            Some(&serde_json::json!(["STATUS_ZONES", "STATUS_PARTITIONS"]))
        );
        assert_eq!(payload.get("ID_READ"), Some(&Value::String("1".into())));

        let bypass = Command::BypassZone {
            id: 5,
            bypass: ZoneBypass::On,
        };
        assert_eq!(bypass.name(), "CMD_USR");
        assert_eq!(bypass.payload_type(Model::Lares4), "CMD_BYP_ZONE");
        assert_eq!(
            bypass.payload().get("ZONE"),
            Some(&serde_json::json!({ "ID": 5, "BYP": "YES" }))
        );
    }

    #[test]
    fn test_status_kind_tag_round_trip() {
        for kind in [
            StatusKind::Zones,
            StatusKind::Partitions,
            StatusKind::Scenarios,
            StatusKind::Outputs,
            StatusKind::Peripherals,
            StatusKind::Temperatures,
            StatusKind::System,
        ] {
            assert_eq!(StatusKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(StatusKind::from_tag("STATUS_NOPE"), None);
    }
}
