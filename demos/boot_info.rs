//! Decodes a captured boot-info response (scenario S1) into a small
//! human-readable struct. Device payload schemas are out of scope for this
//! crate; this is illustrative glue showing where such a schema would plug
//! into the protocol core's output, not a library for it.

use trainlink::frame::Frame;
use trainlink::message::Message;

enum BootMode {
    BootLoader,
    Application,
}

impl BootMode {
    fn decode(byte: u8) -> Option<Self> {
        match byte as char {
            'B' => Some(BootMode::BootLoader),
            'A' => Some(BootMode::Application),
            _ => None,
        }
    }
}

impl std::fmt::Display for BootMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootMode::BootLoader => write!(f, "BootLoader"),
            BootMode::Application => write!(f, "Application"),
        }
    }
}

struct BootInfo {
    kind: char,
    mode: BootMode,
    boot_version: (u8, u8),
    app_version: Option<(u8, u8)>,
}

impl BootInfo {
    fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < 5 {
            return None;
        }
        let kind = payload[0] as char;
        let mode = BootMode::decode(payload[1])?;
        let boot_version = decode_version(&payload[2..5]);
        let app_version = payload
            .get(5..8)
            .filter(|v| *v != b"???")
            .map(decode_version);
        Some(BootInfo {
            kind,
            mode,
            boot_version,
            app_version,
        })
    }
}

fn decode_version(bytes: &[u8]) -> (u8, u8) {
    let major = (bytes[0] as char).to_digit(10).unwrap_or(0) as u8;
    let minor = std::str::from_utf8(&bytes[1..3]).ok().and_then(|s| s.parse().ok()).unwrap_or(0);
    (major, minor)
}

fn main() {
    let wire = hex_bytes(
        "ff ff ff 01 49 2a 01 01 00 12 49 30 00 00 49 30 00 08 00 41 46 41 31 30 31 31 33 30 8c 03 ff",
    );
    let (frame, _) = Frame::unpack(&wire).expect("well-formed frame");
    let message = Message::unpack(&frame.payload).expect("well-formed message");
    let info = BootInfo::decode(&message.payload).expect("boot-info payload");

    println!(
        "kind={} mode={} boot={}.{:02} app={}",
        info.kind,
        info.mode,
        info.boot_version.0,
        info.boot_version.1,
        info.app_version
            .map(|(maj, min)| format!("{maj}.{min:02}"))
            .unwrap_or_else(|| "none".to_string()),
    );
}

fn hex_bytes(s: &str) -> Vec<u8> {
    s.split_whitespace()
        .map(|b| u8::from_str_radix(b, 16).unwrap())
        .collect()
}
