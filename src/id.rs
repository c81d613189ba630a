//! The 4-bit peer address space shared by the frame and message layers.
//!
//! Both layers address a peer as `Option<u8>`: `Some(0..=15)` for a
//! concrete peer, `None` for the broadcast/unknown wildcard. Each layer has
//! its own on-wire alphabet (frames use single bytes, messages use 2-byte
//! ASCII tokens), so the tables live here but the pack/unpack code stays in
//! `frame.rs` and `message.rs`.

/// The frame-layer byte alphabet: index `i` maps to `FRAME_ID_BYTES[i]`,
/// and the broadcast/unknown slot maps to `FRAME_BROADCAST_BYTE`.
pub const FRAME_ID_BYTES: [u8; 16] = *b"IJKLMNOpqrstuvwx";
pub const FRAME_BROADCAST_BYTE: u8 = b'*';

pub fn frame_byte_for_id(id: Option<u8>) -> Option<u8> {
    match id {
        None => Some(FRAME_BROADCAST_BYTE),
        Some(i) if (i as usize) < FRAME_ID_BYTES.len() => Some(FRAME_ID_BYTES[i as usize]),
        Some(_) => None,
    }
}

pub fn id_for_frame_byte(byte: u8) -> Option<Option<u8>> {
    if byte == FRAME_BROADCAST_BYTE {
        return Some(None);
    }
    FRAME_ID_BYTES
        .iter()
        .position(|&b| b == byte)
        .map(|i| Some(i as u8))
}

/// The message-layer 2-byte ASCII address token for a peer id, e.g. `I0`,
/// `Id`, `If`, or `I*` for broadcast/unknown.
pub fn message_token_for_id(id: Option<u8>) -> Option<[u8; 2]> {
    match id {
        None => Some(*b"I*"),
        Some(i) if i < 16 => {
            let nibble = char::from_digit(i as u32, 16).expect("i < 16") as u8;
            Some([b'I', nibble.to_ascii_lowercase()])
        }
        Some(_) => None,
    }
}

pub fn id_for_message_token(token: [u8; 2]) -> Option<Option<u8>> {
    if token == *b"I*" {
        return Some(None);
    }
    if token[0] != b'I' {
        return None;
    }
    (token[1] as char)
        .to_digit(16)
        .map(|nibble| Some(nibble as u8))
}

/// True if `id` matches `target`, where `None` (broadcast/unknown) matches
/// anything and anything matches `None`. Used for both source and
/// destination comparisons in message-layer predicates.
pub fn id_matches(id: Option<u8>, target: Option<u8>) -> bool {
    id.is_none() || target.is_none() || id == target
}
