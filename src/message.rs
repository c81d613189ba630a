//! Message codec: the command envelope carried inside one or more
//! reassembled frame payloads.
//!
//! Layout, big-endian: `src(2) ‖ 0x0000 ‖ dest(2) ‖ length(2) ‖ command(2) ‖
//! payload(length)`. Addresses are two-byte ASCII tokens (`I0`..`If`, `I*`).

use crate::error::MessageError;
use crate::id::{id_for_message_token, message_token_for_id};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub src: Option<u8>,
    pub dest: Option<u8>,
    pub command: u16,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn pack(&self) -> Result<Vec<u8>, MessageError> {
        let src = message_token_for_id(self.src).ok_or(MessageError::InvalidId(self.src))?;
        let dest = message_token_for_id(self.dest).ok_or(MessageError::InvalidId(self.dest))?;

        let mut out = Vec::with_capacity(10 + self.payload.len());
        out.extend_from_slice(&src);
        out.extend_from_slice(&[0x00, 0x00]);
        out.extend_from_slice(&dest);
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.command.to_be_bytes());
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Unpacks a message, requiring the buffer to contain exactly one
    /// message and nothing else. Most callers want this; `unpack_prefix`
    /// is for Bus-internal use where a caller wants to know how many bytes
    /// were consumed instead of treating trailing bytes as an error.
    pub fn unpack(buf: &[u8]) -> Result<Message, MessageError> {
        let (message, rest) = Message::unpack_prefix(buf)?;
        if !rest.is_empty() {
            return Err(MessageError::TrailingData(rest.len()));
        }
        Ok(message)
    }

    fn unpack_prefix(buf: &[u8]) -> Result<(Message, &[u8]), MessageError> {
        if buf.len() < 10 {
            return Err(MessageError::InvalidAddress);
        }
        let src_token = [buf[0], buf[1]];
        let dest_token = [buf[4], buf[5]];
        let length = u16::from_be_bytes([buf[6], buf[7]]) as usize;
        let command = u16::from_be_bytes([buf[8], buf[9]]);

        let src = id_for_message_token(src_token).ok_or(MessageError::InvalidAddress)?;
        let dest = id_for_message_token(dest_token).ok_or(MessageError::InvalidAddress)?;

        if buf.len() < 10 + length {
            return Err(MessageError::InvalidAddress);
        }
        let payload = buf[10..10 + length].to_vec();
        let rest = &buf[10 + length..];

        Ok((
            Message {
                src,
                dest,
                command,
                payload,
            },
            rest,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_bytes(s: &str) -> Vec<u8> {
        s.split_whitespace()
            .map(|b| u8::from_str_radix(b, 16).unwrap())
            .collect()
    }

    /// S1's inner message: src=0, dest=0, cmd=0x0041, payload "FA101130".
    #[test]
    fn decodes_boot_info_request_echo() {
        let wire = hex_bytes("49 30 00 00 49 30 00 08 00 41 46 41 31 30 31 31 33 30");
        let message = Message::unpack(&wire).unwrap();
        assert_eq!(message.src, Some(0));
        assert_eq!(message.dest, Some(0));
        assert_eq!(message.command, 0x0041);
        assert_eq!(message.payload, b"FA101130");
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let message = Message {
            src: Some(2),
            dest: None,
            command: 0xbeef,
            payload: vec![1, 2, 3],
        };
        let wire = message.pack().unwrap();
        assert_eq!(Message::unpack(&wire).unwrap(), message);
    }

    #[test]
    fn trailing_data_is_rejected() {
        let message = Message {
            src: Some(0),
            dest: Some(1),
            command: 1,
            payload: vec![],
        };
        let mut wire = message.pack().unwrap();
        wire.push(0xaa);
        assert_eq!(Message::unpack(&wire), Err(MessageError::TrailingData(1)));
    }

    #[test]
    fn unmapped_address_token_is_invalid() {
        let mut wire = Message {
            src: Some(0),
            dest: Some(1),
            command: 1,
            payload: vec![],
        }
        .pack()
        .unwrap();
        wire[0] = b'Z';
        assert_eq!(Message::unpack(&wire), Err(MessageError::InvalidAddress));
    }

    #[test]
    fn pack_rejects_out_of_range_id() {
        let message = Message {
            src: Some(20),
            dest: None,
            command: 0,
            payload: vec![],
        };
        assert_eq!(message.pack(), Err(MessageError::InvalidId(Some(20))));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn valid_id() -> impl Strategy<Value = Option<u8>> {
        prop_oneof![Just(None), (0u8..16).prop_map(Some)]
    }

    proptest! {
        #[test]
        fn roundtrip(
            src in valid_id(),
            dest in valid_id(),
            command in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=256),
        ) {
            let message = Message { src, dest, command, payload };
            let wire = message.pack().unwrap();
            prop_assert_eq!(Message::unpack(&wire).unwrap(), message);
        }
    }
}
