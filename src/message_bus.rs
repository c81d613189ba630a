//! Request/response correlation on top of a [`Bus`]: builds and parses
//! [`Message`]s, and filters inbound payloads by source/destination/command.

use log::debug;

use crate::bus::Bus;
use crate::error::Error;
use crate::id::id_matches;
use crate::message::Message;
use crate::transport::Transport;

/// How a candidate reassembled payload is judged against what a caller is
/// waiting for. Kept as a small enum rather than a closure so it never has
/// to capture `&mut Bus` (see the crate's predicate design note).
#[derive(Debug, Clone, Copy)]
enum RecvPredicate {
    /// Accept any well-formed message addressed to us from the expected
    /// peer, regardless of command.
    AcceptAnyAddressed,
    /// As above, but the command code must also match.
    MatchCommand(u16),
}

impl RecvPredicate {
    fn accepts(self, own_id: Option<u8>, peer_id: Option<u8>, data: Option<&[u8]>) -> bool {
        let Some(bytes) = data else {
            return false;
        };
        let Ok(message) = Message::unpack(bytes) else {
            debug!("could not parse message from {} byte(s), ignoring", bytes.len());
            return false;
        };
        if !id_matches(message.src, peer_id) || !id_matches(message.dest, own_id) {
            return false;
        }
        match self {
            RecvPredicate::AcceptAnyAddressed => true,
            RecvPredicate::MatchCommand(command) => message.command == command,
        }
    }
}

/// Wraps a [`Bus`], adding message-level request/response semantics.
pub struct MessageBus<T: Transport> {
    bus: Bus<T>,
    src_id: Option<u8>,
}

impl<T: Transport> MessageBus<T> {
    pub fn new(bus: Bus<T>, src_id: Option<u8>) -> Self {
        MessageBus { bus, src_id }
    }

    pub fn send_message(&mut self, dest_id: Option<u8>, message: &Message) -> Result<(), Error> {
        debug!(">> msg: {message:?}");
        let bytes = message.pack().map_err(Error::Message)?;
        self.bus.send_message(dest_id, &bytes).map_err(Error::Bus)
    }

    /// Waits for and returns the first message from `dest_id` matching
    /// `command` (any command, if `None`). Non-matching decodable messages
    /// remain buffered for a later receiver.
    pub fn recv_message(&mut self, dest_id: Option<u8>, command: Option<u16>) -> Result<Message, Error> {
        let own_id = self.src_id;
        let predicate = match command {
            Some(c) => RecvPredicate::MatchCommand(c),
            None => RecvPredicate::AcceptAnyAddressed,
        };
        let data = self
            .bus
            .recv_message(dest_id, |candidate| predicate.accepts(own_id, dest_id, candidate))
            .map_err(Error::Bus)?
            .ok_or(Error::Timeout)?;
        let message = Message::unpack(&data).map_err(Error::Message)?;
        debug!("<< msg: {message:?}");
        Ok(message)
    }

    /// Collects follow-on messages until the peer signals end-of-stream
    /// with a NAK control frame.
    pub fn recv_messages(&mut self, dest_id: Option<u8>, command: Option<u16>) -> Result<Vec<Message>, Error> {
        let own_id = self.src_id;
        let predicate = match command {
            Some(c) => RecvPredicate::MatchCommand(c),
            None => RecvPredicate::AcceptAnyAddressed,
        };
        let mut messages = Vec::new();
        loop {
            let data = self
                .bus
                .recv_next_message(dest_id, |candidate| predicate.accepts(own_id, dest_id, candidate))
                .map_err(Error::Bus)?;
            let Some(data) = data else {
                break;
            };
            let message = Message::unpack(&data).map_err(Error::Message)?;
            debug!("<< msg: {message:?}");
            messages.push(message);
        }
        Ok(messages)
    }

    /// Sends `command`/`payload` to `dest_id` and returns the matching
    /// response's payload.
    pub fn send_command(&mut self, dest_id: Option<u8>, command: u16, payload: &[u8]) -> Result<Vec<u8>, Error> {
        let message = Message {
            src: self.src_id,
            dest: dest_id,
            command,
            payload: payload.to_vec(),
        };
        self.send_message(dest_id, &message)?;
        let reply = self.recv_message(dest_id, Some(command))?;
        Ok(reply.payload)
    }
}
