//! Device surface: the thin boundary a device-family adapter (display,
//! bootloader) builds on. The protocol core never interprets payload bytes.

use crate::error::Error;
use crate::message::Message;
use crate::message_bus::MessageBus;
use crate::transport::Transport;

/// A peer reached through a shared `MessageBus`. Does not own the bus, so
/// several `Device`s may address different peers over the same connection.
pub struct Device<'a, T: Transport> {
    bus: &'a mut MessageBus<T>,
    peer_id: Option<u8>,
}

impl<'a, T: Transport> Device<'a, T> {
    pub fn new(bus: &'a mut MessageBus<T>, peer_id: Option<u8>) -> Self {
        Device { bus, peer_id }
    }

    pub fn peer_id(&self) -> Option<u8> {
        self.peer_id
    }

    /// Sends an opaque command and returns the response payload.
    pub fn send_command(&mut self, command: u16, payload: &[u8]) -> Result<Vec<u8>, Error> {
        self.bus.send_command(self.peer_id, command, payload)
    }

    /// Collects every follow-on message for `command` until the peer NAKs,
    /// e.g. a multi-part diagnostic dump.
    pub fn recv_messages(&mut self, command: u16) -> Result<Vec<Message>, Error> {
        self.bus.recv_messages(self.peer_id, Some(command))
    }
}
