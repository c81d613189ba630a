//! `trainlink` is a host-side driver for the three-layer framed-serial
//! protocol spoken by rail interior signage display/bootloader devices
//! over a shared RS-485 segment.
//!
//! The stack, leaf-first:
//!
//! - [`frame`]: bit-exact binary frame encoding/decoding, CRC-16, the
//!   4-bit peer ID alphabet, and resynchronization against noisy input.
//! - [`transport`]: the byte pipe underneath a frame, plus the concrete
//!   serial implementation with its RTS raise/lower discipline.
//! - [`bus`]: the link layer — fragmentation, stop-and-wait, per-peer
//!   reassembly, foreign-traffic discard.
//! - [`message`]: the command envelope carried inside reassembled frame
//!   payloads.
//! - [`message_bus`]: request/response correlation on top of a [`bus::Bus`].
//! - [`device`]: the thin `(MessageBus, peer_id)` boundary a device-family
//!   adapter builds typed operations on top of.
//!
//! This crate does not know how to talk to any particular device family —
//! display object payloads, bootloader flash blocks, and the command-line
//! tool that drives them live outside it.

pub mod bus;
pub mod device;
pub mod error;
pub mod frame;
pub mod id;
pub mod message;
pub mod message_bus;
pub mod transport;

pub use bus::Bus;
pub use device::Device;
pub use error::Error;
pub use frame::Frame;
pub use message::Message;
pub use message_bus::MessageBus;
pub use transport::{SerialConfig, SerialTransport, Transport};

mod crc;
