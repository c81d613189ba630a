//! Link layer: fragments messages into frames, drives stop-and-wait with a
//! peer, reassembles inbound fragments, and discards traffic not addressed
//! to this node.

use std::collections::{HashMap, VecDeque};

use log::{debug, trace, warn};

use crate::error::BusError;
use crate::frame::Frame;
use crate::transport::Transport;

/// Maximum payload carried by a single frame; devices reject larger ones.
pub const MAX_FRAGMENT_PAYLOAD: usize = 512;

/// Per-peer reassembly and turn-taking state.
#[derive(Debug, Default)]
struct PeerState {
    /// Fragments of the reassembly currently in progress for this peer.
    partial: Vec<Frame>,
    /// The fragment number that completes `partial`, learned from the
    /// `total` field of whatever fragment started it. `None` when no
    /// reassembly is in progress.
    seq: Option<u8>,
    /// Reassembled message payloads (`None` for a NAK) that have arrived
    /// but not yet been claimed by a matching `recv_message` predicate,
    /// oldest first.
    completed: VecDeque<Option<Vec<u8>>>,
    /// True once we've sent this peer something (it may now transmit
    /// without being asked); cleared once we've received from it again.
    rx: bool,
}

impl PeerState {
    /// Folds a newly-arrived frame into this peer's state, completing a
    /// reassembly (or recording a NAK) when appropriate.
    fn ingest(&mut self, frame: Frame) {
        if frame.is_nak() {
            self.completed.push_back(None);
            return;
        }
        self.seq = Some(frame.total);
        self.partial.push(frame);
        if self.partial.last().map(|f| f.num) == self.seq {
            let mut fragments = std::mem::take(&mut self.partial);
            fragments.sort_by_key(|f| f.num);
            let joined: Vec<u8> = fragments.into_iter().flat_map(|f| f.payload).collect();
            self.completed.push_back(Some(joined).filter(|d| !d.is_empty()));
            self.seq = None;
        }
    }
}

/// Owns the transport and per-peer reassembly state for one node on the bus.
pub struct Bus<T: Transport> {
    transport: T,
    src_id: Option<u8>,
    pending: Vec<u8>,
    peers: HashMap<Option<u8>, PeerState>,
}

impl<T: Transport> Bus<T> {
    pub fn new(transport: T, src_id: Option<u8>) -> Self {
        Bus {
            transport,
            src_id,
            pending: Vec::new(),
            peers: HashMap::new(),
        }
    }

    pub fn src_id(&self) -> Option<u8> {
        self.src_id
    }

    /// Splits `payload` into `ceil(len/512)` fragments and sends them to
    /// `dest_id`, waiting for an ACK between fragments (not after the last
    /// one).
    pub fn send_message(&mut self, dest_id: Option<u8>, payload: &[u8]) -> Result<(), BusError> {
        let nframes = payload.len().div_ceil(MAX_FRAGMENT_PAYLOAD).max(1);
        if nframes > u8::MAX as usize {
            return Err(BusError::MessageTooLarge(payload.len()));
        }

        for i in 0..nframes {
            let start = i * MAX_FRAGMENT_PAYLOAD;
            let end = (start + MAX_FRAGMENT_PAYLOAD).min(payload.len());
            let frame = Frame {
                src: self.src_id,
                dest: dest_id,
                num: (i + 1) as u8,
                total: nframes as u8,
                payload: payload[start..end].to_vec(),
            };
            trace!("> frame: {frame:?}");
            self.send_frame(&frame)?;
            if i + 1 < nframes {
                self.recv_ack(dest_id)?;
            }
        }
        Ok(())
    }

    /// Emits the empty `num=0,total=0` frame: "you may speak now".
    pub fn send_req(&mut self, dest_id: Option<u8>) -> Result<(), BusError> {
        self.send_frame(&Frame::control(self.src_id, dest_id))
    }

    /// Wire-identical to `send_req`; issued after receiving a non-final
    /// fragment to keep the sender transmitting.
    pub fn send_ack(&mut self, dest_id: Option<u8>) -> Result<(), BusError> {
        self.send_frame(&Frame::control(self.src_id, dest_id))
    }

    fn send_frame(&mut self, frame: &Frame) -> Result<(), BusError> {
        let bytes = frame.pack()?;
        self.transport.write(&bytes)?;
        self.peers.entry(frame.dest).or_default().rx = true;
        Ok(())
    }

    fn recv_ack(&mut self, dest_id: Option<u8>) -> Result<(), BusError> {
        self.recv_message(dest_id, |data| data.is_none())?;
        Ok(())
    }

    /// Scans peers for a completed reassembly, and if none is ready, reads
    /// one frame at a time from the wire (sending a REQ first if it isn't
    /// already the peer's turn) until the predicate accepts a candidate
    /// payload (or the peer NAKs, whichever the predicate is looking for).
    pub fn recv_message(
        &mut self,
        peer_id: Option<u8>,
        predicate: impl Fn(Option<&[u8]>) -> bool,
    ) -> Result<Option<Vec<u8>>, BusError> {
        self.peers.entry(peer_id).or_default();

        loop {
            if let Some(ready) = self.take_ready_peer(&predicate) {
                return Ok(ready);
            }

            loop {
                if !self.peers.get(&peer_id).map(|p| p.rx).unwrap_or(false) {
                    self.send_req(peer_id)?;
                }
                if let Some(frame) = self.recv_frame()? {
                    let needs_ack = frame.num < frame.total;
                    let src = frame.src;
                    let peer = self.peers.entry(src).or_default();
                    peer.rx = false;
                    peer.ingest(frame);
                    if needs_ack {
                        self.send_ack(src)?;
                    }
                    break;
                }
            }
        }
    }

    /// Same as `recv_message`, used to iterate follow-on pushes after an
    /// initial response; returns `None` once the peer NAKs.
    pub fn recv_next_message(
        &mut self,
        dest_id: Option<u8>,
        predicate: impl Fn(Option<&[u8]>) -> bool,
    ) -> Result<Option<Vec<u8>>, BusError> {
        self.recv_message(dest_id, |data| match data {
            None => true,
            Some(bytes) => predicate(Some(bytes)),
        })
    }

    /// Looks for a completed reassembly (any peer) the predicate accepts.
    /// Non-matching completed messages are left in place, in order, for a
    /// later call to consume.
    fn take_ready_peer(
        &mut self,
        predicate: &impl Fn(Option<&[u8]>) -> bool,
    ) -> Option<Option<Vec<u8>>> {
        for peer in self.peers.values_mut() {
            if let Some(index) = peer
                .completed
                .iter()
                .position(|candidate| predicate(candidate.as_deref()))
            {
                return Some(peer.completed.remove(index).expect("index from position()"));
            }
        }
        None
    }

    /// Reads bytes from the transport until a frame decodes, discarding the
    /// whole pending buffer on a structural decode error (resync) and
    /// silently skipping frames not addressed to us or broadcast. Returns
    /// `Ok(None)` only if the transport is drained and no frame was parsed.
    fn recv_frame(&mut self) -> Result<Option<Frame>, BusError> {
        loop {
            let chunk = self.transport.read()?;
            if chunk.is_empty() && self.pending.is_empty() {
                return Ok(None);
            }
            self.pending.extend_from_slice(&chunk);

            match Frame::unpack(&self.pending) {
                Ok((frame, consumed)) => {
                    self.pending.drain(..consumed);
                    if frame.dest != self.src_id && frame.dest.is_some() {
                        continue;
                    }
                    debug!("< frame: {frame:?}");
                    return Ok(Some(frame));
                }
                Err(crate::error::FrameError::NeedMore) => {
                    if chunk.is_empty() {
                        return Ok(None);
                    }
                    continue;
                }
                Err(e) => {
                    warn!("discarding {} pending byte(s), decode error: {e}", self.pending.len());
                    self.pending.clear();
                    continue;
                }
            }
        }
    }
}
