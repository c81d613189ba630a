use thiserror::Error;

/// Errors produced while decoding or encoding a [`crate::frame::Frame`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FrameError {
    /// Not enough bytes are buffered yet to decide anything; the caller
    /// should read more bytes and try again.
    #[error("need more bytes")]
    NeedMore,
    #[error("invalid preamble byte")]
    InvalidPreamble,
    #[error("invalid postamble byte")]
    InvalidPostamble,
    #[error("checksum mismatch")]
    BadChecksum,
    #[error("address byte does not map to a known peer id")]
    InvalidAddress,
    /// Raised by `pack` when asked to encode a `src`/`dest` id outside the
    /// mapped ID alphabet.
    #[error("id {0:?} has no wire encoding")]
    InvalidId(Option<u8>),
}

/// Errors from the byte transport (serial I/O).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
}

/// Errors from the link layer (`Bus`).
#[derive(Debug, Error)]
pub enum BusError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A message payload would require more than 255 fragments (`total` is
    /// a single byte on the wire).
    #[error("message of {0} bytes needs more than 255 fragments")]
    MessageTooLarge(usize),
}

/// Errors from the message codec.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MessageError {
    #[error("address token does not map to a known peer id")]
    InvalidAddress,
    #[error("id {0:?} has no wire encoding")]
    InvalidId(Option<u8>),
    #[error("{0} trailing byte(s) after message payload")]
    TrailingData(usize),
}

/// Errors surfaced by the message bus / device surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The peer did not answer before the transport's read deadline.
    #[error("timed out waiting for a reply")]
    Timeout,
    /// The remote device returned a well-formed response carrying an
    /// application-level error status. The device layer, not the protocol
    /// core, decides what counts as a reject; this variant just carries the
    /// opaque payload for the caller to interpret.
    #[error("peer rejected the request")]
    PeerReject(Vec<u8>),
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Error::Bus(BusError::Frame(e))
    }
}
