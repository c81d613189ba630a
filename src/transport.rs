//! Byte transport: an ordered, byte-granular duplex pipe with explicit
//! direction control. `read` returns whatever bytes are currently available
//! (possibly none); `write` is synchronous and best-effort.

use std::io::{Read, Write as _};
use std::thread::sleep;
use std::time::Duration;

use log::{debug, trace};
use serialport::SerialPort;

use crate::error::TransportError;

/// Default baud rate for the shared RS-485 segment.
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Approximate per-byte settle delay applied after a write when flow control
/// is disabled, to let the UART FIFO drain before RTS is lowered.
const SETTLE_MICROS_PER_BYTE: u64 = 200;

pub trait Transport {
    /// Returns whatever bytes are currently available. May return an empty
    /// vector; this is a poll, not a blocking read-until-N-bytes.
    fn read(&mut self) -> Result<Vec<u8>, TransportError>;
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;
}

/// Construction parameters for [`SerialTransport`].
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub device: String,
    pub baud_rate: u32,
    pub flow_control: bool,
    /// Apply [`SETTLE_MICROS_PER_BYTE`] after each write. Disable when
    /// `flow_control` already guarantees the line is clear (CTS-gated).
    pub settle_after_write: bool,
    pub read_timeout: Duration,
}

impl SerialConfig {
    pub fn new(device: impl Into<String>) -> Self {
        SerialConfig {
            device: device.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            flow_control: true,
            settle_after_write: true,
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// Owns one RS-485 serial port. RTS is raised before a write and lowered
/// once it settles; reads always begin with RTS low. Dropping a
/// `SerialTransport` lowers RTS and closes the underlying file descriptor,
/// on every exit path including a panic unwind.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
    settle_after_write: bool,
}

impl SerialTransport {
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let mut port = serialport::new(&config.device, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(if config.flow_control {
                serialport::FlowControl::Hardware
            } else {
                serialport::FlowControl::None
            })
            .timeout(config.read_timeout)
            .open()?;
        port.write_request_to_send(false)?;
        port.clear(serialport::ClearBuffer::All)?;
        debug!(target: &config.device, "opened serial transport at {} baud", config.baud_rate);
        Ok(SerialTransport {
            port,
            name: config.device.clone(),
            settle_after_write: config.settle_after_write,
        })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self) -> Result<Vec<u8>, TransportError> {
        self.port.write_request_to_send(false)?;
        let available = self.port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; available];
        let n = match self.port.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
            Err(e) => return Err(TransportError::Io(e)),
        };
        buf.truncate(n);
        if !buf.is_empty() {
            trace!(target: &self.name, "  <: {}", hex(&buf));
        }
        Ok(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        trace!(target: &self.name, "  >: {}", hex(data));
        self.port.write_request_to_send(true)?;
        self.port.write_all(data)?;
        self.port.flush()?;
        if self.settle_after_write {
            sleep(Duration::from_micros(SETTLE_MICROS_PER_BYTE * data.len() as u64));
        }
        self.port.write_request_to_send(false)?;
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        let _ = self.port.write_request_to_send(false);
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}
