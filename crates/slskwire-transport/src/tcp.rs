use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{Transport, TransportEvent, TransportState};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Default maximum inbound message size: 16 MiB.
pub const DEFAULT_MAX_MESSAGE: usize = 16 * 1024 * 1024;

/// TCP transport carrying one text message per newline-terminated line.
///
/// Outbound messages are written as `<text>\n`; inbound bytes are
/// accumulated and split on `\n`. Line framing is sound for JSON payloads
/// because serialized JSON never contains a raw newline.
///
/// Handles partial reads internally — callers always get complete messages.
pub struct TcpTransport {
    addr: String,
    stream: Option<TcpStream>,
    state: TransportState,
    buf: BytesMut,
    pending: VecDeque<TransportEvent>,
    max_message_size: usize,
    /// Discarding bytes up to the next terminator after an oversized line.
    skipping: bool,
    closed_delivered: bool,
}

impl TcpTransport {
    /// Create a transport targeting `addr` (host:port). Does not connect.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            stream: None,
            state: TransportState::Disconnected,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            pending: VecDeque::new(),
            max_message_size: DEFAULT_MAX_MESSAGE,
            skipping: false,
            closed_delivered: false,
        }
    }

    /// Override the maximum inbound message size.
    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    /// The address this transport connects to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Extract the next complete line from the read buffer, if any.
    fn take_line(&mut self) -> Option<TransportEvent> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            if self.skipping {
                self.buf.advance(pos + 1);
                self.skipping = false;
                continue;
            }

            if pos > self.max_message_size {
                self.buf.advance(pos + 1);
                return Some(TransportEvent::Errored(TransportError::MessageTooLarge {
                    size: pos,
                    max: self.max_message_size,
                }));
            }

            let line = self.buf.split_to(pos);
            self.buf.advance(1);

            match std::str::from_utf8(line.as_ref()) {
                Ok(text) => return Some(TransportEvent::Message(text.to_string())),
                Err(err) => return Some(TransportEvent::Errored(err.into())),
            }
        }

        if self.skipping {
            // Everything buffered belongs to the line being discarded.
            self.buf.clear();
            return None;
        }

        if self.buf.len() > self.max_message_size {
            let size = self.buf.len();
            self.buf.clear();
            self.skipping = true;
            return Some(TransportEvent::Errored(TransportError::MessageTooLarge {
                size,
                max: self.max_message_size,
            }));
        }

        None
    }

    fn enter_closed(&mut self) {
        self.stream = None;
        self.state = TransportState::Closed;
        self.buf.clear();
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> Result<()> {
        let stream = TcpStream::connect(&self.addr).map_err(|source| TransportError::Connect {
            addr: self.addr.clone(),
            source,
        })?;
        debug!(addr = %self.addr, "connected");

        self.stream = Some(stream);
        self.state = TransportState::Open;
        self.pending.push_back(TransportEvent::Opened);
        Ok(())
    }

    fn state(&self) -> TransportState {
        self.state
    }

    fn write(&mut self, text: &str) -> Result<()> {
        if !self.state.is_open() {
            return Err(TransportError::NotConnected);
        }
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        let mut wire = BytesMut::with_capacity(text.len() + 1);
        wire.extend_from_slice(text.as_bytes());
        wire.extend_from_slice(b"\n");

        let mut offset = 0usize;
        while offset < wire.len() {
            match stream.write(&wire[offset..]) {
                Ok(0) => return Err(TransportError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match stream.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            debug!(addr = %self.addr, "closing connection");
            self.state = TransportState::Closed;
            stream.shutdown(Shutdown::Both)?;
        }
        Ok(())
    }

    fn next_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        if self.closed_delivered || self.stream.is_none() {
            return None;
        }

        loop {
            if let Some(event) = self.take_line() {
                return Some(event);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = {
                let stream = self.stream.as_mut()?;
                stream.read(&mut chunk)
            };

            match read {
                Ok(0) => {
                    // A partial trailing line has no terminator and is dropped.
                    self.enter_closed();
                    self.closed_delivered = true;
                    return Some(TransportEvent::Closed);
                }
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.enter_closed();
                    self.pending.push_back(TransportEvent::Closed);
                    self.closed_delivered = true;
                    return Some(TransportEvent::Errored(TransportError::Io(err)));
                }
            }
        }
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("addr", &self.addr)
            .field("state", &self.state)
            .finish()
    }
}
