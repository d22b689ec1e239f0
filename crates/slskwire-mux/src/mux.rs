use serde::Serialize;
use slskwire_transport::{Transport, TransportEvent, TransportState};

use crate::error::{MuxError, Result};
use crate::event::EventKind;
use crate::handlers::{HandlerList, HandlerResult};

fn slot(kind: EventKind) -> usize {
    match kind {
        EventKind::Opened => 0,
        EventKind::Message => 1,
        EventKind::Closed => 2,
        EventKind::Errored => 3,
    }
}

/// Multiplexes one transport connection onto per-event handler lists.
///
/// Owns the transport exclusively. Each pulled notification is classified
/// to its [`EventKind`] and fanned out synchronously to that kind's
/// handlers, in registration order, before the next notification is
/// observed — delivery order equals the transport's delivery order.
pub struct ConnectionMux<T> {
    transport: T,
    handlers: [HandlerList<TransportEvent>; 4],
}

impl<T: Transport> ConnectionMux<T> {
    /// Wrap a transport. The connection is not opened until [`connect`].
    ///
    /// [`connect`]: ConnectionMux::connect
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            handlers: EventKind::ALL.map(|kind| HandlerList::new(kind.name())),
        }
    }

    /// Open the transport connection.
    ///
    /// Calling `connect` twice is undefined behavior, matching the
    /// underlying transport's contract.
    pub fn connect(&mut self) -> Result<()> {
        self.transport.open().map_err(MuxError::Transport)
    }

    /// Request transport closure. No-op when no connection is open. The
    /// `closed` event is emitted only in reaction to the transport's own
    /// closure notification, which may race with this call returning.
    pub fn close(&mut self) -> Result<()> {
        self.transport.close().map_err(MuxError::Transport)
    }

    /// Serialize `message` to JSON text and write it to the transport.
    ///
    /// Fails with [`MuxError::NotConnected`] before anything is written
    /// when the transport is not in the open state.
    pub fn send<M: Serialize + ?Sized>(&mut self, message: &M) -> Result<()> {
        if !self.transport.state().is_open() {
            return Err(MuxError::NotConnected);
        }
        let text = serde_json::to_string(message)?;
        self.transport.write(&text).map_err(MuxError::Transport)
    }

    /// Register `handler` for every future occurrence of `kind`.
    ///
    /// Multiple handlers per event are permitted and run in registration
    /// order; there is no unregister.
    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&TransportEvent) -> HandlerResult + 'static,
    ) {
        self.handlers[slot(kind)].push(handler);
    }

    /// Register by event name. Fails with [`MuxError::UnknownEvent`] for a
    /// name outside the fixed registry, without mutating any list.
    pub fn on_named(
        &mut self,
        name: &str,
        handler: impl FnMut(&TransportEvent) -> HandlerResult + 'static,
    ) -> Result<()> {
        let kind =
            EventKind::from_name(name).ok_or_else(|| MuxError::UnknownEvent(name.to_string()))?;
        self.on(kind, handler);
        Ok(())
    }

    /// Pull one transport notification, fan it out, and return it.
    ///
    /// Returns `None` once the transport's notification stream is
    /// exhausted.
    pub fn poll(&mut self) -> Option<TransportEvent> {
        let event = self.transport.next_event()?;
        self.handlers[slot(EventKind::of(&event))].dispatch(&event);
        Some(event)
    }

    /// Drive [`poll`](ConnectionMux::poll) until the connection ends.
    pub fn run(&mut self) {
        while self.poll().is_some() {}
    }

    /// Current transport state.
    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers[slot(kind)].len()
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the multiplexer and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ConnectionMux<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionMux")
            .field("transport", &self.transport)
            .finish()
    }
}
