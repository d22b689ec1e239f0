//! The fixed connection-event registry.
//!
//! Four lifecycle events, closed at compile time. The string form exists
//! only for callers registering across a non-Rust boundary; in-crate code
//! uses the enum directly.

use slskwire_transport::TransportEvent;

/// The four recognized connection events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The connection was established.
    Opened,
    /// A text message arrived.
    Message,
    /// The connection ended.
    Closed,
    /// A transport-level error occurred.
    Errored,
}

impl EventKind {
    /// Every recognized event, in registry order.
    pub const ALL: [EventKind; 4] = [
        EventKind::Opened,
        EventKind::Message,
        EventKind::Closed,
        EventKind::Errored,
    ];

    /// The registry name of this event.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Opened => "opened",
            EventKind::Message => "message",
            EventKind::Closed => "closed",
            EventKind::Errored => "errored",
        }
    }

    /// Look up an event by registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Classify a transport notification into its event kind.
    pub fn of(event: &TransportEvent) -> Self {
        match event {
            TransportEvent::Opened => EventKind::Opened,
            TransportEvent::Message(_) => EventKind::Message,
            TransportEvent::Closed => EventKind::Closed,
            TransportEvent::Errored(_) => EventKind::Errored,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
