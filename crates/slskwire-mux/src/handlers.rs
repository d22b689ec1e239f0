//! Ordered handler lists with failure isolation.

use tracing::warn;

/// Error type a handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by event handlers.
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// An ordered list of subscribers for one event kind.
///
/// Handlers are invoked in registration order. There is no de-duplication
/// and no unregister operation. `dispatch` is the isolation boundary: a
/// handler returning `Err` is logged and the remaining handlers still run,
/// so one subscriber's failure cannot starve the others.
pub struct HandlerList<E> {
    label: &'static str,
    entries: Vec<Box<dyn FnMut(&E) -> HandlerResult>>,
}

impl<E> HandlerList<E> {
    /// Create an empty list labeled for log output.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: Vec::new(),
        }
    }

    /// Append a handler. It will be invoked after all previously
    /// registered handlers, for every future dispatch.
    pub fn push(&mut self, handler: impl FnMut(&E) -> HandlerResult + 'static) {
        self.entries.push(Box::new(handler));
    }

    /// Invoke every handler in registration order with `event`.
    pub fn dispatch(&mut self, event: &E) {
        for handler in &mut self.entries {
            if let Err(err) = handler(event) {
                warn!(event = self.label, error = %err, "event handler failed");
            }
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> std::fmt::Debug for HandlerList<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerList")
            .field("label", &self.label)
            .field("len", &self.entries.len())
            .finish()
    }
}
