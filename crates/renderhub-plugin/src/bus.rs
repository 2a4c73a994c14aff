//! Event bus — named publish/subscribe channel registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, warn};

/// Handler invoked for every emission on a subscribed channel.
///
/// A handler error is logged and does not stop the remaining handlers
/// in the same emit.
pub type EventHandler = Arc<dyn Fn(&[Value]) -> Result<(), String> + Send + Sync>;

/// Named publish/subscribe channel registry.
///
/// Handlers on a channel run in registration order. No ordering guarantee
/// exists across different channels.
pub struct EventBus {
    /// Channel name → ordered handler list.
    channels: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl EventBus {
    /// Creates a new empty event bus.
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a handler under a named channel.
    ///
    /// The handler is appended to the channel's ordered list. Registering
    /// the identical handler reference twice is permitted and fires twice.
    pub fn on(&self, event: &str, handler: EventHandler) {
        let mut channels = self.channels_mut();
        channels.entry(event.to_string()).or_default().push(handler);
        debug!(event = %event, "Event handler registered");
    }

    /// Invokes every currently-registered handler for the channel, in
    /// registration order, passing through all arguments.
    ///
    /// Handler failures are logged per-handler and never abort the
    /// remaining handlers in the same emit.
    pub fn emit(&self, event: &str, args: &[Value]) {
        let handlers: Vec<EventHandler> = {
            let channels = self.channels();
            channels.get(event).cloned().unwrap_or_default()
        };

        for handler in handlers {
            if let Err(e) = handler(args) {
                warn!(event = %event, error = %e, "Event handler failed");
            }
        }
    }

    /// Removes the first handler on the channel matching the given
    /// reference. Other registrations of the same reference remain.
    pub fn off(&self, event: &str, handler: &EventHandler) {
        let mut channels = self.channels_mut();
        if let Some(handlers) = channels.get_mut(event) {
            if let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
                handlers.remove(pos);
                debug!(event = %event, "Event handler removed");
            }
        }
    }

    /// Returns the number of handlers registered on a channel.
    pub fn handler_count(&self, event: &str) -> usize {
        let channels = self.channels();
        channels.get(event).map(Vec::len).unwrap_or(0)
    }

    // A panicking handler must not wedge the bus for everyone else, so
    // poisoned locks are recovered rather than propagated.
    fn channels(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<EventHandler>>> {
        self.channels.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn channels_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<EventHandler>>> {
        self.channels.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels = self.channels();
        f.debug_struct("EventBus")
            .field("channels", &channels.keys().collect::<Vec<_>>())
            .finish()
    }
}
