//! JIT resource-event subsystem.
//!
//! The loader exposes no stable handle to a freshly JIT'ed module; the only
//! reliable extraction point for its binary image is the module-loaded event.
//! Subscriptions follow the subscribe / enable / disable / unsubscribe
//! protocol, and [`EventSubscription`] wraps the whole dance in a scoped
//! guard so teardown happens on every exit path.

use crate::error::DriverError;

/// Opaque identifier of one event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A resource event delivered by the JIT subsystem.
#[derive(Debug, Clone)]
pub enum ResourceEvent {
    /// A module finished JIT loading; carries the vendor-defined binary image.
    ModuleLoaded { payload: Vec<u8> },
}

/// Handler invoked for each delivered event while its subscription is enabled.
pub type EventHandler = Box<dyn FnMut(&ResourceEvent) + Send>;

/// Subscribe / enable / disable / unsubscribe around the resource-event
/// category.
pub trait JitEvents {
    fn subscribe(&self, handler: EventHandler) -> Result<SubscriptionId, DriverError>;
    fn enable(&self, id: SubscriptionId) -> Result<(), DriverError>;
    fn disable(&self, id: SubscriptionId) -> Result<(), DriverError>;
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), DriverError>;
}

/// Scoped subscription: subscribed and enabled on construction, disabled and
/// unsubscribed on drop.
pub struct EventSubscription<'a> {
    events: &'a dyn JitEvents,
    id: SubscriptionId,
}

impl<'a> EventSubscription<'a> {
    /// Subscribe `handler` and enable delivery.
    pub fn scoped(events: &'a dyn JitEvents, handler: EventHandler) -> Result<Self, DriverError> {
        let id = events.subscribe(handler)?;
        if let Err(e) = events.enable(id) {
            let _ = events.unsubscribe(id);
            return Err(e);
        }
        Ok(Self { events, id })
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for EventSubscription<'_> {
    fn drop(&mut self) {
        // Teardown is unconditional; a failed disable must not skip the
        // unsubscribe.
        let _ = self.events.disable(self.id);
        let _ = self.events.unsubscribe(self.id);
    }
}
