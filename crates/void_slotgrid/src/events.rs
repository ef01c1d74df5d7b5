//! Lifecycle notifications
//!
//! Delivery is synchronous and fire-and-forget: handlers run on the calling
//! thread, in subscription order, before the mutating call returns.

use crate::item::ItemRef;

/// Notifications emitted by a [`Grid`](crate::grid::Grid)
#[derive(Debug, Clone)]
pub enum GridEvent {
    /// Item placed into the grid
    ItemAdded(ItemRef),
    /// Item could not be placed
    ItemAddFailed(ItemRef),
    /// Item taken out of the grid
    ItemRemoved(ItemRef),
    /// Item removed and placed on the ground
    ItemDropped(ItemRef),
    /// Item could not be placed on the ground
    ItemDropFailed(ItemRef),
    /// Grid extent changed
    Resized { width: u32, height: u32 },
    /// Item snapshot re-read from the store
    Rebuilt,
}

impl GridEvent {
    /// Item the event is about, if any
    pub fn item(&self) -> Option<&ItemRef> {
        match self {
            Self::ItemAdded(item)
            | Self::ItemAddFailed(item)
            | Self::ItemRemoved(item)
            | Self::ItemDropped(item)
            | Self::ItemDropFailed(item) => Some(item),
            Self::Resized { .. } | Self::Rebuilt => None,
        }
    }
}

/// Notifications emitted by a [`DragSlot`](crate::drag::DragSlot)
#[derive(Debug, Clone)]
pub enum DragEvent {
    /// Item under the idle pointer changed (`None` = nothing hovered)
    Hovered(Option<ItemRef>),
    /// Item pressed, or a drag ended where it started
    Picked(ItemRef),
    /// Item lifted out of its grid
    PickedUp(ItemRef),
    /// Carried item placed into the grid under the pointer
    Added(ItemRef),
    /// Carried item replaced a single-slot occupant
    Swapped(ItemRef),
    /// Carried item went back to its source grid
    Returned(ItemRef),
    /// Carried item placed on the ground
    Dropped(ItemRef),
}

/// Listener handle returned by `subscribe`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Listener callback type
pub type Listener<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Ordered set of listeners for one event type
pub struct Listeners<E> {
    handlers: Vec<(SubscriberId, Listener<E>)>,
    next_subscriber_id: u64,
}

impl<E> Listeners<E> {
    /// Create an empty listener set
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_subscriber_id: 1,
        }
    }

    /// Register a handler
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub_id, _)| *sub_id != id);
        self.handlers.len() != before
    }

    /// Deliver an event to every handler
    pub fn emit(&self, event: &E) {
        for (_, handler) in &self.handlers {
            handler(event);
        }
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if nobody is listening
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_emit_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners: Listeners<u32> = Listeners::new();

        let first = Arc::clone(&log);
        listeners.subscribe(move |e: &u32| first.lock().push(("first", *e)));
        let second = Arc::clone(&log);
        listeners.subscribe(move |e: &u32| second.lock().push(("second", *e)));

        listeners.emit(&7);

        assert_eq!(*log.lock(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Arc::new(Mutex::new(0));
        let mut listeners: Listeners<()> = Listeners::new();

        let c = Arc::clone(&count);
        let id = listeners.subscribe(move |_| *c.lock() += 1);
        listeners.emit(&());

        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(&());

        assert_eq!(*count.lock(), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_subscriber_ids_unique() {
        let mut listeners: Listeners<()> = Listeners::new();
        let a = listeners.subscribe(|_| {});
        let b = listeners.subscribe(|_| {});

        assert_ne!(a, b);
        assert_eq!(listeners.len(), 2);
    }

    #[test]
    fn test_grid_event_item() {
        assert!(GridEvent::Rebuilt.item().is_none());
        assert!(GridEvent::Resized { width: 1, height: 1 }.item().is_none());
    }
}
