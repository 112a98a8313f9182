//! Handler registry - a ready-made [`Emitter`](super::Emitter) backing store.
//!
//! Engine implementations embed one registry per emitter and forward
//! `on` / `un` / `un_all` to it, then call [`HandlerRegistry::emit`].
//!
//! Dispatch works on a snapshot of the handler list, so a handler may
//! unsubscribe itself (or others) mid-dispatch without a borrow conflict.
//! Handlers removed during a dispatch still see that dispatch if they were
//! already in the snapshot; one-shot handlers guard against that themselves.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{Handler, HandlerId};
use crate::types::EventArg;

#[derive(Default)]
struct Inner {
    handlers: HashMap<String, Vec<(HandlerId, Handler)>>,
    next_id: usize,
}

impl Inner {
    fn next_id(&mut self) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Per-emitter handler storage with snapshot dispatch.
#[derive(Default)]
pub struct HandlerRegistry {
    inner: RefCell<Inner>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, event: &str, handler: Handler) -> HandlerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id();
        inner
            .handlers
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    pub fn un(&self, event: &str, id: HandlerId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(handlers) = inner.handlers.get_mut(event) {
            handlers.retain(|(handler_id, _)| *handler_id != id);
            if handlers.is_empty() {
                inner.handlers.remove(event);
            }
        }
    }

    pub fn un_all(&self, event: &str) {
        self.inner.borrow_mut().handlers.remove(event);
    }

    /// Remove every handler for every event.
    pub fn clear(&self) {
        self.inner.borrow_mut().handlers.clear();
    }

    /// Call every handler registered for `event`, in registration order.
    pub fn emit(&self, event: &str, args: &[EventArg]) {
        let snapshot: Vec<Handler> = {
            let inner = self.inner.borrow();
            match inner.handlers.get(event) {
                Some(handlers) => handlers.iter().map(|(_, h)| h.clone()).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            handler(args);
        }
    }

    /// Handlers currently registered for `event`.
    pub fn count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .handlers
            .get(event)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Handlers registered across all events.
    pub fn total(&self) -> usize {
        self.inner.borrow().handlers.values().map(Vec::len).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================
