//! Event Bridge - Subscriptions that unsubscribe exactly once.
//!
//! Every engine or region listener created by this crate goes through
//! [`subscribe`] or [`subscribe_once`] and is represented by a
//! [`Subscription`] value that owns its disposer.
//!
//! # API
//!
//! - `subscribe(target, event, callback)` - persistent listener
//! - `subscribe_once(target, event, callback)` - fires once, then removes itself
//! - `Subscription::dispose()` - idempotent unsubscribe (also runs on drop)
//! - `SubscriptionSet` - owns a group of subscriptions, disposed together
//!
//! # Example
//!
//! ```ignore
//! use spark_wave::bridge::{subscribe, SubscriptionSet};
//!
//! let mut subs = SubscriptionSet::new();
//! subs.add(subscribe(&engine, "finish", |_args| println!("done")));
//!
//! // Later: removes every listener in the set
//! subs.dispose_all();
//! ```
//!
//! Disposers hold a weak reference to the emitter, so a subscription never
//! keeps an engine or region alive, and disposing after the emitter is gone
//! is a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::engine::{Emitter, Handler};
use crate::types::EventArg;

// =============================================================================
// Subscription
// =============================================================================

/// Disposer closure run when a subscription ends.
pub type Cleanup = Box<dyn FnOnce()>;

/// A live listener registration. Dropping it unsubscribes.
pub struct Subscription {
    event: &'static str,
    disposer: Option<Cleanup>,
}

impl Subscription {
    /// Wrap an arbitrary disposer.
    pub fn new(event: &'static str, disposer: impl FnOnce() + 'static) -> Self {
        Self {
            event,
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn event(&self) -> &'static str {
        self.event
    }

    pub fn is_active(&self) -> bool {
        self.disposer.is_some()
    }

    /// Unsubscribe. Calling it again does nothing.
    pub fn dispose(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// Subscription Set
// =============================================================================

/// Subscriptions owned by one component, disposed as a group.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Number of subscriptions that are still active.
    pub fn len(&self) -> usize {
        self.subscriptions.iter().filter(|s| s.is_active()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispose every subscription, newest first.
    pub fn dispose_all(&mut self) {
        while let Some(mut subscription) = self.subscriptions.pop() {
            subscription.dispose();
        }
    }
}

impl Extend<Subscription> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.subscriptions.extend(iter);
    }
}

// =============================================================================
// Bridging
// =============================================================================

/// Forward every `event` emitted by `target` to `callback`.
pub fn subscribe<T>(
    target: &Rc<T>,
    event: &'static str,
    callback: impl Fn(&[EventArg]) + 'static,
) -> Subscription
where
    T: Emitter + ?Sized + 'static,
{
    let handler: Handler = Rc::new(callback);
    let id = target.on(event, handler);
    let weak = Rc::downgrade(target);

    tracing::trace!(event, ?id, "subscribed");

    Subscription::new(event, move || {
        if let Some(target) = weak.upgrade() {
            target.un(event, id);
            tracing::trace!(event, ?id, "unsubscribed");
        }
    })
}

/// Forward the next `event` emitted by `target` to `callback`, then unsubscribe.
///
/// The listener removes itself before `callback` runs, so a re-entrant emit
/// of the same event from inside `callback` does not reach it again.
/// Disposing the returned subscription before the event fires cancels it.
pub fn subscribe_once<T>(
    target: &Rc<T>,
    event: &'static str,
    callback: impl FnOnce(&[EventArg]) + 'static,
) -> Subscription
where
    T: Emitter + ?Sized + 'static,
{
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let pending = RefCell::new(Some(callback));

    let slot_for_handler = slot.clone();
    let inner = subscribe(target, event, move |args| {
        let own = slot_for_handler.borrow_mut().take();
        let Some(mut own) = own else {
            return;
        };
        own.dispose();

        let callback = pending.borrow_mut().take();
        if let Some(callback) = callback {
            callback(args);
        }
    });
    *slot.borrow_mut() = Some(inner);

    Subscription::new(event, move || {
        let inner = slot.borrow_mut().take();
        drop(inner);
    })
}

// =============================================================================
// Tests
// =============================================================================
