//! Resize signal - handler registry for surface resize ticks.
//!
//! Bridges crossterm's `Event::Resize` into resize ticks and keeps the last
//! known size in a reactive signal.
//!
//! # Example
//!
//! ```ignore
//! use spark_wave::env::ResizeSignal;
//! use std::time::Duration;
//!
//! let resize = Rc::new(ResizeSignal::new());
//! resize.detect_size();
//!
//! // Host event loop
//! loop {
//!     if crossterm::event::poll(Duration::from_millis(16))? {
//!         let event = crossterm::event::read()?;
//!         if !resize.route(&event) {
//!             // keyboard / mouse handling
//!         }
//!     }
//! }
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossterm::event::Event as CrosstermEvent;
use spark_signals::{signal, Signal};

use super::ResizeSource;
use crate::bridge::Subscription;

type ResizeHandler = Rc<dyn Fn()>;

#[derive(Default)]
struct Handlers {
    entries: Vec<(usize, ResizeHandler)>,
    next_id: usize,
}

/// Resize tick dispatcher with the current size as a signal.
pub struct ResizeSignal {
    handlers: Rc<RefCell<Handlers>>,
    size: Signal<(u16, u16)>,
}

impl Default for ResizeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizeSignal {
    pub fn new() -> Self {
        Self {
            handlers: Rc::new(RefCell::new(Handlers::default())),
            size: signal((80, 24)),
        }
    }

    /// Last known (width, height).
    pub fn size(&self) -> (u16, u16) {
        self.size.get()
    }

    /// The size signal, for reactive tracking.
    pub fn size_signal(&self) -> Signal<(u16, u16)> {
        self.size.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().entries.len()
    }

    /// Record a new size and tick every subscriber.
    pub fn dispatch(&self, width: u16, height: u16) {
        self.size.set((width, height));

        let snapshot: Vec<ResizeHandler> = self
            .handlers
            .borrow()
            .entries
            .iter()
            .map(|(_, h)| h.clone())
            .collect();

        tracing::trace!(width, height, subscribers = snapshot.len(), "resize");
        for handler in snapshot {
            handler();
        }
    }

    /// Dispatch if `event` is a terminal resize. Returns true if it was.
    pub fn route(&self, event: &CrosstermEvent) -> bool {
        match event {
            CrosstermEvent::Resize(width, height) => {
                self.dispatch(*width, *height);
                true
            }
            _ => false,
        }
    }

    /// Seed the size signal from the terminal without ticking subscribers.
    pub fn detect_size(&self) {
        if let Ok((width, height)) = crossterm::terminal::size() {
            self.size.set((width, height));
        }
    }
}

impl ResizeSource for ResizeSignal {
    fn subscribe(&self, handler: Rc<dyn Fn()>) -> Subscription {
        let id = {
            let mut handlers = self.handlers.borrow_mut();
            let id = handlers.next_id;
            handlers.next_id += 1;
            handlers.entries.push((id, handler));
            id
        };

        let weak: Weak<RefCell<Handlers>> = Rc::downgrade(&self.handlers);
        Subscription::new("resize", move || {
            if let Some(handlers) = weak.upgrade() {
                handlers.borrow_mut().entries.retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
