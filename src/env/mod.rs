//! Environment - Host-provided signals the controller depends on.
//!
//! Nothing here touches a real display or clock directly. The host hands the
//! controller an [`Environment`] bundling:
//!
//! - a [`Scheduler`] for delayed work (the resize throttle)
//! - a [`ResizeSource`] that ticks when the drawing surface changes size
//! - a [`MediaResolver`] that turns selectors into media elements
//! - the [`ContainerHandle`] the engine draws into
//!
//! [`ManualScheduler`], [`ResizeSignal`] and [`MediaRegistry`] are the stock
//! implementations. `ResizeSignal` can be fed straight from crossterm events.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::bridge::Subscription;
use crate::types::{ContainerHandle, MediaElement};

mod resize;
mod scheduler;

pub use resize::ResizeSignal;
pub use scheduler::{ManualScheduler, Scheduler, Throttle, TimerId};

// =============================================================================
// Traits
// =============================================================================

/// Source of "the surface was resized" ticks.
pub trait ResizeSource {
    fn subscribe(&self, handler: Rc<dyn Fn()>) -> Subscription;
}

/// Resolves selector strings to media elements.
pub trait MediaResolver {
    fn query_selector(&self, selector: &str) -> Option<MediaElement>;
}

// =============================================================================
// Media Registry
// =============================================================================

/// Selector table filled in by the host.
#[derive(Default)]
pub struct MediaRegistry {
    elements: RefCell<HashMap<String, MediaElement>>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, selector: impl Into<String>, element: MediaElement) {
        self.elements.borrow_mut().insert(selector.into(), element);
    }

    pub fn unregister(&self, selector: &str) {
        self.elements.borrow_mut().remove(selector);
    }
}

impl MediaResolver for MediaRegistry {
    fn query_selector(&self, selector: &str) -> Option<MediaElement> {
        self.elements.borrow().get(selector).cloned()
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Everything the controller borrows from its host.
#[derive(Clone)]
pub struct Environment {
    pub container: ContainerHandle,
    pub scheduler: Rc<dyn Scheduler>,
    pub resize: Rc<dyn ResizeSource>,
    pub media: Rc<dyn MediaResolver>,
}

impl Environment {
    /// Environment with a manual scheduler, an idle resize signal and an
    /// empty media registry.
    pub fn new(container: ContainerHandle) -> Self {
        Self {
            container,
            scheduler: Rc::new(ManualScheduler::new()),
            resize: Rc::new(ResizeSignal::new()),
            media: Rc::new(MediaRegistry::new()),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_resize(mut self, resize: Rc<dyn ResizeSource>) -> Self {
        self.resize = resize;
        self
    }

    pub fn with_media(mut self, media: Rc<dyn MediaResolver>) -> Self {
        self.media = media;
        self
    }
}
