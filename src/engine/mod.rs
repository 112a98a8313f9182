//! Engine Contract - The imperative side of the synchronization layer.
//!
//! The audio engine (decoding, drawing, playback) is an external collaborator.
//! This module only describes what the layer needs from it:
//!
//! - [`Emitter`] - named events with `on` / `un`
//! - [`Engine`] - lifecycle, loading, transport and view commands
//! - [`RegionsCapability`] - optional region support (`addRegion`, live list)
//! - [`LiveRegion`] - an engine-owned region handle with its own emitter
//!
//! All methods take `&self`: handles are shared between the controller, the
//! region reconciler and event handlers, and any mutation happens behind the
//! engine's own interior mutability.
//!
//! # Re-entrancy
//!
//! Handlers run synchronously inside the emitting call and may call back into
//! the engine, including `un` for their own subscription. Implementations must
//! not hold internal borrows while dispatching. [`HandlerRegistry`] handles
//! this for you.

use std::rc::Rc;

use crate::config::EngineOptions;
use crate::types::{Blob, EventArg, MediaElement, Peaks, RegionBounds, RegionDescriptor};

mod registry;

#[cfg(test)]
pub(crate) mod mock;

pub use registry::HandlerRegistry;

// =============================================================================
// Handler Types
// =============================================================================

/// Engine event handler. Receives the normalized payload.
pub type Handler = Rc<dyn Fn(&[EventArg])>;

/// Identifies one handler registration on one emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub usize);

// =============================================================================
// Traits
// =============================================================================

/// Something that emits named events.
pub trait Emitter {
    /// Register `handler` for `event`.
    fn on(&self, event: &str, handler: Handler) -> HandlerId;

    /// Remove one registration. Unknown ids are ignored.
    fn un(&self, event: &str, id: HandlerId);

    /// Remove every registration for `event`.
    fn un_all(&self, event: &str);
}

/// The audio rendering engine.
///
/// Positions passed to `seek_to` / `seek_and_center` are normalized to
/// `[0, 1]`. Event payload conventions:
///
/// - `audioprocess` - current time in seconds
/// - `seek` - progress in `[0, 1]`
/// - `error` - message text
pub trait Engine: Emitter {
    fn init(&self, options: &EngineOptions);
    fn load(&self, url: &str, peaks: Option<&Peaks>);
    fn load_blob(&self, blob: &Blob, peaks: Option<&Peaks>);
    fn load_media_element(&self, element: &MediaElement, peaks: Option<&Peaks>);

    fn play(&self);
    fn pause(&self);
    fn is_playing(&self) -> bool;

    fn set_volume(&self, volume: f64);
    fn zoom(&self, level: f64);
    fn set_playback_rate(&self, rate: f64);

    fn seek_to(&self, progress: f64);
    fn seek_and_center(&self, progress: f64);

    /// Total duration in seconds. Zero until a source is decoded.
    fn duration(&self) -> f64;

    fn draw_buffer(&self);
    fn destroy(&self);

    /// Region support, if the engine has it.
    fn regions(&self) -> Option<Rc<dyn RegionsCapability>>;
}

/// Region management exposed by engines that support it.
pub trait RegionsCapability {
    fn add_region(&self, descriptor: &RegionDescriptor) -> Rc<dyn LiveRegion>;

    /// Regions currently alive in the engine, including ones the user drew.
    fn list(&self) -> Vec<Rc<dyn LiveRegion>>;
}

/// Engine-owned region handle.
///
/// Emits at least `remove` when it is removed, plus interaction events such
/// as `in`, `out`, `update`, `click`, `dbclick`, `over` and `leave`.
pub trait LiveRegion: Emitter {
    fn id(&self) -> String;
    fn start(&self) -> f64;
    fn end(&self) -> f64;
    fn update(&self, bounds: RegionBounds);
    fn remove(&self);
}
