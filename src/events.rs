//! Event Tables - Every engine and region event the layer forwards.
//!
//! Each event has a fixed callback slot. The tables replace name-derived
//! lookups ("on" + capitalized event name) with explicit `match`es, so the
//! full event surface is listed here and nowhere else.
//!
//! | table | emitter | callback naming |
//! |---|---|---|
//! | [`PlayerEvent`] | engine | `on_<event>` |
//! | [`RegionsEvent`] | engine (region plugin) | `on_region_<event>` |
//! | [`RegionEvent`] | each live region | `on_single_region_<event>` |

use std::fmt;
use std::rc::Rc;

use crate::engine::{Engine, LiveRegion};
use crate::types::EventArg;

// =============================================================================
// Payloads
// =============================================================================

/// Payload for engine-level callbacks: raw arguments plus the engine.
pub struct EngineEvent<'a> {
    pub original_args: &'a [EventArg],
    pub engine: &'a Rc<dyn Engine>,
}

/// Payload for `on_pos_change`.
pub struct PositionChange<'a> {
    /// New position in seconds.
    pub seconds: f64,
    pub engine: &'a Rc<dyn Engine>,
}

/// Payload for per-region callbacks.
pub struct SingleRegionEvent<'a> {
    pub region: &'a Rc<dyn LiveRegion>,
    pub engine: &'a Rc<dyn Engine>,
    pub original_args: &'a [EventArg],
}

pub type EngineCallback = Rc<dyn Fn(&EngineEvent<'_>)>;
pub type PositionCallback = Rc<dyn Fn(&PositionChange<'_>)>;
pub type SingleRegionCallback = Rc<dyn Fn(&SingleRegionEvent<'_>)>;

// =============================================================================
// Player Events
// =============================================================================

/// Engine events forwarded to player callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerEvent {
    AudioProcess,
    Error,
    Finish,
    Loading,
    MouseUp,
    Pause,
    Play,
    Ready,
    Scroll,
    Seek,
    Zoom,
}

impl PlayerEvent {
    pub const ALL: [PlayerEvent; 11] = [
        PlayerEvent::AudioProcess,
        PlayerEvent::Error,
        PlayerEvent::Finish,
        PlayerEvent::Loading,
        PlayerEvent::MouseUp,
        PlayerEvent::Pause,
        PlayerEvent::Play,
        PlayerEvent::Ready,
        PlayerEvent::Scroll,
        PlayerEvent::Seek,
        PlayerEvent::Zoom,
    ];

    /// Engine event name.
    pub fn name(self) -> &'static str {
        match self {
            PlayerEvent::AudioProcess => "audioprocess",
            PlayerEvent::Error => "error",
            PlayerEvent::Finish => "finish",
            PlayerEvent::Loading => "loading",
            PlayerEvent::MouseUp => "mouseup",
            PlayerEvent::Pause => "pause",
            PlayerEvent::Play => "play",
            PlayerEvent::Ready => "ready",
            PlayerEvent::Scroll => "scroll",
            PlayerEvent::Seek => "seek",
            PlayerEvent::Zoom => "zoom",
        }
    }
}

impl fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callback slots for engine events.
#[derive(Clone, Default)]
pub struct PlayerCallbacks {
    /// Position changes in seconds, from playback progress and seeks.
    pub on_pos_change: Option<PositionCallback>,
    pub on_audioprocess: Option<EngineCallback>,
    /// Engine-originated errors. Never turned into `Err` values.
    pub on_error: Option<EngineCallback>,
    pub on_finish: Option<EngineCallback>,
    pub on_loading: Option<EngineCallback>,
    pub on_mouseup: Option<EngineCallback>,
    pub on_pause: Option<EngineCallback>,
    pub on_play: Option<EngineCallback>,
    pub on_ready: Option<EngineCallback>,
    pub on_scroll: Option<EngineCallback>,
    pub on_seek: Option<EngineCallback>,
    pub on_zoom: Option<EngineCallback>,
}

impl PlayerCallbacks {
    pub fn slot(&self, event: PlayerEvent) -> Option<&EngineCallback> {
        match event {
            PlayerEvent::AudioProcess => self.on_audioprocess.as_ref(),
            PlayerEvent::Error => self.on_error.as_ref(),
            PlayerEvent::Finish => self.on_finish.as_ref(),
            PlayerEvent::Loading => self.on_loading.as_ref(),
            PlayerEvent::MouseUp => self.on_mouseup.as_ref(),
            PlayerEvent::Pause => self.on_pause.as_ref(),
            PlayerEvent::Play => self.on_play.as_ref(),
            PlayerEvent::Ready => self.on_ready.as_ref(),
            PlayerEvent::Scroll => self.on_scroll.as_ref(),
            PlayerEvent::Seek => self.on_seek.as_ref(),
            PlayerEvent::Zoom => self.on_zoom.as_ref(),
        }
    }

    fn slot_mut(&mut self, event: PlayerEvent) -> &mut Option<EngineCallback> {
        match event {
            PlayerEvent::AudioProcess => &mut self.on_audioprocess,
            PlayerEvent::Error => &mut self.on_error,
            PlayerEvent::Finish => &mut self.on_finish,
            PlayerEvent::Loading => &mut self.on_loading,
            PlayerEvent::MouseUp => &mut self.on_mouseup,
            PlayerEvent::Pause => &mut self.on_pause,
            PlayerEvent::Play => &mut self.on_play,
            PlayerEvent::Ready => &mut self.on_ready,
            PlayerEvent::Scroll => &mut self.on_scroll,
            PlayerEvent::Seek => &mut self.on_seek,
            PlayerEvent::Zoom => &mut self.on_zoom,
        }
    }

    /// Fill the slot for `event`.
    pub fn on(mut self, event: PlayerEvent, callback: impl Fn(&EngineEvent<'_>) + 'static) -> Self {
        *self.slot_mut(event) = Some(Rc::new(callback));
        self
    }

    pub fn on_pos_change(mut self, callback: impl Fn(&PositionChange<'_>) + 'static) -> Self {
        self.on_pos_change = Some(Rc::new(callback));
        self
    }
}

// =============================================================================
// Aggregate Region Events
// =============================================================================

/// Region events emitted by the engine as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionsEvent {
    In,
    Out,
    MouseEnter,
    MouseLeave,
    Click,
    DblClick,
    Updated,
    UpdateEnd,
    Removed,
    Play,
}

impl RegionsEvent {
    pub const ALL: [RegionsEvent; 10] = [
        RegionsEvent::In,
        RegionsEvent::Out,
        RegionsEvent::MouseEnter,
        RegionsEvent::MouseLeave,
        RegionsEvent::Click,
        RegionsEvent::DblClick,
        RegionsEvent::Updated,
        RegionsEvent::UpdateEnd,
        RegionsEvent::Removed,
        RegionsEvent::Play,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RegionsEvent::In => "region-in",
            RegionsEvent::Out => "region-out",
            RegionsEvent::MouseEnter => "region-mouseenter",
            RegionsEvent::MouseLeave => "region-mouseleave",
            RegionsEvent::Click => "region-click",
            RegionsEvent::DblClick => "region-dblclick",
            RegionsEvent::Updated => "region-updated",
            RegionsEvent::UpdateEnd => "region-update-end",
            RegionsEvent::Removed => "region-removed",
            RegionsEvent::Play => "region-play",
        }
    }
}

// =============================================================================
// Per-region Events
// =============================================================================

/// Events emitted by a single live region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionEvent {
    In,
    Out,
    Remove,
    Update,
    Click,
    DblClick,
    Over,
    Leave,
}

impl RegionEvent {
    pub const ALL: [RegionEvent; 8] = [
        RegionEvent::In,
        RegionEvent::Out,
        RegionEvent::Remove,
        RegionEvent::Update,
        RegionEvent::Click,
        RegionEvent::DblClick,
        RegionEvent::Over,
        RegionEvent::Leave,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RegionEvent::In => "in",
            RegionEvent::Out => "out",
            RegionEvent::Remove => "remove",
            RegionEvent::Update => "update",
            RegionEvent::Click => "click",
            RegionEvent::DblClick => "dbclick",
            RegionEvent::Over => "over",
            RegionEvent::Leave => "leave",
        }
    }
}

/// Callback slots for aggregate and per-region events.
#[derive(Clone, Default)]
pub struct RegionCallbacks {
    pub on_region_in: Option<EngineCallback>,
    pub on_region_out: Option<EngineCallback>,
    pub on_region_mouseenter: Option<EngineCallback>,
    pub on_region_mouseleave: Option<EngineCallback>,
    pub on_region_click: Option<EngineCallback>,
    pub on_region_dblclick: Option<EngineCallback>,
    pub on_region_updated: Option<EngineCallback>,
    pub on_region_update_end: Option<EngineCallback>,
    pub on_region_removed: Option<EngineCallback>,
    pub on_region_play: Option<EngineCallback>,

    pub on_single_region_in: Option<SingleRegionCallback>,
    pub on_single_region_out: Option<SingleRegionCallback>,
    pub on_single_region_remove: Option<SingleRegionCallback>,
    pub on_single_region_update: Option<SingleRegionCallback>,
    pub on_single_region_click: Option<SingleRegionCallback>,
    pub on_single_region_dblclick: Option<SingleRegionCallback>,
    pub on_single_region_over: Option<SingleRegionCallback>,
    pub on_single_region_leave: Option<SingleRegionCallback>,
}

impl RegionCallbacks {
    pub fn aggregate_slot(&self, event: RegionsEvent) -> Option<&EngineCallback> {
        match event {
            RegionsEvent::In => self.on_region_in.as_ref(),
            RegionsEvent::Out => self.on_region_out.as_ref(),
            RegionsEvent::MouseEnter => self.on_region_mouseenter.as_ref(),
            RegionsEvent::MouseLeave => self.on_region_mouseleave.as_ref(),
            RegionsEvent::Click => self.on_region_click.as_ref(),
            RegionsEvent::DblClick => self.on_region_dblclick.as_ref(),
            RegionsEvent::Updated => self.on_region_updated.as_ref(),
            RegionsEvent::UpdateEnd => self.on_region_update_end.as_ref(),
            RegionsEvent::Removed => self.on_region_removed.as_ref(),
            RegionsEvent::Play => self.on_region_play.as_ref(),
        }
    }

    pub fn single_slot(&self, event: RegionEvent) -> Option<&SingleRegionCallback> {
        match event {
            RegionEvent::In => self.on_single_region_in.as_ref(),
            RegionEvent::Out => self.on_single_region_out.as_ref(),
            RegionEvent::Remove => self.on_single_region_remove.as_ref(),
            RegionEvent::Update => self.on_single_region_update.as_ref(),
            RegionEvent::Click => self.on_single_region_click.as_ref(),
            RegionEvent::DblClick => self.on_single_region_dblclick.as_ref(),
            RegionEvent::Over => self.on_single_region_over.as_ref(),
            RegionEvent::Leave => self.on_single_region_leave.as_ref(),
        }
    }

    fn aggregate_slot_mut(&mut self, event: RegionsEvent) -> &mut Option<EngineCallback> {
        match event {
            RegionsEvent::In => &mut self.on_region_in,
            RegionsEvent::Out => &mut self.on_region_out,
            RegionsEvent::MouseEnter => &mut self.on_region_mouseenter,
            RegionsEvent::MouseLeave => &mut self.on_region_mouseleave,
            RegionsEvent::Click => &mut self.on_region_click,
            RegionsEvent::DblClick => &mut self.on_region_dblclick,
            RegionsEvent::Updated => &mut self.on_region_updated,
            RegionsEvent::UpdateEnd => &mut self.on_region_update_end,
            RegionsEvent::Removed => &mut self.on_region_removed,
            RegionsEvent::Play => &mut self.on_region_play,
        }
    }

    fn single_slot_mut(&mut self, event: RegionEvent) -> &mut Option<SingleRegionCallback> {
        match event {
            RegionEvent::In => &mut self.on_single_region_in,
            RegionEvent::Out => &mut self.on_single_region_out,
            RegionEvent::Remove => &mut self.on_single_region_remove,
            RegionEvent::Update => &mut self.on_single_region_update,
            RegionEvent::Click => &mut self.on_single_region_click,
            RegionEvent::DblClick => &mut self.on_single_region_dblclick,
            RegionEvent::Over => &mut self.on_single_region_over,
            RegionEvent::Leave => &mut self.on_single_region_leave,
        }
    }

    pub fn on(mut self, event: RegionsEvent, callback: impl Fn(&EngineEvent<'_>) + 'static) -> Self {
        *self.aggregate_slot_mut(event) = Some(Rc::new(callback));
        self
    }

    pub fn on_single(
        mut self,
        event: RegionEvent,
        callback: impl Fn(&SingleRegionEvent<'_>) + 'static,
    ) -> Self {
        *self.single_slot_mut(event) = Some(Rc::new(callback));
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
