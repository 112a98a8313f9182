//! Player - Declarative props driving one audio engine.
//!
//! # API
//!
//! - `LifecycleController::mount(engine, props, env)` - init, wire events, load
//! - `controller.update(props)` - diff against the previous snapshot and apply
//! - `controller.on_ready(handler)` - engine hand-off for region children
//! - `controller.unmount()` - dispose listeners and destroy the engine
//!
//! Positions are seconds everywhere on this side; [`sec_to_pos`] and
//! [`pos_to_sec`] convert to and from the engine's `[0, 1]` progress.

mod controller;
mod position;
mod props;
mod state;

pub use controller::LifecycleController;
pub use position::{pos_to_sec, sec_to_pos};
pub use props::{diff_props, PlayerProps, PropChanges};
pub use state::{Phase, PlaybackSnapshot};
