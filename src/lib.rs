//! # spark-wave
//!
//! Declarative synchronization layer for an event-emitting audio engine.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! the reactive playback state.
//!
//! ## Architecture
//!
//! The engine (decoding, waveform drawing, playback) is external and is only
//! described by the traits in [`engine`]. This crate keeps it in step with
//! plain prop snapshots:
//! ```text
//! PlayerProps -> diff_props -> engine commands
//! engine events -> bridge::subscribe -> PlaybackState / callbacks
//! RegionSet -> reconcile -> add_region / update / remove
//! ```
//!
//! ## Modules
//!
//! - [`bridge`] - Subscriptions that unsubscribe exactly once
//! - [`engine`] - Engine, region and emitter traits
//! - [`player`] - Lifecycle controller, prop diffing, position conversion
//! - [`regions`] - Region reconciliation and per-region event wiring
//! - [`events`] - Static event tables and callback slots
//! - [`env`] - Scheduler, resize source and media resolver
//! - [`config`] - Serializable configuration and validation
//!
//! ## Example
//!
//! ```ignore
//! use spark_wave::*;
//!
//! let (props, regions) = PlayerConfig::from_json(json)?.into_props()?;
//! let env = Environment::new(ContainerHandle("#waveform".into()));
//!
//! let mut player = LifecycleController::mount(engine, props.clone(), env)?;
//! let reconciler = RegionReconciler::new(regions, RegionCallbacks::default());
//! reconciler.attach(&player);
//!
//! player.update(PlayerProps { playing: true, ..props })?;
//! ```

pub mod bridge;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod events;
pub mod player;
pub mod regions;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Result, WaveError};

pub use bridge::{subscribe, subscribe_once, Subscription, SubscriptionSet};

pub use config::{Backend, ConfigWarning, EngineOptions, PlayerConfig};

pub use engine::{Emitter, Engine, Handler, HandlerId, HandlerRegistry, LiveRegion, RegionsCapability};

pub use env::{Environment, ManualScheduler, MediaRegistry, MediaResolver, ResizeSignal, ResizeSource, Scheduler, Throttle};

pub use events::{
    EngineEvent, PlayerCallbacks, PlayerEvent, PositionChange, RegionCallbacks, RegionEvent,
    RegionsEvent, SingleRegionEvent,
};

pub use player::{LifecycleController, Phase, PlaybackSnapshot, PlayerProps, PropChanges};

pub use regions::{reconcile, EditScript, RegionOp, RegionReconciler};
