//! Lifecycle Controller - Keeps one engine in step with declarative props.
//!
//! The controller owns the engine from `init` to `destroy`. Prop snapshots go
//! in through [`LifecycleController::update`] and come out as the smallest set
//! of engine commands; engine events come back as position updates and user
//! callbacks.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized -> Initializing -> Ready -> Destroyed
//!                       ^            |
//!                       +-- source --+      (SourceLoading while reloading)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spark_wave::player::{LifecycleController, PlayerProps};
//!
//! let mut player = LifecycleController::mount(engine, props, env)?;
//!
//! // Every render produces a new snapshot
//! player.update(PlayerProps { playing: true, ..props.clone() })?;
//!
//! // Children get the engine once it is ready
//! let _sub = player.on_ready(|engine| reconciler.on_engine_ready(engine));
//!
//! player.unmount();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::Signal;

use super::position::{pos_to_sec, sec_to_pos};
use super::props::{diff_props, PlayerProps, PropChanges};
use super::state::{Phase, PlaybackSnapshot, PlaybackState};
use crate::bridge::{subscribe, subscribe_once, Subscription, SubscriptionSet};
use crate::config::{validate_props, Backend};
use crate::engine::{Engine, HandlerRegistry};
use crate::env::{Environment, MediaResolver, Throttle};
use crate::error::{Result, WaveError};
use crate::events::{EngineEvent, PlayerEvent, PositionChange};
use crate::types::{AudioSource, EventArg, MediaSource, Peaks};

// =============================================================================
// Shared State
// =============================================================================

/// State reachable from engine handlers. Handlers only ever hold a `Weak`.
struct Shared {
    engine: Rc<dyn Engine>,
    media: Rc<dyn MediaResolver>,
    props: RefCell<Rc<PlayerProps>>,
    state: PlaybackState,
    /// One-shot `ready` listener that seeks once a new source is decoded.
    pending_seek: RefCell<Option<Subscription>>,
}

impl Shared {
    fn props(&self) -> Rc<PlayerProps> {
        self.props.borrow().clone()
    }

    /// Seek to `seconds`. Skipped while the duration is unknown.
    fn seek(&self, seconds: f64) {
        let duration = self.engine.duration();
        let Some(progress) = sec_to_pos(seconds, duration) else {
            tracing::warn!(seconds, duration, "seek skipped, duration unknown");
            return;
        };

        if self.props().options.auto_center {
            tracing::debug!(seconds, progress, "seek_and_center");
            self.engine.seek_and_center(progress);
        } else {
            tracing::debug!(seconds, progress, "seek_to");
            self.engine.seek_to(progress);
        }
    }

    fn load_audio(&self, source: Option<&AudioSource>, peaks: Option<&Peaks>) -> Result<()> {
        let source = source.ok_or(WaveError::MissingSource)?;
        self.state.set_source_loading(true);

        match source {
            AudioSource::Url(url) => {
                tracing::debug!(url = %url, peaks = peaks.is_some(), "load");
                self.engine.load(url, peaks);
            }
            AudioSource::Blob(blob) => {
                tracing::debug!(bytes = blob.data.len(), peaks = peaks.is_some(), "load_blob");
                self.engine.load_blob(blob, peaks);
            }
        }
        Ok(())
    }

    fn load_media(&self, source: Option<&MediaSource>, peaks: Option<&Peaks>) -> Result<()> {
        let element = match source.ok_or(WaveError::MissingSource)? {
            MediaSource::Element(element) => element.clone(),
            MediaSource::Selector(selector) => self.media.query_selector(selector).ok_or_else(|| {
                WaveError::MediaElementNotFound {
                    selector: selector.clone(),
                }
            })?,
        };

        self.state.set_source_loading(true);
        tracing::debug!(element = %element.id, peaks = peaks.is_some(), "load_media_element");
        self.engine.load_media_element(&element, peaks);
        Ok(())
    }

    fn handle_ready(&self) {
        let props = self.props();

        self.state.set_phase(Phase::Ready);
        self.state.set_source_loading(false);
        self.state.set_position(props.pos);
        self.state.set_ready(true);
        tracing::trace!(duration = self.engine.duration(), "ready");

        // A queued one-shot seek owns the position for this ready
        let seek_queued = self.pending_seek.borrow().is_some();
        if props.pos != 0.0 && !seek_queued {
            self.seek(props.pos);
        }
        if let Some(volume) = props.volume {
            self.engine.set_volume(volume);
        }
        if props.playing {
            self.engine.play();
        }
        if let Some(level) = props.zoom {
            self.engine.zoom(level);
        }
    }

    fn handle_position(&self, seconds: f64) {
        self.state.report_position(seconds);

        let props = self.props();
        if let Some(callback) = &props.callbacks.on_pos_change {
            callback(&PositionChange {
                seconds,
                engine: &self.engine,
            });
        }
    }

    fn forward(&self, event: PlayerEvent, args: &[EventArg]) {
        let props = self.props();
        if let Some(callback) = props.callbacks.slot(event) {
            callback(&EngineEvent {
                original_args: args,
                engine: &self.engine,
            });
        }
    }

    fn handle_resize(&self) {
        let was_playing = self.engine.is_playing();
        if was_playing {
            self.engine.pause();
        }

        tracing::debug!("draw_buffer");
        self.engine.draw_buffer();

        if self.state.is_ready() {
            self.seek(self.state.position());
        }
        if was_playing {
            self.engine.play();
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Owner of one engine instance.
///
/// Dropping the controller tears the engine down the same way
/// [`unmount`](Self::unmount) does.
pub struct LifecycleController {
    shared: Rc<Shared>,
    env: Environment,
    subscriptions: SubscriptionSet,
    resize: Option<Subscription>,
    throttle: Rc<Throttle>,
    /// Children notified once the engine is destroyed.
    unmount_hooks: Rc<HandlerRegistry>,
}

impl LifecycleController {
    /// Initialize `engine`, wire its events and load the initial source.
    ///
    /// This will:
    /// 1. Merge the options with the container (media sources force the media-element backend)
    /// 2. Call `init`
    /// 3. Subscribe `ready`, `audioprocess`, `seek` and one forwarder per [`PlayerEvent`]
    /// 4. Load `audio_file` and/or `media_elt`
    /// 5. Attach the resize listener when `responsive`
    ///
    /// A failed load tears everything down again before the error is returned.
    pub fn mount(engine: Rc<dyn Engine>, props: PlayerProps, env: Environment) -> Result<Self> {
        for warning in validate_props(&props) {
            tracing::warn!(%warning, "player props");
        }

        let mut options = props.options.clone();
        options.container = Some(env.container.clone());
        if props.media_elt.is_some() {
            options.backend = Backend::MediaElement;
        }

        let shared = Rc::new(Shared {
            engine,
            media: env.media.clone(),
            props: RefCell::new(Rc::new(props)),
            state: PlaybackState::new(),
            pending_seek: RefCell::new(None),
        });

        let weak = Rc::downgrade(&shared);
        let throttle = Rc::new(Throttle::new(env.scheduler.clone(), Throttle::RESIZE_WINDOW, move || {
            if let Some(shared) = weak.upgrade() {
                shared.handle_resize();
            }
        }));

        let mut controller = Self {
            shared,
            env,
            subscriptions: SubscriptionSet::new(),
            resize: None,
            throttle,
            unmount_hooks: Rc::new(HandlerRegistry::new()),
        };

        tracing::debug!(backend = ?options.backend, "init");
        controller.shared.state.set_phase(Phase::Initializing);
        controller.shared.engine.init(&options);
        controller.wire_events();

        if let Err(err) = controller.load_initial() {
            tracing::warn!(error = %err, "initial load failed");
            controller.teardown();
            return Err(err);
        }

        if controller.shared.props().responsive {
            controller.attach_resize();
        }

        Ok(controller)
    }

    fn wire_events(&mut self) {
        let engine = self.shared.engine.clone();

        let weak = Rc::downgrade(&self.shared);
        self.subscriptions.add(subscribe(&engine, "ready", move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_ready();
            }
        }));

        let weak = Rc::downgrade(&self.shared);
        self.subscriptions.add(subscribe(&engine, "audioprocess", move |args| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if let Some(seconds) = args.first().and_then(EventArg::as_number) {
                shared.handle_position(seconds);
            }
        }));

        let weak = Rc::downgrade(&self.shared);
        self.subscriptions.add(subscribe(&engine, "seek", move |args| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if !shared.state.is_ready() {
                return;
            }
            if let Some(progress) = args.first().and_then(EventArg::as_number) {
                shared.handle_position(pos_to_sec(progress, shared.engine.duration()));
            }
        }));

        for event in PlayerEvent::ALL {
            let weak = Rc::downgrade(&self.shared);
            self.subscriptions.add(subscribe(&engine, event.name(), move |args| {
                if let Some(shared) = weak.upgrade() {
                    shared.forward(event, args);
                }
            }));
        }
    }

    fn load_initial(&self) -> Result<()> {
        let props = self.shared.props();
        if props.audio_file.is_some() {
            self.shared.load_audio(props.audio_file.as_ref(), props.audio_peaks.as_ref())?;
        }
        if props.media_elt.is_some() {
            self.shared.load_media(props.media_elt.as_ref(), props.audio_peaks.as_ref())?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------------

    /// Apply a new prop snapshot.
    ///
    /// The snapshot is committed even when a load fails; the failed load is
    /// not retried and the remaining changes of this cycle are skipped.
    pub fn update(&mut self, next: PlayerProps) -> Result<()> {
        if self.shared.state.phase() == Phase::Destroyed {
            tracing::warn!("update after unmount ignored");
            return Ok(());
        }

        for warning in validate_props(&next) {
            tracing::warn!(%warning, "player props");
        }

        let prev = self.shared.props();
        let changes = diff_props(&prev, &next);
        let next = Rc::new(next);
        *self.shared.props.borrow_mut() = next.clone();

        tracing::trace!(?changes, "update");
        self.apply_changes(&next, changes)
    }

    fn apply_changes(&mut self, next: &PlayerProps, changes: PropChanges) -> Result<()> {
        let shared = self.shared.clone();
        let was_ready = shared.state.is_ready();
        let mut new_source = false;

        if changes.contains(PropChanges::SOURCE) && next.audio_file.is_some() {
            shared.state.set_ready(false);
            shared.load_audio(next.audio_file.as_ref(), next.audio_peaks.as_ref())?;
            new_source = true;
        }

        if changes.contains(PropChanges::MEDIA_ELEMENT) && next.media_elt.is_some() {
            shared.state.set_ready(false);
            shared.load_media(next.media_elt.as_ref(), next.audio_peaks.as_ref())?;
            new_source = true;
        }

        if changes.contains(PropChanges::PEAKS) && !new_source {
            if next.media_elt.is_some() {
                shared.load_media(next.media_elt.as_ref(), next.audio_peaks.as_ref())?;
            } else {
                shared.load_audio(next.audio_file.as_ref(), next.audio_peaks.as_ref())?;
            }
        }

        if changes.contains(PropChanges::POSITION) && was_ready && next.pos != shared.state.last_reported() {
            if new_source {
                self.queue_seek(next.pos);
            } else {
                shared.seek(next.pos);
            }
        }

        if !new_source && shared.engine.is_playing() != next.playing {
            if next.playing {
                tracing::debug!("play");
                shared.engine.play();
            } else {
                tracing::debug!("pause");
                shared.engine.pause();
            }
        }

        if let Some(volume) = next.volume.filter(|_| changes.contains(PropChanges::VOLUME)) {
            tracing::debug!(volume, "set_volume");
            shared.engine.set_volume(volume);
        }

        if let Some(level) = next.zoom.filter(|_| changes.contains(PropChanges::ZOOM)) {
            tracing::debug!(level, "zoom");
            shared.engine.zoom(level);
        }

        if let Some(rate) = next.options.audio_rate.filter(|_| changes.contains(PropChanges::AUDIO_RATE)) {
            tracing::debug!(rate, "set_playback_rate");
            shared.engine.set_playback_rate(rate);
        }

        if changes.contains(PropChanges::RESPONSIVE) {
            if next.responsive {
                self.attach_resize();
            } else {
                self.detach_resize();
            }
        }

        Ok(())
    }

    /// Seek once the next `ready` arrives. Replaces any earlier queued seek.
    fn queue_seek(&self, seconds: f64) {
        let weak = Rc::downgrade(&self.shared);
        let subscription = subscribe_once(&self.shared.engine, "ready", move |_| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let done = shared.pending_seek.borrow_mut().take();
            drop(done);
            shared.seek(seconds);
        });

        let replaced = self.shared.pending_seek.replace(Some(subscription));
        drop(replaced);
    }

    // -------------------------------------------------------------------------
    // Resize
    // -------------------------------------------------------------------------

    fn attach_resize(&mut self) {
        if self.resize.is_some() {
            return;
        }
        let throttle = Rc::downgrade(&self.throttle);
        self.resize = Some(self.env.resize.subscribe(Rc::new(move || {
            if let Some(throttle) = throttle.upgrade() {
                throttle.trigger();
            }
        })));
    }

    fn detach_resize(&mut self) {
        self.resize = None;
        self.throttle.cancel();
    }

    // -------------------------------------------------------------------------
    // Explicit Commands
    // -------------------------------------------------------------------------

    /// Load an audio source outside the prop cycle. Clears readiness until
    /// the next `ready`.
    pub fn load_source(&self, source: &AudioSource, peaks: Option<&Peaks>) -> Result<()> {
        self.shared.state.set_ready(false);
        self.shared.load_audio(Some(source), peaks)
    }

    /// Load a media element (or selector) outside the prop cycle.
    pub fn load_media_element(&self, source: &MediaSource, peaks: Option<&Peaks>) -> Result<()> {
        self.shared.state.set_ready(false);
        self.shared.load_media(Some(source), peaks)
    }

    /// Seek to `seconds`. Does not touch the last reported position.
    pub fn seek_to(&self, seconds: f64) {
        self.shared.seek(seconds);
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Call `handler` with the engine on every `ready`.
    pub fn on_ready(&self, handler: impl Fn(&Rc<dyn Engine>) + 'static) -> Subscription {
        let weak = Rc::downgrade(&self.shared);
        subscribe(&self.shared.engine, "ready", move |_| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if shared.state.is_ready() {
                handler(&shared.engine);
            }
        })
    }

    /// Call `handler` once, right after the engine is destroyed.
    pub fn on_unmount(&self, handler: impl Fn() + 'static) -> Subscription {
        let id = self.unmount_hooks.on("unmount", Rc::new(move |_: &[EventArg]| handler()));
        let weak = Rc::downgrade(&self.unmount_hooks);
        Subscription::new("unmount", move || {
            if let Some(hooks) = weak.upgrade() {
                hooks.un("unmount", id);
            }
        })
    }

    /// The engine, once it has reported ready.
    pub fn ready_engine(&self) -> Option<Rc<dyn Engine>> {
        self.shared
            .state
            .is_ready()
            .then(|| self.shared.engine.clone())
    }

    pub fn props(&self) -> Rc<PlayerProps> {
        self.shared.props()
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.phase()
    }

    pub fn is_ready(&self) -> bool {
        self.shared.state.is_ready()
    }

    pub fn is_source_loading(&self) -> bool {
        self.shared.state.is_source_loading()
    }

    /// Current position in seconds.
    pub fn position(&self) -> f64 {
        self.shared.state.position()
    }

    pub fn is_ready_signal(&self) -> Signal<bool> {
        self.shared.state.is_ready_signal()
    }

    pub fn position_signal(&self) -> Signal<f64> {
        self.shared.state.position_signal()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.state.snapshot()
    }

    /// Number of engine listeners this controller holds.
    pub fn subscription_count(&self) -> usize {
        let pending = usize::from(self.shared.pending_seek.borrow().is_some());
        self.subscriptions.len() + pending
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Dispose every listener and destroy the engine.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.shared.state.phase() == Phase::Destroyed {
            return;
        }

        self.subscriptions.dispose_all();
        let pending = self.shared.pending_seek.borrow_mut().take();
        drop(pending);
        self.detach_resize();

        tracing::debug!("destroy");
        self.shared.engine.destroy();

        self.shared.state.set_ready(false);
        self.shared.state.set_source_loading(false);
        self.shared.state.set_phase(Phase::Destroyed);

        self.unmount_hooks.emit("unmount", &[]);
        self.unmount_hooks.clear();
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// Tests
// =============================================================================
