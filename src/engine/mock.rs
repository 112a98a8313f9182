//! Recording engine for tests.
//!
//! Every command lands in a shared log so tests can assert exact command
//! sequences. Events are only emitted when a test calls `emit*`, except
//! `remove` on a region, which the region emits on itself like a real one.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::{Emitter, Engine, Handler, HandlerId, HandlerRegistry, LiveRegion, RegionsCapability};
use crate::config::{Backend, EngineOptions};
use crate::types::{Blob, EventArg, MediaElement, Peaks, RegionBounds, RegionDescriptor};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Init { backend: Backend, container: Option<String> },
    Load { url: String, peaks: bool },
    LoadBlob { len: usize, peaks: bool },
    LoadMediaElement { id: String, peaks: bool },
    Play,
    Pause,
    SetVolume(f64),
    Zoom(f64),
    SetPlaybackRate(f64),
    SeekTo(f64),
    SeekAndCenter(f64),
    DrawBuffer,
    Destroy,
    AddRegion(String),
    UpdateRegion(String, RegionBounds),
    RemoveRegion(String),
}

type Log = Rc<RefCell<Vec<Command>>>;

// =============================================================================
// Engine
// =============================================================================

pub struct MockEngine {
    events: HandlerRegistry,
    log: Log,
    playing: Cell<bool>,
    duration: Cell<f64>,
    regions: Option<Rc<MockRegions>>,
    cascade_destroy: Cell<bool>,
}

impl MockEngine {
    pub fn new() -> Rc<Self> {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        Rc::new(Self {
            events: HandlerRegistry::new(),
            regions: Some(Rc::new(MockRegions::new(log.clone()))),
            log,
            playing: Cell::new(false),
            duration: Cell::new(60.0),
            cascade_destroy: Cell::new(false),
        })
    }

    pub fn without_regions() -> Rc<Self> {
        Rc::new(Self {
            events: HandlerRegistry::new(),
            log: Rc::new(RefCell::new(Vec::new())),
            playing: Cell::new(false),
            duration: Cell::new(60.0),
            regions: None,
            cascade_destroy: Cell::new(false),
        })
    }

    pub fn emit(&self, event: &str, args: &[EventArg]) {
        self.events.emit(event, args);
    }

    pub fn emit_ready(&self) {
        self.emit("ready", &[]);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.log.borrow().clone()
    }

    pub fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn set_duration(&self, seconds: f64) {
        self.duration.set(seconds);
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.set(playing);
    }

    /// Make `destroy` remove (and so notify) every live region.
    pub fn set_cascade_destroy(&self, cascade: bool) {
        self.cascade_destroy.set(cascade);
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.events.count(event)
    }

    pub fn total_listeners(&self) -> usize {
        self.events.total()
    }

    pub fn mock_regions(&self) -> Rc<MockRegions> {
        self.regions.clone().expect("engine built without regions")
    }

    fn record(&self, command: Command) {
        self.log.borrow_mut().push(command);
    }
}

impl Emitter for MockEngine {
    fn on(&self, event: &str, handler: Handler) -> HandlerId {
        self.events.on(event, handler)
    }

    fn un(&self, event: &str, id: HandlerId) {
        self.events.un(event, id);
    }

    fn un_all(&self, event: &str) {
        self.events.un_all(event);
    }
}

impl Engine for MockEngine {
    fn init(&self, options: &EngineOptions) {
        self.record(Command::Init {
            backend: options.backend,
            container: options.container.as_ref().map(|c| c.0.clone()),
        });
    }

    fn load(&self, url: &str, peaks: Option<&Peaks>) {
        self.record(Command::Load {
            url: url.to_string(),
            peaks: peaks.is_some(),
        });
    }

    fn load_blob(&self, blob: &Blob, peaks: Option<&Peaks>) {
        self.record(Command::LoadBlob {
            len: blob.data.len(),
            peaks: peaks.is_some(),
        });
    }

    fn load_media_element(&self, element: &MediaElement, peaks: Option<&Peaks>) {
        self.record(Command::LoadMediaElement {
            id: element.id.clone(),
            peaks: peaks.is_some(),
        });
    }

    fn play(&self) {
        self.playing.set(true);
        self.record(Command::Play);
    }

    fn pause(&self) {
        self.playing.set(false);
        self.record(Command::Pause);
    }

    fn is_playing(&self) -> bool {
        self.playing.get()
    }

    fn set_volume(&self, volume: f64) {
        self.record(Command::SetVolume(volume));
    }

    fn zoom(&self, level: f64) {
        self.record(Command::Zoom(level));
    }

    fn set_playback_rate(&self, rate: f64) {
        self.record(Command::SetPlaybackRate(rate));
    }

    fn seek_to(&self, progress: f64) {
        self.record(Command::SeekTo(progress));
    }

    fn seek_and_center(&self, progress: f64) {
        self.record(Command::SeekAndCenter(progress));
    }

    fn duration(&self) -> f64 {
        self.duration.get()
    }

    fn draw_buffer(&self) {
        self.record(Command::DrawBuffer);
    }

    fn destroy(&self) {
        self.record(Command::Destroy);
        if !self.cascade_destroy.get() {
            return;
        }
        if let Some(regions) = &self.regions {
            for region in regions.live() {
                region.remove();
            }
        }
    }

    fn regions(&self) -> Option<Rc<dyn RegionsCapability>> {
        self.regions.clone().map(|r| r as Rc<dyn RegionsCapability>)
    }
}

// =============================================================================
// Regions
// =============================================================================

pub struct MockRegions {
    log: Log,
    list: Rc<RefCell<Vec<Rc<MockRegion>>>>,
}

impl MockRegions {
    fn new(log: Log) -> Self {
        Self {
            log,
            list: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn live(&self) -> Vec<Rc<MockRegion>> {
        self.list.borrow().clone()
    }

    pub fn get(&self, id: &str) -> Option<Rc<MockRegion>> {
        self.list.borrow().iter().find(|r| r.id == id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.list.borrow().iter().map(|r| r.id.clone()).collect()
    }

    /// Simulate a region the user drew, bypassing the command log.
    pub fn insert_user_region(&self, descriptor: &RegionDescriptor) -> Rc<MockRegion> {
        let region = self.build(descriptor);
        self.list.borrow_mut().push(region.clone());
        region
    }

    fn build(&self, descriptor: &RegionDescriptor) -> Rc<MockRegion> {
        Rc::new(MockRegion {
            id: descriptor.id.clone(),
            bounds: Cell::new(descriptor.bounds()),
            events: HandlerRegistry::new(),
            log: self.log.clone(),
            list: Rc::downgrade(&self.list),
        })
    }
}

impl RegionsCapability for MockRegions {
    fn add_region(&self, descriptor: &RegionDescriptor) -> Rc<dyn LiveRegion> {
        self.log.borrow_mut().push(Command::AddRegion(descriptor.id.clone()));
        let region = self.build(descriptor);
        {
            let mut list = self.list.borrow_mut();
            list.retain(|r| r.id != descriptor.id);
            list.push(region.clone());
        }
        region
    }

    fn list(&self) -> Vec<Rc<dyn LiveRegion>> {
        self.list
            .borrow()
            .iter()
            .map(|r| r.clone() as Rc<dyn LiveRegion>)
            .collect()
    }
}

pub struct MockRegion {
    id: String,
    bounds: Cell<RegionBounds>,
    events: HandlerRegistry,
    log: Log,
    list: Weak<RefCell<Vec<Rc<MockRegion>>>>,
}

impl MockRegion {
    pub fn emit(&self, event: &str, args: &[EventArg]) {
        self.events.emit(event, args);
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.events.count(event)
    }

    pub fn total_listeners(&self) -> usize {
        self.events.total()
    }
}

impl Emitter for MockRegion {
    fn on(&self, event: &str, handler: Handler) -> HandlerId {
        self.events.on(event, handler)
    }

    fn un(&self, event: &str, id: HandlerId) {
        self.events.un(event, id);
    }

    fn un_all(&self, event: &str) {
        self.events.un_all(event);
    }
}

impl LiveRegion for MockRegion {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn start(&self) -> f64 {
        self.bounds.get().start
    }

    fn end(&self) -> f64 {
        self.bounds.get().end
    }

    fn update(&self, bounds: RegionBounds) {
        self.log
            .borrow_mut()
            .push(Command::UpdateRegion(self.id.clone(), bounds));
        self.bounds.set(bounds);
    }

    fn remove(&self) {
        self.log.borrow_mut().push(Command::RemoveRegion(self.id.clone()));
        // Keep our own entry alive until the remove event is out
        let _removed = self.list.upgrade().and_then(|list| {
            let mut list = list.borrow_mut();
            let index = list.iter().position(|r| r.id == self.id)?;
            Some(list.remove(index))
        });
        self.events.emit("remove", &[EventArg::Region(self.id.clone())]);
    }
}
