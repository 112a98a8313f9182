//! Region Reconciler - Keeps the engine's live regions equal to a declarative set.
//!
//! Works only once the engine is ready and only when it has region support;
//! otherwise every operation stores the desired set and returns.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use spark_signals::Signal;

use super::reconcile::{reconcile, RegionOp};
use crate::bridge::{subscribe, Subscription, SubscriptionSet};
use crate::config::validate_regions;
use crate::engine::{Engine, LiveRegion, RegionsCapability};
use crate::events::{EngineEvent, RegionCallbacks, RegionEvent, RegionsEvent, SingleRegionEvent};
use crate::player::LifecycleController;
use crate::types::{RegionDescriptor, RegionSet};

type RegionSubscriptions = Rc<RefCell<SubscriptionSet>>;

struct Inner {
    callbacks: RefCell<RegionCallbacks>,
    /// Latest declarative set.
    desired: RefCell<RegionSet>,
    engine: RefCell<Option<Weak<dyn Engine>>>,
    /// Readiness of the owning controller, when attached to one.
    ready: RefCell<Option<Signal<bool>>>,
    aggregate: RefCell<SubscriptionSet>,
    per_region: RefCell<HashMap<String, RegionSubscriptions>>,
    on_ready: RefCell<Option<Subscription>>,
    on_unmount: RefCell<Option<Subscription>>,
    wired: Cell<bool>,
}

/// Declarative region set bound to one engine.
///
/// # Example
///
/// ```ignore
/// let regions = RegionReconciler::new(
///     RegionSet::new().with(RegionDescriptor::new("intro", 0.0, 4.5)),
///     RegionCallbacks::default().on_single(RegionEvent::Click, |event| {
///         println!("clicked {}", event.region.id());
///     }),
/// );
/// regions.attach(&player);
///
/// // Later renders
/// regions.update(next_regions);
/// ```
pub struct RegionReconciler {
    inner: Rc<Inner>,
}

impl RegionReconciler {
    pub fn new(regions: RegionSet, callbacks: RegionCallbacks) -> Self {
        for warning in validate_regions(&regions) {
            tracing::warn!(%warning, "regions");
        }

        Self {
            inner: Rc::new(Inner {
                callbacks: RefCell::new(callbacks),
                desired: RefCell::new(regions),
                engine: RefCell::new(None),
                ready: RefCell::new(None),
                aggregate: RefCell::new(SubscriptionSet::new()),
                per_region: RefCell::new(HashMap::new()),
                on_ready: RefCell::new(None),
                on_unmount: RefCell::new(None),
                wired: Cell::new(false),
            }),
        }
    }

    /// Follow `controller`: reconcile on every `ready`, and right away if it
    /// is ready already. Unmounting the controller detaches the reconciler.
    pub fn attach(&self, controller: &LifecycleController) {
        *self.inner.ready.borrow_mut() = Some(controller.is_ready_signal());

        let weak = Rc::downgrade(&self.inner);
        let subscription = controller.on_ready(move |engine| {
            if let Some(inner) = weak.upgrade() {
                Inner::engine_ready(&inner, engine);
            }
        });
        let replaced = self.inner.on_ready.replace(Some(subscription));
        drop(replaced);

        let weak = Rc::downgrade(&self.inner);
        let subscription = controller.on_unmount(move || {
            if let Some(inner) = weak.upgrade() {
                Inner::detach(&inner);
            }
        });
        let replaced = self.inner.on_unmount.replace(Some(subscription));
        drop(replaced);

        if let Some(engine) = controller.ready_engine() {
            Inner::engine_ready(&self.inner, &engine);
        }
    }

    /// Hand over a ready engine directly. The first call adds every desired
    /// region; later calls reconcile against the live list.
    pub fn on_engine_ready(&self, engine: &Rc<dyn Engine>) {
        Inner::engine_ready(&self.inner, engine);
    }

    /// Replace the desired set and reconcile if the engine is ready.
    pub fn update(&self, regions: RegionSet) {
        for warning in validate_regions(&regions) {
            tracing::warn!(%warning, "regions");
        }
        *self.inner.desired.borrow_mut() = regions;

        match self.inner.ready_engine() {
            Some(engine) => Inner::reconcile_with(&self.inner, &engine),
            None => tracing::trace!("regions stored until the engine is ready"),
        }
    }

    /// Swap the callbacks. Live listeners pick them up on their next event.
    pub fn set_callbacks(&self, callbacks: RegionCallbacks) {
        *self.inner.callbacks.borrow_mut() = callbacks;
    }

    pub fn desired(&self) -> RegionSet {
        self.inner.desired.borrow().clone()
    }

    /// Regions this reconciler created that still hold listeners.
    pub fn tracked_regions(&self) -> usize {
        self.inner
            .per_region
            .borrow()
            .values()
            .filter(|subs| !subs.borrow().is_empty())
            .count()
    }

    /// Dispose aggregate listeners and the per-region listeners still held.
    ///
    /// Live regions are left to the engine; its `destroy` owns them.
    pub fn unmount(&self) {
        Inner::detach(&self.inner);
    }
}

impl Drop for RegionReconciler {
    fn drop(&mut self) {
        self.unmount();
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

impl Inner {
    fn detach(inner: &Rc<Self>) {
        let on_ready = inner.on_ready.borrow_mut().take();
        drop(on_ready);
        let on_unmount = inner.on_unmount.borrow_mut().take();
        drop(on_unmount);

        let mut aggregate = std::mem::take(&mut *inner.aggregate.borrow_mut());
        aggregate.dispose_all();

        let per_region: Vec<RegionSubscriptions> = inner
            .per_region
            .borrow_mut()
            .drain()
            .map(|(_, subs)| subs)
            .collect();
        for subs in per_region {
            let mut taken = std::mem::take(&mut *subs.borrow_mut());
            taken.dispose_all();
        }

        inner.wired.set(false);
        *inner.engine.borrow_mut() = None;
        *inner.ready.borrow_mut() = None;
    }

    fn ready_engine(&self) -> Option<Rc<dyn Engine>> {
        let ready = self.ready.borrow().as_ref().is_none_or(|signal| signal.get());
        if !ready {
            return None;
        }
        self.engine.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn engine_ready(inner: &Rc<Self>, engine: &Rc<dyn Engine>) {
        if engine.regions().is_none() {
            tracing::debug!("engine has no region support");
            return;
        }
        *inner.engine.borrow_mut() = Some(Rc::downgrade(engine));

        if !inner.wired.get() {
            Self::wire_aggregate(inner, engine);
            inner.wired.set(true);
            Self::initial_pass(inner, engine);
        } else {
            Self::reconcile_with(inner, engine);
        }
    }

    /// Add every desired region that is not live yet. Nothing is removed.
    fn initial_pass(inner: &Rc<Self>, engine: &Rc<dyn Engine>) {
        let Some(capability) = engine.regions() else {
            return;
        };

        let desired = inner.desired.borrow().clone();
        let live = Self::live_as_set(&capability);
        let old: RegionSet = live
            .iter()
            .filter(|d| desired.contains(&d.id))
            .cloned()
            .collect();

        Self::apply(inner, engine, &capability, &old, &desired);
    }

    fn reconcile_with(inner: &Rc<Self>, engine: &Rc<dyn Engine>) {
        let Some(capability) = engine.regions() else {
            return;
        };

        let desired = inner.desired.borrow().clone();
        let old = Self::live_as_set(&capability);
        Self::apply(inner, engine, &capability, &old, &desired);
    }

    /// The engine's live regions at their live bounds, so edits made on the
    /// engine side are reasserted by the next pass.
    fn live_as_set(capability: &Rc<dyn RegionsCapability>) -> RegionSet {
        capability
            .list()
            .iter()
            .map(|region| RegionDescriptor::new(region.id(), region.start(), region.end()))
            .collect()
    }

    fn apply(
        inner: &Rc<Self>,
        engine: &Rc<dyn Engine>,
        capability: &Rc<dyn RegionsCapability>,
        old: &RegionSet,
        desired: &RegionSet,
    ) {
        inner
            .per_region
            .borrow_mut()
            .retain(|_, subs| !subs.borrow().is_empty());

        let script = reconcile(old, desired);
        if script.is_empty() {
            return;
        }
        tracing::trace!(
            added = script.added().len(),
            updated = script.updated().len(),
            removed = script.removed().len(),
            "reconcile regions"
        );

        let live = capability.list();
        let find = |id: &str| live.iter().find(|region| region.id() == id).cloned();

        for op in script {
            match op {
                RegionOp::Add(id) => {
                    let Some(descriptor) = desired.get(&id).cloned() else {
                        continue;
                    };
                    tracing::debug!(id = %id, start = descriptor.start, end = descriptor.end, "add_region");
                    let region = capability.add_region(&descriptor);
                    Self::wire_region(inner, engine, &region);
                }
                RegionOp::Update { id, bounds } => {
                    let Some(region) = find(&id) else {
                        continue;
                    };
                    tracing::debug!(id = %id, start = bounds.start, end = bounds.end, "update_region");
                    region.update(bounds);
                }
                RegionOp::Remove(id) => {
                    let tracked = inner.per_region.borrow_mut().remove(&id);
                    if let Some(region) = find(&id) {
                        tracing::debug!(id = %id, "remove_region");
                        region.remove();
                    }
                    // Normally emptied by the region's own `remove` already
                    if let Some(subs) = tracked {
                        let mut taken = std::mem::take(&mut *subs.borrow_mut());
                        taken.dispose_all();
                    }
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Event Wiring
    // -------------------------------------------------------------------------

    fn wire_aggregate(inner: &Rc<Self>, engine: &Rc<dyn Engine>) {
        let mut subs = SubscriptionSet::new();
        let engine_ref = Rc::downgrade(engine);

        for event in RegionsEvent::ALL {
            let weak = Rc::downgrade(inner);
            let engine_ref = engine_ref.clone();
            subs.add(subscribe(engine, event.name(), move |args| {
                let (Some(inner), Some(engine)) = (weak.upgrade(), engine_ref.upgrade()) else {
                    return;
                };
                let callback = inner.callbacks.borrow().aggregate_slot(event).cloned();
                if let Some(callback) = callback {
                    callback(&EngineEvent {
                        original_args: args,
                        engine: &engine,
                    });
                }
            }));
        }

        let replaced = inner.aggregate.replace(subs);
        drop(replaced);
    }

    /// Forward every per-region event, then drop all of them when the region
    /// reports its own removal.
    fn wire_region(inner: &Rc<Self>, engine: &Rc<dyn Engine>, region: &Rc<dyn LiveRegion>) {
        let set: RegionSubscriptions = Rc::new(RefCell::new(SubscriptionSet::new()));
        let mut subs = SubscriptionSet::new();
        let region_ref = Rc::downgrade(region);
        let engine_ref = Rc::downgrade(engine);

        for event in RegionEvent::ALL {
            let weak = Rc::downgrade(inner);
            let region_ref = region_ref.clone();
            let engine_ref = engine_ref.clone();
            subs.add(subscribe(region, event.name(), move |args| {
                let (Some(inner), Some(region), Some(engine)) =
                    (weak.upgrade(), region_ref.upgrade(), engine_ref.upgrade())
                else {
                    return;
                };
                let callback = inner.callbacks.borrow().single_slot(event).cloned();
                if let Some(callback) = callback {
                    callback(&SingleRegionEvent {
                        region: &region,
                        engine: &engine,
                        original_args: args,
                    });
                }
            }));
        }

        // Registered last so the forwarders above still see `remove`
        let cleanup = set.clone();
        subs.add(subscribe(region, RegionEvent::Remove.name(), move |_| {
            let mut taken = std::mem::take(&mut *cleanup.borrow_mut());
            taken.dispose_all();
        }));

        *set.borrow_mut() = subs;
        let replaced = inner.per_region.borrow_mut().insert(region.id(), set);
        drop(replaced);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{Command, MockEngine};
    use crate::env::Environment;
    use crate::events::PlayerEvent;
    use crate::player::PlayerProps;
    use crate::types::{ContainerHandle, EventArg, RegionBounds};

    /// Listeners one region carries: the event table plus self-cleanup.
    const PER_REGION: usize = RegionEvent::ALL.len() + 1;

    fn regions(entries: &[(&str, f64, f64)]) -> RegionSet {
        entries
            .iter()
            .map(|(id, start, end)| RegionDescriptor::new(*id, *start, *end))
            .collect()
    }

    fn mount(engine: &Rc<MockEngine>) -> LifecycleController {
        LifecycleController::mount(
            engine.clone(),
            PlayerProps {
                audio_file: Some("x.mp3".into()),
                ..Default::default()
            },
            Environment::new(ContainerHandle("#wave".into())),
        )
        .unwrap()
    }

    fn region_commands(engine: &MockEngine) -> Vec<Command> {
        engine
            .take_commands()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Command::AddRegion(_) | Command::UpdateRegion(..) | Command::RemoveRegion(_)
                )
            })
            .collect()
    }

    fn bounds(start: f64, end: f64) -> RegionBounds {
        RegionBounds { start, end }
    }

    #[test]
    fn test_add_update_remove_scenario() {
        let engine = MockEngine::new();
        let player = mount(&engine);
        let reconciler = RegionReconciler::new(
            regions(&[("a", 1.0, 2.0), ("b", 5.0, 6.0)]),
            RegionCallbacks::default(),
        );
        reconciler.attach(&player);
        assert!(region_commands(&engine).is_empty());

        engine.emit_ready();
        assert_eq!(
            region_commands(&engine),
            vec![Command::AddRegion("a".into()), Command::AddRegion("b".into())]
        );

        reconciler.update(regions(&[("a", 1.0, 3.0), ("c", 7.0, 8.0)]));
        assert_eq!(
            region_commands(&engine),
            vec![
                Command::UpdateRegion("a".into(), bounds(1.0, 3.0)),
                Command::AddRegion("c".into()),
                Command::RemoveRegion("b".into()),
            ]
        );
        assert_eq!(engine.mock_regions().ids(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_same_set_twice_is_idempotent() {
        let engine = MockEngine::new();
        let player = mount(&engine);
        let set = regions(&[("a", 1.0, 2.0), ("b", 5.0, 6.0)]);
        let reconciler = RegionReconciler::new(set.clone(), RegionCallbacks::default());
        reconciler.attach(&player);
        engine.emit_ready();
        region_commands(&engine);

        reconciler.update(set.clone());
        reconciler.update(set);
        engine.emit_ready();
        assert!(region_commands(&engine).is_empty());
    }

    #[test]
    fn test_no_mutation_while_not_ready() {
        let engine = MockEngine::new();
        let mut player = mount(&engine);
        let reconciler = RegionReconciler::new(RegionSet::new(), RegionCallbacks::default());
        reconciler.attach(&player);

        reconciler.update(regions(&[("a", 1.0, 2.0)]));
        assert!(region_commands(&engine).is_empty());

        engine.emit_ready();
        assert_eq!(region_commands(&engine), vec![Command::AddRegion("a".into())]);

        // Reloading clears readiness until the next ready
        player
            .update(PlayerProps {
                audio_file: Some("y.mp3".into()),
                ..Default::default()
            })
            .unwrap();
        reconciler.update(regions(&[("b", 3.0, 4.0)]));
        assert!(region_commands(&engine).is_empty());

        engine.emit_ready();
        assert_eq!(
            region_commands(&engine),
            vec![Command::AddRegion("b".into()), Command::RemoveRegion("a".into())]
        );
    }

    #[test]
    fn test_engine_without_regions_is_noop() {
        let engine = MockEngine::without_regions();
        let player = mount(&engine);
        let reconciler = RegionReconciler::new(regions(&[("a", 1.0, 2.0)]), RegionCallbacks::default());
        reconciler.attach(&player);

        engine.emit_ready();
        reconciler.update(regions(&[("b", 1.0, 2.0)]));

        assert!(region_commands(&engine).is_empty());
        assert_eq!(engine.listener_count("region-click"), 0);
        assert_eq!(reconciler.tracked_regions(), 0);
    }

    #[test]
    fn test_removed_region_drops_its_listeners() {
        let engine = MockEngine::new();
        let player = mount(&engine);
        let reconciler = RegionReconciler::new(
            regions(&[("a", 1.0, 2.0), ("b", 5.0, 6.0)]),
            RegionCallbacks::default(),
        );
        reconciler.attach(&player);
        engine.emit_ready();

        let live = engine.mock_regions();
        let a = live.get("a").unwrap();
        let b = live.get("b").unwrap();
        assert_eq!(b.total_listeners(), PER_REGION);
        assert_eq!(reconciler.tracked_regions(), 2);

        // Reconciler-driven removal
        reconciler.update(regions(&[("a", 1.0, 2.0)]));
        assert_eq!(b.total_listeners(), 0);

        // Removal from the engine side
        a.remove();
        assert_eq!(a.total_listeners(), 0);
        assert_eq!(reconciler.tracked_regions(), 0);
    }

    #[test]
    fn test_region_callbacks_receive_region_and_args() {
        let engine = MockEngine::new();
        let player = mount(&engine);

        let clicked = Rc::new(RefCell::new(Vec::new()));
        let removed = Rc::new(RefCell::new(Vec::new()));
        let aggregate = Rc::new(Cell::new(0));

        let clicked_clone = clicked.clone();
        let removed_clone = removed.clone();
        let aggregate_clone = aggregate.clone();
        let callbacks = RegionCallbacks::default()
            .on_single(RegionEvent::Click, move |event| {
                clicked_clone
                    .borrow_mut()
                    .push((event.region.id(), event.original_args.len()));
            })
            .on_single(RegionEvent::Remove, move |event| {
                removed_clone.borrow_mut().push(event.region.id());
            })
            .on(RegionsEvent::Click, move |event| {
                assert_eq!(event.original_args, &[EventArg::Region("a".into())]);
                aggregate_clone.set(aggregate_clone.get() + 1);
            });

        let reconciler = RegionReconciler::new(regions(&[("a", 1.0, 2.0)]), callbacks);
        reconciler.attach(&player);
        engine.emit_ready();

        let a = engine.mock_regions().get("a").unwrap();
        a.emit("click", &[EventArg::Number(1.5)]);
        engine.emit("region-click", &[EventArg::Region("a".into())]);
        reconciler.update(RegionSet::new());

        assert_eq!(*clicked.borrow(), vec![("a".to_string(), 1)]);
        assert_eq!(*removed.borrow(), vec!["a".to_string()]);
        assert_eq!(aggregate.get(), 1);
    }

    #[test]
    fn test_live_regions_unknown_to_reconciler() {
        let engine = MockEngine::new();
        let player = mount(&engine);
        let live = engine.mock_regions();
        live.insert_user_region(&RegionDescriptor::new("a", 1.0, 2.0));
        live.insert_user_region(&RegionDescriptor::new("drawn", 8.0, 9.0));

        let reconciler = RegionReconciler::new(
            regions(&[("a", 1.0, 2.0), ("b", 3.0, 4.0)]),
            RegionCallbacks::default(),
        );
        reconciler.attach(&player);
        engine.emit_ready();

        // `a` matches its live bounds; the drawn region survives the first pass
        assert_eq!(region_commands(&engine), vec![Command::AddRegion("b".into())]);

        reconciler.update(regions(&[("a", 1.0, 2.5), ("b", 3.0, 4.0)]));
        assert_eq!(
            region_commands(&engine),
            vec![
                Command::UpdateRegion("a".into(), bounds(1.0, 2.5)),
                Command::RemoveRegion("drawn".into()),
            ]
        );
    }

    #[test]
    fn test_unmount_disposes_every_listener() {
        let engine = MockEngine::new();
        let player = mount(&engine);
        let reconciler = RegionReconciler::new(regions(&[("a", 1.0, 2.0)]), RegionCallbacks::default());
        reconciler.attach(&player);
        engine.emit_ready();

        let a = engine.mock_regions().get("a").unwrap();
        assert_eq!(engine.listener_count("region-in"), 1);

        reconciler.unmount();
        assert_eq!(engine.listener_count("region-in"), 0);
        assert_eq!(a.total_listeners(), 0);
        assert_eq!(engine.total_listeners(), 3 + PlayerEvent::ALL.len());

        // Later readies no longer reach it
        engine.emit_ready();
        reconciler.update(regions(&[("z", 0.0, 1.0)]));
        assert!(region_commands(&engine).is_empty());
    }

    #[test]
    fn test_cascading_destroy_cleans_region_listeners() {
        let engine = MockEngine::new();
        engine.set_cascade_destroy(true);
        let player = mount(&engine);
        let reconciler = RegionReconciler::new(
            regions(&[("a", 1.0, 2.0), ("b", 5.0, 6.0)]),
            RegionCallbacks::default(),
        );
        reconciler.attach(&player);
        engine.emit_ready();
        assert_eq!(reconciler.tracked_regions(), 2);

        player.unmount();
        assert_eq!(reconciler.tracked_regions(), 0);
        assert!(engine.mock_regions().ids().is_empty());
    }

    #[test]
    fn test_engine_side_edit_is_reasserted() {
        let engine = MockEngine::new();
        let player = mount(&engine);
        let reconciler = RegionReconciler::new(regions(&[("a", 1.0, 2.0)]), RegionCallbacks::default());
        reconciler.attach(&player);
        engine.emit_ready();
        region_commands(&engine);

        // A drag on the engine side moves the live region
        let a = engine.mock_regions().get("a").unwrap();
        a.update(bounds(3.0, 4.0));
        region_commands(&engine);

        reconciler.update(regions(&[("a", 1.0, 2.0)]));
        assert_eq!(
            region_commands(&engine),
            vec![Command::UpdateRegion("a".into(), bounds(1.0, 2.0))]
        );
        assert_eq!((a.start(), a.end()), (1.0, 2.0));
    }

    #[test]
    fn test_controller_unmount_detaches_reconciler() {
        let engine = MockEngine::new();
        let player = mount(&engine);
        let reconciler = RegionReconciler::new(
            regions(&[("a", 1.0, 2.0), ("b", 5.0, 6.0)]),
            RegionCallbacks::default(),
        );
        reconciler.attach(&player);
        engine.emit_ready();
        let a = engine.mock_regions().get("a").unwrap();
        assert_eq!(a.total_listeners(), PER_REGION);

        player.unmount();
        assert_eq!(engine.total_listeners(), 0);
        assert_eq!(a.total_listeners(), 0);
        assert_eq!(reconciler.tracked_regions(), 0);

        reconciler.update(regions(&[("z", 0.0, 1.0)]));
        assert!(region_commands(&engine).is_empty());
        assert_eq!(reconciler.desired(), regions(&[("z", 0.0, 1.0)]));
    }

    #[test]
    fn test_swapped_callbacks_reach_live_regions() {
        let engine = MockEngine::new();
        let player = mount(&engine);
        let reconciler = RegionReconciler::new(regions(&[("a", 1.0, 2.0)]), RegionCallbacks::default());
        reconciler.attach(&player);
        engine.emit_ready();

        let a = engine.mock_regions().get("a").unwrap();
        a.emit("click", &[]);

        let clicks = Rc::new(Cell::new(0));
        let clicks_clone = clicks.clone();
        reconciler.set_callbacks(
            RegionCallbacks::default()
                .on_single(RegionEvent::Click, move |_| clicks_clone.set(clicks_clone.get() + 1)),
        );
        a.emit("click", &[]);

        assert_eq!(clicks.get(), 1);
        assert_eq!(a.total_listeners(), PER_REGION);
    }

    #[test]
    fn test_direct_engine_hand_off() {
        let engine = MockEngine::new();
        let reconciler = RegionReconciler::new(regions(&[("a", 1.0, 2.0)]), RegionCallbacks::default());
        let handle: Rc<dyn Engine> = engine.clone();

        reconciler.on_engine_ready(&handle);
        assert_eq!(region_commands(&engine), vec![Command::AddRegion("a".into())]);

        reconciler.update(regions(&[("a", 0.5, 2.0)]));
        assert_eq!(
            region_commands(&engine),
            vec![Command::UpdateRegion("a".into(), bounds(0.5, 2.0))]
        );
    }
}
