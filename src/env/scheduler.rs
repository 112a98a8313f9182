//! Scheduler and trailing-edge throttle.
//!
//! [`ManualScheduler`] keeps a virtual clock. Hosts advance it from their own
//! loop (for example by the elapsed frame time) and tests advance it by exact
//! amounts, so throttled work runs deterministically.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Identifies a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Delayed, cancelable task execution.
pub trait Scheduler {
    /// Run `task` once, `delay` from now. Never runs it synchronously.
    fn schedule_after(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId;

    /// Drop a pending task. Unknown or already-run ids are ignored.
    fn cancel(&self, id: TimerId);
}

// =============================================================================
// Manual Scheduler
// =============================================================================

struct Task {
    id: TimerId,
    due: Duration,
    run: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_id: u64,
    tasks: Vec<Task>,
}

/// Scheduler driven by explicit [`advance`](ManualScheduler::advance) calls.
#[derive(Default)]
pub struct ManualScheduler {
    clock: RefCell<Clock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.clock.borrow().tasks.len()
    }

    /// Move the clock forward, running every task that falls due, earliest
    /// first. Tasks scheduled by running tasks also run if they fall due
    /// within the same advance. Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.clock.borrow().now + by;
        let mut ran = 0;

        loop {
            let next = {
                let mut clock = self.clock.borrow_mut();
                let earliest = clock
                    .tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id.0))
                    .map(|(i, _)| i);
                earliest.map(|index| {
                    let task = clock.tasks.remove(index);
                    clock.now = task.due;
                    task
                })
            };

            match next {
                Some(task) => {
                    (task.run)();
                    ran += 1;
                }
                None => break,
            }
        }

        self.clock.borrow_mut().now = target;
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId {
        let mut clock = self.clock.borrow_mut();
        let id = TimerId(clock.next_id);
        clock.next_id += 1;
        let due = clock.now + delay;
        clock.tasks.push(Task { id, due, run: task });
        id
    }

    fn cancel(&self, id: TimerId) {
        self.clock.borrow_mut().tasks.retain(|t| t.id != id);
    }
}

// =============================================================================
// Throttle
// =============================================================================

/// Trailing-edge throttle with at most one pending invocation.
///
/// The first trigger in a quiet period schedules the action `window` later;
/// triggers while it is pending are absorbed. The action reads current state
/// when it runs, so the latest trigger's conditions are what it sees.
pub struct Throttle {
    scheduler: Rc<dyn Scheduler>,
    window: Duration,
    pending: Rc<Cell<Option<TimerId>>>,
    action: Rc<dyn Fn()>,
}

impl Throttle {
    /// Window used for resize handling.
    pub const RESIZE_WINDOW: Duration = Duration::from_millis(66);

    pub fn new(scheduler: Rc<dyn Scheduler>, window: Duration, action: impl Fn() + 'static) -> Self {
        Self {
            scheduler,
            window,
            pending: Rc::new(Cell::new(None)),
            action: Rc::new(action),
        }
    }

    /// Request the action. Returns false if one is already pending.
    pub fn trigger(&self) -> bool {
        if self.pending.get().is_some() {
            return false;
        }

        let pending = self.pending.clone();
        let action = self.action.clone();
        let id = self.scheduler.schedule_after(
            self.window,
            Box::new(move || {
                pending.set(None);
                action();
            }),
        );
        self.pending.set(Some(id));
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    /// Drop the pending invocation, if any.
    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
    }
}

impl Drop for Throttle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// Tests
// =============================================================================
