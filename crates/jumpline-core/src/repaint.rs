//! Coalesced repaint scheduling.
//!
//! Highlight changes never repaint the view synchronously. Each change reports a [`Damage`] to a
//! [`RepaintScheduler`], which merges it into a single pending batch and posts at most one flush
//! task to the UI thread through a [`UiExecutor`]. When the task runs, the whole batch is handed to
//! the [`RepaintTarget`] in one call.
//!
//! Batches are keyed by buffer. Damage for a buffer that is not displayed is ignored, and a batch
//! whose buffer stopped being displayed before the flush is discarded wholesale.
//!
//! # Example
//!
//! ```rust
//! use jumpline_core::{BufferId, Damage, ManualExecutor, RepaintScheduler, RepaintTarget};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct View {
//!     batches: Mutex<Vec<Vec<Damage>>>,
//! }
//!
//! impl RepaintTarget for View {
//!     fn displayed_buffer(&self) -> Option<BufferId> {
//!         Some(BufferId::new(1))
//!     }
//!
//!     fn repaint(&self, _buffer: BufferId, damage: &[Damage]) {
//!         self.batches.lock().unwrap().push(damage.to_vec());
//!     }
//! }
//!
//! let executor = Arc::new(ManualExecutor::new());
//! let view = Arc::new(View::default());
//! let scheduler = RepaintScheduler::new(executor.clone(), view.clone());
//!
//! scheduler.request(BufferId::new(1), Damage::offsets(0, 4));
//! scheduler.request(BufferId::new(1), Damage::offsets(2, 8));
//! assert_eq!(executor.run_pending(), 1);
//! assert_eq!(*view.batches.lock().unwrap(), vec![vec![Damage::offsets(0, 8)]]);
//! ```

use crate::buffer::BufferId;
use crate::geometry::Rect;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An area of the view that must be repainted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Damage {
    /// A character range of the displayed buffer.
    Offsets {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// A pixel rectangle, reported by layered painters.
    Pixels(Rect),
}

impl Damage {
    /// Damage covering the character range `start..end` (bounds are normalized).
    pub fn offsets(start: usize, end: usize) -> Self {
        Damage::Offsets {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Merge `other` into `self` if both are offset ranges that touch or overlap, or both are
    /// overlapping pixel rectangles.
    fn try_merge(&mut self, other: &Damage) -> bool {
        match (self, other) {
            (
                Damage::Offsets { start, end },
                Damage::Offsets {
                    start: other_start,
                    end: other_end,
                },
            ) if *other_start <= *end && *start <= *other_end => {
                *start = (*start).min(*other_start);
                *end = (*end).max(*other_end);
                true
            }
            (Damage::Pixels(rect), Damage::Pixels(other)) if rect.intersects(other) => {
                *rect = rect.union(*other);
                true
            }
            _ => false,
        }
    }
}

/// A unit of work for the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send>;

/// The single UI-thread executor.
///
/// Implementations enqueue `task` to run later on the UI thread, in posting order.
pub trait UiExecutor: Send + Sync {
    /// Enqueue a task.
    fn post(&self, task: UiTask);
}

/// A UI queue drained explicitly by the host (or by tests).
#[derive(Default)]
pub struct ManualExecutor {
    queue: Mutex<VecDeque<UiTask>>,
}

impl ManualExecutor {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Run queued tasks (including tasks posted while draining) and return how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // The lock is released before the task runs so tasks may post more work.
            let Some(task) = self.lock().pop_front() else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<UiTask>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UiExecutor for ManualExecutor {
    fn post(&self, task: UiTask) {
        self.lock().push_back(task);
    }
}

impl fmt::Debug for ManualExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualExecutor")
            .field("pending", &self.pending())
            .finish()
    }
}

/// The view that consumes repaint batches.
pub trait RepaintTarget: Send + Sync {
    /// The buffer currently shown, if any.
    fn displayed_buffer(&self) -> Option<BufferId>;

    /// Repaint the given areas of `buffer`. Called on the UI thread.
    fn repaint(&self, buffer: BufferId, damage: &[Damage]);
}

#[derive(Debug)]
struct Batch {
    buffer: BufferId,
    damage: Vec<Damage>,
}

#[derive(Debug, Default)]
struct SchedulerState {
    batch: Option<Batch>,
    task_queued: bool,
}

/// Merges damage requests into one batch per displayed buffer and flushes it on the UI thread.
///
/// Cloning yields another handle to the same scheduler; handles may be used from any thread.
#[derive(Clone)]
pub struct RepaintScheduler {
    state: Arc<Mutex<SchedulerState>>,
    executor: Arc<dyn UiExecutor>,
    target: Arc<dyn RepaintTarget>,
}

impl RepaintScheduler {
    /// Create a scheduler posting to `executor` and repainting `target`.
    pub fn new(executor: Arc<dyn UiExecutor>, target: Arc<dyn RepaintTarget>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState::default())),
            executor,
            target,
        }
    }

    /// Request a repaint of `damage` in `buffer`.
    pub fn request(&self, buffer: BufferId, damage: Damage) {
        if self.target.displayed_buffer() != Some(buffer) {
            log::trace!("ignoring damage for hidden buffer {buffer:?}");
            return;
        }

        let post = {
            let mut state = lock(&self.state);
            match &mut state.batch {
                Some(batch) if batch.buffer == buffer => merge_into(&mut batch.damage, damage),
                slot => {
                    if let Some(stale) = slot.as_ref() {
                        log::debug!(
                            "discarding {} pending damage(s) for buffer {:?}",
                            stale.damage.len(),
                            stale.buffer
                        );
                    }
                    *slot = Some(Batch {
                        buffer,
                        damage: vec![damage],
                    });
                }
            }
            !std::mem::replace(&mut state.task_queued, true)
        };

        if post {
            let state = Arc::clone(&self.state);
            let target = Arc::clone(&self.target);
            self.executor.post(Box::new(move || flush(&state, target.as_ref())));
        }
    }

    /// Returns `true` if a batch is waiting for the flush task.
    pub fn has_pending(&self) -> bool {
        lock(&self.state).batch.is_some()
    }
}

impl fmt::Debug for RepaintScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepaintScheduler")
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

fn lock(state: &Mutex<SchedulerState>) -> MutexGuard<'_, SchedulerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn merge_into(batch: &mut Vec<Damage>, mut damage: Damage) {
    // Merged damage takes the place of the earliest entry it absorbed. Growing can make it touch
    // further entries, so re-scan until stable.
    let mut slot: Option<usize> = None;
    while let Some(pos) = batch.iter().position(|d| damage.try_merge(d)) {
        batch.remove(pos);
        slot = Some(slot.map_or(pos, |s| s.min(pos)));
    }
    match slot {
        Some(pos) => batch.insert(pos, damage),
        None => batch.push(damage),
    }
}

fn flush(state: &Mutex<SchedulerState>, target: &dyn RepaintTarget) {
    let batch = {
        let mut state = lock(state);
        state.task_queued = false;
        state.batch.take()
    };
    let Some(batch) = batch else { return };

    if target.displayed_buffer() != Some(batch.buffer) {
        log::debug!(
            "displayed buffer changed; dropping {} damage(s) for {:?}",
            batch.damage.len(),
            batch.buffer
        );
        return;
    }
    log::trace!(
        "repainting {} area(s) of {:?}",
        batch.damage.len(),
        batch.buffer
    );
    target.repaint(batch.buffer, &batch.damage);
}
