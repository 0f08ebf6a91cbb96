//! Animation clock primitives
//!
//! The engine never sleeps or blocks. Future work goes on a [`Timers`] queue
//! or a [`FrameTicker`], and the host's frame loop advances both with the
//! current time in milliseconds.

use std::cmp::Ordering;

/// Handle to a scheduled timer, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Pending<E> {
    handle: TimerHandle,
    due_ms: f64,
    event: E,
}

/// One-shot timer queue keyed by due time
#[derive(Debug, Clone)]
pub struct Timers<E> {
    pending: Vec<Pending<E>>,
    next_id: u64,
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timers<E> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Schedule `event` to fire once `now >= due_ms`
    pub fn schedule(&mut self, due_ms: f64, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            due_ms,
            event,
        });
        handle
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due time, if anything is pending
    pub fn next_due(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|p| p.due_ms)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Remove and return every event due at `now_ms`, oldest deadline first.
    /// Ties fire in scheduling order.
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<E> {
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.due_ms <= now_ms);
        self.pending = rest;

        due.sort_by(|a, b| {
            a.due_ms
                .partial_cmp(&b.due_ms)
                .unwrap_or(Ordering::Equal)
                .then(a.handle.0.cmp(&b.handle.0))
        });
        due.into_iter().map(|p| p.event).collect()
    }
}

/// Per-frame ticker with start/cancel
///
/// Stands in for a self-rescheduling animation-frame callback: while running,
/// each host frame produces exactly one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTicker {
    running: bool,
    ticks: u64,
}

impl FrameTicker {
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Total ticks delivered since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one frame. Returns true if a tick was delivered.
    pub fn tick(&mut self) -> bool {
        if self.running {
            self.ticks += 1;
        }
        self.running
    }
}
