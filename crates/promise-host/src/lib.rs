//! Host environment contract for the promise runtime.
//!
//! The promise core never touches a thread, a clock, or an event loop
//! directly — it only ever calls through [`Host`]. A production embedding
//! wires this trait to whatever scheduler already exists (a GUI event loop,
//! an io_uring reactor, a single-threaded executor); this crate also ships
//! [`ManualHost`], a deterministic reference host for tests that would
//! otherwise need to sleep on a wall clock to observe timer ordering.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// A unit of deferred work. Never `Send`: the runtime this crate implements
/// is single-threaded and cooperative (see the core crate's concurrency
/// notes), so there is no reason to pay for thread-safety nobody needs.
pub type Task = Box<dyn FnOnce()>;

/// Opaque handle to a scheduled timer, returned by [`Host::set_timer`] and
/// accepted by [`Host::cancel_timer`]. Hosts are free to choose any internal
/// representation; callers must never inspect the wrapped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// The three operations the promise core needs from its environment.
///
/// - `enqueue` schedules a microtask: it must run exactly once, after the
///   current call stack unwinds, and FIFO relative to other microtasks
///   enqueued in the same turn.
/// - `set_timer`/`cancel_timer` are macrotask timers (`setTimeout`/
///   `clearTimeout` in spirit). Cancellation is best-effort: a handle for a
///   timer that already fired is simply ignored.
///
/// Object-safe by design so a single `Rc<dyn Host>` can be shared by every
/// promise produced from one [`promise_core::Runtime`](../promise_core/struct.Runtime.html).
pub trait Host {
    /// Schedule `task` to run after the current call stack unwinds.
    fn enqueue(&self, task: Task);

    /// Schedule `task` to run after at least `after_ms` milliseconds.
    /// Returns a handle that can later be passed to [`cancel_timer`](Host::cancel_timer).
    fn set_timer(&self, after_ms: u64, task: Task) -> TimerHandle;

    /// Best-effort cancellation of a previously scheduled timer.
    fn cancel_timer(&self, handle: TimerHandle);
}

struct TimerEntry {
    handle: TimerHandle,
    fire_at: u64,
    seq: u64,
    task: Option<Task>,
}

/// A deterministic, single-threaded [`Host`] driven by an explicit logical
/// clock instead of the wall clock.
///
/// There is no background thread and no real sleeping: [`run_until_idle`]
/// drains the microtask queue, and [`advance`] moves the logical clock
/// forward and fires any timers now due, draining microtasks after each one
/// (mirroring the per-task microtask checkpoint of a real event loop).
///
/// [`run_until_idle`]: ManualHost::run_until_idle
/// [`advance`]: ManualHost::advance
pub struct ManualHost {
    micro: RefCell<VecDeque<Task>>,
    timers: RefCell<Vec<TimerEntry>>,
    next_id: Cell<u64>,
    next_seq: Cell<u64>,
    now_ms: Cell<u64>,
}

impl ManualHost {
    /// Create a new host with an empty queue and the logical clock at 0.
    pub fn new() -> Self {
        Self {
            micro: RefCell::new(VecDeque::new()),
            timers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            next_seq: Cell::new(0),
            now_ms: Cell::new(0),
        }
    }

    /// Run every pending microtask, including ones enqueued by tasks this
    /// call itself runs, until the queue is empty. Returns the number run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.micro.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    /// Move the logical clock forward by `ms` and fire every timer whose
    /// deadline is now due, in deadline order (ties broken by scheduling
    /// order). Microtasks are drained after each timer fires. Returns the
    /// number of timers fired.
    pub fn advance(&self, ms: u64) -> usize {
        self.now_ms.set(self.now_ms.get() + ms);
        let now = self.now_ms.get();
        let mut fired = 0;

        loop {
            let due_index = {
                let timers = self.timers.borrow();
                timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.fire_at <= now)
                    .min_by_key(|(_, t)| (t.fire_at, t.seq))
                    .map(|(i, _)| i)
            };

            let Some(index) = due_index else { break };
            let mut entry = self.timers.borrow_mut().remove(index);
            if let Some(task) = entry.task.take() {
                task();
                fired += 1;
            }
            self.run_until_idle();
        }

        fired
    }

    /// The logical time, in milliseconds, since this host was created.
    pub fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    /// Whether any microtask or timer is still outstanding.
    pub fn has_pending_work(&self) -> bool {
        !self.micro.borrow().is_empty() || !self.timers.borrow().is_empty()
    }

    /// Number of live (uncancelled, unfired) timers.
    pub fn timer_count(&self) -> usize {
        self.timers.borrow().len()
    }
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for ManualHost {
    fn enqueue(&self, task: Task) {
        self.micro.borrow_mut().push_back(task);
    }

    fn set_timer(&self, after_ms: u64, task: Task) -> TimerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);

        let handle = TimerHandle(id);
        self.timers.borrow_mut().push(TimerEntry {
            handle,
            fire_at: self.now_ms.get() + after_ms,
            seq,
            task: Some(task),
        });
        handle
    }

    fn cancel_timer(&self, handle: TimerHandle) {
        self.timers.borrow_mut().retain(|t| t.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn new_host_is_idle() {
        let host = ManualHost::new();
        assert!(!host.has_pending_work());
        assert_eq!(host.timer_count(), 0);
        assert_eq!(host.now_ms(), 0);
    }

    #[test]
    fn enqueue_runs_fifo() {
        let host = ManualHost::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            host.enqueue(Box::new(move || order.borrow_mut().push(i)));
        }

        let ran = host.run_until_idle();
        assert_eq!(ran, 3);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn microtasks_enqueued_during_a_task_still_drain() {
        let host = Rc::new(ManualHost::new());
        let order = Rc::new(RefCell::new(Vec::new()));

        {
            let host2 = host.clone();
            let order2 = order.clone();
            host.enqueue(Box::new(move || {
                order2.borrow_mut().push("a");
                let order3 = order2.clone();
                host2.enqueue(Box::new(move || order3.borrow_mut().push("b")));
            }));
        }

        host.run_until_idle();
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn timer_does_not_fire_before_deadline() {
        let host = ManualHost::new();
        let fired = Rc::new(RefCell::new(false));
        let fired2 = fired.clone();
        host.set_timer(100, Box::new(move || *fired2.borrow_mut() = true));

        host.advance(50);
        assert!(!*fired.borrow());
        assert_eq!(host.timer_count(), 1);
    }

    #[test]
    fn timer_fires_once_deadline_reached() {
        let host = ManualHost::new();
        let fired = Rc::new(RefCell::new(false));
        let fired2 = fired.clone();
        host.set_timer(100, Box::new(move || *fired2.borrow_mut() = true));

        host.advance(100);
        assert!(*fired.borrow());
        assert_eq!(host.timer_count(), 0);
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let host = ManualHost::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = order.clone();
        host.set_timer(30, Box::new(move || o1.borrow_mut().push(30)));
        let o2 = order.clone();
        host.set_timer(10, Box::new(move || o2.borrow_mut().push(10)));
        let o3 = order.clone();
        host.set_timer(20, Box::new(move || o3.borrow_mut().push(20)));

        host.advance(30);
        assert_eq!(*order.borrow(), vec![10, 20, 30]);
    }

    #[test]
    fn cancel_timer_prevents_firing() {
        let host = ManualHost::new();
        let fired = Rc::new(RefCell::new(false));
        let fired2 = fired.clone();
        let handle = host.set_timer(10, Box::new(move || *fired2.borrow_mut() = true));

        host.cancel_timer(handle);
        host.advance(10);
        assert!(!*fired.borrow());
    }

    #[test]
    fn cancel_nonexistent_timer_is_noop() {
        let host = ManualHost::new();
        host.cancel_timer(TimerHandle(9999));
        assert_eq!(host.timer_count(), 0);
    }

    #[test]
    fn default_creates_new() {
        let host = ManualHost::default();
        assert!(!host.has_pending_work());
    }
}
