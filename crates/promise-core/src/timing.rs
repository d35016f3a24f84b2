//! Time-based combinators built on `Host::set_timer`.

use std::cell::Cell;
use std::rc::Rc;

use promise_host::{Host, TimerHandle};

use crate::error::PromiseError;
use crate::outcome::Outcome;
use crate::promise::Promise;

impl<T, E, U> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    /// Propagate this promise's eventual fulfillment, but only after an
    /// additional `ms` milliseconds have elapsed past that fulfillment.
    /// Rejections are not delayed — they propagate immediately. Progress
    /// from `self` is forwarded unchanged.
    pub fn delay(&self, ms: u64) -> Promise<T, E, U> {
        let host = self.inner_host();
        let deferred = Promise::deferred(host.clone());
        let next = deferred.promise.clone();
        self.subscribe(move |result| match result {
            Ok(v) => {
                let next = next.clone();
                host.set_timer(ms, Box::new(move || next.resolve(Outcome::Value(v))));
            }
            Err(e) => next.resolve(Outcome::Rejected(e)),
        });
        let next_progress = deferred.promise.clone();
        self.add_progress_listener(move |u| next_progress.notify(u));
        deferred.promise
    }

    /// Race this promise against a deadline: if it hasn't settled within
    /// `ms` milliseconds, the returned promise rejects with
    /// [`PromiseError::Timeout`]. The deadline timer is cancelled as soon
    /// as this promise settles on its own.
    pub fn timeout(&self, ms: u64) -> Promise<T, E, U> {
        let host = self.inner_host();
        let deferred = Promise::deferred(host.clone());
        let handle_cell: Rc<Cell<Option<TimerHandle>>> = Rc::new(Cell::new(None));

        let next_settle = deferred.promise.clone();
        let host_for_settle = host.clone();
        let handle_cell_settle = handle_cell.clone();
        self.subscribe(move |result| {
            if let Some(handle) = handle_cell_settle.get() {
                host_for_settle.cancel_timer(handle);
            }
            match result {
                Ok(v) => next_settle.resolve(Outcome::Value(v)),
                Err(e) => next_settle.resolve(Outcome::Rejected(e)),
            }
        });

        let next_timeout = deferred.promise.clone();
        let handle = host.set_timer(
            ms,
            Box::new(move || {
                next_timeout.resolve(Outcome::Rejected(E::from(PromiseError::Timeout {
                    after_ms: ms,
                })));
            }),
        );
        handle_cell.set(Some(handle));

        deferred.promise
    }
}
