//! A deterministic, single-threaded promise/deferred core.
//!
//! Every promise in this crate settles exactly once, and every callback
//! registered on one — fulfillment, rejection, or progress — runs from a
//! host microtask, never synchronously with the call that registered it.
//! There is no locking anywhere: the whole graph of promises produced from
//! one [`Runtime`] is driven by a single [`promise_host::Host`], so nothing
//! here needs to be `Send`.
//!
//! [`Promise::then`] is the only primitive; everything else (`map`,
//! `catch`, `all`, `delay`, `unfold`, ...) is sugar built on top of it.

mod algebra;
mod anamorphism;
mod combinators;
mod error;
mod handler;
mod outcome;
mod promise;
mod runtime;
mod timing;

pub use error::PromiseError;
pub use handler::Settlement;
pub use outcome::{Outcome, Thenable};
pub use promise::{Deferred, Promise};
pub use runtime::Runtime;

pub use anamorphism::{iterate, unfold};

#[cfg(test)]
mod tests {
    use super::*;
    use promise_host::ManualHost;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum TestError {
        Promise(PromiseError),
        Custom(&'static str),
    }

    impl From<PromiseError> for TestError {
        fn from(e: PromiseError) -> Self {
            TestError::Promise(e)
        }
    }

    fn runtime() -> (Runtime, Rc<ManualHost>) {
        let host = Rc::new(ManualHost::new());
        (Runtime::new(host.clone()), host)
    }

    #[test]
    fn then_callback_never_runs_synchronously() {
        let (rt, host) = runtime();
        let ran = Rc::new(RefCell::new(false));
        let ran2 = ran.clone();

        let p: Promise<i32, TestError> = rt.resolve(1);
        let _derived = p.then(
            move |v| {
                *ran2.borrow_mut() = true;
                Outcome::Value(v + 1)
            },
            Outcome::Rejected,
        );

        assert!(!*ran.borrow(), "then callback ran before a microtask checkpoint");
        host.run_until_idle();
        assert!(*ran.borrow());
    }

    #[test]
    fn fulfillment_propagates_through_then() {
        let (rt, host) = runtime();
        let result: Rc<RefCell<Option<i32>>> = Rc::new(RefCell::new(None));
        let result2 = result.clone();

        let p: Promise<i32, TestError> = rt.resolve(10);
        let doubled = p.then(|v| Outcome::Value(v * 2), Outcome::Rejected);
        doubled.done(move |v| *result2.borrow_mut() = Some(v), |_| {});

        host.run_until_idle();
        assert_eq!(*result.borrow(), Some(20));
    }

    #[test]
    fn settlement_happens_once() {
        let (rt, host) = runtime();
        let deferred = rt.deferred::<i32, TestError, ()>();
        deferred.resolve(Outcome::Value(1));
        deferred.resolve(Outcome::Value(2));
        deferred.reject(TestError::Custom("too late"));

        host.run_until_idle();
        match deferred.promise().inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 1),
            _ => panic!("expected the first resolve() to win"),
        }
    }

    #[test]
    fn resolving_a_promise_with_itself_rejects() {
        let (rt, host) = runtime();
        let deferred = rt.deferred::<i32, TestError, ()>();
        let p = deferred.promise();
        deferred.resolve(Outcome::Following(p));

        host.run_until_idle();
        match deferred.promise().inspect() {
            Settlement::Rejected(TestError::Promise(PromiseError::SelfResolution)) => {}
            _ => panic!("expected a self-resolution rejection"),
        }
    }

    struct FlakyThenable {
        calls: Rc<RefCell<u32>>,
    }

    impl Thenable<i32, TestError> for FlakyThenable {
        fn then(
            self: Box<Self>,
            on_fulfilled: Box<dyn FnOnce(i32)>,
            on_rejected: Box<dyn FnOnce(TestError)>,
        ) {
            *self.calls.borrow_mut() += 1;
            // Misbehaves by calling both callbacks; only the first should
            // have any effect.
            on_fulfilled(1);
            on_rejected(TestError::Custom("should be ignored"));
        }
    }

    #[test]
    fn misbehaving_thenable_only_settles_once() {
        let (rt, host) = runtime();
        let deferred = rt.deferred::<i32, TestError, ()>();
        let calls = Rc::new(RefCell::new(0));
        deferred.resolve(Outcome::Thenable(Box::new(FlakyThenable {
            calls: calls.clone(),
        })));

        host.run_until_idle();
        assert_eq!(*calls.borrow(), 1);
        match deferred.promise().inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 1),
            _ => panic!("expected the thenable's first callback to win"),
        }
    }

    #[test]
    fn thenable_assimilation_is_deferred() {
        let (rt, host) = runtime();
        let deferred = rt.deferred::<i32, TestError, ()>();
        let called = Rc::new(RefCell::new(false));
        let called2 = called.clone();

        struct Immediate {
            called: Rc<RefCell<bool>>,
        }
        impl Thenable<i32, TestError> for Immediate {
            fn then(
                self: Box<Self>,
                on_fulfilled: Box<dyn FnOnce(i32)>,
                _on_rejected: Box<dyn FnOnce(TestError)>,
            ) {
                *self.called.borrow_mut() = true;
                on_fulfilled(42);
            }
        }

        deferred.resolve(Outcome::Thenable(Box::new(Immediate { called: called2 })));
        assert!(!*called.borrow(), "thenable.then was called synchronously");
        host.run_until_idle();
        assert!(*called.borrow());
    }

    #[test]
    fn all_resolves_in_order_and_fails_fast() {
        let (rt, host) = runtime();
        let a: Promise<i32, TestError> = rt.resolve(1);
        let b: Promise<i32, TestError> = rt.reject(TestError::Custom("boom"));
        let c: Promise<i32, TestError> = rt.resolve(3);

        let all = rt.all(vec![a, b, c]);
        host.run_until_idle();
        match all.inspect() {
            Settlement::Rejected(TestError::Custom("boom")) => {}
            _ => panic!("expected all() to fail fast on the rejected element"),
        }
    }

    #[test]
    fn any_rejects_with_every_reason_once_all_reject() {
        let (rt, host) = runtime();
        let a: Promise<i32, TestError> = rt.reject(TestError::Custom("a"));
        let b: Promise<i32, TestError> = rt.reject(TestError::Custom("b"));

        let any = rt.any(vec![a, b]);
        host.run_until_idle();
        match any.inspect() {
            Settlement::Rejected(reasons) => assert_eq!(reasons.len(), 2),
            _ => panic!("expected all reasons once every promise rejected"),
        }
    }

    #[test]
    fn race_takes_the_first_settlement() {
        let (rt, host) = runtime();
        let slow: Promise<i32, TestError> = rt.resolve(1).delay(100);
        let fast: Promise<i32, TestError> = rt.resolve(2).delay(10);

        let race = rt.race(vec![slow, fast]);
        host.advance(10);
        host.run_until_idle();
        match race.inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 2),
            _ => panic!("expected the faster promise to win"),
        }
    }

    #[test]
    fn timeout_rejects_when_the_deadline_elapses() {
        let (rt, host) = runtime();
        let never: Promise<i32, TestError> = rt.empty();
        let timed = never.timeout(50);

        host.advance(50);
        match timed.inspect() {
            Settlement::Rejected(TestError::Promise(PromiseError::Timeout { after_ms })) => {
                assert_eq!(after_ms, 50);
            }
            _ => panic!("expected a timeout rejection"),
        }
    }

    #[test]
    fn unfold_collects_values_without_growing_the_stack() {
        let (rt, host) = runtime();
        let produced: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        let produced2 = produced.clone();

        let rt_for_unspool = rt.clone();
        rt.unfold(
            move |seed: i32| rt_for_unspool.resolve::<(i32, i32), TestError, ()>((seed, seed + 1)),
            |seed: &i32| *seed >= 5,
            move |v: i32| produced2.borrow_mut().push(v),
            0,
        );

        host.run_until_idle();
        assert_eq!(*produced.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn iterate_resolves_to_the_final_value() {
        let (rt, host) = runtime();
        let result: Rc<RefCell<Option<i32>>> = Rc::new(RefCell::new(None));
        let result2 = result.clone();

        let rt_for_step = rt.clone();
        let settled = rt.iterate(
            move |x: i32| rt_for_step.resolve::<i32, TestError, ()>(x + 1),
            |x: &i32| *x >= 3,
            |_| {},
            0,
        );
        settled.done(move |v| *result2.borrow_mut() = Some(v), |_| {});

        host.run_until_idle();
        assert_eq!(*result.borrow(), Some(3));
    }

    #[test]
    fn delay_does_not_delay_rejections() {
        let (rt, host) = runtime();
        let rejected: Promise<i32, TestError> = rt.reject(TestError::Custom("boom"));
        let delayed = rejected.delay(1000);

        host.run_until_idle();
        match delayed.inspect() {
            Settlement::Rejected(TestError::Custom("boom")) => {}
            _ => panic!("expected the rejection to propagate without waiting for the timer"),
        }
    }

    #[test]
    fn delay_waits_for_the_timer_before_fulfilling() {
        let (rt, host) = runtime();
        let fulfilled: Promise<i32, TestError> = rt.resolve(7);
        let delayed = fulfilled.delay(100);

        host.run_until_idle();
        assert!(delayed.inspect().is_pending());

        host.advance(100);
        match delayed.inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 7),
            _ => panic!("expected the delayed value to arrive once the timer fired"),
        }
    }

    #[test]
    fn progress_is_forwarded_through_then() {
        let (rt, host) = runtime();
        let deferred = rt.deferred::<i32, TestError, i32>();
        let seen: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();

        let derived = deferred.promise().then(Outcome::Value, Outcome::Rejected);
        derived.progress(move |u| {
            seen2.borrow_mut().push(u);
            u
        });

        deferred.notify(1);
        deferred.notify(2);
        host.run_until_idle();
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn any_of_empty_input_fulfills_with_default() {
        let (rt, host) = runtime();
        let none = rt.any::<i32, TestError, ()>(Vec::new());
        host.run_until_idle();
        match none.inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 0),
            _ => panic!("expected an empty any() to fulfill with the default value"),
        }
    }

    #[test]
    fn cast_of_a_trusted_promise_is_the_identity() {
        let (rt, host) = runtime();
        let p: Promise<i32, TestError> = rt.resolve(5);
        let cast = rt.cast(Outcome::Following(p.clone()));
        assert!(Rc::ptr_eq(&p.inner, &cast.inner));
        host.run_until_idle();
    }

    #[test]
    fn spread_applies_the_collected_values() {
        let (rt, host) = runtime();
        let a: Promise<i32, TestError> = rt.resolve(1);
        let b: Promise<i32, TestError> = rt.resolve(2);
        let arr: Promise<Vec<Promise<i32, TestError>>, TestError> = rt.resolve(vec![a, b]);

        let summed = arr.spread(|values| Outcome::Value(values.iter().sum::<i32>()));
        host.run_until_idle();
        match summed.inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 3),
            _ => panic!("expected spread to apply the collected values"),
        }
    }

    #[test]
    fn reduce_with_folds_a_single_value() {
        let (rt, host) = runtime();
        let p: Promise<i32, TestError> = rt.resolve(10);
        let folded = p.reduce_with(5, |acc, v| acc + v);
        host.run_until_idle();
        match folded.inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 15),
            _ => panic!("expected reduce_with to apply f to the single value"),
        }
    }

    #[test]
    fn reduce_without_an_initial_value_is_just_resolve() {
        let (rt, host) = runtime();
        let p: Promise<i32, TestError> = rt.resolve(10);
        let same = p.reduce();
        host.run_until_idle();
        match same.inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 10),
            _ => panic!("expected the one-argument reduce() to resolve to the same value"),
        }
    }

    #[test]
    fn concat_races_two_single_valued_promises() {
        let (rt, host) = runtime();
        let slow: Promise<i32, TestError> = rt.resolve(1).delay(100);
        let fast: Promise<i32, TestError> = rt.resolve(2).delay(10);

        let raced = slow.concat(&fast);
        host.advance(10);
        host.run_until_idle();
        match raced.inspect() {
            Settlement::Fulfilled(v) => assert_eq!(v, 2),
            _ => panic!("expected concat to adopt whichever settled first"),
        }
    }
}
