use std::sync::{Barrier, Mutex};
use std::thread;
use std::time::Duration;

use futures::executor::block_on;
use futures::StreamExt;

use super::{given_a_counter_at, increment, CounterState};
use oxide_store::{error, Arc, DomainStore, Store, StoreError, TestObserver, Transition};

#[test]
fn given_several_updates_when_subscribing_late_should_replay_only_the_latest() {
    let test = given_a_counter_at(0);
    test.counter.increment();
    test.counter.increment();

    let late = test.counter.subscribe();

    assert_eq!(late.try_next().map(|s| s.value), Ok(2));
    assert_eq!(late.try_next().err(), Some(StoreError::Empty));
}

#[test]
fn given_several_updates_when_observing_late_should_replay_latest_then_follow() {
    let test = given_a_counter_at(0);
    test.counter.increment();
    test.counter.increment();

    let late = TestObserver::attach_domain(&test.counter);
    test.counter.double();

    late.with_states(|states| {
        let values: Vec<i32> = states.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2, 4]);
    });
}

#[test]
fn given_an_idle_subscription_should_not_retain_superseded_states() {
    let store = Store::new(CounterState { value: 0 });
    let initial = store.state();
    let idle = store.subscribe();

    for _ in 0..10_000 {
        store.update([increment()]);
    }

    assert_eq!(Arc::strong_count(&initial), 1);
    let next: error::Result<i32> = idle.try_next().map(|s| s.value);
    assert_eq!(next, Ok(10_000));
    assert_eq!(idle.try_next().err(), Some(StoreError::Empty));
}

#[test]
fn given_two_subscribers_should_deliver_the_same_allocation_to_both() {
    let store = Store::new(CounterState { value: 0 });
    let first = store.subscribe();
    let second = store.subscribe();

    store.update([increment()]);

    let first_seen = first.latest();
    let second_seen = second.latest();
    match (first_seen, second_seen) {
        (Some(a), Some(b)) => assert!(Arc::ptr_eq(&a, &b)),
        other => panic!("expected both subscribers to see a state, got {other:?}"),
    }
}

#[test]
fn given_two_observers_should_notify_in_registration_order() {
    let store = Store::new(CounterState { value: 0 });
    let calls = std::sync::Arc::new(Mutex::new(Vec::new()));

    let first_calls = calls.clone();
    let _first = store.observe(move |s| {
        first_calls.lock().unwrap().push(("first", s.value));
    });
    let second_calls = calls.clone();
    let _second = store.observe(move |s| {
        second_calls.lock().unwrap().push(("second", s.value));
    });

    store.update([increment()]);

    assert_eq!(
        *calls.lock().unwrap(),
        vec![("first", 0), ("second", 0), ("first", 1), ("second", 1)]
    );
}

#[test]
fn given_an_observer_reading_the_store_should_see_the_published_state() {
    let store = std::sync::Arc::new(Store::new(CounterState { value: 0 }));
    let reads = std::sync::Arc::new(Mutex::new(Vec::new()));

    let reader = store.clone();
    let sink = reads.clone();
    let _observation = store.observe(move |_| {
        sink.lock().unwrap().push(reader.state().value);
    });

    store.update([increment()]);

    assert_eq!(*reads.lock().unwrap(), vec![0, 1]);
}

#[test]
fn given_a_dropped_subscription_should_leave_other_subscribers_untouched() {
    let store = Store::new(CounterState { value: 0 });
    let kept = store.subscribe();
    let dropped = store.subscribe();

    drop(dropped);
    store.update([increment()]);

    assert_eq!(kept.latest().map(|s| s.value), Some(1));
    assert_eq!(store.subscriber_count(), 1);
}

#[test]
fn given_a_dropped_observation_should_stop_its_callback() {
    let store = Store::new(CounterState { value: 0 });
    let calls = std::sync::Arc::new(Mutex::new(0));

    let sink = calls.clone();
    let observation = store.observe(move |_| {
        *sink.lock().unwrap() += 1;
    });
    store.update([increment()]);
    drop(observation);
    store.update([increment()]);

    assert_eq!(*calls.lock().unwrap(), 2);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn given_a_dropped_store_should_yield_the_last_state_then_close() {
    let store = Store::new(CounterState { value: 0 });
    let subscription = store.subscribe();
    store.update([increment()]);

    drop(store);

    assert_eq!(subscription.try_next().map(|s| s.value), Ok(1));
    assert_eq!(subscription.try_next().err(), Some(StoreError::Closed));
    assert_eq!(subscription.next_blocking().err(), Some(StoreError::Closed));
}

#[test]
fn given_a_stream_read_between_updates_should_yield_each_then_end() {
    let store = Store::new(CounterState { value: 10 });
    let mut stream = Box::pin(store.subscribe().into_stream());

    assert_eq!(block_on(stream.next()).map(|s| s.value), Some(10));
    store.update([increment()]);
    assert_eq!(block_on(stream.next()).map(|s| s.value), Some(11));
    store.update([increment(), increment()]);
    drop(store);

    let rest: Vec<i32> = block_on(stream.map(|s| s.value).collect());
    assert_eq!(rest, vec![13]);
}

#[test]
fn given_updates_from_several_threads_should_apply_every_one() {
    let store = std::sync::Arc::new(Store::new(CounterState { value: 0 }));
    let observer = TestObserver::attach(&store);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    store.update([increment()]);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    assert_eq!(store.state().value, 100);
    observer.with_states(|states| {
        let values: Vec<i32> = states.iter().map(|s| s.value).collect();
        assert_eq!(values, (0..=100).collect::<Vec<_>>());
    });
}

#[test]
fn given_a_slow_writer_should_park_a_contending_writer_until_it_commits() {
    let store = std::sync::Arc::new(Store::new(CounterState { value: 1 }));
    let started = std::sync::Arc::new(Barrier::new(2));

    let slow_store = store.clone();
    let slow_started = started.clone();
    let slow = thread::spawn(move || {
        slow_store.update([Transition::map(move |s: &CounterState| {
            slow_started.wait();
            thread::sleep(Duration::from_millis(50));
            CounterState { value: s.value * 10 }
        })]);
    });

    started.wait();
    // Runs strictly after the slow batch has been committed.
    store.update([increment()]);
    slow.join().expect("slow writer panicked");

    assert_eq!(store.state().value, 11);
}
