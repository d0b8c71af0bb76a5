//! End-to-end builder scenarios: submission, scheduling, cancellation,
//! observer plumbing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tasksmith::{Pool, TaskError, ThreadBuilder, WorkerFactory};
use tokio_util::sync::CancellationToken;

async fn explode(_ctx: CancellationToken) -> Result<u32, TaskError> {
    panic!("body blew up")
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_missing_body_fails_before_any_pool_exists() {
    let err = ThreadBuilder::execution().start().err().expect("config error");
    assert_eq!(err.as_label(), "config_missing_execution");

    let err = ThreadBuilder::computation::<u32>()
        .start()
        .err()
        .expect("config error");
    assert_eq!(err.as_label(), "config_missing_execution");
}

#[test]
fn test_one_shot_action_runs_and_joins() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();

    let handle = ThreadBuilder::execution()
        .with_fn(move |_ctx| {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        })
        .start()
        .expect("start");

    handle.join().expect("join");
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn test_computation_delivers_value_to_consumer_and_handle() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();

    let handle = ThreadBuilder::computation::<u64>()
        .with_fn(|_ctx| async { Ok(41 + 1) })
        .with_result_consumer(move |value| *sink.lock().unwrap() = Some(*value))
        .start()
        .expect("start");

    assert_eq!(handle.join().expect("join"), 42);
    assert_eq!(*seen.lock().unwrap(), Some(42));
}

#[test]
fn test_shared_pool_runs_three_computations() {
    let pool = Pool::new(2, &WorkerFactory::new()).expect("pool");
    let observed = Arc::new(AtomicUsize::new(0));
    {
        let observed = observed.clone();
        pool.add_after_execute(Arc::new(move |_, _| {
            observed.fetch_add(1, Ordering::SeqCst);
        }));
    }

    let results = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::new();
    for value in [1u64, 2, 3] {
        let sink = results.clone();
        let handle = ThreadBuilder::computation::<u64>()
            .with_pool(pool.clone())
            .with_fn(move |_ctx| async move { Ok(value * 10) })
            .with_result_consumer(move |v| sink.lock().unwrap().push(*v))
            .start()
            .expect("start");
        handles.push(handle);
    }

    let mut joined: Vec<u64> = handles
        .into_iter()
        .map(|h| h.join().expect("join"))
        .collect();
    joined.sort_unstable();
    assert_eq!(joined, vec![10, 20, 30]);

    let mut consumed = results.lock().unwrap().clone();
    consumed.sort_unstable();
    assert_eq!(consumed, vec![10, 20, 30]);
    assert_eq!(observed.load(Ordering::SeqCst), 3);
}

#[test]
fn test_fixed_rate_fires_per_interval() {
    init_logs();
    let firings = Arc::new(AtomicUsize::new(0));
    let observed = Arc::new(AtomicUsize::new(0));

    let counter = firings.clone();
    let seen = observed.clone();
    let handle = ThreadBuilder::scheduling()
        .with_fn(move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .with_delay(Duration::from_millis(50))
        .with_interval(Duration::from_millis(100))
        .with_after_execute(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .start()
        .expect("start");

    // Expected firings at 50, 150, 250, 350 ms.
    std::thread::sleep(Duration::from_millis(400));
    handle.cancel();
    let outcome = handle.join();
    assert!(matches!(outcome, Err(TaskError::Canceled)));

    let fired = firings.load(Ordering::SeqCst);
    assert!((4..=5).contains(&fired), "unexpected firing count {fired}");
    // Observers fire exactly once per firing.
    assert_eq!(observed.load(Ordering::SeqCst), fired);
}

#[test]
fn test_zero_delay_with_interval_is_rejected_synchronously() {
    let err = ThreadBuilder::scheduling()
        .with_fn(|_ctx| async { Ok(()) })
        .with_delay(Duration::ZERO)
        .with_interval(Duration::from_millis(100))
        .start()
        .err()
        .expect("config error");
    assert_eq!(err.as_label(), "config_delay_below_minimum");
}

#[test]
fn test_timeout_interrupts_overrunning_body() {
    init_logs();
    let completed = Arc::new(AtomicBool::new(false));
    let flag = completed.clone();

    let handle = ThreadBuilder::scheduling()
        .with_fn(move |_ctx| {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        })
        .with_timeout(Duration::from_millis(50))
        .with_may_interrupt(true)
        .start()
        .expect("start");

    let outcome = handle.join();
    assert!(matches!(outcome, Err(TaskError::Timeout { .. })), "{outcome:?}");
    assert!(!completed.load(Ordering::SeqCst), "body was not aborted");
}

#[test]
fn test_timeout_without_interrupt_lets_a_started_body_finish() {
    let handle = ThreadBuilder::scheduled_computation::<&'static str>()
        .with_fn(|_ctx| async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            Ok("finished anyway")
        })
        .with_timeout(Duration::from_millis(50))
        .with_may_interrupt(false)
        .start()
        .expect("start");

    assert_eq!(handle.join().expect("join"), "finished anyway");
}

#[test]
fn test_timeout_does_not_fire_for_a_fast_body() {
    let handle = ThreadBuilder::scheduled_computation::<u32>()
        .with_fn(|_ctx| async { Ok(7) })
        .with_timeout(Duration::from_millis(500))
        .with_may_interrupt(true)
        .start()
        .expect("start");

    assert_eq!(handle.join().expect("join"), 7);
}

#[test]
fn test_cancel_during_delay_cancels_the_submission() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();

    let handle = ThreadBuilder::scheduling()
        .with_fn(move |_ctx| {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        })
        .with_delay(Duration::from_millis(300))
        .start()
        .expect("start");

    handle.cancel();
    assert!(handle.is_cancelled());
    let outcome = handle.join();
    assert!(matches!(outcome, Err(TaskError::Canceled)));
    assert!(!ran.load(Ordering::SeqCst), "body ran despite cancellation");
}

#[test]
fn test_silent_interruption_skips_the_uncaught_consumer() {
    let loud = Arc::new(AtomicUsize::new(0));

    // Silenced: the consumer must not see the cancellation.
    let consumer_hits = loud.clone();
    let handle = ThreadBuilder::scheduling()
        .with_fn(|_ctx| async { Ok(()) })
        .with_delay(Duration::from_millis(300))
        .with_silent_interruption(true)
        .with_uncaught_consumer(move |_| {
            consumer_hits.fetch_add(1, Ordering::SeqCst);
        })
        .start()
        .expect("start");
    handle.cancel();
    let _ = handle.join();
    assert_eq!(loud.load(Ordering::SeqCst), 0);

    // Not silenced: the consumer sees it.
    let consumer_hits = loud.clone();
    let handle = ThreadBuilder::scheduling()
        .with_fn(|_ctx| async { Ok(()) })
        .with_delay(Duration::from_millis(300))
        .with_uncaught_consumer(move |err| {
            assert!(err.is_interruption());
            consumer_hits.fetch_add(1, Ordering::SeqCst);
        })
        .start()
        .expect("start");
    handle.cancel();
    let _ = handle.join();
    assert_eq!(loud.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_body_becomes_a_task_error() {
    let handle = ThreadBuilder::computation::<u32>()
        .with_fn(explode)
        .start()
        .expect("start");

    match handle.join() {
        Err(TaskError::Panicked { info }) => assert!(info.contains("body blew up")),
        other => panic!("expected panic outcome, got {other:?}"),
    }
}

#[test]
fn test_failure_reaches_the_uncaught_consumer() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();

    let handle = ThreadBuilder::execution()
        .with_fn(|_ctx| async { Err(TaskError::msg("write refused")) })
        .with_uncaught_consumer(move |err| {
            *sink.lock().unwrap() = Some(err.to_string());
        })
        .start()
        .expect("start");

    assert!(handle.join().is_err());
    let message = seen.lock().unwrap().clone().expect("consumer ran");
    assert!(message.contains("write refused"));
}

#[test]
fn test_start_and_build_other_shares_the_pool() {
    let (first, chained) = ThreadBuilder::computation::<u32>()
        .with_pool_size(1)
        .with_fn(|_ctx| async { Ok(1) })
        .start_and_build_other()
        .expect("first start");

    // The chained builder has no body of its own.
    let second = chained
        .with_fn(|_ctx| async { Ok(2) })
        .start()
        .expect("second start");

    assert!(Arc::ptr_eq(first.pool(), second.pool()));
    assert_eq!(first.join().expect("first join"), 1);
    assert_eq!(second.join().expect("second join"), 2);
}

#[test]
fn test_chained_builder_requires_its_own_body() {
    let (handle, chained) = ThreadBuilder::execution()
        .with_fn(|_ctx| async { Ok(()) })
        .start_and_build_other()
        .expect("start");
    handle.join().expect("join");

    let err = chained.start().err().expect("config error");
    assert_eq!(err.as_label(), "config_missing_execution");
}

#[test]
fn test_last_configured_repeat_venue_wins() {
    // Interval set after timeout: the submission repeats.
    let firings = Arc::new(AtomicUsize::new(0));
    let counter = firings.clone();
    let handle = ThreadBuilder::scheduling()
        .with_fn(move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .with_timeout(Duration::from_millis(40))
        .with_delay(Duration::from_millis(10))
        .with_interval(Duration::from_millis(50))
        .start()
        .expect("start");

    std::thread::sleep(Duration::from_millis(200));
    handle.cancel();
    let _ = handle.join();
    assert!(
        firings.load(Ordering::SeqCst) >= 2,
        "timeout venue applied instead of the interval"
    );
}
