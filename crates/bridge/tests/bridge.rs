use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sluice_bridge::{
	BridgeConfig, BridgeError, OverflowPolicy, ProducerDropped, PullError, PushOutcome, StateKind, TryPushError, bridge,
};

fn init() {
	let _ = tracing_subscriber::fmt::try_init();
}

#[test]
fn pushed_evens_are_pulled_in_order_then_end() {
	init();
	let (tx, mut rx) = bridge(BridgeConfig::default());
	for i in (0..=9).filter(|i| i % 2 == 0) {
		tx.push_blocking(i).unwrap();
	}
	tx.complete().unwrap();

	let mut seen = Vec::new();
	while let Some(el) = rx.pull().unwrap() {
		seen.push(el);
	}
	assert_eq!(seen, vec![0, 2, 4, 6, 8]);
	assert_eq!(seen.len(), 5);
	assert_eq!(rx.pull().unwrap(), None);
}

#[test]
fn complete_without_elements_ends_immediately() {
	let (tx, mut rx) = bridge::<u32>(BridgeConfig::default());
	tx.complete().unwrap();
	assert_eq!(rx.pull().unwrap(), None);
}

#[test]
fn failure_follows_buffered_elements() {
	let (tx, mut rx) = bridge(BridgeConfig::default());
	tx.push_blocking("first").unwrap();
	tx.fail("boom").unwrap();

	assert_eq!(rx.pull().unwrap(), Some("first"));
	let err = rx.pull().unwrap_err();
	assert!(err.to_string().contains("boom"), "got {err}");

	// Failed is permanent: the same failure is re-raised.
	let again = rx.pull().unwrap_err();
	assert_eq!(again.to_string(), err.to_string());
}

#[test]
fn iterator_yields_failure_once_then_ends() {
	let (tx, rx) = bridge(BridgeConfig::default());
	tx.push_blocking(1).unwrap();
	tx.push_blocking(2).unwrap();
	tx.fail("boom").unwrap();

	let items: Vec<_> = rx.collect();
	assert_eq!(items.len(), 3);
	assert_eq!(items[0].as_ref().ok(), Some(&1));
	assert_eq!(items[1].as_ref().ok(), Some(&2));
	assert!(items[2].as_ref().is_err_and(|e| e.to_string().contains("boom")));
}

#[test]
fn second_complete_is_invalid_state() {
	let (tx, mut rx) = bridge::<u8>(BridgeConfig::default());
	tx.push_blocking(9).unwrap();
	tx.complete().unwrap();

	assert_eq!(
		tx.complete(),
		Err(BridgeError::InvalidState {
			op: "complete",
			state: StateKind::Completed
		})
	);
	assert_eq!(
		tx.fail("late"),
		Err(BridgeError::InvalidState {
			op: "fail",
			state: StateKind::Completed
		})
	);
	assert_eq!(
		tx.push_blocking(10),
		Err(BridgeError::InvalidState {
			op: "push",
			state: StateKind::Completed
		})
	);

	assert_eq!(rx.pull().unwrap(), Some(9));
	assert_eq!(rx.pull().unwrap(), None);
}

#[test]
fn complete_after_fail_is_invalid_state() {
	let (tx, mut rx) = bridge(BridgeConfig::default());
	tx.push_blocking(5).unwrap();
	tx.fail("boom").unwrap();

	assert_eq!(
		tx.complete(),
		Err(BridgeError::InvalidState {
			op: "complete",
			state: StateKind::Failed
		})
	);
	assert_eq!(
		tx.fail("again"),
		Err(BridgeError::InvalidState {
			op: "fail",
			state: StateKind::Failed
		})
	);

	// The first failure is what the consumer sees.
	assert_eq!(rx.pull().unwrap(), Some(5));
	let err = rx.pull().unwrap_err();
	assert!(err.to_string().contains("boom"), "got {err}");
}

#[test]
fn push_after_fail_is_invalid_state_and_keeps_buffer() {
	let (tx, mut rx) = bridge(BridgeConfig::default());
	tx.push_blocking(1).unwrap();
	tx.fail("boom").unwrap();

	match tx.try_push(2) {
		Err(TryPushError::Rejected(BridgeError::InvalidState { state, .. }, el)) => {
			assert_eq!(state, StateKind::Failed);
			assert_eq!(el, 2);
		}
		other => panic!("expected rejection, got {other:?}"),
	}
	assert_eq!(tx.stats().buffered, 1);
	assert_eq!(rx.pull().unwrap(), Some(1));
}

#[test]
fn consumer_blocks_until_producer_pushes() {
	let (tx, mut rx) = bridge(BridgeConfig::default());
	let producer = thread::spawn(move || {
		thread::sleep(Duration::from_millis(30));
		tx.push_blocking(42).unwrap();
		tx.complete().unwrap();
	});

	assert_eq!(rx.pull().unwrap(), Some(42));
	assert_eq!(rx.pull().unwrap(), None);
	producer.join().unwrap();
}

#[test]
fn concurrent_producer_preserves_order() {
	const N: u32 = 20_000;
	let (tx, rx) = bridge(BridgeConfig::bounded(3));
	let producer = thread::spawn(move || {
		for i in 0..N {
			tx.push_blocking(i).unwrap();
		}
		tx.complete().unwrap();
	});

	let seen: Vec<u32> = rx.map(Result::unwrap).collect();
	producer.join().unwrap();
	assert_eq!(seen, (0..N).collect::<Vec<_>>());
}

#[test]
fn backpressure_try_push_reports_full() {
	let (tx, mut rx) = bridge(BridgeConfig::bounded(2));
	assert_eq!(tx.try_push(1).unwrap(), PushOutcome::Enqueued);
	assert_eq!(tx.try_push(2).unwrap(), PushOutcome::Enqueued);
	assert!(matches!(tx.try_push(3), Err(TryPushError::Full(3))));

	assert_eq!(rx.pull().unwrap(), Some(1));
	assert_eq!(tx.try_push(3).unwrap(), PushOutcome::Enqueued);
	assert_eq!(tx.stats().buffered, 2);
}

#[test]
fn drop_oldest_keeps_latest_window() {
	let config = BridgeConfig::bounded(2).overflow(OverflowPolicy::DropOldest);
	let (tx, rx) = bridge(config);
	assert_eq!(tx.overflow_policy(), OverflowPolicy::DropOldest);
	for i in 1..=5 {
		tx.push_blocking(i).unwrap();
	}
	tx.complete().unwrap();

	assert_eq!(tx.stats().dropped, 3);
	let seen: Vec<_> = rx.map(Result::unwrap).collect();
	assert_eq!(seen, vec![4, 5]);
}

#[test]
fn dropping_consumer_unblocks_waiting_producer() {
	let (tx, rx) = bridge(BridgeConfig::bounded(1));
	tx.push_blocking(1).unwrap();

	let producer = thread::spawn(move || tx.push_blocking(2));
	thread::sleep(Duration::from_millis(20));
	drop(rx);

	assert_eq!(producer.join().unwrap(), Err(BridgeError::ConsumerClosed));
}

#[test]
fn dropping_sender_fails_consumer() {
	let (tx, mut rx) = bridge(BridgeConfig::default());
	tx.push_blocking("kept").unwrap();
	drop(tx);

	assert_eq!(rx.pull().unwrap(), Some("kept"));
	let err = rx.pull().unwrap_err();
	assert!(err.is::<ProducerDropped>(), "got {err}");
}

#[test]
fn pull_timeout_expires_on_open_empty_bridge() {
	let (tx, mut rx) = bridge::<u8>(BridgeConfig::default());
	let timeout = Duration::from_millis(20);
	assert!(matches!(rx.pull_timeout(timeout), Err(PullError::TimedOut(t)) if t == timeout));
	assert!(matches!(rx.try_pull(), Err(PullError::Empty)));

	tx.push_blocking(3).unwrap();
	assert_eq!(rx.pull_timeout(timeout).unwrap(), Some(3));
	tx.fail("boom").unwrap();
	assert!(matches!(rx.try_pull(), Err(PullError::Upstream(_))));
}

#[test]
fn pull_timeout_without_representable_deadline_behaves_like_pull() {
	let (tx, mut rx) = bridge(BridgeConfig::default());
	tx.push_blocking(1u8).unwrap();
	assert_eq!(rx.pull_timeout(Duration::MAX).unwrap(), Some(1));

	let producer = thread::spawn(move || {
		thread::sleep(Duration::from_millis(20));
		tx.push_blocking(2).unwrap();
		tx.complete().unwrap();
	});
	assert_eq!(rx.pull_timeout(Duration::MAX).unwrap(), Some(2));
	assert_eq!(rx.pull_timeout(Duration::MAX).unwrap(), None);
	producer.join().unwrap();
}

#[test]
fn huge_validated_capacity_builds_a_working_bridge() {
	let config = BridgeConfig::from_toml_str("capacity = 9223372036854775807").unwrap();
	assert_eq!(config.capacity, 9_223_372_036_854_775_807);

	let (tx, rx) = bridge::<u64>(config);
	for i in 0..1_000 {
		assert_eq!(tx.try_push(i).unwrap(), PushOutcome::Enqueued);
	}
	tx.complete().unwrap();
	let seen: Vec<_> = rx.map(Result::unwrap).collect();
	assert_eq!(seen, (0..1_000).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_push_waits_for_capacity() {
	let (tx, rx) = bridge(BridgeConfig::bounded(2));
	let consumer = tokio::task::spawn_blocking(move || rx.map(Result::unwrap).collect::<Vec<u32>>());

	for i in 0..100 {
		assert_eq!(tx.push(i).await, Ok(PushOutcome::Enqueued));
		assert!(tx.stats().buffered <= 2);
	}
	tx.complete().unwrap();

	let seen = consumer.await.unwrap();
	assert_eq!(seen, (0..100).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_push_sees_consumer_close() {
	let (tx, rx) = bridge(BridgeConfig::bounded(1));
	tx.push(1).await.unwrap();

	let closer = tokio::task::spawn_blocking(move || {
		thread::sleep(Duration::from_millis(20));
		rx.close();
	});

	let result = tokio::time::timeout(Duration::from_secs(1), tx.push(2)).await.expect("push should wake on close");
	assert_eq!(result, Err(BridgeError::ConsumerClosed));
	assert!(tx.is_consumer_closed());
	tokio::time::timeout(Duration::from_secs(1), tx.cancelled()).await.expect("token cancelled on close");
	closer.await.unwrap();
}
