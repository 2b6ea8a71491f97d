//! Shared state behind one bridge.
//!
//! All mutations happen under [`Shared::state`]; the guard is never held
//! across an `.await`.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::config::{BridgeConfig, DEFAULT_CAPACITY, OverflowPolicy};
use crate::error::{BridgeError, StateKind, UpstreamFailure};

/// Completion flag. Leaves `Open` at most once.
#[derive(Debug, Clone)]
pub(crate) enum Completion {
	Open,
	Completed,
	Failed(UpstreamFailure),
}

impl Completion {
	pub(crate) fn kind(&self) -> StateKind {
		match self {
			Self::Open => StateKind::Open,
			Self::Completed => StateKind::Completed,
			Self::Failed(_) => StateKind::Failed,
		}
	}
}

/// Outcome of an accepted push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
	/// Element was appended to the buffer.
	Enqueued,
	/// Buffer was full under `DropNewest`; the element was discarded.
	DroppedNewest,
	/// Buffer was full under `DropOldest`; the head was evicted.
	ReplacedOldest,
}

/// Point-in-time counters for one bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStats {
	pub state: StateKind,
	pub buffered: usize,
	pub pushed: u64,
	pub delivered: u64,
	pub dropped: u64,
	pub consumer_closed: bool,
}

pub(crate) enum Offer<T> {
	Accepted(PushOutcome),
	/// Backpressured buffer is full; the caller keeps the element.
	Full(T),
	Rejected(BridgeError, T),
}

pub(crate) struct BridgeState<T> {
	queue: VecDeque<T>,
	completion: Completion,
	consumer_closed: bool,
	pushed: u64,
	delivered: u64,
	dropped: u64,
}

impl<T> BridgeState<T> {
	pub(crate) fn new(capacity: usize) -> Self {
		Self {
			// `offer` enforces the bound; the allocation is only a hint.
			queue: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
			completion: Completion::Open,
			consumer_closed: false,
			pushed: 0,
			delivered: 0,
			dropped: 0,
		}
	}

	pub(crate) fn completion(&self) -> &Completion {
		&self.completion
	}

	pub(crate) fn is_consumer_closed(&self) -> bool {
		self.consumer_closed
	}

	pub(crate) fn len(&self) -> usize {
		self.queue.len()
	}

	fn check_open(&self, op: &'static str) -> Result<(), BridgeError> {
		match self.completion {
			Completion::Open if self.consumer_closed => Err(BridgeError::ConsumerClosed),
			Completion::Open => Ok(()),
			ref done => Err(BridgeError::InvalidState { op, state: done.kind() }),
		}
	}

	/// Offers one element under the overflow policy.
	///
	/// Under `Backpressure` a full buffer hands the element back so the
	/// caller can wait for capacity and retry.
	pub(crate) fn offer(&mut self, el: T, capacity: usize, policy: OverflowPolicy) -> Offer<T> {
		if let Err(err) = self.check_open("push") {
			return Offer::Rejected(err, el);
		}

		if self.queue.len() < capacity {
			self.queue.push_back(el);
			self.pushed += 1;
			return Offer::Accepted(PushOutcome::Enqueued);
		}

		match policy {
			OverflowPolicy::Backpressure => Offer::Full(el),
			OverflowPolicy::DropNewest => {
				self.dropped += 1;
				Offer::Accepted(PushOutcome::DroppedNewest)
			}
			OverflowPolicy::DropOldest => {
				let _ = self.queue.pop_front();
				self.queue.push_back(el);
				self.pushed += 1;
				self.dropped += 1;
				Offer::Accepted(PushOutcome::ReplacedOldest)
			}
		}
	}

	/// Performs the single terminal transition.
	///
	/// Allowed after the consumer closed so a producer can still finish
	/// cleanly.
	pub(crate) fn terminate(&mut self, op: &'static str, completion: Completion) -> Result<(), BridgeError> {
		if !matches!(self.completion, Completion::Open) {
			return Err(BridgeError::InvalidState {
				op,
				state: self.completion.kind(),
			});
		}
		self.completion = completion;
		Ok(())
	}

	pub(crate) fn take(&mut self) -> Option<T> {
		let el = self.queue.pop_front()?;
		self.delivered += 1;
		Some(el)
	}

	/// Marks the consumer gone and discards anything it will never read.
	pub(crate) fn close_consumer(&mut self) -> usize {
		self.consumer_closed = true;
		let discarded = self.queue.len();
		self.queue.clear();
		discarded
	}

	pub(crate) fn stats(&self) -> BridgeStats {
		BridgeStats {
			state: self.completion.kind(),
			buffered: self.queue.len(),
			pushed: self.pushed,
			delivered: self.delivered,
			dropped: self.dropped,
			consumer_closed: self.consumer_closed,
		}
	}
}

/// State and wake-ups shared by the single producer and single consumer.
pub(crate) struct Shared<T> {
	pub(crate) config: BridgeConfig,
	pub(crate) state: Mutex<BridgeState<T>>,
	/// Consumer waits here for data or a terminal signal.
	pub(crate) available: Condvar,
	/// Blocking producers wait here for capacity.
	pub(crate) space: Condvar,
	/// Async producers wait here for capacity.
	pub(crate) space_async: Notify,
	pub(crate) cancel: CancellationToken,
}

impl<T> Shared<T> {
	pub(crate) fn new(config: BridgeConfig, cancel: CancellationToken) -> Self {
		Self {
			state: Mutex::new(BridgeState::new(config.capacity)),
			config,
			available: Condvar::new(),
			space: Condvar::new(),
			space_async: Notify::new(),
			cancel,
		}
	}

	pub(crate) fn notify_space(&self) {
		self.space.notify_one();
		self.space_async.notify_one();
	}
}
