use std::iter::FusedIterator;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{PullError, UpstreamFailure};
use crate::state::{BridgeStats, Completion, Shared};

/// Consumer side of a bridge: a blocking, pull-based view of the pushed
/// sequence.
///
/// Calls block the current thread. Do not pull from a runtime worker that
/// the producer also depends on.
///
/// Dropping the handle (or calling [`Self::close`]) discards buffered
/// elements, cancels the bridge token, and makes further pushes fail with
/// [`BridgeError::ConsumerClosed`](crate::BridgeError::ConsumerClosed).
pub struct PullHandle<T> {
	shared: Arc<Shared<T>>,
	failure_yielded: bool,
}

impl<T> PullHandle<T> {
	pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
		Self {
			shared,
			failure_yielded: false,
		}
	}

	/// Returns the next element, blocking while the bridge is open and empty.
	///
	/// `Ok(None)` once completed and drained. Once failed and drained, every
	/// call returns the same failure.
	pub fn pull(&mut self) -> Result<Option<T>, UpstreamFailure> {
		let mut state = self.shared.state.lock();
		loop {
			if let Some(el) = state.take() {
				drop(state);
				self.shared.notify_space();
				return Ok(Some(el));
			}
			match state.completion() {
				Completion::Completed => return Ok(None),
				Completion::Failed(failure) => return Err(failure.clone()),
				Completion::Open => self.shared.available.wait(&mut state),
			}
		}
	}

	/// Like [`Self::pull`], but gives up after `timeout`.
	pub fn pull_timeout(&mut self, timeout: Duration) -> Result<Option<T>, PullError> {
		// `None` means the deadline is unrepresentable; wait like `pull`.
		let deadline = Instant::now().checked_add(timeout);
		let mut state = self.shared.state.lock();
		loop {
			if let Some(el) = state.take() {
				drop(state);
				self.shared.notify_space();
				return Ok(Some(el));
			}
			match state.completion() {
				Completion::Completed => return Ok(None),
				Completion::Failed(failure) => return Err(PullError::Upstream(failure.clone())),
				Completion::Open => match deadline {
					Some(deadline) => {
						if self.shared.available.wait_until(&mut state, deadline).timed_out() {
							// A signal may have raced the deadline.
							if state.len() == 0 && matches!(state.completion(), Completion::Open) {
								return Err(PullError::TimedOut(timeout));
							}
						}
					}
					None => self.shared.available.wait(&mut state),
				},
			}
		}
	}

	/// Returns the next element without blocking.
	pub fn try_pull(&mut self) -> Result<Option<T>, PullError> {
		let mut state = self.shared.state.lock();
		if let Some(el) = state.take() {
			drop(state);
			self.shared.notify_space();
			return Ok(Some(el));
		}
		match state.completion() {
			Completion::Completed => Ok(None),
			Completion::Failed(failure) => Err(PullError::Upstream(failure.clone())),
			Completion::Open => Err(PullError::Empty),
		}
	}

	pub fn stats(&self) -> BridgeStats {
		self.shared.state.lock().stats()
	}

	/// Releases the handle. Equivalent to dropping it.
	pub fn close(self) {
		drop(self);
	}
}

impl<T> Iterator for PullHandle<T> {
	type Item = Result<T, UpstreamFailure>;

	/// Yields elements in push order, then ends. A failure is yielded once,
	/// after which the iterator is exhausted.
	fn next(&mut self) -> Option<Self::Item> {
		if self.failure_yielded {
			return None;
		}
		match self.pull() {
			Ok(Some(el)) => Some(Ok(el)),
			Ok(None) => None,
			Err(failure) => {
				self.failure_yielded = true;
				Some(Err(failure))
			}
		}
	}
}

impl<T> FusedIterator for PullHandle<T> {}

impl<T> Drop for PullHandle<T> {
	fn drop(&mut self) {
		let (discarded, state) = {
			let mut state = self.shared.state.lock();
			(state.close_consumer(), state.completion().kind())
		};
		tracing::debug!(discarded, %state, "bridge.consumer.close");
		self.shared.cancel.cancel();
		self.shared.space.notify_all();
		self.shared.space_async.notify_one();
	}
}
