use std::sync::Arc;

use crate::config::OverflowPolicy;
use crate::error::{BoxError, BridgeError, ProducerDropped, TryPushError, UpstreamFailure};
use crate::state::{BridgeStats, Completion, Offer, PushOutcome, Shared};

/// Producer side of a bridge.
///
/// Not `Clone`: a bridge has exactly one producer. Dropping the sender while
/// the bridge is still open fails it with [`ProducerDropped`].
pub struct BridgeSender<T> {
	pub(crate) shared: Arc<Shared<T>>,
}

impl<T> BridgeSender<T> {
	/// Pushes one element, waiting for capacity under backpressure.
	///
	/// Cancel-safe: if the future is dropped while waiting, the element is
	/// dropped with it and nothing is enqueued.
	pub async fn push(&self, el: T) -> Result<PushOutcome, BridgeError> {
		let mut el = el;
		loop {
			// Register before offering so a pop between unlock and await is not lost.
			let notified = self.shared.space_async.notified();
			tokio::pin!(notified);
			notified.as_mut().enable();

			match self.offer(el) {
				Offer::Accepted(outcome) => return Ok(outcome),
				Offer::Rejected(err, _) => return Err(err),
				Offer::Full(back) => el = back,
			}
			tracing::trace!(capacity = self.shared.config.capacity, "bridge.push.wait");
			notified.await;
		}
	}

	/// Pushes one element from a plain thread, blocking for capacity.
	pub fn push_blocking(&self, el: T) -> Result<PushOutcome, BridgeError> {
		let mut state = self.shared.state.lock();
		let mut el = el;
		loop {
			match state.offer(el, self.shared.config.capacity, self.shared.config.overflow) {
				Offer::Accepted(outcome) => {
					drop(state);
					self.shared.available.notify_one();
					return Ok(outcome);
				}
				Offer::Rejected(err, _) => return Err(err),
				Offer::Full(back) => el = back,
			}
			self.shared.space.wait(&mut state);
		}
	}

	/// Pushes without waiting. A full backpressured buffer returns the element.
	pub fn try_push(&self, el: T) -> Result<PushOutcome, TryPushError<T>> {
		match self.offer(el) {
			Offer::Accepted(outcome) => Ok(outcome),
			Offer::Full(el) => Err(TryPushError::Full(el)),
			Offer::Rejected(err, el) => Err(TryPushError::Rejected(err, el)),
		}
	}

	/// Signals that no more elements follow.
	pub fn complete(&self) -> Result<(), BridgeError> {
		self.terminate("complete", Completion::Completed)
	}

	/// Signals abnormal termination. The consumer sees `error` after draining
	/// what is already buffered.
	pub fn fail(&self, error: impl Into<BoxError>) -> Result<(), BridgeError> {
		self.terminate("fail", Completion::Failed(UpstreamFailure::new(error)))
	}

	/// Returns true once the consumer has released its handle.
	pub fn is_consumer_closed(&self) -> bool {
		self.shared.state.lock().is_consumer_closed()
	}

	/// Resolves when the consumer closes or the owning context shuts down.
	pub async fn cancelled(&self) {
		self.shared.cancel.cancelled().await;
	}

	pub fn stats(&self) -> BridgeStats {
		self.shared.state.lock().stats()
	}

	pub fn overflow_policy(&self) -> OverflowPolicy {
		self.shared.config.overflow
	}

	fn offer(&self, el: T) -> Offer<T> {
		let offer = self.shared.state.lock().offer(el, self.shared.config.capacity, self.shared.config.overflow);
		if let Offer::Accepted(outcome) = &offer {
			tracing::trace!(?outcome, "bridge.push");
			self.shared.available.notify_one();
		}
		offer
	}

	fn terminate(&self, op: &'static str, completion: Completion) -> Result<(), BridgeError> {
		let buffered = {
			let mut state = self.shared.state.lock();
			state.terminate(op, completion)?;
			state.len()
		};
		tracing::debug!(op, buffered, "bridge.terminate");
		self.shared.available.notify_one();
		Ok(())
	}
}

impl<T> Drop for BridgeSender<T> {
	fn drop(&mut self) {
		let consumer_closed = {
			let mut state = self.shared.state.lock();
			if !matches!(state.completion(), Completion::Open) {
				return;
			}
			let _ = state.terminate("drop", Completion::Failed(UpstreamFailure::new(ProducerDropped)));
			state.is_consumer_closed()
		};
		if !consumer_closed {
			tracing::warn!("bridge.sender.dropped_open");
		}
		self.shared.available.notify_one();
	}
}
