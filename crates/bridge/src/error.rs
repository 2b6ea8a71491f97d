//! Error types for both sides of a bridge.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Boxed error accepted from producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse bridge state, used in error reports and stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
	/// No terminal signal yet; pushes are accepted.
	Open,
	/// The producer called `complete`.
	Completed,
	/// The producer called `fail`, or went away without a terminal signal.
	Failed,
}

impl fmt::Display for StateKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Open => "open",
			Self::Completed => "completed",
			Self::Failed => "failed",
		})
	}
}

/// Producer-side error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
	/// `push`, `complete`, or `fail` was called after a terminal transition.
	#[error("cannot {op} on a bridge that is already {state}")]
	InvalidState { op: &'static str, state: StateKind },
	/// The consumer released its pull handle.
	#[error("consumer closed the pull handle")]
	ConsumerClosed,
}

/// Non-blocking push error. Hands the element back to the caller.
#[derive(Debug)]
pub enum TryPushError<T> {
	/// Buffer is at capacity under the backpressure policy.
	Full(T),
	/// The bridge refused the element.
	Rejected(BridgeError, T),
}

impl<T> TryPushError<T> {
	/// Recovers the element that was not pushed.
	pub fn into_inner(self) -> T {
		match self {
			Self::Full(el) | Self::Rejected(_, el) => el,
		}
	}
}

impl<T> fmt::Display for TryPushError<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Full(_) => f.write_str("bridge buffer is full"),
			Self::Rejected(err, _) => err.fmt(f),
		}
	}
}

impl<T: fmt::Debug> std::error::Error for TryPushError<T> {}

/// Failure signalled by the producer, surfaced to the consumer after all
/// buffered elements.
#[derive(Debug, Clone, Error)]
#[error("upstream failed: {cause}")]
pub struct UpstreamFailure {
	cause: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl UpstreamFailure {
	/// Wraps a producer-side cause.
	pub fn new(cause: impl Into<BoxError>) -> Self {
		Self {
			cause: Arc::from(cause.into()),
		}
	}

	/// Returns the cause, for inspection or downcasting.
	pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
		&*self.cause
	}

	/// Returns true if the cause is of type `E`.
	pub fn is<E: std::error::Error + 'static>(&self) -> bool {
		self.cause.downcast_ref::<E>().is_some()
	}
}

/// The producer was dropped while the bridge was still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("producer dropped before signalling completion")]
pub struct ProducerDropped;

/// The stage feeding the bridge was cancelled by its execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stream stage cancelled by context shutdown")]
pub struct StageCancelled;

/// Consumer-side error for timed and non-blocking pulls.
#[derive(Debug, Clone, Error)]
pub enum PullError {
	/// The bridge failed and its buffer is drained.
	#[error(transparent)]
	Upstream(#[from] UpstreamFailure),
	/// The bridge stayed open and empty for the whole timeout.
	#[error("no element arrived within {0:?}")]
	TimedOut(Duration),
	/// Nothing buffered right now; the bridge is still open.
	#[error("no element buffered")]
	Empty,
}

/// Errors loading a [`BridgeConfig`](crate::BridgeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
	/// TOML syntax error or unknown key.
	#[error("failed to parse bridge config: {0}")]
	Parse(#[from] toml::de::Error),
	/// Parsed, but a value is out of range.
	#[error("invalid bridge config: {0}")]
	Invalid(&'static str),
}
