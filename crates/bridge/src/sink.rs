use futures::StreamExt;
use sluice_worker::{StreamContext, TaskClass};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, StageCancelled};
use crate::pull::PullHandle;
use crate::sender::BridgeSender;
use crate::source::Source;

/// Sink that materializes a source as a blocking [`PullHandle`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingIterSink {
	config: BridgeConfig,
}

/// Sink with the default bridge config.
pub fn as_blocking_iter() -> BlockingIterSink {
	BlockingIterSink::default()
}

/// Sink with an explicit bridge config.
pub fn as_blocking_iter_with(config: BridgeConfig) -> BlockingIterSink {
	BlockingIterSink { config }
}

impl BlockingIterSink {
	pub fn config(&self) -> BridgeConfig {
		self.config
	}

	pub(crate) fn attach<T>(self, source: Source<T>, ctx: &StreamContext) -> PullHandle<T>
	where
		T: Send + 'static,
	{
		let (tx, rx) = crate::bridge_with_token(self.config, ctx.child_token());
		ctx.spawn(TaskClass::Pump, pump(source, tx));
		rx
	}
}

enum Step<T> {
	Next(Option<Result<T, crate::BoxError>>),
	Cancelled,
}

/// Moves elements from `source` into `tx` until the source ends, fails, the
/// consumer closes, or the context shuts down.
async fn pump<T>(source: Source<T>, tx: BridgeSender<T>)
where
	T: Send + 'static,
{
	let mut stream = source.into_stream();
	loop {
		let step = tokio::select! {
			biased;
			_ = tx.cancelled() => Step::Cancelled,
			item = stream.next() => Step::Next(item),
		};

		let el = match step {
			Step::Cancelled => break,
			Step::Next(None) => {
				match tx.complete() {
					Ok(()) => tracing::trace!("bridge.pump.complete"),
					Err(err) => tracing::debug!(error = %err, "bridge.pump.complete_rejected"),
				}
				return;
			}
			Step::Next(Some(Err(err))) => {
				tracing::debug!(error = %err, "bridge.pump.upstream_failed");
				if let Err(rejected) = tx.fail(err) {
					tracing::debug!(error = %rejected, "bridge.pump.fail_rejected");
				}
				return;
			}
			Step::Next(Some(Ok(el))) => el,
		};

		let pushed = tokio::select! {
			biased;
			_ = tx.cancelled() => break,
			result = tx.push(el) => result,
		};
		match pushed {
			Ok(_) => {}
			Err(BridgeError::ConsumerClosed) => break,
			Err(err) => {
				tracing::warn!(error = %err, "bridge.pump.push_rejected");
				return;
			}
		}
	}

	if tx.is_consumer_closed() {
		tracing::trace!("bridge.pump.consumer_closed");
	} else {
		tracing::debug!("bridge.pump.cancelled");
		if let Err(err) = tx.fail(StageCancelled) {
			tracing::debug!(error = %err, "bridge.pump.fail_rejected");
		}
	}
}
