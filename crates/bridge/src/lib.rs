//! Push-to-pull bridge for sluice streams.
//!
//! A bridge connects a producer that pushes elements at its own pace (usually
//! an async task) to a consumer that pulls them through a blocking call:
//! * [`BridgeSender`]: `push` / `complete` / `fail`, with backpressure
//! * [`PullHandle`]: blocking `pull` and a fused [`Iterator`]
//! * [`Source`] + [`as_blocking_iter`]: run an async source on a
//!   [`StreamContext`](sluice_worker::StreamContext) and read it synchronously
//!
//! Elements arrive in push order. A failure is delivered after every element
//! buffered before it, and the first of `complete`/`fail` is the only
//! terminal transition.
//!
//! ```
//! use sluice_bridge::{Source, as_blocking_iter};
//! use sluice_worker::{ContextConfig, StreamContext};
//!
//! let ctx = StreamContext::new(ContextConfig::named("converters")).unwrap();
//!
//! let evens = Source::range(0, 9).filter(|i| i % 2 == 0);
//! let handle = evens.run_with(as_blocking_iter(), &ctx);
//! assert_eq!(handle.count(), 5);
//!
//! assert!(ctx.shutdown().completed);
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

mod config;
mod error;
mod pull;
mod sender;
mod sink;
mod source;
mod state;

pub use config::{BridgeConfig, OverflowPolicy};
pub use error::{BoxError, BridgeError, ConfigError, ProducerDropped, PullError, StageCancelled, StateKind, TryPushError, UpstreamFailure};
pub use pull::PullHandle;
pub use sender::BridgeSender;
pub use sink::{BlockingIterSink, as_blocking_iter, as_blocking_iter_with};
pub use source::Source;
pub use state::{BridgeStats, PushOutcome};

/// Creates a standalone bridge.
///
/// # Panics
///
/// Panics if `config.capacity` is zero.
pub fn bridge<T>(config: BridgeConfig) -> (BridgeSender<T>, PullHandle<T>) {
	bridge_with_token(config, CancellationToken::new())
}

pub(crate) fn bridge_with_token<T>(config: BridgeConfig, cancel: CancellationToken) -> (BridgeSender<T>, PullHandle<T>) {
	assert!(config.capacity > 0, "bridge capacity must be > 0");
	let shared = Arc::new(state::Shared::new(config, cancel));
	(
		BridgeSender {
			shared: Arc::clone(&shared),
		},
		PullHandle::new(shared),
	)
}
