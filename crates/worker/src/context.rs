use std::future::Future;
use std::time::Duration;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::{ContextConfig, ContextError, TaskClass};

/// Outcome of [`StreamContext::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
	/// True if every tracked task finished within the grace period.
	pub completed: bool,
	/// Tracked tasks still running when the grace period ended.
	pub pending: usize,
}

/// Scoped execution context driving async stream stages.
///
/// Owns its runtime; tasks spawned through it are tracked so shutdown can
/// wait for them. Every bridge materialized on the context derives its
/// cancellation token from [`Self::child_token`], so shutdown reaches all of
/// them.
#[derive(Debug)]
pub struct StreamContext {
	name: String,
	runtime: Runtime,
	tracker: TaskTracker,
	cancel: CancellationToken,
	shutdown_grace: Duration,
}

impl StreamContext {
	/// Builds a context from a validated config.
	pub fn new(config: ContextConfig) -> Result<Self, ContextError> {
		config.validate()?;
		let runtime = tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(config.worker_threads)
			.thread_name(format!("{}-worker", config.name))
			.build()
			.map_err(|source| ContextError::Runtime {
				name: config.name.clone(),
				source,
			})?;
		tracing::debug!(context = %config.name, worker_threads = config.worker_threads, "context.start");

		Ok(Self {
			shutdown_grace: config.grace(),
			name: config.name,
			runtime,
			tracker: TaskTracker::new(),
			cancel: CancellationToken::new(),
		})
	}

	/// Returns the context name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns a handle to the owned runtime.
	pub fn handle(&self) -> Handle {
		self.runtime.handle().clone()
	}

	/// Returns a token cancelled when the context shuts down.
	pub fn child_token(&self) -> CancellationToken {
		self.cancel.child_token()
	}

	/// Returns true once shutdown has begun.
	pub fn is_shutting_down(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Number of tracked tasks that have not finished.
	pub fn pending(&self) -> usize {
		self.tracker.len()
	}

	/// Spawns a tracked async task.
	pub fn spawn<F>(&self, class: TaskClass, fut: F) -> JoinHandle<F::Output>
	where
		F: Future + Send + 'static,
		F::Output: Send + 'static,
	{
		tracing::trace!(context = %self.name, worker_class = class.as_str(), pending = self.tracker.len(), "context.spawn");
		self.runtime.spawn(self.tracker.track_future(fut))
	}

	/// Spawns tracked blocking work on the runtime's blocking pool.
	pub fn spawn_blocking<F, R>(&self, class: TaskClass, f: F) -> JoinHandle<R>
	where
		F: FnOnce() -> R + Send + 'static,
		R: Send + 'static,
	{
		tracing::trace!(context = %self.name, worker_class = class.as_str(), "context.spawn_blocking");
		let token = self.tracker.token();
		self.runtime.spawn_blocking(move || {
			let _token = token;
			f()
		})
	}

	/// Cancels all derived tokens, waits for tracked tasks up to the grace
	/// period, then tears the runtime down.
	///
	/// # Panics
	///
	/// Panics if called from within an async execution context.
	pub fn shutdown(self) -> ShutdownReport {
		let Self {
			name,
			runtime,
			tracker,
			cancel,
			shutdown_grace,
		} = self;

		cancel.cancel();
		tracker.close();
		let waiter = tracker.clone();
		let completed = runtime.block_on(async move { tokio::time::timeout(shutdown_grace, waiter.wait()).await.is_ok() });
		let pending = tracker.len();
		if completed {
			tracing::debug!(context = %name, "context.shutdown");
		} else {
			tracing::warn!(context = %name, pending, grace_ms = shutdown_grace.as_millis() as u64, "context.shutdown.timeout");
		}
		runtime.shutdown_timeout(shutdown_grace);

		ShutdownReport { completed, pending }
	}
}
