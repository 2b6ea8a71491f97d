use std::time::Duration;

use serde::Deserialize;

use crate::ContextError;

const DEFAULT_NAME: &str = "sluice";
const DEFAULT_WORKER_THREADS: usize = 2;
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 1_000;

/// Construction parameters for a [`StreamContext`](crate::StreamContext).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
	/// Name used for runtime thread names and log fields.
	pub name: String,
	/// Number of runtime worker threads.
	pub worker_threads: usize,
	/// How long shutdown waits for tracked tasks before tearing down.
	pub shutdown_grace_ms: u64,
}

impl Default for ContextConfig {
	fn default() -> Self {
		Self {
			name: DEFAULT_NAME.to_string(),
			worker_threads: DEFAULT_WORKER_THREADS,
			shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
		}
	}
}

impl ContextConfig {
	/// Creates a default config with the given name.
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// Sets the worker thread count.
	pub fn worker_threads(mut self, worker_threads: usize) -> Self {
		self.worker_threads = worker_threads;
		self
	}

	/// Sets the shutdown grace period.
	pub fn shutdown_grace(mut self, grace: Duration) -> Self {
		self.shutdown_grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
		self
	}

	/// Returns the shutdown grace period.
	pub fn grace(&self) -> Duration {
		Duration::from_millis(self.shutdown_grace_ms)
	}

	/// Parses and validates a config from TOML. Missing keys take defaults.
	pub fn from_toml_str(src: &str) -> Result<Self, ContextError> {
		let config: Self = toml::from_str(src)?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects values the runtime builder cannot honor.
	pub fn validate(&self) -> Result<(), ContextError> {
		if self.worker_threads == 0 {
			return Err(ContextError::Invalid("worker_threads must be > 0".to_string()));
		}
		if self.name.is_empty() {
			return Err(ContextError::Invalid("name must not be empty".to_string()));
		}
		Ok(())
	}
}
