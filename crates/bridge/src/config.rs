use serde::Deserialize;

use crate::error::ConfigError;

pub(crate) const DEFAULT_CAPACITY: usize = 16;

/// What a push does when the buffer is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
	/// Suspend the producer until the consumer frees a slot.
	#[default]
	Backpressure,
	/// Discard the incoming element.
	DropNewest,
	/// Evict the oldest buffered element to make room.
	DropOldest,
}

/// Buffer sizing and overflow behavior for one bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
	/// Maximum number of buffered elements. Must be non-zero.
	pub capacity: usize,
	/// What a push does when the buffer holds `capacity` elements.
	pub overflow: OverflowPolicy,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			capacity: DEFAULT_CAPACITY,
			overflow: OverflowPolicy::Backpressure,
		}
	}
}

impl BridgeConfig {
	/// Backpressured bridge with the given capacity.
	pub fn bounded(capacity: usize) -> Self {
		Self {
			capacity,
			..Self::default()
		}
	}

	pub fn capacity(mut self, capacity: usize) -> Self {
		self.capacity = capacity;
		self
	}

	pub fn overflow(mut self, overflow: OverflowPolicy) -> Self {
		self.overflow = overflow;
		self
	}

	/// Parses and validates a config from TOML. Missing keys take defaults.
	pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(src)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.capacity == 0 {
			return Err(ConfigError::Invalid("capacity must be > 0"));
		}
		Ok(())
	}
}
