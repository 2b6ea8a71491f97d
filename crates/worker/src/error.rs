use thiserror::Error;

/// Errors raised while configuring or starting a [`StreamContext`](crate::StreamContext).
#[derive(Debug, Error)]
pub enum ContextError {
	/// The tokio runtime backing the context could not be built.
	#[error("failed to build runtime for context '{name}': {source}")]
	Runtime {
		/// Context name from its config.
		name: String,
		/// Underlying I/O error reported by the runtime builder.
		source: std::io::Error,
	},

	/// A config value is out of range.
	#[error("invalid context config: {0}")]
	Invalid(String),

	/// The TOML document could not be deserialized.
	#[error("failed to parse context config: {0}")]
	Parse(#[from] toml::de::Error),
}
