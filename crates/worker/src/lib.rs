//! Explicit execution context for sluice stream stages.
//!
//! A [`StreamContext`] owns a multi-thread tokio runtime, a task tracker, and
//! a root cancellation token. It is created before any stream is run and torn
//! down with [`StreamContext::shutdown`]; there is no process-wide fallback.

mod class;
mod config;
mod context;
mod error;

pub use class::TaskClass;
pub use config::ContextConfig;
pub use context::{ShutdownReport, StreamContext};
pub use error::ContextError;
