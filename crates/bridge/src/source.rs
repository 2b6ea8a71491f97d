use std::future;

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use sluice_worker::StreamContext;

use crate::error::BoxError;
use crate::pull::PullHandle;
use crate::sink::BlockingIterSink;

/// A finite, asynchronous sequence of elements that may fail.
///
/// Sources are inert until run with a sink on a [`StreamContext`].
pub struct Source<T> {
	stream: BoxStream<'static, Result<T, BoxError>>,
}

impl Source<i64> {
	/// Integers from `start` to `end`, both inclusive.
	pub fn range(start: i64, end: i64) -> Self {
		Self::from_items(start..=end)
	}
}

impl<T> Source<T>
where
	T: Send + 'static,
{
	pub fn from_items<I>(items: I) -> Self
	where
		I: IntoIterator<Item = T>,
		I::IntoIter: Send + 'static,
	{
		Self::from_stream(stream::iter(items))
	}

	pub fn from_stream<S>(stream: S) -> Self
	where
		S: Stream<Item = T> + Send + 'static,
	{
		Self {
			stream: stream.map(Ok).boxed(),
		}
	}

	/// Wraps a fallible stream. When run, the first `Err` fails the bridge.
	pub fn try_from_stream<S, E>(stream: S) -> Self
	where
		S: Stream<Item = Result<T, E>> + Send + 'static,
		E: Into<BoxError>,
	{
		Self {
			stream: stream.map(|item| item.map_err(Into::into)).boxed(),
		}
	}

	pub fn single(el: T) -> Self {
		Self::from_stream(stream::once(future::ready(el)))
	}

	pub fn empty() -> Self {
		Self::from_stream(stream::empty())
	}

	/// A source that fails immediately without emitting.
	pub fn failed(error: impl Into<BoxError>) -> Self {
		let error: BoxError = error.into();
		Self {
			stream: stream::once(future::ready(Err(error))).boxed(),
		}
	}

	/// Keeps elements matching `pred`. Errors pass through.
	pub fn filter<F>(self, mut pred: F) -> Self
	where
		F: FnMut(&T) -> bool + Send + 'static,
	{
		Self {
			stream: self
				.stream
				.filter(move |item| {
					future::ready(match item {
						Ok(el) => pred(el),
						Err(_) => true,
					})
				})
				.boxed(),
		}
	}

	pub fn map<U, F>(self, mut f: F) -> Source<U>
	where
		U: Send + 'static,
		F: FnMut(T) -> U + Send + 'static,
	{
		Source {
			stream: self.stream.map(move |item| item.map(&mut f)).boxed(),
		}
	}

	pub fn take(self, n: usize) -> Self {
		Self {
			stream: self.stream.take(n).boxed(),
		}
	}

	/// Emits all of `self`, then all of `other`. A failure in `self` ends
	/// the combined source.
	pub fn concat(self, other: Source<T>) -> Self {
		let mut failed = false;
		Self {
			stream: self
				.stream
				.chain(other.stream)
				.take_while(move |item| {
					let keep = !failed;
					failed |= item.is_err();
					future::ready(keep)
				})
				.boxed(),
		}
	}

	/// Materializes the source into the sink's value, driving it on `ctx`.
	pub fn run_with(self, sink: BlockingIterSink, ctx: &StreamContext) -> PullHandle<T> {
		sink.attach(self, ctx)
	}

	pub(crate) fn into_stream(self) -> BoxStream<'static, Result<T, BoxError>> {
		self.stream
	}
}
