/// Execution classes used to label context tasks for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Async stream stage work (sources, combinators).
	Stage,
	/// Forwarding task moving elements from a source into a bridge.
	Pump,
	/// Blocking work executed on the runtime's blocking pool.
	Blocking,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Stage => "stage",
			Self::Pump => "pump",
			Self::Blocking => "blocking",
		}
	}
}
