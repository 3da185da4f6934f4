/// Execution classes used for scheduling and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Reaction to an edit in an open document; should start quickly.
	Interactive,
	/// Sweeps over many files (analyze-all, linked files) that may lag behind edits.
	Background,
	/// Long-lived supervision loops such as the engine restart loop.
	Supervisor,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::Supervisor => "supervisor",
		}
	}
}
