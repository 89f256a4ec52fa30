pub trait ResultExt<T, E> {
	/// Logs the error as a warning about `what` and discards it.
	fn ok_or_warn(self, what: &str) -> Option<T>
	where
		E: std::fmt::Display;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
	fn ok_or_warn(self, what: &str) -> Option<T>
	where
		E: std::fmt::Display,
	{
		self
			.inspect_err(|err| tracing::warn!(error = %err, "{what}"))
			.ok()
	}
}
