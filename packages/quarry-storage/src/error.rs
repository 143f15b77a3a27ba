#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Invalid configuration: {0}")]
	Configuration(String),
}
impl Error {
	/// The store could not be reached or the connection broke, as opposed to the server
	/// rejecting a statement.
	pub fn is_connectivity(&self) -> bool {
		matches!(
			self,
			Self::Sqlx(
				sqlx::Error::Io(_)
					| sqlx::Error::Tls(_)
					| sqlx::Error::PoolTimedOut
					| sqlx::Error::PoolClosed
					| sqlx::Error::WorkerCrashed
			)
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pool_and_io_failures_are_connectivity() {
		assert!(Error::Sqlx(sqlx::Error::PoolTimedOut).is_connectivity());
		assert!(Error::Sqlx(sqlx::Error::Io(std::io::ErrorKind::ConnectionRefused.into())).is_connectivity());
		assert!(!Error::Sqlx(sqlx::Error::RowNotFound).is_connectivity());
		assert!(!Error::InvalidArgument("bad".to_string()).is_connectivity());
	}
}
