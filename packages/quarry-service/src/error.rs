pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider unavailable: {message}")]
	ProviderUnavailable { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Index build failed while {stage}: {source}")]
	IndexBuildFailure {
		stage: &'static str,
		#[source]
		source: Box<Error>,
	},
	#[error("SQL execution failed: {message}")]
	ExecutionFailure { sql: String, message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// The SQL text the failure relates to, when there is one.
	pub fn sql(&self) -> Option<&str> {
		match self {
			Self::ExecutionFailure { sql, .. } => Some(sql),
			_ => None,
		}
	}
}

impl From<quarry_storage::Error> for Error {
	fn from(err: quarry_storage::Error) -> Self {
		match err {
			quarry_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			quarry_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			quarry_storage::Error::Configuration(message) => Self::Configuration { message },
		}
	}
}

impl From<quarry_providers::Error> for Error {
	fn from(err: quarry_providers::Error) -> Self {
		use quarry_providers::Error as ProviderError;

		match err {
			ProviderError::Configuration { message } => Self::Configuration { message },
			ProviderError::InvalidHeaderName(_) | ProviderError::InvalidHeaderValue(_) =>
				Self::Configuration { message: err.to_string() },
			ProviderError::InvalidInput { message } => Self::InvalidRequest { message },
			ProviderError::Unavailable { .. } =>
				Self::ProviderUnavailable { message: err.to_string() },
			ProviderError::Reqwest(_)
			| ProviderError::SerdeJson(_)
			| ProviderError::InvalidResponse { .. }
			| ProviderError::Status { .. } => Self::Provider { message: err.to_string() },
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn provider_errors_map_into_the_service_taxonomy() {
		let err: Error =
			quarry_providers::Error::Configuration { message: "rejected key".to_string() }.into();

		assert!(matches!(err, Error::Configuration { .. }));

		let err: Error = quarry_providers::Error::Unavailable {
			operation: "embedding",
			attempts: 3,
			last_error: "timeout".to_string(),
		}
		.into();

		assert!(matches!(err, Error::ProviderUnavailable { .. }));

		let err: Error =
			quarry_providers::Error::InvalidInput { message: "empty".to_string() }.into();

		assert!(matches!(err, Error::InvalidRequest { .. }));
	}
}
