use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	Configuration { message: String },
	#[error("{message}")]
	InvalidInput { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Provider returned HTTP {status}: {body}")]
	Status { status: reqwest::StatusCode, body: String },
	#[error("{operation} provider unavailable after {attempts} attempts: {last_error}")]
	Unavailable { operation: &'static str, attempts: u32, last_error: String },
}
impl Error {
	/// Transport and response failures are transient, as are server errors, timeouts and
	/// rate limits. Everything else is a caller or configuration problem that another
	/// attempt cannot fix.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Reqwest(_) | Self::SerdeJson(_) | Self::InvalidResponse { .. } => true,
			Self::Status { status, .. } =>
				status.is_server_error()
					|| *status == StatusCode::REQUEST_TIMEOUT
					|| *status == StatusCode::TOO_MANY_REQUESTS,
			_ => false,
		}
	}
}
