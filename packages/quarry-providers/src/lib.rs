pub mod embedding;
pub mod generation;
pub mod retry;

mod error;

pub use error::{Error, Result};

use reqwest::{
	Response, StatusCode,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: Option<&str>, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
		return Err(Error::Configuration {
			message: "Provider api_key is not configured. Set OPENAI_API_KEY or providers.*.api_key."
				.to_string(),
		});
	};
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::Configuration {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Passes successful responses through. A rejected credential is a configuration error;
/// any other failure status becomes [`Error::Status`] with the start of the body.
pub(crate) async fn check_status(res: Response) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}
	if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
		return Err(Error::Configuration {
			message: format!(
				"Provider rejected the api_key ({status}). Check OPENAI_API_KEY or providers.*.api_key."
			),
		});
	}

	let body = res.text().await.unwrap_or_default().chars().take(MAX_ERROR_BODY_CHARS).collect();

	Err(Error::Status { status, body })
}
