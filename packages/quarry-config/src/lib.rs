mod error;
mod resolve;
mod types;

pub use error::{Error, Result};
pub use resolve::{EnvSource, ProcessEnv, Resolver, apply_env, first_non_empty};
pub use types::{
	Config, EmbeddingProviderConfig, Execution, GenerationProviderConfig, Index, Postgres,
	Providers, Retry, Service, Storage,
};

use std::{fs, path::Path};

use serde_json::{Map, Value};

const SSL_MODES: [&str; 6] = ["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];

/// Loads the optional config file and overlays the process environment.
pub fn load(path: Option<&Path>) -> Result<Config> {
	load_with_env(path, &ProcessEnv)
}

pub fn load_with_env(path: Option<&Path>, env: &dyn EnvSource) -> Result<Config> {
	let mut cfg = match path {
		Some(path) => {
			let raw = fs::read_to_string(path)
				.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

			toml::from_str(&raw)
				.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?
		},
		None => Config::default(),
	};

	apply_env(&mut cfg, env)?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	let pg = &cfg.storage.postgres;

	if pg.dsn.is_none() {
		if pg.host.trim().is_empty() {
			return Err(Error::Validation {
				message: "storage.postgres.host must be non-empty.".to_string(),
			});
		}
		if pg.port == 0 {
			return Err(Error::Validation {
				message: "storage.postgres.port must be greater than zero.".to_string(),
			});
		}
		if pg.database.trim().is_empty() {
			return Err(Error::Validation {
				message: "storage.postgres.database must be non-empty.".to_string(),
			});
		}
	}
	if !SSL_MODES.contains(&pg.sslmode.as_str()) {
		return Err(Error::Validation {
			message: format!(
				"storage.postgres.sslmode must be one of {}.",
				SSL_MODES.join(", ")
			),
		});
	}
	if pg.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.index.vector_dim == 0 {
		return Err(Error::Validation {
			message: "index.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.index.ivf_lists == 0 {
		return Err(Error::Validation {
			message: "index.ivf_lists must be greater than zero.".to_string(),
		});
	}
	if cfg.index.ivf_probes == 0 {
		return Err(Error::Validation {
			message: "index.ivf_probes must be greater than zero.".to_string(),
		});
	}
	if cfg.index.top_k == 0 {
		return Err(Error::Validation {
			message: "index.top_k must be greater than zero.".to_string(),
		});
	}

	let embedding = &cfg.providers.embedding;
	let generation = &cfg.providers.generation;

	for (label, model) in [("embedding", &embedding.model), ("generation", &generation.model)] {
		if model.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.model must be non-empty."),
			});
		}
	}
	for (label, retry) in [("embedding", &embedding.retry), ("generation", &generation.retry)] {
		if retry.max_attempts == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.retry.max_attempts must be greater than zero."),
			});
		}
		if retry.initial_backoff_ms > retry.max_backoff_ms {
			return Err(Error::Validation {
				message: format!(
					"providers.{label}.retry.initial_backoff_ms must not exceed max_backoff_ms."
				),
			});
		}
	}
	for (label, headers) in
		[("embedding", &embedding.default_headers), ("generation", &generation.default_headers)]
	{
		validate_headers(label, headers)?;
	}

	if !generation.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be a finite number.".to_string(),
		});
	}
	if generation.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be zero or greater.".to_string(),
		});
	}

	Ok(())
}

fn validate_headers(label: &str, headers: &Map<String, Value>) -> Result<()> {
	if headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: format!("providers.{label}.default_headers values must be strings."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let pg = &mut cfg.storage.postgres;

	if pg.dsn.as_deref().map(|dsn| dsn.trim().is_empty()).unwrap_or(false) {
		pg.dsn = None;
	}

	pg.sslmode = pg.sslmode.trim().to_ascii_lowercase();

	for key in [&mut cfg.providers.embedding.api_key, &mut cfg.providers.generation.api_key] {
		if key.as_deref().map(|value| value.trim().is_empty()).unwrap_or(false) {
			*key = None;
		}
	}

	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
	cfg.providers.generation.api_base =
		cfg.providers.generation.api_base.trim_end_matches('/').to_string();
}
