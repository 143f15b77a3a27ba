use std::{collections::HashMap, env, str::FromStr};

use crate::{Config, Error, Result};

/// A resolver produces a value or nothing. Lookup failures are not errors.
pub type Resolver<'a> = Box<dyn Fn() -> Option<String> + 'a>;

pub trait EnvSource {
	fn var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
pub struct ProcessEnv;
impl EnvSource for ProcessEnv {
	fn var(&self, key: &str) -> Option<String> {
		env::var(key).ok()
	}
}

impl EnvSource for HashMap<String, String> {
	fn var(&self, key: &str) -> Option<String> {
		self.get(key).cloned()
	}
}

/// Tries each resolver in order and returns the first non-blank value.
pub fn first_non_empty(resolvers: &[Resolver<'_>]) -> Option<String> {
	resolvers.iter().filter_map(|resolve| resolve()).find(|value| !value.trim().is_empty())
}

/// Overlays environment variables on top of file values for the keys that have an
/// environment binding.
pub fn apply_env(cfg: &mut Config, env: &dyn EnvSource) -> Result<()> {
	let pg = &mut cfg.storage.postgres;

	if let Some(dsn) = resolve_optional(env, "DATABASE_URL", pg.dsn.as_deref()) {
		pg.dsn = Some(dsn);
	}

	pg.host = resolve_string(env, "DB_HOST", &pg.host);
	pg.port = resolve_parsed(env, "DB_PORT", pg.port)?;
	pg.user = resolve_string(env, "DB_USER", &pg.user);
	pg.password = resolve_string(env, "DB_PASSWORD", &pg.password);
	pg.database = resolve_string(env, "DB_NAME", &pg.database);
	pg.sslmode = resolve_string(env, "DB_SSLMODE", &pg.sslmode);

	cfg.index.vector_dim = resolve_parsed(env, "VECTOR_DIM", cfg.index.vector_dim)?;

	let embedding = &mut cfg.providers.embedding;

	embedding.api_key = resolve_optional(env, "OPENAI_API_KEY", embedding.api_key.as_deref());
	embedding.model = resolve_string(env, "EMBEDDING_MODEL", &embedding.model);

	let generation = &mut cfg.providers.generation;

	generation.api_key = resolve_optional(env, "OPENAI_API_KEY", generation.api_key.as_deref());
	generation.model = resolve_string(env, "SQL_MODEL", &generation.model);

	Ok(())
}

fn resolve_optional(env: &dyn EnvSource, key: &str, file: Option<&str>) -> Option<String> {
	let resolvers: [Resolver<'_>; 2] =
		[Box::new(|| env.var(key)), Box::new(|| file.map(str::to_string))];

	first_non_empty(&resolvers)
}

fn resolve_string(env: &dyn EnvSource, key: &str, file: &str) -> String {
	resolve_optional(env, key, Some(file)).unwrap_or_else(|| file.to_string())
}

fn resolve_parsed<T>(env: &dyn EnvSource, key: &str, file: T) -> Result<T>
where
	T: FromStr,
{
	let resolvers: [Resolver<'_>; 1] = [Box::new(|| env.var(key))];
	let Some(raw) = first_non_empty(&resolvers) else {
		return Ok(file);
	};

	raw.trim().parse().map_err(|_| Error::Validation {
		message: format!("{key} must be a valid number, got {raw:?}."),
	})
}
