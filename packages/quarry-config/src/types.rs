use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub index: Index,
	pub providers: Providers,
	pub execution: Execution,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Postgres {
	/// Optional. When set, takes precedence over the individual connection fields.
	pub dsn: Option<String>,
	pub host: String,
	pub port: u16,
	pub user: String,
	pub password: String,
	pub database: String,
	pub sslmode: String,
	pub pool_max_conns: u32,
}
impl Default for Postgres {
	fn default() -> Self {
		Self {
			dsn: None,
			host: "localhost".to_string(),
			port: 5_432,
			user: "postgres".to_string(),
			password: String::new(),
			database: "postgres".to_string(),
			sslmode: "prefer".to_string(),
			pool_max_conns: 5,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Index {
	pub vector_dim: u32,
	/// Number of IVF lists used when the ANN index is created.
	pub ivf_lists: u32,
	/// Number of IVF lists probed per retrieval query.
	pub ivf_probes: u32,
	pub top_k: u32,
}
impl Default for Index {
	fn default() -> Self {
		Self { vector_dim: 1_536, ivf_lists: 100, ivf_probes: 10, top_k: 5 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: GenerationProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retry {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	pub initial_backoff_ms: u64,
	pub max_backoff_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_attempts: 3, initial_backoff_ms: 1_000, max_backoff_ms: 10_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
	pub retry: Retry,
}
impl Default for EmbeddingProviderConfig {
	fn default() -> Self {
		Self {
			api_base: DEFAULT_API_BASE.to_string(),
			api_key: None,
			path: "/embeddings".to_string(),
			model: "text-embedding-3-small".to_string(),
			timeout_ms: 30_000,
			default_headers: Map::new(),
			retry: Retry::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationProviderConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
	pub retry: Retry,
}
impl Default for GenerationProviderConfig {
	fn default() -> Self {
		Self {
			api_base: DEFAULT_API_BASE.to_string(),
			api_key: None,
			path: "/chat/completions".to_string(),
			model: "gpt-4o-mini".to_string(),
			temperature: 0.0,
			timeout_ms: 60_000,
			default_headers: Map::new(),
			retry: Retry::default(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Execution {
	/// Run generated SQL inside a READ ONLY transaction.
	pub read_only: bool,
}

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
