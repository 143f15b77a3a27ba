use std::{
	collections::HashMap,
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use quarry_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn write_temp_config(payload: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("quarry_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_sample(payload: &str, vars: &[(&str, &str)]) -> quarry_config::Result<Config> {
	let env: HashMap<String, String> =
		vars.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect();
	let path = write_temp_config(payload);
	let result = quarry_config::load_with_env(Some(&path), &env);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn sample_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.expect("Sample config must include the section.");
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn expect_validation(result: quarry_config::Result<Config>, needle: &str) {
	let err = result.expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error: {err:?}");

	let message = err.to_string();

	assert!(message.contains(needle), "Unexpected error message: {message}");
}

#[test]
fn defaults_apply_without_a_config_file() {
	let env = HashMap::new();
	let cfg = quarry_config::load_with_env(None, &env).expect("Defaults must validate.");
	let pg = &cfg.storage.postgres;

	assert_eq!(pg.host, "localhost");
	assert_eq!(pg.port, 5_432);
	assert_eq!(pg.user, "postgres");
	assert_eq!(pg.password, "");
	assert_eq!(pg.database, "postgres");
	assert_eq!(pg.sslmode, "prefer");
	assert_eq!(cfg.index.vector_dim, 1_536);
	assert_eq!(cfg.index.top_k, 5);
	assert_eq!(cfg.providers.embedding.model, "text-embedding-3-small");
	assert_eq!(cfg.providers.generation.model, "gpt-4o-mini");
	assert_eq!(cfg.providers.generation.temperature, 0.0);
	assert_eq!(cfg.providers.embedding.retry.max_attempts, 3);
	assert_eq!(cfg.providers.embedding.retry.initial_backoff_ms, 1_000);
	assert_eq!(cfg.providers.embedding.retry.max_backoff_ms, 10_000);
	assert!(cfg.providers.embedding.api_key.is_none());
}

#[test]
fn file_values_are_used_when_env_is_empty() {
	let cfg = load_sample(SAMPLE_CONFIG_TOML, &[]).expect("Sample config must validate.");

	assert_eq!(cfg.service.log_level, "debug");
	assert_eq!(cfg.storage.postgres.host, "db.internal");
	assert_eq!(cfg.storage.postgres.port, 6_543);
	assert_eq!(cfg.storage.postgres.password, "file-secret");
	assert_eq!(cfg.index.vector_dim, 8);
	assert_eq!(cfg.providers.embedding.api_key.as_deref(), Some("file-key"));
	assert_eq!(cfg.providers.embedding.api_base, "http://127.0.0.1:9000/v1");
	assert!(cfg.providers.generation.api_key.is_none());
	assert!(cfg.execution.read_only);
}

#[test]
fn env_values_take_precedence_over_file_values() {
	let cfg = load_sample(
		SAMPLE_CONFIG_TOML,
		&[
			("DB_HOST", "env-host"),
			("DB_PORT", "7000"),
			("DB_PASSWORD", "env-secret"),
			("DB_SSLMODE", "disable"),
			("VECTOR_DIM", "16"),
			("OPENAI_API_KEY", "env-key"),
			("SQL_MODEL", "sql-large"),
		],
	)
	.expect("Config must validate.");

	assert_eq!(cfg.storage.postgres.host, "env-host");
	assert_eq!(cfg.storage.postgres.port, 7_000);
	assert_eq!(cfg.storage.postgres.password, "env-secret");
	assert_eq!(cfg.storage.postgres.sslmode, "disable");
	assert_eq!(cfg.index.vector_dim, 16);
	assert_eq!(cfg.providers.embedding.api_key.as_deref(), Some("env-key"));
	assert_eq!(cfg.providers.generation.api_key.as_deref(), Some("env-key"));
	assert_eq!(cfg.providers.generation.model, "sql-large");
	assert_eq!(cfg.providers.embedding.model, "embed-small");
}

#[test]
fn blank_env_values_fall_through_to_the_file() {
	let cfg = load_sample(SAMPLE_CONFIG_TOML, &[("DB_HOST", "  "), ("OPENAI_API_KEY", "")])
		.expect("Config must validate.");

	assert_eq!(cfg.storage.postgres.host, "db.internal");
	assert_eq!(cfg.providers.embedding.api_key.as_deref(), Some("file-key"));
}

#[test]
fn invalid_port_in_env_is_rejected() {
	expect_validation(load_sample(SAMPLE_CONFIG_TOML, &[("DB_PORT", "not-a-port")]), "DB_PORT");
}

#[test]
fn unknown_sslmode_is_rejected() {
	let payload = sample_with("storage.postgres", "sslmode", Value::String("sometimes".into()));

	expect_validation(load_sample(&payload, &[]), "storage.postgres.sslmode");
}

#[test]
fn zero_vector_dim_is_rejected() {
	let payload = sample_with("index", "vector_dim", Value::Integer(0));

	expect_validation(load_sample(&payload, &[]), "index.vector_dim");
}

#[test]
fn zero_top_k_is_rejected() {
	let payload = sample_with("index", "top_k", Value::Integer(0));

	expect_validation(load_sample(&payload, &[]), "index.top_k");
}

#[test]
fn zero_retry_attempts_are_rejected() {
	let payload = sample_with("providers.embedding.retry", "max_attempts", Value::Integer(0));

	expect_validation(load_sample(&payload, &[]), "providers.embedding.retry.max_attempts");
}

#[test]
fn backoff_floor_above_ceiling_is_rejected() {
	let payload =
		sample_with("providers.embedding.retry", "initial_backoff_ms", Value::Integer(500));

	expect_validation(load_sample(&payload, &[]), "initial_backoff_ms");
}

#[test]
fn negative_temperature_is_rejected() {
	let payload = sample_with("providers.generation", "temperature", Value::Float(-0.5));

	expect_validation(load_sample(&payload, &[]), "providers.generation.temperature");
}

#[test]
fn non_string_default_headers_are_rejected() {
	let payload =
		sample_with("providers.generation.default_headers", "x-retries", Value::Integer(3));

	expect_validation(load_sample(&payload, &[]), "default_headers");
}

#[test]
fn missing_config_file_reports_the_path() {
	let env = HashMap::new();
	let path = env::temp_dir().join("quarry_config_test_missing.toml");
	let err = quarry_config::load_with_env(Some(&path), &env).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
