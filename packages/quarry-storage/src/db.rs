use std::str::FromStr;

use sqlx::{
	PgPool,
	postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};

use crate::{Error, Result, schema};
use quarry_config::Postgres;

const SCHEMA_LOCK_ID: i64 = 7_120_115;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &Postgres) -> Result<Self> {
		let options = connect_options(cfg)?;
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect_with(options).await?;

		Ok(Self { pool })
	}

	/// Creates the vector extension, the index table and its ANN index if missing.
	pub async fn ensure_schema(&self, vector_dim: u32, ivf_lists: u32) -> Result<()> {
		let sql = schema::render_schema(vector_dim, ivf_lists);
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(SCHEMA_LOCK_ID).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}

pub fn connect_options(cfg: &Postgres) -> Result<PgConnectOptions> {
	if let Some(dsn) = cfg.dsn.as_deref() {
		return PgConnectOptions::from_str(dsn)
			.map_err(|err| Error::Configuration(format!("Invalid Postgres DSN: {err}.")));
	}

	let ssl_mode = PgSslMode::from_str(&cfg.sslmode)
		.map_err(|err| Error::Configuration(format!("Invalid sslmode {:?}: {err}.", cfg.sslmode)))?;
	let mut options = PgConnectOptions::new_without_pgpass()
		.host(&cfg.host)
		.port(cfg.port)
		.username(&cfg.user)
		.database(&cfg.database)
		.ssl_mode(ssl_mode);

	if !cfg.password.is_empty() {
		options = options.password(&cfg.password);
	}

	Ok(options)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_options_from_fields() {
		let cfg = Postgres {
			host: "db.internal".to_string(),
			port: 6_543,
			user: "analyst".to_string(),
			database: "warehouse".to_string(),
			..Postgres::default()
		};
		let options = connect_options(&cfg).expect("Failed to build options.");

		assert_eq!(options.get_host(), "db.internal");
		assert_eq!(options.get_port(), 6_543);
		assert_eq!(options.get_username(), "analyst");
		assert_eq!(options.get_database(), Some("warehouse"));
	}

	#[test]
	fn dsn_takes_precedence() {
		let cfg = Postgres {
			dsn: Some("postgres://reader@replica:5433/metrics".to_string()),
			..Postgres::default()
		};
		let options = connect_options(&cfg).expect("Failed to build options.");

		assert_eq!(options.get_host(), "replica");
		assert_eq!(options.get_port(), 5_433);
		assert_eq!(options.get_database(), Some("metrics"));
	}

	#[test]
	fn rejects_unknown_sslmode() {
		let cfg = Postgres { sslmode: "sometimes".to_string(), ..Postgres::default() };

		assert!(matches!(connect_options(&cfg), Err(Error::Configuration(_))));
	}
}
