//! Disposable Postgres databases for integration tests.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use quarry_config::Postgres;

pub const DSN_ENV: &str = "QUARRY_PG_DSN";

/// Databases tried, in order, for the `CREATE DATABASE` and `DROP DATABASE` connection.
const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

/// A uniquely named database on the server behind `QUARRY_PG_DSN`.
///
/// Call [`TestDatabase::cleanup`] at the end of a test; dropping without it still removes
/// the database, from a helper thread.
pub struct TestDatabase {
	name: String,
	options: PgConnectOptions,
	admin: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	/// Creates a database when `QUARRY_PG_DSN` is set, `None` otherwise.
	pub async fn from_env() -> Result<Option<Self>> {
		match env_dsn() {
			Some(dsn) => Self::create(&dsn).await.map(Some),
			None => Ok(None),
		}
	}

	pub async fn create(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn).map_err(Error::InvalidDsn)?;
		let (admin, mut conn) = open_admin(&base).await?;
		let name = format!("quarry_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;
		conn.close().await?;

		Ok(Self { options: base.database(&name), name, admin, dropped: false })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Connection settings for this database with a small pool.
	pub fn postgres_config(&self) -> Postgres {
		self.postgres_config_with_pool(2)
	}

	/// Connection settings that force every query onto one pooled connection.
	pub fn single_connection_config(&self) -> Postgres {
		self.postgres_config_with_pool(1)
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.dropped = true;

		drop_database(&self.admin, &self.name).await
	}

	fn postgres_config_with_pool(&self, pool_max_conns: u32) -> Postgres {
		Postgres {
			dsn: Some(self.options.to_url_lossy().to_string()),
			pool_max_conns,
			..Postgres::default()
		}
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let admin = self.admin.clone();
		// Drop can run inside a runtime, which cannot be blocked on; use a fresh one.
		let outcome = thread::spawn(move || -> Result<()> {
			Builder::new_current_thread().enable_all().build()?.block_on(drop_database(&admin, &name))
		})
		.join();

		match outcome {
			Ok(Ok(())) => {},
			Ok(Err(err)) => eprintln!("Failed to drop test database {}: {err}.", self.name),
			Err(_) => eprintln!("Test database cleanup thread panicked for {}.", self.name),
		}
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

async fn open_admin(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::AdminUnreachable(last_err.map(|err| err.to_string()).unwrap_or_default()))
}

/// `WITH (FORCE)` terminates sessions a test left open on the database.
async fn drop_database(admin: &PgConnectOptions, name: &str) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin).await?;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#).as_str()).await?;
	conn.close().await?;

	Ok(())
}
