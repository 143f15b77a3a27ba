pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid QUARRY_PG_DSN: {0}")]
	InvalidDsn(sqlx::Error),
	#[error("No admin database reachable from QUARRY_PG_DSN: {0}")]
	AdminUnreachable(String),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
