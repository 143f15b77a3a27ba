use sqlx::{Column, Connection, Executor, PgPool, Row, Statement, TypeInfo, postgres::PgRow};

use crate::{
	Result,
	models::{Cell, QueryResult},
};

/// Runs one SQL statement on a single connection.
///
/// The statement is prepared first so the projection is known even when no rows come back,
/// then executed through the simple query protocol, which returns every value as text. The
/// surrounding transaction is always rolled back. Returns `None` for statements that produce
/// no row set.
pub async fn run_sql(pool: &PgPool, sql: &str, read_only: bool) -> Result<Option<QueryResult>> {
	let mut tx = pool.begin().await?;

	if read_only {
		sqlx::query("SET TRANSACTION READ ONLY").execute(&mut *tx).await?;
	}

	let statement = (&mut *tx).prepare(sql).await?;
	let described: Vec<String> = column_names(statement.columns());

	// Prepared statements are cached per connection by SQL text. Generated SQL must be
	// described against the current table shapes every time, so it never stays cached.
	Connection::clear_cached_statements(&mut *tx).await?;

	let result = if described.is_empty() {
		sqlx::raw_sql(sql).execute(&mut *tx).await?;

		None
	} else {
		let rows = sqlx::raw_sql(sql).fetch_all(&mut *tx).await?;
		let columns = match rows.first() {
			Some(row) => column_names(row.columns()),
			None => described,
		};
		let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;

		Some(QueryResult { columns, rows })
	};

	tx.rollback().await?;

	Ok(result)
}

fn column_names<C>(columns: &[C]) -> Vec<String>
where
	C: Column,
{
	columns.iter().map(|column| column.name().to_string()).collect()
}

fn decode_row(row: &PgRow) -> Result<Vec<Cell>> {
	let mut cells = Vec::with_capacity(row.len());

	for (index, column) in row.columns().iter().enumerate() {
		let text: Option<&str> = row.try_get_unchecked(index)?;
		let cell = match text {
			Some(text) => parse_cell(column.type_info().name(), text),
			None => Cell::Null,
		};

		cells.push(cell);
	}

	Ok(cells)
}

/// Maps a text-format Postgres value to a typed cell. Values that fail to parse as their
/// declared type are kept as text.
pub fn parse_cell(type_name: &str, text: &str) -> Cell {
	match type_name {
		"BOOL" => match text {
			"t" | "true" => Cell::Bool(true),
			"f" | "false" => Cell::Bool(false),
			_ => Cell::Text(text.to_string()),
		},
		"INT2" | "INT4" | "INT8" | "OID" =>
			text.parse().map(Cell::Int).unwrap_or_else(|_| Cell::Text(text.to_string())),
		"FLOAT4" | "FLOAT8" =>
			text.parse().map(Cell::Float).unwrap_or_else(|_| Cell::Text(text.to_string())),
		"NUMERIC" => Cell::Numeric(text.to_string()),
		"JSON" | "JSONB" =>
			serde_json::from_str(text).map(Cell::Json).unwrap_or_else(|_| Cell::Text(text.to_string())),
		_ => Cell::Text(text.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_scalar_types() {
		assert_eq!(parse_cell("BOOL", "t"), Cell::Bool(true));
		assert_eq!(parse_cell("BOOL", "f"), Cell::Bool(false));
		assert_eq!(parse_cell("INT8", "-42"), Cell::Int(-42));
		assert_eq!(parse_cell("FLOAT8", "1.5"), Cell::Float(1.5));
		assert_eq!(parse_cell("NUMERIC", "12345678901234567890.01"), Cell::Numeric("12345678901234567890.01".to_string()));
		assert_eq!(parse_cell("TEXT", "hello"), Cell::Text("hello".to_string()));
		assert_eq!(parse_cell("DATE", "2024-01-31"), Cell::Text("2024-01-31".to_string()));
	}

	#[test]
	fn parses_json_documents() {
		assert_eq!(
			parse_cell("JSONB", r#"{"region": "emea"}"#),
			Cell::Json(serde_json::json!({ "region": "emea" }))
		);
	}

	#[test]
	fn unparsable_values_fall_back_to_text() {
		assert_eq!(parse_cell("INT4", "n/a"), Cell::Text("n/a".to_string()));
		assert_eq!(parse_cell("JSON", "{broken"), Cell::Text("{broken".to_string()));
	}
}
