use sqlx::PgExecutor;

use crate::{
	Result,
	models::{CatalogColumn, CatalogTable},
};

/// Lists every column of every non-system table in catalog order, leaving out the index
/// table itself.
pub async fn fetch_columns<'e, E>(executor: E) -> Result<Vec<CatalogColumn>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, CatalogColumn>(
		"\
SELECT
	table_schema::text AS table_schema,
	table_name::text AS table_name,
	column_name::text AS column_name,
	data_type::text AS data_type
FROM information_schema.columns
WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
	AND NOT (table_schema::text = current_schema()::text AND table_name::text = 'schema_index')
ORDER BY table_schema, table_name, ordinal_position",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Groups consecutive catalog rows by table, keeping the incoming order of tables and
/// columns.
pub fn group_tables(columns: Vec<CatalogColumn>) -> Vec<CatalogTable> {
	let mut tables: Vec<CatalogTable> = Vec::new();

	for column in columns {
		if let Some(table) = tables.last_mut()
			&& table.table_schema == column.table_schema
			&& table.table_name == column.table_name
		{
			table.columns.push((column.column_name, column.data_type));

			continue;
		}

		tables.push(CatalogTable {
			table_schema: column.table_schema,
			table_name: column.table_name,
			columns: vec![(column.column_name, column.data_type)],
		});
	}

	tables
}
