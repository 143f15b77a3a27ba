use sqlx::{PgExecutor, PgPool};

use crate::{
	Error, Result,
	models::{RetrievedDocument, SchemaDocument},
};

pub async fn delete_all<'e, E>(executor: E) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM schema_index").execute(executor).await?;

	Ok(result.rows_affected())
}

pub async fn count_documents<'e, E>(executor: E) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM schema_index").fetch_one(executor).await?;

	Ok(count)
}

/// Inserts all documents in one transaction. Every embedding is checked against
/// `vector_dim` before anything is written.
pub async fn insert_documents(
	pool: &PgPool,
	documents: &[SchemaDocument],
	vector_dim: u32,
) -> Result<u64> {
	for doc in documents {
		if doc.embedding.len() != vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Embedding for {} has {} dimensions, expected {vector_dim}.",
				doc.identifier,
				doc.embedding.len()
			)));
		}
	}

	let mut tx = pool.begin().await?;

	for doc in documents {
		sqlx::query(
			"\
INSERT INTO schema_index (kind, identifier, content, embedding)
VALUES ($1, $2, $3, $4::text::vector)",
		)
		.bind(doc.kind.as_str())
		.bind(doc.identifier.as_str())
		.bind(doc.content.as_str())
		.bind(vector_to_pg(&doc.embedding))
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(documents.len() as u64)
}

/// Returns up to `k` documents closest to `query` by L2 distance.
///
/// The inner query orders by distance alone so the ivfflat index can serve it. Ties among
/// the returned rows keep insertion order; a tie straddling the `k` boundary is cut
/// arbitrarily.
pub async fn nearest(
	pool: &PgPool,
	query: &[f32],
	k: u32,
	ivf_probes: u32,
) -> Result<Vec<RetrievedDocument>> {
	let mut tx = pool.begin().await?;

	// SET does not accept bind parameters; the value is a validated integer.
	sqlx::query(&format!("SET LOCAL ivfflat.probes = {ivf_probes}")).execute(&mut *tx).await?;

	let rows = sqlx::query_as::<_, RetrievedDocument>(
		"\
SELECT identifier, content, distance
FROM (
	SELECT
		id,
		identifier,
		content,
		(embedding <-> $1::text::vector)::float8 AS distance
	FROM schema_index
	ORDER BY embedding <-> $1::text::vector
	LIMIT $2
) hits
ORDER BY distance, id",
	)
	.bind(vector_to_pg(query))
	.bind(i64::from(k))
	.fetch_all(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(rows)
}

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_pgvector_text() {
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
		assert_eq!(vector_to_pg(&[]), "[]");
	}
}
