use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::{Error, QuarryService, Result};
use quarry_storage::{
	catalog,
	models::{CatalogTable, RetrievedDocument, SchemaDocument, TABLE_DOCUMENT_KIND},
	schema_index,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
	#[default]
	Empty,
	Building,
	Ready,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
	pub indexed_count: u64,
	/// Documents removed from the previous generation.
	pub deleted_count: u64,
}

/// Schema documents closest to a query, nearest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RetrievalContext {
	pub documents: Vec<RetrievedDocument>,
}
impl RetrievalContext {
	pub fn is_empty(&self) -> bool {
		self.documents.is_empty()
	}

	pub fn len(&self) -> usize {
		self.documents.len()
	}

	/// One `[identifier] content` line per document, or `None` for an empty context.
	pub fn render(&self) -> Option<String> {
		if self.documents.is_empty() {
			return None;
		}

		let lines: Vec<String> = self
			.documents
			.iter()
			.map(|doc| format!("[{}] {}", doc.identifier, doc.content))
			.collect();

		Some(lines.join("\n"))
	}
}

#[derive(Debug, Default)]
pub(crate) struct IndexTracker {
	state: Mutex<IndexState>,
}
impl IndexTracker {
	fn get(&self) -> IndexState {
		*self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn set(&self, next: IndexState) {
		*self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
	}
}

impl QuarryService {
	pub async fn ensure_schema(&self) -> Result<()> {
		self.db.ensure_schema(self.cfg.index.vector_dim, self.cfg.index.ivf_lists).await?;

		Ok(())
	}

	pub fn index_state(&self) -> IndexState {
		self.index.get()
	}

	/// Reads the stored document count and marks the index `Ready` when it is non-empty.
	/// A rebuild in progress is left alone.
	pub async fn sync_index_state(&self) -> Result<IndexState> {
		let count = self.count_documents().await?;

		if self.index.get() != IndexState::Building {
			self.index.set(if count > 0 { IndexState::Ready } else { IndexState::Empty });
		}

		Ok(self.index.get())
	}

	pub async fn count_documents(&self) -> Result<u64> {
		let count = schema_index::count_documents(&self.db.pool).await?;

		Ok(u64::try_from(count).unwrap_or_default())
	}

	/// Replaces every schema document with a fresh one per catalog table.
	///
	/// The delete and the inserts run in separate transactions, so concurrent readers may
	/// see an empty or partial index while this runs.
	pub async fn rebuild_index(&self) -> Result<RebuildReport> {
		self.index.set(IndexState::Building);

		match self.rebuild_generation().await {
			Ok(report) => {
				self.index.set(IndexState::Ready);

				tracing::info!(
					indexed_count = report.indexed_count,
					deleted_count = report.deleted_count,
					"Schema index rebuilt."
				);

				Ok(report)
			},
			Err(err) => {
				self.index.set(IndexState::Empty);

				tracing::error!(error = %err, "Schema index rebuild failed.");

				Err(err)
			},
		}
	}

	/// Embeds `query` and returns the `k` nearest schema documents, `index.top_k` when
	/// `k` is `None`.
	pub async fn retrieve(&self, query: &str, k: Option<u32>) -> Result<RetrievalContext> {
		let k = k.unwrap_or(self.cfg.index.top_k);

		if k == 0 {
			return Err(Error::InvalidRequest {
				message: "k must be greater than zero.".to_string(),
			});
		}

		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &[query.to_string()]).await?;
		let Some(vec) = embeddings.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vec.len() != self.cfg.index.vector_dim as usize {
			return Err(Error::Provider {
				message: format!(
					"Query embedding has {} dimensions, expected {}.",
					vec.len(),
					self.cfg.index.vector_dim
				),
			});
		}

		let documents =
			schema_index::nearest(&self.db.pool, &vec, k, self.cfg.index.ivf_probes).await?;

		tracing::debug!(k, hits = documents.len(), "Retrieved schema context.");

		Ok(RetrievalContext { documents })
	}

	async fn rebuild_generation(&self) -> Result<RebuildReport> {
		let deleted_count = schema_index::delete_all(&self.db.pool)
			.await
			.map_err(|err| build_failure("deleting documents", err))?;
		let columns = catalog::fetch_columns(&self.db.pool)
			.await
			.map_err(|err| build_failure("reading the catalog", err))?;
		let tables = catalog::group_tables(columns);

		if tables.is_empty() {
			return Ok(RebuildReport { indexed_count: 0, deleted_count });
		}

		let contents: Vec<String> = tables.iter().map(describe_table).collect();
		let embeddings = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &contents)
			.await
			.map_err(|err| build_failure("embedding documents", err))?;

		if embeddings.len() != tables.len() {
			return Err(build_failure(
				"embedding documents",
				Error::Provider {
					message: format!(
						"Expected {} embeddings, received {}.",
						tables.len(),
						embeddings.len()
					),
				},
			));
		}

		let documents: Vec<SchemaDocument> = tables
			.iter()
			.zip(contents)
			.zip(embeddings)
			.map(|((table, content), embedding)| SchemaDocument {
				kind: TABLE_DOCUMENT_KIND.to_string(),
				identifier: table.identifier(),
				content,
				embedding,
			})
			.collect();
		let indexed_count =
			schema_index::insert_documents(&self.db.pool, &documents, self.cfg.index.vector_dim)
				.await
				.map_err(|err| build_failure("inserting documents", err))?;

		Ok(RebuildReport { indexed_count, deleted_count })
	}
}

/// `Table <schema>.<table> with columns: <name>:<type>, ...` in ordinal order.
pub fn describe_table(table: &CatalogTable) -> String {
	let columns: Vec<String> =
		table.columns.iter().map(|(name, data_type)| format!("{name}:{data_type}")).collect();

	format!("Table {} with columns: {}", table.identifier(), columns.join(", "))
}

fn build_failure(stage: &'static str, err: impl Into<Error>) -> Error {
	Error::IndexBuildFailure { stage, source: Box::new(err.into()) }
}
