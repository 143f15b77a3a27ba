use serde::Serialize;

use crate::{Error, QuarryService, Result, RetrievalContext};
use quarry_storage::{execute, models::QueryResult};

#[derive(Clone, Debug, Serialize)]
pub struct Answer {
	pub question: String,
	pub sql: String,
	pub context: RetrievalContext,
	/// `None` when the statement produced no row set.
	pub result: Option<QueryResult>,
}

impl QuarryService {
	/// Retrieves schema context for `question`, asks the generator for SQL and runs it.
	///
	/// Execution failures are returned as [`Error::ExecutionFailure`], which carries the
	/// generated SQL. Nothing is retried once the SQL exists.
	pub async fn answer(&self, question: &str) -> Result<Answer> {
		let question = question.trim();

		if question.is_empty() {
			return Err(Error::InvalidRequest { message: "Question must be non-empty.".to_string() });
		}

		let context = self.retrieve(question, None).await?;
		let rendered = context.render();
		let sql = self
			.providers
			.generation
			.generate_sql(&self.cfg.providers.generation, question, rendered.as_deref())
			.await?;
		let sql = sql.trim().to_string();

		if sql.is_empty() {
			return Err(Error::Provider { message: "Generation returned no SQL.".to_string() });
		}

		tracing::info!(context_len = context.len(), sql = %sql, "Generated SQL.");

		let result = self.execute_sql(&sql).await?;

		Ok(Answer { question: question.to_string(), sql, context, result })
	}

	/// Runs `sql` inside a transaction that is always rolled back.
	///
	/// Failing to reach the store is a [`Error::Storage`] error; anything the server rejects
	/// is an [`Error::ExecutionFailure`].
	pub async fn execute_sql(&self, sql: &str) -> Result<Option<QueryResult>> {
		match execute::run_sql(&self.db.pool, sql, self.cfg.execution.read_only).await {
			Ok(result) => Ok(result),
			Err(err) if err.is_connectivity() => {
				tracing::error!(error = %err, "Store unreachable while executing SQL.");

				Err(err.into())
			},
			Err(err) => {
				tracing::warn!(error = %err, sql, "SQL execution failed.");

				Err(Error::ExecutionFailure { sql: sql.to_string(), message: err.to_string() })
			},
		}
	}
}
