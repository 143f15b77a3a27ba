use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result, retry};
use quarry_config::GenerationProviderConfig;

pub const SQL_SYSTEM_PROMPT: &str = "You are a senior data analyst. Generate a single dialect-correct PostgreSQL SQL query to answer the user question. Use only tables and columns that exist based on the provided schema context. Prefer safe aggregates and explicit casts. Limit to 1000 rows unless the task requires full results.";

const EMPTY_CONTEXT: &str = "(none)";
const FENCE: &str = "```";
const SQL_LANGUAGE_TAGS: [&str; 5] = ["sql", "postgresql", "postgres", "pgsql", "psql"];

/// Asks the chat model for a SQL query answering `question`, grounded in `context`.
pub async fn generate_sql(
	cfg: &GenerationProviderConfig,
	question: &str,
	context: Option<&str>,
) -> Result<String> {
	let headers = crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": build_messages(question, context),
	});
	let (client, url, body, headers) = (&client, url.as_str(), &body, &headers);

	retry::with_retry(&cfg.retry, "generation", move || async move {
		let res = client.post(url).headers(headers.clone()).json(body).send().await?;
		let json: Value = crate::check_status(res).await?.json().await?;
		let content = parse_completion_content(&json)?;
		let sql = extract_sql(content);

		if sql.is_empty() {
			return Err(Error::InvalidResponse {
				message: "Generation response contains no SQL.".to_string(),
			});
		}

		Ok(sql)
	})
	.await
}

pub fn build_messages(question: &str, context: Option<&str>) -> Vec<Value> {
	let context = context.filter(|text| !text.trim().is_empty()).unwrap_or(EMPTY_CONTEXT);
	let user = format!(
		"Schema context:\n{context}\n\nQuestion: {question}\nReturn only SQL code in a fenced block or raw text without commentary."
	);

	vec![
		serde_json::json!({ "role": "system", "content": SQL_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

/// Pulls the SQL text out of a model response.
///
/// The body of the first fenced block wins, minus a leading language tag line. Without a
/// fence the whole response is used. The result is trimmed and never validated.
pub fn extract_sql(content: &str) -> String {
	let Some((_, after_open)) = content.split_once(FENCE) else {
		return content.trim().to_string();
	};
	let body = after_open.split_once(FENCE).map(|(body, _)| body).unwrap_or(after_open);
	let body = match body.split_once('\n') {
		Some((first_line, rest)) if is_language_tag(first_line) => rest,
		_ => body,
	};

	body.trim().to_string()
}

fn is_language_tag(line: &str) -> bool {
	let tag = line.trim();

	SQL_LANGUAGE_TAGS.iter().any(|known| tag.eq_ignore_ascii_case(known))
}

fn parse_completion_content(json: &Value) -> Result<&str> {
	let message = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.ok_or_else(|| Error::InvalidResponse {
			message: "Generation response is missing choices[0].message.".to_string(),
		})?;

	Ok(message.get("content").and_then(|c| c.as_str()).unwrap_or_default())
}
