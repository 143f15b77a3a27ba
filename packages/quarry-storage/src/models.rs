use serde::Serialize;
use serde_json::Value;

pub const TABLE_DOCUMENT_KIND: &str = "table";

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
	pub kind: String,
	pub identifier: String,
	pub content: String,
	pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RetrievedDocument {
	pub identifier: String,
	pub content: String,
	pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CatalogColumn {
	pub table_schema: String,
	pub table_name: String,
	pub column_name: String,
	pub data_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
	pub table_schema: String,
	pub table_name: String,
	/// `(column_name, data_type)` in ordinal order.
	pub columns: Vec<(String, String)>,
}
impl CatalogTable {
	pub fn identifier(&self) -> String {
		format!("{}.{}", self.table_schema, self.table_name)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	/// Exact decimal text, kept as a string to avoid precision loss.
	Numeric(String),
	Json(Value),
	Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
	pub columns: Vec<String>,
	pub rows: Vec<Vec<Cell>>,
}
impl QueryResult {
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}
