//! Plain-text rendering for terminal output.

use std::fmt::Write;

use quarry_service::RetrievalContext;
use quarry_storage::models::{Cell, QueryResult};

pub const NO_ROWS: &str = "No rows returned.";

pub fn context(context: &RetrievalContext) -> String {
	if context.is_empty() {
		return "Context: (none)\n".to_string();
	}

	let mut out = String::from("Context:\n");

	for doc in &context.documents {
		let _ = writeln!(out, "  [{}] ({:.4}) {}", doc.identifier, doc.distance, doc.content);
	}

	out
}

/// Renders up to `preview` rows as an aligned table with a header line.
pub fn result(result: Option<&QueryResult>, preview: usize) -> String {
	let Some(result) = result.filter(|result| !result.is_empty()) else {
		return format!("{NO_ROWS}\n");
	};
	let shown: Vec<Vec<String>> =
		result.rows.iter().take(preview).map(|row| row.iter().map(cell_text).collect()).collect();
	let mut widths: Vec<usize> = result.columns.iter().map(|name| name.chars().count()).collect();

	for row in &shown {
		for (width, text) in widths.iter_mut().zip(row) {
			*width = (*width).max(text.chars().count());
		}
	}

	let mut out = String::new();

	push_line(&mut out, &result.columns, &widths);

	let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();

	push_line(&mut out, &rule, &widths);

	for row in &shown {
		push_line(&mut out, row, &widths);
	}

	let hidden = result.rows.len() - shown.len();

	if hidden > 0 {
		let _ = writeln!(out, "({hidden} more rows not shown)");
	}

	out
}

pub fn cell_text(cell: &Cell) -> String {
	match cell {
		Cell::Null => "NULL".to_string(),
		Cell::Bool(value) => value.to_string(),
		Cell::Int(value) => value.to_string(),
		Cell::Float(value) => value.to_string(),
		Cell::Numeric(value) | Cell::Text(value) => value.clone(),
		Cell::Json(value) => value.to_string(),
	}
}

fn push_line(out: &mut String, values: &[String], widths: &[usize]) {
	let cells: Vec<String> = values
		.iter()
		.zip(widths)
		.map(|(value, width)| format!("{value:<width$}", width = *width))
		.collect();

	out.push_str(cells.join(" | ").trim_end());
	out.push('\n');
}
