pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quarry_config::Config;
use quarry_service::{Answer, Error, QuarryService};
use quarry_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = quarry_cli::VERSION,
	rename_all = "kebab",
	styles = quarry_cli::styles(),
)]
pub struct Args {
	/// Optional TOML config. Environment variables override its values.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create the vector extension, the index table and its ANN index.
	EnsureSchema,
	/// Rebuild the schema index from the live catalog.
	RebuildIndex,
	/// Show the schema documents nearest to a query.
	Retrieve {
		query: String,
		#[arg(long, short = 'k')]
		k: Option<u32>,
	},
	/// Answer a natural-language question with generated SQL.
	Ask {
		question: String,
		/// Maximum number of rows to print.
		#[arg(long, default_value_t = 200)]
		preview: usize,
		/// Print the answer as JSON instead of a table.
		#[arg(long)]
		json: bool,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = quarry_config::load(args.config.as_deref())?;

	init_tracing(&config)?;

	let service = connect(config).await?;

	match args.command {
		Command::EnsureSchema => {
			let count = service.count_documents().await?;

			println!("Schema ready ({count} indexed documents).");
		},
		Command::RebuildIndex => {
			let report = service.rebuild_index().await?;

			println!(
				"Indexed {} tables, replacing {} documents.",
				report.indexed_count, report.deleted_count
			);
		},
		Command::Retrieve { query, k } => {
			let context = service.retrieve(&query, k).await?;

			print!("{}", render::context(&context));
		},
		Command::Ask { question, preview, json } => match service.answer(&question).await {
			Ok(answer) => print_answer(&answer, preview, json)?,
			Err(err) => {
				if let Error::ExecutionFailure { sql, .. } = &err {
					println!("SQL:\n{sql}\n");
				}

				return Err(err.into());
			},
		},
	}

	service.db.pool.close().await;

	Ok(())
}

async fn connect(config: Config) -> color_eyre::Result<QuarryService> {
	let db = Db::connect(&config.storage.postgres).await?;
	let service = QuarryService::new(config, db);

	service.ensure_schema().await?;

	let state = service.sync_index_state().await?;

	tracing::debug!(?state, "Schema index opened.");

	Ok(service)
}

fn print_answer(answer: &Answer, preview: usize, json: bool) -> color_eyre::Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(answer)?);

		return Ok(());
	}

	print!("{}", render::context(&answer.context));
	println!("\nSQL:\n{}\n", answer.sql);
	print!("{}", render::result(answer.result.as_ref(), preview));

	Ok(())
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
