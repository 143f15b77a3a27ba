pub mod answer;
pub mod index;

mod error;

pub use answer::Answer;
pub use error::{Error, Result};
pub use index::{IndexState, RebuildReport, RetrievalContext};

use std::{future::Future, pin::Pin, sync::Arc};

use quarry_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig};
use quarry_providers::{embedding, generation};
use quarry_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate_sql<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		question: &'a str,
		context: Option<&'a str>,
	) -> BoxFuture<'a, Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(HttpProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

/// Owns the configuration, the connection pool and the remote providers for one host.
pub struct QuarryService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
	index: index::IndexTracker,
}
impl QuarryService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_providers(cfg, db, Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers, index: index::IndexTracker::default() }
	}
}

struct HttpProviders;
impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
impl GenerationProvider for HttpProviders {
	fn generate_sql<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		question: &'a str,
		context: Option<&'a str>,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(generation::generate_sql(cfg, question, context).await?) })
	}
}
