pub mod catalog;
pub mod db;
pub mod execute;
pub mod models;
pub mod schema;
pub mod schema_index;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
