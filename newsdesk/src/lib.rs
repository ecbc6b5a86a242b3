// Library interface for newsdesk modules
// This allows tests and other binaries to import modules

pub mod classify;
pub mod error;
pub mod ingestion;
pub mod model;
pub mod orchestrator;
pub mod query;
pub mod sample;
pub mod sources;
pub mod storage;
pub mod text;

pub use error::{FetchError, StoreError};
pub use model::{Article, RawItem, SourceDescriptor, Topic};
pub use orchestrator::Orchestrator;
pub use query::{ArticlePage, ArticleQuery, Stats};
pub use storage::{ArticleStore, Backing, StoreOptions};
