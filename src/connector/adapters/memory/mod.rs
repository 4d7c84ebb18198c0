//! In-memory adapters for tests and single-process deployments.

mod schema_source;
mod store;

pub use schema_source::StaticSchemaSource;
pub use store::InMemoryConnectorStore;
