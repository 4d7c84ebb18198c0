//! Port contracts for connector lifecycle, cascade and access control.

mod schema_source;
mod store;

pub use schema_source::{SchemaSource, SchemaSourceError, SchemaSourceResult};
pub use store::{ConnectorStore, ConnectorStoreError, ConnectorStoreResult};
