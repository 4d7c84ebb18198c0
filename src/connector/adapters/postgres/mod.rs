//! `PostgreSQL` adapters for connector persistence.

mod models;
mod schema;
mod store;

pub use store::{ConnectorPgPool, PostgresConnectorStore, pool_from_url};
