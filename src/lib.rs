//! Connector hub: lifecycle, cascade and access control for tool connectors.
//!
//! Administrators register connectors, activate them from a remote schema
//! document, provision servers from active connectors and decide which users
//! may see each connector.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, HTTP, memory)
//!
//! # Modules
//!
//! - [`connector`]: Connector aggregate, stores and services
//! - [`config`]: Layered configuration
//! - [`hub`]: Composition root
//! - [`telemetry`]: Tracing subscriber setup

pub mod config;
pub mod connector;
pub mod hub;
pub mod telemetry;
