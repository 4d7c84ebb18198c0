//! Connector lifecycle, cascade and access control for the hub.
//!
//! Administrators register connectors, activate them from a fetched schema
//! document, instantiate servers from active connectors, and decide which
//! users may see which connector. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
