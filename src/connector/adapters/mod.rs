//! Adapter implementations for the connector store and schema source ports.

pub mod http;
pub mod memory;
pub mod postgres;
