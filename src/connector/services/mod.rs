//! Application services for the connector lifecycle, cascades, access
//! control and server provisioning.

mod access;
mod cascade;
mod error;
mod lifecycle;
mod provisioning;

pub use access::AccessControlGateway;
pub use cascade::CascadeCoordinator;
pub use error::{ConnectorServiceError, ConnectorServiceResult, ErrorKind, require_superuser};
pub use lifecycle::{
    ActivationOutcome, ConnectorLifecycleService, RegisterConnectorRequest, RegisteredConnector,
};
pub use provisioning::{CreateServerRequest, ServerProvisioningService};
