//! Server provisioning tests through the hub services.

use crate::in_memory::helpers::TestHub;
use chrono::{Duration, Utc};
use connector_hub::connector::{
    domain::{CascadePolicy, ServerId, SettableMode},
    services::{ConnectorServiceError, CreateServerRequest, ErrorKind},
};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn granted_member_provisions_server_with_token_and_tools() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("GitHub").await;
    let member = test_hub.add_user("dev@example.com", false).await;
    test_hub
        .hub
        .access()
        .grant(test_hub.admin, member.id, connector.id())
        .await
        .expect("grant should succeed");
    let provisioning = test_hub.hub.provisioning();

    let bundle = provisioning
        .create_server(
            member.identity(),
            CreateServerRequest::new(connector.id(), "acme", json!({"org": "acme"}))
                .with_token_ttl(Duration::days(7)),
        )
        .await
        .expect("server creation should succeed");

    assert_eq!(bundle.tools.len(), 3);
    let token = bundle.tokens.first().expect("one token");
    assert_eq!(token.value.len(), 40);
    assert!(token.is_valid_at(Utc::now() + Duration::days(6)));
    assert!(!token.is_valid_at(Utc::now() + Duration::days(8)));

    let fetched = provisioning
        .get_server(member.identity(), bundle.server.id())
        .await
        .expect("server should be readable");
    assert_eq!(fetched, bundle);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overflowing_token_ttl_is_a_validation_error() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("GitHub").await;
    let provisioning = test_hub.hub.provisioning();

    let err = provisioning
        .create_server(
            test_hub.admin,
            CreateServerRequest::new(connector.id(), "acme", json!({"org": "acme"}))
                .with_token_ttl(Duration::days(365 * 1_000_000)),
        )
        .await
        .expect_err("expiry past the calendar range");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.status_code(), 422);
    assert!(
        provisioning
            .list_servers(test_hub.admin, connector.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deactivated_connector_blocks_new_servers() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("GitHub").await;
    test_hub
        .hub
        .lifecycle()
        .set_mode(test_hub.admin, connector.id(), SettableMode::Deactive)
        .await
        .expect("switching off should succeed");

    let err = test_hub
        .hub
        .provisioning()
        .create_server(
            test_hub.admin,
            CreateServerRequest::new(connector.id(), "acme", json!({"org": "acme"})),
        )
        .await
        .expect_err("inactive connector");

    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hidden_connector_is_not_found_for_members() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("GitHub").await;
    let outsider = test_hub.add_user("outsider@example.com", false).await;

    let err = test_hub
        .hub
        .provisioning()
        .create_server(
            outsider.identity(),
            CreateServerRequest::new(connector.id(), "acme", json!({"org": "acme"})),
        )
        .await
        .expect_err("hidden connector");

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configuration_must_carry_required_keys() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("GitHub").await;

    let err = test_hub
        .hub
        .provisioning()
        .create_server(
            test_hub.admin,
            CreateServerRequest::new(connector.id(), "acme", json!({"team": "core"})),
        )
        .await
        .expect_err("missing org key");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.status_code(), 422);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn server_names_are_unique_per_connector() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let github = test_hub.register_active("GitHub").await;
    let gitlab = test_hub.register_active("GitLab").await;
    let provisioning = test_hub.hub.provisioning();
    let request = |connector_id| {
        CreateServerRequest::new(connector_id, "shared", json!({"org": "example"}))
    };

    provisioning
        .create_server(test_hub.admin, request(github.id()))
        .await
        .expect("first server should succeed");
    provisioning
        .create_server(test_hub.admin, request(gitlab.id()))
        .await
        .expect("same name on another connector should succeed");
    let err = provisioning
        .create_server(test_hub.admin, request(github.id()))
        .await
        .expect_err("duplicate name on one connector");

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        provisioning
            .list_servers(test_hub.admin, github.id())
            .await
            .expect("listing should succeed")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_server_is_not_found() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;

    let result = test_hub
        .hub
        .provisioning()
        .get_server(test_hub.admin, ServerId::new())
        .await;

    assert!(matches!(result, Err(ConnectorServiceError::ServerNotFound(_))));
}
