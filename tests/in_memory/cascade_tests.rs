//! Cascade tests for connector deletion under both policies.

use crate::in_memory::helpers::{SCHEMA_URL, TestHub, schema_document};
use connector_hub::connector::{
    domain::{CascadePolicy, ConnectorId, ConnectorName, SecretInput, SettableMode},
    ports::ConnectorStore,
    services::{CreateServerRequest, ErrorKind, RegisterConnectorRequest},
};
use rstest::rstest;
use serde_json::json;

/// Creates two servers and three grants on a fresh active connector.
async fn populated_connector(test_hub: &TestHub) -> ConnectorId {
    let connector = test_hub.register_active("GitHub").await;
    for name in ["acme", "globex"] {
        test_hub
            .hub
            .provisioning()
            .create_server(
                test_hub.admin,
                CreateServerRequest::new(connector.id(), name, json!({"org": name})),
            )
            .await
            .expect("server creation should succeed");
    }
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        let member = test_hub.add_user(email, false).await;
        test_hub
            .hub
            .access()
            .grant(test_hub.admin, member.id, connector.id())
            .await
            .expect("grant should succeed");
    }
    connector.id()
}

#[rstest]
#[case(CascadePolicy::HardDelete)]
#[case(CascadePolicy::SoftDisable)]
#[tokio::test(flavor = "multi_thread")]
async fn cascade_reports_every_dependent(#[case] policy: CascadePolicy) {
    let test_hub = TestHub::new(policy).await;
    let connector_id = populated_connector(&test_hub).await;

    let report = test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, connector_id)
        .await
        .expect("delete should succeed");

    assert_eq!(report.connector_id, connector_id);
    assert_eq!(report.policy, policy);
    assert_eq!(report.servers, 2);
    assert_eq!(report.tokens, 2);
    assert_eq!(report.tools, 6);
    assert_eq!(report.access_grants, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hard_delete_removes_every_row() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector_id = populated_connector(&test_hub).await;

    test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, connector_id)
        .await
        .expect("delete should succeed");

    let store = test_hub.hub.store();
    assert!(
        store
            .find_connector(connector_id)
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    assert!(
        store
            .list_servers(connector_id)
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    assert!(
        store
            .list_grants(connector_id)
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn soft_disable_flags_every_row_inactive() {
    let test_hub = TestHub::new(CascadePolicy::SoftDisable).await;
    let connector_id = populated_connector(&test_hub).await;

    test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, connector_id)
        .await
        .expect("delete should succeed");

    let store = test_hub.hub.store();
    let connector = store
        .find_connector(connector_id)
        .await
        .expect("lookup should succeed")
        .expect("soft-disabled connector is kept");
    assert!(!connector.is_active());

    let bundles = store
        .list_servers(connector_id)
        .await
        .expect("listing should succeed");
    assert_eq!(bundles.len(), 2);
    for bundle in &bundles {
        assert!(!bundle.server.is_active());
        assert!(bundle.tokens.iter().all(|token| !token.is_active));
        assert!(bundle.tools.iter().all(|tool| !tool.is_active));
    }

    let grants = store
        .list_grants(connector_id)
        .await
        .expect("listing should succeed");
    assert_eq!(grants.len(), 3);
    assert!(grants.iter().all(|view| !view.grant.is_active));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retired_connector_disappears_from_lifecycle_operations() {
    let test_hub = TestHub::new(CascadePolicy::SoftDisable).await;
    let connector = test_hub.register_active("Sentry").await;
    let lifecycle = test_hub.hub.lifecycle();

    lifecycle
        .delete(test_hub.admin, connector.id())
        .await
        .expect("delete should succeed");

    assert!(
        lifecycle
            .list(test_hub.admin)
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    let toggle = lifecycle
        .set_mode(test_hub.admin, connector.id(), SettableMode::Deactive)
        .await
        .expect_err("retired connector cannot change mode");
    assert_eq!(toggle.kind(), ErrorKind::NotFound);
    let again = lifecycle
        .delete(test_hub.admin, connector.id())
        .await
        .expect_err("retired connector cannot be deleted twice");
    assert_eq!(again.kind(), ErrorKind::NotFound);
}

#[rstest]
#[case(CascadePolicy::HardDelete)]
#[case(CascadePolicy::SoftDisable)]
#[tokio::test(flavor = "multi_thread")]
async fn connector_without_dependents_cascades_with_zero_counts(#[case] policy: CascadePolicy) {
    let test_hub = TestHub::new(policy).await;
    let registered = test_hub
        .hub
        .lifecycle()
        .register(test_hub.admin, RegisterConnectorRequest::new("Empty"))
        .await
        .expect("registration should succeed");

    let report = test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, registered.connector.id())
        .await
        .expect("delete should succeed");

    assert_eq!(
        (report.servers, report.tokens, report.tools, report.access_grants),
        (0, 0, 0, 0)
    );
}

#[rstest]
#[case(CascadePolicy::HardDelete)]
#[case(CascadePolicy::SoftDisable)]
#[tokio::test(flavor = "multi_thread")]
async fn server_without_tools_cascades(#[case] policy: CascadePolicy) {
    let test_hub = TestHub::new(policy).await;
    let templates_only = "https://schemas.example.com/templates-only.json";
    test_hub
        .source
        .publish(templates_only, schema_document(0))
        .expect("publishing should succeed");
    let lifecycle = test_hub.hub.lifecycle();
    let registered = lifecycle
        .register(test_hub.admin, RegisterConnectorRequest::new("Templates"))
        .await
        .expect("registration should succeed");
    let connector_id = registered.connector.id();
    lifecycle
        .activate(test_hub.admin, connector_id, templates_only)
        .await
        .expect("template-only schema should activate");
    let bundle = test_hub
        .hub
        .provisioning()
        .create_server(
            test_hub.admin,
            CreateServerRequest::new(connector_id, "acme", json!({"org": "acme"})),
        )
        .await
        .expect("server creation should succeed");
    assert!(bundle.tools.is_empty());

    let report = lifecycle
        .delete(test_hub.admin, connector_id)
        .await
        .expect("delete should succeed");

    assert_eq!(report.servers, 1);
    assert_eq!(report.tokens, 1);
    assert_eq!(report.tools, 0);
    let remaining = test_hub
        .hub
        .store()
        .list_servers(connector_id)
        .await
        .expect("listing should succeed");
    match policy {
        CascadePolicy::HardDelete => assert!(remaining.is_empty()),
        CascadePolicy::SoftDisable => {
            assert_eq!(remaining.len(), 1);
            assert!(remaining.iter().all(|kept| !kept.server.is_active()
                && kept.tools.is_empty()
                && kept.tokens.iter().all(|token| !token.is_active)));
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retired_connector_releases_name_and_secret() {
    let test_hub = TestHub::new(CascadePolicy::SoftDisable).await;
    let lifecycle = test_hub.hub.lifecycle();
    let secret = SecretInput::Provided("gh-app-secret-0001".to_owned());
    let request = || RegisterConnectorRequest::new("GitHub").with_secret(secret.clone());
    let retired = lifecycle
        .register(test_hub.admin, request())
        .await
        .expect("registration should succeed")
        .connector;
    lifecycle
        .delete(test_hub.admin, retired.id())
        .await
        .expect("delete should succeed");

    let replacement = lifecycle
        .register(test_hub.admin, request())
        .await
        .expect("name and secret are free again")
        .connector;

    let store = test_hub.hub.store();
    let by_name = store
        .find_connector_by_name(&ConnectorName::new("GitHub").expect("valid name"))
        .await
        .expect("lookup should succeed")
        .expect("live connector holds the name");
    assert_eq!(by_name.id(), replacement.id());
    assert!(
        store
            .find_connector(retired.id())
            .await
            .expect("lookup should succeed")
            .is_some_and(|kept| !kept.is_active())
    );
    let clash = lifecycle
        .register(test_hub.admin, request())
        .await
        .expect_err("the live replacement still holds the name");
    assert_eq!(clash.kind(), ErrorKind::Conflict);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_unknown_connector_is_not_found() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;

    let err = test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, ConnectorId::new())
        .await
        .expect_err("unknown connector");

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(test_hub.source.fetch_count(SCHEMA_URL), 0);
}
