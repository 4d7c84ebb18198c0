//! Transactional cascade tests against `PostgreSQL`.

use crate::postgres::helpers::{BoxError, PgTestHub};
use connector_hub::connector::{
    domain::{CascadePolicy, ConnectorId},
    ports::ConnectorStore,
    services::{CreateServerRequest, ErrorKind},
};
use rstest::rstest;
use serde_json::json;

async fn populate(test_hub: &PgTestHub) -> Result<ConnectorId, BoxError> {
    let connector = test_hub.register_active("Linear").await?;
    for name in ["alpha", "beta"] {
        test_hub
            .hub
            .provisioning()
            .create_server(
                test_hub.admin,
                CreateServerRequest::new(connector.id(), name, json!({})),
            )
            .await?;
    }
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        let member = test_hub.add_member(email).await?;
        test_hub
            .hub
            .access()
            .grant(test_hub.admin, member.id, connector.id())
            .await?;
    }
    Ok(connector.id())
}

#[rstest]
#[case(CascadePolicy::HardDelete)]
#[case(CascadePolicy::SoftDisable)]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn cascade_counts_match_dependents(#[case] policy: CascadePolicy) -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(policy).await?;
    let connector_id = populate(&test_hub).await?;

    let report = test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, connector_id)
        .await?;

    assert_eq!(
        (report.servers, report.tokens, report.tools, report.access_grants),
        (2, 2, 4, 3)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn hard_delete_leaves_no_rows() -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(CascadePolicy::HardDelete).await?;
    let connector_id = populate(&test_hub).await?;

    test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, connector_id)
        .await?;

    let store = test_hub.hub.store();
    assert!(store.find_connector(connector_id).await?.is_none());
    assert!(store.list_servers(connector_id).await?.is_empty());
    assert!(store.list_grants(connector_id).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn soft_disable_keeps_rows_inactive() -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(CascadePolicy::SoftDisable).await?;
    let connector_id = populate(&test_hub).await?;

    test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, connector_id)
        .await?;

    let store = test_hub.hub.store();
    let connector = store
        .find_connector(connector_id)
        .await?
        .ok_or("connector row should remain")?;
    assert!(!connector.is_active());
    let bundles = store.list_servers(connector_id).await?;
    assert_eq!(bundles.len(), 2);
    assert!(bundles.iter().all(|bundle| {
        !bundle.server.is_active()
            && bundle.tokens.iter().all(|token| !token.is_active)
            && bundle.tools.iter().all(|tool| !tool.is_active)
    }));
    assert!(
        store
            .list_grants(connector_id)
            .await?
            .iter()
            .all(|view| !view.grant.is_active)
    );

    let again = test_hub
        .hub
        .lifecycle()
        .delete(test_hub.admin, connector_id)
        .await
        .expect_err("retired connector is gone");
    assert_eq!(again.kind(), ErrorKind::NotFound);
    Ok(())
}
