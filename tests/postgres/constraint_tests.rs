//! Constraint mapping tests for [`PostgresConnectorStore`].
//!
//! [`PostgresConnectorStore`]: connector_hub::connector::adapters::postgres::PostgresConnectorStore

use crate::postgres::helpers::{BoxError, PgTestHub};
use connector_hub::connector::{
    domain::{
        AccessGrant, CascadePolicy, Connector, ConnectorId, ConnectorName, Email, SecretInput,
        UserAccount,
    },
    ports::{ConnectorStore, ConnectorStoreError},
    services::{CreateServerRequest, ErrorKind, RegisterConnectorRequest},
};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn duplicate_name_and_secret_map_to_conflicts() -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(CascadePolicy::HardDelete).await?;
    let lifecycle = test_hub.hub.lifecycle();
    let secret = SecretInput::Provided("pg-shared-secret".to_owned());
    lifecycle
        .register(
            test_hub.admin,
            RegisterConnectorRequest::new("Linear").with_secret(secret.clone()),
        )
        .await?;

    let same_name = lifecycle
        .register(test_hub.admin, RegisterConnectorRequest::new("Linear"))
        .await
        .expect_err("duplicate name");
    let same_secret = lifecycle
        .register(
            test_hub.admin,
            RegisterConnectorRequest::new("Height").with_secret(secret),
        )
        .await
        .expect_err("duplicate secret");

    assert_eq!(same_name.kind(), ErrorKind::Conflict);
    assert_eq!(same_secret.kind(), ErrorKind::Conflict);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn retired_name_and_secret_can_be_registered_again() -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(CascadePolicy::SoftDisable).await?;
    let lifecycle = test_hub.hub.lifecycle();
    let request = || {
        RegisterConnectorRequest::new("Linear")
            .with_secret(SecretInput::Provided("pg-reused-secret".to_owned()))
    };
    let retired = lifecycle.register(test_hub.admin, request()).await?.connector;
    lifecycle.delete(test_hub.admin, retired.id()).await?;

    let replacement = lifecycle.register(test_hub.admin, request()).await?.connector;

    let by_name = test_hub
        .hub
        .store()
        .find_connector_by_name(&ConnectorName::new("Linear")?)
        .await?;
    assert_eq!(by_name.as_ref().map(Connector::id), Some(replacement.id()));
    let clash = lifecycle
        .register(test_hub.admin, request())
        .await
        .expect_err("live replacement holds the name");
    assert_eq!(clash.kind(), ErrorKind::Conflict);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn duplicate_email_is_rejected() -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(CascadePolicy::HardDelete).await?;
    let duplicate = UserAccount::new(Email::new("ADMIN@example.com")?, "other", false);

    let result = test_hub.hub.store().insert_user(&duplicate).await;

    assert!(matches!(result, Err(ConnectorStoreError::DuplicateEmail(_))));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn grant_for_unknown_connector_is_not_found() -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(CascadePolicy::HardDelete).await?;
    let member = test_hub.add_member("dev@example.com").await?;
    let grant = AccessGrant::new(
        member.id,
        ConnectorId::new(),
        test_hub.admin.user_id,
        &DefaultClock,
    );

    let result = test_hub.hub.store().insert_grant(&grant).await;

    assert!(matches!(
        result,
        Err(ConnectorStoreError::ConnectorNotFound(_))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn duplicate_grant_and_server_name_conflict() -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(CascadePolicy::HardDelete).await?;
    let connector = test_hub.register_active("Linear").await?;
    let member = test_hub.add_member("dev@example.com").await?;
    let access = test_hub.hub.access();
    access
        .grant(test_hub.admin, member.id, connector.id())
        .await?;

    let grant = access
        .grant(test_hub.admin, member.id, connector.id())
        .await
        .expect_err("duplicate grant");
    assert_eq!(grant.kind(), ErrorKind::Conflict);

    let provisioning = test_hub.hub.provisioning();
    let request = CreateServerRequest::new(connector.id(), "main", json!({}));
    provisioning
        .create_server(test_hub.admin, request.clone())
        .await?;
    let server = provisioning
        .create_server(test_hub.admin, request)
        .await
        .expect_err("duplicate server name");
    assert_eq!(server.kind(), ErrorKind::Conflict);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires CONNECTOR_HUB_TEST_DATABASE_URL"]
async fn deleting_user_cascades_to_grants() -> Result<(), BoxError> {
    let test_hub = PgTestHub::new(CascadePolicy::HardDelete).await?;
    let connector = test_hub.register_active("Linear").await?;
    let member = test_hub.add_member("dev@example.com").await?;
    test_hub
        .hub
        .access()
        .grant(test_hub.admin, member.id, connector.id())
        .await?;

    let removed = test_hub.hub.store().delete_user(member.id).await?;

    assert_eq!(removed, 1);
    assert!(
        test_hub
            .hub
            .store()
            .granted_connector_ids(member.id)
            .await?
            .is_empty()
    );
    Ok(())
}
