//! Lifecycle tests: registration conflicts, activation and concurrency.

use crate::in_memory::helpers::{SCHEMA_URL, TestHub, schema_document};
use async_trait::async_trait;
use connector_hub::connector::{
    adapters::memory::InMemoryConnectorStore,
    domain::{
        CascadePolicy, ConnectorMode, ConnectorUrl, PendingMode, SchemaDocument, SecretInput,
        SessionIdentity, SettableMode, UserId,
    },
    ports::{SchemaSource, SchemaSourceResult},
    services::{
        ConnectorLifecycleService, ConnectorServiceError, ErrorKind, RegisterConnectorRequest,
    },
};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use tokio::sync::Barrier;

/// Schema source whose fetches wait for each other at a barrier.
struct GatedSchemaSource {
    gate: Barrier,
    document: SchemaDocument,
}

#[async_trait]
impl SchemaSource for GatedSchemaSource {
    async fn fetch(&self, _url: &ConnectorUrl) -> SchemaSourceResult<SchemaDocument> {
        self.gate.wait().await;
        Ok(self.document.clone())
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_name_is_a_conflict() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let lifecycle = test_hub.hub.lifecycle();
    lifecycle
        .register(test_hub.admin, RegisterConnectorRequest::new("Linear"))
        .await
        .expect("first registration should succeed");

    let err = lifecycle
        .register(test_hub.admin, RegisterConnectorRequest::new("Linear"))
        .await
        .expect_err("duplicate name must conflict");

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.status_code(), 409);
    assert_eq!(
        lifecycle
            .list(test_hub.admin)
            .await
            .expect("listing should succeed")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn colliding_secret_is_a_conflict() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let lifecycle = test_hub.hub.lifecycle();
    let shared = SecretInput::Provided("s3cr3t-shared-between-two".to_owned());
    lifecycle
        .register(
            test_hub.admin,
            RegisterConnectorRequest::new("Jira").with_secret(shared.clone()),
        )
        .await
        .expect("first registration should succeed");

    let err = lifecycle
        .register(
            test_hub.admin,
            RegisterConnectorRequest::new("Confluence").with_secret(shared),
        )
        .await
        .expect_err("reused secret must conflict");

    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connectors_without_secrets_do_not_collide() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let lifecycle = test_hub.hub.lifecycle();

    for name in ["Jira", "Confluence"] {
        lifecycle
            .register(test_hub.admin, RegisterConnectorRequest::new(name))
            .await
            .expect("registration without secret should succeed");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activation_stores_schema_metadata() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;

    let connector = test_hub.register_active("GitHub").await;

    assert_eq!(connector.mode(), ConnectorMode::Active);
    assert_eq!(connector.url(), Some(SCHEMA_URL));
    assert_eq!(connector.version(), Some("2024.06"));
    assert_eq!(connector.tools().len(), 3);
    assert_eq!(connector.templates().len(), 1);
    assert_eq!(test_hub.source.fetch_count(SCHEMA_URL), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_fetch_keeps_connector_inactive() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let broken = "https://schemas.example.com/broken.json";
    test_hub
        .source
        .fail_with_status(broken, 502)
        .expect("stubbing should succeed");
    let lifecycle = test_hub.hub.lifecycle();
    let registered = lifecycle
        .register(test_hub.admin, RegisterConnectorRequest::new("Broken"))
        .await
        .expect("registration should succeed");

    let err = lifecycle
        .activate(test_hub.admin, registered.connector.id(), broken)
        .await
        .expect_err("502 must fail activation");

    assert_eq!(err.kind(), ErrorKind::Activation);
    let stored = lifecycle
        .get(test_hub.admin, registered.connector.id())
        .await
        .expect("connector should still exist");
    assert_eq!(stored.mode(), ConnectorMode::Deactive);
    assert!(stored.url().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unpublished_url_is_an_activation_error() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let lifecycle = test_hub.hub.lifecycle();
    let registered = lifecycle
        .register(test_hub.admin, RegisterConnectorRequest::new("Offline"))
        .await
        .expect("registration should succeed");

    let result = lifecycle
        .activate(
            test_hub.admin,
            registered.connector.id(),
            "https://nowhere.example.com/schema.json",
        )
        .await;

    assert!(matches!(
        result,
        Err(ConnectorServiceError::SchemaUnavailable(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_activations_commit_exactly_once() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let lifecycle = test_hub.hub.lifecycle();
    let connector_id = lifecycle
        .register(test_hub.admin, RegisterConnectorRequest::new("Racy"))
        .await
        .expect("registration should succeed")
        .connector
        .id();

    let (first, second) = tokio::join!(
        lifecycle.activate(test_hub.admin, connector_id, SCHEMA_URL),
        lifecycle.activate(test_hub.admin, connector_id, SCHEMA_URL),
    );

    let outcomes = [first, second];
    let committed = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(committed, 1, "exactly one activation commits");
    let loser = outcomes
        .iter()
        .find_map(|outcome| outcome.as_ref().err())
        .expect("one activation must lose");
    assert_eq!(loser.kind(), ErrorKind::InvalidState);

    let stored = lifecycle
        .get(test_hub.admin, connector_id)
        .await
        .expect("connector should exist");
    assert_eq!(stored.mode(), ConnectorMode::Active);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activations_racing_past_the_mode_check_commit_once() {
    let source = GatedSchemaSource {
        gate: Barrier::new(2),
        document: schema_document(2),
    };
    let lifecycle = ConnectorLifecycleService::new(
        Arc::new(InMemoryConnectorStore::new()),
        Arc::new(source),
        Arc::new(DefaultClock),
        CascadePolicy::HardDelete,
    );
    let admin = SessionIdentity::superuser(UserId::new());
    let connector_id = lifecycle
        .register(admin, RegisterConnectorRequest::new("Racy"))
        .await
        .expect("registration should succeed")
        .connector
        .id();

    let (first, second) = tokio::join!(
        lifecycle.activate(admin, connector_id, SCHEMA_URL),
        lifecycle.activate(admin, connector_id, SCHEMA_URL),
    );

    let outcomes = [first, second];
    assert_eq!(
        outcomes.iter().filter(|outcome| outcome.is_ok()).count(),
        1,
        "exactly one activation commits"
    );
    let loser = outcomes
        .iter()
        .find_map(|outcome| outcome.as_ref().err())
        .expect("one activation must lose");
    assert!(matches!(
        loser,
        ConnectorServiceError::ConcurrentModification {
            connector_id: conflicted,
            expected: ConnectorMode::Deactive,
        } if *conflicted == connector_id
    ));
    assert_eq!(loser.kind(), ErrorKind::InvalidState);
    assert_eq!(loser.status_code(), 409);

    let stored = lifecycle
        .get(admin, connector_id)
        .await
        .expect("connector should exist");
    assert_eq!(stored.mode(), ConnectorMode::Active);
    assert_eq!(stored.tools().len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sync_connector_cannot_be_switched_on_directly() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let lifecycle = test_hub.hub.lifecycle();
    let connector_id = lifecycle
        .register(
            test_hub.admin,
            RegisterConnectorRequest::new("Pending").with_initial_mode(PendingMode::Sync),
        )
        .await
        .expect("registration should succeed")
        .connector
        .id();

    let err = lifecycle
        .set_mode(test_hub.admin, connector_id, SettableMode::Active)
        .await
        .expect_err("sync cannot jump to active");
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let deactivated = lifecycle
        .set_mode(test_hub.admin, connector_id, SettableMode::Deactive)
        .await
        .expect("sync may move to deactive");
    assert_eq!(deactivated.mode(), ConnectorMode::Deactive);
}
