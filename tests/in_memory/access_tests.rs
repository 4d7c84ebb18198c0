//! Access control tests: grants, revocation, listing and visibility.

use crate::in_memory::helpers::TestHub;
use connector_hub::connector::{
    domain::{CascadePolicy, ConnectorId, SettableMode, UserId},
    ports::ConnectorStore,
    services::{ErrorKind, RegisterConnectorRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_access_reports_grantee_and_granter() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("Notion").await;
    let member = test_hub.add_user("Writer@Example.com", false).await;
    let access = test_hub.hub.access();

    access
        .grant(test_hub.admin, member.id, connector.id())
        .await
        .expect("grant should succeed");

    let grants = access
        .list_access(test_hub.admin, connector.id())
        .await
        .expect("listing should succeed");
    assert_eq!(grants.len(), 1);
    let view = grants.first().expect("one grant");
    assert_eq!(view.grant.user_id, member.id);
    assert_eq!(view.grant.granted_by, test_hub.admin.user_id);
    assert_eq!(view.grantee_email.as_str(), "writer@example.com");
    assert_eq!(view.granter_email.as_str(), "admin@example.com");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn members_cannot_manage_access() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("Notion").await;
    let member = test_hub.add_user("member@example.com", false).await;
    let access = test_hub.hub.access();

    let grant = access
        .grant(member.identity(), member.id, connector.id())
        .await
        .expect_err("members cannot grant");
    let listing = access
        .list_access(member.identity(), connector.id())
        .await
        .expect_err("members cannot list grants");

    assert_eq!(grant.kind(), ErrorKind::Authorization);
    assert_eq!(listing.status_code(), 403);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn grant_requires_known_user_and_connector() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("Notion").await;
    let member = test_hub.add_user("member@example.com", false).await;
    let access = test_hub.hub.access();

    let unknown_user = access
        .grant(test_hub.admin, UserId::new(), connector.id())
        .await
        .expect_err("unknown user");
    let unknown_connector = access
        .grant(test_hub.admin, member.id, ConnectorId::new())
        .await
        .expect_err("unknown connector");

    assert_eq!(unknown_user.kind(), ErrorKind::NotFound);
    assert_eq!(unknown_connector.kind(), ErrorKind::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revoking_missing_grant_is_not_found() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("Notion").await;
    let member = test_hub.add_user("member@example.com", false).await;

    let err = test_hub
        .hub
        .access()
        .revoke(test_hub.admin, member.id, connector.id())
        .await
        .expect_err("nothing to revoke");

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn granted_connector_stays_visible_in_every_mode() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("Figma").await;
    let member = test_hub.add_user("designer@example.com", false).await;
    test_hub
        .hub
        .access()
        .grant(test_hub.admin, member.id, connector.id())
        .await
        .expect("grant should succeed");
    let lifecycle = test_hub.hub.lifecycle();

    lifecycle
        .set_mode(test_hub.admin, connector.id(), SettableMode::Deactive)
        .await
        .expect("switching off should succeed");

    let visible = lifecycle
        .list(member.identity())
        .await
        .expect("listing should succeed");
    assert_eq!(visible.len(), 1);
    lifecycle
        .get(member.identity(), connector.id())
        .await
        .expect("granted connector is readable while off");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn superusers_see_every_connector() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let lifecycle = test_hub.hub.lifecycle();
    for name in ["Zendesk", "Asana", "Miro"] {
        lifecycle
            .register(test_hub.admin, RegisterConnectorRequest::new(name))
            .await
            .expect("registration should succeed");
    }
    let other_admin = test_hub.add_user("root@example.com", true).await;

    let names: Vec<String> = lifecycle
        .list(other_admin.identity())
        .await
        .expect("listing should succeed")
        .iter()
        .map(|connector| connector.name().as_str().to_owned())
        .collect();

    assert_eq!(names, ["Asana", "Miro", "Zendesk"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_user_removes_their_grants() {
    let test_hub = TestHub::new(CascadePolicy::HardDelete).await;
    let connector = test_hub.register_active("Notion").await;
    let member = test_hub.add_user("leaver@example.com", false).await;
    let access = test_hub.hub.access();
    access
        .grant(test_hub.admin, member.id, connector.id())
        .await
        .expect("grant should succeed");

    let removed = test_hub
        .hub
        .store()
        .delete_user(member.id)
        .await
        .expect("user deletion should succeed");

    assert_eq!(removed, 1);
    assert!(
        access
            .list_access(test_hub.admin, connector.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}
