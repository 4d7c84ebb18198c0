//! `PostgreSQL` entity store for connectors and their dependents.

use super::{
    models::{
        AccessGrantRow, ConnectorRow, ConnectorStateChangeset, ServerRow, ServerTokenRow,
        ServerToolRow, UserRow,
    },
    schema::{connector_access, connectors, server_tokens, server_tools, servers, users},
};
use crate::connector::{
    domain::{
        AccessGrant, AccessGrantId, AccessGrantView, Activation, CascadePolicy, CascadeReport,
        Connector, ConnectorId, ConnectorMode, ConnectorName, ConnectorState, Email,
        PersistedActivationData, PersistedConnectorData, PersistedServerData, SecretFingerprint,
        Server, ServerBundle, ServerId, ServerName, ServerToken, ServerTokenId, ServerTool,
        ServerToolId, UserAccount, UserId,
    },
    ports::{ConnectorStore, ConnectorStoreError, ConnectorStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// `PostgreSQL` connection pool type for connector adapters.
pub type ConnectorPgPool = Pool<ConnectionManager<PgConnection>>;

const CONNECTOR_NAME_INDEX: &str = "idx_connectors_name";
const CONNECTOR_SECRET_INDEX: &str = "idx_connectors_secret_fingerprint";
const SERVER_NAME_INDEX: &str = "idx_servers_connector_name";
const GRANT_PAIR_INDEX: &str = "idx_connector_access_user_connector";
const USER_EMAIL_INDEX: &str = "idx_users_email";
const GRANT_CONNECTOR_FK: &str = "fk_connector_access_connector";
const GRANT_USER_FK: &str = "fk_connector_access_user";
const GRANT_GRANTER_FK: &str = "fk_connector_access_granted_by";

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns [`ConnectorStoreError::Persistence`] when the pool cannot open its
/// initial connections.
pub fn pool_from_url(
    database_url: &str,
    max_connections: u32,
) -> ConnectorStoreResult<ConnectorPgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_connections)
        .build(manager)
        .map_err(ConnectorStoreError::persistence)
}

/// `PostgreSQL`-backed entity store.
///
/// Multi-row operations run inside one transaction and lock the owning
/// connector row with `SELECT ... FOR UPDATE`.
#[derive(Debug, Clone)]
pub struct PostgresConnectorStore {
    pool: ConnectorPgPool,
}

impl PostgresConnectorStore {
    /// Creates a new store from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: ConnectorPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> ConnectorStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ConnectorStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ConnectorStoreError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(ConnectorStoreError::persistence)?
    }
}

impl From<DieselError> for ConnectorStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl ConnectorStore for PostgresConnectorStore {
    async fn insert_connector(&self, connector: &Connector) -> ConnectorStoreResult<()> {
        let row = connector_to_row(connector)?;
        let name = connector.name().clone();

        self.run_blocking(move |connection| {
            diesel::insert_into(connectors::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    classify_violation(err, |constraint| match constraint {
                        CONNECTOR_NAME_INDEX => {
                            Some(ConnectorStoreError::DuplicateName(name.clone()))
                        }
                        CONNECTOR_SECRET_INDEX => Some(ConnectorStoreError::DuplicateSecret),
                        _ => None,
                    })
                })?;
            Ok(())
        })
        .await
    }

    async fn find_connector(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Option<Connector>> {
        self.run_blocking(move |connection| {
            let row = connectors::table
                .filter(connectors::id.eq(connector_id.into_inner()))
                .select(ConnectorRow::as_select())
                .first::<ConnectorRow>(connection)
                .optional()?;
            row.map(row_to_connector).transpose()
        })
        .await
    }

    async fn find_connector_by_name(
        &self,
        name: &ConnectorName,
    ) -> ConnectorStoreResult<Option<Connector>> {
        let raw_name = name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = connectors::table
                .filter(connectors::name.eq(&raw_name))
                .filter(connectors::is_active.eq(true))
                .select(ConnectorRow::as_select())
                .first::<ConnectorRow>(connection)
                .optional()?;
            row.map(row_to_connector).transpose()
        })
        .await
    }

    async fn list_connectors(&self) -> ConnectorStoreResult<Vec<Connector>> {
        self.run_blocking(move |connection| {
            let rows = connectors::table
                .order(connectors::name.asc())
                .select(ConnectorRow::as_select())
                .load::<ConnectorRow>(connection)?;
            rows.into_iter().map(row_to_connector).collect()
        })
        .await
    }

    async fn transition_connector(
        &self,
        connector: &Connector,
        expected_mode: ConnectorMode,
    ) -> ConnectorStoreResult<()> {
        let connector_id = connector.id();
        let changeset = state_changeset(connector)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, ConnectorStoreError, _>(|tx| {
                let updated = diesel::update(
                    connectors::table
                        .filter(connectors::id.eq(connector_id.into_inner()))
                        .filter(connectors::mode.eq(expected_mode.as_str()))
                        .filter(connectors::is_active.eq(true)),
                )
                .set(&changeset)
                .execute(tx)?;
                if updated > 0 {
                    return Ok(());
                }

                let still_live: bool = diesel::select(diesel::dsl::exists(
                    connectors::table
                        .filter(connectors::id.eq(connector_id.into_inner()))
                        .filter(connectors::is_active.eq(true)),
                ))
                .get_result(tx)?;
                if still_live {
                    Err(ConnectorStoreError::ModeConflict {
                        connector_id,
                        expected: expected_mode,
                    })
                } else {
                    Err(ConnectorStoreError::ConnectorNotFound(connector_id))
                }
            })
        })
        .await
    }

    async fn cascade_connector(
        &self,
        connector_id: ConnectorId,
        policy: CascadePolicy,
        at: DateTime<Utc>,
    ) -> ConnectorStoreResult<CascadeReport> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, ConnectorStoreError, _>(|tx| {
                let raw_id = connector_id.into_inner();
                let locked = connectors::table
                    .filter(connectors::id.eq(raw_id))
                    .filter(connectors::is_active.eq(true))
                    .select(connectors::id)
                    .for_update()
                    .first::<Uuid>(tx)
                    .optional()?;
                if locked.is_none() {
                    return Err(ConnectorStoreError::ConnectorNotFound(connector_id));
                }

                let server_ids = servers::table
                    .filter(servers::connector_id.eq(raw_id))
                    .select(servers::id)
                    .load::<Uuid>(tx)?;

                let mut report = CascadeReport::empty(connector_id, policy);
                match policy {
                    CascadePolicy::HardDelete => {
                        hard_delete(tx, raw_id, &server_ids, &mut report)?;
                    }
                    CascadePolicy::SoftDisable => {
                        soft_disable(tx, raw_id, &server_ids, at, &mut report)?;
                    }
                }
                Ok(report)
            })
        })
        .await
    }

    async fn insert_server(&self, bundle: &ServerBundle) -> ConnectorStoreResult<()> {
        let connector_id = bundle.server.connector_id();
        let server_name = bundle.server.name().clone();
        let (server_row, token_rows, tool_rows) = bundle_to_rows(bundle)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, ConnectorStoreError, _>(|tx| {
                let stored_mode = connectors::table
                    .filter(connectors::id.eq(connector_id.into_inner()))
                    .filter(connectors::is_active.eq(true))
                    .select(connectors::mode)
                    .for_update()
                    .first::<String>(tx)
                    .optional()?
                    .ok_or(ConnectorStoreError::ConnectorNotFound(connector_id))?;
                let current_mode = ConnectorMode::try_from(stored_mode.as_str())
                    .map_err(ConnectorStoreError::invalid_persisted_data)?;
                if current_mode != ConnectorMode::Active {
                    return Err(ConnectorStoreError::ConnectorNotActive {
                        connector_id,
                        mode: current_mode,
                    });
                }

                diesel::insert_into(servers::table)
                    .values(&server_row)
                    .execute(tx)
                    .map_err(|err| {
                        classify_violation(err, |constraint| {
                            (constraint == SERVER_NAME_INDEX).then(|| {
                                ConnectorStoreError::DuplicateServerName {
                                    connector_id,
                                    name: server_name.clone(),
                                }
                            })
                        })
                    })?;
                diesel::insert_into(server_tokens::table)
                    .values(&token_rows)
                    .execute(tx)?;
                diesel::insert_into(server_tools::table)
                    .values(&tool_rows)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_server(&self, server_id: ServerId) -> ConnectorStoreResult<Option<ServerBundle>> {
        self.run_blocking(move |connection| {
            let row = servers::table
                .filter(servers::id.eq(server_id.into_inner()))
                .select(ServerRow::as_select())
                .first::<ServerRow>(connection)
                .optional()?;
            let Some(server_row) = row else {
                return Ok(None);
            };
            Ok(load_bundles(connection, vec![server_row])?.into_iter().next())
        })
        .await
    }

    async fn list_servers(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Vec<ServerBundle>> {
        self.run_blocking(move |connection| {
            let rows = servers::table
                .filter(servers::connector_id.eq(connector_id.into_inner()))
                .order(servers::name.asc())
                .select(ServerRow::as_select())
                .load::<ServerRow>(connection)?;
            load_bundles(connection, rows)
        })
        .await
    }

    async fn insert_grant(&self, grant: &AccessGrant) -> ConnectorStoreResult<()> {
        let row = grant_to_row(grant);
        let (user_id, connector_id, granted_by) =
            (grant.user_id, grant.connector_id, grant.granted_by);

        self.run_blocking(move |connection| {
            diesel::insert_into(connector_access::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    classify_violation(err, |constraint| match constraint {
                        GRANT_PAIR_INDEX => Some(ConnectorStoreError::DuplicateGrant {
                            user_id,
                            connector_id,
                        }),
                        GRANT_CONNECTOR_FK => {
                            Some(ConnectorStoreError::ConnectorNotFound(connector_id))
                        }
                        GRANT_USER_FK => Some(ConnectorStoreError::UserNotFound(user_id)),
                        GRANT_GRANTER_FK => Some(ConnectorStoreError::UserNotFound(granted_by)),
                        _ => None,
                    })
                })?;
            Ok(())
        })
        .await
    }

    async fn delete_grant(
        &self,
        user_id: UserId,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<AccessGrant> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                connector_access::table
                    .filter(connector_access::user_id.eq(user_id.into_inner()))
                    .filter(connector_access::connector_id.eq(connector_id.into_inner()))
                    .filter(connector_access::is_active.eq(true)),
            )
            .returning(AccessGrantRow::as_returning())
            .get_result::<AccessGrantRow>(connection)
            .optional()?;

            removed.map(row_to_grant).ok_or(ConnectorStoreError::GrantNotFound {
                user_id,
                connector_id,
            })
        })
        .await
    }

    async fn list_grants(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Vec<AccessGrantView>> {
        self.run_blocking(move |connection| {
            let rows = connector_access::table
                .filter(connector_access::connector_id.eq(connector_id.into_inner()))
                .order(connector_access::created_at.asc())
                .select(AccessGrantRow::as_select())
                .load::<AccessGrantRow>(connection)?;

            let user_ids: HashSet<Uuid> = rows
                .iter()
                .flat_map(|row| [row.user_id, row.granted_by])
                .collect();
            let emails: HashMap<Uuid, String> = users::table
                .filter(users::id.eq_any(user_ids))
                .select((users::id, users::email))
                .load::<(Uuid, String)>(connection)?
                .into_iter()
                .collect();

            rows.into_iter()
                .map(|row| {
                    let grant = row_to_grant(row);
                    Ok(AccessGrantView {
                        grantee_email: lookup_email(&emails, grant.user_id)?,
                        granter_email: lookup_email(&emails, grant.granted_by)?,
                        grant,
                    })
                })
                .collect()
        })
        .await
    }

    async fn granted_connector_ids(
        &self,
        user_id: UserId,
    ) -> ConnectorStoreResult<HashSet<ConnectorId>> {
        self.run_blocking(move |connection| {
            let ids = connector_access::table
                .filter(connector_access::user_id.eq(user_id.into_inner()))
                .filter(connector_access::is_active.eq(true))
                .select(connector_access::connector_id)
                .load::<Uuid>(connection)?;
            Ok(ids.into_iter().map(ConnectorId::from_uuid).collect())
        })
        .await
    }

    async fn insert_user(&self, user: &UserAccount) -> ConnectorStoreResult<()> {
        let row = UserRow {
            id: user.id.into_inner(),
            email: user.email.as_str().to_owned(),
            credential_hash: user.credential_hash.clone(),
            is_superuser: user.is_superuser,
            is_active: user.is_active,
        };
        let email = user.email.clone();

        self.run_blocking(move |connection| {
            diesel::insert_into(users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    classify_violation(err, |constraint| {
                        (constraint == USER_EMAIL_INDEX)
                            .then(|| ConnectorStoreError::DuplicateEmail(email.clone()))
                    })
                })?;
            Ok(())
        })
        .await
    }

    async fn find_user(&self, user_id: UserId) -> ConnectorStoreResult<Option<UserAccount>> {
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::id.eq(user_id.into_inner()))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn delete_user(&self, user_id: UserId) -> ConnectorStoreResult<usize> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, ConnectorStoreError, _>(|tx| {
                let raw_id = user_id.into_inner();
                let removed_grants = diesel::delete(
                    connector_access::table.filter(
                        connector_access::user_id
                            .eq(raw_id)
                            .or(connector_access::granted_by.eq(raw_id)),
                    ),
                )
                .execute(tx)?;
                let removed_users =
                    diesel::delete(users::table.filter(users::id.eq(raw_id))).execute(tx)?;
                if removed_users == 0 {
                    return Err(ConnectorStoreError::UserNotFound(user_id));
                }
                Ok(removed_grants)
            })
        })
        .await
    }
}

fn hard_delete(
    tx: &mut PgConnection,
    connector_id: Uuid,
    server_ids: &[Uuid],
    report: &mut CascadeReport,
) -> ConnectorStoreResult<()> {
    report.tokens =
        diesel::delete(server_tokens::table.filter(server_tokens::server_id.eq_any(server_ids)))
            .execute(tx)?;
    report.tools =
        diesel::delete(server_tools::table.filter(server_tools::server_id.eq_any(server_ids)))
            .execute(tx)?;
    report.servers =
        diesel::delete(servers::table.filter(servers::connector_id.eq(connector_id)))
            .execute(tx)?;
    report.access_grants = diesel::delete(
        connector_access::table.filter(connector_access::connector_id.eq(connector_id)),
    )
    .execute(tx)?;
    diesel::delete(connectors::table.filter(connectors::id.eq(connector_id))).execute(tx)?;
    Ok(())
}

fn soft_disable(
    tx: &mut PgConnection,
    connector_id: Uuid,
    server_ids: &[Uuid],
    at: DateTime<Utc>,
    report: &mut CascadeReport,
) -> ConnectorStoreResult<()> {
    report.tokens =
        diesel::update(server_tokens::table.filter(server_tokens::server_id.eq_any(server_ids)))
            .set(server_tokens::is_active.eq(false))
            .execute(tx)?;
    report.tools =
        diesel::update(server_tools::table.filter(server_tools::server_id.eq_any(server_ids)))
            .set(server_tools::is_active.eq(false))
            .execute(tx)?;
    report.servers =
        diesel::update(servers::table.filter(servers::connector_id.eq(connector_id)))
            .set((servers::is_active.eq(false), servers::updated_at.eq(at)))
            .execute(tx)?;
    report.access_grants = diesel::update(
        connector_access::table.filter(connector_access::connector_id.eq(connector_id)),
    )
    .set(connector_access::is_active.eq(false))
    .execute(tx)?;
    diesel::update(connectors::table.filter(connectors::id.eq(connector_id)))
        .set((connectors::is_active.eq(false), connectors::updated_at.eq(at)))
        .execute(tx)?;
    Ok(())
}

fn load_bundles(
    connection: &mut PgConnection,
    rows: Vec<ServerRow>,
) -> ConnectorStoreResult<Vec<ServerBundle>> {
    let server_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

    let mut tokens: HashMap<Uuid, Vec<ServerToken>> = HashMap::new();
    for token_row in server_tokens::table
        .filter(server_tokens::server_id.eq_any(&server_ids))
        .order(server_tokens::created_at.asc())
        .select(ServerTokenRow::as_select())
        .load::<ServerTokenRow>(connection)?
    {
        tokens
            .entry(token_row.server_id)
            .or_default()
            .push(row_to_token(token_row));
    }

    let mut tools: HashMap<Uuid, Vec<ServerTool>> = HashMap::new();
    for tool_row in server_tools::table
        .filter(server_tools::server_id.eq_any(&server_ids))
        .select(ServerToolRow::as_select())
        .load::<ServerToolRow>(connection)?
    {
        let server_id = tool_row.server_id;
        tools.entry(server_id).or_default().push(row_to_tool(tool_row)?);
    }

    rows.into_iter()
        .map(|row| {
            let raw_id = row.id;
            Ok(ServerBundle {
                server: row_to_server(row)?,
                tokens: tokens.remove(&raw_id).unwrap_or_default(),
                tools: tools.remove(&raw_id).unwrap_or_default(),
            })
        })
        .collect()
}

fn classify_violation(
    err: DieselError,
    by_constraint: impl FnOnce(&str) -> Option<ConnectorStoreError>,
) -> ConnectorStoreError {
    let mapped = match &err {
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
            info,
        ) => info.constraint_name().and_then(by_constraint),
        _ => None,
    };
    mapped.unwrap_or_else(|| ConnectorStoreError::persistence(err))
}

fn state_changeset(connector: &Connector) -> ConnectorStoreResult<ConnectorStateChangeset> {
    let (activation, suspended) = match connector.state() {
        ConnectorState::Sync => (None, None),
        ConnectorState::Deactive { suspended } => (None, suspended.as_ref()),
        ConnectorState::Active(activation) => (Some(activation), None),
    };

    let tools = serde_json::to_value(activation.map(Activation::tools).unwrap_or_default())
        .map_err(ConnectorStoreError::persistence)?;
    let templates =
        serde_json::to_value(activation.map(Activation::templates).unwrap_or_default())
            .map_err(ConnectorStoreError::persistence)?;
    let suspended_activation = suspended
        .map(serde_json::to_value)
        .transpose()
        .map_err(ConnectorStoreError::persistence)?;

    Ok(ConnectorStateChangeset {
        mode: connector.mode().as_str().to_owned(),
        url: activation.map(|active| active.url().to_owned()),
        version: activation.map(|active| active.version().to_owned()),
        tools,
        templates,
        config_schema: activation.and_then(Activation::config_schema).cloned(),
        activated_at: activation.map(Activation::activated_at),
        suspended_activation,
        updated_at: connector.updated_at(),
    })
}

fn connector_to_row(connector: &Connector) -> ConnectorStoreResult<ConnectorRow> {
    let ConnectorStateChangeset {
        mode,
        url,
        version,
        tools,
        templates,
        config_schema,
        activated_at,
        suspended_activation,
        updated_at,
    } = state_changeset(connector)?;

    Ok(ConnectorRow {
        id: connector.id().into_inner(),
        name: connector.name().as_str().to_owned(),
        description: connector.description().to_owned(),
        mode,
        url,
        version,
        tools,
        templates,
        config_schema,
        activated_at,
        suspended_activation,
        secret_fingerprint: connector
            .secret_fingerprint()
            .map(|fingerprint| fingerprint.as_str().to_owned()),
        created_at: connector.created_at(),
        updated_at,
        is_active: connector.is_active(),
    })
}

fn row_to_connector(row: ConnectorRow) -> ConnectorStoreResult<Connector> {
    let ConnectorRow {
        id,
        name,
        description,
        mode,
        url,
        version,
        tools,
        templates,
        config_schema,
        activated_at,
        suspended_activation,
        secret_fingerprint,
        created_at,
        updated_at,
        is_active,
    } = row;

    let parsed_name =
        ConnectorName::new(name).map_err(ConnectorStoreError::invalid_persisted_data)?;
    let parsed_mode = ConnectorMode::try_from(mode.as_str())
        .map_err(ConnectorStoreError::invalid_persisted_data)?;

    let state = match parsed_mode {
        ConnectorMode::Sync => ConnectorState::Sync,
        ConnectorMode::Deactive => ConnectorState::Deactive {
            suspended: suspended_activation
                .map(serde_json::from_value::<Activation>)
                .transpose()
                .map_err(ConnectorStoreError::invalid_persisted_data)?,
        },
        ConnectorMode::Active => {
            ConnectorState::Active(Activation::from_persisted(PersistedActivationData {
                url: required_column(url, "url")?,
                version: required_column(version, "version")?,
                tools: serde_json::from_value(tools)
                    .map_err(ConnectorStoreError::invalid_persisted_data)?,
                templates: serde_json::from_value(templates)
                    .map_err(ConnectorStoreError::invalid_persisted_data)?,
                config_schema,
                activated_at: required_column(activated_at, "activated_at")?,
            }))
        }
    };

    Ok(Connector::from_persisted(PersistedConnectorData {
        id: ConnectorId::from_uuid(id),
        name: parsed_name,
        description,
        state,
        secret_fingerprint: secret_fingerprint.map(SecretFingerprint::from_persisted),
        created_at,
        updated_at,
        is_active,
    }))
}

fn required_column<T>(value: Option<T>, column: &'static str) -> ConnectorStoreResult<T> {
    value.ok_or_else(|| {
        ConnectorStoreError::invalid_persisted_data(std::io::Error::other(format!(
            "active connector row has no {column}"
        )))
    })
}

fn bundle_to_rows(
    bundle: &ServerBundle,
) -> ConnectorStoreResult<(ServerRow, Vec<ServerTokenRow>, Vec<ServerToolRow>)> {
    let server = &bundle.server;
    let server_row = ServerRow {
        id: server.id().into_inner(),
        connector_id: server.connector_id().into_inner(),
        name: server.name().as_str().to_owned(),
        configuration: server.configuration().clone(),
        created_at: server.created_at(),
        updated_at: server.updated_at(),
        is_active: server.is_active(),
    };
    let token_rows = bundle
        .tokens
        .iter()
        .map(|token| ServerTokenRow {
            id: token.id.into_inner(),
            server_id: token.server_id.into_inner(),
            value: token.value.clone(),
            expires_at: token.expires_at,
            is_active: token.is_active,
            created_at: token.created_at,
        })
        .collect();
    let tool_rows = bundle
        .tools
        .iter()
        .map(|tool| {
            Ok(ServerToolRow {
                id: tool.id.into_inner(),
                server_id: tool.server_id.into_inner(),
                definition: serde_json::to_value(&tool.definition)
                    .map_err(ConnectorStoreError::persistence)?,
                is_active: tool.is_active,
            })
        })
        .collect::<ConnectorStoreResult<Vec<_>>>()?;
    Ok((server_row, token_rows, tool_rows))
}

fn row_to_server(row: ServerRow) -> ConnectorStoreResult<Server> {
    let name = ServerName::new(row.name).map_err(ConnectorStoreError::invalid_persisted_data)?;
    Ok(Server::from_persisted(PersistedServerData {
        id: ServerId::from_uuid(row.id),
        connector_id: ConnectorId::from_uuid(row.connector_id),
        name,
        configuration: row.configuration,
        created_at: row.created_at,
        updated_at: row.updated_at,
        is_active: row.is_active,
    }))
}

fn row_to_token(row: ServerTokenRow) -> ServerToken {
    ServerToken {
        id: ServerTokenId::from_uuid(row.id),
        server_id: ServerId::from_uuid(row.server_id),
        value: row.value,
        expires_at: row.expires_at,
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

fn row_to_tool(row: ServerToolRow) -> ConnectorStoreResult<ServerTool> {
    Ok(ServerTool {
        id: ServerToolId::from_uuid(row.id),
        server_id: ServerId::from_uuid(row.server_id),
        definition: serde_json::from_value(row.definition)
            .map_err(ConnectorStoreError::invalid_persisted_data)?,
        is_active: row.is_active,
    })
}

fn grant_to_row(grant: &AccessGrant) -> AccessGrantRow {
    AccessGrantRow {
        id: grant.id.into_inner(),
        user_id: grant.user_id.into_inner(),
        connector_id: grant.connector_id.into_inner(),
        granted_by: grant.granted_by.into_inner(),
        created_at: grant.created_at,
        is_active: grant.is_active,
    }
}

fn row_to_grant(row: AccessGrantRow) -> AccessGrant {
    AccessGrant {
        id: AccessGrantId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        connector_id: ConnectorId::from_uuid(row.connector_id),
        granted_by: UserId::from_uuid(row.granted_by),
        created_at: row.created_at,
        is_active: row.is_active,
    }
}

fn row_to_user(row: UserRow) -> ConnectorStoreResult<UserAccount> {
    Ok(UserAccount {
        id: UserId::from_uuid(row.id),
        email: Email::new(row.email).map_err(ConnectorStoreError::invalid_persisted_data)?,
        credential_hash: row.credential_hash,
        is_superuser: row.is_superuser,
        is_active: row.is_active,
    })
}

fn lookup_email(emails: &HashMap<Uuid, String>, user_id: UserId) -> ConnectorStoreResult<Email> {
    let raw = emails
        .get(&user_id.into_inner())
        .ok_or(ConnectorStoreError::UserNotFound(user_id))?;
    Email::new(raw.as_str()).map_err(ConnectorStoreError::invalid_persisted_data)
}
