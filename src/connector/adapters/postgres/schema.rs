//! Diesel schema for connector persistence.

diesel::table! {
    /// User accounts referenced by access grants.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Unique lowercased email.
        #[max_length = 320]
        email -> Varchar,
        /// Opaque credential hash.
        credential_hash -> Text,
        /// Superuser flag.
        is_superuser -> Bool,
        /// Account enabled flag.
        is_active -> Bool,
    }
}

diesel::table! {
    /// Connector definitions.
    connectors (id) {
        /// Connector identifier.
        id -> Uuid,
        /// Unique connector name.
        #[max_length = 100]
        name -> Varchar,
        /// Free-form description.
        description -> Text,
        /// Lifecycle mode (`sync`, `deactive`, `active`).
        #[max_length = 20]
        mode -> Varchar,
        /// Schema URL, set only while active.
        url -> Nullable<Text>,
        /// Connector version, set only while active.
        #[max_length = 100]
        version -> Nullable<Varchar>,
        /// Tool definitions, non-empty only while active.
        tools -> Jsonb,
        /// Template definitions, non-empty only while active.
        templates -> Jsonb,
        /// Server configuration schema published at activation.
        config_schema -> Nullable<Jsonb>,
        /// Activation timestamp.
        activated_at -> Nullable<Timestamptz>,
        /// Activation retained while toggled off.
        suspended_activation -> Nullable<Jsonb>,
        /// SHA-256 fingerprint of the connector secret.
        #[max_length = 64]
        secret_fingerprint -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-delete flag.
        is_active -> Bool,
    }
}

diesel::table! {
    /// Servers instantiated from connectors.
    servers (id) {
        /// Server identifier.
        id -> Uuid,
        /// Owning connector.
        connector_id -> Uuid,
        /// Server name, unique per connector.
        #[max_length = 100]
        name -> Varchar,
        /// Server configuration document.
        configuration -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-delete flag.
        is_active -> Bool,
    }
}

diesel::table! {
    /// Tokens issued for servers.
    server_tokens (id) {
        /// Token identifier.
        id -> Uuid,
        /// Owning server.
        server_id -> Uuid,
        /// Opaque token value.
        #[max_length = 255]
        value -> Varchar,
        /// Optional expiry.
        expires_at -> Nullable<Timestamptz>,
        /// Soft-delete flag.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tool definitions copied onto servers.
    server_tools (id) {
        /// Tool row identifier.
        id -> Uuid,
        /// Owning server.
        server_id -> Uuid,
        /// Serialized tool definition.
        definition -> Jsonb,
        /// Soft-delete flag.
        is_active -> Bool,
    }
}

diesel::table! {
    /// Access grants linking users to connectors.
    connector_access (id) {
        /// Grant identifier.
        id -> Uuid,
        /// Grantee.
        user_id -> Uuid,
        /// Connector made visible.
        connector_id -> Uuid,
        /// Superuser who issued the grant.
        granted_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Soft-delete flag.
        is_active -> Bool,
    }
}

diesel::joinable!(servers -> connectors (connector_id));
diesel::joinable!(server_tokens -> servers (server_id));
diesel::joinable!(server_tools -> servers (server_id));
diesel::joinable!(connector_access -> connectors (connector_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    connectors,
    servers,
    server_tokens,
    server_tools,
    connector_access,
);
