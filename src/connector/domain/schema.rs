//! Connector schema documents and the activation metadata derived from them.

use super::ConnectorDomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use url::Url;

/// Absolute `http`/`https` URL a connector schema is fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectorUrl(Url);

impl ConnectorUrl {
    /// Parses and validates a connector URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::InvalidConnectorUrl`] when the value is
    /// not an absolute `http` or `https` URL.
    pub fn parse(value: &str) -> Result<Self, ConnectorDomainError> {
        let trimmed = value.trim();
        let parsed = Url::parse(trimmed)
            .map_err(|_| ConnectorDomainError::InvalidConnectorUrl(trimmed.to_owned()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConnectorDomainError::InvalidConnectorUrl(trimmed.to_owned()));
        }
        Ok(Self(parsed))
    }

    /// Returns the parsed URL.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the URL in string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ConnectorUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Raw schema document served by a connector at its activation URL.
///
/// Fields are unvalidated; [`Activation::from_document`] performs validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Connector version string.
    #[serde(default)]
    pub version: String,
    /// Declared tools.
    #[serde(default)]
    pub tools: Vec<SchemaTool>,
    /// Declared server templates.
    #[serde(default)]
    pub templates: Vec<SchemaTemplate>,
    /// Optional JSON schema for server configuration documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<Value>,
}

/// Raw tool entry of a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    #[serde(default)]
    pub description: String,
    /// JSON schema describing tool input.
    #[serde(default = "empty_object", alias = "inputSchema")]
    pub input_schema: Value,
}

/// Raw template entry of a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTemplate {
    /// Template name.
    pub name: String,
    /// Template description.
    #[serde(default)]
    pub description: String,
    /// Template configuration payload.
    #[serde(default = "empty_object")]
    pub config: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Validated tool definition exposed by an active connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
}

impl ToolDefinition {
    /// Creates a tool definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError`] when the name or description is empty
    /// or the input schema is not a JSON object.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Result<Self, ConnectorDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(ConnectorDomainError::EmptyToolName);
        }

        let normalized_description = description.into().trim().to_owned();
        if normalized_description.is_empty() {
            return Err(ConnectorDomainError::EmptyToolDescription(normalized_name));
        }

        if !input_schema.is_object() {
            return Err(ConnectorDomainError::InvalidToolInputSchema(normalized_name));
        }

        Ok(Self {
            name: normalized_name,
            description: normalized_description,
            input_schema,
        })
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }
}

/// Validated server template exposed by an active connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    name: String,
    description: String,
    config: Value,
}

impl TemplateDefinition {
    /// Creates a template definition.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::EmptyTemplateName`] when the trimmed
    /// name is empty.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: Value,
    ) -> Result<Self, ConnectorDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(ConnectorDomainError::EmptyTemplateName);
        }
        Ok(Self {
            name: normalized_name,
            description: description.into().trim().to_owned(),
            config,
        })
    }

    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the template description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the template configuration payload.
    #[must_use]
    pub const fn config(&self) -> &Value {
        &self.config
    }
}

/// Metadata captured when a connector is activated.
///
/// An `Activation` only ever exists with a URL, a non-empty version and at
/// least one tool or template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    url: String,
    version: String,
    tools: Vec<ToolDefinition>,
    templates: Vec<TemplateDefinition>,
    config_schema: Option<Value>,
    activated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted activation metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedActivationData {
    /// Persisted schema URL.
    pub url: String,
    /// Persisted connector version.
    pub version: String,
    /// Persisted tool metadata.
    pub tools: Vec<ToolDefinition>,
    /// Persisted template metadata.
    pub templates: Vec<TemplateDefinition>,
    /// Persisted server configuration schema.
    pub config_schema: Option<Value>,
    /// Persisted activation timestamp.
    pub activated_at: DateTime<Utc>,
}

impl Activation {
    /// Validates a fetched schema document into activation metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError`] when the version is empty, no tool or
    /// template is declared, or any tool or template is malformed.
    pub fn from_document(
        url: &ConnectorUrl,
        document: SchemaDocument,
        activated_at: DateTime<Utc>,
    ) -> Result<Self, ConnectorDomainError> {
        let SchemaDocument {
            version,
            tools,
            templates,
            config_schema,
        } = document;

        let normalized_version = version.trim().to_owned();
        if normalized_version.is_empty() {
            return Err(ConnectorDomainError::EmptySchemaVersion);
        }
        if tools.is_empty() && templates.is_empty() {
            return Err(ConnectorDomainError::EmptySchemaDefinitions);
        }

        let validated_tools = tools
            .into_iter()
            .map(|tool| ToolDefinition::new(tool.name, tool.description, tool.input_schema))
            .collect::<Result<Vec<_>, _>>()?;
        let validated_templates = templates
            .into_iter()
            .map(|template| {
                TemplateDefinition::new(template.name, template.description, template.config)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            url: url.as_str().to_owned(),
            version: normalized_version,
            tools: validated_tools,
            templates: validated_templates,
            config_schema,
            activated_at,
        })
    }

    /// Reconstructs activation metadata from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedActivationData) -> Self {
        Self {
            url: data.url,
            version: data.version,
            tools: data.tools,
            templates: data.templates,
            config_schema: data.config_schema,
            activated_at: data.activated_at,
        }
    }

    /// Returns the schema URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the connector version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the tool metadata.
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Returns the template metadata.
    #[must_use]
    pub fn templates(&self) -> &[TemplateDefinition] {
        &self.templates
    }

    /// Returns the optional server configuration schema.
    #[must_use]
    pub const fn config_schema(&self) -> Option<&Value> {
        self.config_schema.as_ref()
    }

    /// Returns the activation timestamp.
    #[must_use]
    pub const fn activated_at(&self) -> DateTime<Utc> {
        self.activated_at
    }

    /// Returns the configuration keys the schema marks as required.
    #[must_use]
    pub fn required_config_keys(&self) -> Vec<&str> {
        self.config_schema
            .as_ref()
            .and_then(|schema| schema.get("required"))
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}
