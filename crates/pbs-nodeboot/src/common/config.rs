use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::common::error::NodeBootError;
use crate::manager::package::PackageManager;
use crate::{DEFAULT_NODE_NAME, DEFAULT_QUEUE_NAME};

/// Configuration file that is read when no path is given explicitly.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pbs-nodeboot.toml";

/// Describes what the bootstrap does on a host.
/// Every field has a default, an empty file reproduces the stock node setup.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Package manager to use. Detected from the host when missing.
    #[serde(default)]
    pub package_manager: Option<PackageManager>,
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
    /// Explicit path to the `qmgr` binary.
    #[serde(default)]
    pub qmgr: Option<PathBuf>,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    #[serde(default = "default_node_name")]
    pub name: String,
    #[serde(default = "default_queue_name")]
    pub queue: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Server attributes set through `qmgr`, applied in key order.
    /// Entries are merged over the defaults, a default is only dropped by overriding it.
    #[serde(
        default = "default_server_attributes",
        deserialize_with = "deserialize_server_attributes"
    )]
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Attribute values may be written as TOML booleans, integers or strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl AttributeValue {
    /// Formats the value the way `qmgr` expects it.
    pub fn to_qmgr_value(&self) -> String {
        match self {
            AttributeValue::Bool(true) => "True".to_string(),
            AttributeValue::Bool(false) => "False".to_string(),
            AttributeValue::Int(value) => value.to_string(),
            AttributeValue::String(value) => value.clone(),
        }
    }
}

fn default_packages() -> Vec<String> {
    vec!["which".to_string(), "python3".to_string()]
}

fn default_node_name() -> String {
    DEFAULT_NODE_NAME.to_string()
}

fn default_queue_name() -> String {
    DEFAULT_QUEUE_NAME.to_string()
}

fn default_server_attributes() -> BTreeMap<String, AttributeValue> {
    let mut attributes = BTreeMap::new();
    attributes.insert("job_history_enable".to_string(), AttributeValue::Bool(true));
    attributes
}

fn deserialize_server_attributes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, AttributeValue>, D::Error> {
    let mut attributes = default_server_attributes();
    attributes.extend(BTreeMap::<String, AttributeValue>::deserialize(deserializer)?);
    Ok(attributes)
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            queue: default_queue_name(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            attributes: default_server_attributes(),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            package_manager: None,
            packages: default_packages(),
            qmgr: None,
            node: NodeConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

fn validate_identifier(kind: &str, value: &str) -> crate::Result<()> {
    if value.is_empty() {
        return Err(NodeBootError::ConfigError(format!("{kind} must not be empty")));
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || c == '=' || c == '"' || c == '\'')
    {
        return Err(NodeBootError::ConfigError(format!(
            "{kind} '{value}' contains invalid characters"
        )));
    }
    Ok(())
}

impl BootstrapConfig {
    pub fn parse(str: &str) -> crate::Result<BootstrapConfig> {
        let config: BootstrapConfig = toml::from_str(str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from `path`.
    /// A file that cannot be read is reported as a configuration error naming the path.
    pub fn load(path: &Path) -> crate::Result<BootstrapConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NodeBootError::ConfigError(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Loads the configuration from an explicit path, from [`DEFAULT_CONFIG_PATH`] if it exists,
    /// or falls back to the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> crate::Result<BootstrapConfig> {
        match path {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                Self::load(path)
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    log::debug!("Loading configuration from {DEFAULT_CONFIG_PATH}");
                    Self::load(default_path)
                } else {
                    log::debug!("Using built-in configuration");
                    Ok(BootstrapConfig::default())
                }
            }
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        validate_identifier("Node name", &self.node.name)?;
        validate_identifier("Queue name", &self.node.queue)?;
        for package in &self.packages {
            validate_identifier("Package name", package)?;
        }
        for (name, value) in &self.server.attributes {
            validate_identifier("Server attribute name", name)?;
            let value = value.to_qmgr_value();
            if value.is_empty() {
                return Err(NodeBootError::ConfigError(format!(
                    "Server attribute '{name}' has an empty value"
                )));
            }
            if value.contains(['"', '\n', '\r']) {
                return Err(NodeBootError::ConfigError(format!(
                    "Value of server attribute '{name}' must not contain quotes or newlines"
                )));
            }
        }
        if self
            .qmgr
            .as_ref()
            .is_some_and(|qmgr| qmgr.as_os_str().is_empty())
        {
            return Err(NodeBootError::ConfigError(
                "qmgr path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
