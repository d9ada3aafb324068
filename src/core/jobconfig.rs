//! Job document model.
//!
//! The job configuration is loaded once per invocation from YAML and never
//! mutated afterwards. Only the sections this tool consumes are typed; leaf
//! data (parameters, secrets, prerequisite fields) stays as raw YAML values
//! so reference expressions can walk arbitrary nesting.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_yml::Value;

use crate::error::{Error, Result};
use crate::utils::io::read_file;

/// Key under `extras` holding the ordered plugin reference list.
pub const DEFAULT_PLUGIN_NAMESPACE: &str = "runtime-plugins";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub defaults: Option<Defaults>,
    pub deployments: Vec<Deployment>,
    /// Namespaced extension data. Plugin references live under one key;
    /// other namespaces are carried opaquely.
    pub extras: HashMap<String, Value>,
    pub parameters: Value,
    pub secrets: Value,
    pub prerequisites: Vec<Value>,
    /// Task role name -> per-prerequisite-type artifact name bindings.
    #[serde(rename = "taskRoles")]
    pub task_roles: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub deployment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    pub name: String,
    #[serde(rename = "taskRoles", default)]
    pub task_roles: HashMap<String, DeploymentCommands>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeploymentCommands {
    #[serde(rename = "preCommands")]
    pub pre_commands: Option<Vec<String>>,
    #[serde(rename = "postCommands")]
    pub post_commands: Option<Vec<String>>,
}

/// One entry in the ordered plugin list. The declaration index is
/// significant: it names the generated per-plugin scripts and fixes
/// execution order.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginRef {
    pub plugin: String,
    #[serde(default)]
    pub parameters: Option<Value>,
    /// When present, restricts the plugin to the listed task roles.
    #[serde(default)]
    pub taskroles: Option<Vec<String>>,
}

impl PluginRef {
    pub fn applies_to(&self, taskrole: &str) -> bool {
        self.taskroles
            .as_ref()
            .is_none_or(|roles| roles.iter().any(|r| r == taskrole))
    }
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<JobConfig> {
        let text = read_file(path, "read jobconfig")?;
        Self::parse(&text)
    }

    pub fn parse(yaml: &str) -> Result<JobConfig> {
        serde_yml::from_str(yaml).map_err(|e| Error::Yaml(e.to_string()))
    }

    /// Ordered plugin references under the given `extras` namespace.
    ///
    /// A missing namespace means no plugins are configured; a namespace
    /// that is present but not a plugin list is a configuration error.
    pub fn plugin_refs(&self, namespace: &str) -> Result<Vec<PluginRef>> {
        match self.extras.get(namespace) {
            None => Ok(Vec::new()),
            Some(value) => serde_yml::from_value(value.clone()).map_err(|e| {
                Error::Config(format!(
                    "extras.{} is not a plugin reference list: {}",
                    namespace, e
                ))
            }),
        }
    }
}
