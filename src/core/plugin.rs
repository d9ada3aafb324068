//! Plugin descriptor loading.
//!
//! Each plugin is packaged in its own directory under `<base>/plugins/` and
//! described by a `desc.yaml`. The descriptor is mandatory; its only field
//! this tool consumes is the optional `init-script` path, relative to the
//! plugin directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginDescriptor {
    #[serde(rename = "init-script")]
    pub init_script: Option<String>,
}

pub fn plugin_dir(base: &Path, name: &str) -> PathBuf {
    base.join("plugins").join(name)
}

pub fn load_descriptor(base: &Path, name: &str) -> Result<PluginDescriptor> {
    let path = plugin_dir(base, name).join("desc.yaml");
    let text = fs::read_to_string(&path)
        .map_err(|e| Error::descriptor(name, format!("{}: {}", path.display(), e)))?;
    serde_yml::from_str(&text)
        .map_err(|e| Error::descriptor(name, format!("{}: {}", path.display(), e)))
}

impl PluginDescriptor {
    /// Absolute path of the init script, when one is declared.
    pub fn init_script_path(&self, base: &Path, name: &str) -> Option<PathBuf> {
        self.init_script
            .as_ref()
            .map(|rel| plugin_dir(base, name).join(rel))
    }
}
