// Public modules
pub mod commands;
pub mod error;
pub mod init;
pub mod jobconfig;
pub mod plugin;
pub mod resolver;

// Re-export common types for convenience
pub use error::{Error, Result};
pub use jobconfig::{JobConfig, PluginRef, DEFAULT_PLUGIN_NAMESPACE};
pub use init::{PluginOutcome, PluginStatus, RunReport};
