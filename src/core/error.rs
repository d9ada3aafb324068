use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to resolve '{expr}': {problem}")]
    Resolution { expr: String, problem: String },

    #[error("Plugin descriptor error for '{plugin}': {problem}")]
    Descriptor { plugin: String, problem: String },

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn resolution(expr: impl Into<String>, problem: impl Into<String>) -> Self {
        Error::Resolution {
            expr: expr.into(),
            problem: problem.into(),
        }
    }

    pub fn descriptor(plugin: impl Into<String>, problem: impl Into<String>) -> Self {
        Error::Descriptor {
            plugin: plugin.into(),
            problem: problem.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config.invalid",
            Error::Resolution { .. } => "resolve.failed",
            Error::Descriptor { .. } => "plugin.descriptor",
            Error::Yaml(_) => "config.invalid_yaml",
            Error::Io { .. } => "internal.io_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::Config("x".into()).code(), "config.invalid");
        assert_eq!(Error::resolution("<% $a %>", "missing key").code(), "resolve.failed");
        assert_eq!(Error::descriptor("teamwork", "no desc.yaml").code(), "plugin.descriptor");
    }

    #[test]
    fn display_includes_context() {
        let err = Error::resolution("parameters.batchSize", "missing key 'batchSize'");
        assert!(err.to_string().contains("parameters.batchSize"));
        assert!(err.to_string().contains("missing key"));
    }
}
