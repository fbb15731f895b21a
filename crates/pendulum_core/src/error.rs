use thiserror::Error;

/// Problems with run configuration, detected at the boundary before any
/// computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Unknown pendulum type \"{0}\": expected one of [simple, compound].")]
    UnknownVariant(String),
    #[error("Invalid {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: &'static str) -> Self {
        ConfigError::InvalidParameter { name, reason }
    }
}
