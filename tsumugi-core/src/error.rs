//! Error types for Tsumugi plugins.
//!
//! - [`BoxError`] - Plugin-supplied failures
//! - [`RegistryError`] - Fatal errors while building the dispatch table
//! - [`DispatchError`] - Per-plugin failures observed while routing an event

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building the plugin registry.
///
/// Every variant is fatal: a partially loaded plugin set leaves dispatch
/// undefined, so startup must not continue.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A plugin's load hook failed.
    #[error("plugin `{plugin}` failed to load: {source}")]
    Load {
        /// Name of the failing plugin.
        plugin: String,
        /// The error returned by the load hook.
        #[source]
        source: BoxError,
    },
}

impl RegistryError {
    /// Name of the plugin that caused the error.
    pub fn plugin(&self) -> &str {
        match self {
            RegistryError::Load { plugin, .. } => plugin,
        }
    }
}

/// A failure inside one plugin while it handled one event.
///
/// These never propagate past the router; they are logged and reported.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A handler returned an error.
    #[error("handler `{key}` failed: {source}")]
    Handler {
        /// Key of the failing handler.
        key: String,
        /// The error returned by the handler.
        #[source]
        source: BoxError,
    },

    /// A filter or handler panicked.
    #[error("plugin panicked: {0}")]
    Panic(String),
}

impl DispatchError {
    /// Build a [`DispatchError::Panic`] from a caught panic payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        DispatchError::Panic(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payload_str() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = DispatchError::from_panic(payload.as_ref());
        assert_eq!(err.to_string(), "plugin panicked: boom");
    }

    #[test]
    fn test_panic_payload_string() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("kaboom"));
        let err = DispatchError::from_panic(payload.as_ref());
        assert!(matches!(err, DispatchError::Panic(ref m) if m == "kaboom"));
    }

    #[test]
    fn test_load_error_names_plugin() {
        let err = RegistryError::Load {
            plugin: "welcome".into(),
            source: "missing data file".into(),
        };
        assert_eq!(err.plugin(), "welcome");
        assert_eq!(
            err.to_string(),
            "plugin `welcome` failed to load: missing data file"
        );
    }
}
