//! Error types for switchboard-core

use thiserror::Error;

/// Result type alias for switchboard-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in switchboard-core
#[derive(Error, Debug)]
pub enum Error {
    /// Registry lookup miss
    #[error("provider not found: {provider}")]
    ProviderNotFound {
        /// Requested provider id
        provider: String,
    },

    /// The backing catalog was replaced with an empty override
    #[error("catalog not found")]
    CatalogNotFound,

    /// A provider id was registered twice
    #[error("provider '{provider}' is already registered")]
    DuplicateProvider {
        /// Provider id that collided
        provider: String,
    },

    /// Descriptor failed shape validation
    #[error("invalid descriptor for provider '{provider}': {message}")]
    InvalidDescriptor {
        /// Provider id (may be empty when the id itself is missing)
        provider: String,
        /// Description of what's invalid
        message: String,
    },

    /// Template could not be parsed
    #[error("invalid template '{template}': {message}")]
    InvalidTemplate {
        /// The offending template text
        template: String,
        /// Description of the syntax error
        message: String,
    },

    /// A placeholder names a variable that has no binding
    #[error("missing substitution for '{{{{.{name}}}}}'")]
    MissingSubstitution {
        /// Placeholder name
        name: String,
    },

    /// Umbrella for any template error raised while walking a descriptor
    #[error("substitution failed: {0}")]
    Substitution(#[source] Box<Error>),

    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a template error in the [`Error::Substitution`] umbrella.
    ///
    /// Errors that are already wrapped are returned unchanged so nested walks
    /// never produce `Substitution(Substitution(..))`.
    pub fn substitution(cause: Error) -> Self {
        match cause {
            wrapped @ Error::Substitution(_) => wrapped,
            other => Error::Substitution(Box::new(other)),
        }
    }

    /// The underlying cause when this is a [`Error::Substitution`].
    pub fn substitution_cause(&self) -> Option<&Error> {
        match self {
            Error::Substitution(cause) => Some(cause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_substitution_display() {
        let err = Error::MissingSubstitution {
            name: "workspace".to_string(),
        };
        assert_eq!(err.to_string(), "missing substitution for '{{.workspace}}'");
    }

    #[test]
    fn test_substitution_wrapping_is_flat() {
        let inner = Error::MissingSubstitution {
            name: "region".to_string(),
        };
        let wrapped = Error::substitution(Error::substitution(inner));
        match wrapped.substitution_cause() {
            Some(Error::MissingSubstitution { name }) => assert_eq!(name, "region"),
            other => panic!("unexpected cause: {:?}", other),
        }
    }
}
