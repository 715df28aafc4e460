//! Authentication and authorization error types.
//!
//! Every failure the auth core can produce is an [`AuthError`]. Each variant
//! maps to exactly one HTTP status (see `middleware::error`), and none of them
//! are retried by the core. Retrying is a client decision, e.g. running the
//! refresh flow after receiving [`AuthError::ExpiredCredential`].

use std::fmt;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer credential was presented.
    #[error("Missing credential: {message}")]
    MissingCredential {
        /// Description of what was missing.
        message: String,
    },

    /// The credential could not be parsed or its signature does not verify.
    #[error("Malformed credential: {message}")]
    MalformedCredential {
        /// Description of why the credential is malformed.
        message: String,
    },

    /// The credential is well-formed but past its expiry.
    #[error("Expired credential: {message}")]
    ExpiredCredential {
        /// Description of the expired credential.
        message: String,
    },

    /// The credential was valid once but a later issuance replaced it.
    #[error("Superseded credential: {message}")]
    SupersededCredential {
        /// Description of why the credential is no longer live.
        message: String,
    },

    /// The token subject does not resolve to a stored identity.
    #[error("Unknown subject: {message}")]
    UnknownSubject {
        /// Description of the lookup failure.
        message: String,
    },

    /// The identity's role is not permitted for the operation.
    #[error("Role forbidden: {message}")]
    RoleForbidden {
        /// Description of the denied operation.
        message: String,
    },

    /// The identity holds the right role but not for this resource.
    #[error("Resource scope forbidden: {message}")]
    ResourceScopeForbidden {
        /// Description of the denied resource.
        message: String,
    },

    /// The request is missing a required field or carries a malformed one.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what is wrong with the request.
        message: String,
    },

    /// The write would violate a uniqueness invariant.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflicting record.
        message: String,
    },

    /// The process is misconfigured (e.g. no signing secret).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The identity store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure. Never contains token values.
        message: String,
    },

    /// The external OAuth identity provider failed.
    #[error("Identity provider error: {provider} - {message}")]
    IdentityProvider {
        /// Provider identifier (e.g. "github").
        provider: String,
        /// Description of the provider failure.
        message: String,
    },

    /// Unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `MissingCredential` error.
    #[must_use]
    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::MissingCredential {
            message: message.into(),
        }
    }

    /// Creates a new `MalformedCredential` error.
    #[must_use]
    pub fn malformed_credential(message: impl Into<String>) -> Self {
        Self::MalformedCredential {
            message: message.into(),
        }
    }

    /// Creates a new `ExpiredCredential` error.
    #[must_use]
    pub fn expired_credential(message: impl Into<String>) -> Self {
        Self::ExpiredCredential {
            message: message.into(),
        }
    }

    /// Creates a new `SupersededCredential` error.
    #[must_use]
    pub fn superseded_credential(message: impl Into<String>) -> Self {
        Self::SupersededCredential {
            message: message.into(),
        }
    }

    /// Creates a new `UnknownSubject` error.
    #[must_use]
    pub fn unknown_subject(message: impl Into<String>) -> Self {
        Self::UnknownSubject {
            message: message.into(),
        }
    }

    /// Creates a new `RoleForbidden` error.
    #[must_use]
    pub fn role_forbidden(message: impl Into<String>) -> Self {
        Self::RoleForbidden {
            message: message.into(),
        }
    }

    /// Creates a new `ResourceScopeForbidden` error.
    #[must_use]
    pub fn resource_scope_forbidden(message: impl Into<String>) -> Self {
        Self::ResourceScopeForbidden {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `IdentityProvider` error.
    #[must_use]
    pub fn identity_provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IdentityProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this error was caused by the client.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns `true` if this error was caused by the server or a collaborator.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::Storage { .. }
                | Self::IdentityProvider { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if the presented credential itself was rejected.
    ///
    /// Clients receiving `ExpiredCredential` should try the refresh flow;
    /// every other credential error requires a new login.
    #[must_use]
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. }
                | Self::MalformedCredential { .. }
                | Self::ExpiredCredential { .. }
                | Self::SupersededCredential { .. }
        )
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingCredential { .. } => ErrorCategory::Authentication,
            Self::MalformedCredential { .. } => ErrorCategory::Token,
            Self::ExpiredCredential { .. } => ErrorCategory::Token,
            Self::SupersededCredential { .. } => ErrorCategory::Token,
            Self::UnknownSubject { .. } => ErrorCategory::Authentication,
            Self::RoleForbidden { .. } => ErrorCategory::Authorization,
            Self::ResourceScopeForbidden { .. } => ErrorCategory::Authorization,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } => ErrorCategory::Validation,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::IdentityProvider { .. } => ErrorCategory::Federation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the machine-readable error code used in response bodies.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::MalformedCredential { .. } => "invalid_token",
            Self::ExpiredCredential { .. } => "token_expired",
            Self::SupersededCredential { .. } => "token_superseded",
            Self::UnknownSubject { .. } => "unknown_subject",
            Self::RoleForbidden { .. } => "role_forbidden",
            Self::ResourceScopeForbidden { .. } => "scope_forbidden",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Conflict { .. } => "conflict",
            Self::Configuration { .. } => "server_error",
            Self::Storage { .. } => "server_error",
            Self::IdentityProvider { .. } => "provider_error",
            Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of auth errors for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No or unknown principal.
    Authentication,
    /// Principal known but not allowed.
    Authorization,
    /// Token-specific failures.
    Token,
    /// Request validation failures.
    Validation,
    /// Store failures.
    Infrastructure,
    /// Deployment misconfiguration.
    Configuration,
    /// OAuth provider failures.
    Federation,
    /// Everything else.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Federation => write!(f, "federation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
