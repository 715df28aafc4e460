//! Error response handling for authentication middleware.
//!
//! This module implements `IntoResponse` for `AuthError`. Every error becomes
//! a JSON body of the form
//!
//! ```json
//! {"success": false, "error": "token_expired", "message": "..."}
//! ```

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

/// Message returned in place of server-side error details.
const GENERIC_SERVER_ERROR: &str = "An internal error occurred";

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let message = if self.is_server_error() && status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::warn!(error = %self, category = %self.category(), "Request failed");
            GENERIC_SERVER_ERROR.to_string()
        } else {
            public_message(&self)
        };

        let body = json!({
            "success": false,
            "error": code,
            "message": message,
        });

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(code, &message);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(body)).into_response()
    }
}

impl AuthError {
    /// Returns the HTTP status this error is reported with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential { .. } => StatusCode::UNAUTHORIZED,
            Self::MalformedCredential { .. }
            | Self::ExpiredCredential { .. }
            | Self::SupersededCredential { .. }
            | Self::RoleForbidden { .. }
            | Self::ResourceScopeForbidden { .. } => StatusCode::FORBIDDEN,
            Self::UnknownSubject { .. } => StatusCode::NOT_FOUND,
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::IdentityProvider { .. } => StatusCode::BAD_GATEWAY,
            Self::Configuration { .. } | Self::Storage { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn public_message(error: &AuthError) -> String {
    match error {
        AuthError::IdentityProvider { provider, .. } => {
            tracing::warn!(error = %error, "Identity provider failure");
            format!("Identity provider '{provider}' could not complete the login")
        }
        AuthError::MissingCredential { message }
        | AuthError::MalformedCredential { message }
        | AuthError::ExpiredCredential { message }
        | AuthError::SupersededCredential { message }
        | AuthError::UnknownSubject { message }
        | AuthError::RoleForbidden { message }
        | AuthError::ResourceScopeForbidden { message }
        | AuthError::InvalidRequest { message }
        | AuthError::Conflict { message }
        | AuthError::Configuration { message }
        | AuthError::Storage { message }
        | AuthError::Internal { message } => message.clone(),
    }
}

/// Builds the WWW-Authenticate header value for 401 responses.
///
/// Format: `Bearer realm="gymkeeper", error="...", error_description="..."`
fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped_desc = description.replace('"', "\\\"");
    format!("Bearer realm=\"gymkeeper\", error=\"{error}\", error_description=\"{escaped_desc}\"")
}

// =============================================================================
// Tests
// =============================================================================
