//! Error types for the site server.
//!
//! API routes answer with a JSON body; `/preview` pages answer with a small
//! HTML error page via [`SiteError::into_html_response`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, html};
use serde::Serialize;

use crate::contact::{ContactError, ValidationError};
use crate::content::ContentError;

/// Site error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Authentication failed (missing or invalid token).
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Contact form field errors, shown to the visitor as-is.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Daily contact limit reached.
    #[error("rate limited")]
    RateLimited,

    /// A required setting is empty.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The email provider failed.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Content service failure.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ContactError> for SiteError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Validation(e) => Self::Validation(e),
            ContactError::RateLimited => Self::RateLimited,
            e @ ContactError::Configuration(_) => Self::Configuration(e.to_string()),
            ContactError::Delivery(e) => Self::Delivery(e.to_string()),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl SiteError {
    /// Status, machine-readable code and visitor-safe message.
    ///
    /// Server-side failures are logged here with their cause and reported
    /// with a generic message.
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            Self::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                Some(err.to_string()),
            ),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                Some("You have reached today's message limit. Please try again tomorrow.".to_string()),
            ),
            Self::Configuration(msg) => {
                tracing::error!(error = %msg, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    Some("The service is not available right now".to_string()),
                )
            }
            Self::Delivery(msg) => {
                tracing::error!(error = %msg, "email delivery failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "delivery_error",
                    Some("Your message could not be sent. Please try again later.".to_string()),
                )
            }
            Self::Content(ContentError::NotConfigured) => {
                tracing::error!("content service is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    Some("The service is not available right now".to_string()),
                )
            }
            Self::Content(err) => {
                tracing::error!(error = %err, "content service error");
                (
                    StatusCode::BAD_GATEWAY,
                    "content_error",
                    Some("Content is temporarily unavailable".to_string()),
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    Some("An internal error occurred".to_string()),
                )
            }
            Self::Serialization(err) => {
                tracing::error!(error = %err, "serialization error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "serialization_error",
                    Some("A serialization error occurred".to_string()),
                )
            }
        }
    }

    /// Render as a standalone HTML error page.
    pub fn into_html_response(self, site_name: &str) -> Response {
        let (status, _, message) = self.parts();
        let title = status.canonical_reason().unwrap_or("Error");
        let message = message.unwrap_or_else(|| "Something went wrong.".to_string());

        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (title) " | " (site_name) }
                    meta name="robots" content="noindex";
                }
                body {
                    main class="error-page" {
                        h1 { (title) }
                        p { (message) }
                        a href="/" { "Back to " (site_name) }
                    }
                }
            }
        };

        (status, markup).into_response()
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::MailError;

    #[test]
    fn error_display_not_found() {
        let err = SiteError::NotFound("page about".to_string());
        assert_eq!(err.to_string(), "not found: page about");
    }

    #[test]
    fn error_into_response_statuses() {
        let cases = [
            (SiteError::Unauthorized, StatusCode::UNAUTHORIZED),
            (SiteError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (SiteError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                SiteError::Validation(ValidationError::InvalidEmail),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (SiteError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                SiteError::Configuration("missing".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (SiteError::Delivery("503".into()), StatusCode::BAD_GATEWAY),
            (
                SiteError::Content(ContentError::NotConfigured),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                SiteError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn contact_errors_map_to_site_errors() {
        let err: SiteError = ContactError::RateLimited.into();
        assert!(matches!(err, SiteError::RateLimited));

        let err: SiteError = ContactError::Configuration(vec!["EMAILJS_SERVICE_ID"]).into();
        assert!(matches!(err, SiteError::Configuration(ref m) if m.contains("EMAILJS_SERVICE_ID")));

        let err: SiteError = ContactError::Delivery(MailError::Rejected {
            status: 400,
            body: "bad template".to_string(),
        })
        .into();
        assert!(matches!(err, SiteError::Delivery(ref m) if m.contains("bad template")));
    }

    #[test]
    fn server_errors_hide_details() {
        let (_, _, message) = SiteError::Delivery("smtp password wrong".into()).parts();
        assert!(!message.unwrap().contains("password"));

        let (_, _, message) = SiteError::Configuration("EMAILJS_PUBLIC_KEY".into()).parts();
        assert!(!message.unwrap().contains("EMAILJS"));
    }

    #[test]
    fn html_error_page() {
        let response = SiteError::NotFound("about".into()).into_html_response("Vitrine");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }
}
