use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Application error taxonomy. Components return these; the HTTP boundary is
/// the only place they are mapped onto status codes and the response envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, errors: Vec<FieldError> },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Database error during {context}")]
    Database {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Internal server error")]
    Internal { context: String },
}

impl ApiError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation { message: "Validation failed".to_string(), errors }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), errors: Vec::new() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn case_not_found(id: &str) -> Self {
        Self::NotFound { message: format!("Case with ID {id} not found") }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn database(context: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Database { context: context.into(), source }
    }

    pub fn internal(context: impl Into<String>) -> Self {
        Self::Internal { context: context.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to clients. Server-side failures collapse to a generic
    /// message; the detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database { .. } | Self::Internal { .. } => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Validation { errors, .. } => errors.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),
            sqlx::Error::Database(db_err)
                if db_err.message().contains("UNIQUE constraint failed")
                    || db_err.message().contains("duplicate key value") =>
            {
                // The only unique column in the schema is users.email.
                Self::conflict("User already exists")
            }
            other => Self::database("query", other),
        }
    }
}

/// Payload attached to error responses so the envelope middleware can render
/// the final body without re-deriving anything.
#[derive(Debug, Clone)]
pub struct ErrorPayload {
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload =
            ErrorPayload { message: self.public_message(), errors: self.field_errors() };

        match &self {
            Self::Database { context, source } => {
                tracing::error!("database error during {}: {}", context, source);
            }
            Self::Internal { context } => {
                tracing::error!("internal error: {}", context);
            }
            _ => {}
        }

        let mut response = (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": payload.message,
            })),
        )
            .into_response();
        response.extensions_mut().insert(payload);
        response
    }
}

/// Global response-mapping layer: every error status leaving the service is
/// rendered as the uniform envelope
/// `{statusCode, timestamp, path, message, errors?}`, including extractor
/// rejections and unknown routes that never reached a handler.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    let status = response.status();

    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (message, errors) = match response.extensions().get::<ErrorPayload>() {
        Some(payload) => (payload.message.clone(), payload.errors.clone()),
        None => (
            status.canonical_reason().unwrap_or("Unknown error").to_string(),
            Vec::new(),
        ),
    };

    let mut body = json!({
        "statusCode": status.as_u16(),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "path": path,
        "message": message,
    });
    if !errors.is_empty() {
        body["errors"] = serde_json::to_value(&errors).unwrap_or_default();
    }

    (status, Json(body)).into_response()
}
