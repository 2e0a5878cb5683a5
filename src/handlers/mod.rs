//! HTTP route handlers. Request structs validate into the typed inputs the
//! repository accepts; every handler returns `Result<_, ApiError>` and the
//! envelope middleware shapes error bodies.

pub mod analytics;
pub mod auth;
pub mod cases;
pub mod evidence;
pub mod health;
pub mod notifications;
pub mod timeline;
pub mod users;

use serde::Serialize;

use crate::errors::FieldError;

/// `{"message": "..."}` bodies for acknowledge-style endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Folds one field check into an error list: `Some(value)` on success,
/// `None` after recording the failure. Lets a request struct report every
/// invalid field at once.
pub(crate) fn collect<T>(
    errors: &mut Vec<FieldError>,
    result: Result<T, FieldError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}
