use std::{error::Error as StdError, fmt};

use anyhow::Error as AnyError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use textfile_core::{DecodeError, StoreError, ValidationError};
use tracing::error;

use crate::auth::AuthError;

#[derive(Debug, Clone, Copy)]
struct ErrorDescriptor {
    status: StatusCode,
    name: &'static str,
    default_detail: &'static str,
}

const VALIDATION_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::UNPROCESSABLE_ENTITY,
    name: "VALIDATION_FAILED",
    default_detail: "Request validation failed.",
};

const AUTHORIZATION_FAILED_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::UNAUTHORIZED,
    name: "AUTHORIZATION_FAILED",
    default_detail: "Authorization Failed",
};

const AUTHORIZATION_UNAVAILABLE_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::UNAUTHORIZED,
    name: "AUTHORIZATION_UNAVAILABLE",
    default_detail: "Authorization Failed",
};

const STORE_UNAVAILABLE_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    name: "STORE_UNAVAILABLE",
    default_detail: "Text file store unavailable.",
};

const STORE_ERROR_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    name: "STORE_ERROR",
    default_detail: "Text file store error.",
};

const DOCUMENT_CORRUPTED_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    name: "DOCUMENT_CORRUPTED",
    default_detail: "Stored document could not be decoded.",
};

#[derive(Debug)]
pub struct AppError {
    descriptor: &'static ErrorDescriptor,
    detail: String,
    source: Option<AnyError>,
}

impl AppError {
    pub(crate) fn validation(detail: impl Into<String>) -> Self {
        Self::from_descriptor(&VALIDATION_DESCRIPTOR, Some(detail.into()))
    }

    pub(crate) fn authorization_failed(detail: impl Into<String>) -> Self {
        Self::from_descriptor(&AUTHORIZATION_FAILED_DESCRIPTOR, Some(detail.into()))
    }

    pub(crate) fn authorization_unavailable(detail: impl Into<String>) -> Self {
        Self::from_descriptor(&AUTHORIZATION_UNAVAILABLE_DESCRIPTOR, Some(detail.into()))
    }

    pub(crate) fn store(err: StoreError) -> Self {
        let descriptor = if err.is_transient() {
            &STORE_UNAVAILABLE_DESCRIPTOR
        } else {
            &STORE_ERROR_DESCRIPTOR
        };
        error!(error = %err, name = descriptor.name, "text file store failure");
        Self::from_descriptor(descriptor, Some(err.to_string())).with_source(AnyError::new(err))
    }

    pub(crate) fn corrupted(err: DecodeError) -> Self {
        error!(error = %err, "stored text file failed to decode");
        Self::from_descriptor(&DOCUMENT_CORRUPTED_DESCRIPTOR, Some(err.to_string()))
            .with_source(AnyError::new(err))
    }

    pub fn status(&self) -> StatusCode {
        self.descriptor.status
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub(crate) fn into_payload(self) -> (StatusCode, ErrorPayload) {
        let status = self.descriptor.status;
        let payload = ErrorPayload {
            status: status.as_u16(),
            code: status_code_name(status),
            name: self.descriptor.name.to_owned(),
            detail: self.detail,
        };
        (status, payload)
    }

    fn from_descriptor(descriptor: &'static ErrorDescriptor, detail: Option<String>) -> Self {
        Self {
            descriptor,
            detail: detail.unwrap_or_else(|| descriptor.default_detail.to_owned()),
            source: None,
        }
    }

    fn with_source(mut self, error: AnyError) -> Self {
        self.source = Some(error);
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.descriptor.name, self.detail)
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, payload) = self.into_payload();
        (status, Json(payload)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Denied(status) => Self::authorization_failed(format!(
                "Authorization Failed status_code={}",
                status.as_u16()
            )),
            other => Self::authorization_unavailable(format!("Authorization Failed:{other}")),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::store(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        Self::corrupted(err)
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ErrorPayload {
    pub(crate) status: u16,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) detail: String,
}

fn status_code_name(status: StatusCode) -> String {
    let reason = status
        .canonical_reason()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Status {}", status.as_u16()));

    reason
        .chars()
        .map(|ch| match ch {
            'a'..='z' => ch.to_ascii_uppercase(),
            'A'..='Z' | '0'..='9' => ch,
            _ => '_',
        })
        .collect()
}
