use std::fmt::Display;

use shuttle_client::ClientError;
use thiserror::Error;

pub mod api;
pub mod auth;
pub mod betting;
pub mod forms;
pub mod notify;
pub mod pages;
pub mod panel;
pub mod routes;
pub mod schedule;
mod validation;

pub use validation::{FieldError, validate_fields};

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid input: {}", join_fields(.0))]
    Invalid(Vec<FieldError>),

    #[error("network error: {0}")]
    Network(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation not possible: {0}")]
    NotPossible(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ServiceError {
    pub fn not_found<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::NotFound(msg.into()))
    }

    pub fn unauthorized<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Unauthorized(msg.into()))
    }

    pub fn invalid<R>(field: impl Into<String>, message: impl Into<String>) -> ServiceResult<R> {
        Err(ServiceError::Invalid(vec![FieldError::new(field, message)]))
    }

    pub fn not_possible<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::NotPossible(msg.into()))
    }

    pub fn internal<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Internal(msg.into()))
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ServiceError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

impl From<ClientError> for ServiceError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Status(401 | 403) => ServiceError::Unauthorized(e.to_string()),
            ClientError::Graphql(messages) => ServiceError::Backend(messages.join("; ")),
            ClientError::Request(_) | ClientError::Status(_) | ClientError::SocketClosed => {
                ServiceError::Network(e.to_string())
            }
            ClientError::Misconfigured(_)
            | ClientError::Serde(_)
            | ClientError::WrongTransport(_) => ServiceError::Internal(e.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Uniform "what went wrong" line for notifications.
pub(crate) fn describe(action: impl Display, e: &ServiceError) -> String {
    format!("Failed to {}: {}", action, e)
}
