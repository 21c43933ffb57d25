use std::borrow::Cow;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use realty_engine::{DealEngineError, LedgerError, request::RequestError};

use crate::payload::response::ErrorResponsePayload;

#[derive(Debug, thiserror::Error)]
pub(crate) enum AppError {
    #[error("deal engine error: {0}")]
    DealEngine(Box<DealEngineError>),

    #[error("trust ledger error: {0}")]
    Ledger(Box<LedgerError>),

    #[error("invalid {field}: {reason}")]
    InvalidId { field: &'static str, reason: Cow<'static, str> },

    #[error("invalid {field} filter: {value}")]
    InvalidFilter { field: &'static str, value: String },

    #[error("request error: {0}")]
    RequestError(#[from] RequestError),
}

impl AppError {
    pub fn invalid_id<E>(field: &'static str, err: E) -> Self
    where
        E: ToString,
    {
        Self::InvalidId { field, reason: err.to_string().into() }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidId { .. }
            | AppError::InvalidFilter { .. }
            | AppError::RequestError(_) => StatusCode::BAD_REQUEST,
            AppError::DealEngine(err) => match err.as_ref() {
                DealEngineError::NotFound(_) | DealEngineError::ConditionNotFound(_) => {
                    StatusCode::NOT_FOUND
                },
                DealEngineError::InvalidTransition { .. } | DealEngineError::DeleteNotAllowed(_) => {
                    StatusCode::CONFLICT
                },
                DealEngineError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Ledger(err) => match err.as_ref() {
                LedgerError::AccountNotFound(_) | LedgerError::TransactionNotFound(_) => {
                    StatusCode::NOT_FOUND
                },
                LedgerError::DuplicateAccount(_)
                | LedgerError::AccountNotActive(_)
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::ConcurrentModification(_) => StatusCode::CONFLICT,
                LedgerError::Arithmetic(_) => StatusCode::BAD_REQUEST,
                LedgerError::AuditWriteFailed(_) | LedgerError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                },
            },
        }
    }
}

impl From<DealEngineError> for AppError {
    fn from(err: DealEngineError) -> Self {
        Self::DealEngine(err.into())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();

        match code {
            StatusCode::NOT_FOUND => tracing::info!("not found: {self}"),
            code if code.is_server_error() => tracing::error!("server error: {self}"),
            _ => tracing::warn!("client error: {self}"),
        }

        let body = ErrorResponsePayload::builder().detail(self.to_string()).build();

        (code, Json(body)).into_response()
    }
}
