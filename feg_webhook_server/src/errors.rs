use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use feg_order_engine::{
    checkout::{SignatureError, VerificationError},
    traits::ReconciliationDbError,
    ReconcileError,
};
use log::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid content type. Expected application/json, but got {0}")]
    UnsupportedContentType(String),
    #[error("Webhook signature verification failed: {0}")]
    SignatureVerificationFailed(#[from] SignatureError),
    #[error("The webhook secret is not configured")]
    WebhookSecretUnavailable,
    #[error("Invalid webhook payload. {0}")]
    MalformedPayload(String),
    #[error("Error creating order record")]
    OrderCreationFailed,
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Requests from this address are not allowed")]
    ForbiddenPeer,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedContentType(_) => StatusCode::BAD_REQUEST,
            Self::SignatureVerificationFailed(_) => StatusCode::BAD_REQUEST,
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ForbiddenPeer => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::WebhookSecretUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OrderCreationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<VerificationError> for ServerError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::Signature(e) => Self::SignatureVerificationFailed(e),
            VerificationError::SecretUnavailable(e) => {
                error!("🔑️ {e}");
                Self::WebhookSecretUnavailable
            },
            VerificationError::MalformedPayload(e) => Self::MalformedPayload(e.to_string()),
        }
    }
}

impl From<ReconcileError> for ServerError {
    fn from(e: ReconcileError) -> Self {
        match e {
            // The detail goes to the log. The provider only needs to know that it should retry.
            ReconcileError::OrderCreationFailed(e) => {
                error!("💻️ {e}");
                Self::OrderCreationFailed
            },
            ReconcileError::SessionUpdateFailed(e) => Self::BackendError(e.to_string()),
            ReconcileError::MalformedPayload(e) => Self::MalformedPayload(e.to_string()),
        }
    }
}

impl From<ReconciliationDbError> for ServerError {
    fn from(e: ReconciliationDbError) -> Self {
        Self::BackendError(e.to_string())
    }
}
