use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use ethers::providers::ProviderError;
use serde::Serialize;
use thiserror::Error;

use crate::models::api_response::ApiResponse;

#[derive(Error, Debug)]
pub enum CustomError {
    #[error("{0}")]
    ConfigInvalid(String),

    #[error("Invalid address: {0}")]
    InvalidAddressError(String),

    #[error("Invalid amount: {0}")]
    InvalidAmountError(String),

    #[error("Invalid amount")]
    ZeroAmount,

    #[error("{0}")]
    InsufficientBalance(String),

    #[error("{0}")]
    InsufficientGasReserve(String),

    #[error("{0}")]
    TransactionReverted(String),

    #[error("Transaction receipt timeout after {0}s")]
    TransactionTimeout(u64),

    #[error("Transaction rejected: {0}")]
    TransactionRejectedByUser(String),

    #[error("nonce conflict: {0}")]
    NonceConflict(String),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("Provider error: {0}")]
    StringifiedProviderError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Resource not found")]
    NotFoundError,

    #[error("Internal server error")]
    InternalServerError,

    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("")]
    Unknown,
}

// Custom Error type
#[derive(Debug, Serialize)]
pub struct ApiError {
    code: u16,
    message: String,
}

impl ApiError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match self {
            CustomError::NotFoundError => StatusCode::NOT_FOUND,
            CustomError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CustomError::InvalidAddressError(_) => StatusCode::BAD_REQUEST,
            CustomError::InvalidAmountError(_) | CustomError::ZeroAmount => {
                StatusCode::BAD_REQUEST
            }
            CustomError::InsufficientBalance(_) => StatusCode::BAD_REQUEST,
            CustomError::InsufficientGasReserve(_) => StatusCode::BAD_REQUEST,
            CustomError::TransactionRejectedByUser(_) => StatusCode::BAD_REQUEST,
            CustomError::ConfigInvalid(_) => StatusCode::SERVICE_UNAVAILABLE,
            CustomError::TransactionTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CustomError::ProviderError(_)
            | CustomError::StringifiedProviderError(_)
            | CustomError::NetworkError(_) => StatusCode::BAD_GATEWAY,
            CustomError::TransactionReverted(_)
            | CustomError::NonceConflict(_)
            | CustomError::ContractError(_)
            | CustomError::InternalServerError
            | CustomError::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let api_error = ApiError::new(status.as_u16(), classify_error(self));

        let response = ApiResponse {
            status: "FAILURE".to_string(),
            code: status.as_u16(),
            result: None::<()>,
            error: Some(api_error),
        };

        HttpResponse::build(status).json(response)
    }
}

/// Coarse failure buckets recognised in transport and wallet error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    GasFees,
    Reverted,
    Nonce,
    Timeout,
    Rejected,
    Passthrough,
    Unknown,
}

impl ErrorCategory {
    pub fn from_message(message: &str) -> Self {
        if message.contains("insufficient funds") {
            ErrorCategory::GasFees
        } else if message.contains("execution reverted") {
            ErrorCategory::Reverted
        } else if message.contains("nonce") {
            ErrorCategory::Nonce
        } else if message.contains("timeout") {
            ErrorCategory::Timeout
        } else if message.contains("rejected") {
            ErrorCategory::Rejected
        } else if message.trim().is_empty() {
            ErrorCategory::Unknown
        } else {
            ErrorCategory::Passthrough
        }
    }
}

/// Map a failure message onto the stable user-facing reason.
pub fn classify_message(message: &str) -> String {
    match ErrorCategory::from_message(message) {
        ErrorCategory::GasFees => "Insufficient funds for gas fees".to_string(),
        ErrorCategory::Reverted => {
            "Transaction reverted - token contract may have restrictions".to_string()
        }
        ErrorCategory::Nonce => "Transaction nonce error - please try again".to_string(),
        ErrorCategory::Timeout => "Transaction timeout - network congestion detected".to_string(),
        ErrorCategory::Rejected => "Transaction was rejected".to_string(),
        ErrorCategory::Passthrough => message.to_string(),
        ErrorCategory::Unknown => "Unknown error occurred".to_string(),
    }
}

pub fn classify_error(error: &CustomError) -> String {
    classify_message(&error.to_string())
}
