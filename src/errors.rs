// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use alloy_primitives::{Address, U256};
use thiserror::Error;

pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const NO_IMAGE_DATA: &str = "NO_IMAGE_DATA";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Prompt must be a string")]
    NotAString,

    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Prompt is too long (maximum {max} characters, got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("{0}")]
    Invalid(String),
}

/// Reverts raised by the NFT contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Insufficient fee: required {required} wei, provided {provided} wei")]
    InsufficientFee { required: U256, provided: U256 },

    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Image data cannot be empty")]
    EmptyImage,

    #[error("Token {0} does not exist")]
    NonexistentToken(U256),

    #[error("Caller {0} is not the contract owner")]
    NotOwner(Address),

    #[error("Nothing to withdraw")]
    NothingToWithdraw,

    #[error("Chain state unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum PromptMintError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Image generation error: {message}")]
    Generation {
        message: String,
        status: Option<u16>,
        code: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Marketplace error: {message}")]
    Marketplace {
        message: String,
        status: Option<u16>,
        code: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PromptMintError {
    pub fn generation(message: impl Into<String>, status: Option<u16>, code: Option<String>) -> Self {
        PromptMintError::Generation {
            message: message.into(),
            status,
            code: code.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            source: None,
        }
    }

    pub fn marketplace(message: impl Into<String>, status: Option<u16>) -> Self {
        PromptMintError::Marketplace {
            message: message.into(),
            status,
            code: None,
            source: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PromptMintError::Validation(_) => "validation_error",
            PromptMintError::Generation { .. } => "generation_error",
            PromptMintError::Marketplace { .. } => "marketplace_error",
            PromptMintError::ImageProcessing(_) => "image_processing_error",
            PromptMintError::Contract(_) => "contract_error",
            PromptMintError::Config(_) => "config_error",
        }
    }

    /// HTTP status reported by the remote service, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            PromptMintError::Generation { status, .. } => *status,
            PromptMintError::Marketplace { status, .. } => *status,
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            PromptMintError::Generation { code, .. } => Some(code.as_str()),
            PromptMintError::Marketplace { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            PromptMintError::Validation(e) => e.to_string(),
            PromptMintError::Generation { message, .. } => message.clone(),
            PromptMintError::Marketplace { message, .. } => message.clone(),
            PromptMintError::ImageProcessing(message) => message.clone(),
            PromptMintError::Contract(e) => e.to_string(),
            PromptMintError::Config(message) => message.clone(),
        }
    }
}

impl ResponseError for PromptMintError {
    fn status_code(&self) -> StatusCode {
        match self {
            PromptMintError::Validation(_) => StatusCode::BAD_REQUEST,
            PromptMintError::Generation { status: None, .. }
            | PromptMintError::Marketplace { status: None, .. } => StatusCode::SERVICE_UNAVAILABLE,
            PromptMintError::Generation { .. } | PromptMintError::Marketplace { .. } => {
                StatusCode::BAD_GATEWAY
            }
            PromptMintError::ImageProcessing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PromptMintError::Contract(ContractError::NonexistentToken(_)) => StatusCode::NOT_FOUND,
            PromptMintError::Contract(ContractError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PromptMintError::Contract(_) => StatusCode::CONFLICT,
            PromptMintError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": self.message(),
            "status": self.status(),
            "code": self.code(),
        }))
    }
}
