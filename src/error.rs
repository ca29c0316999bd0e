//! Comprehensive error handling for the storefront backend
//!
//! This module provides a unified error system with proper HTTP status mapping,
//! user-friendly messages, and structured error codes for client handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication errors (401)
    #[serde(rename = "AUTHENTICATION_FAILED")]
    AuthenticationFailed,

    // Domain errors (4xx)
    #[serde(rename = "ORDER_NOT_FOUND")]
    OrderNotFound,
    #[serde(rename = "PAYMENT_NOT_FOUND")]
    PaymentNotFound,
    #[serde(rename = "ORDER_NOT_PAYABLE")]
    OrderNotPayable,

    // Infrastructure errors (5xx)
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (502, 504)
    #[serde(rename = "UPSTREAM_UNAVAILABLE")]
    UpstreamUnavailable,

    // Generic
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

/// Authentication failures, rejected before any state is read
#[derive(Debug, Clone)]
pub enum AuthError {
    /// Gateway callback arrived without its signature field
    MissingSignature,
    /// Gateway callback signature did not verify
    InvalidSignature,
    /// Partner key pair missing from the request headers
    MissingPartnerCredentials,
    /// Partner key pair did not match an active partner
    InvalidPartnerCredentials,
    /// Caller identity missing from the authenticated-request headers
    MissingUserIdentity,
}

/// Domain-specific business logic errors
#[derive(Debug, Clone)]
pub enum DomainError {
    /// Order doesn't exist or doesn't belong to the caller
    OrderNotFound { order_id: i64 },
    /// No payment row matches the callback's transaction reference
    PaymentNotFound { transaction_id: String },
    /// Order is not in a payable state
    OrderNotPayable {
        order_id: i64,
        payment_status: String,
    },
}

/// Infrastructure-level errors (database, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Database connection or query failure
    Database { message: String, is_retryable: bool },
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors (webhook forwarding target)
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// Forwarding target could not be reached
    UpstreamUnreachable { message: String },
    /// Forwarding target did not answer within the bounded timeout
    UpstreamTimeout { timeout_secs: u64 },
    /// Forwarding target answered with something other than a response envelope
    MalformedUpstreamResponse { message: String },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Required field missing
    MissingField { field: String },
    /// Field value failed validation
    InvalidField { field: String, reason: String },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Auth(AuthError),
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Auth(_) => 401,
            AppErrorKind::Domain(err) => match err {
                DomainError::OrderNotFound { .. } => 404,
                DomainError::PaymentNotFound { .. } => 404,
                DomainError::OrderNotPayable { .. } => 409, // Conflict
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => 500,
                InfrastructureError::Configuration { .. } => 500,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::UpstreamUnreachable { .. } => 502, // Bad Gateway
                ExternalError::UpstreamTimeout { .. } => 504,     // Gateway Timeout
                ExternalError::MalformedUpstreamResponse { .. } => 502,
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Auth(_) => ErrorCode::AuthenticationFailed,
            AppErrorKind::Domain(err) => match err {
                DomainError::OrderNotFound { .. } => ErrorCode::OrderNotFound,
                DomainError::PaymentNotFound { .. } => ErrorCode::PaymentNotFound,
                DomainError::OrderNotPayable { .. } => ErrorCode::OrderNotPayable,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(_) => ErrorCode::UpstreamUnavailable,
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Auth(err) => match err {
                AuthError::MissingSignature => "Missing payment signature".to_string(),
                AuthError::InvalidSignature => "Invalid payment response".to_string(),
                AuthError::MissingPartnerCredentials => "API credentials required".to_string(),
                AuthError::InvalidPartnerCredentials => "Invalid API credentials".to_string(),
                AuthError::MissingUserIdentity => "User not authenticated".to_string(),
            },
            AppErrorKind::Domain(err) => match err {
                DomainError::OrderNotFound { order_id } => {
                    format!("Order '{}' not found", order_id)
                }
                DomainError::PaymentNotFound { transaction_id } => {
                    format!("Payment '{}' not found", transaction_id)
                }
                DomainError::OrderNotPayable {
                    order_id,
                    payment_status,
                } => {
                    format!(
                        "Order '{}' payment already processed (payment_status: {})",
                        order_id, payment_status
                    )
                }
            },
            AppErrorKind::Infrastructure(_) => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            AppErrorKind::External(err) => match err {
                ExternalError::UpstreamUnreachable { .. } => {
                    "Failed to contact the webhook handler".to_string()
                }
                ExternalError::UpstreamTimeout { timeout_secs } => {
                    format!(
                        "Webhook handler did not respond within {} seconds",
                        timeout_secs
                    )
                }
                ExternalError::MalformedUpstreamResponse { .. } => {
                    "Webhook handler returned an invalid response".to_string()
                }
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::InvalidField { field, reason } => {
                    format!("Invalid value for field '{}': {}", field, reason)
                }
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Auth(_) => false,
            AppErrorKind::Domain(_) => false,
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::Configuration { .. } => false,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::UpstreamUnreachable { .. } => true,
                ExternalError::UpstreamTimeout { .. } => true,
                ExternalError::MalformedUpstreamResponse { .. } => false,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

// Conversions from specific error types
// Note: From<DatabaseError> is implemented in database/error.rs to avoid circular dependency

impl From<crate::gateway::error::GatewayError> for AppError {
    fn from(err: crate::gateway::error::GatewayError) -> Self {
        use crate::gateway::error::GatewayError as GE;

        let kind = match err {
            GE::ValidationError { message, field } => {
                AppErrorKind::Validation(ValidationError::InvalidField {
                    field: field.unwrap_or_else(|| "request".to_string()),
                    reason: message,
                })
            }
            GE::SignatureError => AppErrorKind::Auth(AuthError::InvalidSignature),
            GE::UnknownStatus { value } => {
                AppErrorKind::Infrastructure(InfrastructureError::Database {
                    message: format!("payment row carries unknown status '{}'", value),
                    is_retryable: false,
                })
            }
        };

        AppError::new(kind)
    }
}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_signature_error() {
        let error = AppError::new(AppErrorKind::Auth(AuthError::InvalidSignature));

        assert_eq!(error.status_code(), 401);
        assert_eq!(error.error_code(), ErrorCode::AuthenticationFailed);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_payment_not_found_error() {
        let error = AppError::new(AppErrorKind::Domain(DomainError::PaymentNotFound {
            transaction_id: "ORDER_42_1000".to_string(),
        }));

        assert_eq!(error.status_code(), 404);
        assert_eq!(error.error_code(), ErrorCode::PaymentNotFound);
        assert!(error.user_message().contains("ORDER_42_1000"));
    }

    #[test]
    fn test_order_not_payable_is_conflict() {
        let error = AppError::new(AppErrorKind::Domain(DomainError::OrderNotPayable {
            order_id: 42,
            payment_status: "paid".to_string(),
        }));

        assert_eq!(error.status_code(), 409);
        assert_eq!(error.error_code(), ErrorCode::OrderNotPayable);
    }

    #[test]
    fn test_upstream_errors_are_distinct_from_validation() {
        let unreachable = AppError::new(AppErrorKind::External(
            ExternalError::UpstreamUnreachable {
                message: "connection refused".to_string(),
            },
        ));
        assert_eq!(unreachable.status_code(), 502);
        assert_eq!(unreachable.error_code(), ErrorCode::UpstreamUnavailable);
        assert!(unreachable.is_retryable());

        let timeout = AppError::new(AppErrorKind::External(ExternalError::UpstreamTimeout {
            timeout_secs: 30,
        }));
        assert_eq!(timeout.status_code(), 504);

        let validation = AppError::new(AppErrorKind::Validation(ValidationError::MissingField {
            field: "vnp_TxnRef".to_string(),
        }));
        assert_eq!(validation.status_code(), 400);
        assert_ne!(validation.error_code(), unreachable.error_code());
    }
}
