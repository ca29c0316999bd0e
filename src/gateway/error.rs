use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("Signature verification failed")]
    SignatureError,

    #[error("Unknown payment status: {value}")]
    UnknownStatus { value: String },
}

impl GatewayError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            GatewayError::ValidationError { .. } => 400,
            GatewayError::SignatureError => 401,
            GatewayError::UnknownStatus { .. } => 500,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            GatewayError::ValidationError { message, .. } => message.clone(),
            GatewayError::SignatureError => "Invalid payment response".to_string(),
            GatewayError::UnknownStatus { .. } => {
                "Payment is in an unexpected state".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_http_status_mapping_is_correct() {
        assert_eq!(
            GatewayError::ValidationError {
                message: "bad".to_string(),
                field: None
            }
            .http_status_code(),
            400
        );
        assert_eq!(GatewayError::SignatureError.http_status_code(), 401);
    }
}
