//! Request identity extractors.
//!
//! Session issuance and JWT validation live in the edge layer; by the time a
//! request reaches this service the validated caller identity arrives in the
//! `x-user-id` header and partner credentials in the `X-API-Key` /
//! `X-Secret-Key` pair.

use crate::error::{AppError, AppErrorKind, AuthError};
use crate::middleware::error::{app_error_response, get_request_id_from_headers, ErrorResponse};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};

/// Caller identity validated by the upstream session layer
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub i64);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = get_request_id_from_headers(&parts.headers);
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .map(AuthenticatedUser)
            .ok_or_else(|| {
                app_error_response(
                    AppError::new(AppErrorKind::Auth(AuthError::MissingUserIdentity)),
                    request_id,
                )
            })
    }
}

/// Partner API key pair presented on webhook calls
#[derive(Debug, Clone)]
pub struct PartnerCredentials {
    pub api_key: String,
    pub secret_key: String,
}

impl PartnerCredentials {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let api_key = headers.get("x-api-key")?.to_str().ok()?.to_string();
        let secret_key = headers.get("x-secret-key")?.to_str().ok()?.to_string();
        if api_key.is_empty() || secret_key.is_empty() {
            return None;
        }
        Some(Self {
            api_key,
            secret_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn partner_credentials_require_both_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("pk_live_1"));
        assert!(PartnerCredentials::from_headers(&headers).is_none());

        headers.insert("x-secret-key", HeaderValue::from_static("sk_live_1"));
        let creds =
            PartnerCredentials::from_headers(&headers).expect("both headers should extract");
        assert_eq!(creds.api_key, "pk_live_1");
        assert_eq!(creds.secret_key, "sk_live_1");
    }

    #[test]
    fn empty_partner_credentials_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static(""));
        headers.insert("x-secret-key", HeaderValue::from_static("sk_live_1"));
        assert!(PartnerCredentials::from_headers(&headers).is_none());
    }
}
