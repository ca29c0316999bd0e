//! Assembles the signed hosted-checkout redirect URL.

use crate::config::GatewayConfig;
use crate::gateway::signature;
use crate::gateway::types::PARAM_SECURE_HASH;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use url::form_urlencoded;

pub const PROTOCOL_VERSION: &str = "2.1.0";
pub const COMMAND_PAY: &str = "pay";

// The gateway quotes amounts in hundredths of the currency unit.
const AMOUNT_MULTIPLIER: i64 = 100;

/// One hosted-checkout redirect to be signed and encoded.
#[derive(Debug, Clone)]
pub struct RedirectRequest<'a> {
    pub transaction_id: &'a str,
    pub amount: i64,
    pub order_info: &'a str,
    pub client_ip: &'a str,
}

/// Build the full redirect URL: parameter set, signature, URL-encoded query.
///
/// The signature covers the raw parameter values; percent-encoding applies
/// only to the final query string.
pub fn build_payment_url(
    config: &GatewayConfig,
    request: &RedirectRequest<'_>,
    created_at: DateTime<Utc>,
) -> String {
    let mut params = BTreeMap::new();
    params.insert("vnp_Version".to_string(), PROTOCOL_VERSION.to_string());
    params.insert("vnp_Command".to_string(), COMMAND_PAY.to_string());
    params.insert("vnp_TmnCode".to_string(), config.merchant_code.clone());
    params.insert(
        "vnp_Amount".to_string(),
        (request.amount * AMOUNT_MULTIPLIER).to_string(),
    );
    params.insert("vnp_CurrCode".to_string(), config.currency.clone());
    params.insert("vnp_TxnRef".to_string(), request.transaction_id.to_string());
    params.insert("vnp_OrderInfo".to_string(), request.order_info.to_string());
    params.insert("vnp_OrderType".to_string(), "other".to_string());
    params.insert("vnp_Locale".to_string(), config.locale.clone());
    params.insert("vnp_ReturnUrl".to_string(), config.return_url.clone());
    params.insert(
        "vnp_CreateDate".to_string(),
        created_at.format("%Y%m%d%H%M%S").to_string(),
    );
    params.insert("vnp_IpAddr".to_string(), request.client_ip.to_string());

    let digest = signature::sign_params(&params, &config.hash_key);
    params.insert(PARAM_SECURE_HASH.to_string(), digest);

    let query: String = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();

    format!("{}?{}", config.payment_url, query)
}
