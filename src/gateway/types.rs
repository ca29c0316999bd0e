use crate::gateway::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Response code the gateway reports for a successful charge. Exact match only.
pub const RESPONSE_CODE_SUCCESS: &str = "00";

/// Payment method recorded on rows created by this integration.
pub const PAYMENT_METHOD_VNPAY: &str = "vnpay";

// Callback parameter names, fixed by the gateway protocol.
pub const PARAM_SECURE_HASH: &str = "vnp_SecureHash";
pub const PARAM_SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
pub const PARAM_TXN_REF: &str = "vnp_TxnRef";
pub const PARAM_RESPONSE_CODE: &str = "vnp_ResponseCode";
pub const PARAM_AMOUNT: &str = "vnp_Amount";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = GatewayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(GatewayError::UnknownStatus {
                value: value.to_string(),
            }),
        }
    }
}

/// Terminal state a verified callback resolves to.
pub fn terminal_status_for(response_code: &str) -> PaymentStatus {
    if response_code == RESPONSE_CODE_SUCCESS {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Failed
    }
}

/// Fixed acknowledgement the gateway expects from its webhook, mutation or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpnAck {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl IpnAck {
    pub fn success() -> Self {
        Self {
            rsp_code: RESPONSE_CODE_SUCCESS.to_string(),
            message: "Success".to_string(),
        }
    }
}
