//! API request/response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `error_codes`: Standard error code constants
//! - Request/response DTOs
//!
//! Amounts cross the API as decimal strings so no precision is lost in
//! JSON number handling.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// POST /api/v1/balance/operations
///
/// `amount` is signed: positive deposits, negative withdraws. A decimal
/// string is preferred; a bare JSON number is accepted and read from its
/// source digits, never through `f64`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OperationRequest {
    #[serde(default)]
    pub profile_id: String,
    #[serde(default)]
    pub amount: Option<Value>,
}

impl OperationRequest {
    /// Amount as text, `None` when absent, null, or not a string/number
    pub fn amount_text(&self) -> Option<String> {
        match self.amount.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResponseData {
    pub profile_id: String,
    pub recorded_amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponseData {
    pub profile_id: String,
    pub balance: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub store: String,
    pub version: String,
    pub timestamp_ms: i64,
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_FUNDS: i32 = 1002;
    pub const INVALID_AMOUNT: i32 = 1003;
    pub const INVALID_PROFILE: i32 = 1004;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const STORAGE_TIMEOUT: i32 = 5004;
}
