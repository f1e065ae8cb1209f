use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 错误响应体: `{ "success": false, "error": { "code", "message" } }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ApiError,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            success: false,
            error: ApiError {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

/// 美分格式化为美元金额，例如 `2500` -> `$25.00`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(2500), "$25.00");
        assert_eq!(format_cents(5), "$0.05");
        assert_eq!(format_cents(123_456), "$1234.56");
        assert_eq!(format_cents(-150), "-$1.50");
    }
}
