use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Upstream,
    MalformedUpstream,
}

/// JSON body of every non-2xx response from the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_snake_case() {
        let body = serde_json::to_value(ApiError::new(ErrorCode::MalformedUpstream, "0x"))
            .expect("json");
        assert_eq!(
            body,
            serde_json::json!({ "code": "malformed_upstream", "message": "0x" })
        );
    }
}
