use serde::{Deserialize, Serialize};

/// Outcome marker carried by every JSON body this service returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Body of every HTTP response: `{"status": "success"|"error", "message": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn success(message: Option<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message,
        }
    }

    pub fn error(message: Option<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_serializes_without_message() {
        let body = serde_json::to_value(ApiResponse::success(None)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "success" }));
    }

    #[test]
    fn test_error_serializes_with_message() {
        let body = serde_json::to_value(ApiResponse::error(Some("boom".to_string()))).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "status": "error", "message": "boom" })
        );
    }
}
