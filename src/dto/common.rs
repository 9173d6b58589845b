use serde::Serialize;

// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

// Response con sólo un mensaje
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_response_skips_missing_fields() {
        let body = serde_json::to_value(ApiResponse::message("Client deleted successfully")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Client deleted successfully");
        assert!(body.get("data").is_none());

        let body = serde_json::to_value(MessageResponse::new("ok")).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "ok" }));
    }
}
