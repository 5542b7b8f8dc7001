//! Envelope response format for all API responses.
//!
//! ```json
//! { "success": true, "data": { ... } }
//! { "success": true, "message": "Persona deleted successfully" }
//! { "success": false, "error": "Persona 'x' not found" }
//! ```

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// User-facing error text (failures only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Confirmation text on success, internal detail on development failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Success without a payload, e.g. after a delete.
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}
