use serde::Serialize;

/// the only error shape the relay ever sends back
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
