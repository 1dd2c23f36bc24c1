use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::server::dtos::error_dto::ErrorResponse;

pub type AppResult<T> = Result<T, Error>;

/// everything a handler can fail with. the display string is exactly what the client sees in the
/// `error` field, so internal details only ever go to the logs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing video URL")]
    MissingInput,

    /// origin answered but not with a 2xx, status gets forwarded as is
    #[error("Failed to fetch video: {}", .0.as_u16())]
    OriginError(StatusCode),

    #[error("Video host not allowed")]
    HostNotAllowed(String),

    #[error("Video exceeds maximum download size")]
    PayloadTooLarge(u64),

    #[error("Internal Server Error")]
    InternalServerErrorWithContext(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingInput => StatusCode::BAD_REQUEST,
            Self::OriginError(status) => *status,
            Self::HostNotAllowed(_) => StatusCode::FORBIDDEN,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalServerErrorWithContext(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// label used for the outcome metric
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::OriginError(_) => "origin_error",
            Self::HostNotAllowed(_) => "host_not_allowed",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::InternalServerErrorWithContext(_) => "internal_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Self::InternalServerErrorWithContext(context) => {
                tracing::error!("internal error: {}", context);
            }
            Self::HostNotAllowed(host) => {
                debug!("rejected download from host outside allow list: {}", host)
            }
            Self::PayloadTooLarge(limit) => debug!("rejected download above {} bytes", limit),
            _ => {}
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_input_produces_400() {
        let response = Error::MissingInput.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, r#"{"error":"Missing video URL"}"#);
    }

    #[tokio::test]
    async fn origin_error_forwards_status() {
        let response = Error::OriginError(StatusCode::FORBIDDEN).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Failed to fetch video: 403"}"#
        );
    }

    #[tokio::test]
    async fn internal_context_is_not_leaked() {
        let response =
            Error::InternalServerErrorWithContext("dns error: no such host".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_string(response).await;
        assert_eq!(body, r#"{"error":"Internal Server Error"}"#);
        assert!(!body.contains("dns"));
    }

    #[test]
    fn rejections_have_their_own_statuses() {
        assert_eq!(
            Error::HostNotAllowed("evil.test".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::PayloadTooLarge(10).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
