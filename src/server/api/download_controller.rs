// the relay exists so the catalog can offer a "save as" on videos whose host won't allow a
// cross-origin download (or serves plain http into an https page)
use axum::{
    Extension, Router,
    body::Body,
    extract::RawQuery,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{debug, info};
use url::Url;

use crate::server::{
    error::{AppResult, Error},
    services::{origin_services::OriginPayload, relay_services::RelayServices},
    utils::content_disposition_utils::{DEFAULT_DISPLAY_NAME, attachment_disposition},
};

#[derive(Debug, PartialEq)]
struct DownloadQuery {
    url: Option<String>,
    name: String,
}

impl DownloadQuery {
    /// form decoding, so `+` is a space. first value wins when a key repeats and an empty value
    /// counts as missing
    fn parse(raw: Option<&str>) -> Self {
        let mut url = None;
        let mut name = None;

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "url" if url.is_none() => url = Some(value.into_owned()),
                "name" if name.is_none() => name = Some(value.into_owned()),
                _ => {}
            }
        }

        Self {
            url: url.filter(|u| !u.is_empty()),
            name: name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
        }
    }
}

pub struct DownloadController;

impl DownloadController {
    pub fn app() -> Router {
        Router::new().route("/", get(Self::download_get).options(Self::download_options))
    }

    async fn download_get(
        Extension(services): Extension<RelayServices>,
        RawQuery(raw_query): RawQuery,
    ) -> AppResult<Response> {
        let result = Self::relay(&services, raw_query.as_deref()).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::counter!("relay_downloads_total", "outcome" => outcome).increment(1);

        result
    }

    async fn download_options() -> impl IntoResponse {
        StatusCode::NO_CONTENT
    }

    async fn relay(services: &RelayServices, raw_query: Option<&str>) -> AppResult<Response> {
        let query = DownloadQuery::parse(raw_query);

        let Some(source) = query.url else {
            debug!("download requested without a url");
            return Err(Error::MissingInput);
        };

        let source = Url::parse(&source).map_err(|e| {
            Error::InternalServerErrorWithContext(format!("invalid source url {}: {}", source, e))
        })?;

        if !services.host_policy.permits(&source) {
            return Err(Error::HostNotAllowed(
                source.host_str().unwrap_or_default().to_string(),
            ));
        }

        info!("relaying {} as {:?}", source, query.name);

        let payload = services.origin.fetch(&source).await?;

        if let Some(len) = payload.content_length() {
            metrics::counter!("relay_download_bytes_total").increment(len);
        }

        Self::build_download_response(&query.name, payload)
    }

    /// headers here are fixed, the origin's content type is thrown away on purpose so the browser
    /// downloads instead of trying to play inline
    fn build_download_response(display_name: &str, payload: OriginPayload) -> AppResult<Response> {
        let disposition = HeaderValue::from_str(&attachment_disposition(display_name))
            .map_err(|e| {
                Error::InternalServerErrorWithContext(format!(
                    "could not build content-disposition for {:?}: {}",
                    display_name, e
                ))
            })?;

        let mut response_headers = HeaderMap::new();
        response_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        response_headers.insert(header::CONTENT_DISPOSITION, disposition);
        response_headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        );
        response_headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        response_headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

        match payload {
            OriginPayload::Buffered(bytes) => {
                debug!("sending {} buffered bytes", bytes.len());
                Ok((StatusCode::OK, response_headers, bytes).into_response())
            }
            OriginPayload::Streaming {
                content_length,
                stream,
            } => {
                if let Some(len) = content_length {
                    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
                }
                debug!("streaming origin body (length: {:?})", content_length);
                Ok((StatusCode::OK, response_headers, Body::from_stream(stream)).into_response())
            }
        }
    }
}
