use std::{io, sync::Arc};

use anyhow::Context;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, stream::BoxStream};
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::{AppConfig, DownloadMode},
    server::error::{AppResult, Error},
};

/// don't trust content-length for more than this when preallocating
const MAX_PREALLOCATION_BYTES: u64 = 16 * 1024 * 1024;

/// what the origin handed back on a successful fetch
pub enum OriginPayload {
    /// the full body, already in memory
    Buffered(Bytes),
    /// the body as it comes off the wire
    Streaming {
        content_length: Option<u64>,
        stream: BoxStream<'static, io::Result<Bytes>>,
    },
}

impl OriginPayload {
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Buffered(bytes) => Some(bytes.len() as u64),
            Self::Streaming { content_length, .. } => *content_length,
        }
    }
}

pub type DynOriginService = Arc<dyn OriginServiceTrait + Send + Sync>;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OriginServiceTrait {
    /// one GET against the origin, no retries. non 2xx answers come back as
    /// `Error::OriginError` with the origin's status
    async fn fetch(&self, source: &Url) -> AppResult<OriginPayload>;
}

pub struct OriginService {
    http: reqwest::Client,
    mode: DownloadMode,
    max_bytes: Option<u64>,
}

impl OriginService {
    pub fn new(http: reqwest::Client, mode: DownloadMode, max_bytes: Option<u64>) -> Self {
        Self {
            http,
            mode,
            max_bytes,
        }
    }

    /// the timeout covers the whole transfer, body included
    pub fn build_client(config: &AppConfig) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(config.origin_user_agent.as_str())
            .timeout(config.origin_timeout())
            .build()
            .context("failed to build origin http client")
    }

    fn map_transport_error(e: reqwest::Error) -> Error {
        if e.is_timeout() {
            warn!("origin timed out: {}", e);
            return Error::OriginError(StatusCode::GATEWAY_TIMEOUT);
        }
        Error::InternalServerErrorWithContext(format!("origin request failed: {}", e))
    }

    fn exceeds_limit(&self, len: u64) -> bool {
        self.max_bytes.is_some_and(|max| len > max)
    }

    async fn buffer_body(&self, mut response: reqwest::Response) -> AppResult<Bytes> {
        let capacity = response
            .content_length()
            .unwrap_or(0)
            .min(MAX_PREALLOCATION_BYTES) as usize;
        let mut body = BytesMut::with_capacity(capacity);

        while let Some(chunk) = response.chunk().await.map_err(Self::map_transport_error)? {
            body.extend_from_slice(&chunk);
            if self.exceeds_limit(body.len() as u64) {
                return Err(Error::PayloadTooLarge(self.max_bytes.unwrap_or_default()));
            }
        }

        debug!("buffered {} bytes from origin", body.len());
        Ok(body.freeze())
    }

    fn stream_body(&self, response: reqwest::Response) -> OriginPayload {
        let content_length = response.content_length();
        let max_bytes = self.max_bytes;
        let mut seen: u64 = 0;

        // an error here aborts the transfer, the status line is already gone by then
        let stream = response
            .bytes_stream()
            .map(move |chunk| {
                let chunk = chunk.map_err(io::Error::other)?;
                seen += chunk.len() as u64;
                match max_bytes {
                    Some(max) if seen > max => Err(io::Error::other(format!(
                        "origin body passed the {} byte limit",
                        max
                    ))),
                    _ => Ok(chunk),
                }
            })
            .boxed();

        OriginPayload::Streaming {
            content_length,
            stream,
        }
    }
}

#[async_trait::async_trait]
impl OriginServiceTrait for OriginService {
    async fn fetch(&self, source: &Url) -> AppResult<OriginPayload> {
        debug!("fetching {} from origin", source);

        let response = self
            .http
            .get(source.clone())
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!("origin answered {} for {}", status, source);
            return Err(Error::OriginError(status));
        }

        if let Some(len) = response.content_length() {
            if self.exceeds_limit(len) {
                return Err(Error::PayloadTooLarge(self.max_bytes.unwrap_or_default()));
            }
        }

        match self.mode {
            DownloadMode::Buffered => Ok(OriginPayload::Buffered(
                self.buffer_body(response).await?,
            )),
            DownloadMode::Streaming => Ok(self.stream_body(response)),
        }
    }
}
