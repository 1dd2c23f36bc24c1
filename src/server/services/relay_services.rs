use std::sync::Arc;

use tracing::info;

use crate::{
    config::AppConfig,
    server::{
        services::origin_services::{DynOriginService, OriginService},
        utils::host_policy_utils::HostPolicy,
    },
};

/// everything the handlers need, cloned into each request through an extension. nothing in here
/// is mutable so requests never wait on each other
#[derive(Clone)]
pub struct RelayServices {
    pub origin: DynOriginService,
    pub host_policy: Arc<HostPolicy>,
    pub config: Arc<AppConfig>,
}

impl RelayServices {
    pub fn new(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        info!("starting relay services...");

        let http = OriginService::build_client(&config)?;
        let origin = Arc::new(OriginService::new(
            http,
            config.download_mode,
            config.max_download_bytes,
        )) as DynOriginService;

        info!("origin client ok");

        Ok(Self::with_origin(config, origin))
    }

    /// same as `new` but with the origin side swapped out
    pub fn with_origin(config: Arc<AppConfig>, origin: DynOriginService) -> Self {
        let host_policy = Arc::new(HostPolicy::new(&config.allowed_hosts));

        Self {
            origin,
            host_policy,
            config,
        }
    }
}
