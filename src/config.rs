use std::time::Duration;

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

/// how the origin body gets handed back to the client
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    /// read the whole origin body into memory, then respond
    Buffered,
    /// pipe origin chunks straight into the response body
    Streaming,
}

impl DownloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buffered => "buffered",
            Self::Streaming => "streaming",
        }
    }
}

#[derive(clap::Parser, Clone, Debug)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum, default_value = "development")]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    // this should be either * for allowing everything, or a comma seperated list of origins like
    // https://example.com,https://something.com
    #[clap(long, env, default_value = "*")]
    pub cors_origin: String,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,

    // where the daily rolling logs go in production
    #[clap(long, env, default_value = "logs")]
    pub log_dir: String,

    // upper bound for a whole origin fetch, body included. big files need a big number here
    #[clap(long, env, default_value = "300")]
    pub origin_timeout_secs: u64,

    // user agent sent to the origin host
    #[clap(long, env, default_value = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))]
    pub origin_user_agent: String,

    // buffered or streaming
    #[clap(long, env, value_enum, default_value = "buffered")]
    pub download_mode: DownloadMode,

    // unset means no limit
    #[clap(long, env)]
    pub max_download_bytes: Option<u64>,

    // comma seperated hosts, subdomains are allowed too. empty means the relay fetches from
    // anywhere
    #[clap(long, env, value_delimiter = ',')]
    pub allowed_hosts: Vec<String>,

    // serve prometheus metrics on /metrics
    #[clap(long, env)]
    pub enable_metrics: bool,
}

impl AppConfig {
    pub fn origin_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_timeout_secs)
    }
}

impl Default for AppConfig {
    // mostly used by tests, the cli is the real source of these
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            cors_origin: "*".to_string(),
            sentry_dsn: None,
            log_dir: "logs".to_string(),
            origin_timeout_secs: 300,
            origin_user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
                .to_string(),
            download_mode: DownloadMode::Buffered,
            max_download_bytes: None,
            allowed_hosts: Vec::new(),
            enable_metrics: false,
        }
    }
}
