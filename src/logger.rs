/* Logger initialization */
use std::{panic, thread};

use tracing::{error, level_filters::LevelFilter};
use tracing_appender::non_blocking::WorkerGuard;

use crate::{AppConfig, CargoEnv};

pub struct LoggerGuards {
    pub _tracing_guard: WorkerGuard,
    // option because sentry is opt in
    pub _sentry_guard: Option<sentry::ClientInitGuard>,
}

pub struct Logger {}

impl Logger {
    pub fn init(config: &AppConfig) -> LoggerGuards {
        // debug in development is noisy but it's where the per request flow lives
        let max_level = match config.cargo_env {
            CargoEnv::Development => LevelFilter::DEBUG,
            CargoEnv::Production => LevelFilter::INFO,
        };

        let (non_blocking, guard) = match config.cargo_env {
            CargoEnv::Development => tracing_appender::non_blocking(std::io::stdout()),
            CargoEnv::Production => tracing_appender::non_blocking(
                tracing_appender::rolling::daily(&config.log_dir, "relay.log"),
            ),
        };

        let sentry_guard = config
            .sentry_dsn
            .clone()
            .map(|dsn| Self::init_sentry(dsn, config.cargo_env));

        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);

        let registry = tracing_subscriber::registry()
            .with(max_level)
            .with(fmt_layer);

        if sentry_guard.is_some() {
            registry.with(sentry_tracing::layer()).init();
        } else {
            registry.init();
        }

        panic::set_hook(Box::new(Self::log_panic));

        // both guards go back to main so they live as long as the process
        LoggerGuards {
            _tracing_guard: guard,
            _sentry_guard: sentry_guard,
        }
    }

    fn init_sentry(dsn: String, cargo_env: CargoEnv) -> sentry::ClientInitGuard {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(match cargo_env {
                    CargoEnv::Development => "development".into(),
                    CargoEnv::Production => "production".into(),
                }),
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    }

    fn log_panic(info: &panic::PanicHookInfo<'_>) {
        let thread = thread::current();
        let thread = thread.name().unwrap_or("unknown");

        let msg = match info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &**s,
                None => "Box<Any>",
            },
        };

        let backtrace = backtrace::Backtrace::new();

        match info.location() {
            Some(location) => error!(
                target: "panic", "thread '{}' panicked at '{}': {}:{}\n{:?}",
                thread,
                msg,
                location.file(),
                location.line(),
                backtrace
            ),
            None => error!(
                target: "panic", "thread '{}' panicked at '{}'\n{:?}",
                thread,
                msg,
                backtrace
            ),
        }
    }
}
