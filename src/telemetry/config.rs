use tracing_subscriber::EnvFilter;

const LOG_FORMAT_ENV: &str = "PROBE_LOG_FORMAT";

// one completion request per sample; keep the HTTP stack quiet unless RUST_LOG asks for it
const DEFAULT_DIRECTIVES: &str = "info,hyper=warn,reqwest=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to compact text.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

pub fn logs_are_json() -> bool {
    LogFormat::from_env() == LogFormat::Json
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: LogFormat,
    /// `RUST_LOG` when set, otherwise [`DEFAULT_DIRECTIVES`].
    pub directives: String,
}

impl TracingConfig {
    pub fn from_env() -> Self {
        let directives = std::env::var(EnvFilter::DEFAULT_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string());
        Self { format: LogFormat::from_env(), directives }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    }
}

/// Logs go to stderr so the result on stdout stays machine-readable.
pub fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let cfg = TracingConfig::from_env();
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(cfg.filter());

    let _ = match cfg.format {
        LogFormat::Json => registry.with(fmt_layer.json().flatten_event(true)).try_init(),
        LogFormat::Compact => registry.with(fmt_layer.compact()).try_init(),
    };
}
