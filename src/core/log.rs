use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Targets besides our own whose events are worth seeing when tracing HTTP calls.
const HTTP_TARGETS: [&str; 2] = ["reqwest", "hyper_util"];

/// Level for our own events given how many `-v` flags were passed.
pub fn app_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Per-target filter. The HTTP client stack only speaks up at `-vv`.
pub fn targets(verbosity: u8) -> Targets {
    let http_level = if verbosity >= 2 {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    HTTP_TARGETS.iter().fold(
        Targets::new().with_target("navdash", app_level(verbosity)),
        |targets, target| targets.with_target(*target, http_level),
    )
}

/// Installs the global subscriber on stderr so tables on stdout stay clean.
///
/// Quiet unless `-v` or `RUST_LOG` says otherwise. One `-v` prints compact
/// lines, two switch to the multi-line format with span fields.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(app_level(verbosity).to_string().to_lowercase()));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if verbosity >= 2 {
        fmt::layer()
            .pretty()
            .without_time()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .without_time()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(targets(verbosity))
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}
