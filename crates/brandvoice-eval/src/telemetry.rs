//! Tracing initialisation for evaluation runs.
//!
//! Call [`init_tracing`] once before starting a batch. Later calls are
//! ignored since the global subscriber can only be set once per process.
//!
//! Filtering comes from `BRANDVOICE_LOG`, then `RUST_LOG`, then
//! [`default_directives`], which keeps the HTTP stack at `warn` while the
//! brandvoice crates log at the requested level.

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "BRANDVOICE_LOG";

/// Filter used when neither `BRANDVOICE_LOG` nor `RUST_LOG` is set.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,brandvoice_eval={level},brandvoice_agent={level}")
}

pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Build a subscriber writing to `writer`, as text or newline-delimited JSON.
pub fn subscriber<W>(json: bool, filter: EnvFilter, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        Box::new(registry.with(fmt::layer().with_target(false).with_writer(writer).json()))
    } else {
        Box::new(registry.with(fmt::layer().with_target(false).with_writer(writer)))
    }
}

/// Install the global subscriber on stdout.
///
/// * `json`: newline-delimited JSON lines instead of human-readable text.
/// * `level`: verbosity of the brandvoice crates when no env filter is set.
pub fn init_tracing(json: bool, level: Level) {
    subscriber(json, env_filter(level), std::io::stdout)
        .try_init()
        .ok();
}
