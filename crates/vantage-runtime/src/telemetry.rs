//! Process-wide tracing initialisation.
//!
//! Call [`init_tracing`] once at binary startup. Library crates never
//! install a subscriber; they only emit through the `tracing` macros and
//! inherit whatever the process configured.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `VANTAGE_LOG_FORMAT=json` | Emit newline-delimited JSON logs suitable for log aggregators. |

use tracing_subscriber::EnvFilter;

/// Initialise the global `tracing` subscriber.
///
/// Every line carries a timestamp and the span fields of the emitting
/// concurrent unit (`unit{name=worker0}` etc.), which is all the
/// coordination layer requires of its log sink.
pub fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    if std::env::var("VANTAGE_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }
}
