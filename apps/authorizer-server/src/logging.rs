//! Structured JSON logging.

use tracing_subscriber::EnvFilter;

/// Fallback verbosity when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(std::env::var("LOG_LEVEL").ok())))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_env_filter(filter)
        .try_init();
}

fn level_directive(level: Option<String>) -> String {
    level
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_owned())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn level_falls_back_to_info() {
        assert_eq!(level_directive(None), "info");
        assert_eq!(level_directive(Some("  ".to_owned())), "info");
        assert_eq!(level_directive(Some("DEBUG".to_owned())), "debug");
    }
}
