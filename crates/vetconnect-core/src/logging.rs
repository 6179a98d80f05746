//! Tracing setup for hosts that embed the core.

use tracing_subscriber::EnvFilter;

/// Directive used when neither `RUST_LOG` nor an explicit filter is usable.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `filter`. Returns `false` when a subscriber was
/// already installed, so calling this more than once is harmless.
pub fn init_logging(filter: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        filter
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!("VetConnect core v{}", env!("CARGO_PKG_VERSION"));
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        init_logging(Some("vetconnect_core=debug"));
        assert!(!init_logging(Some("warn")));
    }

    #[test]
    fn test_bad_directive_does_not_panic() {
        init_logging(Some("=[not a filter"));
    }
}
