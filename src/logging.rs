use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_VAR: &str = "TALLY_LOG";

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber. `TALLY_LOG` wins over `default_level`;
/// output goes to stderr so command output stays clean.
pub fn init(default_level: &str) {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(ENV_VAR)
            .or_else(|_| EnvFilter::try_new(default_level))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        // try_init: a test harness may already have a subscriber installed
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
