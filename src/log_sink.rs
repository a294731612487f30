// Tracing setup for binaries and tests embedding the vault.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the tracing filter directive.
pub const LOG_FILTER_ENV: &str = "SESSION_VAULT_LOG";

/// Install a global fmt subscriber filtered by `SESSION_VAULT_LOG`
/// (falling back to `default_directive`).
///
/// Returns false if a global subscriber was already installed.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        init_logging("debug");
        assert!(!init_logging("info"));
    }
}
