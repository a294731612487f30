//! Environment fingerprinting for session key derivation
//!
//! Collects the environment signals the storefront reads from the browser,
//! in a fixed order, and renders them as one delimited string. The string is
//! never stored; the vault asks its probe for a fresh one on every derivation.
//! Anyone able to run code in the same environment can recompute it, so the
//! key it yields binds a session to a device rather than keeping it secret.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::errors::{VaultError, VaultResult};

/// Separator placed between signals in the canonical string.
pub const SIGNAL_DELIMITER: &str = "|";

/// Environment signals, in derivation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentFingerprint {
    pub user_agent: String,
    pub locale: String,
    pub hardware_concurrency: u32,
    pub color_depth: u32,
    pub screen_width: u32,
    pub screen_height: u32,
    pub platform: String,
    /// Minutes behind UTC, browser sign convention (UTC+2 is -120)
    pub timezone_offset_minutes: i32,
    pub cookies_enabled: bool,
    pub java_enabled: bool,
    pub max_touch_points: u32,
    pub pdf_viewer_enabled: bool,
}

impl EnvironmentFingerprint {
    /// Join every signal with [`SIGNAL_DELIMITER`].
    pub fn canonical_string(&self) -> String {
        [
            self.user_agent.clone(),
            self.locale.clone(),
            self.hardware_concurrency.to_string(),
            self.color_depth.to_string(),
            self.screen_width.to_string(),
            self.screen_height.to_string(),
            self.platform.clone(),
            self.timezone_offset_minutes.to_string(),
            self.cookies_enabled.to_string(),
            self.java_enabled.to_string(),
            self.max_touch_points.to_string(),
            self.pdf_viewer_enabled.to_string(),
        ]
        .join(SIGNAL_DELIMITER)
    }
}

/// Source of environment signals for the vault.
pub trait EnvironmentProbe: Send + Sync {
    fn collect(&self) -> VaultResult<EnvironmentFingerprint>;
}

/// Fixed signals, typically forwarded from a real browser.
pub struct StaticEnvironment {
    fingerprint: RwLock<EnvironmentFingerprint>,
}

impl StaticEnvironment {
    pub fn new(fingerprint: EnvironmentFingerprint) -> Self {
        Self {
            fingerprint: RwLock::new(fingerprint),
        }
    }

    /// Swap the signals, e.g. after the browser reports a new timezone.
    pub fn replace(&self, fingerprint: EnvironmentFingerprint) -> VaultResult<()> {
        let mut guard = self
            .fingerprint
            .write()
            .map_err(|_| VaultError::unavailable("environment signals"))?;
        *guard = fingerprint;
        Ok(())
    }
}

impl EnvironmentProbe for StaticEnvironment {
    fn collect(&self) -> VaultResult<EnvironmentFingerprint> {
        self.fingerprint
            .read()
            .map(|fp| fp.clone())
            .map_err(|_| VaultError::unavailable("environment signals"))
    }
}

/// Display metrics reported by hosts that have no screen to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub color_depth: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            color_depth: 24,
            width: 1920,
            height: 1080,
        }
    }
}

/// Signals read from the hosting process.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    display: DisplayMetrics,
}

impl HostEnvironment {
    pub fn new(display: DisplayMetrics) -> Self {
        Self { display }
    }
}

impl EnvironmentProbe for HostEnvironment {
    fn collect(&self) -> VaultResult<EnvironmentFingerprint> {
        let hardware_concurrency = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);

        Ok(EnvironmentFingerprint {
            user_agent: format!(
                "session_vault/{} ({}; {})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            locale: host_locale(),
            hardware_concurrency,
            color_depth: self.display.color_depth,
            screen_width: self.display.width,
            screen_height: self.display.height,
            platform: std::env::consts::OS.to_string(),
            timezone_offset_minutes: host_timezone_offset_minutes(),
            cookies_enabled: true,
            java_enabled: false,
            max_touch_points: 0,
            pdf_viewer_enabled: false,
        })
    }
}

fn host_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .map(|value| normalize_locale(&value))
        .unwrap_or_else(|| "en-US".to_string())
}

/// `en_US.UTF-8` -> `en-US`
fn normalize_locale(raw: &str) -> String {
    let tag = raw.split(['.', '@']).next().unwrap_or(raw);
    tag.replace('_', "-")
}

fn host_timezone_offset_minutes() -> i32 {
    let offset_seconds = chrono::Local::now().offset().local_minus_utc();
    -(offset_seconds / 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnvironmentFingerprint {
        EnvironmentFingerprint {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            locale: "en-US".to_string(),
            hardware_concurrency: 8,
            color_depth: 24,
            screen_width: 1920,
            screen_height: 1080,
            platform: "Linux x86_64".to_string(),
            timezone_offset_minutes: -120,
            cookies_enabled: true,
            java_enabled: false,
            max_touch_points: 0,
            pdf_viewer_enabled: true,
        }
    }

    #[test]
    fn canonical_string_keeps_signal_order() {
        assert_eq!(
            sample().canonical_string(),
            "Mozilla/5.0 (X11; Linux x86_64)|en-US|8|24|1920|1080|Linux x86_64|-120|true|false|0|true"
        );
    }

    #[test]
    fn static_environment_can_be_replaced() {
        let env = StaticEnvironment::new(sample());
        let mut changed = sample();
        changed.timezone_offset_minutes = 300;
        env.replace(changed.clone()).unwrap();
        assert_eq!(env.collect().unwrap(), changed);
    }

    #[test]
    fn host_environment_is_stable_across_calls() {
        let host = HostEnvironment::default();
        let first = host.collect().unwrap();
        let second = host.collect().unwrap();
        assert_eq!(first.canonical_string(), second.canonical_string());
        assert!(first.hardware_concurrency >= 1);
    }

    #[test]
    fn locale_is_normalized_to_language_tag() {
        assert_eq!(normalize_locale("en_US.UTF-8"), "en-US");
        assert_eq!(normalize_locale("de_DE@euro"), "de-DE");
        assert_eq!(normalize_locale("fr"), "fr");
    }
}
