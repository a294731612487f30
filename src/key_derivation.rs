use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::fingerprint::EnvironmentFingerprint;

/// Key length consumed by the session cipher (AES-128).
pub const DERIVED_KEY_LEN: usize = 16;

/// Symmetric key derived from an environment fingerprint.
///
/// Only the first 16 bytes of the SHA-256 digest are used. Browser-sealed
/// records depend on that truncation, so it must not change.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.0
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for DerivedKey {}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// SHA-256 over the canonical fingerprint string, truncated to the key size.
pub fn derive_key(fingerprint: &EnvironmentFingerprint) -> DerivedKey {
    let mut canonical = fingerprint.canonical_string();
    let mut digest = Sha256::digest(canonical.as_bytes());

    let mut key = [0u8; DERIVED_KEY_LEN];
    key.copy_from_slice(&digest[..DERIVED_KEY_LEN]);

    digest.as_mut_slice().zeroize();
    canonical.zeroize();
    DerivedKey(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(user_agent: &str) -> EnvironmentFingerprint {
        EnvironmentFingerprint {
            user_agent: user_agent.to_string(),
            locale: "en-US".to_string(),
            hardware_concurrency: 4,
            color_depth: 24,
            screen_width: 1280,
            screen_height: 720,
            platform: "MacIntel".to_string(),
            timezone_offset_minutes: 0,
            cookies_enabled: true,
            java_enabled: false,
            max_touch_points: 0,
            pdf_viewer_enabled: true,
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let fp = fingerprint("Mozilla/5.0");
        assert_eq!(derive_key(&fp), derive_key(&fp));
    }

    #[test]
    fn key_is_truncated_sha256_of_canonical_string() {
        let fp = fingerprint("Mozilla/5.0");
        let digest = Sha256::digest(fp.canonical_string().as_bytes());
        assert_eq!(derive_key(&fp).as_bytes()[..], digest[..DERIVED_KEY_LEN]);
    }

    #[test]
    fn different_signals_give_different_keys() {
        assert_ne!(
            derive_key(&fingerprint("Mozilla/5.0 Firefox")),
            derive_key(&fingerprint("Mozilla/5.0 Chrome"))
        );
    }

    #[test]
    fn debug_output_hides_key_bytes() {
        let key = derive_key(&fingerprint("Mozilla/5.0"));
        assert_eq!(format!("{key:?}"), "DerivedKey(..)");
    }
}
