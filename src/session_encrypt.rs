use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes128;
use aes_gcm::AesGcm;
use base64::{engine::general_purpose, Engine as _};
use zeroize::Zeroizing;

use crate::errors::{VaultError, VaultResult};
use crate::key_derivation::DerivedKey;

/// AES-128-GCM with a 16-byte IV, as WebCrypto is called by the storefront.
pub type SessionCipher = AesGcm<Aes128, U16>;

pub const IV_LEN: usize = 16;
pub const TAG_LEN: usize = 16;

fn cipher_for(key: &DerivedKey) -> VaultResult<SessionCipher> {
    SessionCipher::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::cipher(format!("key init: {e}")))
}

/// Encrypt `plaintext` under a fresh IV. Output layout: IV || ciphertext || tag.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> VaultResult<Vec<u8>> {
    let cipher = cipher_for(key)?;

    let mut iv = [0u8; IV_LEN];
    getrandom::fill(&mut iv).map_err(|e| VaultError::cipher(format!("iv generation: {e}")))?;

    let ciphertext = cipher
        .encrypt(GenericArray::from_slice(&iv), plaintext)
        .map_err(|_| VaultError::cipher("encrypt"))?;

    let mut record = Vec::with_capacity(IV_LEN + ciphertext.len());
    record.extend_from_slice(&iv);
    record.extend_from_slice(&ciphertext);
    Ok(record)
}

/// Split off the IV and authenticate-decrypt the remainder.
pub fn open(key: &DerivedKey, record: &[u8]) -> VaultResult<Zeroizing<Vec<u8>>> {
    if record.len() < IV_LEN + TAG_LEN {
        return Err(VaultError::malformed(format!(
            "record is {} bytes, need at least {}",
            record.len(),
            IV_LEN + TAG_LEN
        )));
    }

    let cipher = cipher_for(key)?;
    let (iv, ciphertext) = record.split_at(IV_LEN);
    cipher
        .decrypt(GenericArray::from_slice(iv), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::Authentication)
}

pub fn encode_record(record: &[u8]) -> String {
    general_purpose::STANDARD.encode(record)
}

pub fn decode_record(encoded: &str) -> VaultResult<Vec<u8>> {
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| VaultError::malformed(format!("invalid base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::EnvironmentFingerprint;
    use crate::key_derivation::derive_key;

    fn key(locale: &str) -> DerivedKey {
        derive_key(&EnvironmentFingerprint {
            user_agent: "Mozilla/5.0".to_string(),
            locale: locale.to_string(),
            hardware_concurrency: 2,
            color_depth: 30,
            screen_width: 2560,
            screen_height: 1440,
            platform: "Win32".to_string(),
            timezone_offset_minutes: 480,
            cookies_enabled: true,
            java_enabled: false,
            max_touch_points: 10,
            pdf_viewer_enabled: true,
        })
    }

    #[test]
    fn seal_then_open() {
        let k = key("en-US");
        let record = seal(&k, b"{\"a\":1}").unwrap();
        assert_eq!(record.len(), IV_LEN + 7 + TAG_LEN);
        assert_eq!(open(&k, &record).unwrap().as_slice(), b"{\"a\":1}");
    }

    #[test]
    fn every_seal_uses_a_fresh_iv() {
        let k = key("en-US");
        let first = seal(&k, b"same").unwrap();
        let second = seal(&k, b"same").unwrap();
        assert_ne!(first[..IV_LEN], second[..IV_LEN]);
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let record = seal(&key("en-US"), b"payload").unwrap();
        let err = open(&key("fr-FR"), &record).unwrap_err();
        assert!(matches!(err, VaultError::Authentication));
    }

    #[test]
    fn flipped_tag_byte_fails_authentication() {
        let k = key("en-US");
        let mut record = seal(&k, b"payload").unwrap();
        let last = record.len() - 1;
        record[last] ^= 0x01;
        assert!(matches!(open(&k, &record), Err(VaultError::Authentication)));
    }

    #[test]
    fn short_record_is_malformed() {
        let err = open(&key("en-US"), &[0u8; IV_LEN]).unwrap_err();
        assert!(matches!(err, VaultError::MalformedStoredData { .. }));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let err = decode_record("not base64!").unwrap_err();
        assert!(matches!(err, VaultError::MalformedStoredData { .. }));
    }
}
