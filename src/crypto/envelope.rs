// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated encryption envelope for stored files.
//!
//! ## Layout
//!
//! ```text
//! +-----------+-----------+------------------+
//! | nonce(16) |  tag(16)  | ciphertext (var) |
//! +-----------+-----------+------------------+
//! ```
//!
//! AES-256-GCM with a 128-bit nonce and no associated data. A fresh nonce is
//! drawn from the OS RNG for every call to [`seal`]; the nonce is bound by the
//! GCM construction, so flipping any byte of the envelope fails [`open`].

use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm, Key, Nonce, Tag,
};
use rand::{rngs::OsRng, RngCore};

/// AES-256-GCM instantiated with a 16-byte nonce.
type Aes256Gcm128 = AesGcm<Aes256, U16>;

/// Nonce width in bytes.
pub const NONCE_LEN: usize = 16;

/// Authentication tag width in bytes.
pub const TAG_LEN: usize = 16;

/// Fixed prefix preceding the ciphertext.
pub const HEADER_LEN: usize = NONCE_LEN + TAG_LEN;

/// Symmetric key length in bytes.
pub const KEY_LEN: usize = 32;

/// Envelope failed to authenticate.
///
/// Carries no detail on purpose: short input, wrong key and corrupted bytes
/// are indistinguishable to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("envelope failed integrity check")]
pub struct IntegrityError;

/// Problems decoding the process-wide envelope key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeKeyError {
    #[error("key is not valid hex: {0}")]
    InvalidHex(String),

    #[error("key must be {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Process-wide 256-bit envelope key.
#[derive(Clone)]
pub struct EnvelopeKey([u8; KEY_LEN]);

impl EnvelopeKey {
    /// Build a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode a hex-encoded key (64 hex characters).
    pub fn from_hex(encoded: &str) -> Result<Self, EnvelopeKeyError> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| EnvelopeKeyError::InvalidHex(e.to_string()))?;
        let len = bytes.len();
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| EnvelopeKeyError::InvalidLength(len))?;
        Ok(Self(arr))
    }

    /// Generate a random key (used by tests and key bootstrap tooling).
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    fn cipher(&self) -> Aes256Gcm128 {
        Aes256Gcm128::new(Key::<Aes256Gcm128>::from_slice(&self.0))
    }
}

impl std::fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EnvelopeKey(<redacted>)")
    }
}

/// Encrypt `plaintext` into a `nonce ‖ tag ‖ ciphertext` envelope.
pub fn seal(plaintext: &[u8], key: &EnvelopeKey) -> Vec<u8> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    seal_with_nonce(plaintext, key, &nonce)
}

fn seal_with_nonce(plaintext: &[u8], key: &EnvelopeKey, nonce: &[u8; NONCE_LEN]) -> Vec<u8> {
    let mut envelope = Vec::with_capacity(HEADER_LEN + plaintext.len());
    envelope.extend_from_slice(nonce);
    envelope.extend_from_slice(&[0u8; TAG_LEN]);
    envelope.extend_from_slice(plaintext);

    // GCM encryption only fails for payloads beyond ~64 GiB, which the upload
    // path can never produce.
    let tag = key
        .cipher()
        .encrypt_in_place_detached(
            Nonce::<U16>::from_slice(nonce),
            b"",
            &mut envelope[HEADER_LEN..],
        )
        .unwrap_or_else(|_| unreachable!("GCM plaintext length limit exceeded"));

    envelope[NONCE_LEN..HEADER_LEN].copy_from_slice(&tag);
    envelope
}

/// Decrypt an envelope produced by [`seal`].
///
/// Returns no plaintext at all unless the tag authenticates.
pub fn open(envelope: &[u8], key: &EnvelopeKey) -> Result<Vec<u8>, IntegrityError> {
    if envelope.len() < HEADER_LEN {
        return Err(IntegrityError);
    }

    let (nonce, rest) = envelope.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let mut buffer = ciphertext.to_vec();
    key.cipher()
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::<U16>::from_slice(tag),
        )
        .map_err(|_| IntegrityError)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn test_key() -> EnvelopeKey {
        EnvelopeKey::from_hex(TEST_KEY_HEX).unwrap()
    }

    #[test]
    fn seal_then_open_returns_plaintext() {
        let key = test_key();
        for plaintext in [&b""[..], b"x", b"hello soulbound world", &[0xAB; 4096][..]] {
            let envelope = seal(plaintext, &key);
            assert_eq!(envelope.len(), HEADER_LEN + plaintext.len());
            assert_eq!(open(&envelope, &key).unwrap(), plaintext);
        }
    }

    #[test]
    fn fresh_nonce_per_seal() {
        let key = test_key();
        let a = seal(b"same bytes", &key);
        let b = seal(b"same bytes", &key);
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn any_flipped_byte_fails_integrity() {
        let key = test_key();
        let envelope = seal(b"integrity matters", &key);

        for i in 0..envelope.len() {
            let mut tampered = envelope.clone();
            tampered[i] ^= 0x01;
            assert_eq!(open(&tampered, &key), Err(IntegrityError), "byte {i}");
        }
    }

    #[test]
    fn wrong_key_fails_integrity() {
        let envelope = seal(b"secret", &test_key());
        let other = EnvelopeKey::generate();
        assert_eq!(open(&envelope, &other), Err(IntegrityError));
    }

    #[test]
    fn truncated_envelope_fails_integrity() {
        let key = test_key();
        let envelope = seal(b"truncate me", &key);

        assert_eq!(open(&envelope[..HEADER_LEN - 1], &key), Err(IntegrityError));
        assert_eq!(open(&envelope[..envelope.len() - 1], &key), Err(IntegrityError));
        assert_eq!(open(&[], &key), Err(IntegrityError));
    }

    #[test]
    fn layout_places_nonce_first() {
        let key = test_key();
        let nonce = [7u8; NONCE_LEN];
        let envelope = seal_with_nonce(b"abc", &key, &nonce);
        assert_eq!(&envelope[..NONCE_LEN], &nonce);
        assert_eq!(open(&envelope, &key).unwrap(), b"abc");
    }

    #[test]
    fn key_from_hex_validates_length() {
        assert!(EnvelopeKey::from_hex(TEST_KEY_HEX).is_ok());
        assert_eq!(
            EnvelopeKey::from_hex("abcd").unwrap_err(),
            EnvelopeKeyError::InvalidLength(2)
        );
        assert!(matches!(
            EnvelopeKey::from_hex("not hex at all"),
            Err(EnvelopeKeyError::InvalidHex(_))
        ));
    }

    #[test]
    fn key_debug_is_redacted() {
        let rendered = format!("{:?}", test_key());
        assert!(!rendered.contains("0001"));
        assert!(rendered.contains("redacted"));
    }
}
