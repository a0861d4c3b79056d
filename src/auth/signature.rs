// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet signature verification.
//!
//! Wallets sign the raw UTF-8 bytes of the challenge document with their
//! Ed25519 key. Both the public key (the wallet address) and the detached
//! signature travel base58-encoded.

use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Verify a detached Ed25519 signature over `message`.
///
/// Returns `false` for every failure, including undecodable inputs.
pub fn verify_wallet_signature(identity: &str, signature: &str, message: &[u8]) -> bool {
    let Some(verifying_key) = decode_identity(identity) else {
        tracing::debug!("wallet address is not a valid ed25519 public key");
        return false;
    };

    let Some(signature) = decode_signature(signature) else {
        tracing::debug!("signature is not a valid base58 ed25519 signature");
        return false;
    };

    verifying_key.verify(message, &signature).is_ok()
}

/// Decode a base58 wallet address into a verifying key.
pub fn decode_identity(identity: &str) -> Option<VerifyingKey> {
    let bytes = bs58::decode(identity.trim()).into_vec().ok()?;
    let arr: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().ok()?;
    VerifyingKey::from_bytes(&arr).ok()
}

fn decode_signature(signature: &str) -> Option<Signature> {
    let bytes = bs58::decode(signature.trim()).into_vec().ok()?;
    let arr: [u8; SIGNATURE_LENGTH] = bytes.try_into().ok()?;
    Some(Signature::from_bytes(&arr))
}


#[cfg(test)]
mod tests {
    use super::test_support::TestWallet;
    use super::*;

    #[test]
    fn valid_signature_verifies() {
        let wallet = TestWallet::generate();
        let message = br#"{"action":"verify_access"}"#;
        let signature = wallet.sign(message);

        assert!(verify_wallet_signature(&wallet.address(), &signature, message));
    }

    #[test]
    fn signature_from_other_key_is_rejected() {
        let owner = TestWallet::generate();
        let impostor = TestWallet::generate();
        let message = b"challenge";
        let signature = impostor.sign(message);

        assert!(!verify_wallet_signature(&owner.address(), &signature, message));
    }

    #[test]
    fn altered_message_is_rejected() {
        let wallet = TestWallet::generate();
        let signature = wallet.sign(b"original");

        assert!(!verify_wallet_signature(&wallet.address(), &signature, b"originaL"));
    }

    #[test]
    fn malformed_inputs_return_false() {
        let wallet = TestWallet::generate();
        let signature = wallet.sign(b"m");

        assert!(!verify_wallet_signature("not-base58-0OIl", &signature, b"m"));
        assert!(!verify_wallet_signature("abc", &signature, b"m"));
        assert!(!verify_wallet_signature(&wallet.address(), "0OIl", b"m"));
        assert!(!verify_wallet_signature(&wallet.address(), "3yZe7d", b"m"));
        assert!(!verify_wallet_signature("", "", b""));
    }
}
