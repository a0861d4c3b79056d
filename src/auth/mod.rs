// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Wallet-based authentication for the Unlockd API.
//!
//! ## Auth Flow
//!
//! 1. The wallet signs a challenge document (`challenge`) containing the
//!    action, the content id, a timestamp and a nonce
//! 2. The server verifies the Ed25519 signature against the wallet address
//!    (`signature`) and enforces the replay window
//! 3. On success the server either streams the file or issues a short-lived
//!    HS256 access token (`access_token`)
//! 4. Token holders download with `Authorization: Bearer <token>`
//!    (`extractor`)
//!
//! ## Security
//!
//! - Challenges are accepted from 5 s in the future up to 30 s in the past
//! - Nonces are not tracked; the window is the only replay defense
//! - Access tokens are bound to one wallet and one content id
//! - Purchase recording is reserved to the payment backend's shared secret

pub mod access_token;
pub mod challenge;
pub mod error;
pub mod extractor;
pub mod signature;

pub use access_token::{
    AccessTokenIssuer, IssuedToken, TokenSubject, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS,
};
pub use challenge::{AccessChallenge, ChallengeAction, ChallengeError};
pub use error::AuthError;
pub use extractor::{AccessBearer, PaymentBackend};
pub use signature::verify_wallet_signature;
