// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Control
//!
//! Decides whether a wallet may read a content item and, if so, delivers it.
//!
//! - `oracle` - ledger-first ownership check with local grant fallback
//! - `retrieval` - locate and fetch stored file bytes
//! - `verifier` - the request state machine tying it together
//! - `error` - denial reasons and their HTTP mapping

pub mod error;
pub mod oracle;
pub mod retrieval;
pub mod verifier;

pub use error::AccessError;
pub use oracle::{OwnershipDecision, OwnershipOracle};
pub use retrieval::{FileRetriever, RetrievalError, RetrievedFile};
pub use verifier::{
    authenticate, AccessVerifier, Delivery, GrantedAccess, SignedRequest, VerificationState,
};
