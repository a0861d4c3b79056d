// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cryptographic primitives used by the delivery pipeline.
//!
//! - `envelope` - AES-256-GCM sealing of uploaded files at rest

pub mod envelope;

pub use envelope::{open, seal, EnvelopeKey, EnvelopeKeyError, IntegrityError};
