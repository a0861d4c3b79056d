// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; any error aborts the process.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the database, blobs and audit logs | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `ENCRYPTION_KEY` | 64 hex chars, AES-256 key for stored files | Required |
//! | `JWT_SECRET` | HMAC secret for access tokens | Required |
//! | `PAYMENT_WEBHOOK_SECRET` | Bearer the payment backend presents when recording purchases | Required |
//! | `LEDGER_RPC_URL` | DAS JSON-RPC endpoint used for ownership lookups | Required |
//! | `LEDGER_TIMEOUT_SECS` | Upper bound on one ownership lookup | `5` |
//! | `FETCH_TIMEOUT_SECS` | Timeout for fetching externally hosted files | `30` |
//! | `ACCESS_TOKEN_TTL_SECS` | Lifetime of issued access tokens, at most one day | `900` |
//! | `EXTERNAL_FILE_MODE` | `fetch` proxies external files, `redirect` returns the URL | `fetch` |
//! | `DIAGNOSTIC_ERRORS` | Attach internal error detail to 5xx bodies | `false` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use crate::crypto::{EnvelopeKey, EnvelopeKeyError};

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const PAYMENT_WEBHOOK_SECRET_ENV: &str = "PAYMENT_WEBHOOK_SECRET";
pub const LEDGER_RPC_URL_ENV: &str = "LEDGER_RPC_URL";
pub const LEDGER_TIMEOUT_SECS_ENV: &str = "LEDGER_TIMEOUT_SECS";
pub const FETCH_TIMEOUT_SECS_ENV: &str = "FETCH_TIMEOUT_SECS";
pub const ACCESS_TOKEN_TTL_SECS_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const EXTERNAL_FILE_MODE_ENV: &str = "EXTERNAL_FILE_MODE";
pub const DIAGNOSTIC_ERRORS_ENV: &str = "DIAGNOSTIC_ERRORS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("ENCRYPTION_KEY is invalid: {0}")]
    EncryptionKey(#[from] EnvelopeKeyError),

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

/// How files stored at an external URL are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalFileMode {
    /// Fetch the body server-side and stream it back.
    #[default]
    Fetch,
    /// Hand the URL back to the client.
    Redirect,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Fully validated process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub encryption_key: EnvelopeKey,
    pub jwt_secret: String,
    pub payment_webhook_secret: String,
    pub ledger_rpc_url: String,
    pub ledger_timeout: Duration,
    pub fetch_timeout: Duration,
    pub access_token_ttl_secs: u64,
    pub external_file_mode: ExternalFileMode,
    pub diagnostic_errors: bool,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&get, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    var: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let encryption_key = EnvelopeKey::from_hex(required(ENCRYPTION_KEY_ENV)?.trim())?;
        let jwt_secret = required(JWT_SECRET_ENV)?;
        let payment_webhook_secret = required(PAYMENT_WEBHOOK_SECRET_ENV)?.trim().to_string();

        let ledger_rpc_url = required(LEDGER_RPC_URL_ENV)?;
        url::Url::parse(&ledger_rpc_url).map_err(|e| ConfigError::Invalid {
            var: LEDGER_RPC_URL_ENV,
            reason: e.to_string(),
        })?;

        let ledger_timeout = Duration::from_secs(parse_or(
            &get,
            LEDGER_TIMEOUT_SECS_ENV,
            DEFAULT_LEDGER_TIMEOUT_SECS,
        )?);
        let fetch_timeout = Duration::from_secs(parse_or(
            &get,
            FETCH_TIMEOUT_SECS_ENV,
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);
        let access_token_ttl_secs =
            parse_or(&get, ACCESS_TOKEN_TTL_SECS_ENV, DEFAULT_TOKEN_TTL_SECS)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&access_token_ttl_secs) {
            return Err(ConfigError::Invalid {
                var: ACCESS_TOKEN_TTL_SECS_ENV,
                reason: format!("must be between 1 and {MAX_TOKEN_TTL_SECS}"),
            });
        }

        let external_file_mode = match get(EXTERNAL_FILE_MODE_ENV).as_deref() {
            None | Some("fetch") => ExternalFileMode::Fetch,
            Some("redirect") => ExternalFileMode::Redirect,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: EXTERNAL_FILE_MODE_ENV,
                    reason: format!("expected 'fetch' or 'redirect', got '{other}'"),
                })
            }
        };

        let diagnostic_errors = get(DIAGNOSTIC_ERRORS_ENV)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            data_dir: get(DATA_DIR_ENV)
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            bind_addr,
            encryption_key,
            jwt_secret,
            payment_webhook_secret,
            ledger_rpc_url,
            ledger_timeout,
            fetch_timeout,
            access_token_ttl_secs,
            external_file_mode,
            diagnostic_errors,
            tls,
            log_format,
        })
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
