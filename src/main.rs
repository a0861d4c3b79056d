// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use unlockd_server::{
    api::router,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    ledger::DasClient,
    state::{AppState, ServiceSettings},
    storage::{ContentDatabase, LocalBlobStore, StoragePaths},
};

/// Grace period for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() {
    // Tracing must be up before config errors can be reported.
    let log_format = match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    };
    init_tracing(log_format);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let paths = StoragePaths::new(&config.data_dir);
    let content_db = ContentDatabase::open(&paths.content_db_file())
        .expect("Failed to open content database");
    let blobs = LocalBlobStore::new(paths.blobs_dir())
        .await
        .expect("Failed to initialize blob store");
    let ledger = DasClient::new(&config.ledger_rpc_url, config.ledger_timeout)
        .expect("Failed to build ledger client");

    tracing::info!(
        data_dir = %paths.root().display(),
        ledger = %ledger.rpc_url(),
        "storage and ledger initialized"
    );

    let state = AppState::new(
        Arc::new(content_db),
        Arc::new(blobs),
        Arc::new(ledger),
        config.encryption_key.clone(),
        config.jwt_secret.as_bytes(),
        paths,
        ServiceSettings::from_config(&config),
    )
    .expect("Failed to build HTTP client");
    let app = router(state);

    let shutdown = CancellationToken::new();
    let handle = Handle::new();
    tokio::spawn(watch_signals(shutdown.clone()));
    {
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });
    }

    let addr = config.bind_addr;
    match &config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .expect("Failed to load TLS certificate or key");
            tracing::info!(%addr, "Unlockd listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            tracing::info!(%addr, "Unlockd listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTP server failed");
        }
    }

    tracing::info!("server stopped");
}
