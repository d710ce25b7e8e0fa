//! Visitmark server - face-embedding loyalty tracking.
//!
//! Serves the JSON API used by the phone app (enroll, scan-visit) and the
//! customer management endpoints. Pending migrations are applied at startup.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tokio::signal;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use visitmark_server::config::LogFormat;
use visitmark_server::{AppState, ServerConfig, app, db};

const DEFAULT_LOG_FILTER: &str = "visitmark_server=info,tower_http=debug";

#[tokio::main]
async fn main() {
    // Sentry must be initialized before the subscriber, so config comes first.
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("visitmark-server: {e}");
            }
            std::process::exit(2);
        }
    };

    let sentry_guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Cow::Owned),
                sample_rate: config.sentry_sample_rate,
                traces_sample_rate: config.sentry_traces_sample_rate,
                attach_stacktrace: true,
                // Request bodies are face embeddings.
                send_default_pii: false,
                ..Default::default()
            },
        ))
    });

    init_tracing(config.log_format);
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    if let Err(e) = serve(config).await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

/// Install the global subscriber: env filter, text or JSON output, Sentry.
fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let (json_layer, text_layer) = match format {
        LogFormat::Json => (Some(fmt::layer().json().flatten_event(true)), None),
        LogFormat::Text => (None, Some(fmt::layer())),
    };

    // warn/error become Sentry events, info/debug breadcrumbs.
    let sentry_layer =
        sentry_tracing::layer().event_filter(|metadata: &tracing::Metadata<'_>| {
            match *metadata.level() {
                Level::ERROR | Level::WARN => EventFilter::Event,
                Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
                _ => EventFilter::Ignore,
            }
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_layer)
        .init();
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool(&config.database_url).await?;
    db::migrate(&pool).await?;
    tracing::info!("Database ready");

    let loyalty = config.loyalty;
    tracing::info!(
        embedding_dim = loyalty.embedding_dim(),
        match_threshold = loyalty.match_threshold(),
        reward_every = loyalty.reward_every(),
        "Loyalty settings loaded"
    );

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("visitmark listening on http://{addr}");

    axum::serve(listener, app(AppState::new(loyalty, pool)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}");
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    let _ = signal::ctrl_c().await;

    tracing::info!("Shutdown signal received, draining connections");
}
