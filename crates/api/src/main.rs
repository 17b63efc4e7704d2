mod config;
mod error;
mod favorites;
mod handlers;
mod middleware;
mod models;
mod quota;
mod ratings;
mod repos;
mod services;
mod state;
mod stores;
mod targets;
#[cfg(test)]
mod test_utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{Router, http};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{Config, LedgerBackend},
    quota::{CachedPolicyProvider, PolicyProvider, QuotaLedgerStore, RateLimiter},
    repos::{
        PgCardRepo, PgCollectionRepo, PgCommentRepo, PgFavoriteRepo, PgQuotaLedger,
        PgQuotaPolicyRepo, PgRatingRepo, PgSetRepo, PgStatusRepo, Repos,
    },
    services::PgTokenAuthService,
    state::AppState,
    stores::RedisQuotaLedger,
};

#[derive(Parser)]
#[command(name = "api")]
#[command(about = "Flashdeck API server")]
struct Args {
    /// Run database migrations and exit
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    // Guard must stay alive for the lifetime of the process
    let _sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(config.env.clone().into()),
                ..Default::default()
            },
        ))
    });

    // Set up tracing: JSON in production, human-readable otherwise
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    let database = PgPoolOptions::new()
        .max_connections(25)
        .connect(&config.database_url)
        .await?;

    // Run migrations via init container only (--migrate flag)
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&database).await?;
        tracing::info!("Migrations complete");
        return Ok(());
    }

    let repos = Repos {
        sets: Arc::new(PgSetRepo::new(database.clone())),
        cards: Arc::new(PgCardRepo::new(database.clone())),
        collections: Arc::new(PgCollectionRepo::new(database.clone())),
        comments: Arc::new(PgCommentRepo::new(database.clone())),
        ratings: Arc::new(PgRatingRepo::new(database.clone())),
        favorites: Arc::new(PgFavoriteRepo::new(database.clone())),
        quota_policy: Arc::new(PgQuotaPolicyRepo::new(database.clone())),
        status: Arc::new(PgStatusRepo::new(database.clone())),
    };

    let ledger: Arc<dyn QuotaLedgerStore> = match config.ledger_backend {
        LedgerBackend::Postgres => Arc::new(PgQuotaLedger::new(database.clone())),
        LedgerBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("redis ledger backend selected without a redis url")?;
            Arc::new(RedisQuotaLedger::new(redis::Client::open(url)?))
        }
    };
    tracing::info!(backend = ?config.ledger_backend, "quota ledger configured");

    let policy: Arc<dyn PolicyProvider> = Arc::new(CachedPolicyProvider::new(
        repos.quota_policy.clone(),
        Duration::from_secs(config.policy_cache_secs),
    ));

    let state = AppState {
        config: config.clone(),
        repos,
        limiter: RateLimiter::new(ledger, policy.clone()),
        policy,
        auth: Arc::new(PgTokenAuthService::new(database)),
    };

    // Request ID header name
    let x_request_id = http::HeaderName::from_static("x-request-id");

    let app = Router::new()
        .nest("/health", handlers::health::router())
        .nest("/version", handlers::health::version_router())
        .nest("/sets", handlers::sets::router())
        .nest("/collections", handlers::collections::router())
        .nest(
            "/users",
            handlers::collections::user_router().merge(handlers::sets::user_router()),
        )
        .nest("/comments", handlers::comments::router())
        .nest("/ratings", handlers::ratings::router())
        .nest("/favorites", handlers::favorites::router())
        .nest("/quota", handlers::quota::router())
        .nest("/admin", handlers::admin::router())
        .with_state(state)
        // Request ID: generate UUID, include in logs, return in response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &http::Request<axum::body::Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            },
        ))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1MB limit

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
