//! Courtside Back binary entrypoint wiring configuration, persistence, REST and SSE layers.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtside_back::{
    config::{AppConfig, StorageConfig},
    dao::state_store::{StateBackend, file::FileStateBackend},
    routes,
    state::{AppState, SharedState, StateStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = open_store(config.storage()).await?;
    let app_state = AppState::new(store, &config);

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone(), &config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Viewer streams never end on their own.
            app_state.broadcaster().close_all();
        })
        .await
        .context("serving axum")?;

    Ok(())
}

/// Open the configured persistence backend and hydrate the state store from it.
async fn open_store(storage: &StorageConfig) -> anyhow::Result<StateStore> {
    let backend: Arc<dyn StateBackend> = match storage {
        StorageConfig::Memory => {
            info!("memory-only storage; state is lost on restart");
            return Ok(StateStore::in_memory());
        }
        StorageConfig::File { dir } => {
            info!(dir = %dir.display(), "using JSON file storage");
            Arc::new(FileStateBackend::new(dir.clone()))
        }
        #[cfg(feature = "mongo-store")]
        StorageConfig::Mongo { uri, database } => {
            use courtside_back::dao::state_store::mongodb::{MongoConfig, MongoStateBackend};

            let config = MongoConfig::from_uri(uri, database.as_deref())
                .await
                .context("parsing MongoDB configuration")?;
            info!(database = %config.database_name, "using MongoDB storage");
            Arc::new(
                MongoStateBackend::connect(config)
                    .await
                    .context("connecting to MongoDB")?,
            )
        }
        #[cfg(not(feature = "mongo-store"))]
        StorageConfig::Mongo { .. } => {
            anyhow::bail!("MongoDB storage requires the `mongo-store` feature")
        }
        #[cfg(feature = "couch-store")]
        StorageConfig::Couch {
            base_url,
            database,
            username,
            password,
        } => {
            use courtside_back::dao::state_store::couchdb::{CouchConfig, CouchStateBackend};

            let mut config = CouchConfig::new(base_url.clone(), database.clone());
            if let (Some(username), Some(password)) = (username, password) {
                config = config.with_credentials(username.clone(), password.clone());
            }
            info!(database = %config.database, "using CouchDB storage");
            Arc::new(
                CouchStateBackend::connect(config)
                    .await
                    .context("connecting to CouchDB")?,
            )
        }
        #[cfg(not(feature = "couch-store"))]
        StorageConfig::Couch { .. } => {
            anyhow::bail!("CouchDB storage requires the `couch-store` feature")
        }
    };

    Ok(StateStore::load(backend).await)
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState, config: &AppConfig) -> anyhow::Result<Router<()>> {
    Ok(routes::router(state)
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http()))
}

/// Restrict CORS to the configured origin, or allow everything when none is set.
fn cors_layer(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    let Some(origin) = config.allowed_origin() else {
        return Ok(CorsLayer::permissive());
    };

    let origin = HeaderValue::from_str(origin).context("parsing allowed_origin")?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
