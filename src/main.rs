//! Order Tracker - order ingest and lookup service
//!
//! Binary entry point: wires configuration, store, cache, stream and HTTP
//! server together and handles graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_tracker::api::{create_router, AppState};
use order_tracker::config::{Config, StoreBackend, StreamBackend};
use order_tracker::order::OrderRepository;
use order_tracker::storage::{InMemoryOrderRepository, PgOrderRepository};
use order_tracker::stream::{self, NatsStream};
use order_tracker::{spawn_consumer_task, OrderService, RecencyCache};

/// Main entry point for the order tracker.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Connect the order store (with retry) and ensure its schema
/// 4. Connect the message stream (NATS JetStream or in-process)
/// 5. Seed the cache from the store's most recent orders and start the consumer
/// 6. Start HTTP server on configured port
/// 7. On SIGINT/SIGTERM: drain HTTP for the grace period, then stop the consumer
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // RUST_LOG wins; LOG_LEVEL is the fallback
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("order_tracker={},tower_http=info", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Order Tracker");
    info!(
        "Configuration loaded: http_port={}, cache_size={}, store={:?}, stream={:?}, db={}:{}/{}",
        config.http_port,
        config.cache_size,
        config.store_backend,
        config.stream.backend,
        config.db.host,
        config.db.port,
        config.db.name
    );

    let repo: Arc<dyn OrderRepository> = match config.store_backend {
        StoreBackend::Postgres => {
            let repo = PgOrderRepository::connect(&config.db)
                .await
                .context("connecting to postgres")?;
            repo.ensure_schema().await.context("creating schema")?;
            Arc::new(repo)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory order store; orders will not survive a restart");
            Arc::new(InMemoryOrderRepository::new())
        }
    };

    let cache = Arc::new(RecencyCache::new(config.cache_size));
    let shutdown = CancellationToken::new();

    // The consumer type differs per backend, so each arm spawns its own task
    let (service, consumer_handle) = match config.stream.backend {
        StreamBackend::Nats => {
            let nats = NatsStream::connect(&config.stream)
                .await
                .context("connecting to NATS")?;
            let consumer = nats.consumer().await.context("opening stream consumer")?;
            let service = OrderService::new(repo, cache, Arc::new(nats.publisher()));
            seed_cache(&service).await?;
            let handle = spawn_consumer_task(
                consumer,
                service.clone(),
                config.stream.poll_interval,
                shutdown.child_token(),
            );
            (service, handle)
        }
        StreamBackend::Memory => {
            warn!("Using in-process stream; only orders created through the API are ingested");
            let (producer, consumer) =
                stream::channel(config.stream.topic.clone(), config.stream.buffer);
            let service = OrderService::new(repo, cache, Arc::new(producer));
            seed_cache(&service).await?;
            let handle = spawn_consumer_task(
                consumer,
                service.clone(),
                config.stream.poll_interval,
                shutdown.child_token(),
            );
            (service, handle)
        }
    };
    info!("Consuming topic '{}'", config.stream.topic);

    let app = create_router(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    let server_token = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(server_token.cancelled_owned())
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Server exited on its own; stop the consumer and report
            shutdown.cancel();
            let _ = consumer_handle.await;
            result.context("server task panicked")?.context("server error")?;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    shutdown.cancel();

    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(result) => result.context("server task panicked")?.context("server error")?,
        Err(_) => {
            warn!(
                "HTTP requests still in flight after {:?}, forcing shutdown",
                config.shutdown_grace
            );
            server.abort();
        }
    }

    // The consumer finishes its current message before exiting
    if let Err(err) = consumer_handle.await {
        warn!("Consumer task ended abnormally: {}", err);
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn seed_cache(service: &OrderService) -> anyhow::Result<()> {
    let loaded = service
        .warm_cache()
        .await
        .context("seeding cache from store")?;
    info!("Cache seeded with {} orders", loaded);
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
