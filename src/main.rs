use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use commerce_backend::api::{self, AppState};
use commerce_backend::config::{AppConfig, StorageBackend, StorageConfig};
use commerce_backend::domain::catalog::CatalogService;
use commerce_backend::domain::order::{EngineConfig, OrderEngine};
use commerce_backend::health::HealthRegistry;
use commerce_backend::identity::{Principal, TokenService};
use commerce_backend::metrics::{self, Metrics};
use commerce_backend::store::{
    schema, CatalogStore, InMemoryCatalogStore, InMemoryOrderStore, OrderStore, ScyllaCatalogStore,
    ScyllaOrderStore,
};
use commerce_backend::utils::{CircuitBreaker, CircuitBreakerConfig};

struct Stores {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    health: HealthRegistry,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,commerce_backend=debug")),
        )
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    tracing::info!(?config, "🚀 Starting commerce backend");

    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    let stores = connect_stores(&config.storage, &metrics).await?;

    let engine = OrderEngine::new(
        stores.orders,
        stores.catalog.clone(),
        metrics.clone(),
        EngineConfig {
            conflict_attempts: config.orders.conflict_max_attempts,
            public_listing: config.orders.public_listing,
        },
    );
    let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl);

    if config.storage.backend == StorageBackend::Memory {
        // No account service in this mode; hand out an admin token to seed the catalog.
        let token = tokens.issue(&Principal::admin(Uuid::new_v4()))?;
        tracing::info!(%token, "Development admin token");
    }

    let state = web::Data::new(AppState {
        engine: Arc::new(engine),
        catalog: Arc::new(CatalogService::new(stores.catalog)),
        tokens: Arc::new(tokens),
        request_timeout: config.server.request_timeout,
    });

    tracing::info!(
        "🌐 Serving API on http://{}:{}",
        config.server.host,
        config.server.port
    );
    let api_server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run();

    let metrics_server = metrics::start_metrics_server(
        metrics,
        stores.health,
        &config.server.host,
        config.server.metrics_port,
    );

    tokio::try_join!(api_server, metrics_server)?;

    tracing::info!("👋 Shut down");
    Ok(())
}

async fn connect_stores(config: &StorageConfig, metrics: &Metrics) -> anyhow::Result<Stores> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let orders = Arc::new(InMemoryOrderStore::default());
            let catalog = Arc::new(InMemoryCatalogStore::default());
            let health = HealthRegistry::new()
                .register(orders.clone())
                .register(catalog.clone());

            Ok(Stores {
                orders,
                catalog,
                health,
            })
        }
        StorageBackend::Scylla => {
            tracing::info!(nodes = ?config.scylla_nodes, "Connecting to ScyllaDB...");
            let session: Session = SessionBuilder::new()
                .known_nodes(&config.scylla_nodes)
                .build()
                .await
                .context("Failed to connect to ScyllaDB")?;

            schema::ensure_schema(&session, &config.keyspace, config.replication_factor).await?;
            let session = Arc::new(session);

            let orders = Arc::new(ScyllaOrderStore::new(
                session.clone(),
                CircuitBreaker::new("orders", CircuitBreakerConfig::default())
                    .with_gauge(metrics.circuit_gauge("orders")),
            ));
            let catalog = Arc::new(ScyllaCatalogStore::new(
                session,
                CircuitBreaker::new("catalog", CircuitBreakerConfig::default())
                    .with_gauge(metrics.circuit_gauge("catalog")),
            ));
            let health = HealthRegistry::new()
                .register(orders.clone())
                .register(catalog.clone());

            Ok(Stores {
                orders,
                catalog,
                health,
            })
        }
    }
}
