use enrollment_api::config::Config;
use enrollment_api::db::Database;
use enrollment_api::handlers::AppState;
use enrollment_api::postal_client::PostalLookupClient;
use enrollment_api::repositories::{PgAddressRepository, PgEnrollmentRepository};
use enrollment_api::router;
use enrollment_api::services::EnrollmentService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the database pool (running migrations),
/// the ViaCEP client and the enrollment service, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "enrollment_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let postal_client = PostalLookupClient::new(&config);
    tracing::info!("ViaCEP client initialized: {}", config.via_cep_api);

    let enrollment_service = EnrollmentService::new(
        Arc::new(PgEnrollmentRepository::new(db.pool.clone())),
        Arc::new(PgAddressRepository::new(db.pool.clone())),
        postal_client,
    );

    let app_state = Arc::new(AppState {
        enrollment_service: Arc::new(enrollment_service),
    });

    // Rate limiting: 10 req/sec per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let api = router::api_routes().layer(ServiceBuilder::new().layer(GovernorLayer {
        config: governor_conf,
    }));

    // Health check bypasses rate limiting
    let app = router::build_router(app_state, api);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
