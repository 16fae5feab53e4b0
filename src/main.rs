use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicesync_backend::infrastructure::config::{Config, LogFormat};
use voicesync_backend::infrastructure::db::{check_connection, create_pool};
use voicesync_backend::infrastructure::http::start_http_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting VoiceSync Backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories and external clients
    tracing::info!("Instantiating repositories...");
    let project_repo: Arc<dyn voicesync_backend::infrastructure::repositories::ProjectRepository> =
        Arc::new(voicesync_backend::infrastructure::repositories::PgProjectRepository::new(
            pool.clone(),
        ));
    let credential_repo: Arc<
        dyn voicesync_backend::infrastructure::repositories::CredentialRepository,
    > = Arc::new(voicesync_backend::infrastructure::repositories::PgCredentialRepository::new(
        pool.clone(),
    ));
    let provider: Arc<dyn voicesync_backend::infrastructure::repositories::VoiceProvider> =
        Arc::new(voicesync_backend::infrastructure::repositories::HttpVoiceProvider::new(
            config.provider_base_url.clone(),
        ));
    let storage: Arc<dyn voicesync_backend::infrastructure::repositories::MediaStorage> =
        Arc::new(voicesync_backend::infrastructure::repositories::BucketMediaStorage::new(
            config.storage_base_url.clone(),
            config.storage_bucket.clone(),
            config.storage_service_key.clone(),
        ));
    let extractor: Arc<dyn voicesync_backend::infrastructure::repositories::ContentExtractor> =
        Arc::new(voicesync_backend::infrastructure::repositories::HttpContentExtractor::new());

    // 2. Instantiate services (inject repositories and clients)
    tracing::info!("Instantiating services...");
    let channel = Arc::new(voicesync_backend::domain::status::StatusChannel::default());
    let normalizer = Arc::new(voicesync_backend::domain::content::ContentNormalizer::new(
        extractor,
        config.extraction_cache_enabled,
    ));
    let selector = Arc::new(voicesync_backend::domain::credential::KeySelector::new(
        credential_repo.clone(),
        provider.clone(),
    ));
    let settings = voicesync_backend::domain::generation::GenerationSettings {
        credential_attempts: config.credential_attempts,
        poll_interval: std::time::Duration::from_secs(config.conversion_poll_interval_secs),
        poll_max_attempts: config.conversion_poll_max_attempts,
        lease_ttl: chrono::Duration::seconds(config.lease_ttl_secs),
    };
    let project_service = Arc::new(voicesync_backend::domain::project::ProjectService::new(
        project_repo.clone(),
        storage.clone(),
        normalizer,
    ));
    let credential_service = Arc::new(voicesync_backend::domain::credential::CredentialService::new(
        credential_repo.clone(),
        provider.clone(),
    ));
    let generation_service = Arc::new(voicesync_backend::domain::generation::GenerationService::new(
        project_repo.clone(),
        selector,
        provider,
        storage,
        channel.clone(),
        settings,
    ));

    // 3. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let project_controller = Arc::new(
        voicesync_backend::controllers::project::ProjectController::new(project_service.clone()),
    );
    let credential_controller = Arc::new(
        voicesync_backend::controllers::credential::CredentialController::new(credential_service),
    );
    let generation_controller = Arc::new(
        voicesync_backend::controllers::generation::GenerationController::new(
            generation_service,
            project_service,
            channel,
        ),
    );

    // Start HTTP server with all routes
    start_http_server(
        pool,
        config,
        project_controller,
        credential_controller,
        generation_controller,
    )
    .await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voicesync_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voicesync_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
