use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use crate::{
    controllers::{
        credential::CredentialController, generation::GenerationController, health,
        project::ProjectController,
    },
    infrastructure::auth::{auth_middleware, request_id_middleware},
};

/// Build the application router with all routes configured
pub fn build_router(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    project_controller: Arc<ProjectController>,
    credential_controller: Arc<CredentialController>,
    generation_controller: Arc<GenerationController>,
) -> Router {
    // Generation trigger (needs auth)
    let generation_routes = Router::new()
        .route(
            "/api/podcasts/generate",
            axum::routing::post(GenerationController::generate),
        )
        .route(
            "/api/projects/:projectId/status",
            get(GenerationController::get_status),
        )
        .route(
            "/api/projects/:projectId/events",
            get(GenerationController::events),
        )
        .with_state(generation_controller.clone())
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ));

    // Project routes (require authentication)
    let project_routes = Router::new()
        .route(
            "/api/projects",
            get(ProjectController::list_projects).post(ProjectController::create_project),
        )
        .route(
            "/api/projects/:projectId",
            get(ProjectController::get_project).delete(ProjectController::delete_project),
        )
        .route(
            "/api/projects/:projectId/script",
            axum::routing::put(ProjectController::update_script),
        )
        .route(
            "/api/projects/:projectId/reset",
            axum::routing::post(ProjectController::reset_project),
        )
        .with_state(project_controller.clone())
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ));

    // Credential routes (require authentication)
    let credential_routes = Router::new()
        .route(
            "/api/credentials",
            get(CredentialController::list_credentials)
                .post(CredentialController::create_credential),
        )
        .route(
            "/api/credentials/:credentialId",
            axum::routing::patch(CredentialController::update_credential)
                .delete(CredentialController::delete_credential),
        )
        .with_state(credential_controller.clone())
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool.clone())
        .merge(project_routes)
        .merge(credential_routes)
        .merge(generation_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    project_controller: Arc<ProjectController>,
    credential_controller: Arc<CredentialController>,
    generation_controller: Arc<GenerationController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(
        pool,
        config.clone(),
        project_controller,
        credential_controller,
        generation_controller,
    );

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
