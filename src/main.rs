//! Helpdesk Dashboard Backend
//!
//! REST backend for the support team's dashboard: tickets, notes, calendar
//! events, a searchable knowledge base with file uploads, configurable lookup
//! tables and a Gemini-powered assistant. SQLite persistence, Tantivy search,
//! JWT authentication.

mod api;
mod assistant;
mod auth;
mod calendar;
mod config;
mod db;
mod errors;
mod models;
mod search;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use assistant::GeminiClient;
use auth::JwtKeys;
use config::{Config, LogFormat};
use db::Repository;
use search::SearchIndex;
use storage::{LocalStorage, S3Storage, Storage, LOCAL_FILES_ROUTE};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub storage: Arc<dyn Storage>,
    /// `None` when no Gemini API key is configured
    pub assistant: Option<Arc<GeminiClient>>,
    pub jwt: Arc<JwtKeys>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting Helpdesk Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    let state = build_state(config.clone()).await?;

    tracing::info!("Storage backend: {}", state.storage.backend_name());
    if state.assistant.is_none() {
        tracing::warn!("No GEMINI_API_KEY configured. The assistant endpoint is disabled!");
    }

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the database, index and storage backend described by `config`.
pub async fn build_state(config: Config) -> Result<AppState, Box<dyn std::error::Error>> {
    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // Build initial search index from database
    tracing::info!("Building search index...");
    let indexed = search.rebuild_from(&repo).await?;
    tracing::info!("Search index built with {} resources", indexed);

    let storage: Arc<dyn Storage> = match &config.s3 {
        Some(s3) => Arc::new(S3Storage::new(s3)),
        None => Arc::new(LocalStorage::new(&config.upload_dir)?),
    };

    let assistant = match &config.gemini {
        Some(gemini) => Some(Arc::new(GeminiClient::new(gemini)?)),
        None => None,
    };

    let jwt = Arc::new(JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours));

    Ok(AppState {
        repo,
        search,
        storage,
        assistant,
        jwt,
        config: Arc::new(config),
    })
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone keys and user store for the auth layer
    let keys = state.jwt.clone();
    let users = state.repo.clone();

    // Authenticated API routes
    let protected_routes = Router::new()
        .route("/me", get(api::me))
        // Users
        .route("/users", get(api::list_users))
        .route("/users/{id}/role", put(api::update_user_role))
        // Events
        .route("/events", get(api::list_events).post(api::create_event))
        .route("/events/calendar", get(api::event_calendar))
        .route(
            "/events/{id}",
            get(api::get_event)
                .put(api::update_event)
                .delete(api::delete_event),
        )
        // Resources
        .route(
            "/resources",
            get(api::list_resources).post(api::create_link_resource),
        )
        .route(
            "/resources/upload",
            post(api::upload_resource)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/resources/search", get(api::search_resources))
        .route(
            "/resources/{id}",
            get(api::get_resource)
                .put(api::update_resource)
                .delete(api::delete_resource),
        )
        // Tickets
        .route("/tickets", get(api::list_tickets).post(api::create_ticket))
        .route("/tickets/stats", get(api::ticket_stats))
        .route(
            "/tickets/{id}",
            get(api::get_ticket)
                .put(api::update_ticket)
                .delete(api::delete_ticket),
        )
        // Notes
        .route("/notes", get(api::list_notes).post(api::create_note))
        .route(
            "/notes/{id}",
            get(api::get_note)
                .put(api::update_note)
                .delete(api::delete_note),
        )
        // Config lookup tables
        .route(
            "/config/{kind}",
            get(api::list_catalog_entries).post(api::create_catalog_entry),
        )
        .route(
            "/config/{kind}/{id}",
            put(api::update_catalog_entry).delete(api::delete_catalog_entry),
        )
        // Apply JWT auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::jwt_auth_layer(keys.clone(), users.clone(), req, next)
        }));

    // Routes usable before logging in
    let public_routes = Router::new()
        .route("/signup", post(api::signup))
        .route("/login", post(api::login))
        .route("/assistant", post(api::ask_assistant))
        .route("/assistant/wizard", post(api::wizard_step));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    let mut router = Router::new()
        .nest("/api", protected_routes.merge(public_routes))
        .merge(health_routes);

    // Uploaded files are served directly when they live on local disk
    if state.config.s3.is_none() {
        router = router.nest_service(LOCAL_FILES_ROUTE, ServeDir::new(&state.config.upload_dir));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
