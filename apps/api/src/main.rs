//! Kasira API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use kasira_application::{
    AddressDetailService, AddressSearchService, DirectoryService, GeocoderStats,
    PermissionService, SearchThrottle, UserDirectory,
};
use kasira_core::AppError;
use kasira_infrastructure::{JsonFixtureStore, MapsCoReverseGeocoder, PhotonGeocoder};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_owned()));
    let photon_base_url = env::var("PHOTON_BASE_URL")
        .unwrap_or_else(|_| "https://photon.komoot.io".to_owned());
    let reverse_base_url =
        env::var("GEOCODE_BASE_URL").unwrap_or_else(|_| "https://geocode.maps.co".to_owned());
    let reverse_api_key = env::var("GEOCODE_API_KEY")
        .ok()
        .filter(|value| !value.trim().is_empty());

    let store = Arc::new(JsonFixtureStore::load(&data_dir)?);
    let user_directory: Arc<dyn UserDirectory> = store.clone();

    let permission_service = Arc::new(PermissionService::new(store.clone()));
    let directory_service = Arc::new(DirectoryService::new(store.clone(), store.clone()));

    let http_client = reqwest::Client::builder()
        .user_agent("kasira-api")
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let throttle = Arc::new(SearchThrottle::default());
    let geocoder_stats = Arc::new(GeocoderStats::new());

    let forward_geocoder = Arc::new(PhotonGeocoder::new(
        http_client.clone(),
        photon_base_url,
        throttle.clone(),
        geocoder_stats.clone(),
    ));
    let detail_geocoder = Arc::new(MapsCoReverseGeocoder::new(
        http_client,
        reverse_base_url,
        reverse_api_key,
        throttle,
        geocoder_stats.clone(),
    ));

    let address_search_service = Arc::new(AddressSearchService::new(forward_geocoder.clone()));
    let address_detail_service = Arc::new(AddressDetailService::new(
        forward_geocoder,
        detail_geocoder,
    ));

    let app_state = AppState {
        permission_service,
        directory_service,
        address_search_service,
        address_detail_service,
        user_directory,
        geocoder_stats,
        frontend_url: frontend_url.clone(),
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/api/users", get(handlers::directory::list_users_handler))
        .route("/api/roles", get(handlers::directory::list_roles_handler))
        .route("/api/geo/suggest", get(handlers::geo::suggest_handler))
        .route("/api/geo/detail", post(handlers::geo::detail_handler))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_view,
        ))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        // Answers 401 with its own envelope, so it gates itself.
        .route("/api/perm/caps", get(handlers::perm::caps_handler))
        .merge(protected_routes)
        .layer(session_layer)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Validation(format!("invalid API_HOST: {error}")))?;
    let address = SocketAddr::new(host, api_port);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;
    info!(%address, "kasira api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
