use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::IdentityProvider;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::EntityStore;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Shared by every handler. Cloned per request; everything inside is cheap
/// to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub config: Arc<AppConfig>,
    pub identity: IdentityProvider,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, config: AppConfig) -> Self {
        let identity = IdentityProvider::new(&config.security);
        Self {
            store,
            config: Arc::new(config),
            identity,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/auth/signup", post(public::auth::signup))
        .route("/auth/token", post(public::auth::token))
        // Protected
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, documentation, projects, tasks};

    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/:id",
            get(projects::get).put(projects::update).delete(projects::delete),
        )
        .route(
            "/projects/:id/members",
            get(projects::members).post(projects::add_member),
        )
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/:id", get(tasks::get).put(tasks::update).delete(tasks::delete))
        .route("/documentation", get(documentation::list).post(documentation::create))
        .route(
            "/documentation/:id",
            get(documentation::get)
                .put(documentation::update)
                .delete(documentation::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if security.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
