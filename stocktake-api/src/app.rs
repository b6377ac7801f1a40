/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use stocktake_api::{app::{build_router, AppState}, config::Config};
/// use stocktake_shared::store::InMemoryOrganizationStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(InMemoryOrganizationStore::new()), None, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use stocktake_shared::{auth::middleware::authenticate, store::OrganizationStore, vision::VisionModel};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Organization storage
    pub store: Arc<dyn OrganizationStore>,

    /// Vision model, `None` when scanning is not configured
    pub vision: Option<Arc<dyn VisionModel>>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        store: Arc<dyn OrganizationStore>,
        vision: Option<Arc<dyn VisionModel>>,
        config: Config,
    ) -> Self {
        Self {
            store,
            vision,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token validation
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/                            # Bearer token required
///     ├── GET   /organization
///     ├── POST  /organization
///     ├── PATCH /organization
///     ├── POST  /organization/join
///     ├── POST  /organization/leave
///     ├── POST  /organization/regenerate-code
///     ├── POST  /organization/transfer-ownership
///     └── POST  /scan
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (`/api` only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let organization_routes = Router::new()
        .route(
            "/",
            get(routes::organization::get_organization)
                .post(routes::organization::create_organization)
                .patch(routes::organization::update_organization),
        )
        .route("/join", post(routes::organization::join_organization))
        .route("/leave", post(routes::organization::leave_organization))
        .route(
            "/regenerate-code",
            post(routes::organization::regenerate_invite_code),
        )
        .route(
            "/transfer-ownership",
            post(routes::organization::transfer_ownership),
        );

    let api_routes = Router::new()
        .nest("/organization", organization_routes)
        .route("/scan", post(routes::scan::scan_image))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = &config.api.cors_origins;

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        // Development mode: any origin, bearer auth only
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, then injects `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(&req, state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
