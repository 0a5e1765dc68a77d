// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, progress},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the progress service router.
///
/// * Public auth routes, bearer-protected progress routes.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let progress_routes = Router::new()
        .route("/", get(progress::get_progress))
        .route("/sync", post(progress::sync_progress))
        .route("/add-xp", post(progress::add_xp))
        .route("/xp-history", get(progress::xp_history))
        .route("/check-badges", post(progress::check_badges))
        .route("/badges", get(progress::badge_history))
        .route("/update-streak", post(progress::update_streak))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/progress", progress_routes)
        // Global Middleware (outermost first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
