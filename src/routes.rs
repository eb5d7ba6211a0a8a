// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        commission::commission_handler,
        payment::{admin_payment_handler, payment_handler},
        payout::payout_handler,
    },
    middleware::{auth, role_check},
    models::usermodel::UserRole,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // role_check reads the user that auth inserts, so auth is layered last
    let admin_routes = Router::new()
        .nest("/payouts", payout_handler())
        .nest("/payments", admin_payment_handler())
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }))
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .nest("/payments", payment_handler())
        .nest(
            "/commissions",
            commission_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
