use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    db::{commissiondb::CommissionExt, userdb::UserExt},
    dtos::{commissiondtos::CommissionSummaryDto, payoutdtos::ApiResponse},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::error::ServiceError,
    AppState,
};

pub fn commission_handler() -> Router {
    Router::new().route("/me", get(get_my_commissions))
}

pub async fn get_my_commissions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let entries = app_state
        .db_client
        .list_user_commissions(auth.user.id)
        .await
        .map_err(ServiceError::from)?;

    let earnings = app_state
        .db_client
        .get_industry_earnings(auth.user.id)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(ApiResponse::success(
        "Commissions retrieved",
        CommissionSummaryDto::new(entries, earnings),
    )))
}
