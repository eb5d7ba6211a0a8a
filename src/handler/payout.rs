use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::payoutdb::PayoutExt,
    dtos::payoutdtos::{
        ApiResponse, EligibleQueryDto, ExportWeekRequestDto, GeneratePayoutRequestDto, PayoutListQueryDto, PayoutResponseDto,
    },
    error::HttpError,
    service::{error::ServiceError, row_source::row_source_for_upload},
    AppState,
};

const MAX_BANK_FILE_BYTES: usize = 10 * 1024 * 1024;

pub fn payout_handler() -> Router {
    Router::new()
        .route("/", get(list_payouts))
        .route("/eligible", get(get_eligible_affiliates))
        .route("/generate", post(generate_payouts))
        .route("/files", get(list_payout_files))
        .route("/files/export", post(export_payout_file))
        .route("/files/:name", get(download_payout_file))
        .route("/:payout_id", get(get_payout))
        .route(
            "/reconcile",
            post(reconcile_bank_file).layer(DefaultBodyLimit::max(MAX_BANK_FILE_BYTES)),
        )
}

pub async fn get_eligible_affiliates(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<EligibleQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    if query.week_end < query.week_start {
        return Err(HttpError::bad_request("week_end must not be before week_start"));
    }

    let affiliates = app_state
        .payout_service
        .list_eligible(query.week_start, query.week_end, query.kyc_status)
        .await?;

    Ok(Json(ApiResponse::success("Eligible affiliates retrieved", affiliates)))
}

pub async fn generate_payouts(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<GeneratePayoutRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let report = app_state
        .payout_service
        .generate_payouts(&body.user_ids, body.week_start, body.week_end)
        .await?;

    let message = if report.file_error.is_some() {
        "Payouts approved but the instruction file could not be written, export the week again"
    } else if report.file_name.is_some() {
        "Payouts approved and instruction file generated"
    } else {
        "No payouts were generated for the selected affiliates"
    };

    Ok(Json(ApiResponse::success(message, report)))
}

pub async fn list_payouts(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<PayoutListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let payouts: Vec<PayoutResponseDto> = app_state
        .payout_service
        .list_payouts(query.status)
        .await?
        .into_iter()
        .map(PayoutResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::success("Payouts retrieved", payouts)))
}

pub async fn get_payout(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(payout_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payout = app_state
        .db_client
        .get_payout(payout_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| HttpError::not_found(format!("Payout {} not found", payout_id)))?;

    Ok(Json(ApiResponse::success(
        "Payout retrieved",
        PayoutResponseDto::from(payout),
    )))
}

pub async fn list_payout_files(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let files = app_state.payout_service.list_files().await?;

    Ok(Json(ApiResponse::success("Payout files retrieved", files)))
}

pub async fn export_payout_file(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ExportWeekRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    if body.week_end < body.week_start {
        return Err(HttpError::bad_request("week_end must not be before week_start"));
    }

    let file_name = app_state
        .payout_service
        .export_week(body.week_start, body.week_end)
        .await?;

    let message = if file_name.is_some() {
        "Instruction file written for unexported payouts"
    } else {
        "No unexported payouts for this week"
    };

    Ok(Json(ApiResponse::success(message, file_name)))
}

pub async fn download_payout_file(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let contents = app_state.payout_service.read_file(&name).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        contents,
    ))
}

pub async fn reconcile_bank_file(
    Extension(app_state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(format!("Failed to read upload: {}", e)))?;

        upload = Some((file_name, data.to_vec()));
        break;
    }

    let (file_name, data) = upload.ok_or_else(|| HttpError::bad_request("Missing file field"))?;

    tracing::info!("Bank response upload {} ({} bytes)", file_name, data.len());

    let source = row_source_for_upload(&file_name, data)?;
    let report = app_state
        .reconciliation_service
        .reconcile(source.as_ref())
        .await?;

    Ok(Json(ApiResponse::success("Bank response file processed", report)))
}
