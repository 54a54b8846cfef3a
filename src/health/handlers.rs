use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::catalog::CURRENT_CONDITIONS;
use super::dto::{
    AssessmentResponse, RecordView, RecordsResponse, RequiredFieldsResponse, SubmissionResponse,
};
use super::repo::HealthRecord;
use super::{intake, reconcile};
use crate::auth::services::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/records", post(submit_record).get(list_records))
        .route("/assess_risk", post(assess_risk))
        .route("/get_required_fields", get(get_required_fields))
}

/// Submit a questionnaire: normalize, score upstream, persist, present.
/// Every stage failure is terminal for the request; an upstream rejection
/// persists nothing.
#[instrument(skip(state, body))]
async fn submit_record(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let record = intake::normalize(&body).map_err(ApiError::Validation)?;

    let assessment = state.scoring.assess_risk(&record).await?;

    let saved = HealthRecord::save(&state.db, user.id, &record, &assessment)
        .await
        .map_err(ApiError::Persistence)?;

    info!(user_id = %user.id, record_id = %saved.id, "health record saved");

    let record = RecordView::from(saved);
    let results = record.risk_assessment.clone();
    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            message: "Health record submitted successfully".to_string(),
            results,
            record,
        }),
    ))
}

#[instrument(skip(state))]
async fn list_records(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RecordsResponse>, ApiError> {
    let records = HealthRecord::list_by_user(&state.db, user.id)
        .await
        .map_err(ApiError::Persistence)?;

    let records = records.into_iter().map(RecordView::from).collect();
    Ok(Json(RecordsResponse { records }))
}

/// Score without persisting.
#[instrument(skip(state, body))]
async fn assess_risk(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let record = intake::normalize(&body).map_err(ApiError::Validation)?;
    let assessment = state.scoring.assess_risk(&record).await?;

    let results = reconcile::reconcile(
        &serde_json::to_value(&assessment).unwrap_or_default(),
        CURRENT_CONDITIONS,
    );
    Ok(Json(AssessmentResponse {
        success: true,
        results,
    }))
}

#[instrument(skip(state))]
async fn get_required_fields(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<RequiredFieldsResponse>, ApiError> {
    let required_fields = state.scoring.required_fields().await?;
    Ok(Json(RequiredFieldsResponse {
        success: true,
        required_fields,
    }))
}
