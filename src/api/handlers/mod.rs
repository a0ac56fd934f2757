use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::board::normalize_post;
use crate::db::Database;
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Validation and conflict errors raised by the store are safe to expose and
/// are returned as-is with a 400 or 409 status.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("already exists") {
        tracing::warn!("Conflict: {}", msg);
        return (StatusCode::CONFLICT, msg);
    }
    if msg.contains("Invalid") || msg.contains("must not be empty") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn feature_not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Feature not found: {}", id))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Features
// ============================================================

pub async fn list_features(
    State(db): State<Database>,
) -> Result<Json<Vec<Feature>>, (StatusCode, String)> {
    db.get_all_features().map(Json).map_err(internal_error)
}

pub async fn get_feature(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Feature>, (StatusCode, String)> {
    db.get_feature(&id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| feature_not_found(&id))
}

pub async fn create_feature(
    State(db): State<Database>,
    Json(input): Json<CreateFeatureInput>,
) -> Result<(StatusCode, Json<Feature>), (StatusCode, String)> {
    db.create_feature(input)
        .map(|f| (StatusCode::CREATED, Json(f)))
        .map_err(internal_error)
}

pub async fn update_feature(
    State(db): State<Database>,
    Path(id): Path<String>,
    Json(input): Json<UpdateFeatureInput>,
) -> Result<Json<Feature>, (StatusCode, String)> {
    let feature = db
        .update_feature(&id, input)
        .map_err(internal_error)?
        .ok_or_else(|| feature_not_found(&id))?;

    tracing::debug!("Feature {} now at {} votes", feature.id, feature.vote_count);
    Ok(Json(feature))
}

// ============================================================
// Submissions
// ============================================================

pub async fn list_submissions(
    State(db): State<Database>,
) -> Result<Json<Vec<Submission>>, (StatusCode, String)> {
    db.get_all_submissions().map(Json).map_err(internal_error)
}

pub async fn create_submission(
    State(db): State<Database>,
    Json(input): Json<CreateSubmissionInput>,
) -> Result<(StatusCode, Json<Submission>), (StatusCode, String)> {
    db.create_submission(input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(internal_error)
}

// ============================================================
// Message Board
// ============================================================

pub async fn list_messages(
    State(db): State<Database>,
) -> Result<Json<Vec<Message>>, (StatusCode, String)> {
    db.get_all_messages().map(Json).map_err(internal_error)
}

pub async fn post_message(
    State(db): State<Database>,
    Json(input): Json<PostMessageInput>,
) -> Result<(StatusCode, Json<Message>), (StatusCode, String)> {
    let post = normalize_post(&input).ok_or((
        StatusCode::BAD_REQUEST,
        "Message content must not be empty".to_string(),
    ))?;

    db.create_message(post)
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(internal_error)
}
