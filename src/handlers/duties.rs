use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::app::AppState;
use crate::database::{DatabaseError, SqlParam};
use crate::error::{ApiError, ApiResult, FailureShape};
use crate::models::{Duty, DutyInput};

pub const SELECT_ALL: &str = "SELECT * FROM duties";
pub const INSERT: &str = "INSERT INTO duties (name) VALUES ($1) RETURNING *";
pub const UPDATE_BY_ID: &str = "UPDATE duties SET name = $1 WHERE id = $2 RETURNING *";
pub const DELETE_BY_ID: &str = "DELETE FROM duties WHERE id = $1 RETURNING *";

const NOT_FOUND: &str = "Duty not found";

fn failed(shape: FailureShape) -> impl FnOnce(DatabaseError) -> ApiError {
    move |source| ApiError::storage_failure(shape, source)
}

fn parse_id(id: &str) -> ApiResult<i64> {
    id.parse::<i64>()
        .map_err(|_| ApiError::bad_request("Invalid duty id"))
}

/// GET /api/duties - List every duty
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Duty>>> {
    let rows = state
        .gateway
        .execute(SELECT_ALL, &[])
        .await
        .map_err(failed(FailureShape::EmptyArray))?;

    let duties = Duty::from_rows(rows).map_err(failed(FailureShape::EmptyArray))?;
    Ok(Json(duties))
}

/// POST /api/duties - Create a duty, the store assigns the id
pub async fn create(
    State(state): State<AppState>,
    input: DutyInput,
) -> ApiResult<impl IntoResponse> {
    let rows = state
        .gateway
        .execute(INSERT, &[SqlParam::from(input.name)])
        .await
        .map_err(failed(FailureShape::EmptyArray))?;

    let row = rows.into_iter().next().ok_or_else(|| {
        ApiError::storage_failure(
            FailureShape::EmptyArray,
            DatabaseError::UnexpectedRow("insert returned no row".to_string()),
        )
    })?;
    let duty = Duty::try_from(row).map_err(failed(FailureShape::EmptyArray))?;

    tracing::info!(id = duty.id, "duty created");
    Ok((StatusCode::CREATED, Json(duty)))
}

/// PUT /api/duties/:id - Rename a duty
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    input: DutyInput,
) -> ApiResult<Json<Duty>> {
    let id = parse_id(&id)?;

    let rows = state
        .gateway
        .execute(UPDATE_BY_ID, &[SqlParam::from(input.name), SqlParam::Int(id)])
        .await
        .map_err(failed(FailureShape::ErrorObject))?;

    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    let duty = Duty::try_from(row).map_err(failed(FailureShape::ErrorObject))?;

    Ok(Json(duty))
}

/// DELETE /api/duties/:id - Remove a duty
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;

    let rows = state
        .gateway
        .execute(DELETE_BY_ID, &[SqlParam::Int(id)])
        .await
        .map_err(failed(FailureShape::ErrorObject))?;

    if rows.is_empty() {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    tracing::info!(id, "duty deleted");
    Ok(Json(json!({ "message": "Duty deleted" })))
}
