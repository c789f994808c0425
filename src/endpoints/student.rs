use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{Response, StatusCode},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{
    database::RecordStore,
    error::ApiError,
    model::{
        register_request::RegisterRequest, student_detail::StudentDetail,
        student_record::StudentRecord,
    },
    rules,
};

use super::{json_response, resolve_position};

#[derive(Serialize)]
struct Registered<'a> {
    message: &'static str,
    data: &'a StudentRecord,
}

/// Registers a student for a lesson. The registration lesson itself is taken off the package
/// straight away.
pub async fn register(
    State(store): State<Arc<RecordStore>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response<Body>, ApiError> {
    let Json(request) = payload?;
    let record = request.into_record(Utc::now())?;

    let (position, record) = store
        .update(|records| {
            records.push(record.clone());
            Ok::<_, ApiError>((records.len() - 1, record))
        })
        .await?;

    info!(
        "Registered {} at position {position} with {} credits left",
        record.full_name, record.remaining_credits
    );

    json_response(
        StatusCode::CREATED,
        &Registered {
            message: "Student registered and first lesson credit used.",
            data: &record,
        },
    )
}

pub async fn list(State(store): State<Arc<RecordStore>>) -> Result<Response<Body>, ApiError> {
    let records = store.read(|records| records.to_vec()).await?;
    json_response(StatusCode::OK, &records)
}

/// A single record by position, with the recurring weekday's name attached
pub async fn detail(
    State(store): State<Arc<RecordStore>>,
    Path(position): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let record = store
        .read(|records| {
            resolve_position(&position, records.len()).map(|index| records[index].clone())
        })
        .await??;

    json_response(StatusCode::OK, &StudentDetail::from(&record))
}

/// Uses up one lesson credit. Refused once the student has none left.
pub async fn decrease_credit(
    State(store): State<Arc<RecordStore>>,
    Path(position): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let new_credits = store
        .update(|records| {
            let index = resolve_position(&position, records.len())?;
            let record = &mut records[index];
            record.remaining_credits = rules::decrement_credit(record.remaining_credits)?;
            Ok::<_, ApiError>(record.remaining_credits)
        })
        .await?;

    info!("Position {position} now has {new_credits} credits left");

    json_response(
        StatusCode::OK,
        &json!({
            "message": format!("Lesson credit decreased to {new_credits}."),
            "new_credits": new_credits,
        }),
    )
}

/// Removes a record. Every record after it moves up one position.
pub async fn delete(
    State(store): State<Arc<RecordStore>>,
    Path(position): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let deleted = store
        .update(|records| {
            let index = resolve_position(&position, records.len())?;
            Ok::<_, ApiError>(records.remove(index))
        })
        .await?;

    info!("Deleted {} from position {position}", deleted.full_name);

    json_response(
        StatusCode::OK,
        &json!({
            "message": "Student record deleted.",
            "deleted_student": deleted,
        }),
    )
}
