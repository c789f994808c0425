use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Response, StatusCode},
};

use crate::{database::RecordStore, error::ApiError, model::cashier_total::CashierTotal};

use super::json_response;

/// Total of every payment on record
pub async fn total(State(store): State<Arc<RecordStore>>) -> Result<Response<Body>, ApiError> {
    let total = store.read(CashierTotal::from_records).await?;
    json_response(StatusCode::OK, &total)
}
