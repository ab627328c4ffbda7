//! Route handlers. Each one maps a store result onto the response envelope;
//! failures are returned as [`ApiError`] and rendered by its `IntoResponse`.

use axum::Json;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use tracing::{debug, error};

use journal_core::ApodRecord;

use super::ApiState;
use super::response::{ApiError, ApiResponse};

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

/// `GET /journal`: every stored record, newest first.
pub(super) async fn list_journal(State(state): State<ApiState>) -> ApiResult<Vec<ApodRecord>> {
    let records = state.reader.get_all().await.map_err(|e| {
        error!(error = %e, "Failed to get journal");
        ApiError::Storage {
            operation: "failed to get journal",
        }
    })?;

    debug!(count = records.len(), "Journal listed");
    Ok(Json(ApiResponse::ok(records)))
}

/// `GET /journal/{date}`: the record for one `YYYY-MM-DD` date.
pub(super) async fn get_journal_entry(
    State(state): State<ApiState>,
    Path(raw_date): Path<String>,
) -> ApiResult<ApodRecord> {
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|e| {
        debug!(date = %raw_date, error = %e, "Rejected malformed date");
        ApiError::InvalidDate(raw_date.clone())
    })?;

    match state.reader.get_by_date(date).await {
        Ok(Some(record)) => Ok(Json(ApiResponse::ok(record))),
        Ok(None) => {
            debug!(%date, "Record not found");
            Err(ApiError::NotFound)
        }
        Err(e) => {
            error!(%date, error = %e, "Failed to get record");
            Err(ApiError::Storage {
                operation: "failed to get apod",
            })
        }
    }
}
