//! User account handlers.
//!
//! - `GET /api/v1/users?created_after=YYYY-MM-DD` - accounts created after a date
//! - `GET /api/v1/users/{id}`                      - one account
//! - `PUT /api/v1/users/{id}`                      - update name, email and status

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use usrsvc_core::{User, UserStatus};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_FIELD_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub(super) struct UserListQuery {
    pub created_after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: i16,
}

fn parse_user_id(req_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::new(
            req_id,
            "bad_request",
            format!("'{raw}' is not a valid user id"),
        )
    })
}

/// Missing parameter means "since the epoch"; the date is read as UTC midnight.
fn parse_created_after(req_id: &str, raw: Option<&str>) -> Result<DateTime<Utc>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DateTime::<Utc>::UNIX_EPOCH);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| {
            ApiError::new(
                req_id,
                "bad_request",
                format!("created_after must be YYYY-MM-DD, got '{raw}'"),
            )
        })
}

/// Empty strings mean "keep the stored value".
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn validate_update(req_id: &str, body: &UpdateUserRequest) -> Result<(), ApiError> {
    let name = non_empty(body.name.as_deref());
    let email = non_empty(body.email.as_deref());

    if name.is_some_and(|n| n.chars().count() > MAX_FIELD_LEN) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("name must be at most {MAX_FIELD_LEN} characters"),
        ));
    }
    if let Some(email) = email {
        if email.chars().count() > MAX_FIELD_LEN {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                format!("email must be at most {MAX_FIELD_LEN} characters"),
            ));
        }
        if !email.contains('@') {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                format!("'{email}' is not a valid email address"),
            ));
        }
    }
    if UserStatus::from_i16(body.status).is_none() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("status must be 1 or 2, got {}", body.status),
        ));
    }
    Ok(())
}

pub(super) async fn list_users(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let since = parse_created_after(&req_id.0, query.created_after.as_deref())?;

    let rows = usrsvc_db::list_users_created_after(&state.pool, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(User::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_user_id(rid, &id)?;

    let user = usrsvc_db::get_user_by_id(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("user '{id}' not found")))?;

    Ok(Json(ApiResponse {
        data: user.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/v1/users/{id}: status is always written; blank name/email are kept.
pub(super) async fn update_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_user_id(rid, &id)?;
    validate_update(rid, &body)?;

    let user = usrsvc_db::update_user(
        &state.pool,
        id,
        non_empty(body.name.as_deref()),
        non_empty(body.email.as_deref()),
        body.status,
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?
    .ok_or_else(|| ApiError::new(rid, "not_found", format!("user '{id}' not found")))?;

    tracing::info!(user_id = %id, status = user.status, "user updated");

    Ok(Json(ApiResponse {
        data: user.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
