use crate::auth::ManagerAuth;
use crate::errors::{ApiJson, AppError};
use crate::models::{
    non_blank, parse_date, parse_id, AddMemberRequest, AddTaskRequest, DateQuery, ExportDocument,
    Feedback, FeedbackRequest, LeaveRequest, LoginResponse, Member, MemberDateQuery, ReportQuery,
    ReportRow, SuccessResponse, Task,
};
use crate::state::AppState;
use crate::status::{member_summary, team_summary, MemberSummary, TeamSummary};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const EXPORT_FILENAME: &str = "performance_backup.json";

pub async fn login(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let payload = parse_lenient(&body);
    let password = payload
        .as_ref()
        .and_then(|value| value.get("password"))
        .and_then(Value::as_str);

    if password == Some(state.config.admin_password.as_str()) {
        info!("manager logged in");
        return Json(LoginResponse {
            success: true,
            token: state.config.auth_token.clone(),
        })
        .into_response();
    }

    let debug_info = json!({
        "receivedType": headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        "isBodyEmpty": !matches!(&payload, Some(Value::Object(map)) if !map.is_empty()),
    });
    warn!(debug = %debug_info, "login failed");

    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Invalid Password", "debug": debug_info })),
    )
        .into_response()
}

pub async fn list_members(State(state): State<AppState>) -> Result<Json<Vec<Member>>, AppError> {
    Ok(Json(state.store.list_members()?))
}

pub async fn add_member(
    _auth: ManagerAuth,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddMemberRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let name = payload.validate()?;
    let id = state.store.add_member(&name)?;
    info!(id, name = %name, "member added");
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<MemberDateQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let filter = query.filter()?;
    Ok(Json(state.store.list_tasks(filter)?))
}

pub async fn add_task(
    _auth: ManagerAuth,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddTaskRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let task = payload.validate()?;
    let id = state.store.add_task(&task)?;
    info!(id, member_id = task.member_id, date = %task.date, weight = task.weight, "task added");
    Ok(Json(SuccessResponse::ok()))
}

pub async fn delete_task(
    _auth: ManagerAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = parse_id(&id)?;
    if state.store.delete_task(id)? {
        info!(id, "task deleted");
    } else {
        debug!(id, "delete requested for missing task");
    }
    Ok(Json(SuccessResponse::ok()))
}

pub async fn member_day_summary(
    State(state): State<AppState>,
    Query(query): Query<MemberDateQuery>,
) -> Result<Json<MemberSummary>, AppError> {
    let filter = query.filter()?;
    let (Some(member_id), Some(date)) = (filter.member_id, filter.date) else {
        return Err(AppError::bad_request("Missing params"));
    };

    let day = state.store.member_day(member_id, date)?;
    Ok(Json(member_summary(day)))
}

pub async fn toggle_leave(
    _auth: ManagerAuth,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LeaveRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let change = payload.validate()?;
    state
        .store
        .set_leave(change.member_id, change.date, change.active)?;
    info!(
        member_id = change.member_id,
        date = %change.date,
        active = change.active,
        "leave updated"
    );
    Ok(Json(SuccessResponse::ok()))
}

pub async fn team_day_summary(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<TeamSummary>, AppError> {
    let date = non_blank(query.date)
        .map(|value| parse_date(&value))
        .transpose()?
        .unwrap_or_else(today);

    let day = state.store.team_day(date)?;
    Ok(Json(team_summary(day)))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FeedbackRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let content = payload.validate()?;
    let id = state.store.add_feedback(&content, &iso_timestamp())?;
    info!(id, "feedback received");
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_feedback(
    _auth: ManagerAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Feedback>>, AppError> {
    Ok(Json(state.store.list_feedback()?))
}

pub async fn reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<ReportRow>>, AppError> {
    let range = query.range()?;
    Ok(Json(state.store.report(range)?))
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (members, tasks) = state.store.export()?;
    let document = ExportDocument {
        timestamp: iso_timestamp(),
        members,
        tasks,
    };
    let body = serde_json::to_string_pretty(&document).map_err(AppError::internal)?;
    info!(
        members = document.members.len(),
        tasks = document.tasks.len(),
        "export generated"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        body,
    ))
}

/// Parses a JSON body, also accepting a JSON document wrapped in a JSON string.
fn parse_lenient(body: &[u8]) -> Option<Value> {
    match serde_json::from_slice::<Value>(body).ok()? {
        Value::String(inner) => serde_json::from_str(&inner).ok(),
        value => Some(value),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
