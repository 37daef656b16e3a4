use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::ComplaintSubmission;
use super::stats::StatisticsPeriod;
use crate::desk::Desk;
use crate::error::HostelError;
use crate::ids::{ComplaintId, UserId};
use crate::notifications::NotificationSender;
use crate::store::HostelStore;

/// Body of `POST /complaints/:id/assign`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AssignRequest {
    pub worker_id: UserId,
}

/// Query of `GET /complaints/statistics`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsParams {
    #[serde(default)]
    pub period: Option<String>,
}

pub(crate) fn routes<S, N>() -> Router<Arc<Desk<S, N>>>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    Router::new()
        .route(
            "/api/v1/complaints",
            post(create_handler::<S, N>).get(list_handler::<S, N>),
        )
        .route(
            "/api/v1/complaints/statistics",
            get(statistics_handler::<S, N>),
        )
        .route("/api/v1/complaints/export", get(export_handler::<S, N>))
        .route("/api/v1/complaints/:id", get(get_handler::<S, N>))
        .route(
            "/api/v1/complaints/:id/assign",
            post(assign_handler::<S, N>),
        )
        .route("/api/v1/complaints/:id/start", post(start_handler::<S, N>))
        .route(
            "/api/v1/complaints/:id/resolve",
            post(resolve_handler::<S, N>),
        )
        .route(
            "/api/v1/complaints/:id/reject",
            post(reject_handler::<S, N>),
        )
        .route(
            "/api/v1/complaints/:id/available-workers",
            get(available_workers_handler::<S, N>),
        )
}

pub(crate) async fn create_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Json(submission): Json<ComplaintSubmission>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let complaint = desk.complaints.create(&actor, submission)?;
    Ok((StatusCode::CREATED, Json(complaint)).into_response())
}

async fn list_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    Ok(Json(desk.complaints.list(&actor)?).into_response())
}

async fn get_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<ComplaintId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    Ok(Json(desk.complaints.get(&actor, id)?).into_response())
}

pub(crate) async fn assign_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<ComplaintId>,
    Json(request): Json<AssignRequest>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let complaint = desk.complaints.assign(&actor, id, request.worker_id)?;
    Ok(Json(complaint).into_response())
}

async fn start_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<ComplaintId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    Ok(Json(desk.complaints.start(&actor, id)?).into_response())
}

async fn resolve_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<ComplaintId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    Ok(Json(desk.complaints.resolve(&actor, id)?).into_response())
}

async fn reject_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<ComplaintId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    Ok(Json(desk.complaints.reject(&actor, id)?).into_response())
}

async fn available_workers_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<ComplaintId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    Ok(Json(desk.complaints.available_workers(&actor, id)?).into_response())
}

async fn statistics_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Query(params): Query<StatisticsParams>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let period = match params.period.as_deref() {
        Some(raw) => raw.parse::<StatisticsPeriod>()?,
        None => StatisticsPeriod::default(),
    };
    Ok(Json(desk.complaints.statistics(&actor, period)?).into_response())
}

async fn export_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let csv = desk.complaints.export_csv(&actor)?;
    let filename = format!(
        "attachment; filename=\"complaints_{}.csv\"",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    )
        .into_response())
}
