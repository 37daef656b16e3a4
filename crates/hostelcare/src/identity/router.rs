use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::directory::Registration;
use crate::desk::Desk;
use crate::error::HostelError;
use crate::ids::UserId;
use crate::notifications::NotificationSender;
use crate::store::HostelStore;

/// Body of `POST /auth/login`: email for staff roles, roll number for
/// students.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AvailabilityUpdate {
    pub is_available: bool,
}

pub(crate) fn routes<S, N>() -> Router<Arc<Desk<S, N>>>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    Router::new()
        .route("/api/v1/auth/login", post(login_handler::<S, N>))
        .route("/api/v1/users", post(register_handler::<S, N>))
        .route("/api/v1/users/me", get(me_handler::<S, N>))
        .route(
            "/api/v1/workers/:id/availability",
            put(availability_handler::<S, N>),
        )
}

async fn login_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let user = desk.login(&request.identifier, &request.password)?;
    Ok(Json(user).into_response())
}

async fn register_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Json(registration): Json<Registration>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let user = desk.directory.register(&actor, registration)?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

async fn me_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    Ok(Json(desk.actor(&headers)?).into_response())
}

async fn availability_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(worker): Path<UserId>,
    Json(update): Json<AvailabilityUpdate>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let user = desk
        .directory
        .set_worker_availability(&actor, worker, update.is_available)?;
    Ok(Json(user).into_response())
}
