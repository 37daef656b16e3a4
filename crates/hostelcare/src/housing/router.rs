use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::domain::NewHostel;
use super::service::RoomDraft;
use crate::desk::Desk;
use crate::error::HostelError;
use crate::ids::{HostelId, RoomId, UserId};
use crate::notifications::NotificationSender;
use crate::store::HostelStore;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StudentPlacement {
    pub student_id: UserId,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WardenAppointment {
    pub warden_id: UserId,
}

pub(crate) fn routes<S, N>() -> Router<Arc<Desk<S, N>>>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    Router::new()
        .route("/api/v1/hostels", post(create_hostel_handler::<S, N>))
        .route(
            "/api/v1/hostels/:id/rooms",
            post(add_room_handler::<S, N>),
        )
        .route(
            "/api/v1/hostels/:id/warden",
            put(assign_warden_handler::<S, N>),
        )
        .route(
            "/api/v1/hostels/:id/statistics",
            get(hostel_statistics_handler::<S, N>),
        )
        .route("/api/v1/rooms/:id", get(room_handler::<S, N>))
        .route(
            "/api/v1/rooms/:id/assign-student",
            post(assign_student_handler::<S, N>),
        )
}

async fn create_hostel_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Json(draft): Json<NewHostel>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let hostel = desk.housing.create_hostel(&actor, draft)?;
    Ok((StatusCode::CREATED, Json(hostel)).into_response())
}

async fn add_room_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(hostel): Path<HostelId>,
    Json(draft): Json<RoomDraft>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let room = desk.housing.add_room(&actor, hostel, draft)?;
    Ok((StatusCode::CREATED, Json(room)).into_response())
}

async fn assign_warden_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(hostel): Path<HostelId>,
    Json(appointment): Json<WardenAppointment>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let hostel = desk
        .housing
        .assign_warden(&actor, hostel, appointment.warden_id)?;
    Ok(Json(hostel).into_response())
}

async fn hostel_statistics_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(hostel): Path<HostelId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    Ok(Json(desk.housing.hostel_statistics(&actor, hostel)?).into_response())
}

async fn room_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(room): Path<RoomId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    desk.actor(&headers)?;
    Ok(Json(desk.housing.room_occupancy(room)?).into_response())
}

async fn assign_student_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(room): Path<RoomId>,
    Json(placement): Json<StudentPlacement>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let assignment = desk
        .housing
        .assign_room(&actor, room, placement.student_id)?;
    Ok(Json(assignment).into_response())
}
