use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::NewComplaintType;
use crate::desk::Desk;
use crate::error::HostelError;
use crate::ids::ComplaintTypeId;
use crate::notifications::NotificationSender;
use crate::store::HostelStore;

pub(crate) fn routes<S, N>() -> Router<Arc<Desk<S, N>>>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    Router::new()
        .route(
            "/api/v1/complaint-types",
            get(list_handler::<S, N>).post(add_handler::<S, N>),
        )
        .route(
            "/api/v1/complaint-types/:id",
            get(get_handler::<S, N>).delete(remove_handler::<S, N>),
        )
}

/// The catalog is readable by any signed-in user.
async fn list_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    desk.actor(&headers)?;
    Ok(Json(desk.catalog.list()?).into_response())
}

async fn get_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<ComplaintTypeId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    desk.actor(&headers)?;
    Ok(Json(desk.catalog.get(id)?).into_response())
}

async fn add_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Json(new_type): Json<NewComplaintType>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    let created = desk.catalog.add(&actor, new_type)?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn remove_handler<S, N>(
    State(desk): State<Arc<Desk<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<ComplaintTypeId>,
) -> Result<Response, HostelError>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    let actor = desk.actor(&headers)?;
    Ok(Json(desk.catalog.remove(&actor, id)?).into_response())
}
