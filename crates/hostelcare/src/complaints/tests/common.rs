use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;

use crate::catalog::ComplaintType;
use crate::complaints::{Complaint, ComplaintService, ComplaintSubmission};
use crate::config::DeskPolicy;
use crate::desk::{Desk, ACTOR_HEADER};
use crate::housing::Hostel;
use crate::identity::{DirectoryIdentityProvider, User};
use crate::notifications::{MemoryOutbox, Notification, NotificationError, NotificationSender};
use crate::store::memory::MemoryStore;
use crate::store::test_support::{admin, complaint_type, hostel, staff, student, warden, worker};
use crate::store::UserRepository;

/// Two hostels, each with a warden and a resident, plus a plumber and an
/// electrician.
pub(super) struct Campus {
    pub store: Arc<MemoryStore>,
    pub admin: User,
    pub staff: User,
    pub north: Hostel,
    pub north_warden: User,
    pub north_student: User,
    pub south_warden: User,
    pub south_student: User,
    pub plumber: User,
    pub electrician: User,
    pub plumbing: ComplaintType,
    pub electrical: ComplaintType,
}

pub(super) fn campus() -> Campus {
    let store = Arc::new(MemoryStore::default());
    let admin = admin(&store);
    let staff = staff(&store, "maintenance.office");
    let north_warden = warden(&store, "warden.north");
    let south_warden = warden(&store, "warden.south");
    let north = hostel(&store, "North Block", 100, Some(north_warden.id));
    let south = hostel(&store, "South Block", 100, Some(south_warden.id));
    let north_student = student(&store, "2024bcs0001", Some(north.id));
    let south_student = student(&store, "2024bec0002", Some(south.id));
    let plumbing = complaint_type(&store, "Plumbing");
    let electrical = complaint_type(&store, "Electrical");
    let plumber = worker(&store, "plumber", &[plumbing.id], true);
    let electrician = worker(&store, "electrician", &[electrical.id], true);

    Campus {
        store,
        admin,
        staff,
        north,
        north_warden,
        north_student,
        south_warden,
        south_student,
        plumber,
        electrician,
        plumbing,
        electrical,
    }
}

pub(super) fn service_with<N>(campus: &Campus, notifier: Arc<N>) -> ComplaintService<MemoryStore, N>
where
    N: NotificationSender + 'static,
{
    ComplaintService::new(campus.store.clone(), notifier, DeskPolicy::default())
}

pub(super) fn service(campus: &Campus) -> (ComplaintService<MemoryStore, MemoryOutbox>, Arc<MemoryOutbox>) {
    let outbox = Arc::new(MemoryOutbox::default());
    (service_with(campus, outbox.clone()), outbox)
}

pub(super) fn file<N>(
    service: &ComplaintService<MemoryStore, N>,
    owner: &User,
    kind: &ComplaintType,
    description: &str,
) -> Complaint
where
    N: NotificationSender + 'static,
{
    service
        .create(
            owner,
            ComplaintSubmission {
                complaint_type: kind.id,
                description: description.to_string(),
            },
        )
        .expect("complaint filed")
}

/// Re-read a user so tests see flags changed after the fixture was built.
pub(super) fn reload(campus: &Campus, user: &User) -> User {
    campus
        .store
        .fetch_user(user.id)
        .expect("store reachable")
        .expect("user exists")
}

pub(super) struct OfflineMailer;

impl NotificationSender for OfflineMailer {
    fn send(&self, _: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("mail relay refused connection".to_string()))
    }
}

pub(super) fn desk(campus: &Campus) -> (Arc<Desk<MemoryStore, MemoryOutbox>>, Arc<MemoryOutbox>) {
    let outbox = Arc::new(MemoryOutbox::default());
    let identity = Arc::new(DirectoryIdentityProvider::new(campus.store.clone()));
    identity.enroll(&campus.north_student, "student-pass");
    let desk = Desk::new(
        campus.store.clone(),
        outbox.clone(),
        identity,
        DeskPolicy::default(),
    );
    (Arc::new(desk), outbox)
}

pub(super) fn request(method: &str, uri: &str, actor: Option<&User>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(ACTOR_HEADER, actor.id.to_string());
    }
    match body {
        Some(json) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).expect("json body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json response")
}

pub(super) async fn assert_error(response: Response, status: StatusCode, kind: &str) {
    assert_eq!(response.status(), status);
    let body = json_body(response).await;
    assert_eq!(body["kind"], kind, "unexpected body {body}");
}
