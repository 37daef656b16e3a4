//! The assembled complaint desk: every service over one store, plus the
//! HTTP surface that exposes them.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::Router;

use crate::catalog::ComplaintTypeRegistry;
use crate::complaints::legacy::{self, LegacyComplaint, LegacyImportReport};
use crate::complaints::ComplaintService;
use crate::config::DeskPolicy;
use crate::error::HostelError;
use crate::housing::HousingService;
use crate::identity::{Directory, IdentityProvider, User};
use crate::ids::UserId;
use crate::notifications::NotificationSender;
use crate::store::HostelStore;

/// Header carrying the authenticated caller's id, set by the gateway in
/// front of the service.
pub const ACTOR_HEADER: &str = "x-user-id";

pub struct Desk<S, N> {
    pub complaints: ComplaintService<S, N>,
    pub housing: HousingService<S>,
    pub catalog: ComplaintTypeRegistry<S>,
    pub directory: Directory<S>,
    store: Arc<S>,
    identity: Arc<dyn IdentityProvider>,
}

impl<S, N> Desk<S, N>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        identity: Arc<dyn IdentityProvider>,
        policy: DeskPolicy,
    ) -> Self {
        Self {
            complaints: ComplaintService::new(store.clone(), notifier, policy.clone()),
            housing: HousingService::new(store.clone()),
            catalog: ComplaintTypeRegistry::new(store.clone()),
            directory: Directory::new(store.clone(), policy),
            store,
            identity,
        }
    }

    /// Resolve the caller from [`ACTOR_HEADER`]. Missing, malformed and
    /// unknown ids are all unauthenticated.
    pub fn actor(&self, headers: &HeaderMap) -> Result<User, HostelError> {
        let raw = headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| HostelError::Unauthenticated(format!("missing {ACTOR_HEADER} header")))?;
        let id = raw
            .trim()
            .parse::<u64>()
            .map(UserId)
            .map_err(|_| HostelError::Unauthenticated(format!("malformed {ACTOR_HEADER} header")))?;

        self.store
            .fetch_user(id)?
            .ok_or_else(|| HostelError::Unauthenticated(format!("unknown user {id}")))
    }

    pub fn login(&self, identifier: &str, password: &str) -> Result<User, HostelError> {
        let user = self.identity.authenticate(identifier, password)?;
        tracing::info!(user = %user.id, role = %user.role(), "login succeeded");
        Ok(user)
    }

    /// Import legacy rows, matching each to the only student living in its
    /// room number.
    pub fn import_legacy(
        &self,
        actor: &User,
        records: Vec<LegacyComplaint>,
    ) -> Result<LegacyImportReport, HostelError> {
        let residents = legacy::sole_residents_by_room(self.store.as_ref())?;
        legacy::migrate(self.store.as_ref(), &self.catalog, actor, records, |record| {
            residents
                .get(&record.room_number.trim().to_ascii_lowercase())
                .copied()
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

/// Every `/api/v1` route over a shared desk.
pub fn desk_router<S, N>(desk: Arc<Desk<S, N>>) -> Router
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    Router::new()
        .merge(crate::identity::router::routes::<S, N>())
        .merge(crate::complaints::router::routes::<S, N>())
        .merge(crate::housing::router::routes::<S, N>())
        .merge(crate::catalog::router::routes::<S, N>())
        .with_state(desk)
}
