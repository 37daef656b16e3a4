use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Complaint, ComplaintAction, ComplaintQuery, ComplaintSubmission, NewComplaint,
};
use super::eligibility::{check_eligibility, eligible_workers};
use super::export::{render_csv, ExportRow};
use super::scope::Scope;
use super::stats::{ComplaintStatistics, StatisticsPeriod};
use crate::config::DeskPolicy;
use crate::error::HostelError;
use crate::identity::{Role, User};
use crate::ids::{ComplaintId, UserId};
use crate::locks::KeyedLocks;
use crate::notifications::templates::{self, ComplaintContext};
use crate::notifications::{dispatch, Notification, NotificationSender};
use crate::store::{HostelStore, RepositoryError};

/// Complaint lifecycle: filing, triage, assignment and closure, with every
/// call scoped to what the acting user may see.
pub struct ComplaintService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    policy: DeskPolicy,
    complaint_locks: KeyedLocks<ComplaintId>,
    student_locks: KeyedLocks<UserId>,
}

impl<S, N> ComplaintService<S, N>
where
    S: HostelStore,
    N: NotificationSender + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, policy: DeskPolicy) -> Self {
        Self {
            store,
            notifier,
            policy,
            complaint_locks: KeyedLocks::default(),
            student_locks: KeyedLocks::default(),
        }
    }

    /// File a complaint as the acting student.
    pub fn create(
        &self,
        actor: &User,
        submission: ComplaintSubmission,
    ) -> Result<Complaint, HostelError> {
        if actor.role() != Role::Student {
            return Err(HostelError::Authorization(
                "only students can file complaints".to_string(),
            ));
        }

        let description = submission.description.trim().to_string();
        if description.is_empty() {
            return Err(HostelError::Validation(
                "description must not be blank".to_string(),
            ));
        }
        if self
            .store
            .fetch_complaint_type(submission.complaint_type)?
            .is_none()
        {
            return Err(HostelError::Validation(format!(
                "unknown complaint type {}",
                submission.complaint_type
            )));
        }

        let slot = self.student_locks.slot(&actor.id);
        let _guard = slot.lock();

        let active = self
            .store
            .query_complaints(ComplaintQuery::FiledBy(actor.id))?
            .into_iter()
            .filter(|complaint| complaint.status.is_active())
            .count();
        if active >= self.policy.max_active_complaints {
            return Err(HostelError::Validation(format!(
                "you already have {active} active complaints; the limit is {}",
                self.policy.max_active_complaints
            )));
        }

        let complaint = self
            .store
            .insert_complaint(NewComplaint::pending(
                actor.id,
                submission.complaint_type,
                description,
            ))
            .map_err(|err| match err {
                // the type was removed after the lookup above
                RepositoryError::Conflict(_) => HostelError::Validation(format!(
                    "unknown complaint type {}",
                    submission.complaint_type
                )),
                other => HostelError::from(other),
            })?;
        info!(
            complaint = %complaint.id,
            student = %actor.id,
            complaint_type = %complaint.complaint_type,
            "complaint filed"
        );
        Ok(complaint)
    }

    pub fn get(&self, actor: &User, id: ComplaintId) -> Result<Complaint, HostelError> {
        let scope = Scope::resolve(actor, self.store.as_ref())?;
        let complaint = self.load(id)?;
        scope.authorize(&complaint, self.store.as_ref())?;
        Ok(complaint)
    }

    /// Complaints visible to `actor`, newest first.
    pub fn list(&self, actor: &User) -> Result<Vec<Complaint>, HostelError> {
        let scope = Scope::resolve(actor, self.store.as_ref())?;
        Ok(self.store.query_complaints(scope.query())?)
    }

    /// Hand the complaint to `worker_id`. Also used to reassign an already
    /// assigned complaint.
    pub fn assign(
        &self,
        actor: &User,
        id: ComplaintId,
        worker_id: UserId,
    ) -> Result<Complaint, HostelError> {
        let mut chosen: Option<User> = None;
        let complaint = self.transition(actor, id, ComplaintAction::Assign, |complaint| {
            let worker = self
                .store
                .fetch_user(worker_id)?
                .ok_or_else(|| HostelError::NotFound(format!("worker {worker_id}")))?;
            check_eligibility(&worker, complaint.complaint_type).map_err(|reason| {
                HostelError::IneligibleWorker {
                    worker: worker_id,
                    reason,
                }
            })?;
            complaint.assigned_worker = Some(worker_id);
            chosen = Some(worker);
            Ok(())
        })?;

        if let Some(worker) = chosen {
            self.notify(&complaint, |context| {
                vec![
                    templates::assigned_to_worker(context, &worker),
                    templates::assigned_to_student(context, &worker),
                ]
            });
        }
        Ok(complaint)
    }

    pub fn start(&self, actor: &User, id: ComplaintId) -> Result<Complaint, HostelError> {
        self.transition(actor, id, ComplaintAction::Start, |_| Ok(()))
    }

    pub fn resolve(&self, actor: &User, id: ComplaintId) -> Result<Complaint, HostelError> {
        self.close(actor, id, ComplaintAction::Resolve)
    }

    pub fn reject(&self, actor: &User, id: ComplaintId) -> Result<Complaint, HostelError> {
        self.close(actor, id, ComplaintAction::Reject)
    }

    /// Workers who could take the complaint right now. Picking one is the
    /// caller's job.
    pub fn available_workers(
        &self,
        actor: &User,
        id: ComplaintId,
    ) -> Result<Vec<User>, HostelError> {
        require_manager(actor, "list workers for a complaint")?;
        let complaint = self.get(actor, id)?;
        let workers = self.store.users_with_role(Role::Worker)?;
        Ok(eligible_workers(workers, complaint.complaint_type))
    }

    /// Dashboard counts over the scoped set, with a timeline of the
    /// trailing `period`.
    pub fn statistics(
        &self,
        actor: &User,
        period: StatisticsPeriod,
    ) -> Result<ComplaintStatistics, HostelError> {
        let complaints = self.list(actor)?;
        let types = self.store.all_complaint_types()?;
        Ok(ComplaintStatistics::tally(
            &complaints,
            &types,
            period,
            Utc::now(),
        ))
    }

    /// CSV of the caller's scoped complaints. Restricted to triage roles.
    pub fn export_csv(&self, actor: &User) -> Result<String, HostelError> {
        require_manager(actor, "export complaints")?;
        let complaints = self.list(actor)?;

        let mut rows = Vec::with_capacity(complaints.len());
        for complaint in &complaints {
            let student = self.store.fetch_user(complaint.student)?;
            let room = match student.as_ref().and_then(User::room) {
                Some(room) => self.store.fetch_room(room)?.map(|room| room.room_number),
                None => None,
            };
            let worker = match complaint.assigned_worker {
                Some(worker) => self.store.fetch_user(worker)?.map(|user| user.full_name),
                None => None,
            };
            let type_name = self
                .store
                .fetch_complaint_type(complaint.complaint_type)?
                .map(|kind| kind.name)
                .unwrap_or_else(|| format!("type {}", complaint.complaint_type));

            rows.push(ExportRow::new(
                complaint,
                student
                    .map(|user| user.display_label())
                    .unwrap_or_else(|| format!("user {}", complaint.student)),
                type_name,
                worker,
                room,
            ));
        }

        info!(actor = %actor.id, rows = rows.len(), "complaints exported");
        render_csv(&rows)
    }

    fn close(
        &self,
        actor: &User,
        id: ComplaintId,
        action: ComplaintAction,
    ) -> Result<Complaint, HostelError> {
        let complaint = self.transition(actor, id, action, |_| Ok(()))?;
        self.notify(&complaint, |context| vec![templates::closed_to_student(context)]);
        Ok(complaint)
    }

    /// Read-modify-write under the complaint's lock. A caller that lost a race
    /// sees the winner's status here and fails the transition check.
    fn transition<F>(
        &self,
        actor: &User,
        id: ComplaintId,
        action: ComplaintAction,
        apply: F,
    ) -> Result<Complaint, HostelError>
    where
        F: FnOnce(&mut Complaint) -> Result<(), HostelError>,
    {
        let scope = Scope::resolve(actor, self.store.as_ref())?;

        let slot = self.complaint_locks.slot(&id);
        let _guard = slot.lock();

        let mut complaint = self.load(id)?;
        scope.authorize(&complaint, self.store.as_ref())?;
        permit(actor, &complaint, action)?;

        let from = complaint.status;
        let next = from
            .after(action)
            .ok_or(HostelError::InvalidTransition { from, action })?;

        apply(&mut complaint)?;
        complaint.status = next;
        complaint.updated_at = Utc::now();
        self.store.update_complaint(complaint.clone())?;

        info!(
            complaint = %id,
            actor = %actor.id,
            %action,
            from = %from,
            to = %next,
            "complaint transitioned"
        );
        Ok(complaint)
    }

    fn load(&self, id: ComplaintId) -> Result<Complaint, HostelError> {
        self.store
            .fetch_complaint(id)?
            .ok_or_else(|| HostelError::NotFound(format!("complaint {id}")))
    }

    /// Render and send mails for a committed transition. Lookup failures only
    /// cost the mail, never the transition.
    fn notify<F>(&self, complaint: &Complaint, render: F)
    where
        F: FnOnce(ComplaintContext<'_>) -> Vec<Notification>,
    {
        match self.context_parts(complaint) {
            Ok((student, type_name, room)) => {
                let context = ComplaintContext {
                    complaint,
                    type_name: &type_name,
                    student: &student,
                    room: room.as_deref(),
                };
                dispatch(self.notifier.as_ref(), render(context));
            }
            Err(err) => {
                warn!(complaint = %complaint.id, error = %err, "skipping notification");
            }
        }
    }

    fn context_parts(
        &self,
        complaint: &Complaint,
    ) -> Result<(User, String, Option<String>), HostelError> {
        let student = self
            .store
            .fetch_user(complaint.student)?
            .ok_or_else(|| HostelError::NotFound(format!("student {}", complaint.student)))?;
        let type_name = self
            .store
            .fetch_complaint_type(complaint.complaint_type)?
            .map(|kind| kind.name)
            .unwrap_or_default();
        let room = match student.room() {
            Some(room) => self.store.fetch_room(room)?.map(|room| room.room_number),
            None => None,
        };
        Ok((student, type_name, room))
    }
}

fn require_manager(actor: &User, action: &str) -> Result<(), HostelError> {
    if actor.role().manages_complaints() {
        Ok(())
    } else {
        Err(HostelError::Authorization(format!(
            "only wardens, staff or administrators can {action}"
        )))
    }
}

/// Role rule per action: triage roles may do anything, the assigned worker
/// may start and close their own complaint.
fn permit(actor: &User, complaint: &Complaint, action: ComplaintAction) -> Result<(), HostelError> {
    if actor.role().manages_complaints() {
        return Ok(());
    }

    let is_assignee =
        actor.role() == Role::Worker && complaint.assigned_worker == Some(actor.id);
    let allowed = match action {
        ComplaintAction::Assign => false,
        ComplaintAction::Start | ComplaintAction::Resolve | ComplaintAction::Reject => is_assignee,
    };

    if allowed {
        Ok(())
    } else {
        Err(HostelError::Authorization(format!(
            "a {} cannot {action} complaint {}",
            actor.role(),
            complaint.id
        )))
    }
}

