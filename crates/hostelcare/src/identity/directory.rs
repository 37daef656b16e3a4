use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Email, NewUser, ProfileError, Role, RoleProfile, RollNumber, StudentProfile, User,
    WorkerProfile,
};
use crate::config::DeskPolicy;
use crate::error::HostelError;
use crate::ids::{ComplaintTypeId, HostelId, UserId};
use crate::store::{ComplaintTypeRepository, HousingRepository, RepositoryError, UserRepository};

/// Inbound account registration payload, validated by [`Directory::register`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub hostel: Option<HostelId>,
    #[serde(flatten)]
    pub profile: RegistrationProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RegistrationProfile {
    Student {
        roll_number: String,
        year_of_study: u8,
        department: String,
    },
    Warden,
    Staff,
    Worker {
        worker_type: String,
        complaint_types: BTreeSet<ComplaintTypeId>,
        #[serde(default = "available_by_default")]
        is_available: bool,
    },
    Admin,
}

fn available_by_default() -> bool {
    true
}

/// Account management on top of the user store.
pub struct Directory<S> {
    store: Arc<S>,
    policy: DeskPolicy,
}

impl<S> Directory<S>
where
    S: UserRepository + HousingRepository + ComplaintTypeRepository + 'static,
{
    pub fn new(store: Arc<S>, policy: DeskPolicy) -> Self {
        Self { store, policy }
    }

    pub fn fetch(&self, id: UserId) -> Result<User, HostelError> {
        self.store
            .fetch_user(id)?
            .ok_or_else(|| HostelError::NotFound(format!("user {id}")))
    }

    /// Create an account. Admin only; email and roll number must be unused.
    pub fn register(&self, actor: &User, registration: Registration) -> Result<User, HostelError> {
        if actor.role() != Role::Admin {
            return Err(HostelError::Authorization(
                "only administrators can register accounts".to_string(),
            ));
        }

        let draft = self.validate(registration)?;

        if self.store.find_user_by_email(&draft.email)?.is_some() {
            return Err(HostelError::Validation(format!(
                "email {} is already registered",
                draft.email
            )));
        }
        if let RoleProfile::Student(profile) = &draft.profile {
            if self
                .store
                .find_user_by_roll_number(&profile.roll_number)?
                .is_some()
            {
                return Err(HostelError::Validation(format!(
                    "roll number {} is already registered",
                    profile.roll_number
                )));
            }
        }

        let user = self.store.insert_user(draft).map_err(|err| match err {
            RepositoryError::Conflict(detail) => HostelError::Validation(detail),
            other => HostelError::Repository(other),
        })?;

        info!(user = %user.id, role = %user.role(), "account registered");
        Ok(user)
    }

    /// Toggle whether a worker can receive new assignments. Workers may flip
    /// their own flag; staff and admins may flip anyone's.
    pub fn set_worker_availability(
        &self,
        actor: &User,
        worker: UserId,
        available: bool,
    ) -> Result<User, HostelError> {
        let permitted = actor.id == worker || matches!(actor.role(), Role::Staff | Role::Admin);
        if !permitted {
            return Err(HostelError::Authorization(
                "only the worker, staff or administrators can change availability".to_string(),
            ));
        }

        let mut user = self.fetch(worker)?;
        let profile = user.worker_profile_mut().ok_or_else(|| {
            HostelError::Validation(format!("user {worker} is not a worker"))
        })?;
        profile.is_available = available;
        self.store.update_user(user.clone())?;

        info!(worker = %worker, available, "worker availability changed");
        Ok(user)
    }

    fn validate(&self, registration: Registration) -> Result<NewUser, HostelError> {
        let full_name = registration.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(ProfileError::Blank("full name").into());
        }

        let email = Email::parse_in_domain(&registration.email, &self.policy.email_domain)?;

        if let Some(hostel) = registration.hostel {
            if self.store.fetch_hostel(hostel)?.is_none() {
                return Err(HostelError::NotFound(format!("hostel {hostel}")));
            }
        }

        let profile = match registration.profile {
            RegistrationProfile::Student {
                roll_number,
                year_of_study,
                department,
            } => {
                if !(1..=6).contains(&year_of_study) {
                    return Err(ProfileError::YearOfStudy(year_of_study).into());
                }
                let department = department.trim().to_string();
                if department.is_empty() {
                    return Err(ProfileError::Blank("department").into());
                }
                RoleProfile::Student(StudentProfile {
                    roll_number: RollNumber::parse(&roll_number)?,
                    room: None,
                    year_of_study,
                    department,
                })
            }
            RegistrationProfile::Worker {
                worker_type,
                complaint_types,
                is_available,
            } => {
                let worker_type = worker_type.trim().to_string();
                if worker_type.is_empty() {
                    return Err(ProfileError::Blank("worker type").into());
                }
                for complaint_type in &complaint_types {
                    if self.store.fetch_complaint_type(*complaint_type)?.is_none() {
                        return Err(HostelError::Validation(format!(
                            "unknown complaint type {complaint_type}"
                        )));
                    }
                }
                RoleProfile::Worker(WorkerProfile {
                    worker_type,
                    complaint_types,
                    is_available,
                })
            }
            RegistrationProfile::Warden => RoleProfile::Warden,
            RegistrationProfile::Staff => RoleProfile::Staff,
            RegistrationProfile::Admin => RoleProfile::Admin,
        };

        Ok(NewUser {
            full_name,
            email,
            hostel: registration.hostel,
            profile,
        })
    }
}
