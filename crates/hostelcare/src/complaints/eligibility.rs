use std::fmt;

use serde::Serialize;

use crate::identity::{Role, User, WorkerProfile};
use crate::ids::ComplaintTypeId;

/// Why a candidate cannot take a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligibility {
    NotAWorker { role: Role },
    Unavailable,
    Unqualified { complaint_type: ComplaintTypeId },
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::NotAWorker { role } => write!(f, "account is a {role}, not a worker"),
            Ineligibility::Unavailable => write!(f, "worker is marked unavailable"),
            Ineligibility::Unqualified { complaint_type } => {
                write!(f, "worker does not handle complaint type {complaint_type}")
            }
        }
    }
}

/// A candidate is eligible iff they are a worker, available, and list the
/// complaint's type among their skills.
pub fn check_eligibility(
    candidate: &User,
    complaint_type: ComplaintTypeId,
) -> Result<&WorkerProfile, Ineligibility> {
    let profile = candidate
        .worker_profile()
        .ok_or(Ineligibility::NotAWorker {
            role: candidate.role(),
        })?;

    if !profile.is_available {
        return Err(Ineligibility::Unavailable);
    }
    if !profile.qualified_for(complaint_type) {
        return Err(Ineligibility::Unqualified { complaint_type });
    }
    Ok(profile)
}

/// Every eligible candidate, ordered by id. Selection among them is left to
/// the caller.
pub fn eligible_workers<I>(candidates: I, complaint_type: ComplaintTypeId) -> Vec<User>
where
    I: IntoIterator<Item = User>,
{
    let mut eligible: Vec<User> = candidates
        .into_iter()
        .filter(|candidate| check_eligibility(candidate, complaint_type).is_ok())
        .collect();
    eligible.sort_by_key(|user| user.id);
    eligible
}
