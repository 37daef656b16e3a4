use crate::error::HostelError;
use crate::identity::{Role, User};
use crate::ids::{HostelId, UserId};
use crate::store::{HousingRepository, UserRepository};

use super::domain::{Complaint, ComplaintQuery};

/// The slice of complaints a caller may see and act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Students: complaints they filed.
    Own(UserId),
    /// Workers: complaints assigned to them.
    Assigned(UserId),
    /// Wardens: complaints filed by residents of the hostel they manage.
    Hostel(HostelId),
    /// Staff and admins.
    Everything,
}

impl Scope {
    /// Wardens without a hostel have nothing to see and get `NotFound`.
    pub fn resolve<H>(actor: &User, housing: &H) -> Result<Self, HostelError>
    where
        H: HousingRepository + ?Sized,
    {
        match actor.role() {
            Role::Student => Ok(Scope::Own(actor.id)),
            Role::Worker => Ok(Scope::Assigned(actor.id)),
            Role::Warden => housing
                .hostel_managed_by(actor.id)?
                .map(|hostel| Scope::Hostel(hostel.id))
                .ok_or_else(|| {
                    HostelError::NotFound(format!("hostel managed by warden {}", actor.id))
                }),
            Role::Staff | Role::Admin => Ok(Scope::Everything),
        }
    }

    pub const fn query(self) -> ComplaintQuery {
        match self {
            Scope::Own(student) => ComplaintQuery::FiledBy(student),
            Scope::Assigned(worker) => ComplaintQuery::AssignedTo(worker),
            Scope::Hostel(hostel) => ComplaintQuery::FromHostel(hostel),
            Scope::Everything => ComplaintQuery::All,
        }
    }

    /// Whether `complaint` lies inside this scope. Hostel scope needs the
    /// filing student's current hostel, looked up through `users`.
    pub fn covers<U>(self, complaint: &Complaint, users: &U) -> Result<bool, HostelError>
    where
        U: UserRepository + ?Sized,
    {
        let covered = match self {
            Scope::Own(student) => complaint.student == student,
            Scope::Assigned(worker) => complaint.assigned_worker == Some(worker),
            Scope::Hostel(hostel) => users
                .fetch_user(complaint.student)?
                .is_some_and(|student| student.hostel == Some(hostel)),
            Scope::Everything => true,
        };
        Ok(covered)
    }

    pub fn authorize<U>(self, complaint: &Complaint, users: &U) -> Result<(), HostelError>
    where
        U: UserRepository + ?Sized,
    {
        if self.covers(complaint, users)? {
            Ok(())
        } else {
            Err(HostelError::Authorization(format!(
                "complaint {} is outside your scope",
                complaint.id
            )))
        }
    }
}
