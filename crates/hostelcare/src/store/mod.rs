//! Persistence seam. Services only see these traits so the lifecycle rules
//! run against any backend, including the in-memory one used by the demo
//! binary and the tests.

pub mod memory;

#[cfg(test)]
pub(crate) mod test_support;

use crate::catalog::{ComplaintType, NewComplaintType};
use crate::complaints::{Complaint, ComplaintQuery, NewComplaint};
use crate::housing::{Hostel, NewHostel, NewRoom, Room};
use crate::identity::{Email, NewUser, Role, RollNumber, User};
use crate::ids::{ComplaintId, ComplaintTypeId, HostelId, RoomId, UserId};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts with an existing one: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email or roll number is taken.
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn update_user(&self, user: User) -> Result<(), RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_roll_number(&self, roll: &RollNumber)
        -> Result<Option<User>, RepositoryError>;
    fn users_with_role(&self, role: Role) -> Result<Vec<User>, RepositoryError>;
    fn room_residents(&self, room: RoomId) -> Result<Vec<User>, RepositoryError>;
    fn hostel_residents(&self, hostel: HostelId) -> Result<Vec<User>, RepositoryError>;
}

pub trait HousingRepository: Send + Sync {
    /// Fails with `Conflict` when the name is taken.
    fn insert_hostel(&self, hostel: NewHostel) -> Result<Hostel, RepositoryError>;
    fn update_hostel(&self, hostel: Hostel) -> Result<(), RepositoryError>;
    fn fetch_hostel(&self, id: HostelId) -> Result<Option<Hostel>, RepositoryError>;
    fn all_hostels(&self) -> Result<Vec<Hostel>, RepositoryError>;
    fn hostel_managed_by(&self, warden: UserId) -> Result<Option<Hostel>, RepositoryError>;
    /// Fails with `Conflict` when the hostel already has that room number.
    fn insert_room(&self, room: NewRoom) -> Result<Room, RepositoryError>;
    fn fetch_room(&self, id: RoomId) -> Result<Option<Room>, RepositoryError>;
    fn rooms_in(&self, hostel: HostelId) -> Result<Vec<Room>, RepositoryError>;
}

pub trait ComplaintTypeRepository: Send + Sync {
    fn insert_complaint_type(
        &self,
        complaint_type: NewComplaintType,
    ) -> Result<ComplaintType, RepositoryError>;
    fn fetch_complaint_type(
        &self,
        id: ComplaintTypeId,
    ) -> Result<Option<ComplaintType>, RepositoryError>;
    /// Case-insensitive match.
    fn find_complaint_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ComplaintType>, RepositoryError>;
    fn all_complaint_types(&self) -> Result<Vec<ComplaintType>, RepositoryError>;
    fn remove_complaint_type(&self, id: ComplaintTypeId) -> Result<(), RepositoryError>;
}

pub trait ComplaintRepository: Send + Sync {
    fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, RepositoryError>;
    fn update_complaint(&self, complaint: Complaint) -> Result<(), RepositoryError>;
    fn fetch_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>, RepositoryError>;
    /// Matching complaints, newest first.
    fn query_complaints(&self, query: ComplaintQuery) -> Result<Vec<Complaint>, RepositoryError>;
    fn count_complaints_of_type(&self, id: ComplaintTypeId) -> Result<usize, RepositoryError>;
}

/// Everything the desk needs from one backend.
pub trait HostelStore:
    UserRepository + HousingRepository + ComplaintTypeRepository + ComplaintRepository + 'static
{
}

impl<T> HostelStore for T where
    T: UserRepository + HousingRepository + ComplaintTypeRepository + ComplaintRepository + 'static
{
}
