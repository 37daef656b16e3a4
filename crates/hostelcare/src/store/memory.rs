use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{
    ComplaintRepository, ComplaintTypeRepository, HousingRepository, RepositoryError,
    UserRepository,
};
use crate::catalog::{ComplaintType, NewComplaintType};
use crate::complaints::{Complaint, ComplaintQuery, NewComplaint};
use crate::housing::{Hostel, NewHostel, NewRoom, Room};
use crate::identity::{Email, NewUser, Role, RoleProfile, RollNumber, User};
use crate::ids::{ComplaintId, ComplaintTypeId, HostelId, RoomId, UserId};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    hostels: BTreeMap<HostelId, Hostel>,
    rooms: BTreeMap<RoomId, Room>,
    complaint_types: BTreeMap<ComplaintTypeId, ComplaintType>,
    complaints: BTreeMap<ComplaintId, Complaint>,
    last_id: u64,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Process-local store holding every table behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl UserRepository for MemoryStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        if let RoleProfile::Student(profile) = &user.profile {
            let taken = tables
                .users
                .values()
                .any(|existing| existing.roll_number() == Some(&profile.roll_number));
            if taken {
                return Err(RepositoryError::Conflict(format!(
                    "roll number {} is already registered",
                    profile.roll_number
                )));
            }
        }

        let id = UserId(tables.next_id());
        let stored = User {
            id,
            full_name: user.full_name,
            email: user.email,
            hostel: user.hostel,
            profile: user.profile,
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        match tables.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    fn find_user_by_roll_number(
        &self,
        roll: &RollNumber,
    ) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|user| user.roll_number() == Some(roll))
            .cloned())
    }

    fn users_with_role(&self, role: Role) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .filter(|user| user.role() == role)
            .cloned()
            .collect())
    }

    fn room_residents(&self, room: RoomId) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .filter(|user| user.room() == Some(room))
            .cloned()
            .collect())
    }

    fn hostel_residents(&self, hostel: HostelId) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .filter(|user| user.role() == Role::Student && user.hostel == Some(hostel))
            .cloned()
            .collect())
    }
}

impl HousingRepository for MemoryStore {
    fn insert_hostel(&self, hostel: NewHostel) -> Result<Hostel, RepositoryError> {
        let mut tables = self.tables.write();
        if tables
            .hostels
            .values()
            .any(|existing| same_name(&existing.name, &hostel.name))
        {
            return Err(RepositoryError::Conflict(format!(
                "hostel '{}' already exists",
                hostel.name
            )));
        }

        let id = HostelId(tables.next_id());
        let stored = Hostel {
            id,
            name: hostel.name,
            capacity: hostel.capacity,
            warden: hostel.warden,
        };
        tables.hostels.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_hostel(&self, hostel: Hostel) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        match tables.hostels.get_mut(&hostel.id) {
            Some(slot) => {
                *slot = hostel;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_hostel(&self, id: HostelId) -> Result<Option<Hostel>, RepositoryError> {
        Ok(self.tables.read().hostels.get(&id).cloned())
    }

    fn all_hostels(&self) -> Result<Vec<Hostel>, RepositoryError> {
        Ok(self.tables.read().hostels.values().cloned().collect())
    }

    fn hostel_managed_by(&self, warden: UserId) -> Result<Option<Hostel>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .hostels
            .values()
            .find(|hostel| hostel.warden == Some(warden))
            .cloned())
    }

    fn insert_room(&self, room: NewRoom) -> Result<Room, RepositoryError> {
        let mut tables = self.tables.write();
        if !tables.hostels.contains_key(&room.hostel) {
            return Err(RepositoryError::NotFound);
        }
        let duplicate = tables.rooms.values().any(|existing| {
            existing.hostel == room.hostel && same_name(&existing.room_number, &room.room_number)
        });
        if duplicate {
            return Err(RepositoryError::Conflict(format!(
                "room {} already exists in hostel {}",
                room.room_number, room.hostel
            )));
        }

        let id = RoomId(tables.next_id());
        let stored = Room {
            id,
            hostel: room.hostel,
            room_number: room.room_number,
            capacity: room.capacity,
        };
        tables.rooms.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_room(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        Ok(self.tables.read().rooms.get(&id).cloned())
    }

    fn rooms_in(&self, hostel: HostelId) -> Result<Vec<Room>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .rooms
            .values()
            .filter(|room| room.hostel == hostel)
            .cloned()
            .collect())
    }
}

impl ComplaintTypeRepository for MemoryStore {
    fn insert_complaint_type(
        &self,
        complaint_type: NewComplaintType,
    ) -> Result<ComplaintType, RepositoryError> {
        let mut tables = self.tables.write();
        if tables
            .complaint_types
            .values()
            .any(|existing| same_name(&existing.name, &complaint_type.name))
        {
            return Err(RepositoryError::Conflict(format!(
                "complaint type '{}' already exists",
                complaint_type.name
            )));
        }

        let id = ComplaintTypeId(tables.next_id());
        let stored = ComplaintType {
            id,
            name: complaint_type.name,
            description: complaint_type.description,
            expected_response_hours: complaint_type.expected_response_hours,
        };
        tables.complaint_types.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_complaint_type(
        &self,
        id: ComplaintTypeId,
    ) -> Result<Option<ComplaintType>, RepositoryError> {
        Ok(self.tables.read().complaint_types.get(&id).cloned())
    }

    fn find_complaint_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ComplaintType>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .complaint_types
            .values()
            .find(|existing| same_name(&existing.name, name))
            .cloned())
    }

    fn all_complaint_types(&self) -> Result<Vec<ComplaintType>, RepositoryError> {
        Ok(self.tables.read().complaint_types.values().cloned().collect())
    }

    fn remove_complaint_type(&self, id: ComplaintTypeId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        if tables
            .complaints
            .values()
            .any(|complaint| complaint.complaint_type == id)
        {
            return Err(RepositoryError::Conflict(format!(
                "complaint type {id} is still referenced"
            )));
        }
        tables
            .complaint_types
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl ComplaintRepository for MemoryStore {
    fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, RepositoryError> {
        let mut tables = self.tables.write();
        // same lock as remove_complaint_type, so a type cannot vanish under a new complaint
        if !tables.complaint_types.contains_key(&complaint.complaint_type) {
            return Err(RepositoryError::Conflict(format!(
                "complaint type {} does not exist",
                complaint.complaint_type
            )));
        }
        let id = ComplaintId(tables.next_id());
        let stored = Complaint {
            id,
            student: complaint.student,
            complaint_type: complaint.complaint_type,
            description: complaint.description,
            status: complaint.status,
            assigned_worker: None,
            created_at: complaint.created_at,
            updated_at: complaint.created_at,
        };
        tables.complaints.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_complaint(&self, complaint: Complaint) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        match tables.complaints.get_mut(&complaint.id) {
            Some(slot) => {
                *slot = complaint;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>, RepositoryError> {
        Ok(self.tables.read().complaints.get(&id).cloned())
    }

    fn query_complaints(&self, query: ComplaintQuery) -> Result<Vec<Complaint>, RepositoryError> {
        let tables = self.tables.read();
        let matches = |complaint: &Complaint| match query {
            ComplaintQuery::All => true,
            ComplaintQuery::FiledBy(student) => complaint.student == student,
            ComplaintQuery::AssignedTo(worker) => complaint.assigned_worker == Some(worker),
            ComplaintQuery::FromHostel(hostel) => tables
                .users
                .get(&complaint.student)
                .is_some_and(|student| student.hostel == Some(hostel)),
        };

        let mut selected: Vec<Complaint> = tables
            .complaints
            .values()
            .filter(|complaint| matches(complaint))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(selected)
    }

    fn count_complaints_of_type(&self, id: ComplaintTypeId) -> Result<usize, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .complaints
            .values()
            .filter(|complaint| complaint.complaint_type == id)
            .count())
    }
}
