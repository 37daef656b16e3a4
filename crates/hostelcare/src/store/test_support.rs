//! Fixtures that seed a [`MemoryStore`] directly, bypassing service checks.

use std::collections::BTreeSet;

use super::memory::MemoryStore;
use super::{ComplaintTypeRepository, HousingRepository, UserRepository};
use crate::catalog::{ComplaintType, NewComplaintType};
use crate::housing::{Hostel, NewHostel, NewRoom, Room};
use crate::identity::{Email, NewUser, RoleProfile, RollNumber, StudentProfile, User, WorkerProfile};
use crate::ids::{ComplaintTypeId, HostelId, UserId};

fn institute_email(local: &str) -> Email {
    Email::parse(&format!("{local}@iiitkottayam.ac.in")).expect("fixture email")
}

fn insert(store: &MemoryStore, full_name: &str, local: &str, hostel: Option<HostelId>, profile: RoleProfile) -> User {
    store
        .insert_user(NewUser {
            full_name: full_name.to_string(),
            email: institute_email(local),
            hostel,
            profile,
        })
        .expect("fixture user")
}

pub(crate) fn admin(store: &MemoryStore) -> User {
    insert(store, "Desk Admin", "admin", None, RoleProfile::Admin)
}

pub(crate) fn warden(store: &MemoryStore, local: &str) -> User {
    insert(store, "Hostel Warden", local, None, RoleProfile::Warden)
}

pub(crate) fn staff(store: &MemoryStore, local: &str) -> User {
    insert(store, "Maintenance Staff", local, None, RoleProfile::Staff)
}

pub(crate) fn student(store: &MemoryStore, roll: &str, hostel: Option<HostelId>) -> User {
    let roll_number = RollNumber::parse(roll).expect("fixture roll number");
    let local = roll_number.as_str().to_string();
    insert(
        store,
        &format!("Student {roll}"),
        &local,
        hostel,
        RoleProfile::Student(StudentProfile {
            roll_number,
            room: None,
            year_of_study: 2,
            department: "CSE".to_string(),
        }),
    )
}

pub(crate) fn worker(
    store: &MemoryStore,
    local: &str,
    skills: &[ComplaintTypeId],
    is_available: bool,
) -> User {
    insert(
        store,
        &format!("Worker {local}"),
        local,
        None,
        RoleProfile::Worker(WorkerProfile {
            worker_type: "maintenance".to_string(),
            complaint_types: skills.iter().copied().collect::<BTreeSet<_>>(),
            is_available,
        }),
    )
}

pub(crate) fn hostel(store: &MemoryStore, name: &str, capacity: u32, warden: Option<UserId>) -> Hostel {
    store
        .insert_hostel(NewHostel {
            name: name.to_string(),
            capacity,
            warden,
        })
        .expect("fixture hostel")
}

pub(crate) fn room(store: &MemoryStore, hostel: HostelId, number: &str, capacity: u32) -> Room {
    store
        .insert_room(NewRoom {
            hostel,
            room_number: number.to_string(),
            capacity,
        })
        .expect("fixture room")
}

pub(crate) fn complaint_type(store: &MemoryStore, name: &str) -> ComplaintType {
    store
        .insert_complaint_type(NewComplaintType {
            name: name.to_string(),
            description: format!("{name} issues"),
            expected_response_hours: Some(48),
        })
        .expect("fixture complaint type")
}
