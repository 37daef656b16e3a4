use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Hostel, HostelStatistics, NewHostel, NewRoom, Room, RoomOccupancy};
use crate::error::HostelError;
use crate::identity::{Role, User};
use crate::ids::{HostelId, RoomId, UserId};
use crate::locks::KeyedLocks;
use crate::store::{HostelStore, RepositoryError};

/// Body of `POST /hostels/:id/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomDraft {
    pub room_number: String,
    pub capacity: u32,
}

/// Outcome of placing a student in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomAssignment {
    pub room: RoomOccupancy,
    pub student: User,
}

/// Hostels, rooms and who lives where.
pub struct HousingService<S> {
    store: Arc<S>,
    room_locks: KeyedLocks<RoomId>,
    hostel_writes: Mutex<()>,
}

impl<S: HostelStore> HousingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            room_locks: KeyedLocks::default(),
            hostel_writes: Mutex::new(()),
        }
    }

    pub fn create_hostel(&self, actor: &User, draft: NewHostel) -> Result<Hostel, HostelError> {
        require_admin(actor, "create hostels")?;
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(HostelError::Validation(
                "hostel name must not be blank".to_string(),
            ));
        }
        if draft.capacity == 0 {
            return Err(HostelError::Validation(
                "hostel capacity must be positive".to_string(),
            ));
        }

        let _writes = self.hostel_writes.lock();
        if let Some(warden) = draft.warden {
            self.check_warden_free(warden, None)?;
        }
        let hostel = self
            .store
            .insert_hostel(NewHostel {
                name,
                capacity: draft.capacity,
                warden: draft.warden,
            })
            .map_err(conflict_as_validation)?;
        if let Some(warden) = hostel.warden {
            self.attach_warden(warden, hostel.id)?;
        }

        info!(hostel = %hostel.id, name = %hostel.name, "hostel created");
        Ok(hostel)
    }

    pub fn add_room(
        &self,
        actor: &User,
        hostel: HostelId,
        draft: RoomDraft,
    ) -> Result<Room, HostelError> {
        require_admin(actor, "add rooms")?;
        let room_number = draft.room_number.trim().to_string();
        if room_number.is_empty() {
            return Err(HostelError::Validation(
                "room number must not be blank".to_string(),
            ));
        }
        if draft.capacity == 0 {
            return Err(HostelError::Validation(
                "room capacity must be positive".to_string(),
            ));
        }
        self.hostel(hostel)?;

        let room = self
            .store
            .insert_room(NewRoom {
                hostel,
                room_number,
                capacity: draft.capacity,
            })
            .map_err(conflict_as_validation)?;
        info!(hostel = %hostel, room = %room.id, number = %room.room_number, "room added");
        Ok(room)
    }

    /// Put `warden` in charge of `hostel`, replacing any previous warden. A
    /// warden manages at most one hostel.
    pub fn assign_warden(
        &self,
        actor: &User,
        hostel: HostelId,
        warden: UserId,
    ) -> Result<Hostel, HostelError> {
        require_admin(actor, "assign wardens")?;
        let _writes = self.hostel_writes.lock();

        let mut record = self.hostel(hostel)?;
        self.check_warden_free(warden, Some(hostel))?;
        if let Some(previous) = record.warden.filter(|previous| *previous != warden) {
            if let Some(mut user) = self.store.fetch_user(previous)? {
                user.hostel = None;
                self.store.update_user(user)?;
            }
        }
        record.warden = Some(warden);
        self.store.update_hostel(record.clone())?;
        self.attach_warden(warden, hostel)?;

        info!(hostel = %hostel, warden = %warden, "warden assigned");
        Ok(record)
    }

    /// Move `student` into `room`. Wardens may only fill rooms of the hostel
    /// they manage. Placing a student in the room they already occupy changes
    /// nothing.
    pub fn assign_room(
        &self,
        actor: &User,
        room_id: RoomId,
        student_id: UserId,
    ) -> Result<RoomAssignment, HostelError> {
        let room = self.room(room_id)?;
        match actor.role() {
            Role::Staff | Role::Admin => {}
            Role::Warden => {
                let managed = self.managed_hostel(actor)?;
                if managed.id != room.hostel {
                    return Err(HostelError::Authorization(format!(
                        "room {room_id} is not in the hostel you manage"
                    )));
                }
            }
            _ => {
                return Err(HostelError::Authorization(
                    "only wardens, staff or administrators can assign rooms".to_string(),
                ))
            }
        }

        let slot = self.room_locks.slot(&room_id);
        let _guard = slot.lock();

        let mut student = self
            .store
            .fetch_user(student_id)?
            .ok_or_else(|| HostelError::NotFound(format!("student {student_id}")))?;
        let occupants = self.store.room_residents(room_id)?.len();

        if student.room() == Some(room_id) {
            return Ok(RoomAssignment {
                room: RoomOccupancy::new(room, occupants),
                student,
            });
        }
        if room.is_full(occupants) {
            return Err(HostelError::RoomFull {
                room: room_id,
                occupants,
                capacity: room.capacity,
            });
        }

        let profile = student.student_profile_mut().ok_or_else(|| {
            HostelError::Validation(format!("user {student_id} is not a student"))
        })?;
        profile.room = Some(room_id);
        student.hostel = Some(room.hostel);
        self.store.update_user(student.clone())?;

        info!(room = %room_id, student = %student_id, hostel = %room.hostel, "student placed in room");
        Ok(RoomAssignment {
            room: RoomOccupancy::new(room, occupants + 1),
            student,
        })
    }

    pub fn room_occupancy(&self, room_id: RoomId) -> Result<RoomOccupancy, HostelError> {
        let room = self.room(room_id)?;
        let occupants = self.store.room_residents(room_id)?.len();
        Ok(RoomOccupancy::new(room, occupants))
    }

    /// Wardens only see the hostel they manage; staff and admins see any.
    pub fn hostel_statistics(
        &self,
        actor: &User,
        hostel_id: HostelId,
    ) -> Result<HostelStatistics, HostelError> {
        match actor.role() {
            Role::Staff | Role::Admin => {}
            Role::Warden => {
                if self.managed_hostel(actor)?.id != hostel_id {
                    return Err(HostelError::Authorization(format!(
                        "hostel {hostel_id} is managed by another warden"
                    )));
                }
            }
            _ => {
                return Err(HostelError::Authorization(
                    "only wardens, staff or administrators can view hostel statistics".to_string(),
                ))
            }
        }

        let hostel = self.hostel(hostel_id)?;
        let occupancy = self.store.hostel_residents(hostel_id)?.len();
        let rooms = self
            .store
            .rooms_in(hostel_id)?
            .into_iter()
            .map(|room| {
                let occupants = self.store.room_residents(room.id)?.len();
                Ok(RoomOccupancy::new(room, occupants))
            })
            .collect::<Result<Vec<_>, HostelError>>()?;

        Ok(HostelStatistics::compute(&hostel, occupancy, &rooms))
    }

    fn hostel(&self, id: HostelId) -> Result<Hostel, HostelError> {
        self.store
            .fetch_hostel(id)?
            .ok_or_else(|| HostelError::NotFound(format!("hostel {id}")))
    }

    fn room(&self, id: RoomId) -> Result<Room, HostelError> {
        self.store
            .fetch_room(id)?
            .ok_or_else(|| HostelError::NotFound(format!("room {id}")))
    }

    fn managed_hostel(&self, warden: &User) -> Result<Hostel, HostelError> {
        self.store
            .hostel_managed_by(warden.id)?
            .ok_or_else(|| HostelError::NotFound(format!("hostel managed by warden {}", warden.id)))
    }

    fn check_warden_free(&self, warden: UserId, target: Option<HostelId>) -> Result<(), HostelError> {
        let user = self
            .store
            .fetch_user(warden)?
            .ok_or_else(|| HostelError::NotFound(format!("warden {warden}")))?;
        if user.role() != Role::Warden {
            return Err(HostelError::Validation(format!(
                "user {warden} is a {}, not a warden",
                user.role()
            )));
        }
        if let Some(current) = self.store.hostel_managed_by(warden)? {
            if Some(current.id) != target {
                return Err(HostelError::Validation(format!(
                    "warden {warden} already manages {}",
                    current.name
                )));
            }
        }
        Ok(())
    }

    fn attach_warden(&self, warden: UserId, hostel: HostelId) -> Result<(), HostelError> {
        if let Some(mut user) = self.store.fetch_user(warden)? {
            user.hostel = Some(hostel);
            self.store.update_user(user)?;
        }
        Ok(())
    }
}

fn require_admin(actor: &User, action: &str) -> Result<(), HostelError> {
    if actor.role() == Role::Admin {
        Ok(())
    } else {
        Err(HostelError::Authorization(format!(
            "only administrators can {action}"
        )))
    }
}

fn conflict_as_validation(err: RepositoryError) -> HostelError {
    match err {
        RepositoryError::Conflict(detail) => HostelError::Validation(detail),
        other => HostelError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::test_support::{admin, hostel, room, student, warden};
    use crate::store::UserRepository;

    fn service() -> (HousingService<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (HousingService::new(store.clone()), store)
    }

    #[test]
    fn full_room_rejects_another_student() {
        let (housing, store) = service();
        let admin = admin(&store);
        let north = hostel(&store, "North", 10, None);
        let single = room(&store, north.id, "101", 1);
        let first = student(&store, "2024bcs0001", None);
        let second = student(&store, "2024bcs0002", None);

        let placed = housing
            .assign_room(&admin, single.id, first.id)
            .expect("first student fits");
        assert!(placed.room.is_full);
        assert_eq!(placed.student.hostel, Some(north.id));

        match housing.assign_room(&admin, single.id, second.id) {
            Err(HostelError::RoomFull {
                occupants,
                capacity,
                ..
            }) => assert_eq!((occupants, capacity), (1, 1)),
            other => panic!("expected full room, got {other:?}"),
        }
    }

    #[test]
    fn reassigning_the_same_room_is_a_no_op() {
        let (housing, store) = service();
        let admin = admin(&store);
        let north = hostel(&store, "North", 10, None);
        let single = room(&store, north.id, "101", 1);
        let resident = student(&store, "2024bcs0001", None);

        housing.assign_room(&admin, single.id, resident.id).expect("placed");
        let again = housing
            .assign_room(&admin, single.id, resident.id)
            .expect("same room again");
        assert_eq!(again.room.occupants, 1);
    }

    #[test]
    fn wardens_only_fill_their_own_hostel() {
        let (housing, store) = service();
        let north_warden = warden(&store, "warden.north");
        let north = hostel(&store, "North", 10, Some(north_warden.id));
        let south = hostel(&store, "South", 10, None);
        let south_room = room(&store, south.id, "201", 2);
        let north_room = room(&store, north.id, "101", 2);
        let resident = student(&store, "2024bcs0001", None);

        assert!(matches!(
            housing.assign_room(&north_warden, south_room.id, resident.id),
            Err(HostelError::Authorization(_))
        ));
        housing
            .assign_room(&north_warden, north_room.id, resident.id)
            .expect("own hostel");
    }

    #[test]
    fn warden_manages_one_hostel_at_most() {
        let (housing, store) = service();
        let admin = admin(&store);
        let keeper = warden(&store, "warden.keeper");
        let first = hostel(&store, "North", 10, None);
        let second = hostel(&store, "South", 10, None);

        housing
            .assign_warden(&admin, first.id, keeper.id)
            .expect("first hostel");
        assert!(matches!(
            housing.assign_warden(&admin, second.id, keeper.id),
            Err(HostelError::Validation(_))
        ));
        assert_eq!(
            store.fetch_user(keeper.id).expect("fetch").and_then(|u| u.hostel),
            Some(first.id)
        );
    }

    #[test]
    fn hostel_and_room_drafts_are_validated() {
        let (housing, store) = service();
        let admin = admin(&store);

        assert!(matches!(
            housing.create_hostel(
                &admin,
                NewHostel {
                    name: "North".to_string(),
                    capacity: 0,
                    warden: None,
                }
            ),
            Err(HostelError::Validation(_))
        ));

        let north = housing
            .create_hostel(
                &admin,
                NewHostel {
                    name: "North".to_string(),
                    capacity: 40,
                    warden: None,
                },
            )
            .expect("created");
        let draft = RoomDraft {
            room_number: "101".to_string(),
            capacity: 2,
        };
        housing.add_room(&admin, north.id, draft.clone()).expect("room");
        assert!(matches!(
            housing.add_room(&admin, north.id, draft),
            Err(HostelError::Validation(_))
        ));
    }

    #[test]
    fn statistics_reflect_placements() {
        let (housing, store) = service();
        let admin = admin(&store);
        let north = hostel(&store, "North", 4, None);
        let double = room(&store, north.id, "101", 2);
        room(&store, north.id, "102", 2);
        let resident = student(&store, "2024bcs0001", None);
        housing.assign_room(&admin, double.id, resident.id).expect("placed");

        let stats = housing.hostel_statistics(&admin, north.id).expect("stats");
        assert_eq!(stats.current_occupancy, 1);
        assert_eq!(stats.available_space, 3);
        assert_eq!(stats.occupied_rooms, 1);
        assert_eq!(stats.empty_rooms, 1);
        assert_eq!(stats.occupancy_rate, 50.0);
        assert_eq!(stats.capacity_utilization, 25.0);
    }
}
