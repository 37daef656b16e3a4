use serde::{Deserialize, Serialize};

use crate::ids::{HostelId, RoomId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hostel {
    pub id: HostelId,
    pub name: String,
    pub capacity: u32,
    pub warden: Option<UserId>,
}

impl Hostel {
    pub fn available_space(&self, occupancy: usize) -> usize {
        (self.capacity as usize).saturating_sub(occupancy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub hostel: HostelId,
    pub room_number: String,
    pub capacity: u32,
}

impl Room {
    pub fn is_full(&self, occupants: usize) -> bool {
        occupants >= self.capacity as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewHostel {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub warden: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub hostel: HostelId,
    pub room_number: String,
    pub capacity: u32,
}

/// Room plus its derived occupancy at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomOccupancy {
    pub room: Room,
    pub occupants: usize,
    pub is_full: bool,
}

impl RoomOccupancy {
    pub fn new(room: Room, occupants: usize) -> Self {
        let is_full = room.is_full(occupants);
        Self {
            room,
            occupants,
            is_full,
        }
    }
}

/// Occupancy dashboard for one hostel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostelStatistics {
    pub hostel_id: HostelId,
    pub hostel_name: String,
    pub total_capacity: u32,
    pub current_occupancy: usize,
    pub available_space: usize,
    pub total_rooms: usize,
    pub occupied_rooms: usize,
    pub full_rooms: usize,
    pub empty_rooms: usize,
    /// Share of rooms with at least one occupant, percent to one decimal.
    pub occupancy_rate: f64,
    /// Residents over hostel capacity, percent to one decimal.
    pub capacity_utilization: f64,
}

impl HostelStatistics {
    pub fn compute(hostel: &Hostel, occupancy: usize, rooms: &[RoomOccupancy]) -> Self {
        let total_rooms = rooms.len();
        let occupied_rooms = rooms.iter().filter(|room| room.occupants > 0).count();
        let full_rooms = rooms.iter().filter(|room| room.is_full).count();

        Self {
            hostel_id: hostel.id,
            hostel_name: hostel.name.clone(),
            total_capacity: hostel.capacity,
            current_occupancy: occupancy,
            available_space: hostel.available_space(occupancy),
            total_rooms,
            occupied_rooms,
            full_rooms,
            empty_rooms: total_rooms - occupied_rooms,
            occupancy_rate: percent(occupied_rooms, total_rooms),
            capacity_utilization: percent(occupancy, hostel.capacity as usize),
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: u64, capacity: u32) -> Room {
        Room {
            id: RoomId(id),
            hostel: HostelId(1),
            room_number: format!("A-{id}"),
            capacity,
        }
    }

    #[test]
    fn room_is_full_at_capacity() {
        let double = room(1, 2);
        assert!(!double.is_full(1));
        assert!(double.is_full(2));
        assert!(double.is_full(3));
    }

    #[test]
    fn available_space_never_goes_negative() {
        let hostel = Hostel {
            id: HostelId(1),
            name: "Aravali".to_string(),
            capacity: 2,
            warden: None,
        };
        assert_eq!(hostel.available_space(1), 1);
        assert_eq!(hostel.available_space(5), 0);
    }

    #[test]
    fn statistics_round_to_one_decimal() {
        let hostel = Hostel {
            id: HostelId(1),
            name: "Aravali".to_string(),
            capacity: 9,
            warden: None,
        };
        let rooms = vec![
            RoomOccupancy::new(room(1, 2), 2),
            RoomOccupancy::new(room(2, 2), 1),
            RoomOccupancy::new(room(3, 2), 0),
        ];

        let stats = HostelStatistics::compute(&hostel, 3, &rooms);
        assert_eq!(stats.total_rooms, 3);
        assert_eq!(stats.occupied_rooms, 2);
        assert_eq!(stats.full_rooms, 1);
        assert_eq!(stats.empty_rooms, 1);
        assert_eq!(stats.available_space, 6);
        assert_eq!(stats.occupancy_rate, 66.7);
        assert_eq!(stats.capacity_utilization, 33.3);
    }

    #[test]
    fn statistics_handle_empty_hostel() {
        let hostel = Hostel {
            id: HostelId(2),
            name: "Nilgiri".to_string(),
            capacity: 0,
            warden: None,
        };
        let stats = HostelStatistics::compute(&hostel, 0, &[]);
        assert_eq!(stats.occupancy_rate, 0.0);
        assert_eq!(stats.capacity_utilization, 0.0);
    }
}
