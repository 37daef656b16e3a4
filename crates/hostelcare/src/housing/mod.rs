//! Hostels, rooms and occupancy.

mod domain;
pub(crate) mod router;
mod service;

pub use domain::{Hostel, HostelStatistics, NewHostel, NewRoom, Room, RoomOccupancy};
pub use service::{HousingService, RoomAssignment, RoomDraft};
