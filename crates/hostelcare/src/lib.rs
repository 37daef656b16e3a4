//! Maintenance desk for hostels: students file complaints, wardens and staff
//! assign them to qualified workers, and workers close them out.
//!
//! Every service takes the acting [`identity::User`] explicitly; persistence,
//! mail delivery and credential checks sit behind the traits in
//! [`store`], [`notifications`] and [`identity`].

pub mod catalog;
pub mod complaints;
pub mod config;
pub mod desk;
pub mod error;
pub mod housing;
pub mod identity;
pub mod notifications;
pub mod store;
pub mod telemetry;

mod ids;
mod locks;

pub use desk::{desk_router, Desk, ACTOR_HEADER};
pub use error::{AppError, HostelError};
pub use ids::{ComplaintId, ComplaintTypeId, HostelId, RoomId, UserId};
