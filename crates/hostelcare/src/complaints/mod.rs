//! Complaint lifecycle engine and the per-role scoping applied to it.

pub mod domain;
mod eligibility;
mod export;
pub mod legacy;
pub(crate) mod router;
mod scope;
mod service;
mod stats;

#[cfg(test)]
mod tests;

pub use domain::{
    Complaint, ComplaintAction, ComplaintQuery, ComplaintStatus, ComplaintSubmission, NewComplaint,
};
pub use eligibility::{check_eligibility, eligible_workers, Ineligibility};
pub use export::{render_csv, ExportRow, EXPORT_HEADER};
pub use scope::Scope;
pub use service::ComplaintService;
pub use stats::{timeline, ComplaintStatistics, StatisticsPeriod, TimelineBucket, TypeCount};
