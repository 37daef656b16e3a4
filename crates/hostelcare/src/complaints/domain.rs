use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ComplaintId, ComplaintTypeId, HostelId, UserId};

/// Position of a complaint in its lifecycle. `Resolved` and `Rejected` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    Assigned,
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Assigned,
        Self::InProgress,
        Self::Resolved,
        Self::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }

    /// Counts against the per-student quota.
    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Status reached by applying `action`, if the lifecycle allows it.
    pub const fn after(self, action: ComplaintAction) -> Option<Self> {
        use ComplaintAction as A;
        match (self, action) {
            (Self::Pending | Self::Assigned, A::Assign) => Some(Self::Assigned),
            (Self::Assigned, A::Start) => Some(Self::InProgress),
            (Self::Assigned | Self::InProgress, A::Resolve) => Some(Self::Resolved),
            (Self::Pending | Self::Assigned | Self::InProgress, A::Reject) => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mutations that move a complaint through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintAction {
    Assign,
    Start,
    Resolve,
    Reject,
}

impl ComplaintAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Start => "start",
            Self::Resolve => "resolve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for ComplaintAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: ComplaintId,
    pub student: UserId,
    pub complaint_type: ComplaintTypeId,
    pub description: String,
    pub status: ComplaintStatus,
    pub assigned_worker: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Complaint draft; the store allocates the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComplaint {
    pub student: UserId,
    pub complaint_type: ComplaintTypeId,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
}

impl NewComplaint {
    pub fn pending(student: UserId, complaint_type: ComplaintTypeId, description: String) -> Self {
        Self {
            student,
            complaint_type,
            description,
            status: ComplaintStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Row selection handed to the store, derived from the caller's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintQuery {
    All,
    FiledBy(UserId),
    AssignedTo(UserId),
    /// Complaints whose filing student lives in the hostel.
    FromHostel(HostelId),
}

/// Request body for `POST /complaints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintSubmission {
    pub complaint_type: ComplaintTypeId,
    pub description: String,
}
