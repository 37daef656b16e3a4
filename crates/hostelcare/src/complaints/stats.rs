use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Complaint, ComplaintStatus};
use crate::catalog::ComplaintType;
use crate::error::HostelError;
use crate::ids::ComplaintTypeId;

/// Trailing window charted by the timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsPeriod {
    /// Last 7 days, one bucket per day.
    #[default]
    Week,
    /// Last 30 days, one bucket per day.
    Month,
    /// Last 365 days, one bucket per calendar month.
    Year,
}

impl StatisticsPeriod {
    pub fn window(self) -> Duration {
        match self {
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
            Self::Year => Duration::days(365),
        }
    }

    fn bucket_label(self, at: DateTime<Utc>) -> String {
        match self {
            Self::Week | Self::Month => at.format("%Y-%m-%d").to_string(),
            Self::Year => at.format("%Y-%m").to_string(),
        }
    }
}

impl FromStr for StatisticsPeriod {
    type Err = HostelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(HostelError::Validation(format!(
                "unknown statistics period '{other}'; expected week, month or year"
            ))),
        }
    }
}

/// Complaints filed within one day or month of the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBucket {
    /// `YYYY-MM-DD` for daily buckets, `YYYY-MM` for monthly ones.
    pub label: String,
    pub total: usize,
    pub pending: usize,
    pub assigned: usize,
    pub resolved: usize,
}

impl TimelineBucket {
    fn empty(label: String) -> Self {
        Self {
            label,
            total: 0,
            pending: 0,
            assigned: 0,
            resolved: 0,
        }
    }
}

/// Buckets complaints filed in the trailing window ending at `now`, oldest
/// first. Buckets without complaints are omitted.
pub fn timeline(
    complaints: &[Complaint],
    period: StatisticsPeriod,
    now: DateTime<Utc>,
) -> Vec<TimelineBucket> {
    let since = now - period.window();
    let mut buckets: BTreeMap<String, TimelineBucket> = BTreeMap::new();

    for complaint in complaints
        .iter()
        .filter(|complaint| complaint.created_at >= since)
    {
        let label = period.bucket_label(complaint.created_at);
        let bucket = buckets
            .entry(label.clone())
            .or_insert_with(|| TimelineBucket::empty(label));
        bucket.total += 1;
        match complaint.status {
            ComplaintStatus::Pending => bucket.pending += 1,
            ComplaintStatus::Assigned => bucket.assigned += 1,
            ComplaintStatus::Resolved => bucket.resolved += 1,
            ComplaintStatus::InProgress | ComplaintStatus::Rejected => {}
        }
    }

    // labels are zero-padded, so key order is chronological
    buckets.into_values().collect()
}

/// Dashboard counts over a caller's scoped complaints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplaintStatistics {
    pub total: usize,
    pub active: usize,
    /// Every status is present, zero when unused.
    pub by_status: BTreeMap<ComplaintStatus, usize>,
    /// Only types with at least one complaint, busiest first.
    pub by_type: Vec<TypeCount>,
    pub period: StatisticsPeriod,
    pub timeline: Vec<TimelineBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub complaint_type: ComplaintTypeId,
    pub name: String,
    pub count: usize,
}

impl ComplaintStatistics {
    pub fn tally(
        complaints: &[Complaint],
        types: &[ComplaintType],
        period: StatisticsPeriod,
        now: DateTime<Utc>,
    ) -> Self {
        let mut by_status: BTreeMap<ComplaintStatus, usize> =
            ComplaintStatus::ALL.into_iter().map(|status| (status, 0)).collect();
        let mut per_type: BTreeMap<ComplaintTypeId, usize> = BTreeMap::new();

        for complaint in complaints {
            *by_status.entry(complaint.status).or_default() += 1;
            *per_type.entry(complaint.complaint_type).or_default() += 1;
        }

        let mut by_type: Vec<TypeCount> = per_type
            .into_iter()
            .map(|(id, count)| TypeCount {
                complaint_type: id,
                name: types
                    .iter()
                    .find(|kind| kind.id == id)
                    .map(|kind| kind.name.clone())
                    .unwrap_or_else(|| format!("type {id}")),
                count,
            })
            .collect();
        by_type.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        Self {
            total: complaints.len(),
            active: complaints
                .iter()
                .filter(|complaint| complaint.status.is_active())
                .count(),
            by_status,
            by_type,
            period,
            timeline: timeline(complaints, period, now),
        }
    }
}
