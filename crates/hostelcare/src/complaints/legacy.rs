//! One-shot import of complaints from the older owner-less schema.
//!
//! Legacy rows carry a free-text category, a human status label and a room
//! number instead of a filing student. Categories fold into the current type
//! catalog, statuses into the lifecycle, and the owner is found through a
//! caller-supplied lookup. Rows without a resolvable owner are reported and
//! left out.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::domain::{ComplaintStatus, NewComplaint};
use crate::catalog::ComplaintTypeRegistry;
use crate::error::HostelError;
use crate::identity::{Role, User};
use crate::ids::{ComplaintId, UserId};
use crate::store::HostelStore;

/// Catch-all category for anything the mapping does not know.
pub const FALLBACK_CATEGORY: &str = "Other";

#[derive(Debug, thiserror::Error)]
pub enum LegacyImportError {
    #[error("could not read legacy export: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed legacy export: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Desk(#[from] HostelError),
}

/// A row of the legacy complaint table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyComplaint {
    pub complaint_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub complaint_category: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub place: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LegacyComplaint {
    /// Folded description: `"{name}: {description}\nLocation: {place}, Room: {room}"`.
    pub fn migrated_description(&self) -> String {
        format!(
            "{}: {}\nLocation: {}, Room: {}",
            self.complaint_name.trim(),
            self.description.trim(),
            self.place.trim(),
            self.room_number.trim()
        )
    }
}

pub fn parse_export<R: Read>(reader: R) -> Result<Vec<LegacyComplaint>, LegacyImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<LegacyComplaint>() {
        records.push(row?);
    }
    Ok(records)
}

/// Current catalog name for a legacy category label.
pub fn map_category(legacy: &str) -> &'static str {
    match legacy.trim() {
        "Electrical" => "Electrical",
        "Plumbing" | "Bathroom Clogging" => "Plumbing",
        "Carpenting" => "Carpentry",
        "Water Filter" => "Water Services",
        _ => FALLBACK_CATEGORY,
    }
}

/// Unknown labels restart the lifecycle at pending.
pub fn map_status(legacy: &str) -> ComplaintStatus {
    match legacy.trim() {
        "Pending" => ComplaintStatus::Pending,
        "In Progress" => ComplaintStatus::Assigned,
        "Resolved" => ComplaintStatus::Resolved,
        _ => ComplaintStatus::Pending,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Position in the input, starting at 1.
    pub position: usize,
    pub complaint_name: String,
    pub room_number: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LegacyImportReport {
    pub migrated: Vec<ComplaintId>,
    pub skipped: Vec<SkippedRecord>,
}

/// Insert every record whose owner `owner_of` can name. Admin only; bypasses
/// the active-complaint quota since the rows already exist historically.
pub fn migrate<S, F>(
    store: &S,
    registry: &ComplaintTypeRegistry<S>,
    actor: &User,
    records: Vec<LegacyComplaint>,
    mut owner_of: F,
) -> Result<LegacyImportReport, HostelError>
where
    S: HostelStore,
    F: FnMut(&LegacyComplaint) -> Option<UserId>,
{
    if actor.role() != Role::Admin {
        return Err(HostelError::Authorization(
            "only administrators can import legacy complaints".to_string(),
        ));
    }

    let mut report = LegacyImportReport::default();
    for (index, record) in records.into_iter().enumerate() {
        let position = index + 1;
        let Some(owner) = owner_of(&record) else {
            warn!(position, room = %record.room_number, "legacy complaint has no resolvable owner");
            report.skipped.push(SkippedRecord {
                position,
                complaint_name: record.complaint_name.clone(),
                room_number: record.room_number.clone(),
                reason: "no student could be matched to this record".to_string(),
            });
            continue;
        };

        let complaint_type = registry.ensure(actor, map_category(&record.complaint_category))?;
        let complaint = store.insert_complaint(NewComplaint {
            student: owner,
            complaint_type: complaint_type.id,
            description: record.migrated_description(),
            status: map_status(&record.status),
            created_at: record.created_at.unwrap_or_else(Utc::now),
        })?;
        report.migrated.push(complaint.id);
    }

    info!(
        migrated = report.migrated.len(),
        skipped = report.skipped.len(),
        "legacy import finished"
    );
    Ok(report)
}

/// Room number to resident, across every hostel. A number is only mapped
/// when exactly one student lives behind it, so no record lands on a guessed
/// owner.
pub fn sole_residents_by_room<S: HostelStore>(
    store: &S,
) -> Result<BTreeMap<String, UserId>, HostelError> {
    let mut candidates: BTreeMap<String, Vec<UserId>> = BTreeMap::new();
    for hostel in store.all_hostels()? {
        for room in store.rooms_in(hostel.id)? {
            candidates
                .entry(room.room_number.trim().to_ascii_lowercase())
                .or_default()
                .extend(store.room_residents(room.id)?.iter().map(|user| user.id));
        }
    }

    Ok(candidates
        .into_iter()
        .filter_map(|(number, ids)| match ids.as_slice() {
            [only] => Some((number, *only)),
            _ => None,
        })
        .collect())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
