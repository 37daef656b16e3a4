use serde::Serialize;

use super::domain::Complaint;
use crate::error::HostelError;

/// Column titles, in the field order of [`ExportRow`].
pub const EXPORT_HEADER: [&str; 8] = [
    "ID",
    "Student",
    "Type",
    "Description",
    "Status",
    "Assigned Worker",
    "Created At",
    "Room",
];

/// One spreadsheet row with every reference already resolved to a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub id: String,
    pub student: String,
    pub complaint_type: String,
    pub description: String,
    pub status: String,
    pub assigned_worker: String,
    pub created_at: String,
    pub room: String,
}

impl ExportRow {
    pub fn new(
        complaint: &Complaint,
        student: String,
        complaint_type: String,
        worker: Option<String>,
        room: Option<String>,
    ) -> Self {
        Self {
            id: complaint.id.to_string(),
            student,
            complaint_type,
            description: complaint.description.clone(),
            status: complaint.status.display_name().to_string(),
            assigned_worker: worker.unwrap_or_else(|| "Not Assigned".to_string()),
            created_at: complaint.created_at.format("%Y-%m-%d %H:%M").to_string(),
            room: room.unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

/// Render rows as CSV with a header line, even when there are no rows.
///
/// The header is written explicitly because serde-derived headers are only
/// emitted alongside the first row.
pub fn render_csv(rows: &[ExportRow]) -> Result<String, HostelError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| HostelError::Export(err.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
