use crate::infra::{seed_demo_desk, DemoAccounts};
use clap::Args;
use hostelcare::complaints::legacy::{self, LegacyImportReport};
use hostelcare::complaints::{ComplaintSubmission, StatisticsPeriod};
use hostelcare::config::DeskPolicy;
use hostelcare::error::AppError;
use hostelcare::notifications::MemoryOutbox;
use hostelcare::store::memory::MemoryStore;
use hostelcare::{Desk, HostelError};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip printing the CSV export at the end of the walkthrough.
    #[arg(long)]
    pub(crate) skip_export: bool,
    /// Active complaints a student may hold (defaults to the desk policy).
    #[arg(long)]
    pub(crate) max_active: Option<usize>,
    /// Timeline window for the closing statistics: week, month or year.
    #[arg(long, default_value = "week")]
    pub(crate) period: String,
}

#[derive(Args, Debug)]
pub(crate) struct LegacyImportArgs {
    /// Legacy complaint export (CSV) to migrate
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Print the import report as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

type DemoDesk = Desk<MemoryStore, MemoryOutbox>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        skip_export,
        max_active,
        period,
    } = args;
    let period: StatisticsPeriod = period.parse()?;

    let mut policy = DeskPolicy::default();
    if let Some(limit) = max_active.filter(|limit| *limit > 0) {
        policy.max_active_complaints = limit;
    }
    let limit = policy.max_active_complaints;

    let outbox = Arc::new(MemoryOutbox::default());
    let seeded = seed_demo_desk(outbox.clone(), policy)?;
    let desk = seeded.desk.as_ref();
    let accounts = &seeded.accounts;

    println!("Hostel complaint desk demo");
    println!("Complaint categories:");
    for complaint_type in desk.catalog.list()? {
        println!(
            "  - {} ({}h target): {}",
            complaint_type.name,
            complaint_type.expected_response_hours.unwrap_or_default(),
            complaint_type.description
        );
    }

    let resident = &accounts.residents[0];
    let complaint = desk.complaints.create(
        resident,
        ComplaintSubmission {
            complaint_type: accounts.plumbing,
            description: "Washbasin tap in A-101 will not close".to_string(),
        },
    )?;
    println!(
        "\n{} filed complaint #{} -> {}",
        resident.display_label(),
        complaint.id,
        complaint.status.display_name()
    );

    let candidates = desk.complaints.available_workers(&accounts.warden, complaint.id)?;
    println!("Eligible workers:");
    for worker in &candidates {
        println!("  - {}", worker.display_label());
    }

    let assigned = desk
        .complaints
        .assign(&accounts.warden, complaint.id, accounts.plumber.id)?;
    println!(
        "{} assigned #{} to {} -> {}",
        accounts.warden.full_name,
        assigned.id,
        accounts.plumber.full_name,
        assigned.status.display_name()
    );
    let started = desk.complaints.start(&accounts.plumber, complaint.id)?;
    println!("Work started -> {}", started.status.display_name());
    let resolved = desk.complaints.resolve(&accounts.plumber, complaint.id)?;
    println!("Work finished -> {}", resolved.status.display_name());

    report_refusal(
        "Resolving again",
        desk.complaints.resolve(&accounts.plumber, complaint.id),
    );
    report_refusal(
        "Another hostel's warden reading it",
        desk.complaints.get(&accounts.other_warden, complaint.id),
    );
    report_refusal(
        "Electrician taking a plumbing job",
        file_and_assign(desk, accounts, accounts.electrician.id),
    );

    println!("\nActive complaint limit ({limit} per student)");
    let mut filed = 0;
    loop {
        let attempt = desk.complaints.create(
            resident,
            ComplaintSubmission {
                complaint_type: accounts.plumbing,
                description: format!("Follow-up issue {}", filed + 1),
            },
        );
        match attempt {
            Ok(_) => filed += 1,
            Err(err) => {
                println!("  - accepted {filed} more, then refused: {err}");
                break;
            }
        }
    }

    println!("\nNotifications sent:");
    for notification in outbox.sent() {
        println!(
            "  - {} <- {}",
            notification.recipient_email, notification.subject
        );
    }

    let statistics = desk.complaints.statistics(&accounts.staff, period)?;
    println!(
        "\nDesk totals: {} complaints, {} active",
        statistics.total, statistics.active
    );
    for (status, count) in &statistics.by_status {
        println!("  - {}: {}", status.display_name(), count);
    }
    for entry in &statistics.by_type {
        println!("  - {}: {}", entry.name, entry.count);
    }
    for bucket in &statistics.timeline {
        println!(
            "  {}: {} filed ({} pending, {} assigned, {} resolved)",
            bucket.label, bucket.total, bucket.pending, bucket.assigned, bucket.resolved
        );
    }

    for hostel in &accounts.hostels {
        let occupancy = desk.housing.hostel_statistics(&accounts.admin, hostel.id)?;
        println!(
            "{}: {}/{} residents, {} of {} rooms occupied ({:.1}%)",
            occupancy.hostel_name,
            occupancy.current_occupancy,
            occupancy.total_capacity,
            occupancy.occupied_rooms,
            occupancy.total_rooms,
            occupancy.occupancy_rate
        );
    }

    if !skip_export {
        println!("\nCSV export:");
        print!("{}", desk.complaints.export_csv(&accounts.staff)?);
    }

    Ok(())
}

pub(crate) fn run_legacy_import(args: LegacyImportArgs) -> Result<(), AppError> {
    let LegacyImportArgs { csv, json } = args;

    let records = legacy::parse_export(File::open(&csv)?)?;
    let total = records.len();
    let seeded = seed_demo_desk(Arc::new(MemoryOutbox::default()), DeskPolicy::default())?;
    let report = seeded
        .desk
        .import_legacy(&seeded.accounts.admin, records)?;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => println!("Unable to render report as JSON: {err}"),
        }
        return Ok(());
    }

    render_import_report(&csv, total, &report);
    Ok(())
}

fn render_import_report(path: &std::path::Path, total: usize, report: &LegacyImportReport) {
    println!("Legacy import dry run: {}", path.display());
    println!(
        "- {} of {} records migrated, {} skipped",
        report.migrated.len(),
        total,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!(
            "  - row {} '{}' (room {}): {}",
            skipped.position, skipped.complaint_name, skipped.room_number, skipped.reason
        );
    }
}

fn file_and_assign(
    desk: &DemoDesk,
    accounts: &DemoAccounts,
    worker: hostelcare::UserId,
) -> Result<(), HostelError> {
    let complaint = desk.complaints.create(
        &accounts.residents[1],
        ComplaintSubmission {
            complaint_type: accounts.plumbing,
            description: "Shower drain blocked".to_string(),
        },
    )?;
    desk.complaints
        .assign(&accounts.warden, complaint.id, worker)
        .map(|_| ())
}

fn report_refusal<T>(label: &str, outcome: Result<T, HostelError>) {
    match outcome {
        Ok(_) => println!("{label}: unexpectedly allowed"),
        Err(err) => println!("{label}: refused ({}) {err}", err.kind()),
    }
}
