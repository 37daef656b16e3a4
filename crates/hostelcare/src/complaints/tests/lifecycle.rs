use std::sync::{Arc, Barrier};
use std::thread;

use super::common::*;
use crate::catalog::{ComplaintTypeRegistry, NewComplaintType};
use crate::complaints::{
    ComplaintQuery, ComplaintStatus, ComplaintSubmission, Ineligibility, StatisticsPeriod,
};
use crate::error::HostelError;
use crate::identity::Role;
use crate::store::{ComplaintRepository, ComplaintTypeRepository, UserRepository};

#[test]
fn plumbing_complaint_runs_to_resolution_once() {
    let campus = campus();
    let (service, outbox) = service(&campus);
    let complaint = file(&service, &campus.north_student, &campus.plumbing, "Tap leaking");
    assert_eq!(complaint.status, ComplaintStatus::Pending);

    let assigned = service
        .assign(&campus.north_warden, complaint.id, campus.plumber.id)
        .expect("warden assigns plumber");
    assert_eq!(assigned.status, ComplaintStatus::Assigned);
    assert_eq!(assigned.assigned_worker, Some(campus.plumber.id));
    assert!(assigned.updated_at >= complaint.updated_at);

    let resolved = service
        .resolve(&campus.plumber, complaint.id)
        .expect("plumber resolves");
    assert_eq!(resolved.status, ComplaintStatus::Resolved);

    match service.resolve(&campus.plumber, complaint.id) {
        Err(HostelError::InvalidTransition { from, .. }) => {
            assert_eq!(from, ComplaintStatus::Resolved)
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }

    assert_eq!(outbox.sent_to(campus.plumber.email.as_str()).len(), 1);
    let student_mail = outbox.sent_to(campus.north_student.email.as_str());
    assert_eq!(student_mail.len(), 2);
    assert!(student_mail[1].subject.ends_with("Resolved"));
}

#[test]
fn sixth_active_complaint_is_refused() {
    let campus = campus();
    let (service, _) = service(&campus);
    for n in 0..5 {
        file(&service, &campus.north_student, &campus.plumbing, &format!("Issue {n}"));
    }

    let sixth = service.create(
        &campus.north_student,
        ComplaintSubmission {
            complaint_type: campus.plumbing.id,
            description: "One more".to_string(),
        },
    );
    match sixth {
        Err(HostelError::Validation(detail)) => assert!(detail.contains("limit is 5")),
        other => panic!("expected quota error, got {other:?}"),
    }
}

#[test]
fn closed_complaints_free_quota() {
    let campus = campus();
    let (service, _) = service(&campus);
    let first = file(&service, &campus.north_student, &campus.plumbing, "Issue 0");
    for n in 1..5 {
        file(&service, &campus.north_student, &campus.plumbing, &format!("Issue {n}"));
    }

    service.reject(&campus.staff, first.id).expect("staff rejects");
    file(&service, &campus.north_student, &campus.plumbing, "Issue 5");
}

#[test]
fn quota_holds_under_concurrent_filing() {
    let campus = campus();
    let (service, _) = service(&campus);
    let service = Arc::new(service);

    let outcomes: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = (0..12)
            .map(|n| {
                let service = Arc::clone(&service);
                let student = &campus.north_student;
                let kind = campus.plumbing.id;
                scope.spawn(move || {
                    service
                        .create(
                            student,
                            ComplaintSubmission {
                                complaint_type: kind,
                                description: format!("Concurrent {n}"),
                            },
                        )
                        .is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 5);
}

#[test]
fn removing_a_type_never_orphans_a_new_complaint() {
    let campus = campus();
    let (service, _) = service(&campus);
    let registry = ComplaintTypeRegistry::new(campus.store.clone());

    for round in 0..300 {
        let kind = registry
            .add(
                &campus.admin,
                NewComplaintType {
                    name: format!("Seasonal {round}"),
                    description: String::new(),
                    expected_response_hours: None,
                },
            )
            .expect("type added");
        let barrier = Barrier::new(2);

        let (filed, removed) = thread::scope(|scope| {
            let filing = scope.spawn(|| {
                barrier.wait();
                service.create(
                    &campus.north_student,
                    ComplaintSubmission {
                        complaint_type: kind.id,
                        description: format!("Round {round}"),
                    },
                )
            });
            let removal = scope.spawn(|| {
                barrier.wait();
                registry.remove(&campus.admin, kind.id)
            });
            (
                filing.join().expect("filing thread"),
                removal.join().expect("removal thread"),
            )
        });

        match (&filed, &removed) {
            (Ok(_), Err(HostelError::Validation(_))) | (Err(HostelError::Validation(_)), Ok(_)) => {}
            other => panic!("round {round}: exactly one side must win, got {other:?}"),
        }
        if let Ok(complaint) = filed {
            service
                .reject(&campus.staff, complaint.id)
                .expect("free the quota");
        }
    }

    let orphans: Vec<_> = campus
        .store
        .query_complaints(ComplaintQuery::All)
        .expect("all complaints")
        .into_iter()
        .filter(|complaint| {
            campus
                .store
                .fetch_complaint_type(complaint.complaint_type)
                .expect("type lookup")
                .is_none()
        })
        .collect();
    assert!(orphans.is_empty(), "orphaned complaints: {orphans:?}");
}

#[test]
fn filing_validates_input_and_role() {
    let campus = campus();
    let (service, _) = service(&campus);

    let blank = service.create(
        &campus.north_student,
        ComplaintSubmission {
            complaint_type: campus.plumbing.id,
            description: "   ".to_string(),
        },
    );
    assert!(matches!(blank, Err(HostelError::Validation(_))));

    let unknown_type = service.create(
        &campus.north_student,
        ComplaintSubmission {
            complaint_type: crate::ComplaintTypeId(4040),
            description: "Door jammed".to_string(),
        },
    );
    assert!(matches!(unknown_type, Err(HostelError::Validation(_))));

    let by_warden = service.create(
        &campus.north_warden,
        ComplaintSubmission {
            complaint_type: campus.plumbing.id,
            description: "Door jammed".to_string(),
        },
    );
    assert!(matches!(by_warden, Err(HostelError::Authorization(_))));
}

#[test]
fn assignment_requires_an_eligible_worker() {
    let campus = campus();
    let (service, outbox) = service(&campus);
    let complaint = file(&service, &campus.north_student, &campus.plumbing, "Shower blocked");

    match service.assign(&campus.staff, complaint.id, campus.electrician.id) {
        Err(HostelError::IneligibleWorker { reason, .. }) => assert_eq!(
            reason,
            Ineligibility::Unqualified {
                complaint_type: campus.plumbing.id
            }
        ),
        other => panic!("expected unqualified worker, got {other:?}"),
    }

    match service.assign(&campus.staff, complaint.id, campus.north_warden.id) {
        Err(HostelError::IneligibleWorker { reason, .. }) => assert_eq!(
            reason,
            Ineligibility::NotAWorker { role: Role::Warden }
        ),
        other => panic!("expected non-worker rejection, got {other:?}"),
    }

    let mut busy = reload(&campus, &campus.plumber);
    if let Some(profile) = busy.worker_profile_mut() {
        profile.is_available = false;
    }
    campus.store.update_user(busy).expect("update");
    assert!(matches!(
        service.assign(&campus.staff, complaint.id, campus.plumber.id),
        Err(HostelError::IneligibleWorker {
            reason: Ineligibility::Unavailable,
            ..
        })
    ));

    let untouched = service.get(&campus.staff, complaint.id).expect("still readable");
    assert_eq!(untouched.status, ComplaintStatus::Pending);
    assert_eq!(untouched.assigned_worker, None);
    assert!(outbox.sent().is_empty());
}

#[test]
fn reassignment_is_allowed_until_work_starts() {
    let campus = campus();
    let (service, _) = service(&campus);
    let complaint = file(&service, &campus.north_student, &campus.plumbing, "Geyser leak");
    let backup = crate::store::test_support::worker(
        &campus.store,
        "plumber.two",
        &[campus.plumbing.id],
        true,
    );

    service
        .assign(&campus.staff, complaint.id, campus.plumber.id)
        .expect("first assignment");
    let moved = service
        .assign(&campus.staff, complaint.id, backup.id)
        .expect("reassigned");
    assert_eq!(moved.assigned_worker, Some(backup.id));

    service.start(&backup, complaint.id).expect("worker starts");
    assert!(matches!(
        service.assign(&campus.staff, complaint.id, campus.plumber.id),
        Err(HostelError::InvalidTransition { .. })
    ));
}

#[test]
fn out_of_order_transitions_are_refused() {
    let campus = campus();
    let (service, _) = service(&campus);
    let complaint = file(&service, &campus.north_student, &campus.plumbing, "Basin cracked");

    assert!(matches!(
        service.start(&campus.staff, complaint.id),
        Err(HostelError::InvalidTransition { .. })
    ));
    assert!(matches!(
        service.resolve(&campus.staff, complaint.id),
        Err(HostelError::InvalidTransition { .. })
    ));

    let rejected = service
        .reject(&campus.admin, complaint.id)
        .expect("pending complaints can be rejected");
    assert_eq!(rejected.status, ComplaintStatus::Rejected);
    assert!(matches!(
        service.assign(&campus.staff, complaint.id, campus.plumber.id),
        Err(HostelError::InvalidTransition { .. })
    ));
}

#[test]
fn only_the_assigned_worker_may_close_as_worker() {
    let campus = campus();
    let (service, _) = service(&campus);
    let complaint = file(&service, &campus.north_student, &campus.electrical, "Switch sparks");
    service
        .assign(&campus.staff, complaint.id, campus.electrician.id)
        .expect("assigned");

    assert!(matches!(
        service.resolve(&campus.plumber, complaint.id),
        Err(HostelError::Authorization(_))
    ));
    assert!(matches!(
        service.resolve(&campus.north_student, complaint.id),
        Err(HostelError::Authorization(_))
    ));
    assert!(matches!(
        service.assign(&campus.electrician, complaint.id, campus.electrician.id),
        Err(HostelError::Authorization(_))
    ));

    service
        .start(&campus.electrician, complaint.id)
        .expect("assignee starts");
    let closed = service
        .reject(&campus.electrician, complaint.id)
        .expect("assignee may reject");
    assert_eq!(closed.status, ComplaintStatus::Rejected);
}

#[test]
fn concurrent_resolves_have_exactly_one_winner() {
    let campus = campus();
    let (service, outbox) = service(&campus);
    let complaint = file(&service, &campus.north_student, &campus.plumbing, "Pipe burst");
    service
        .assign(&campus.staff, complaint.id, campus.plumber.id)
        .expect("assigned");

    let actors = [&campus.staff, &campus.admin, &campus.plumber, &campus.north_warden];
    let outcomes: Vec<Result<_, HostelError>> = thread::scope(|scope| {
        let handles: Vec<_> = actors
            .iter()
            .map(|actor| {
                let service = &service;
                let id = complaint.id;
                scope.spawn(move || service.resolve(actor, id))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.iter().filter_map(|outcome| outcome.as_ref().err()).all(
        |err| matches!(err, HostelError::InvalidTransition { from: ComplaintStatus::Resolved, .. })
    ));
    let closing_mails = outbox
        .sent_to(campus.north_student.email.as_str())
        .into_iter()
        .filter(|mail| mail.subject.ends_with("Resolved"))
        .count();
    assert_eq!(closing_mails, 1);
}

#[test]
fn failing_mailer_does_not_fail_transitions() {
    let campus = campus();
    let service = service_with(&campus, Arc::new(OfflineMailer));
    let complaint = file(&service, &campus.north_student, &campus.plumbing, "Cistern running");

    let assigned = service
        .assign(&campus.north_warden, complaint.id, campus.plumber.id)
        .expect("assignment survives mail failure");
    assert_eq!(assigned.status, ComplaintStatus::Assigned);
    let resolved = service
        .resolve(&campus.plumber, complaint.id)
        .expect("resolution survives mail failure");
    assert_eq!(resolved.status, ComplaintStatus::Resolved);
}

#[test]
fn available_workers_lists_every_eligible_candidate() {
    let campus = campus();
    let (service, _) = service(&campus);
    let complaint = file(&service, &campus.north_student, &campus.plumbing, "Drain clogged");
    let second = crate::store::test_support::worker(
        &campus.store,
        "plumber.two",
        &[campus.plumbing.id, campus.electrical.id],
        true,
    );
    crate::store::test_support::worker(&campus.store, "plumber.off", &[campus.plumbing.id], false);

    let ids: Vec<_> = service
        .available_workers(&campus.north_warden, complaint.id)
        .expect("listed")
        .into_iter()
        .map(|user| user.id)
        .collect();
    assert_eq!(ids, vec![campus.plumber.id, second.id]);

    assert!(matches!(
        service.available_workers(&campus.north_student, complaint.id),
        Err(HostelError::Authorization(_))
    ));
}

#[test]
fn export_renders_scoped_rows() {
    let campus = campus();
    let (service, _) = service(&campus);
    let complaint = file(&service, &campus.north_student, &campus.plumbing, "Tap, sink and drain");
    service
        .assign(&campus.staff, complaint.id, campus.plumber.id)
        .expect("assigned");
    file(&service, &campus.south_student, &campus.electrical, "Fan noisy");

    let csv = service.export_csv(&campus.north_warden).expect("export");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2, "header plus the north complaint only: {csv}");
    assert!(lines[1].contains("\"Tap, sink and drain\""));
    assert!(lines[1].contains("Assigned"));
    assert!(lines[1].contains(&campus.plumber.full_name));
    assert!(lines[1].ends_with("N/A"));

    assert!(matches!(
        service.export_csv(&campus.plumber),
        Err(HostelError::Authorization(_))
    ));
}

#[test]
fn statistics_cover_only_the_scoped_set() {
    let campus = campus();
    let (service, _) = service(&campus);
    let first = file(&service, &campus.north_student, &campus.plumbing, "Tap");
    file(&service, &campus.north_student, &campus.electrical, "Socket");
    file(&service, &campus.south_student, &campus.electrical, "Bulb");
    service.reject(&campus.staff, first.id).expect("rejected");

    let north = service
        .statistics(&campus.north_warden, StatisticsPeriod::Week)
        .expect("north stats");
    assert_eq!(north.total, 2);
    assert_eq!(north.active, 1);
    assert_eq!(north.by_status[&ComplaintStatus::Rejected], 1);
    assert_eq!(north.timeline.len(), 1);
    assert_eq!(north.timeline[0].total, 2);
    assert_eq!(north.timeline[0].pending, 1);

    let everything = service
        .statistics(&campus.admin, StatisticsPeriod::Year)
        .expect("admin stats");
    assert_eq!(everything.timeline.iter().map(|bucket| bucket.total).sum::<usize>(), 3);
    assert_eq!(everything.total, 3);
    assert_eq!(everything.by_type[0].name, "Electrical");
    assert_eq!(everything.by_type[0].count, 2);
}
