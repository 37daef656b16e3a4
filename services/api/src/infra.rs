use hostelcare::catalog::NewComplaintType;
use hostelcare::config::DeskPolicy;
use hostelcare::housing::{Hostel, NewHostel, RoomDraft};
use hostelcare::identity::{
    DirectoryIdentityProvider, Email, NewUser, Registration, RegistrationProfile, RoleProfile, User,
};
use hostelcare::notifications::{Notification, NotificationError, NotificationSender};
use hostelcare::store::memory::MemoryStore;
use hostelcare::store::UserRepository;
use hostelcare::{ComplaintTypeId, Desk, HostelError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Password enrolled for every seeded account.
pub(crate) const DEMO_PASSWORD: &str = "hostel-demo";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes outbound mail to the log instead of a relay.
#[derive(Debug, Clone)]
pub(crate) struct LoggingTransport {
    from_address: String,
}

impl LoggingTransport {
    pub(crate) fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

impl NotificationSender for LoggingTransport {
    fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        if notification.recipient_email.trim().is_empty() {
            return Err(NotificationError::Transport(
                "notification has no recipient".to_string(),
            ));
        }
        info!(
            from = %self.from_address,
            to = %notification.recipient_email,
            subject = %notification.subject,
            bytes = notification.body_html.len(),
            "mail handed to log transport"
        );
        Ok(())
    }
}

/// Accounts created by [`seed_demo_desk`], kept so demos can act as them.
#[derive(Debug, Clone)]
pub(crate) struct DemoAccounts {
    pub(crate) admin: User,
    pub(crate) warden: User,
    pub(crate) other_warden: User,
    pub(crate) staff: User,
    pub(crate) plumber: User,
    pub(crate) electrician: User,
    pub(crate) residents: Vec<User>,
    pub(crate) hostels: Vec<Hostel>,
    pub(crate) plumbing: ComplaintTypeId,
}

pub(crate) struct SeededDesk<N> {
    pub(crate) desk: Arc<Desk<MemoryStore, N>>,
    pub(crate) accounts: DemoAccounts,
}

/// Two hostels, a small catalog, one account per role and three placed
/// residents, all enrolled with [`DEMO_PASSWORD`].
pub(crate) fn seed_demo_desk<N>(
    notifier: Arc<N>,
    policy: DeskPolicy,
) -> Result<SeededDesk<N>, HostelError>
where
    N: NotificationSender + 'static,
{
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(DirectoryIdentityProvider::new(store.clone()));
    let domain = policy.email_domain.clone();
    let address = |local: &str| format!("{local}@{domain}");

    let admin_email = Email::parse_in_domain(&address("desk.admin"), &domain)
        .map_err(HostelError::from)?;
    let admin = store.insert_user(NewUser {
        full_name: "Desk Administrator".to_string(),
        email: admin_email,
        hostel: None,
        profile: RoleProfile::Admin,
    })?;

    let desk = Arc::new(Desk::new(store, notifier, identity.clone(), policy));
    let register = |full_name: &str, local: &str, profile: RegistrationProfile| {
        desk.directory.register(
            &admin,
            Registration {
                full_name: full_name.to_string(),
                email: address(local),
                hostel: None,
                profile,
            },
        )
    };

    let mut catalog = Vec::new();
    for (name, description, hours) in [
        ("Electrical", "Lights, fans, sockets and wiring", 24),
        ("Plumbing", "Taps, pipes, drains and flush tanks", 24),
        ("Carpentry", "Doors, cupboards, beds and furniture", 48),
        ("Water Services", "Drinking water filters and coolers", 12),
        ("Other", "Anything the other categories do not cover", 72),
    ] {
        catalog.push(desk.catalog.add(
            &admin,
            NewComplaintType {
                name: name.to_string(),
                description: description.to_string(),
                expected_response_hours: Some(hours),
            },
        )?);
    }
    let type_id = |name: &str| {
        catalog
            .iter()
            .find(|complaint_type| complaint_type.name == name)
            .map(|complaint_type| complaint_type.id)
            .ok_or_else(|| HostelError::NotFound(format!("complaint type {name}")))
    };
    let plumbing = type_id("Plumbing")?;

    let warden = register("Anitha Varghese", "warden.a", RegistrationProfile::Warden)?;
    let other_warden = register("Joseph Mathew", "warden.b", RegistrationProfile::Warden)?;
    let staff = register("Suresh Kumar", "maintenance", RegistrationProfile::Staff)?;
    let plumber = register(
        "Ravi Menon",
        "ravi.plumber",
        RegistrationProfile::Worker {
            worker_type: "plumber".to_string(),
            complaint_types: BTreeSet::from([plumbing, type_id("Water Services")?]),
            is_available: true,
        },
    )?;
    let electrician = register(
        "Lakshmi Pillai",
        "lakshmi.electrician",
        RegistrationProfile::Worker {
            worker_type: "electrician".to_string(),
            complaint_types: BTreeSet::from([type_id("Electrical")?]),
            is_available: true,
        },
    )?;

    let mut hostels = Vec::new();
    for (name, capacity, keeper) in [("Hostel A", 120, &warden), ("Hostel B", 80, &other_warden)] {
        hostels.push(desk.housing.create_hostel(
            &admin,
            NewHostel {
                name: name.to_string(),
                capacity,
                warden: Some(keeper.id),
            },
        )?);
    }

    let mut residents = Vec::new();
    for (hostel, room_number, capacity, roll, full_name) in [
        (0, "A-101", 2, "2024bcs0001", "Meera Nair"),
        (0, "A-102", 2, "2024bcd0002", "Arjun Das"),
        (1, "B-201", 3, "2023bec0003", "Fathima Rahman"),
    ] {
        let room = desk.housing.add_room(
            &admin,
            hostels[hostel].id,
            RoomDraft {
                room_number: room_number.to_string(),
                capacity,
            },
        )?;
        let student = register(
            full_name,
            roll,
            RegistrationProfile::Student {
                roll_number: roll.to_string(),
                year_of_study: 2,
                department: "Computer Science".to_string(),
            },
        )?;
        residents.push(desk.housing.assign_room(&admin, room.id, student.id)?.student);
    }

    for account in [&admin, &warden, &other_warden, &staff, &plumber, &electrician]
        .into_iter()
        .chain(residents.iter())
    {
        identity.enroll(account, DEMO_PASSWORD);
    }

    info!(
        hostels = hostels.len(),
        residents = residents.len(),
        complaint_types = catalog.len(),
        "demo desk seeded"
    );

    Ok(SeededDesk {
        desk,
        accounts: DemoAccounts {
            admin,
            warden,
            other_warden,
            staff,
            plumber,
            electrician,
            residents,
            hostels,
            plumbing,
        },
    })
}
