use super::Notification;
use crate::complaints::Complaint;
use crate::identity::User;

/// Facts a template needs beyond the complaint row itself.
#[derive(Debug, Clone, Copy)]
pub struct ComplaintContext<'a> {
    pub complaint: &'a Complaint,
    pub type_name: &'a str,
    pub student: &'a User,
    /// Room number of the filing student, if housed.
    pub room: Option<&'a str>,
}

pub fn assigned_to_worker(context: ComplaintContext<'_>, worker: &User) -> Notification {
    let ComplaintContext {
        complaint,
        type_name,
        student,
        room,
    } = context;

    let body_html = format!(
        "<p>Hello {worker},</p>\
         <p>Complaint #{id} ({kind}) has been assigned to you.</p>\
         <ul><li>Student: {student}</li><li>Room: {room}</li></ul>\
         <p>{description}</p>",
        worker = escape_html(&worker.full_name),
        id = complaint.id,
        kind = escape_html(type_name),
        student = escape_html(&student.display_label()),
        room = escape_html(room.unwrap_or("N/A")),
        description = escape_html(&complaint.description),
    );

    Notification {
        recipient_email: worker.email.to_string(),
        subject: format!("New Complaint Assigned: #{}", complaint.id),
        body_html,
    }
}

pub fn assigned_to_student(context: ComplaintContext<'_>, worker: &User) -> Notification {
    let body_html = format!(
        "<p>Hello {student},</p>\
         <p>Your {kind} complaint #{id} is now assigned to {worker}.</p>",
        student = escape_html(&context.student.full_name),
        kind = escape_html(context.type_name),
        id = context.complaint.id,
        worker = escape_html(&worker.full_name),
    );

    Notification {
        recipient_email: context.student.email.to_string(),
        subject: format!("Complaint #{} Assigned", context.complaint.id),
        body_html,
    }
}

/// Sent when a complaint reaches a terminal status.
pub fn closed_to_student(context: ComplaintContext<'_>) -> Notification {
    let status = context.complaint.status.display_name();
    let body_html = format!(
        "<p>Hello {student},</p>\
         <p>Your {kind} complaint #{id} has been marked <strong>{status}</strong>.</p>",
        student = escape_html(&context.student.full_name),
        kind = escape_html(context.type_name),
        id = context.complaint.id,
    );

    Notification {
        recipient_email: context.student.email.to_string(),
        subject: format!("Complaint #{} {status}", context.complaint.id),
        body_html,
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complaints::ComplaintStatus;
    use crate::identity::{Email, RoleProfile, RollNumber, StudentProfile};
    use crate::ids::{ComplaintId, ComplaintTypeId, UserId};
    use chrono::Utc;

    fn student() -> User {
        User {
            id: UserId(1),
            full_name: "Asha <Admin>".to_string(),
            email: Email::parse("2024bcs0001@iiitkottayam.ac.in").expect("email"),
            hostel: None,
            profile: RoleProfile::Student(StudentProfile {
                roll_number: RollNumber::parse("2024bcs0001").expect("roll"),
                room: None,
                year_of_study: 1,
                department: "CSE".to_string(),
            }),
        }
    }

    fn complaint(status: ComplaintStatus) -> Complaint {
        Complaint {
            id: ComplaintId(7),
            student: UserId(1),
            complaint_type: ComplaintTypeId(2),
            description: "Tap & sink leaking".to_string(),
            status,
            assigned_worker: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn closing_mail_names_the_terminal_status() {
        let student = student();
        let complaint = complaint(ComplaintStatus::Resolved);
        let mail = closed_to_student(ComplaintContext {
            complaint: &complaint,
            type_name: "Plumbing",
            student: &student,
            room: None,
        });

        assert_eq!(mail.recipient_email, "2024bcs0001@iiitkottayam.ac.in");
        assert_eq!(mail.subject, "Complaint #7 Resolved");
        assert!(mail.body_html.contains("Asha &lt;Admin&gt;"));
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }
}
