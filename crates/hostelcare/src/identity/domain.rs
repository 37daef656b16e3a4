use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{ComplaintTypeId, HostelId, RoomId, UserId};

/// Department codes accepted in roll numbers.
pub const DEPARTMENT_CODES: [&str; 4] = ["bcs", "bcd", "bcy", "bec"];

/// Role tag carried by every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Warden,
    Staff,
    Worker,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Warden => "warden",
            Role::Staff => "staff",
            Role::Worker => "worker",
            Role::Admin => "admin",
        }
    }

    /// Roles allowed to triage: assign workers, close complaints, export.
    pub const fn manages_complaints(self) -> bool {
        matches!(self, Role::Warden | Role::Staff | Role::Admin)
    }

    /// Students log in with a roll number, everyone else with email.
    pub const fn logs_in_with_roll_number(self) -> bool {
        matches!(self, Role::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejections raised while parsing account attributes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("roll number '{0}' must look like YYYY + department code + 4 digits (e.g. 2024bcs0042)")]
    MalformedRollNumber(String),
    #[error("roll number '{value}' uses unknown department code '{code}'")]
    UnknownDepartment { value: String, code: String },
    #[error("'{0}' is not a valid email address")]
    MalformedEmail(String),
    #[error("email '{email}' must belong to the {expected} domain")]
    ForeignEmailDomain { email: String, expected: String },
    #[error("year of study must be between 1 and 6, got {0}")]
    YearOfStudy(u8),
    #[error("{0} must not be blank")]
    Blank(&'static str),
}

/// Validated student roll number, stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RollNumber(String);

impl RollNumber {
    pub fn parse(raw: &str) -> Result<Self, ProfileError> {
        let value = raw.trim().to_ascii_lowercase();
        let malformed = || ProfileError::MalformedRollNumber(raw.trim().to_string());

        if value.len() != 11 || !value.is_ascii() {
            return Err(malformed());
        }

        let year = value.get(..4).ok_or_else(malformed)?;
        let code = value.get(4..7).ok_or_else(malformed)?;
        let sequence = value.get(7..).ok_or_else(malformed)?;

        let year_ok = year.starts_with("20") && year.bytes().all(|b| b.is_ascii_digit());
        let sequence_ok = sequence.bytes().all(|b| b.is_ascii_digit());
        if !year_ok || !sequence_ok || !code.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(malformed());
        }

        if !DEPARTMENT_CODES.contains(&code) {
            return Err(ProfileError::UnknownDepartment {
                value: value.clone(),
                code: code.to_string(),
            });
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn enrollment_year(&self) -> u16 {
        self.0
            .get(..4)
            .and_then(|year| year.parse().ok())
            .unwrap_or_default()
    }

    pub fn department_code(&self) -> &str {
        self.0.get(4..7).unwrap_or_default()
    }
}

impl TryFrom<String> for RollNumber {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RollNumber> for String {
    fn from(value: RollNumber) -> Self {
        value.0
    }
}

impl fmt::Display for RollNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-cased email address. Domain restriction is applied by
/// [`Email::parse_in_domain`]; deserialization only checks the shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, ProfileError> {
        let value = raw.trim().to_ascii_lowercase();
        let mut parts = value.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ProfileError::MalformedEmail(raw.trim().to_string()));
        };

        let domain_ok = domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.');
        if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
            return Err(ProfileError::MalformedEmail(raw.trim().to_string()));
        }

        Ok(Self(value))
    }

    pub fn parse_in_domain(raw: &str, domain: &str) -> Result<Self, ProfileError> {
        let email = Self::parse(raw)?;
        if !email.domain().eq_ignore_ascii_case(domain) {
            return Err(ProfileError::ForeignEmailDomain {
                email: email.0,
                expected: domain.to_ascii_lowercase(),
            });
        }
        Ok(email)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        self.0
            .split_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }
}

impl TryFrom<String> for Email {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub roll_number: RollNumber,
    pub room: Option<RoomId>,
    pub year_of_study: u8,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub worker_type: String,
    pub complaint_types: BTreeSet<ComplaintTypeId>,
    pub is_available: bool,
}

impl WorkerProfile {
    pub fn qualified_for(&self, complaint_type: ComplaintTypeId) -> bool {
        self.complaint_types.contains(&complaint_type)
    }
}

/// Role tag plus the profile that only exists for that role. Students are the
/// only variant with a roll number, workers the only one with skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleProfile {
    Student(StudentProfile),
    Warden,
    Staff,
    Worker(WorkerProfile),
    Admin,
}

impl RoleProfile {
    pub const fn role(&self) -> Role {
        match self {
            RoleProfile::Student(_) => Role::Student,
            RoleProfile::Warden => Role::Warden,
            RoleProfile::Staff => Role::Staff,
            RoleProfile::Worker(_) => Role::Worker,
            RoleProfile::Admin => Role::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: Email,
    pub hostel: Option<HostelId>,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl User {
    pub const fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn roll_number(&self) -> Option<&RollNumber> {
        self.student_profile().map(|profile| &profile.roll_number)
    }

    pub fn student_profile(&self) -> Option<&StudentProfile> {
        match &self.profile {
            RoleProfile::Student(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn student_profile_mut(&mut self) -> Option<&mut StudentProfile> {
        match &mut self.profile {
            RoleProfile::Student(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn worker_profile(&self) -> Option<&WorkerProfile> {
        match &self.profile {
            RoleProfile::Worker(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn worker_profile_mut(&mut self) -> Option<&mut WorkerProfile> {
        match &mut self.profile {
            RoleProfile::Worker(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn room(&self) -> Option<RoomId> {
        self.student_profile().and_then(|profile| profile.room)
    }

    /// Label used in exports and mail bodies: roll number for students.
    pub fn display_label(&self) -> String {
        match self.roll_number() {
            Some(roll) => format!("{} ({})", self.full_name, roll),
            None => self.full_name.clone(),
        }
    }
}

/// Account draft handed to the store; the store allocates the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub email: Email,
    pub hostel: Option<HostelId>,
    pub profile: RoleProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_number_accepts_institute_format() {
        let roll = RollNumber::parse(" 2024BCS0042 ").expect("valid roll number");
        assert_eq!(roll.as_str(), "2024bcs0042");
        assert_eq!(roll.enrollment_year(), 2024);
        assert_eq!(roll.department_code(), "bcs");
    }

    #[test]
    fn roll_number_rejects_bad_shapes() {
        for raw in ["", "2024bcs004", "2024bcs00421", "20x4bcs0042", "1999bcs0042", "2024bcs00a2"] {
            assert!(
                matches!(
                    RollNumber::parse(raw),
                    Err(ProfileError::MalformedRollNumber(_))
                ),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn roll_number_rejects_unknown_department() {
        match RollNumber::parse("2023mec0001") {
            Err(ProfileError::UnknownDepartment { code, .. }) => assert_eq!(code, "mec"),
            other => panic!("expected unknown department, got {other:?}"),
        }
    }

    #[test]
    fn email_is_domain_restricted() {
        let email = Email::parse_in_domain("Warden.A@IIITKottayam.ac.in", "iiitkottayam.ac.in")
            .expect("institute address");
        assert_eq!(email.as_str(), "warden.a@iiitkottayam.ac.in");

        assert!(matches!(
            Email::parse_in_domain("someone@gmail.com", "iiitkottayam.ac.in"),
            Err(ProfileError::ForeignEmailDomain { .. })
        ));
        for raw in ["no-at-sign", "@iiitkottayam.ac.in", "a@b@c.in", "a@nodot", "a b@x.in"] {
            assert!(Email::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn role_profile_serializes_with_role_tag() {
        let user = User {
            id: UserId(3),
            full_name: "Ravi".to_string(),
            email: Email::parse("ravi@iiitkottayam.ac.in").expect("email"),
            hostel: None,
            profile: RoleProfile::Worker(WorkerProfile {
                worker_type: "plumber".to_string(),
                complaint_types: BTreeSet::from([ComplaintTypeId(1)]),
                is_available: true,
            }),
        };

        let json = serde_json::to_value(&user).expect("serializes");
        assert_eq!(json["role"], "worker");
        assert_eq!(json["worker_type"], "plumber");
        assert!(json.get("roll_number").is_none());

        let back: User = serde_json::from_value(json).expect("round trips");
        assert_eq!(back.role(), Role::Worker);
        assert!(back.roll_number().is_none());
    }
}
