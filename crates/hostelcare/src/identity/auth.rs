use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::domain::{Email, RollNumber, User};
use crate::ids::UserId;
use crate::store::{RepositoryError, UserRepository};

/// Login failures. Unknown accounts and wrong passwords are deliberately
/// indistinguishable to callers.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("identifier and password are required")]
    MissingCredentials,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The two shapes of login identifier: anything containing `@` is an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Email(Email),
    RollNumber(RollNumber),
}

impl LoginIdentifier {
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        if trimmed.contains('@') {
            Email::parse(trimmed)
                .map(Self::Email)
                .map_err(|_| AuthError::InvalidCredentials)
        } else {
            RollNumber::parse(trimmed)
                .map(Self::RollNumber)
                .map_err(|_| AuthError::InvalidCredentials)
        }
    }

    /// Whether `user` is allowed to log in with this kind of identifier.
    pub fn matches_role_of(&self, user: &User) -> bool {
        match self {
            Self::Email(_) => !user.role().logs_in_with_roll_number(),
            Self::RollNumber(_) => user.role().logs_in_with_roll_number(),
        }
    }
}

/// Credential check consumed by the HTTP layer. Token issuance, refresh and
/// password resets stay with whichever provider implements this.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError>;
}

/// Salted SHA-256 password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    salt: String,
    digest: [u8; 32],
}

impl PasswordDigest {
    pub fn derive(salt: &str, password: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update([0u8]);
        hasher.update(password.as_bytes());
        Self {
            salt: salt.to_string(),
            digest: hasher.finalize().into(),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = Self::derive(&self.salt, password);
        candidate.digest.ct_eq(&self.digest).into()
    }
}

/// Identity provider backed by the account store plus an in-process
/// credential table. Suitable for demos and tests; production deployments
/// plug in the institute's provider instead.
pub struct DirectoryIdentityProvider<S> {
    users: Arc<S>,
    credentials: RwLock<HashMap<UserId, PasswordDigest>>,
}

impl<S: UserRepository> DirectoryIdentityProvider<S> {
    pub fn new(users: Arc<S>) -> Self {
        Self {
            users,
            credentials: RwLock::new(HashMap::new()),
        }
    }

    /// Store (or replace) the password for an existing account.
    pub fn enroll(&self, user: &User, password: &str) {
        let salt = format!("{}:{}", user.id, user.email);
        self.credentials
            .write()
            .insert(user.id, PasswordDigest::derive(&salt, password));
    }

    fn lookup(&self, identifier: &LoginIdentifier) -> Result<Option<User>, AuthError> {
        let user = match identifier {
            LoginIdentifier::Email(email) => self.users.find_user_by_email(email)?,
            LoginIdentifier::RollNumber(roll) => self.users.find_user_by_roll_number(roll)?,
        };
        Ok(user)
    }
}

impl<S: UserRepository> IdentityProvider for DirectoryIdentityProvider<S> {
    fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        if password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let identifier = LoginIdentifier::parse(identifier)?;
        let user = self
            .lookup(&identifier)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !identifier.matches_role_of(&user) {
            tracing::debug!(user = %user.id, role = %user.role(), "login identifier does not match role");
            return Err(AuthError::InvalidCredentials);
        }

        let verified = self
            .credentials
            .read()
            .get(&user.id)
            .is_some_and(|digest| digest.verify(password));

        if verified {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
