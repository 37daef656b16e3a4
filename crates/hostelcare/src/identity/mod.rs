//! Accounts, role profiles and login.

mod auth;
mod directory;
pub mod domain;
pub(crate) mod router;


pub use auth::{AuthError, DirectoryIdentityProvider, IdentityProvider, LoginIdentifier, PasswordDigest};
pub use directory::{Directory, Registration, RegistrationProfile};
pub use domain::{
    Email, NewUser, ProfileError, Role, RoleProfile, RollNumber, StudentProfile, User,
    WorkerProfile,
};
