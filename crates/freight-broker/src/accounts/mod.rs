//! Broker staff accounts: registration, credential checks and profile
//! maintenance. Passwords are kept as Argon2 PHC strings and never leave the
//! store.

mod credentials;
mod domain;
mod router;
mod service;

pub use credentials::{hash_password, verify_password, CredentialError};
pub use domain::{NewUser, User, UserPatch, UserRole};
pub use router::account_router;
pub use service::{AccountError, AccountService, LoginRequest};
