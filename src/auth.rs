//! Credential lookup, verification, and role checks. A login has exactly
//! two terminal outcomes and one generic rejection message, so callers
//! cannot probe which usernames exist; the real cause only reaches the
//! diagnostic log.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::crypto::passwords;

/// The one message surfaced for every failed login, regardless of cause.
pub const LOGIN_REJECTED: &str = "invalid username or password";

/// System roles, parsed from the label stored next to each credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    /// Admins may act in place of any required role.
    pub fn is_admin_override(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role label")]
pub struct UnknownRole;

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            _ => Err(UnknownRole),
        }
    }
}

/// The result of a successful authentication. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: u64,
    pub role: Role,
    pub employee_id: Option<u64>,
}

impl Principal {
    /// True when the principal may perform an action gated on `required`:
    /// a matching role passes, and the admin override passes everything.
    pub fn authorize(&self, required: Role) -> bool {
        self.role == required || self.role.is_admin_override()
    }
}

/// A stored credential row as the persistence collaborator returns it.
/// The role stays a raw label here; it is parsed during login so a
/// corrupted row rejects instead of panicking.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub user_id: u64,
    pub password_hash: String,
    pub role: String,
    pub employee_id: Option<u64>,
}

/// Collaborator failure while talking to the credential store.
#[derive(Debug, Error)]
#[error("credential store unavailable: {0}")]
pub struct StoreError(pub String);

/// Persistence seam for credentials. The core issues a single lookup per
/// login; transactions, retries, and connections belong to the caller.
pub trait CredentialStore {
    fn fetch_credential(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError>;

    fn insert_credential(
        &mut self,
        username: &str,
        password_hash: &str,
        role: Role,
        employee_id: Option<u64>,
    ) -> Result<u64, StoreError>;
}

/// Terminal login outcomes. Every failure collapses into [`Rejected`];
/// surface [`LOGIN_REJECTED`] to the user in that case.
///
/// [`Rejected`]: LoginOutcome::Rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Principal),
    Rejected,
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates credential lookup, hash verification, and registration
/// over a [`CredentialStore`] collaborator.
pub struct Authenticator<S> {
    store: S,
}

impl<S: CredentialStore> Authenticator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new user: hashes the password and hands the record to
    /// the persistence collaborator. Returns the assigned user id.
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        role: Role,
        employee_id: Option<u64>,
    ) -> Result<u64, RegisterError> {
        let password_hash =
            passwords::hash_password(password).map_err(|e| RegisterError::Hashing(format!("{e}")))?;
        Ok(self
            .store
            .insert_credential(username, &password_hash, role, employee_id)?)
    }

    /// Attempts a login: one stored-credential lookup, then hash
    /// verification. Unknown user, wrong password, corrupted role label,
    /// and store faults all map to the same [`LoginOutcome::Rejected`].
    pub fn login(&self, username: &str, password: &str) -> LoginOutcome {
        let record = match self.store.fetch_credential(username) {
            Ok(Some(record)) => record,
            Ok(None) => return LoginOutcome::Rejected,
            Err(error) => {
                warn!(error = %error, "credential lookup failed");
                return LoginOutcome::Rejected;
            }
        };

        if !passwords::verify_password(password, &record.password_hash) {
            return LoginOutcome::Rejected;
        }

        let role = match record.role.parse::<Role>() {
            Ok(role) => role,
            Err(_) => {
                warn!(user_id = record.user_id, "stored role label is unknown");
                return LoginOutcome::Rejected;
            }
        };

        LoginOutcome::Authenticated(Principal {
            user_id: record.user_id,
            role,
            employee_id: record.employee_id,
        })
    }
}
