//! Driver-level types and error definitions.

use std::fmt;
use thiserror::Error;

/// Errors reported by a database driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The endpoint could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// Credentials or session token were refused.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The database refused the statement or request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The request failed in transit (timeouts, broken connections, bad bodies).
    #[error("transport error: {0}")]
    Transport(String),

    /// The database answered with something the driver could not interpret.
    #[error("invalid response from database: {0}")]
    InvalidResponse(String),

    /// The background task running the call went away without reporting.
    #[error("driver task aborted before reporting an outcome")]
    Aborted,
}

impl DriverError {
    /// True for the "resource does not exist" class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }
}

/// Result type for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

/// Sign-in credentials handed to [`Driver::signin`](super::Driver::signin).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"***")
            .finish()
    }
}

/// The namespace/database pair a session operates in.
///
/// Empty strings mean "unset"; both fields are set or unset together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    pub namespace: String,
    pub database: String,
}

impl Selection {
    pub fn new(namespace: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            database: database.into(),
        }
    }

    /// Whether a namespace and database have been chosen.
    pub fn is_set(&self) -> bool {
        !self.namespace.is_empty() && !self.database.is_empty()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "{}/{}", self.namespace, self.database)
        } else {
            f.write_str("<unset>")
        }
    }
}
