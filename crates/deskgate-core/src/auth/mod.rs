//! Authentication for the deposit desk
//!
//! Every login goes through [`CredentialGate`]. The gate consults two
//! independent trackers before comparing anything:
//!
//! - the per-session [`LoginAttemptState`]: three consecutive wrong secrets
//!   suspend the session for 90 seconds
//! - the persisted [`NikitovskyBlock`]: an operator-triggered two hour block
//!   on the `nikitovsky` role, lifted early by a recovery secret
//!
//! Both expire lazily: the deadline is compared against the clock whenever
//! the state is read, no timer is involved.

mod flow;
mod gate;
mod lockout;
mod nikitovsky;

pub use flow::{DirectFlow, LoginFlow, Resolved, StandardFlow};
pub use gate::CredentialGate;
pub use lockout::{FailureOutcome, LockoutPolicy, LoginAttemptState};
pub use nikitovsky::{NikitovskyBlock, BLOCK_DURATION_HOURS, RECOVERY_SECRET};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::role::Role;

/// Input field a flow requires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Role,
    Name,
    Secret,
    Phone,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Role => "role",
            Field::Name => "name",
            Field::Secret => "secret",
            Field::Phone => "phone",
        };
        f.write_str(name)
    }
}

/// What a login screen submits
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginInput {
    /// Explicit role (direct flow only)
    pub role: Option<Role>,
    /// Name typed by the operator
    pub name: String,
    /// Secret, or phone number when the resolved role is `client`
    pub secret_or_phone: String,
}

impl LoginInput {
    /// Input for the role-selection screen
    pub fn direct(role: Role, name: impl Into<String>, secret_or_phone: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            name: name.into(),
            secret_or_phone: secret_or_phone.into(),
        }
    }

    /// Input for the name-lookup screen
    pub fn standard(name: impl Into<String>, secret_or_phone: impl Into<String>) -> Self {
        Self {
            role: None,
            name: name.into(),
            secret_or_phone: secret_or_phone.into(),
        }
    }
}

/// Identity handed to the surrounding application on admission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub role: Role,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Reasons a gate or registry operation is refused
///
/// None of these are fatal; the desk shows them as a notice and stays usable.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Required field missing: {0}")]
    MissingField(Field),

    #[error("No registered user named {0:?}")]
    UnknownUser(String),

    #[error("Wrong secret{}", remaining_suffix(.attempts_remaining))]
    WrongSecret {
        /// Attempts left before the session is suspended, `None` when the
        /// role is not attempt-counted
        attempts_remaining: Option<u32>,
    },

    #[error("Login suspended for {seconds_left} seconds")]
    Suspended { seconds_left: u64 },

    #[error("Nikitovsky login blocked for {hours_left} hours")]
    Blocked { hours_left: u64 },

    #[error("A user named {0:?} already exists")]
    DuplicateName(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

fn remaining_suffix(attempts_remaining: &Option<u32>) -> String {
    match attempts_remaining {
        Some(n) => format!(" ({} attempts remaining)", n),
        None => String::new(),
    }
}

impl AuthError {
    /// True for rejections caused by an active cooldown
    pub fn is_cooldown(&self) -> bool {
        matches!(self, AuthError::Suspended { .. } | AuthError::Blocked { .. })
    }
}
