//! Desk roles and the static secret table
//!
//! Roles are plain tags. The desk does not enforce a privilege order; each
//! feature asks the capability it needs instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role assigned to an identity at the desk
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Walk-in customer, identified by name and phone only
    Client,
    /// Counter cashier
    Cashier,
    /// Senior cashier
    HeadCashier,
    /// Desk administrator
    Admin,
    /// System creator
    Creator,
    /// Super-admin persona with its own persisted block
    Nikitovsky,
}

impl Role {
    /// Every role, in the order the login screen lists them
    pub const ALL: [Role; 6] = [
        Role::Client,
        Role::Cashier,
        Role::HeadCashier,
        Role::Admin,
        Role::Creator,
        Role::Nikitovsky,
    ];

    /// Wire tag (`head-cashier`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Cashier => "cashier",
            Role::HeadCashier => "head-cashier",
            Role::Admin => "admin",
            Role::Creator => "creator",
            Role::Nikitovsky => "nikitovsky",
        }
    }

    /// Operator-facing title
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Client => "Покупатель",
            Role::Cashier => "Кассир",
            Role::HeadCashier => "Главный кассир",
            Role::Admin => "Администратор",
            Role::Creator => "Создатель",
            Role::Nikitovsky => "Никитовский",
        }
    }

    /// Static secret for this role. Empty for `Client`.
    ///
    /// These are plaintext constants compared as-is. A deployment that needs
    /// real credentials should replace this table with hashed, externally
    /// configured secrets.
    pub fn secret(&self) -> &'static str {
        match self {
            Role::Client => "",
            Role::Cashier => "25",
            Role::HeadCashier => "202520",
            Role::Admin => "2025",
            Role::Creator => "202505",
            Role::Nikitovsky => "20252025",
        }
    }

    /// Whether a login for this role compares a secret
    pub fn requires_secret(&self) -> bool {
        !matches!(self, Role::Client)
    }

    /// May register users
    pub fn can_manage_users(&self) -> bool {
        matches!(
            self,
            Role::HeadCashier | Role::Admin | Role::Creator | Role::Nikitovsky
        )
    }

    /// May browse the archive
    pub fn can_access_archive(&self) -> bool {
        matches!(self, Role::Admin | Role::Creator | Role::Nikitovsky)
    }

    /// May work the cashier counter
    pub fn can_access_cashier(&self) -> bool {
        !matches!(self, Role::Client)
    }

    /// May run administrative actions such as blocking the Nikitovsky login
    pub fn can_administer(&self) -> bool {
        matches!(self, Role::Admin | Role::Creator | Role::Nikitovsky)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role tag is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == tag)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
