//! Login flows: how a submitted form turns into a role
//!
//! The desk has two login screens. One lets the operator pick a role, the
//! other looks the role up from a registered name. Both feed the same gate.

use super::{AuthError, Field, LoginInput};
use crate::error::Result;
use crate::registry::UserRegistry;
use crate::role::Role;

/// Role and display name a flow resolved from its input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub role: Role,
    pub name: String,
}

/// Strategy for resolving the role of a login attempt
pub trait LoginFlow {
    /// Short label for logs
    fn label(&self) -> &'static str;

    fn resolve_role(&self, registry: &UserRegistry, input: &LoginInput) -> Result<Resolved>;
}

/// Role chosen explicitly on the login screen
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectFlow;

impl LoginFlow for DirectFlow {
    fn label(&self) -> &'static str {
        "direct"
    }

    fn resolve_role(&self, _registry: &UserRegistry, input: &LoginInput) -> Result<Resolved> {
        let role = input.role.ok_or(AuthError::MissingField(Field::Role))?;
        if input.name.is_empty() {
            return Err(AuthError::MissingField(Field::Name));
        }
        Ok(Resolved {
            role,
            name: input.name.clone(),
        })
    }
}

/// Role taken from the registered user with the submitted name
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardFlow;

impl LoginFlow for StandardFlow {
    fn label(&self) -> &'static str {
        "standard"
    }

    fn resolve_role(&self, registry: &UserRegistry, input: &LoginInput) -> Result<Resolved> {
        if input.name.is_empty() {
            return Err(AuthError::MissingField(Field::Name));
        }
        let user = registry
            .find_by_name(&input.name)?
            .ok_or_else(|| AuthError::UnknownUser(input.name.clone()))?;
        Ok(Resolved {
            role: user.role,
            name: user.name,
        })
    }
}
