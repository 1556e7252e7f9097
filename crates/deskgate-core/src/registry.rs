//! Registered user registry
//!
//! Users are kept as one JSON array in the store. Names are unique under
//! case-insensitive comparison. An absent record is seeded with the
//! Nikitovsky user on first read.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AuthError, Field};
use crate::clock::Clock;
use crate::error::{Result, StoreError};
use crate::role::Role;
use crate::store::{KeyValueStore, USERS_KEY};

/// Id of the seeded Nikitovsky user
pub const NIKITOVSKY_USER_ID: &str = "nikitovsky-master";

/// Name of the seeded Nikitovsky user
pub const NIKITOVSKY_USER_NAME: &str = "Никитовский";

/// Author recorded on records the desk creates by itself
pub const SYSTEM_AUTHOR: &str = "system";

/// A persisted desk user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl RegisteredUser {
    /// Case-insensitive name match
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    fn nikitovsky_seed(created_at: DateTime<Utc>) -> Self {
        Self {
            id: NIKITOVSKY_USER_ID.to_string(),
            name: NIKITOVSKY_USER_NAME.to_string(),
            role: Role::Nikitovsky,
            phone: None,
            email: None,
            created_at,
            created_by: SYSTEM_AUTHOR.to_string(),
        }
    }
}

/// Registration request
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Registry of desk users over a key-value store
#[derive(Clone)]
pub struct UserRegistry {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
}

impl UserRegistry {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// All registered users, seeding the Nikitovsky user if the list is absent
    pub fn users(&self) -> Result<Vec<RegisteredUser>> {
        match self.store.get(USERS_KEY)? {
            Some(content) => {
                let users: Vec<RegisteredUser> =
                    serde_json::from_str(&content).map_err(StoreError::from)?;
                Ok(users)
            }
            None => {
                let seeded = vec![RegisteredUser::nikitovsky_seed(self.clock.now())];
                self.save(&seeded)?;
                debug!("Seeded user registry with {}", NIKITOVSKY_USER_NAME);
                Ok(seeded)
            }
        }
    }

    /// Look up a user by case-insensitive exact name
    pub fn find_by_name(&self, name: &str) -> Result<Option<RegisteredUser>> {
        Ok(self.users()?.into_iter().find(|u| u.has_name(name)))
    }

    /// All users holding `role`
    pub fn users_by_role(&self, role: Role) -> Result<Vec<RegisteredUser>> {
        Ok(self
            .users()?
            .into_iter()
            .filter(|u| u.role == role)
            .collect())
    }

    /// Register a new user on behalf of `created_by`
    pub fn register(&self, new_user: NewUser, created_by: &str) -> Result<RegisteredUser> {
        if new_user.name.is_empty() {
            return Err(AuthError::MissingField(Field::Name));
        }
        let role = new_user.role.ok_or(AuthError::MissingField(Field::Role))?;

        let mut users = self.users()?;
        if users.iter().any(|u| u.has_name(&new_user.name)) {
            return Err(AuthError::DuplicateName(new_user.name));
        }

        let user = RegisteredUser {
            id: format!("user-{}", Uuid::new_v4()),
            name: new_user.name,
            role,
            phone: new_user.phone.filter(|p| !p.is_empty()),
            email: new_user.email.filter(|e| !e.is_empty()),
            created_at: self.clock.now(),
            created_by: created_by.to_string(),
        };

        users.push(user.clone());
        self.save(&users)?;

        info!(
            "Registered {} as {} (by {})",
            user.name, user.role, user.created_by
        );
        Ok(user)
    }

    fn save(&self, users: &[RegisteredUser]) -> Result<()> {
        let content = serde_json::to_string(users).map_err(StoreError::from)?;
        self.store.set(USERS_KEY, &content)?;
        Ok(())
    }
}
