//! Deskgate core - login gate for a deposit desk
//!
//! This crate provides the pieces of the desk that carry state:
//! - Roles and the static secret table
//! - The registered user registry
//! - Session lockout (three strikes, 90 second cooldown)
//! - The persisted Nikitovsky block
//! - The credential gate tying them together
//!
//! Persistence and time are injected ([`KeyValueStore`], [`Clock`]) so every
//! component runs against in-memory fakes in tests.

pub mod auth;
pub mod clock;
pub mod config;
pub mod desk;
pub mod error;
pub mod registry;
pub mod role;
pub mod store;

pub use auth::{
    AuthError, CredentialGate, DirectFlow, Field, Identity, LoginFlow, LoginInput,
    NikitovskyBlock, StandardFlow,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DeskConfig;
pub use desk::Desk;
pub use error::{ConfigError, Result, StoreError};
pub use registry::{NewUser, RegisteredUser, UserRegistry};
pub use role::Role;
pub use store::{FileStore, KeyValueStore, MemoryStore};
