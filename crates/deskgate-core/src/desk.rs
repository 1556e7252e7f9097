//! Installation wiring
//!
//! A [`Desk`] owns the shared store and clock for one installation. Each
//! login screen gets its own [`CredentialGate`] from [`Desk::login_screen`],
//! so session lockouts never leak between screens while the registry and
//! the Nikitovsky block stay shared.

use std::rc::Rc;

use crate::auth::{CredentialGate, LockoutPolicy, NikitovskyBlock};
use crate::clock::{Clock, SystemClock};
use crate::config::DeskConfig;
use crate::error::StoreResult;
use crate::registry::UserRegistry;
use crate::store::{FileStore, KeyValueStore, MemoryStore};

/// Shared state of one desk installation
#[derive(Clone)]
pub struct Desk {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
}

impl Desk {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Open the durable store described by `config`
    pub fn open(config: &DeskConfig) -> StoreResult<Self> {
        let store = FileStore::new(config.data_dir.clone())?;
        Ok(Self::new(Rc::new(store), Rc::new(SystemClock)))
    }

    /// Volatile desk for tests and demos
    pub fn in_memory(clock: Rc<dyn Clock>) -> Self {
        Self::new(Rc::new(MemoryStore::new()), clock)
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    pub fn registry(&self) -> UserRegistry {
        UserRegistry::new(self.store.clone(), self.clock.clone())
    }

    pub fn nikitovsky_block(&self) -> NikitovskyBlock {
        NikitovskyBlock::new(self.store.clone(), self.clock.clone())
    }

    /// Mount a login screen: a gate with a fresh session
    pub fn login_screen(&self) -> CredentialGate {
        self.login_screen_with_policy(LockoutPolicy::default())
    }

    pub fn login_screen_with_policy(&self, policy: LockoutPolicy) -> CredentialGate {
        CredentialGate::with_policy(
            self.registry(),
            self.nikitovsky_block(),
            self.clock.clone(),
            policy,
        )
    }
}
