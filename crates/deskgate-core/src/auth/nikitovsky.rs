//! Persisted block on the Nikitovsky login
//!
//! Set by an explicit operator action, never by failed logins. The deadline
//! survives restarts and is cleared either when a read finds it expired or
//! when the recovery secret is presented.

use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::AuthError;
use crate::clock::Clock;
use crate::error::{Result, StoreError};
use crate::store::{KeyValueStore, NIKITOVSKY_BLOCK_KEY};

/// Length of an operator-triggered block
pub const BLOCK_DURATION_HOURS: i64 = 2;

/// Secret that lifts an active block early
pub const RECOVERY_SECRET: &str = "2025";

/// Handle on the persisted block record
#[derive(Clone)]
pub struct NikitovskyBlock {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
}

impl NikitovskyBlock {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Block the Nikitovsky login for two hours from now.
    ///
    /// An active block is replaced, not extended.
    pub fn block(&self) -> Result<DateTime<Utc>> {
        let until = self.clock.now() + Duration::hours(BLOCK_DURATION_HOURS);
        self.store
            .set(NIKITOVSKY_BLOCK_KEY, &until.timestamp_millis().to_string())?;
        warn!("Nikitovsky login blocked until {}", until.to_rfc3339());
        Ok(until)
    }

    /// Deadline of the active block, if any.
    ///
    /// An expired record is removed as a side effect.
    pub fn blocked_until(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(NIKITOVSKY_BLOCK_KEY)? else {
            return Ok(None);
        };

        let until = raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| {
                StoreError::Serialization(format!("Malformed block deadline: {:?}", raw))
            })?;

        if self.clock.now() >= until {
            self.store.remove(NIKITOVSKY_BLOCK_KEY)?;
            info!("Nikitovsky block expired");
            return Ok(None);
        }

        Ok(Some(until))
    }

    pub fn is_blocked(&self) -> Result<bool> {
        Ok(self.blocked_until()?.is_some())
    }

    /// Whole hours left on the active block, rounded up
    pub fn hours_left(&self) -> Result<Option<u64>> {
        let now = self.clock.now();
        Ok(self.blocked_until()?.map(|until| {
            let millis = (until - now).num_milliseconds().max(0) as u64;
            millis.div_ceil(3_600_000)
        }))
    }

    /// Fail with `Blocked` while a block is active
    pub fn ensure_unblocked(&self) -> Result<()> {
        match self.hours_left()? {
            Some(hours_left) => Err(AuthError::Blocked { hours_left }),
            None => Ok(()),
        }
    }

    /// Lift the block early with the recovery secret.
    ///
    /// Succeeds even when no block is active. Any other secret leaves the
    /// block in place.
    pub fn unblock(&self, recovery_secret: &str) -> Result<()> {
        if recovery_secret != RECOVERY_SECRET {
            warn!("Rejected Nikitovsky unblock attempt");
            return Err(AuthError::WrongSecret {
                attempts_remaining: None,
            });
        }
        self.store.remove(NIKITOVSKY_BLOCK_KEY)?;
        info!("Nikitovsky block lifted with recovery secret");
        Ok(())
    }
}
