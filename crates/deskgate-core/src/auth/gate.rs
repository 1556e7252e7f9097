//! Credential gate
//!
//! Decides admit or deny for one login screen. The gate owns that screen's
//! session lockout state and shares the registry and Nikitovsky block with
//! the rest of the installation.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{
    AuthError, DirectFlow, FailureOutcome, Field, Identity, LockoutPolicy, LoginAttemptState,
    LoginFlow, LoginInput, NikitovskyBlock, StandardFlow,
};
use crate::clock::Clock;
use crate::error::Result;
use crate::registry::{NewUser, RegisteredUser, UserRegistry, NIKITOVSKY_USER_NAME};
use crate::role::Role;

/// Login gate for one session
pub struct CredentialGate {
    registry: UserRegistry,
    block: NikitovskyBlock,
    clock: Rc<dyn Clock>,
    session: LoginAttemptState,
}

impl CredentialGate {
    /// Create a gate with a fresh session and the default lockout policy
    pub fn new(registry: UserRegistry, block: NikitovskyBlock, clock: Rc<dyn Clock>) -> Self {
        Self::with_policy(registry, block, clock, LockoutPolicy::default())
    }

    pub fn with_policy(
        registry: UserRegistry,
        block: NikitovskyBlock,
        clock: Rc<dyn Clock>,
        policy: LockoutPolicy,
    ) -> Self {
        Self {
            registry,
            block,
            clock,
            session: LoginAttemptState::new(policy),
        }
    }

    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    pub fn nikitovsky_block(&self) -> &NikitovskyBlock {
        &self.block
    }

    /// Session lockout state (for countdown display)
    pub fn session(&self) -> &LoginAttemptState {
        &self.session
    }

    /// Run one login attempt through `flow`.
    ///
    /// Checks, in order: session suspension, role resolution, the
    /// Nikitovsky block (for that role only), required fields, then the
    /// secret. Only a secret mismatch on a counted role touches the
    /// session counter.
    pub fn attempt<F: LoginFlow>(&mut self, flow: &F, input: &LoginInput) -> Result<Identity> {
        let now = self.clock.now();
        self.session
            .check(now)
            .map_err(|seconds_left| AuthError::Suspended { seconds_left })?;

        let resolved = flow.resolve_role(&self.registry, input)?;
        let role = resolved.role;

        if role == Role::Nikitovsky {
            self.block.ensure_unblocked()?;
        }

        if !role.requires_secret() {
            if input.secret_or_phone.is_empty() {
                return Err(AuthError::MissingField(Field::Phone));
            }
            return Ok(self.admit(
                flow,
                Identity {
                    role,
                    name: resolved.name,
                    phone: Some(input.secret_or_phone.clone()),
                },
            ));
        }

        if input.secret_or_phone.is_empty() {
            return Err(AuthError::MissingField(Field::Secret));
        }

        if input.secret_or_phone != role.secret() {
            return Err(self.reject(flow, role, now));
        }

        Ok(self.admit(
            flow,
            Identity {
                role,
                name: resolved.name,
                phone: None,
            },
        ))
    }

    /// Login with an explicitly selected role
    pub fn attempt_direct_login(
        &mut self,
        role: Role,
        name: &str,
        secret_or_phone: &str,
    ) -> Result<Identity> {
        self.attempt(
            &DirectFlow,
            &LoginInput::direct(role, name, secret_or_phone),
        )
    }

    /// Login by registered name
    pub fn attempt_standard_login(&mut self, name: &str, secret_or_phone: &str) -> Result<Identity> {
        self.attempt(&StandardFlow, &LoginInput::standard(name, secret_or_phone))
    }

    /// Dedicated Nikitovsky login.
    ///
    /// Only the persisted block applies and failures are never counted. An
    /// admission resets the session like any other.
    pub fn attempt_nikitovsky_login(&mut self, secret: &str) -> Result<Identity> {
        self.block.ensure_unblocked()?;

        if secret.is_empty() {
            return Err(AuthError::MissingField(Field::Secret));
        }
        if secret != Role::Nikitovsky.secret() {
            warn!("Wrong secret on Nikitovsky login");
            return Err(AuthError::WrongSecret {
                attempts_remaining: None,
            });
        }

        self.session.record_success();
        info!("Nikitovsky admitted");
        Ok(Identity {
            role: Role::Nikitovsky,
            name: NIKITOVSKY_USER_NAME.to_string(),
            phone: None,
        })
    }

    /// Block the Nikitovsky login for two hours
    pub fn block_nikitovsky(&self) -> Result<DateTime<Utc>> {
        self.block.block()
    }

    /// Lift the Nikitovsky block with the recovery secret
    pub fn unblock_nikitovsky(&self, recovery_secret: &str) -> Result<()> {
        self.block.unblock(recovery_secret)
    }

    /// Register a user on behalf of `created_by`
    pub fn register_user(&self, new_user: NewUser, created_by: &str) -> Result<RegisteredUser> {
        self.registry.register(new_user, created_by)
    }

    fn admit<F: LoginFlow>(&mut self, flow: &F, identity: Identity) -> Identity {
        self.session.record_success();
        info!(
            "Admitted {} as {} ({} login)",
            identity.name,
            identity.role,
            flow.label()
        );
        identity
    }

    fn reject<F: LoginFlow>(&mut self, flow: &F, role: Role, now: DateTime<Utc>) -> AuthError {
        if role == Role::Nikitovsky {
            warn!("Wrong secret for {} ({} login)", role, flow.label());
            return AuthError::WrongSecret {
                attempts_remaining: None,
            };
        }

        match self.session.record_failure(now) {
            FailureOutcome::Retry { attempts_remaining } => {
                warn!(
                    "Wrong secret for {} ({} login), {} attempts remaining",
                    role,
                    flow.label(),
                    attempts_remaining
                );
                AuthError::WrongSecret {
                    attempts_remaining: Some(attempts_remaining),
                }
            }
            FailureOutcome::Suspended { seconds_left } => AuthError::Suspended { seconds_left },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn test_gate() -> (Rc<ManualClock>, CredentialGate) {
        let store = Rc::new(MemoryStore::new());
        let clock = Rc::new(ManualClock::starting_now());
        let registry = UserRegistry::new(store.clone(), clock.clone());
        let block = NikitovskyBlock::new(store, clock.clone());
        let gate = CredentialGate::new(registry, block, clock.clone());
        (clock, gate)
    }

    #[test]
    fn test_direct_login_admits_correct_secret() {
        let (_clock, mut gate) = test_gate();
        let identity = gate
            .attempt_direct_login(Role::Cashier, "Мария", "25")
            .unwrap();
        assert_eq!(identity.role, Role::Cashier);
        assert_eq!(identity.name, "Мария");
        assert_eq!(identity.phone, None);
    }

    #[test]
    fn test_three_strikes_then_suspended_even_for_correct_secret() {
        let (_clock, mut gate) = test_gate();

        for remaining in [2, 1] {
            let err = gate
                .attempt_direct_login(Role::Admin, "Анна", "wrong")
                .unwrap_err();
            assert!(matches!(
                err,
                AuthError::WrongSecret { attempts_remaining: Some(n) } if n == remaining
            ));
        }

        let err = gate
            .attempt_direct_login(Role::Admin, "Анна", "wrong")
            .unwrap_err();
        assert!(matches!(err, AuthError::Suspended { seconds_left: 90 }));

        let err = gate
            .attempt_direct_login(Role::Admin, "Анна", "2025")
            .unwrap_err();
        assert!(matches!(err, AuthError::Suspended { .. }));
    }

    #[test]
    fn test_suspension_does_not_double_count() {
        let (clock, mut gate) = test_gate();
        for _ in 0..3 {
            let _ = gate.attempt_direct_login(Role::Creator, "Олег", "x");
        }
        for _ in 0..5 {
            let _ = gate.attempt_direct_login(Role::Creator, "Олег", "x");
        }
        assert_eq!(gate.session().failed_count(), 0);

        clock.advance(Duration::seconds(90));
        let err = gate
            .attempt_direct_login(Role::Creator, "Олег", "x")
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::WrongSecret {
                attempts_remaining: Some(2)
            }
        ));
    }

    #[test]
    fn test_lazy_expiry_admits_next_attempt() {
        let (clock, mut gate) = test_gate();
        for _ in 0..3 {
            let _ = gate.attempt_direct_login(Role::Cashier, "Мария", "00");
        }
        clock.advance(Duration::seconds(89));
        assert!(gate
            .attempt_direct_login(Role::Cashier, "Мария", "25")
            .is_err());

        clock.advance(Duration::seconds(1));
        assert!(gate
            .attempt_direct_login(Role::Cashier, "Мария", "25")
            .is_ok());
    }

    #[test]
    fn test_client_needs_phone_not_secret() {
        let (_clock, mut gate) = test_gate();

        let err = gate
            .attempt_direct_login(Role::Client, "Ольга", "")
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingField(Field::Phone)));

        let identity = gate
            .attempt_direct_login(Role::Client, "Ольга", "+79990001122")
            .unwrap();
        assert_eq!(identity.phone.as_deref(), Some("+79990001122"));
    }

    #[test]
    fn test_missing_fields_are_not_counted() {
        let (_clock, mut gate) = test_gate();
        for _ in 0..5 {
            let err = gate
                .attempt_direct_login(Role::Admin, "Анна", "")
                .unwrap_err();
            assert!(matches!(err, AuthError::MissingField(Field::Secret)));
        }
        assert_eq!(gate.session().failed_count(), 0);
    }

    #[test]
    fn test_unknown_user_is_not_counted() {
        let (_clock, mut gate) = test_gate();
        for _ in 0..4 {
            let err = gate.attempt_standard_login("Никто", "25").unwrap_err();
            assert!(matches!(err, AuthError::UnknownUser(_)));
        }
        assert_eq!(gate.session().failed_count(), 0);
    }

    #[test]
    fn test_success_resets_counter() {
        let (_clock, mut gate) = test_gate();
        let _ = gate.attempt_direct_login(Role::Admin, "Анна", "bad");
        let _ = gate.attempt_direct_login(Role::Admin, "Анна", "bad");
        gate.attempt_direct_login(Role::Admin, "Анна", "2025")
            .unwrap();
        assert_eq!(gate.session().failed_count(), 0);
    }

    #[test]
    fn test_nikitovsky_failures_never_suspend() {
        let (_clock, mut gate) = test_gate();

        for _ in 0..5 {
            let err = gate.attempt_nikitovsky_login("nope").unwrap_err();
            assert!(matches!(
                err,
                AuthError::WrongSecret {
                    attempts_remaining: None
                }
            ));
        }
        for _ in 0..5 {
            let err = gate.attempt_standard_login("никитовский", "nope").unwrap_err();
            assert!(matches!(err, AuthError::WrongSecret { .. }));
        }
        assert_eq!(gate.session().failed_count(), 0);
        assert!(gate.attempt_nikitovsky_login("20252025").is_ok());
    }

    #[test]
    fn test_nikitovsky_admission_resets_counter() {
        let (_clock, mut gate) = test_gate();
        let _ = gate.attempt_direct_login(Role::Admin, "Анна", "bad");
        let _ = gate.attempt_direct_login(Role::Admin, "Анна", "bad");

        gate.attempt_nikitovsky_login("20252025").unwrap();
        assert_eq!(gate.session().failed_count(), 0);

        let err = gate
            .attempt_direct_login(Role::Admin, "Анна", "bad")
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::WrongSecret {
                attempts_remaining: Some(2)
            }
        ));
    }

    #[test]
    fn test_block_gates_only_nikitovsky() {
        let (clock, mut gate) = test_gate();
        gate.block_nikitovsky().unwrap();

        let err = gate.attempt_nikitovsky_login("20252025").unwrap_err();
        assert!(matches!(err, AuthError::Blocked { hours_left: 2 }));

        let err = gate
            .attempt_direct_login(Role::Nikitovsky, "Никитовский", "20252025")
            .unwrap_err();
        assert!(matches!(err, AuthError::Blocked { .. }));

        assert!(gate.attempt_direct_login(Role::Admin, "Анна", "2025").is_ok());

        clock.advance(Duration::hours(2));
        assert!(gate.attempt_nikitovsky_login("20252025").is_ok());
    }

    #[test]
    fn test_unblock_with_recovery_secret() {
        let (_clock, mut gate) = test_gate();
        gate.block_nikitovsky().unwrap();

        assert!(gate.unblock_nikitovsky("2024").is_err());
        assert!(gate.attempt_nikitovsky_login("20252025").is_err());

        gate.unblock_nikitovsky("2025").unwrap();
        assert!(gate.attempt_nikitovsky_login("20252025").is_ok());
    }

    #[test]
    fn test_standard_login_resolves_registered_role() {
        let (_clock, mut gate) = test_gate();
        gate.register_user(NewUser::new("Иван", Role::HeadCashier), "Анна")
            .unwrap();

        let identity = gate.attempt_standard_login("иван", "202520").unwrap();
        assert_eq!(identity.role, Role::HeadCashier);
        assert_eq!(identity.name, "Иван");

        let err = gate.attempt_standard_login("иван", "25").unwrap_err();
        assert!(matches!(
            err,
            AuthError::WrongSecret {
                attempts_remaining: Some(2)
            }
        ));
    }

    #[test]
    fn test_standard_login_client_bypasses_secret() {
        let (_clock, mut gate) = test_gate();
        gate.register_user(NewUser::new("Ольга", Role::Client), "Анна")
            .unwrap();

        let identity = gate.attempt_standard_login("ольга", "+7 999").unwrap();
        assert_eq!(identity.role, Role::Client);
        assert_eq!(identity.phone.as_deref(), Some("+7 999"));
    }
}
