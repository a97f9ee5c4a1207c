//! Observers of share balance changes.

use primitive_types::U256;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Called synchronously around share record mutations.
pub trait SwapHooks {
    /// A depositor's first share record in a pool was saved.
    fn after_pool_deposit_created(&mut self, pool_id: &str, depositor: &str, shares_owned: U256);

    /// An existing share record is about to change; `shares_owned` is the
    /// balance before the change.
    fn before_pool_deposit_modified(&mut self, pool_id: &str, depositor: &str, shares_owned: U256);
}

/// Holds an optional [`SwapHooks`] implementation.
///
/// Calls on an empty holder do nothing.
#[derive(Default)]
pub struct Hooks {
    inner: Option<Box<dyn SwapHooks>>,
}

impl Hooks {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(hooks: impl SwapHooks + 'static) -> Self {
        Self {
            inner: Some(Box::new(hooks)),
        }
    }

    /// Installs `hooks`, replacing any previous implementation.
    pub fn set(&mut self, hooks: impl SwapHooks + 'static) {
        self.inner = Some(Box::new(hooks));
    }

    pub fn clear(&mut self) {
        self.inner = None;
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.is_some()
    }
}

impl SwapHooks for Hooks {
    fn after_pool_deposit_created(&mut self, pool_id: &str, depositor: &str, shares_owned: U256) {
        if let Some(hooks) = self.inner.as_mut() {
            hooks.after_pool_deposit_created(pool_id, depositor, shares_owned);
        }
    }

    fn before_pool_deposit_modified(&mut self, pool_id: &str, depositor: &str, shares_owned: U256) {
        if let Some(hooks) = self.inner.as_mut() {
            hooks.before_pool_deposit_modified(pool_id, depositor, shares_owned);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("set", &self.is_set()).finish()
    }
}

/// A recorded hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    AfterPoolDepositCreated {
        pool_id: String,
        depositor: String,
        shares_owned: U256,
    },
    BeforePoolDepositModified {
        pool_id: String,
        depositor: String,
        shares_owned: U256,
    },
}

/// Hooks that record every call into a shared log.
///
/// Clones share the same log, so a clone kept by the caller observes the
/// calls made on the one handed to the manager.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    calls: Rc<RefCell<Vec<HookCall>>>,
}

impl RecordingHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.borrow().clone()
    }

    /// Removes and returns every recorded call.
    pub fn take(&self) -> Vec<HookCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }
}

impl SwapHooks for RecordingHooks {
    fn after_pool_deposit_created(&mut self, pool_id: &str, depositor: &str, shares_owned: U256) {
        self.calls.borrow_mut().push(HookCall::AfterPoolDepositCreated {
            pool_id: pool_id.to_string(),
            depositor: depositor.to_string(),
            shares_owned,
        });
    }

    fn before_pool_deposit_modified(&mut self, pool_id: &str, depositor: &str, shares_owned: U256) {
        self.calls.borrow_mut().push(HookCall::BeforePoolDepositModified {
            pool_id: pool_id.to_string(),
            depositor: depositor.to_string(),
            shares_owned,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hooks_are_noop() {
        let mut hooks = Hooks::none();
        assert!(!hooks.is_set());
        hooks.after_pool_deposit_created("ukava/usdx", "alice", U256::from(1));
        hooks.before_pool_deposit_modified("ukava/usdx", "alice", U256::from(1));
    }

    #[test]
    fn test_recording_hooks_share_log() {
        let recorder = RecordingHooks::new();
        let mut hooks = Hooks::new(recorder.clone());
        assert!(hooks.is_set());

        hooks.after_pool_deposit_created("ukava/usdx", "alice", U256::from(10));
        hooks.before_pool_deposit_modified("ukava/usdx", "alice", U256::from(10));

        assert_eq!(
            recorder.take(),
            vec![
                HookCall::AfterPoolDepositCreated {
                    pool_id: "ukava/usdx".into(),
                    depositor: "alice".into(),
                    shares_owned: U256::from(10),
                },
                HookCall::BeforePoolDepositModified {
                    pool_id: "ukava/usdx".into(),
                    depositor: "alice".into(),
                    shares_owned: U256::from(10),
                },
            ]
        );

        hooks.clear();
        hooks.after_pool_deposit_created("ukava/usdx", "alice", U256::from(1));
        assert!(recorder.calls().is_empty());
    }
}
