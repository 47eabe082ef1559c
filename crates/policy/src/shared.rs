//! Per-instance mutual exclusion for hosts that call one policy from several
//! threads.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use serde_json::Value;
use ucb_core::UcbResult;

use crate::policy::BanditPolicy;
use crate::state::PolicyState;

/// Cloneable handle to a single policy. Every operation holds the lock for
/// its whole duration, so a `reward` never interleaves with another update.
#[derive(Debug, Clone, Default)]
pub struct SharedPolicy {
    inner: Arc<Mutex<BanditPolicy>>,
}

impl SharedPolicy {
    pub fn new(policy: BanditPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(policy)),
        }
    }

    pub fn select(&self) -> usize {
        self.inner.lock().select()
    }

    pub fn select_with<R: Rng>(&self, rng: &mut R) -> usize {
        self.inner.lock().select_with(rng)
    }

    pub fn reward(&self, arm: usize, value: f64) -> UcbResult<()> {
        self.inner.lock().reward(arm, value)?;
        Ok(())
    }

    pub fn reward_value(&self, arm: Option<&Value>, value: Option<&Value>) -> UcbResult<()> {
        self.inner.lock().reward_value(arm, value)?;
        Ok(())
    }

    /// Select an arm, compute its reward with `observe`, and apply it without
    /// releasing the lock in between. Returns the arm that was played.
    pub fn select_and_reward<F>(&self, observe: F) -> UcbResult<usize>
    where
        F: FnOnce(usize) -> f64,
    {
        let mut policy = self.inner.lock();
        let arm = policy.select();
        policy.reward(arm, observe(arm))?;
        Ok(arm)
    }

    pub fn serialize(&self) -> PolicyState {
        self.inner.lock().serialize()
    }

    /// Run `f` against the policy under the lock.
    pub fn with<T>(&self, f: impl FnOnce(&mut BanditPolicy) -> T) -> T {
        f(&mut self.inner.lock())
    }
}

impl From<BanditPolicy> for SharedPolicy {
    fn from(policy: BanditPolicy) -> Self {
        Self::new(policy)
    }
}
