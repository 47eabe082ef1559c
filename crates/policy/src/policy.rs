//! UCB1 bandit policy.
//!
//! Arms with no observations are always explored first, with ties among them
//! broken uniformly at random. Once every arm has been observed the policy
//! plays the arm maximising `value + sqrt(2 ln(total) / count)`, taking the
//! lowest index on ties.

use rand::Rng;
use serde_json::Value;
use tracing::{debug, trace};
use ucb_core::{UcbError, UcbResult};

use crate::state::{integer_of, saturating_total, PolicyState, DEFAULT_ARM_COUNT};

#[derive(Debug, Clone, PartialEq)]
pub struct BanditPolicy {
    arm_count: usize,
    counts: Vec<u64>,
    values: Vec<f64>,
}

impl BanditPolicy {
    /// Fresh policy with every arm unexplored.
    pub fn new(arm_count: usize) -> UcbResult<Self> {
        Self::restore(PolicyState::fresh(arm_count)?)
    }

    /// Restore from an exported snapshot. The snapshot is consumed, so the
    /// policy never shares storage with caller-held data.
    pub fn restore(state: PolicyState) -> UcbResult<Self> {
        state.validate()?;
        Ok(Self {
            arm_count: state.arm_count,
            counts: state.counts,
            values: state.values,
        })
    }

    /// Restore from loosely-typed host data (see [`PolicyState::from_value`]).
    pub fn from_value(input: &Value) -> UcbResult<Self> {
        Self::restore(PolicyState::from_value(input)?)
    }

    pub fn from_json(input: &str) -> UcbResult<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(&value)
    }

    pub fn arm_count(&self) -> usize {
        self.arm_count
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total_observations(&self) -> u64 {
        saturating_total(&self.counts)
    }

    /// Index of the arm to play next, using the thread-local RNG for the
    /// exploration tie-break.
    pub fn select(&self) -> usize {
        self.select_with(&mut rand::thread_rng())
    }

    /// Index of the arm to play next. `rng` is only consulted when more than
    /// one arm is still unexplored.
    pub fn select_with<R: Rng>(&self, rng: &mut R) -> usize {
        let unexplored: Vec<usize> = self
            .counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(arm, _)| arm)
            .collect();

        match unexplored.len() {
            0 => {}
            1 => {
                debug!(arm = unexplored[0], "found unexplored arm");
                return unexplored[0];
            }
            n => {
                let arm = unexplored[rng.gen_range(0..=n - 1)];
                debug!(arm, candidates = n, "picked among unexplored arms");
                return arm;
            }
        }

        let scores = self.ucb_scores();
        let mut best_arm = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (arm, &score) in scores.iter().enumerate() {
            if score > best_score {
                best_score = score;
                best_arm = arm;
            }
        }

        debug!(arm = best_arm, max_ucb = best_score, "selected by ucb score");
        best_arm
    }

    /// UCB score per arm, or `None` while any arm is unexplored.
    pub fn scores(&self) -> Option<Vec<f64>> {
        if self.counts.contains(&0) {
            None
        } else {
            Some(self.ucb_scores())
        }
    }

    // Callers guarantee every count is at least 1.
    fn ucb_scores(&self) -> Vec<f64> {
        let total: f64 = self.counts.iter().map(|&c| c as f64).sum();
        let bonus = 2.0 * total.ln();
        self.counts
            .iter()
            .zip(&self.values)
            .map(|(&count, &value)| value + (bonus / count as f64).sqrt())
            .collect()
    }

    /// Record `value` as an observed reward for `arm`. Nothing is modified
    /// when the call fails.
    pub fn reward(&mut self, arm: usize, value: f64) -> UcbResult<&mut Self> {
        if arm >= self.arm_count {
            return Err(UcbError::ArmOutOfRange {
                arm: i64::try_from(arm).unwrap_or(i64::MAX),
                arm_count: self.arm_count,
            });
        }
        if !value.is_finite() {
            return Err(UcbError::InvalidReward(value.to_string()));
        }

        let count = self.counts[arm]
            .checked_add(1)
            .ok_or(UcbError::CountOverflow { arm })?;
        let prior = self.values[arm];
        let n = count as f64;

        self.counts[arm] = count;
        self.values[arm] = ((n - 1.0) / n) * prior + (1.0 / n) * value;

        trace!(arm, reward = value, count, mean = self.values[arm], "reward applied");
        Ok(self)
    }

    /// Reward entry point for untyped host input. `None` stands for an
    /// absent argument.
    pub fn reward_value(
        &mut self,
        arm: Option<&Value>,
        value: Option<&Value>,
    ) -> UcbResult<&mut Self> {
        let arm = match arm {
            None | Some(Value::Null) => return Err(UcbError::MissingArm),
            Some(raw) if raw.is_number() => {
                integer_of(raw).ok_or_else(|| UcbError::InvalidArm(raw.to_string()))?
            }
            Some(raw) => return Err(UcbError::InvalidArm(raw.to_string())),
        };
        if arm < 0 || arm as u64 >= self.arm_count as u64 {
            return Err(UcbError::ArmOutOfRange {
                arm,
                arm_count: self.arm_count,
            });
        }

        let value = match value {
            None | Some(Value::Null) => return Err(UcbError::MissingReward),
            Some(raw) => raw
                .as_f64()
                .ok_or_else(|| UcbError::InvalidReward(raw.to_string()))?,
        };

        self.reward(arm as usize, value)
    }

    /// Independent copy of the current state.
    pub fn serialize(&self) -> PolicyState {
        let state = PolicyState {
            arm_count: self.arm_count,
            counts: self.counts.clone(),
            values: self.values.clone(),
        };
        debug!(arm_count = state.arm_count, total = state.total_observations(), "serializing state");
        state
    }

    pub fn to_json(&self) -> UcbResult<String> {
        Ok(serde_json::to_string(&self.serialize())?)
    }
}

impl Default for BanditPolicy {
    fn default() -> Self {
        Self {
            arm_count: DEFAULT_ARM_COUNT,
            counts: vec![0; DEFAULT_ARM_COUNT],
            values: vec![0.0; DEFAULT_ARM_COUNT],
        }
    }
}
