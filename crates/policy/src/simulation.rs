//! Offline simulation against Bernoulli arms.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;
use ucb_core::{UcbError, UcbResult};

use crate::policy::BanditPolicy;
use crate::state::PolicyState;

/// Plays a policy for a fixed number of rounds. Arm `i` pays `1.0` with
/// probability `probabilities[i]` and `0.0` otherwise.
#[derive(Debug, Clone)]
pub struct Simulation {
    probabilities: Vec<f64>,
    rounds: u64,
    seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub rounds: u64,
    pub seed: u64,
    pub best_arm: usize,
    pub best_arm_share: f64,
    pub total_reward: f64,
    pub state: PolicyState,
}

impl Simulation {
    pub fn new(probabilities: Vec<f64>) -> UcbResult<Self> {
        if probabilities.is_empty() {
            return Err(UcbError::InvalidArmCount("0".to_string()));
        }
        if let Some(p) = probabilities
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(UcbError::Config(format!(
                "reward probability {p} not in [0, 1]"
            )));
        }
        Ok(Self {
            probabilities,
            rounds: 1000,
            seed: rand::random(),
        })
    }

    pub fn rounds(mut self, rounds: u64) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn arm_count(&self) -> usize {
        self.probabilities.len()
    }

    /// Run from a fresh policy.
    pub fn run(&self) -> UcbResult<SimulationReport> {
        self.run_on(BanditPolicy::new(self.arm_count())?)
    }

    /// Continue from an existing policy, which must have one arm per
    /// probability.
    pub fn run_on(&self, mut policy: BanditPolicy) -> UcbResult<SimulationReport> {
        if policy.arm_count() != self.arm_count() {
            return Err(UcbError::Config(format!(
                "policy has {} arms but {} reward probabilities were given",
                policy.arm_count(),
                self.arm_count()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut total_reward = 0.0;

        for _ in 0..self.rounds {
            let arm = policy.select_with(&mut rng);
            let reward = if rng.gen_bool(self.probabilities[arm]) {
                1.0
            } else {
                0.0
            };
            total_reward += reward;
            policy.reward(arm, reward)?;
        }

        let state = policy.serialize();
        let (best_arm, best_count) = state
            .counts
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0), |best, (arm, count)| {
                if count > best.1 {
                    (arm, count)
                } else {
                    best
                }
            });
        let total = state.total_observations();
        let best_arm_share = if total > 0 {
            best_count as f64 / total as f64
        } else {
            0.0
        };

        info!(
            rounds = self.rounds,
            seed = self.seed,
            best_arm,
            best_arm_share,
            total_reward,
            "Simulation finished"
        );

        Ok(SimulationReport {
            rounds: self.rounds,
            seed: self.seed,
            best_arm,
            best_arm_share,
            total_reward,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_probabilities() {
        assert!(Simulation::new(vec![]).is_err());
        assert!(Simulation::new(vec![0.5, 1.5]).is_err());
        assert!(Simulation::new(vec![-0.1]).is_err());
    }

    #[test]
    fn test_same_seed_same_report() {
        let sim = Simulation::new(vec![0.2, 0.5, 0.4]).unwrap().rounds(300).seed(42);
        let a = sim.run().unwrap();
        let b = sim.run().unwrap();
        assert_eq!(a.state, b.state);
        assert_eq!(a.state.total_observations(), 300);
    }

    #[test]
    fn test_finds_clearly_best_arm() {
        let report = Simulation::new(vec![0.05, 0.1, 0.95, 0.1])
            .unwrap()
            .rounds(2000)
            .seed(7)
            .run()
            .unwrap();
        assert_eq!(report.best_arm, 2);
        assert!(report.best_arm_share > 0.5);
    }

    #[test]
    fn test_run_on_checks_arm_count() {
        let sim = Simulation::new(vec![0.5, 0.5]).unwrap();
        assert!(matches!(
            sim.run_on(BanditPolicy::new(3).unwrap()),
            Err(UcbError::Config(_))
        ));
    }

    #[test]
    fn test_zero_rounds() {
        let report = Simulation::new(vec![0.5]).unwrap().rounds(0).run().unwrap();
        assert_eq!(report.best_arm_share, 0.0);
        assert_eq!(report.state.counts, vec![0]);
    }
}
