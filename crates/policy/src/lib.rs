//! UCB1 multi-armed bandit policy: arm selection, incremental reward
//! statistics, and a plain-data state snapshot for persistence.

pub mod policy;
pub mod shared;
pub mod simulation;
pub mod state;

pub use policy::BanditPolicy;
pub use shared::SharedPolicy;
pub use simulation::{Simulation, SimulationReport};
pub use state::PolicyState;
