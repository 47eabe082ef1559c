use thiserror::Error;

pub type UcbResult<T> = Result<T, UcbError>;

#[derive(Error, Debug)]
pub enum UcbError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("invalid arms: cannot be less than 1 (got {0})")]
    InvalidArmCount(String),

    #[error("state must be an object")]
    StateNotObject,

    #[error("counts must be an array")]
    CountsNotSequence,

    #[error("values must be an array")]
    ValuesNotSequence,

    #[error("arms and counts.length must be identical (arms={expected}, counts.length={actual})")]
    CountsLengthMismatch { expected: usize, actual: usize },

    #[error("arms and values.length must be identical (arms={expected}, values.length={actual})")]
    ValuesLengthMismatch { expected: usize, actual: usize },

    #[error("counts[{index}] must be a non-negative integer")]
    InvalidCount { index: usize },

    #[error("values[{index}] must be a finite number")]
    InvalidValue { index: usize },

    #[error("counts and values must be supplied together")]
    IncompleteState,

    #[error("missing required parameter: arm")]
    MissingArm,

    #[error("invalid required parameter: arm ({0})")]
    InvalidArm(String),

    #[error("arm index out of bounds: {arm} not in 0..{arm_count}")]
    ArmOutOfRange { arm: i64, arm_count: usize },

    #[error("missing required parameter: reward")]
    MissingReward,

    #[error("invalid required parameter: reward ({0})")]
    InvalidReward(String),

    #[error("observation count for arm {arm} would overflow")]
    CountOverflow { arm: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UcbError {
    /// True for errors raised while building a policy from a snapshot.
    pub fn is_restore_error(&self) -> bool {
        matches!(
            self,
            UcbError::InvalidArmCount(_)
                | UcbError::StateNotObject
                | UcbError::CountsNotSequence
                | UcbError::ValuesNotSequence
                | UcbError::CountsLengthMismatch { .. }
                | UcbError::ValuesLengthMismatch { .. }
                | UcbError::InvalidCount { .. }
                | UcbError::InvalidValue { .. }
                | UcbError::IncompleteState
        )
    }

    /// True for errors raised by a rejected reward call.
    pub fn is_reward_error(&self) -> bool {
        matches!(
            self,
            UcbError::MissingArm
                | UcbError::InvalidArm(_)
                | UcbError::ArmOutOfRange { .. }
                | UcbError::MissingReward
                | UcbError::InvalidReward(_)
                | UcbError::CountOverflow { .. }
        )
    }
}
