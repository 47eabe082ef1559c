//! Persisted policy state: `{ armCount, counts, values }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ucb_core::{UcbError, UcbResult};

/// Arm count used when a snapshot does not carry one.
pub const DEFAULT_ARM_COUNT: usize = 2;

/// Plain-data snapshot of a policy. This is both the export format and the
/// restore input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyState {
    #[serde(alias = "arms")]
    pub arm_count: usize,
    pub counts: Vec<u64>,
    pub values: Vec<f64>,
}

impl PolicyState {
    /// All-zero state for `arm_count` arms.
    pub fn fresh(arm_count: usize) -> UcbResult<Self> {
        if arm_count < 1 {
            return Err(UcbError::InvalidArmCount(arm_count.to_string()));
        }
        Ok(Self {
            arm_count,
            counts: vec![0; arm_count],
            values: vec![0.0; arm_count],
        })
    }

    /// Check the length invariants and that every value is finite.
    pub fn validate(&self) -> UcbResult<()> {
        if self.arm_count < 1 {
            return Err(UcbError::InvalidArmCount(self.arm_count.to_string()));
        }
        if self.counts.len() != self.arm_count {
            return Err(UcbError::CountsLengthMismatch {
                expected: self.arm_count,
                actual: self.counts.len(),
            });
        }
        if self.values.len() != self.arm_count {
            return Err(UcbError::ValuesLengthMismatch {
                expected: self.arm_count,
                actual: self.values.len(),
            });
        }
        if let Some(index) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(UcbError::InvalidValue { index });
        }
        Ok(())
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total_observations(&self) -> u64 {
        saturating_total(&self.counts)
    }

    /// Build a state from loosely-typed host data.
    ///
    /// `armCount` (or the legacy `arms`) defaults to 2 when absent. When
    /// neither `counts` nor `values` is present the result is a fresh state;
    /// supplying only one of them is an error.
    pub fn from_value(input: &Value) -> UcbResult<Self> {
        if !input.is_object() {
            return Err(UcbError::StateNotObject);
        }

        let arm_count = match input.get("armCount").or_else(|| input.get("arms")) {
            None | Some(Value::Null) => DEFAULT_ARM_COUNT,
            Some(raw) => match integer_of(raw) {
                Some(n) if n >= 1 => n as usize,
                _ => return Err(UcbError::InvalidArmCount(raw.to_string())),
            },
        };

        let counts = input.get("counts").filter(|v| !v.is_null());
        let values = input.get("values").filter(|v| !v.is_null());

        let (counts, values) = match (counts, values) {
            (None, None) => return Self::fresh(arm_count),
            (Some(c), Some(v)) => (c, v),
            _ => return Err(UcbError::IncompleteState),
        };

        let counts = counts.as_array().ok_or(UcbError::CountsNotSequence)?;
        let values = values.as_array().ok_or(UcbError::ValuesNotSequence)?;

        if counts.len() != arm_count {
            return Err(UcbError::CountsLengthMismatch {
                expected: arm_count,
                actual: counts.len(),
            });
        }
        if values.len() != arm_count {
            return Err(UcbError::ValuesLengthMismatch {
                expected: arm_count,
                actual: values.len(),
            });
        }

        let counts = counts
            .iter()
            .enumerate()
            .map(|(index, c)| count_of(c).ok_or(UcbError::InvalidCount { index }))
            .collect::<UcbResult<Vec<u64>>>()?;

        let values = values
            .iter()
            .enumerate()
            .map(|(index, v)| {
                v.as_f64()
                    .filter(|f| f.is_finite())
                    .ok_or(UcbError::InvalidValue { index })
            })
            .collect::<UcbResult<Vec<f64>>>()?;

        Ok(Self {
            arm_count,
            counts,
            values,
        })
    }
}

/// Integral JSON number, accepting `3.0` as well as `3`.
pub(crate) fn integer_of(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Non-negative integral JSON number over the full `u64` range.
fn count_of(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

pub(crate) fn saturating_total(counts: &[u64]) -> u64 {
    counts.iter().fold(0u64, |total, &c| total.saturating_add(c))
}
