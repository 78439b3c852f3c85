//! Late fee policy.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CirculationError, Result};

/// Default charge per whole day late: one currency unit.
pub const FINE_PER_DAY: Decimal = Decimal::ONE;

/// Converts overdue days into a monetary penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    pub rate_per_day: Decimal,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            rate_per_day: FINE_PER_DAY,
        }
    }
}

impl FeePolicy {
    pub fn new(rate_per_day: Decimal) -> Self {
        Self { rate_per_day }
    }

    /// Whole days between `due` and `returned`, truncated toward zero.
    ///
    /// Negative when returned early. A partial day counts as zero.
    pub fn days_late(due: DateTime<Utc>, returned: DateTime<Utc>) -> i64 {
        (returned - due).num_days()
    }

    /// Fee owed for an item due at `due` and returned at `returned`.
    ///
    /// # Errors
    ///
    /// Returns `CirculationError::Validation` if the fee does not fit in a
    /// `Decimal`.
    pub fn fee(&self, due: DateTime<Utc>, returned: DateTime<Utc>) -> Result<Decimal> {
        let days = Self::days_late(due, returned).max(0);
        Decimal::from(days)
            .checked_mul(self.rate_per_day)
            .ok_or_else(|| {
                CirculationError::Validation(format!(
                    "Late fee for {} days at {} per day overflows",
                    days, self.rate_per_day
                ))
            })
    }
}
