//! Library configuration.
//!
//! Stored as TOML. Every key is optional; missing keys take the defaults
//! below.
//!
//! ```toml
//! data_path = "library_data.json"
//! fine_per_day = "1.0"
//! default_loan_days = 14
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CirculationError, Result};
use crate::fees::{FeePolicy, FINE_PER_DAY};

pub const DEFAULT_DATA_PATH: &str = "library_data.json";
pub const DEFAULT_LOAN_DAYS: u32 = 14;
/// Longest accepted loan period, about a century.
pub const MAX_LOAN_DAYS: u32 = 36_500;
/// Largest accepted daily late fee.
pub const MAX_FINE_PER_DAY: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Where the JSON state document lives
    pub data_path: PathBuf,

    /// Late fee charged per whole day overdue
    pub fine_per_day: Decimal,

    /// Loan period used by `Library::lend_default`
    pub default_loan_days: u32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            fine_per_day: FINE_PER_DAY,
            default_loan_days: DEFAULT_LOAN_DAYS,
        }
    }
}

impl LibraryConfig {
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: LibraryConfig = toml::from_str(contents)
            .map_err(|e| CirculationError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fine_per_day < Decimal::ZERO {
            return Err(CirculationError::Validation(
                "fine_per_day cannot be negative".to_string(),
            ));
        }
        if self.fine_per_day > MAX_FINE_PER_DAY {
            return Err(CirculationError::Validation(format!(
                "fine_per_day cannot exceed {}",
                MAX_FINE_PER_DAY
            )));
        }
        if self.default_loan_days == 0 {
            return Err(CirculationError::Validation(
                "default_loan_days must be at least 1".to_string(),
            ));
        }
        if self.default_loan_days > MAX_LOAN_DAYS {
            return Err(CirculationError::Validation(format!(
                "default_loan_days cannot exceed {}",
                MAX_LOAN_DAYS
            )));
        }
        Ok(())
    }

    pub fn fee_policy(&self) -> FeePolicy {
        FeePolicy::new(self.fine_per_day)
    }
}

pub fn read_config(path: &Path) -> Result<LibraryConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CirculationError::Config(format!("Failed to read config {}: {}", path.display(), e))
    })?;
    LibraryConfig::from_toml_str(&contents)
}

pub fn write_config(path: &Path, config: &LibraryConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CirculationError::Config(format!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    let contents = toml::to_string_pretty(config)
        .map_err(|e| CirculationError::Config(format!("TOML error: {}", e)))?;
    std::fs::write(path, contents).map_err(|e| {
        CirculationError::Config(format!("Failed to write config {}: {}", path.display(), e))
    })?;
    Ok(())
}
