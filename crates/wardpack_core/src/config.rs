//! Per-run integration configuration.
//!
//! # Responsibility
//! - Carry the known department list, per-department incidence shares and
//!   the baseline disease weight into a pipeline run.
//!
//! # Invariants
//! - Configuration is an immutable value owned by the run; the engine keeps
//!   no process-wide mutable configuration state.
//! - Incidence shares are positive; a department missing from the share
//!   table keeps raw weights.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fallback frequency weight for diseases authored without one.
pub const DEFAULT_BASELINE_WEIGHT: f64 = 1.0;

/// Immutable configuration for one integration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrateConfig {
    /// Known department ids; reassignment targets must be in this set.
    #[serde(default)]
    pub departments: BTreeSet<String>,
    /// Target relative incidence per department, as a share of total
    /// patient generation. Departments absent here keep raw weights.
    #[serde(default)]
    pub department_shares: BTreeMap<String, f64>,
    /// Baseline weight substituted for diseases without an authored one.
    #[serde(default = "default_baseline_weight")]
    pub baseline_weight: f64,
}

fn default_baseline_weight() -> f64 {
    DEFAULT_BASELINE_WEIGHT
}

impl Default for IntegrateConfig {
    fn default() -> Self {
        Self {
            departments: BTreeSet::new(),
            department_shares: BTreeMap::new(),
            baseline_weight: DEFAULT_BASELINE_WEIGHT,
        }
    }
}

impl IntegrateConfig {
    /// Validates value-level configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.baseline_weight > 0.0) {
            return Err(ConfigError::NonPositiveBaseline(self.baseline_weight));
        }
        for (department, share) in &self.department_shares {
            if !(*share > 0.0) {
                return Err(ConfigError::NonPositiveShare {
                    department: department.clone(),
                    share: *share,
                });
            }
            if !self.departments.contains(department) {
                return Err(ConfigError::ShareForUnknownDepartment(department.clone()));
            }
        }
        Ok(())
    }

    /// Returns whether `department` is a known reassignment target.
    pub fn knows_department(&self, department: &str) -> bool {
        self.departments.contains(department)
    }
}

/// Configuration value errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveBaseline(f64),
    NonPositiveShare { department: String, share: f64 },
    ShareForUnknownDepartment(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveBaseline(value) => {
                write!(f, "baseline weight must be positive, got {value}")
            }
            Self::NonPositiveShare { department, share } => {
                write!(
                    f,
                    "incidence share for department `{department}` must be positive, got {share}"
                )
            }
            Self::ShareForUnknownDepartment(department) => {
                write!(
                    f,
                    "incidence share declared for unknown department `{department}`"
                )
            }
        }
    }
}

impl Error for ConfigError {}
