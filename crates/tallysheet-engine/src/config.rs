use std::env;
use std::str::FromStr;

use serde::Deserialize;
use tallysheet_core::grid::{INITIAL_COLS, INITIAL_ROWS};
use tallysheet_formula::{EvalOptions, NumericMode};

use crate::error::ConfigError;

/// Order in which cells affected by an edit are re-evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalcOrder {
    /// FIFO traversal from the edited cell, each cell evaluated once when
    /// first dequeued. A cell reached by paths of different lengths may read
    /// a precedent that has not been refreshed yet.
    #[default]
    BreadthFirst,
    /// Every precedent is refreshed before its dependents
    Topological,
}

/// What happens to cells caught in a circular reference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Each member is evaluated once from whatever values it finds
    #[default]
    Ignore,
    /// Members and everything downstream of them display `#CYCLE`
    Mark,
}

/// How formulas react when the cells they name are moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceAdjustment {
    /// Formula text and cached values move unchanged
    #[default]
    Verbatim,
    /// References are rewritten to follow the cells they name
    Shift,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub numeric_mode: NumericMode,
    pub recalc_order: RecalcOrder,
    pub cycle_policy: CyclePolicy,
    pub reference_adjustment: ReferenceAdjustment,
    /// Soft grid size a new workbook starts with
    pub initial_rows: u32,
    pub initial_cols: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            numeric_mode: NumericMode::default(),
            recalc_order: RecalcOrder::default(),
            cycle_policy: CyclePolicy::default(),
            reference_adjustment: ReferenceAdjustment::default(),
            initial_rows: INITIAL_ROWS,
            initial_cols: INITIAL_COLS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a JSON object; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            numeric_mode: named(&lookup, "TALLYSHEET_NUMERIC_MODE", defaults.numeric_mode)?,
            recalc_order: named(&lookup, "TALLYSHEET_RECALC_ORDER", defaults.recalc_order)?,
            cycle_policy: named(&lookup, "TALLYSHEET_CYCLE_POLICY", defaults.cycle_policy)?,
            reference_adjustment: named(
                &lookup,
                "TALLYSHEET_REFERENCE_ADJUSTMENT",
                defaults.reference_adjustment,
            )?,
            initial_rows: parsed(&lookup, "TALLYSHEET_INITIAL_ROWS", defaults.initial_rows)?,
            initial_cols: parsed(&lookup, "TALLYSHEET_INITIAL_COLS", defaults.initial_cols)?,
        })
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            numeric_mode: self.numeric_mode,
        }
    }
}

/// Enum-valued variable, spelled the same way as in JSON (`"strict"`, `"topological"`)
fn named<T: for<'de> Deserialize<'de>>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
