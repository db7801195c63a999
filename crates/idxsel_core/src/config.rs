//! Algorithm configuration.
//!
//! Each algorithm has one configuration struct with documented defaults.
//! Deserializing a partial mapping of options merges it over the defaults;
//! unknown option names are rejected. Configurations are validated once
//! when an algorithm is constructed and never change afterwards.

use crate::cost::CostEstimation;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default storage budget in megabytes.
pub const DEFAULT_BUDGET_MB: f64 = 500.0;

/// Default maximum number of columns per index.
pub const DEFAULT_MAX_INDEX_WIDTH: usize = 2;

/// Default number of indexes kept by the drop heuristic.
pub const DEFAULT_MAX_INDEXES: usize = 15;

/// Default relative improvement a new extend configuration must achieve.
pub const DEFAULT_MIN_COST_IMPROVEMENT: f64 = 1.003;

/// Converts megabytes to bytes (1 MB = 1 000 000 bytes).
#[must_use]
pub fn mb_to_bytes(mb: f64) -> u64 {
    (mb * 1_000_000.0).round() as u64
}

/// Converts bytes to megabytes.
#[must_use]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / 1_000_000.0
}

fn validate_budget(budget_mb: f64) -> CoreResult<()> {
    if !budget_mb.is_finite() || budget_mb <= 0.0 {
        return Err(CoreError::invalid_config(format!(
            "budget_MB must be a positive number, got {budget_mb}"
        )));
    }
    Ok(())
}

fn validate_width(max_index_width: usize) -> CoreResult<()> {
    if max_index_width < 1 {
        return Err(CoreError::invalid_config("max_index_width must be at least 1"));
    }
    Ok(())
}

/// Configuration for the drop heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropHeuristicConfig {
    /// Number of indexes to keep.
    pub max_indexes: usize,

    /// How workload costs are obtained.
    pub cost_estimation: CostEstimation,

    /// Record the removal order. Only meaningful with `max_indexes == 1`.
    pub log_index_history: bool,
}

impl Default for DropHeuristicConfig {
    fn default() -> Self {
        Self {
            max_indexes: DEFAULT_MAX_INDEXES,
            cost_estimation: CostEstimation::WhatIf,
            log_index_history: false,
        }
    }
}

impl DropHeuristicConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of indexes to keep.
    #[must_use]
    pub const fn max_indexes(mut self, value: usize) -> Self {
        self.max_indexes = value;
        self
    }

    /// Sets how costs are obtained.
    #[must_use]
    pub const fn cost_estimation(mut self, value: CostEstimation) -> Self {
        self.cost_estimation = value;
        self
    }

    /// Enables recording of the removal order.
    #[must_use]
    pub const fn log_index_history(mut self, value: bool) -> Self {
        self.log_index_history = value;
        self
    }

    /// Checks all preconditions.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_indexes < 1 {
            return Err(CoreError::invalid_config(
                "the drop heuristic needs max_indexes of at least 1",
            ));
        }
        if self.log_index_history && self.max_indexes != 1 {
            return Err(CoreError::invalid_config(
                "log_index_history requires max_indexes = 1",
            ));
        }
        Ok(())
    }
}

/// Configuration for the extend algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtendConfig {
    /// Storage budget in megabytes.
    #[serde(rename = "budget_MB")]
    pub budget_mb: f64,

    /// Maximum number of columns per index.
    pub max_index_width: usize,

    /// A new configuration is accepted only if
    /// `cost * min_cost_improvement < current_cost`.
    pub min_cost_improvement: f64,
}

impl Default for ExtendConfig {
    fn default() -> Self {
        Self {
            budget_mb: DEFAULT_BUDGET_MB,
            max_index_width: DEFAULT_MAX_INDEX_WIDTH,
            min_cost_improvement: DEFAULT_MIN_COST_IMPROVEMENT,
        }
    }
}

impl ExtendConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage budget in megabytes.
    #[must_use]
    pub const fn budget_mb(mut self, value: f64) -> Self {
        self.budget_mb = value;
        self
    }

    /// Sets the maximum index width.
    #[must_use]
    pub const fn max_index_width(mut self, value: usize) -> Self {
        self.max_index_width = value;
        self
    }

    /// Sets the minimum relative cost improvement.
    #[must_use]
    pub const fn min_cost_improvement(mut self, value: f64) -> Self {
        self.min_cost_improvement = value;
        self
    }

    /// Returns the budget in bytes.
    #[must_use]
    pub fn budget_bytes(&self) -> u64 {
        mb_to_bytes(self.budget_mb)
    }

    /// Checks all preconditions.
    pub fn validate(&self) -> CoreResult<()> {
        validate_budget(self.budget_mb)?;
        validate_width(self.max_index_width)?;
        if self.min_cost_improvement.is_nan() || self.min_cost_improvement <= 1.0 {
            return Err(CoreError::invalid_config(format!(
                "min_cost_improvement must be greater than 1, got {}",
                self.min_cost_improvement
            )));
        }
        Ok(())
    }
}

/// A configuration transformation used by the relaxation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transformation {
    /// Replace two indexes sharing a prefix by the prefix and both remainders.
    Splitting,
    /// Replace two indexes of one table by their merge.
    Merging,
    /// Replace an index by one of its prefixes.
    Prefixing,
    /// Drop an index.
    Removal,
}

impl Transformation {
    /// All transformations, in default order.
    pub const ALL: [Transformation; 4] = [
        Transformation::Splitting,
        Transformation::Merging,
        Transformation::Prefixing,
        Transformation::Removal,
    ];

    /// Returns the configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Splitting => "splitting",
            Self::Merging => "merging",
            Self::Prefixing => "prefixing",
            Self::Removal => "removal",
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transformation {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::invalid_config(format!(
                    "unknown transformation {s:?}, expected one of splitting, merging, prefixing, removal"
                ))
            })
    }
}

/// Configuration for the relaxation algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelaxationConfig {
    /// Transformations the algorithm may apply.
    pub allowed_transformations: Vec<Transformation>,

    /// Storage budget in megabytes.
    #[serde(rename = "budget_MB")]
    pub budget_mb: f64,

    /// Maximum number of columns per index.
    pub max_index_width: usize,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            allowed_transformations: Transformation::ALL.to_vec(),
            budget_mb: DEFAULT_BUDGET_MB,
            max_index_width: DEFAULT_MAX_INDEX_WIDTH,
        }
    }
}

impl RelaxationConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the allowed transformations.
    #[must_use]
    pub fn allowed_transformations(mut self, value: impl IntoIterator<Item = Transformation>) -> Self {
        self.allowed_transformations = value.into_iter().collect();
        self
    }

    /// Sets the allowed transformations from their names.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::InvalidConfig`] on an unknown name.
    pub fn allowed_transformation_names<'a>(
        self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> CoreResult<Self> {
        let transformations = names
            .into_iter()
            .map(str::parse)
            .collect::<CoreResult<Vec<Transformation>>>()?;
        Ok(self.allowed_transformations(transformations))
    }

    /// Sets the storage budget in megabytes.
    #[must_use]
    pub fn budget_mb(mut self, value: f64) -> Self {
        self.budget_mb = value;
        self
    }

    /// Sets the maximum index width.
    #[must_use]
    pub fn max_index_width(mut self, value: usize) -> Self {
        self.max_index_width = value;
        self
    }

    /// Returns the budget in bytes.
    #[must_use]
    pub fn budget_bytes(&self) -> u64 {
        mb_to_bytes(self.budget_mb)
    }

    /// Returns the allowed transformations without duplicates, in configured order.
    #[must_use]
    pub fn transformations(&self) -> Vec<Transformation> {
        let mut seen = Vec::with_capacity(self.allowed_transformations.len());
        for transformation in &self.allowed_transformations {
            if !seen.contains(transformation) {
                seen.push(*transformation);
            }
        }
        seen
    }

    /// Checks all preconditions.
    pub fn validate(&self) -> CoreResult<()> {
        validate_budget(self.budget_mb)?;
        validate_width(self.max_index_width)
    }
}

/// Algorithm choice plus its options, as read from a configuration file:
/// `{"algorithm": "extend", "parameters": {"budget_MB": 100}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", content = "parameters", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    /// Backward elimination from all potential indexes.
    DropHeuristic(DropHeuristicConfig),
    /// Forward greedy growth under a storage budget.
    Extend(ExtendConfig),
    /// Transformation-based shrinking under a storage budget.
    Relaxation(RelaxationConfig),
}

impl AlgorithmConfig {
    /// Returns the algorithm name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DropHeuristic(_) => "drop_heuristic",
            Self::Extend(_) => "extend",
            Self::Relaxation(_) => "relaxation",
        }
    }

    /// Checks all preconditions of the selected algorithm.
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            Self::DropHeuristic(config) => config.validate(),
            Self::Extend(config) => config.validate(),
            Self::Relaxation(config) => config.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let drop = DropHeuristicConfig::default();
        assert_eq!(drop.max_indexes, 15);
        assert_eq!(drop.cost_estimation, CostEstimation::WhatIf);
        assert!(!drop.log_index_history);

        let extend = ExtendConfig::default();
        assert_eq!(extend.budget_bytes(), 500_000_000);
        assert_eq!(extend.max_index_width, 2);
        assert_eq!(extend.min_cost_improvement, 1.003);

        let relaxation = RelaxationConfig::default();
        assert_eq!(relaxation.transformations(), Transformation::ALL.to_vec());
        assert!(relaxation.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = ExtendConfig::new()
            .budget_mb(0.5)
            .max_index_width(3)
            .min_cost_improvement(1.1);
        assert_eq!(config.budget_bytes(), 500_000);
        assert_eq!(config.max_index_width, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn drop_preconditions() {
        assert!(DropHeuristicConfig::new().max_indexes(0).validate().is_err());
        assert!(DropHeuristicConfig::new()
            .log_index_history(true)
            .validate()
            .is_err());
        assert!(DropHeuristicConfig::new()
            .max_indexes(1)
            .log_index_history(true)
            .validate()
            .is_ok());
    }

    #[test]
    fn extend_preconditions() {
        assert!(ExtendConfig::new().budget_mb(0.0).validate().is_err());
        assert!(ExtendConfig::new().budget_mb(f64::NAN).validate().is_err());
        assert!(ExtendConfig::new().max_index_width(0).validate().is_err());
        assert!(ExtendConfig::new().min_cost_improvement(1.0).validate().is_err());
    }

    #[test]
    fn transformation_names() {
        assert_eq!("merging".parse::<Transformation>().unwrap(), Transformation::Merging);
        let err = "promotion".parse::<Transformation>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));

        let config = RelaxationConfig::new()
            .allowed_transformation_names(["removal", "prefixing", "removal"])
            .unwrap();
        assert_eq!(
            config.transformations(),
            vec![Transformation::Removal, Transformation::Prefixing]
        );
        assert!(RelaxationConfig::new()
            .allowed_transformation_names(["clustering"])
            .is_err());
    }

    #[test]
    fn partial_mapping_merges_over_defaults() {
        let config: ExtendConfig = serde_json::from_str(r#"{"budget_MB": 42}"#).unwrap();
        assert_eq!(config.budget_mb, 42.0);
        assert_eq!(config.max_index_width, DEFAULT_MAX_INDEX_WIDTH);

        let unknown = serde_json::from_str::<ExtendConfig>(r#"{"budget": 42}"#);
        assert!(unknown.is_err());

        let bad_name = serde_json::from_str::<RelaxationConfig>(
            r#"{"allowed_transformations": ["promotion"]}"#,
        );
        assert!(bad_name.is_err());
    }

    #[test]
    fn algorithm_config_is_tagged() {
        let config: AlgorithmConfig = serde_json::from_str(
            r#"{"algorithm": "drop_heuristic", "parameters": {"max_indexes": 3, "cost_estimation": "whatif"}}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            AlgorithmConfig::DropHeuristic(DropHeuristicConfig::new().max_indexes(3))
        );
        assert_eq!(config.name(), "drop_heuristic");

        let config: AlgorithmConfig =
            serde_json::from_str(r#"{"algorithm": "relaxation", "parameters": {}}"#).unwrap();
        assert_eq!(config, AlgorithmConfig::Relaxation(RelaxationConfig::default()));
    }
}
