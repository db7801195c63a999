//! Recommend command implementation.

use crate::input::{load_config, load_workload, WorkloadInput};
use idxsel_core::config::bytes_to_mb;
use idxsel_core::{
    build_algorithm, AlgorithmConfig, AnalyticBackend, CostEvaluation, DropHeuristicAlgorithm,
    EvaluationStats, Index, SelectionAlgorithm, SizeCache,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// One recommended index.
#[derive(Debug, Serialize)]
pub struct RecommendedIndex {
    /// Display form, `I(table.a,table.b)`.
    pub index: String,
    /// Table name.
    pub table: String,
    /// Column names in key order.
    pub columns: Vec<String>,
    /// Estimated size in bytes.
    pub size_bytes: u64,
}

/// Recommendation result.
#[derive(Debug, Serialize)]
pub struct RecommendResult {
    /// Algorithm name.
    pub algorithm: &'static str,
    /// Selected indexes, in canonical order.
    pub indexes: Vec<RecommendedIndex>,
    /// Total estimated size in bytes.
    pub total_size_bytes: u64,
    /// Workload cost without any index.
    pub initial_cost: f64,
    /// Workload cost with the selected indexes.
    pub final_cost: f64,
    /// Oracle calls made by the algorithm.
    pub stats: EvaluationStats,
}

/// Runs the recommend command.
pub fn run(
    workload_path: &Path,
    config_path: &Path,
    format: &str,
    history_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = load_workload(workload_path)?;
    let config = load_config(config_path)?;
    info!(
        "Loaded {} queries over {} tables",
        input.workload.len(),
        input.statistics.tables.len()
    );

    let result = recommend(&input, config, history_path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Runs the configured algorithm against the analytic backend.
///
/// With `history_path`, the drop heuristic's removal order is written there
/// as JSON; this requires `log_index_history`.
pub fn recommend(
    input: &WorkloadInput,
    config: AlgorithmConfig,
    history_path: Option<&Path>,
) -> Result<RecommendResult, Box<dyn std::error::Error>> {
    let sizes = SizeCache::new();
    let evaluation = CostEvaluation::with_size_cache(
        AnalyticBackend::new(input.statistics.clone()),
        sizes.clone(),
    );
    let algorithm_name = config.name();

    let (mut indexes, stats) = match config {
        AlgorithmConfig::DropHeuristic(config) if history_path.is_some() => {
            if !config.log_index_history {
                return Err("--history requires log_index_history in the configuration".into());
            }
            let mut algorithm = DropHeuristicAlgorithm::new(evaluation, config)?;
            let indexes = algorithm.best_indexes(&input.workload)?;
            if let Some(path) = history_path {
                let history: Vec<String> =
                    algorithm.drop_history().iter().map(ToString::to_string).collect();
                fs::write(path, serde_json::to_string_pretty(&history)?)?;
                info!("Wrote drop history to {:?}", path);
            }
            (indexes, algorithm.evaluation_stats())
        }
        _ if history_path.is_some() => {
            return Err("--history is only supported by drop_heuristic".into());
        }
        config => {
            let mut algorithm = build_algorithm(config, evaluation)?;
            let indexes = algorithm.best_indexes(&input.workload)?;
            (indexes, algorithm.evaluation_stats())
        }
    };
    indexes.sort();

    // sizes are already cached; costs come from a fresh evaluation
    let mut scoring = CostEvaluation::with_size_cache(
        AnalyticBackend::new(input.statistics.clone()),
        sizes,
    );
    let initial_cost = scoring.estimate_cost(&input.workload, std::iter::empty(), false)?;
    let final_cost = scoring.estimate_cost(&input.workload, &indexes, true)?;

    let mut recommended = Vec::with_capacity(indexes.len());
    for index in &indexes {
        recommended.push(describe(index, scoring.estimate_size(index)?));
    }

    Ok(RecommendResult {
        algorithm: algorithm_name,
        total_size_bytes: recommended.iter().map(|index| index.size_bytes).sum(),
        indexes: recommended,
        initial_cost,
        final_cost,
        stats,
    })
}

fn describe(index: &Index, size_bytes: u64) -> RecommendedIndex {
    RecommendedIndex {
        index: index.to_string(),
        table: index.table().to_string(),
        columns: index
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect(),
        size_bytes,
    }
}

fn print_text_output(result: &RecommendResult) {
    println!("Index Recommendation ({})", result.algorithm);
    println!("================================");
    for index in &result.indexes {
        println!("  {:<40} {:>10.2} MB", index.index, bytes_to_mb(index.size_bytes));
    }
    if result.indexes.is_empty() {
        println!("  (no index recommended)");
    }
    println!();
    println!("Total size:    {:.2} MB", bytes_to_mb(result.total_size_bytes));
    println!("Initial cost:  {:.2}", result.initial_cost);
    println!("Final cost:    {:.2}", result.final_cost);
    if result.initial_cost > 0.0 {
        println!(
            "Improvement:   {:.2}%",
            (1.0 - result.final_cost / result.initial_cost) * 100.0
        );
    }
    println!();
    println!(
        "Cost requests: {} ({} cache hits, {:.1}%)",
        result.stats.cost_requests,
        result.stats.cache_hits,
        result.stats.cache_hit_ratio() * 100.0
    );
    println!("Size requests: {}", result.stats.size_requests);
}
