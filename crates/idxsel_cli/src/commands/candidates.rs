//! Candidates command implementation.

use crate::input::load_workload;
use idxsel_core::{candidates_per_query, syntactically_relevant_indexes, Workload};
use serde::Serialize;
use std::path::Path;

/// Candidates of one query.
#[derive(Debug, Serialize)]
pub struct QueryCandidates {
    /// Query ID.
    pub query: u32,
    /// Candidate indexes in generation order.
    pub candidates: Vec<String>,
}

/// Runs the candidates command.
pub fn run(
    workload_path: &Path,
    max_index_width: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if max_index_width < 1 {
        return Err("max-index-width must be at least 1".into());
    }
    let input = load_workload(workload_path)?;
    let result = candidates(&input.workload, max_index_width);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            let total: usize = result.iter().map(|q| q.candidates.len()).sum();
            for query in &result {
                println!("Q{} ({} candidates)", query.query, query.candidates.len());
                for candidate in &query.candidates {
                    println!("  {candidate}");
                }
            }
            println!();
            println!("Total: {total} candidates for {} queries", result.len());
        }
    }

    Ok(())
}

/// Generates the syntactically relevant candidates of every query.
pub fn candidates(workload: &Workload, max_index_width: usize) -> Vec<QueryCandidates> {
    let per_query = candidates_per_query(workload, max_index_width, syntactically_relevant_indexes);
    workload
        .queries()
        .iter()
        .zip(per_query)
        .map(|(query, candidates)| QueryCandidates {
            query: query.id().as_u32(),
            candidates: candidates.iter().map(ToString::to_string).collect(),
        })
        .collect()
}
