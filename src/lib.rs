// src/lib.rs
pub mod types;
pub mod error;
pub mod diagnostics;
pub mod config;
pub mod taxonomy;
pub mod lineage;
pub mod taxdb;
pub mod amplicons;
pub mod fasta;
pub mod vsearch;
pub mod summary;
pub mod taxonomy_stats;
pub mod report;
pub mod selection;

use std::fmt::Write as FmtWrite;
use std::path::Path;

use crate::amplicons::load_amplicons;
use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::fasta::write_fasta_if_needed;
use crate::report::{read_summary_csv, write_summary_csv, write_summary_jsonl, write_taxonomy_stats_csv};
use crate::summary::build_summary;
use crate::taxdb::load_expected_taxonomy;
use crate::taxonomy_stats::build_taxonomy_stats;
use crate::types::{SummaryRow, TaxonomyStatsRow};
use crate::vsearch::{parse_vsearch, run_vsearch_if_needed, SearchOutcome};

/// Everything one pipeline run produced.
pub struct PipelineResults {
    /// One row per expected taxon, in expected-taxonomy file order
    pub summary_rows: Vec<SummaryRow>,
    /// One row per lineage prefix
    pub stats_rows: Vec<TaxonomyStatsRow>,
    /// Whether the query FASTA was written this run
    pub fasta_written: bool,
    pub search: SearchOutcome,
}

impl PipelineResults {
    pub fn amplifying(&self) -> usize {
        self.summary_rows.iter().filter(|r| r.amplifies).count()
    }

    pub fn differentiable(&self) -> usize {
        self.summary_rows.iter().filter(|r| r.differentiable).count()
    }

    /// Short human-readable recap of the run
    pub fn get_overview(&self) -> String {
        let mut output = String::new();
        let total = self.summary_rows.len();
        writeln!(output, "expected taxa:\t{total}").unwrap();
        writeln!(output, "amplifying:\t{}", self.amplifying()).unwrap();
        writeln!(output, "differentiable:\t{}", self.differentiable()).unwrap();
        writeln!(output, "taxonomy nodes:\t{}", self.stats_rows.len()).unwrap();
        output
    }
}

/// Run every stage in order:
///  1. load expected taxonomy and amplicons
///  2. write the query FASTA (unless present)
///  3. run the similarity search (unless its output is present)
///  4. pick best hits and build the summary
///  5. write summary JSONL + CSV
///  6. aggregate and write taxonomy stats
///
/// Any I/O failure or search-tool failure aborts the run.
pub fn run_pipeline(config: &PipelineConfig, diag: &dyn Diagnostics) -> Result<PipelineResults> {
    diag.info("Pipeline started.");

    let expected = load_expected_taxonomy(&config.expected_taxonomy, diag)?;
    let amplicons = load_amplicons(&config.amplicons, diag)?;

    let fasta_written = write_fasta_if_needed(&amplicons, &config.query_fasta, diag)?;
    let search = run_vsearch_if_needed(
        &config.search,
        &config.query_fasta,
        &config.database,
        &config.search_tsv,
        diag,
    )?;
    let hits = parse_vsearch(&config.search_tsv, &expected, diag)?;

    let summary_rows = build_summary(&expected, &amplicons, &hits, diag);
    diag.info(&format!(
        "Saving summary to {} and {}",
        config.summary_jsonl.display(),
        config.summary_csv.display()
    ));
    write_summary_jsonl(&summary_rows, &config.summary_jsonl)?;
    write_summary_csv(&summary_rows, &config.summary_csv)?;

    let stats_rows = build_taxonomy_stats(&summary_rows, diag);
    write_taxonomy_stats_csv(&stats_rows, &config.taxonomy_stats_csv)?;
    diag.info(&format!("Taxonomy stats saved to {}", config.taxonomy_stats_csv.display()));

    diag.info("Pipeline finished successfully.");
    Ok(PipelineResults {
        summary_rows,
        stats_rows,
        fasta_written,
        search,
    })
}

/// Recompute taxonomy stats from a saved summary CSV and write them out.
pub fn stats_from_summary_csv(
    summary_csv: &Path,
    stats_csv: &Path,
    diag: &dyn Diagnostics,
) -> Result<Vec<TaxonomyStatsRow>> {
    diag.info(&format!("Calculating taxonomy stats from {}", summary_csv.display()));
    let rows = read_summary_csv(summary_csv, diag)?;
    let stats = build_taxonomy_stats(&rows, diag);
    write_taxonomy_stats_csv(&stats, stats_csv)?;
    diag.info(&format!("Taxonomy stats saved to {}", stats_csv.display()));
    Ok(stats)
}
