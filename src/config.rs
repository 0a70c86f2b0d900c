// src/config.rs

use std::path::{Path, PathBuf};

/// Parameters for the external similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Executable name or path
    pub program: String,
    /// Minimum identity as a fraction (0.97 = 97%)
    pub identity: f64,
    /// `plus` or `both`
    pub strand: String,
    /// Worker threads handed to the tool
    pub threads: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            program: "vsearch".to_string(),
            identity: 0.97,
            strand: "both".to_string(),
            threads: 24,
        }
    }
}

/// Every input and output location the pipeline touches.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Reference database (FASTA) searched against
    pub database: PathBuf,
    /// `<id> <lineage>` per line
    pub expected_taxonomy: PathBuf,
    /// In-silico PCR results (JSON array)
    pub amplicons: PathBuf,
    pub query_fasta: PathBuf,
    pub search_tsv: PathBuf,
    pub summary_jsonl: PathBuf,
    pub summary_csv: PathBuf,
    pub taxonomy_stats_csv: PathBuf,
    pub search: SearchParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("db/SILVA.fna"),
            expected_taxonomy: PathBuf::from("taxonomy.results.txt"),
            amplicons: PathBuf::from("ipcr.results.json"),
            query_fasta: PathBuf::from("all_amplicons.fasta"),
            search_tsv: PathBuf::from("all_amplicons.vsearch.tsv"),
            summary_jsonl: PathBuf::from("differentiation_summary.vsearch.jsonl"),
            summary_csv: PathBuf::from("differentiation_summary.vsearch.csv"),
            taxonomy_stats_csv: PathBuf::from("taxonomy_summary.csv"),
            search: SearchParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Re-root every relative path under `dir`. Absolute paths are left alone.
    pub fn with_workdir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        let dir = dir.as_ref();
        for path in [
            &mut self.database,
            &mut self.expected_taxonomy,
            &mut self.amplicons,
            &mut self.query_fasta,
            &mut self.search_tsv,
            &mut self.summary_jsonl,
            &mut self.summary_csv,
            &mut self.taxonomy_stats_csv,
        ] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
        self
    }
}
