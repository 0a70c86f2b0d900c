// src/vsearch.rs

use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::process::Command;

use ahash::AHashMap;
use thiserror::Error;

use crate::config::SearchParams;
use crate::diagnostics::Diagnostics;
use crate::error::{AmpliconError, Result};
use crate::fasta::open_input;
use crate::taxdb::ExpectedTaxa;
use crate::taxonomy::TaxonomyLineage;

/// Columns in a BLAST6-style tabular row.
pub const BLAST6_COLUMNS: usize = 12;

/// Title used for hits whose subject has no known lineage.
pub const UNKNOWN_TAXONOMY: &str = "Unknown";

/// Why a tabular row could not become an [`AlignmentHit`].
#[derive(Error, Debug, PartialEq)]
pub enum HitParseError {
    #[error("expected 12 columns, found {0}")]
    ColumnCount(usize),
    #[error("column '{column}' has unparseable value '{value}'")]
    BadNumber { column: &'static str, value: String },
}

/// One tabular alignment row with the subject's lineage attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentHit {
    pub query_id: String,
    pub subject_id: String,
    pub pident: f64,
    pub length: u32,
    pub mismatches: u32,
    pub gap_opens: u32,
    pub query_start: u32,
    pub query_end: u32,
    pub subject_start: u32,
    pub subject_end: u32,
    pub evalue: f64,
    pub bitscore: f64,
    /// `None` when the subject id has no known lineage
    pub taxonomy: Option<TaxonomyLineage>,
}

fn field<T: std::str::FromStr>(value: &str, column: &'static str) -> std::result::Result<T, HitParseError> {
    value.trim().parse().map_err(|_| HitParseError::BadNumber {
        column,
        value: value.to_string(),
    })
}

impl AlignmentHit {
    /// Build a hit from the 12 tabular fields, looking up the subject's
    /// lineage in `taxa`.
    pub fn from_fields(fields: &[&str], taxa: &ExpectedTaxa) -> std::result::Result<Self, HitParseError> {
        if fields.len() != BLAST6_COLUMNS {
            return Err(HitParseError::ColumnCount(fields.len()));
        }
        let subject_id = fields[1].to_string();
        Ok(Self {
            query_id: fields[0].to_string(),
            taxonomy: taxa.get(&subject_id).cloned(),
            subject_id,
            pident: field(fields[2], "pident")?,
            length: field(fields[3], "length")?,
            mismatches: field(fields[4], "mismatch")?,
            gap_opens: field(fields[5], "gapopen")?,
            query_start: field(fields[6], "qstart")?,
            query_end: field(fields[7], "qend")?,
            subject_start: field(fields[8], "sstart")?,
            subject_end: field(fields[9], "send")?,
            evalue: field(fields[10], "evalue")?,
            bitscore: field(fields[11], "bitscore")?,
        })
    }

    /// Lineage string of the subject, or `"Unknown"`.
    pub fn title(&self) -> &str {
        self.taxonomy
            .as_ref()
            .map(TaxonomyLineage::as_str)
            .unwrap_or(UNKNOWN_TAXONOMY)
    }

    /// Lower e-value wins, then higher identity, then longer alignment.
    pub fn is_better_than(&self, other: &AlignmentHit) -> bool {
        let key = |h: &AlignmentHit| (h.evalue, -h.pident, -(h.length as f64));
        key(self) < key(other)
    }
}

impl fmt::Display for AlignmentHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{:.2}\t{}\t{:.2e}\t{}",
            self.query_id,
            self.subject_id,
            self.pident,
            self.length,
            self.evalue,
            self.title()
        )
    }
}

/// First-seen hit per query id.
pub type BestHits = AHashMap<String, AlignmentHit>;

/// Keep the first row for each query id. The search tool lists rows best
/// first, so first-seen is taken as best without re-sorting. Rows that do
/// not have exactly 12 parseable columns are skipped with a warning.
pub fn select_best_hits<I, S>(lines: I, taxa: &ExpectedTaxa, diag: &dyn Diagnostics) -> BestHits
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut best = BestHits::default();
    for line in lines {
        let line = line.as_ref().trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != BLAST6_COLUMNS {
            diag.warn(&format!(
                "Skipping malformed VSEARCH line ({}): {}",
                HitParseError::ColumnCount(fields.len()),
                line.trim()
            ));
            continue;
        }
        if best.contains_key(fields[0]) {
            continue;
        }
        match AlignmentHit::from_fields(&fields, taxa) {
            Ok(hit) => {
                best.insert(hit.query_id.clone(), hit);
            }
            Err(e) => diag.warn(&format!("Skipping malformed VSEARCH line ({e}): {}", line.trim())),
        }
    }
    best
}

/// Parse a tabular results file into best hits per query.
pub fn parse_vsearch<P: AsRef<Path>>(
    tsv_path: P,
    taxa: &ExpectedTaxa,
    diag: &dyn Diagnostics,
) -> Result<BestHits> {
    let path = tsv_path.as_ref();
    diag.info(&format!("Parsing VSEARCH results from {}", path.display()));
    let reader = open_input(path)?;
    let mut read_error = None;
    let lines = reader
        .lines()
        .map_while(|line| line.map_err(|e| read_error = Some(e)).ok());
    let hits = select_best_hits(lines, taxa, diag);
    if let Some(e) = read_error {
        return Err(AmpliconError::io(path, e));
    }
    diag.info(&format!("Parsed {} top VSEARCH hits.", hits.len()));
    Ok(hits)
}

/// Whether the search actually ran or a previous artifact was reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Ran,
    Skipped,
}

/// Global-alignment search command for `query` against `db`, writing
/// tabular output to `tsv_out`.
pub fn search_command(params: &SearchParams, query: &Path, db: &Path, tsv_out: &Path) -> Command {
    let mut cmd = Command::new(&params.program);
    cmd.arg("--usearch_global").arg(query)
        .arg("--db").arg(db)
        .arg("--id").arg(params.identity.to_string())
        .arg("--strand").arg(&params.strand)
        .arg("--blast6out").arg(tsv_out)
        .arg("--threads").arg(params.threads.to_string());
    cmd
}

/// Run the search unless `tsv_out` already exists. Presence alone counts:
/// a stale or partial file from an earlier run is reused as is.
///
/// Blocks until the tool exits; a launch failure or non-zero exit is fatal.
pub fn run_vsearch_if_needed(
    params: &SearchParams,
    query: &Path,
    db: &Path,
    tsv_out: &Path,
    diag: &dyn Diagnostics,
) -> Result<SearchOutcome> {
    if tsv_out.exists() {
        diag.info(&format!("VSEARCH output {} found, skipping VSEARCH run.", tsv_out.display()));
        return Ok(SearchOutcome::Skipped);
    }

    diag.info(&format!(
        "Running {} with {} against DB {}",
        params.program,
        query.display(),
        db.display()
    ));
    let output = search_command(params, query, db, tsv_out)
        .output()
        .map_err(|source| {
            diag.error(&format!("Could not launch {}: {source}", params.program));
            AmpliconError::SearchToolSpawn { tool: params.program.clone(), source }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        diag.error(&format!("{} failed with {}: {stderr}", params.program, output.status));
        return Err(AmpliconError::SearchToolFailed {
            tool: params.program.clone(),
            status: output.status,
            stderr,
        });
    }

    diag.info("VSEARCH finished successfully.");
    Ok(SearchOutcome::Ran)
}
