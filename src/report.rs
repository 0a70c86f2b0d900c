// src/report.rs

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::error::{AmpliconError, Result};
use crate::fasta::open_input;
use crate::lineage::MatchRank;
use crate::taxonomy::TaxonomyLineage;
use crate::types::{SummaryRow, TaxonomyStatsRow};

/// Column order of the summary CSV.
pub const SUMMARY_CSV_FIELDS: [&str; 8] = [
    "sequence_id",
    "expected_taxonomy",
    "amplifies",
    "differentiable",
    "deepest_rank",
    "top_vsearch_taxonomy",
    "top_vsearch_pident",
    "top_vsearch_sseqid",
];

/// Column order of the taxonomy stats CSV.
pub const STATS_CSV_FIELDS: [&str; 6] = [
    "Taxonomy",
    "Level",
    "Entries",
    "Amplifies",
    "Differentiable",
    "Rank Summary",
];

/// Text form of a boolean in CSV output.
pub fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Accepts the spellings different tools use for booleans; `None` for
/// anything else.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "true" | "TRUE" | "1" => Some(true),
        "False" | "false" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

/// `['species (2)', 'none (1)']`
pub fn format_rank_summary(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{s}'")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Inverse of [`format_rank_summary`].
pub fn parse_rank_summary(value: &str) -> Vec<String> {
    let inner = value.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AmpliconError::io(path, e))
}

/// One JSON object per line.
pub fn write_summary_jsonl<P: AsRef<Path>>(rows: &[SummaryRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut out = create(path)?;
    for row in rows {
        serde_json::to_writer(&mut out, row).map_err(|e| AmpliconError::json(path, e))?;
        out.write_all(b"\n").map_err(|e| AmpliconError::io(path, e))?;
    }
    out.flush().map_err(|e| AmpliconError::io(path, e))
}

pub fn read_summary_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<SummaryRow>> {
    let path = path.as_ref();
    let mut rows = Vec::new();
    for line in open_input(path)?.lines() {
        let line = line.map_err(|e| AmpliconError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line).map_err(|e| AmpliconError::json(path, e))?);
    }
    Ok(rows)
}

pub fn write_summary_csv<P: AsRef<Path>>(rows: &[SummaryRow], path: P) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    wtr.write_record(SUMMARY_CSV_FIELDS)?;
    for row in rows {
        let pident = row.top_hit_pident.map(|p| p.to_string()).unwrap_or_default();
        wtr.write_record([
            row.sequence_id.as_str(),
            row.expected_taxonomy.as_str(),
            format_bool(row.amplifies),
            format_bool(row.differentiable),
            row.deepest_rank.map(MatchRank::label).unwrap_or(""),
            row.top_hit_taxonomy.as_ref().map(TaxonomyLineage::as_str).unwrap_or(""),
            pident.as_str(),
            row.top_hit_subject_id.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush().map_err(|e| AmpliconError::io(path.as_ref(), e))
}

fn column_indices<const N: usize>(
    headers: &csv::StringRecord,
    names: [&str; N],
    path: &Path,
) -> Result<[usize; N]> {
    let mut idx = [0usize; N];
    for (slot, name) in idx.iter_mut().zip(names) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| AmpliconError::MissingField {
                path: path.to_path_buf(),
                field: name.to_string(),
            })?;
    }
    Ok(idx)
}

fn non_empty(value: &str) -> Option<&str> {
    let v = value.trim();
    (!v.is_empty()).then_some(v)
}

/// Reload a summary CSV. Boolean text is converted back to `bool`.
/// Unrecognised booleans (read as false), identities and rank labels
/// (read as absent) are reported as warnings.
pub fn read_summary_csv<P: AsRef<Path>>(path: P, diag: &dyn Diagnostics) -> Result<Vec<SummaryRow>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_reader(open_input(path)?);
    let idx = column_indices(rdr.headers()?, SUMMARY_CSV_FIELDS, path)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let rec = record?;
        let get = |i: usize| rec.get(idx[i]).unwrap_or("");

        let mut row = SummaryRow::new(get(0), TaxonomyLineage::parse(get(1)));
        let flag = |i: usize| {
            parse_bool(get(i)).unwrap_or_else(|| {
                diag.warn(&format!(
                    "Unrecognised {} value '{}' for {}, reading as False",
                    SUMMARY_CSV_FIELDS[i],
                    get(i),
                    get(0)
                ));
                false
            })
        };
        row.amplifies = flag(2);
        row.differentiable = flag(3);
        row.deepest_rank = non_empty(get(4)).and_then(|label| {
            let rank = MatchRank::from_label(label);
            if rank.is_none() {
                diag.warn(&format!("Unknown rank '{label}' for {}", row.sequence_id));
            }
            rank
        });
        row.top_hit_taxonomy = non_empty(get(5)).map(TaxonomyLineage::parse);
        row.top_hit_pident = non_empty(get(6)).and_then(|p| match p.parse() {
            Ok(pident) => Some(pident),
            Err(_) => {
                diag.warn(&format!("Unparseable identity '{p}' for {}", row.sequence_id));
                None
            }
        });
        row.top_hit_subject_id = non_empty(get(7)).map(str::to_string);
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_taxonomy_stats_csv<P: AsRef<Path>>(rows: &[TaxonomyStatsRow], path: P) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    wtr.write_record(STATS_CSV_FIELDS)?;
    for row in rows {
        wtr.write_record([
            row.taxonomy.clone(),
            row.level.to_string(),
            row.entries.to_string(),
            row.amplifies.to_string(),
            row.differentiable.to_string(),
            format_rank_summary(&row.rank_summary),
        ])?;
    }
    wtr.flush().map_err(|e| AmpliconError::io(path.as_ref(), e))
}

/// Reload a taxonomy stats CSV, parsing the list-valued rank summary.
/// Rows with an unparseable count are reported and skipped.
pub fn read_taxonomy_stats_csv<P: AsRef<Path>>(path: P, diag: &dyn Diagnostics) -> Result<Vec<TaxonomyStatsRow>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_reader(open_input(path)?);
    let idx = column_indices(rdr.headers()?, STATS_CSV_FIELDS, path)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let rec = record?;
        let get = |i: usize| rec.get(idx[i]).unwrap_or("").trim();
        let taxonomy = get(0).to_string();

        let mut counts = [0u64; 3];
        let mut bad = None;
        for (slot, i) in counts.iter_mut().zip(2..5) {
            match get(i).parse::<u64>() {
                Ok(n) => *slot = n,
                Err(_) => {
                    bad = Some(i);
                    break;
                }
            }
        }
        if let Some(i) = bad {
            diag.warn(&format!(
                "Skipping stats row for '{taxonomy}': {} has unparseable value '{}'",
                STATS_CSV_FIELDS[i],
                get(i)
            ));
            continue;
        }
        let [entries, amplifies, differentiable] = counts;

        rows.push(TaxonomyStatsRow {
            level: get(1).parse().unwrap_or_else(|_| taxonomy.split(';').count()),
            taxonomy,
            entries,
            amplifies,
            differentiable,
            rank_summary: parse_rank_summary(get(5)),
        });
    }
    Ok(rows)
}
