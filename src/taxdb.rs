//src/taxdb.rs

use std::io::BufRead;
use std::path::Path;

use indexmap::IndexMap;

use crate::diagnostics::Diagnostics;
use crate::error::{AmpliconError, Result};
use crate::fasta::open_input;
use crate::taxonomy::TaxonomyLineage;

/// Lineages dropped entirely when loading expected taxa.
pub const EXCLUDED_LINEAGE_MARKER: &str = "Eukaryota";

/// Expected lineage per sequence id, in file order.
pub type ExpectedTaxa = IndexMap<String, TaxonomyLineage>;

/// Parses an expected-taxonomy file in the format:
/// ```text
/// <id> <lineage>
/// ```
/// The first run of whitespace separates id from lineage; a leading `>` on
/// the id is removed. Lines without a lineage are skipped with a warning,
/// and any lineage mentioning Eukaryota is dropped.
pub fn parse_expected_taxonomy<R: BufRead>(
    reader: R,
    diag: &dyn Diagnostics,
) -> std::io::Result<ExpectedTaxa> {
    let mut expected = ExpectedTaxa::new();
    let mut excluded = 0usize;

    for (line_no, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_id, lineage)) = line.split_once(char::is_whitespace) else {
            diag.warn(&format!("Skipping taxonomy line {} with no lineage: {line}", line_no + 1));
            continue;
        };
        let seq_id = raw_id.replace('>', "");
        let lineage = lineage.trim();
        if seq_id.is_empty() || lineage.is_empty() {
            diag.warn(&format!("Skipping malformed taxonomy line {}: {line}", line_no + 1));
            continue;
        }

        if lineage.contains(EXCLUDED_LINEAGE_MARKER) {
            excluded += 1;
            continue;
        }

        let parsed = TaxonomyLineage::parse(lineage);
        if parsed.extra_fields() > 0 {
            diag.warn(&format!(
                "Lineage for {seq_id} has {} fields; only the first 7 are compared: {lineage}",
                parsed.depth()
            ));
        }
        expected.insert(seq_id, parsed);
    }

    if excluded > 0 {
        diag.debug(&format!("Dropped {excluded} {EXCLUDED_LINEAGE_MARKER} entries"));
    }
    Ok(expected)
}

/// Load expected taxa from disk (plain or `.gz`). A missing file is fatal.
pub fn load_expected_taxonomy<P: AsRef<Path>>(
    path: P,
    diag: &dyn Diagnostics,
) -> Result<ExpectedTaxa> {
    let path = path.as_ref();
    diag.info(&format!("Loading expected taxonomy from {}", path.display()));
    let reader = open_input(path)?;
    let expected = parse_expected_taxonomy(reader, diag).map_err(|e| AmpliconError::io(path, e))?;
    diag.info(&format!("Loaded {} expected taxonomy entries.", expected.len()));
    Ok(expected)
}
