// src/amplicons.rs

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::{AmpliconError, Result};
use crate::fasta::open_input;

/// One predicted amplicon from the in-silico PCR step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmpliconRecord {
    /// Raw id as reported, possibly with a `:start-end` suffix
    pub sequence_id: String,
    pub seq: String,
}

impl AmpliconRecord {
    /// Id up to the first `:`.
    pub fn canonical_id(&self) -> &str {
        self.sequence_id.split(':').next().unwrap_or(&self.sequence_id)
    }
}

/// Amplicons keyed by canonical id, in file order.
pub type Amplicons = IndexMap<String, AmpliconRecord>;

/// Key a list of records by canonical id. A later duplicate replaces the
/// earlier record but keeps its position.
pub fn index_amplicons(records: Vec<AmpliconRecord>) -> Amplicons {
    let mut amplicons = Amplicons::with_capacity(records.len());
    for rec in records {
        amplicons.insert(rec.canonical_id().to_string(), rec);
    }
    amplicons
}

/// Load the amplicon JSON array (objects with at least `sequence_id` and
/// `seq`; other fields are ignored).
pub fn load_amplicons<P: AsRef<Path>>(path: P, diag: &dyn Diagnostics) -> Result<Amplicons> {
    let path = path.as_ref();
    diag.info(&format!("Loading amplicon JSON from {}", path.display()));

    let reader = open_input(path)?;
    let records: Vec<AmpliconRecord> =
        serde_json::from_reader(reader).map_err(|e| AmpliconError::json(path, e))?;
    let total = records.len();
    let amplicons = index_amplicons(records);

    if amplicons.len() < total {
        diag.debug(&format!(
            "{} amplicon records shared an id with an earlier record",
            total - amplicons.len()
        ));
    }
    diag.info(&format!("Loaded {} amplicon entries.", amplicons.len()));
    Ok(amplicons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemoryDiagnostics;

    #[test]
    fn keys_by_id_before_colon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipcr.json");
        std::fs::write(
            &path,
            r#"[
                {"sequence_id": "AB001:10-250", "seq": "ACGT", "primer": "27F"},
                {"sequence_id": "AB002", "seq": "GGCC"}
            ]"#,
        )
        .unwrap();

        let amplicons = load_amplicons(&path, &MemoryDiagnostics::new()).unwrap();
        let keys: Vec<&str> = amplicons.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["AB001", "AB002"]);
        assert_eq!(amplicons["AB001"].seq, "ACGT");
    }

    #[test]
    fn later_duplicate_wins() {
        let recs = vec![
            AmpliconRecord { sequence_id: "X:1-5".into(), seq: "AAAA".into() },
            AmpliconRecord { sequence_id: "Y".into(), seq: "CCCC".into() },
            AmpliconRecord { sequence_id: "X:7-9".into(), seq: "TTTT".into() },
        ];
        let amplicons = index_amplicons(recs);
        assert_eq!(amplicons.len(), 2);
        assert_eq!(amplicons.get_index(0).unwrap().0, "X");
        assert_eq!(amplicons["X"].seq, "TTTT");
    }

    #[test]
    fn missing_seq_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"[{"sequence_id": "A"}]"#).unwrap();

        let err = load_amplicons(&path, &MemoryDiagnostics::new()).unwrap_err();
        assert!(matches!(err, AmpliconError::Json { .. }));
    }
}
