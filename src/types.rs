//src/types.rs

use serde::{Deserialize, Serialize};

use crate::lineage::MatchRank;
use crate::taxonomy::TaxonomyLineage;

/// Outcome for one expected taxon.
///
/// `differentiable` is only ever true together with a species-level
/// `deepest_rank`. The hit fields are `None` when nothing amplified or no hit
/// with known taxonomy was found. Serialized field names follow the summary
/// file columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub sequence_id: String,
    pub expected_taxonomy: TaxonomyLineage,
    pub amplifies: bool,
    pub differentiable: bool,
    pub deepest_rank: Option<MatchRank>,
    #[serde(rename = "top_vsearch_taxonomy")]
    pub top_hit_taxonomy: Option<TaxonomyLineage>,
    #[serde(rename = "top_vsearch_pident")]
    pub top_hit_pident: Option<f64>,
    #[serde(rename = "top_vsearch_sseqid")]
    pub top_hit_subject_id: Option<String>,
}

impl SummaryRow {
    /// A row with every outcome negative.
    pub fn new(sequence_id: impl Into<String>, expected_taxonomy: TaxonomyLineage) -> Self {
        Self {
            sequence_id: sequence_id.into(),
            expected_taxonomy,
            amplifies: false,
            differentiable: false,
            deepest_rank: None,
            top_hit_taxonomy: None,
            top_hit_pident: None,
            top_hit_subject_id: None,
        }
    }

    /// Rank label for reporting; rows never compared count as `"none"`.
    pub fn rank_label(&self) -> &'static str {
        self.deepest_rank.unwrap_or(MatchRank::Unmatched).label()
    }
}

/// Aggregated counters for one lineage prefix, as written to the stats file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyStatsRow {
    /// Semicolon-joined prefix, e.g. `Bacteria;Proteobacteria`
    #[serde(rename = "Taxonomy")]
    pub taxonomy: String,
    /// Number of fields in the prefix
    #[serde(rename = "Level")]
    pub level: usize,
    #[serde(rename = "Entries")]
    pub entries: u64,
    #[serde(rename = "Amplifies")]
    pub amplifies: u64,
    #[serde(rename = "Differentiable")]
    pub differentiable: u64,
    /// `"{rank} ({count})"` per deepest-rank label, first-seen order
    #[serde(rename = "Rank Summary")]
    pub rank_summary: Vec<String>,
}

impl TaxonomyStatsRow {
    /// Prefix split back into its fields.
    pub fn taxonomy_fields(&self) -> Vec<String> {
        self.taxonomy.split(';').map(str::to_string).collect()
    }
}
