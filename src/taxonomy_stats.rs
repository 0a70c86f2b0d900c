// src/taxonomy_stats.rs

use indexmap::IndexMap;

use crate::diagnostics::Diagnostics;
use crate::types::{SummaryRow, TaxonomyStatsRow};

/// Per-node counters for one lineage prefix:
///   - how many summary rows pass through the node
///   - how many of those amplify / are differentiable
///   - how often each deepest-rank label occurs
#[derive(Default, Debug, Clone, PartialEq)]
pub struct TaxonomyNodeStats {
    pub entries: u64,
    pub amplifies: u64,
    pub differentiable: u64,
    /// Deepest-rank label -> count, first-seen order
    pub ranks: IndexMap<&'static str, u64>,
}

impl TaxonomyNodeStats {
    /// Fold one summary row into this node.
    pub fn record(&mut self, row: &SummaryRow) {
        self.entries += 1;
        self.amplifies += u64::from(row.amplifies);
        self.differentiable += u64::from(row.differentiable);
        *self.ranks.entry(row.rank_label()).or_default() += 1;
    }

    /// `"{rank} ({count})"` for every label seen at this node.
    pub fn rank_summary(&self) -> Vec<String> {
        self.ranks
            .iter()
            .map(|(rank, count)| format!("{rank} ({count})"))
            .collect()
    }
}

/// Prefix string -> stats, in first-seen order.
pub type TaxonomyTree = IndexMap<String, TaxonomyNodeStats>;

/// Every prefix of a lineage string, shallowest first:
/// `A;B;C` -> `A`, `A;B`, `A;B;C`. Fields are trimmed.
pub fn lineage_prefixes(lineage: &str) -> Vec<String> {
    if lineage.trim().is_empty() {
        return Vec::new();
    }
    let fields: Vec<&str> = lineage.split(';').map(str::trim).collect();
    (1..=fields.len()).map(|i| fields[..i].join(";")).collect()
}

/// Roll every row up into each prefix of its expected lineage.
pub fn accumulate_taxonomy_stats(rows: &[SummaryRow]) -> TaxonomyTree {
    let mut tree = TaxonomyTree::new();
    for row in rows {
        for node in lineage_prefixes(row.expected_taxonomy.as_str()) {
            tree.entry(node).or_default().record(row);
        }
    }
    tree
}

/// Flatten the tree into report rows.
pub fn taxonomy_stats_rows(tree: &TaxonomyTree) -> Vec<TaxonomyStatsRow> {
    tree.iter()
        .map(|(node, stats)| TaxonomyStatsRow {
            taxonomy: node.clone(),
            level: node.split(';').count(),
            entries: stats.entries,
            amplifies: stats.amplifies,
            differentiable: stats.differentiable,
            rank_summary: stats.rank_summary(),
        })
        .collect()
}

/// The full aggregation step:
///  1) accumulate_taxonomy_stats
///  2) taxonomy_stats_rows
pub fn build_taxonomy_stats(rows: &[SummaryRow], diag: &dyn Diagnostics) -> Vec<TaxonomyStatsRow> {
    diag.info(&format!("Calculating taxonomy stats over {} summary rows", rows.len()));
    let tree = accumulate_taxonomy_stats(rows);
    let stats = taxonomy_stats_rows(&tree);
    diag.info(&format!("Aggregated {} taxonomy nodes.", stats.len()));
    stats
}
