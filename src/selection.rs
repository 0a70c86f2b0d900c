// src/selection.rs

use std::sync::OnceLock;

use ahash::AHashMap;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::taxonomy::RANK_COUNT;
use crate::types::TaxonomyStatsRow;

/// Species epithets that mark placeholder rather than real species.
const PLACEHOLDER_EPITHETS: [&str; 4] = ["sp", "bacterium", "metagenome", "uncultured"];

fn species_tail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r";([A-Z][A-Za-z0-9_-]+);([A-Z][A-Za-z0-9_-]+ [a-z][A-Za-z0-9_-]+)$")
            .expect("species pattern is valid")
    })
}

/// True when a lineage ends in `...;Genus;Genus epithet` with a matching
/// genus and an epithet that is not a placeholder such as `sp.` or
/// `uncultured`.
pub fn is_real_species(taxonomy: &str) -> bool {
    let Some(caps) = species_tail().captures(taxonomy) else {
        return false;
    };
    let genus_field = &caps[1];
    let Some((genus, epithet)) = caps[2].split_once(' ') else {
        return false;
    };
    genus_field == genus && !PLACEHOLDER_EPITHETS.iter().any(|p| epithet.starts_with(p))
}

/// Rows whose taxonomy contains `query` (case-insensitive; empty matches
/// everything). Species-level rows are kept only for real species.
pub fn filter_stats<'a>(rows: &'a [TaxonomyStatsRow], query: &str) -> Vec<&'a TaxonomyStatsRow> {
    let needle = query.trim().to_lowercase();
    rows.iter()
        .filter(|r| needle.is_empty() || r.taxonomy.to_lowercase().contains(&needle))
        .filter(|r| r.level != RANK_COUNT || is_real_species(&r.taxonomy))
        .collect()
}

/// Stable hex digest identifying a taxonomy selection, suitable for sharing
/// in a link. SHA-256, so links built from SHA-1 selection digests do not
/// resolve here.
pub fn selection_hash<S: AsRef<str>>(fields: &[S]) -> String {
    let joined = fields.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(";");
    hex::encode(Sha256::digest(joined.as_bytes()))
}

/// Map shared hashes back to their taxonomy field lists. Unknown hashes are
/// dropped; order follows `hashes`.
pub fn resolve_selection<S: AsRef<str>>(hashes: &[S], rows: &[TaxonomyStatsRow]) -> Vec<Vec<String>> {
    let by_hash: AHashMap<String, Vec<String>> = rows
        .iter()
        .map(|r| {
            let fields = r.taxonomy_fields();
            (selection_hash(&fields), fields)
        })
        .collect();
    hashes
        .iter()
        .filter_map(|h| {
            let h: &str = h.as_ref();
            by_hash.get(h).cloned()
        })
        .collect()
}

/// One line of the selected-taxa table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionDetail {
    pub taxonomy: String,
    /// `"n (p%)"` of entries, empty when there are no entries
    pub amplifies: String,
    /// `"n (p%)"` of amplifying entries, empty when nothing amplifies
    pub differentiable: String,
    pub rank_summary: Vec<String>,
}

fn count_with_share(n: u64, of: u64) -> String {
    if of == 0 {
        return String::new();
    }
    format!("{n} ({:.1}%)", 100.0 * n as f64 / of as f64)
}

/// Detail rows for each selected taxonomy. A selection with no matching
/// stats row gets empty cells.
pub fn selection_details(selected: &[Vec<String>], rows: &[TaxonomyStatsRow]) -> Vec<SelectionDetail> {
    let by_taxonomy: AHashMap<&str, &TaxonomyStatsRow> =
        rows.iter().map(|r| (r.taxonomy.as_str(), r)).collect();

    selected
        .iter()
        .map(|fields| {
            let taxonomy = fields.join(";");
            match by_taxonomy.get(taxonomy.as_str()) {
                Some(row) => SelectionDetail {
                    amplifies: count_with_share(row.amplifies, row.entries),
                    differentiable: count_with_share(row.differentiable, row.amplifies),
                    rank_summary: row.rank_summary.clone(),
                    taxonomy,
                },
                None => SelectionDetail {
                    taxonomy,
                    amplifies: String::new(),
                    differentiable: String::new(),
                    rank_summary: Vec::new(),
                },
            }
        })
        .collect()
}
