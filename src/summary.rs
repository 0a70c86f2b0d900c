// src/summary.rs

use crate::amplicons::Amplicons;
use crate::diagnostics::Diagnostics;
use crate::lineage::{core_species_name, deepest_matching_rank, MatchRank};
use crate::taxdb::ExpectedTaxa;
use crate::taxonomy::Rank;
use crate::types::SummaryRow;
use crate::vsearch::BestHits;

/// Build one row per expected taxon, in the expected-taxa order.
///
/// A taxon amplifies when an amplicon exists for its id. When it also has a
/// best hit with known taxonomy, the hit is recorded and compared against
/// the expected lineage; a species-level match makes it differentiable.
/// Genus-level matches are then reconsidered by
/// [`promote_core_species_matches`].
pub fn build_summary(
    expected: &ExpectedTaxa,
    amplicons: &Amplicons,
    hits: &BestHits,
    diag: &dyn Diagnostics,
) -> Vec<SummaryRow> {
    diag.info("Building summary for each expected taxonomy entry.");
    let mut summary = Vec::with_capacity(expected.len());

    for (seq_id, exp_tax) in expected {
        let mut row = SummaryRow::new(seq_id.clone(), exp_tax.clone());

        if amplicons.contains_key(seq_id) {
            row.amplifies = true;

            let top = hits.get(seq_id);
            if let Some((hit, hit_tax)) = top.and_then(|h| h.taxonomy.as_ref().map(|t| (h, t))) {
                let rank = deepest_matching_rank(hit_tax, exp_tax);
                row.top_hit_taxonomy = Some(hit_tax.clone());
                row.top_hit_pident = Some(hit.pident);
                row.top_hit_subject_id = Some(hit.subject_id.clone());
                row.deepest_rank = Some(rank);
                row.differentiable = rank.is_species();
            }
        }
        summary.push(row);
    }

    diag.info("Checking for genus-to-species upgrades (core name match).");
    let promoted = promote_core_species_matches(&mut summary);
    if promoted > 0 {
        diag.info(&format!("Promoted {promoted} genus-level matches to species."));
    }
    diag.info("Summary building complete.");
    summary
}

/// Upgrade amplifying genus-level rows to species when the expected and
/// observed lineages share the same non-empty core species name.
///
/// Returns how many rows were promoted.
pub fn promote_core_species_matches(rows: &mut [SummaryRow]) -> usize {
    let mut promoted = 0;
    for row in rows.iter_mut() {
        if !row.amplifies || row.deepest_rank != Some(MatchRank::Matched(Rank::Genus)) {
            continue;
        }
        let exp_core = core_species_name(row.expected_taxonomy.as_str());
        let hit_core = row
            .top_hit_taxonomy
            .as_ref()
            .map(|t| core_species_name(t.as_str()))
            .unwrap_or_default();
        if !exp_core.is_empty() && exp_core == hit_core {
            row.deepest_rank = Some(MatchRank::Matched(Rank::Species));
            row.differentiable = true;
            promoted += 1;
        }
    }
    promoted
}
