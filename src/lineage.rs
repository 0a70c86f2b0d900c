// src/lineage.rs

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::taxonomy::{Rank, TaxonomyLineage};

/// Outcome of comparing two lineages: the deepest rank at which they agree,
/// or `Unmatched` when even the domain differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRank {
    Unmatched,
    Matched(Rank),
}

impl MatchRank {
    /// Label used in reports: a rank name or `"none"`.
    pub fn label(self) -> &'static str {
        match self {
            MatchRank::Unmatched => "none",
            MatchRank::Matched(rank) => rank.name(),
        }
    }

    pub fn from_label(label: &str) -> Option<MatchRank> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("none") {
            return Some(MatchRank::Unmatched);
        }
        Rank::from_name(label).map(MatchRank::Matched)
    }

    pub fn is_species(self) -> bool {
        self == MatchRank::Matched(Rank::Species)
    }
}

impl fmt::Display for MatchRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for MatchRank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for MatchRank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MatchRank::from_label(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown rank label '{s}'")))
    }
}

/// Walk both lineages from domain to species and return the last rank at
/// which both are present and equal. Stops at the first gap or mismatch.
pub fn deepest_matching_rank(a: &TaxonomyLineage, b: &TaxonomyLineage) -> MatchRank {
    let mut last_match = MatchRank::Unmatched;
    for rank in Rank::ALL {
        match (a.get(rank), b.get(rank)) {
            (Some(x), Some(y)) if x == y => last_match = MatchRank::Matched(rank),
            _ => break,
        }
    }
    last_match
}

/// `"Genus species"` built from the last two fields of a lineage string.
///
/// The species field is usually a binomial (`Escherichia coli`), so a
/// leading copy of the genus is skipped. Only the first word of the epithet
/// is kept, cut at the first `_`, which drops strain and variant suffixes
/// such as `coli_strainX` or `coli K-12`.
///
/// Returns an empty string when there are fewer than two fields or the
/// species field is blank.
pub fn core_species_name(lineage: &str) -> String {
    let fields: Vec<&str> = lineage.split(';').map(str::trim).collect();
    if lineage.trim().is_empty() || fields.len() < 2 {
        return String::new();
    }
    let genus = fields[fields.len() - 2];
    let mut words = fields[fields.len() - 1].split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };
    let epithet = match words.next() {
        Some(second) if first == genus => second,
        _ => first,
    };
    let epithet = epithet.split('_').next().unwrap_or(epithet);
    format!("{genus} {epithet}").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ECOLI: &str = "Bacteria;Proteobacteria;Gammaproteobacteria;Enterobacterales;Enterobacteriaceae;Escherichia;Escherichia coli";
    const ECOLI_STRAIN: &str = "Bacteria;Proteobacteria;Gammaproteobacteria;Enterobacterales;Enterobacteriaceae;Escherichia;Escherichia coli_strainX";
    const SHIGELLA: &str = "Bacteria;Proteobacteria;Gammaproteobacteria;Enterobacterales;Enterobacteriaceae;Shigella;Shigella flexneri";

    fn lin(s: &str) -> TaxonomyLineage {
        TaxonomyLineage::parse(s)
    }

    #[test]
    fn identical_lineages_match_at_species() {
        assert_eq!(
            deepest_matching_rank(&lin(ECOLI), &lin(ECOLI)),
            MatchRank::Matched(Rank::Species)
        );
    }

    #[test]
    fn stops_at_first_mismatch() {
        assert_eq!(
            deepest_matching_rank(&lin(ECOLI), &lin(SHIGELLA)),
            MatchRank::Matched(Rank::Family)
        );
        assert_eq!(
            deepest_matching_rank(&lin(ECOLI), &lin(ECOLI_STRAIN)),
            MatchRank::Matched(Rank::Genus)
        );
    }

    #[test]
    fn stops_at_first_gap_even_if_deeper_ranks_agree() {
        assert_eq!(
            deepest_matching_rank(&lin("A;;C"), &lin("A;;C")),
            MatchRank::Matched(Rank::Domain)
        );
    }

    #[test]
    fn domain_mismatch_or_absence_is_unmatched() {
        assert_eq!(
            deepest_matching_rank(&lin("Archaea;X"), &lin("Bacteria;X")),
            MatchRank::Unmatched
        );
        assert_eq!(deepest_matching_rank(&lin(""), &lin(ECOLI)), MatchRank::Unmatched);
        assert_eq!(deepest_matching_rank(&lin(""), &lin("")), MatchRank::Unmatched);
    }

    #[test]
    fn comparison_is_symmetric() {
        let all = [ECOLI, ECOLI_STRAIN, SHIGELLA, "Bacteria", "", "Archaea;Euryarchaeota", "A;;C"];
        for a in all {
            for b in all {
                assert_eq!(
                    deepest_matching_rank(&lin(a), &lin(b)),
                    deepest_matching_rank(&lin(b), &lin(a)),
                    "{a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn core_name_drops_strain_suffix() {
        assert_eq!(core_species_name(ECOLI), "Escherichia coli");
        assert_eq!(core_species_name(ECOLI_STRAIN), "Escherichia coli");
        assert_eq!(
            core_species_name("Bacteria;Escherichia;Escherichia coli K-12 substr. MG1655"),
            "Escherichia coli"
        );
    }

    #[test]
    fn core_name_accepts_bare_epithet() {
        assert_eq!(core_species_name("X;Bacillus;subtilis 168"), "Bacillus subtilis");
        assert_eq!(core_species_name("Genus;Other word"), "Genus Other");
    }

    #[test]
    fn core_name_needs_two_fields() {
        assert_eq!(core_species_name(""), "");
        assert_eq!(core_species_name("Bacteria"), "");
        assert_eq!(core_species_name("Bacteria;Escherichia;"), "");
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!(MatchRank::from_label("none"), Some(MatchRank::Unmatched));
        assert_eq!(MatchRank::from_label("genus"), Some(MatchRank::Matched(Rank::Genus)));
        assert_eq!(MatchRank::from_label("bogus"), None);
        assert!(MatchRank::Matched(Rank::Species).is_species());
    }
}
