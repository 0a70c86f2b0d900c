// src/taxonomy.rs

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of named ranks in a lineage.
pub const RANK_COUNT: usize = 7;

/// The fixed ranks of a lineage, shallowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Domain,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    /// All ranks in lineage order.
    pub const ALL: [Rank; RANK_COUNT] = [
        Rank::Domain,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    /// Zero-based position of this rank in a lineage.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Rank::Domain => "domain",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
        }
    }

    pub fn from_name(name: &str) -> Option<Rank> {
        Rank::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A semicolon-delimited lineage such as
/// `Bacteria;Proteobacteria;Gammaproteobacteria;...`.
///
/// The first seven fields are addressable by [`Rank`]; an empty field reads
/// as absent. The trimmed input string is kept verbatim for display, so
/// fields past the seventh survive in storage even though no rank names them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxonomyLineage {
    lineage: String,
    ranks: [Option<String>; RANK_COUNT],
    depth: usize,
}

impl TaxonomyLineage {
    /// Parse a lineage string. Never fails: short input leaves the
    /// trailing ranks absent.
    pub fn parse(lineage: &str) -> Self {
        let lineage = lineage.trim().to_string();
        let mut ranks: [Option<String>; RANK_COUNT] = Default::default();
        let mut depth = 0;

        if !lineage.is_empty() {
            for (i, field) in lineage.split(';').map(str::trim).enumerate() {
                depth += 1;
                if i < RANK_COUNT && !field.is_empty() {
                    ranks[i] = Some(field.to_string());
                }
            }
        }

        Self { lineage, ranks, depth }
    }

    /// Value at `rank`, if present.
    pub fn get(&self, rank: Rank) -> Option<&str> {
        self.ranks[rank.index()].as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.get(Rank::Domain)
    }

    pub fn phylum(&self) -> Option<&str> {
        self.get(Rank::Phylum)
    }

    pub fn class(&self) -> Option<&str> {
        self.get(Rank::Class)
    }

    pub fn order(&self) -> Option<&str> {
        self.get(Rank::Order)
    }

    pub fn family(&self) -> Option<&str> {
        self.get(Rank::Family)
    }

    pub fn genus(&self) -> Option<&str> {
        self.get(Rank::Genus)
    }

    pub fn species(&self) -> Option<&str> {
        self.get(Rank::Species)
    }

    /// The trimmed lineage string exactly as given.
    pub fn as_str(&self) -> &str {
        &self.lineage
    }

    /// Number of `;`-separated fields in the original string (0 when empty).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// How many fields lie beyond the species rank.
    pub fn extra_fields(&self) -> usize {
        self.depth.saturating_sub(RANK_COUNT)
    }

    /// Every trimmed field of the original string, including any past the
    /// seventh.
    pub fn fields(&self) -> Vec<&str> {
        if self.lineage.is_empty() {
            return Vec::new();
        }
        self.lineage.split(';').map(str::trim).collect()
    }
}

impl fmt::Display for TaxonomyLineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lineage)
    }
}

impl From<&str> for TaxonomyLineage {
    fn from(s: &str) -> Self {
        TaxonomyLineage::parse(s)
    }
}

impl Serialize for TaxonomyLineage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.lineage)
    }
}

impl<'de> Deserialize<'de> for TaxonomyLineage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TaxonomyLineage::parse(&s))
    }
}
