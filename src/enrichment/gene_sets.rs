use std::collections::HashSet;

use crate::error::EnrichmentError;

/// A named collection of gene identifiers. Duplicate identifiers are dropped on insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneSet {
    pub name: String,
    pub genes: Vec<String>,
}

/// Gene sets in insertion order. Set names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneSets {
    sets: Vec<GeneSet>,
}

impl GeneSets {
    pub fn new() -> Self {
        GeneSets { sets: Vec::new() }
    }

    /// Build from `(name, genes)` pairs, keeping their order.
    pub fn try_from_pairs<N, G, I>(pairs: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (N, G)>,
        N: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        let mut sets = GeneSets::new();
        for (name, genes) in pairs {
            sets.insert(name, genes)?;
        }
        Ok(sets)
    }

    /// Add a gene set. Fails if a set with the same name already exists.
    pub fn insert<N, G>(&mut self, name: N, genes: G) -> anyhow::Result<()>
    where
        N: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        let name = name.into();
        if self.sets.iter().any(|s| s.name == name) {
            return Err(EnrichmentError::DuplicateGeneSet { name }.into());
        }

        let mut seen = HashSet::new();
        let genes = genes
            .into_iter()
            .map(Into::into)
            .filter(|g: &String| seen.insert(g.clone()))
            .collect();

        self.sets.push(GeneSet { name, genes });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GeneSet> {
        self.sets.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.sets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneSet> {
        self.sets.iter()
    }

    /// For every set, a row mask over `gene_ids` marking the rows that belong to the set.
    pub(crate) fn membership(&self, gene_ids: &[String]) -> anyhow::Result<Vec<Vec<bool>>> {
        if self.sets.is_empty() {
            return Err(EnrichmentError::NoGeneSets.into());
        }

        self.sets
            .iter()
            .map(|set| -> anyhow::Result<Vec<bool>> {
                if set.genes.is_empty() {
                    return Err(EnrichmentError::EmptyGeneSet {
                        name: set.name.clone(),
                    }
                    .into());
                }

                let lookup: HashSet<&str> = set.genes.iter().map(String::as_str).collect();
                let mask: Vec<bool> = gene_ids
                    .iter()
                    .map(|id| lookup.contains(id.as_str()))
                    .collect();

                if !mask.iter().any(|&m| m) {
                    return Err(EnrichmentError::EmptyIntersection {
                        name: set.name.clone(),
                    }
                    .into());
                }
                Ok(mask)
            })
            .collect()
    }
}
