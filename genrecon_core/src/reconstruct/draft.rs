//! Draft model construction from similarity-search hits
//!
//! Hits map genes to candidate reference reactions; a draft network is the
//! set of candidates resolvable against the universal reaction bag, each
//! carrying the disjunction of its supporting genes as a rule. Mapping is
//! best effort: genes without a known reaction and reactions missing from
//! the bag are dropped silently, but every drop is counted in the returned
//! [`DraftSummary`].

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::info;

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::{Gpr, Model, ModelError};
use crate::reconstruct::database::ReferenceDatabase;
use crate::utils::ids::sanitize_id;

/// Compartment suffix appended to reference reaction base ids
const CYTOSOL_SUFFIX: &str = "_c";

/// A single row of the similarity-search output
#[derive(Clone, Debug, PartialEq)]
pub struct GeneHit {
    /// Sanitized query sequence id, used as the gene id in the draft
    pub gene_id: String,
    /// Source-database code of the best reference hit
    pub reference_code: String,
}

/// Counts describing how much of the input survived draft mapping
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DraftSummary {
    /// Number of genes taken from the similarity search
    pub hit_genes: usize,
    /// Number of genes added from the organism's reference annotation
    pub organism_genes_added: usize,
    /// Hit genes with no recorded reaction mapping (dropped)
    pub unmapped_genes: usize,
    /// Candidate reaction ids absent from the universal bag (dropped)
    pub unresolved_reactions: usize,
}

/// Read a similarity-hit table, keeping the first two whitespace-separated
/// columns of every row
pub fn read_hits<P: AsRef<Path>>(path: P) -> Result<Vec<GeneHit>, DraftError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| DraftError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hits = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut columns = line.split_whitespace();
        let (query_id, reference_code) = match (columns.next(), columns.next()) {
            (Some(query), Some(reference)) => (query, reference),
            _ => return Err(DraftError::MalformedRecord { line: index + 1 }),
        };
        hits.push(GeneHit {
            gene_id: sanitize_id(query_id),
            reference_code: reference_code.to_string(),
        });
    }
    Ok(hits)
}

/// Group candidate reactions by id with the genes supporting them
///
/// Candidate ids are the recorded base ids with the cytosolic compartment
/// suffix appended. When an organism code is given, every gene recorded for
/// that organism and not already among the hits is added as well.
pub fn genes_to_reactions(
    hits: &[GeneHit],
    database: &ReferenceDatabase,
    organism: Option<&str>,
) -> (IndexMap<String, Vec<Gene>>, DraftSummary) {
    let mut summary = DraftSummary {
        hit_genes: hits.len(),
        ..DraftSummary::default()
    };

    let mut organism_genes: IndexSet<String> = IndexSet::new();
    if let Some(organism) = organism {
        let hit_codes: IndexSet<&str> =
            hits.iter().map(|hit| hit.reference_code.as_str()).collect();
        organism_genes = database
            .organism_genes(organism)
            .into_iter()
            .filter(|code| !hit_codes.contains(code.as_str()))
            .collect();
        summary.organism_genes_added = organism_genes.len();
        info!(
            organism,
            count = organism_genes.len(),
            "augmenting hits with organism genes"
        );
    }

    let mut reaction_genes: IndexMap<String, Vec<Gene>> = IndexMap::new();
    for hit in hits {
        match database.reactions_for_gene(&hit.reference_code) {
            Some(base_ids) => {
                for base_id in base_ids {
                    let reaction_id = format!("{base_id}{CYTOSOL_SUFFIX}");
                    reaction_genes
                        .entry(reaction_id)
                        .or_default()
                        .push(Gene::with_reference(
                            hit.gene_id.as_str(),
                            &hit.reference_code,
                        ));
                }
            }
            None => summary.unmapped_genes += 1,
        }
    }

    for code in &organism_genes {
        if let Some(base_ids) = database.reactions_for_gene(code) {
            for base_id in base_ids {
                let reaction_id = format!("{base_id}{CYTOSOL_SUFFIX}");
                reaction_genes
                    .entry(reaction_id)
                    .or_default()
                    .push(Gene::with_reference(sanitize_id(code), code));
            }
        }
    }

    (reaction_genes, summary)
}

/// Build a draft network from grouped candidate reactions
///
/// A candidate is included iff the universal bag contains a reaction under
/// the exact candidate id; its rule becomes the disjunction of the mapped
/// genes in discovery order. Unresolvable candidates are dropped and
/// counted.
pub fn build_draft(
    reaction_genes: &IndexMap<String, Vec<Gene>>,
    database: &ReferenceDatabase,
    model_id: Option<&str>,
    summary: &mut DraftSummary,
) -> Result<Model, ModelError> {
    let mut model = Model::new_empty();
    model.id = model_id.map(str::to_string);
    model.notes = Some(format!(
        "Built with genrecon v{}",
        env!("CARGO_PKG_VERSION")
    ));

    for (reaction_id, genes) in reaction_genes {
        if !database.universal.has_reaction(reaction_id) {
            summary.unresolved_reactions += 1;
            continue;
        }
        model.import_reaction_from(&database.universal, reaction_id)?;

        if let Some(reaction) = model.reactions.get_mut(reaction_id) {
            reaction.gpr = Gpr::disjunction_of(genes.iter().map(|gene| gene.id.clone()));
        }
        for gene in genes {
            if !model.genes.contains_key(&gene.id) {
                model.genes.insert(gene.id.clone(), gene.clone());
            }
        }
    }

    if summary.unresolved_reactions > 0 {
        info!(
            dropped = summary.unresolved_reactions,
            "candidate reactions absent from the universal bag were dropped"
        );
    }
    Ok(model)
}

/// Apply display names to genes found in the gene-name table
///
/// Genes are looked up by their source-database code, falling back to the
/// gene id itself; names are title-cased.
pub fn apply_gene_names(model: &mut Model, database: &ReferenceDatabase) {
    for gene in model.genes.values_mut() {
        let name = gene
            .reference_code()
            .and_then(|code| database.gene_names.get(code))
            .or_else(|| database.gene_names.get(&gene.id));
        if let Some(name) = name {
            gene.name = Some(title_case(name));
        }
    }
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("unable to read similarity hits from {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed similarity hit record at line {line}")]
    MalformedRecord { line: usize },
}
