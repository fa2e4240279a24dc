//! Access to the reference reaction database
//!
//! The reference data consists of a universal reaction bag (a large network
//! of curated candidate reactions), a map from source-database gene codes to
//! reaction ids, and a map from gene codes to display names. All three are
//! loaded once and shared read-only afterwards; the gap-fill solver only
//! ever mutates a scoped scratch copy of the universal network.

use std::fs;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::io::json::JsonError;
use crate::metabolic_model::model::Model;

/// The loaded reference data backing draft construction and gap-filling
#[derive(Clone, Debug)]
pub struct ReferenceDatabase {
    /// The universal reaction bag
    pub universal: Model,
    /// Map of `<source>:<gene-code>` to reference reaction base ids
    pub gene_reactions: IndexMap<String, Vec<String>>,
    /// Map of gene code to display name
    pub gene_names: IndexMap<String, String>,
}

impl ReferenceDatabase {
    /// Load the reference data from its three serialized files
    pub fn load<P: AsRef<Path>>(
        universal_path: P,
        gene_reactions_path: P,
        gene_names_path: P,
    ) -> Result<Self, DatabaseError> {
        let universal = Model::read_json(universal_path)?;
        let gene_reactions = serde_json::from_str(&fs::read_to_string(gene_reactions_path)?)?;
        let gene_names = serde_json::from_str(&fs::read_to_string(gene_names_path)?)?;
        Ok(ReferenceDatabase {
            universal,
            gene_reactions,
            gene_names,
        })
    }

    /// Assemble a reference database from already-loaded parts
    pub fn from_parts(
        universal: Model,
        gene_reactions: IndexMap<String, Vec<String>>,
        gene_names: IndexMap<String, String>,
    ) -> Self {
        ReferenceDatabase {
            universal,
            gene_reactions,
            gene_names,
        }
    }

    /// The reference reaction base ids recorded for a gene code, if any
    pub fn reactions_for_gene(&self, gene_code: &str) -> Option<&Vec<String>> {
        self.gene_reactions.get(gene_code)
    }

    /// Every gene code recorded under the given organism prefix
    pub fn organism_genes(&self, organism: &str) -> IndexSet<String> {
        self.gene_reactions
            .keys()
            .filter(|code| code.split(':').next() == Some(organism))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("unable to load the universal reaction bag: {0}")]
    Universal(#[from] JsonError),
    #[error("unable to read a lookup table: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("unable to parse a lookup table: {0}")]
    Unparsable(#[from] serde_json::Error),
}
