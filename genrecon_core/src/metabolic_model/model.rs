//! This module provides the Model struct for representing an entire
//! metabolic network, and the Gpr AST for gene reaction rules

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use thiserror::Error;

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Map of reaction ids to Reaction objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model, as {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
    /// Free-form notes about the model's provenance
    pub notes: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            compartments: None,
            version: None,
            notes: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// Every metabolite in the reaction's stoichiometry and every gene in its
    /// rule is registered in the model; missing entities are synthesized as
    /// placeholders from their identifiers.
    ///
    /// # Errors
    /// Returns [`ModelError::DuplicateReaction`] if a reaction with the same
    /// id is already present. Reactions are never silently overwritten.
    pub fn add_reaction(&mut self, reaction: Reaction) -> Result<(), ModelError> {
        if self.reactions.contains_key(&reaction.id) {
            return Err(ModelError::DuplicateReaction(reaction.id));
        }
        self.register_reaction_entities(&reaction, None);
        self.reactions.insert(reaction.id.clone(), reaction);
        Ok(())
    }

    /// Copy a reaction from another model into this one
    ///
    /// The reaction's metabolite and gene objects are copied from the source
    /// model alongside it, so the imported reaction is fully resolvable here.
    ///
    /// # Errors
    /// [`ModelError::ReactionNotFound`] if the source model has no reaction
    /// under `reaction_id`, [`ModelError::DuplicateReaction`] if this model
    /// already has one.
    pub fn import_reaction_from(
        &mut self,
        source: &Model,
        reaction_id: &str,
    ) -> Result<(), ModelError> {
        let reaction = source
            .reactions
            .get(reaction_id)
            .ok_or_else(|| ModelError::ReactionNotFound(reaction_id.to_string()))?
            .clone();
        if self.reactions.contains_key(reaction_id) {
            return Err(ModelError::DuplicateReaction(reaction_id.to_string()));
        }
        self.register_reaction_entities(&reaction, Some(source));
        self.reactions.insert(reaction.id.clone(), reaction);
        Ok(())
    }

    /// Register the metabolites and genes a reaction references, copying
    /// them from `source` when available and synthesizing placeholders
    /// otherwise
    fn register_reaction_entities(&mut self, reaction: &Reaction, source: Option<&Model>) {
        for metabolite_id in reaction.metabolites.keys() {
            if self.metabolites.contains_key(metabolite_id) {
                continue;
            }
            let metabolite = source
                .and_then(|s| s.metabolites.get(metabolite_id))
                .cloned()
                .unwrap_or_else(|| Metabolite::from_id(metabolite_id));
            self.metabolites.insert(metabolite_id.clone(), metabolite);
        }
        if let Some(ref gpr) = reaction.gpr {
            for gene_id in gpr.genes() {
                if self.genes.contains_key(gene_id) {
                    continue;
                }
                let gene = source
                    .and_then(|s| s.genes.get(gene_id))
                    .cloned()
                    .unwrap_or_else(|| Gene::new(gene_id));
                self.genes.insert(gene_id.to_string(), gene);
            }
        }
    }

    /// Remove a reaction (by id) from the model, returning it if present
    ///
    /// Metabolites and genes stay in the model even if the removed reaction
    /// was their last reference.
    pub fn remove_reaction(&mut self, reaction_id: &str) -> Option<Reaction> {
        self.objective.shift_remove(reaction_id);
        self.reactions.shift_remove(reaction_id)
    }

    pub fn has_reaction(&self, reaction_id: &str) -> bool {
        self.reactions.contains_key(reaction_id)
    }

    /// Make `reaction_id` the model's sole objective reaction
    pub fn set_objective(&mut self, reaction_id: &str) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::ReactionNotFound(reaction_id.to_string()));
        }
        self.objective.clear();
        self.objective.insert(reaction_id.to_string(), 1.0);
        Ok(())
    }

    /// The id of the first reaction in the objective, if any
    pub fn objective_reaction_id(&self) -> Option<&str> {
        self.objective.keys().next().map(String::as_str)
    }

    /// Iterate over the exchange reactions of the model
    pub fn exchanges(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.values().filter(|r| r.is_exchange())
    }

    /// Apply a medium to the model's exchange reactions
    ///
    /// Exchange reactions listed in the medium get their lower bound set to
    /// the negated uptake magnitude; uptake through every other exchange is
    /// closed. Secretion bounds are left untouched.
    pub fn set_medium(&mut self, medium: &IndexMap<String, f64>) {
        for (reaction_id, reaction) in self.reactions.iter_mut() {
            if !reaction.is_exchange() {
                continue;
            }
            match medium.get(reaction_id) {
                Some(magnitude) => reaction.lower_bound = -magnitude.abs(),
                None => reaction.lower_bound = 0.0,
            }
        }
    }
}

/// Errors from manipulating a Model's reaction set
#[derive(Clone, Debug, Error)]
pub enum ModelError {
    /// Tried to insert a reaction under an id that is already taken
    #[error("reaction {0:?} is already present in the model")]
    DuplicateReaction(String),
    /// Tried to access a reaction the model does not contain
    #[error("reaction {0:?} not found in the model")]
    ReactionNotFound(String),
}

// region GPR Functionality

/// Representation of a gene reaction rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation over two subrules (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene node, holding the gene's id
    GeneNode(String),
}

/// Possible operations in a gene reaction rule
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
}

impl Gpr {
    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Build the disjunction of a sequence of gene ids, in order
    ///
    /// Returns None for an empty sequence.
    pub fn disjunction_of<I>(gene_ids: I) -> Option<Gpr>
    where
        I: IntoIterator<Item = String>,
    {
        let mut iter = gene_ids.into_iter();
        let first = Gpr::GeneNode(iter.next()?);
        Some(iter.fold(first, |left, id| {
            Gpr::Operation(GprOperation::Or {
                left: Box::new(left),
                right: Box::new(Gpr::GeneNode(id)),
            })
        }))
    }

    /// All gene ids referenced by the rule, left to right
    pub fn genes(&self) -> Vec<&str> {
        let mut gene_ids = Vec::new();
        self.collect_genes(&mut gene_ids);
        gene_ids
    }

    fn collect_genes<'a>(&'a self, gene_ids: &mut Vec<&'a str>) {
        match self {
            Gpr::GeneNode(id) => gene_ids.push(id),
            Gpr::Operation(
                GprOperation::Or { left, right } | GprOperation::And { left, right },
            ) => {
                left.collect_genes(gene_ids);
                right.collect_genes(gene_ids);
            }
        }
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
            },
            Gpr::GeneNode(gene_id) => gene_id.to_string(),
        }
    }
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}

// endregion GPR Functionality
