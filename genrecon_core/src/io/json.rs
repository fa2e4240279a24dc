//! Module providing JSON IO for genrecon Models
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::io::gpr_parse::{parse_gpr, GprParseError};
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models
/// in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    genes: Vec<JsonGene>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    compartments: Option<IndexMap<String, String>>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    compartment: Option<String>,
    #[serde(default)]
    charge: Option<i32>,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default)]
    annotation: Option<IndexMap<String, Value>>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default)]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default)]
    objective_coefficient: Option<f64>,
    #[serde(default)]
    subsystem: Option<String>,
    #[serde(default)]
    annotation: Option<IndexMap<String, Value>>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    annotation: Option<IndexMap<String, Value>>,
}
// endregion JSON Model

// region Conversions
impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            annotation: g.annotation.unwrap_or_default(),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            annotation: m.annotation.unwrap_or_default(),
        }
    }
}

impl From<Gene> for JsonGene {
    fn from(g: Gene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            annotation: (!g.annotation.is_empty()).then_some(g.annotation),
        }
    }
}

impl From<Metabolite> for JsonMetabolite {
    fn from(m: Metabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: Some(m.charge),
            formula: m.formula,
            annotation: (!m.annotation.is_empty()).then_some(m.annotation),
        }
    }
}

impl Model {
    /// Read a Model from a COBRA-style JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        let json_model = match serde_json::from_str::<JsonModel>(&model_str) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        Model::from_json(json_model)
    }

    /// Write the Model to a COBRA-style JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let json_model = self.to_json();
        let model_string = serde_json::to_string(&json_model)?;
        fs::write(path, model_string)?;
        Ok(())
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        model.id = json_model.id;
        model.compartments = json_model.compartments;
        model.version = json_model.version;
        model.notes = json_model.notes;

        // Genes and metabolites first, so reactions resolve against them
        json_model.genes.into_iter().for_each(|g| {
            model.genes.insert(g.id.clone(), Gene::from(g));
        });
        json_model.metabolites.into_iter().for_each(|m| {
            model.metabolites.insert(m.id.clone(), Metabolite::from(m));
        });

        /* Now, iterate through the reactions, parsing GPRs, and adding to
        the objective along the way */
        for rxn in json_model.reactions {
            let gpr = if !rxn.gene_reaction_rule.is_empty() {
                Some(parse_gpr(&rxn.gene_reaction_rule, &mut model.genes)?)
            } else {
                None
            };
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gpr(gpr)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .annotation(rxn.annotation.unwrap_or_default())
                .build()?;
            model.add_reaction(new_reaction)?;
            // Add the reaction to the objective function if desired
            if let Some(coef) = rxn.objective_coefficient {
                model.objective.insert(rxn.id, coef);
            }
        }
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        let json_genes: Vec<JsonGene> =
            self.genes.values().map(|g| g.clone().into()).collect();
        let json_metabolites: Vec<JsonMetabolite> = self
            .metabolites
            .values()
            .map(|m| m.clone().into())
            .collect();
        let json_reactions: Vec<JsonReaction> = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: r.lower_bound,
                upper_bound: r.upper_bound,
                gene_reaction_rule: r
                    .gpr
                    .as_ref()
                    .map(|rule| rule.to_string_id())
                    .unwrap_or_default(),
                objective_coefficient: self.objective.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
                annotation: (!r.annotation.is_empty()).then(|| r.annotation.clone()),
            })
            .collect();

        JsonModel {
            metabolites: json_metabolites,
            reactions: json_reactions,
            genes: json_genes,
            id: self.id.clone(),
            compartments: self.compartments.clone(),
            version: self.version.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("unable to parse a gene reaction rule during conversion from JSON: {0}")]
    GprParserError(#[from] GprParseError),
    #[error("unable to read file due to {0}")]
    UnableToRead(String),
    #[error("unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("unable to build reaction: {0}")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("model rejected a deserialized reaction: {0}")]
    InvalidModel(#[from] ModelError),
    #[error("serde json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("unable to write to file: {0}")]
    UnableToWrite(#[from] std::io::Error),
}

// endregion Conversions

#[cfg(test)]
mod json_tests {
    use super::*;

    #[test]
    fn json_metabolite() {
        let data = r#"{
            "id": "cpd00027_e",
            "name": "D-Glucose",
            "compartment": "extracellular",
            "charge": 0,
            "formula": "C6H12O6",
            "annotation": {
                "seed.compound": "cpd00027"
            }
        }"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        assert_eq!(met.id, "cpd00027_e");
        assert_eq!(met.name.unwrap(), "D-Glucose");
        assert_eq!(met.compartment.unwrap(), "extracellular");
        assert_eq!(met.charge.unwrap(), 0);
        assert_eq!(met.formula.unwrap(), "C6H12O6");
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
            "id": "rxn00148_c",
            "name": "ATP:pyruvate 2-O-phosphotransferase",
            "metabolites": {
                "cpd00002_c": -1.0,
                "cpd00020_c": -1.0,
                "cpd00008_c": 1.0,
                "cpd00061_c": 1.0
            },
            "lower_bound": -1000.0,
            "upper_bound": 1000.0,
            "gene_reaction_rule": "g1 or g2"
        }"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        assert_eq!(reaction.id, "rxn00148_c");
        assert!((reaction.lower_bound + 1000.0).abs() < 1e-12);
        assert!((reaction.upper_bound - 1000.0).abs() < 1e-12);
        assert_eq!(reaction.gene_reaction_rule, "g1 or g2");
        assert!((reaction.metabolites["cpd00020_c"] + 1.0).abs() < 1e-12);
        assert_eq!(reaction.objective_coefficient, None);
    }

    #[test]
    fn json_gene_minimal_fields() {
        let data = r#"{"id": "g1"}"#;
        let gene: JsonGene = serde_json::from_str(data).unwrap();
        assert_eq!(gene.id, "g1");
        assert_eq!(gene.name, None);
    }
}
