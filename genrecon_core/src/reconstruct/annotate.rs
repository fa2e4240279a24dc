//! SBO and ModelSEED cross-reference annotation of finished models

use indexmap::IndexSet;
use serde_json::Value;

use crate::metabolic_model::model::Model;

/// Reaction ids making up the biomass formulation of the universal bag
const BIOMASS_COMPONENT_IDS: &[&str] = &[
    "dna_rxn",
    "rna_rxn",
    "protein_rxn",
    "teichoicacid_rxn",
    "peptidoglycan_rxn",
    "lipid_rxn",
    "cofactor_rxn",
    "GmPos_cellwall",
    "rxn10088_c",
    "GmNeg_cellwall",
    "biomass_rxn_gp",
    "biomass_rxn_gn",
];

/// Which reaction(s) to mark as the model's biomass production
pub enum ObjectiveAnnotation {
    /// The model uses the universal bag's built-in biomass formulation
    Biomass,
    /// The model carries its own objective reaction
    Reaction(String),
}

/// Add gene, metabolite, reaction, and biomass annotations to a model
pub fn annotate(model: &mut Model, objective: ObjectiveAnnotation) {
    // Genes
    for gene in model.genes.values_mut() {
        gene.annotation
            .insert("sbo".to_string(), Value::String("SBO:0000243".to_string()));
    }

    // Metabolites
    for metabolite in model.metabolites.values_mut() {
        metabolite
            .annotation
            .insert("sbo".to_string(), Value::String("SBO:0000247".to_string()));
        if metabolite.id.contains("cpd") {
            if let Some((base, _)) = metabolite.id.split_once('_') {
                metabolite.annotation.insert(
                    "seed.compound".to_string(),
                    Value::String(base.to_string()),
                );
            }
        }
    }

    // Reactions: exchange, transport, or plain metabolic
    let Model {
        reactions,
        metabolites,
        ..
    } = model;
    for reaction in reactions.values_mut() {
        if reaction.id.contains("rxn") {
            if let Some((base, _)) = reaction.id.split_once('_') {
                reaction.annotation.insert(
                    "seed.reaction".to_string(),
                    Value::String(base.to_string()),
                );
            }
        }
        let compartments: IndexSet<Option<&str>> = reaction
            .metabolites
            .keys()
            .map(|metabolite_id| {
                metabolites
                    .get(metabolite_id)
                    .and_then(|m| m.compartment.as_deref())
            })
            .collect();
        let sbo = if reaction.metabolites.len() == 1 {
            "SBO:0000627" // exchange
        } else if compartments.len() > 1 {
            "SBO:0000185" // transport
        } else {
            "SBO:0000176" // metabolic
        };
        reaction
            .annotation
            .insert("sbo".to_string(), Value::String(sbo.to_string()));
    }

    // Biomass reactions
    match objective {
        ObjectiveAnnotation::Biomass => {
            if let Some(exchange) = model.reactions.get_mut("EX_biomass") {
                exchange
                    .annotation
                    .insert("sbo".to_string(), Value::String("SBO:0000632".to_string()));
            }
            for biomass_id in BIOMASS_COMPONENT_IDS {
                if let Some(reaction) = model.reactions.get_mut(*biomass_id) {
                    reaction.annotation.insert(
                        "sbo".to_string(),
                        Value::String("SBO:0000629".to_string()),
                    );
                }
            }
        }
        ObjectiveAnnotation::Reaction(objective_id) => {
            if let Some(reaction) = model.reactions.get_mut(&objective_id) {
                reaction
                    .annotation
                    .insert("sbo".to_string(), Value::String("SBO:0000629".to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use indexmap::IndexMap;

    fn annotated_toy() -> Model {
        let mut model = Model::new_empty();
        model
            .add_reaction(
                ReactionBuilder::default()
                    .id("EX_cpd00027_e".to_string())
                    .metabolites(IndexMap::from([("cpd00027_e".to_string(), -1.0)]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        model
            .add_reaction(
                ReactionBuilder::default()
                    .id("rxn05573_c".to_string())
                    .metabolites(IndexMap::from([
                        ("cpd00027_e".to_string(), -1.0),
                        ("cpd00027_c".to_string(), 1.0),
                    ]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        model
            .add_reaction(
                ReactionBuilder::default()
                    .id("rxn00148_c".to_string())
                    .metabolites(IndexMap::from([
                        ("cpd00027_c".to_string(), -1.0),
                        ("cpd00061_c".to_string(), 1.0),
                    ]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        annotate(&mut model, ObjectiveAnnotation::Biomass);
        model
    }

    fn sbo(model: &Model, reaction_id: &str) -> String {
        model.reactions[reaction_id].annotation["sbo"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn reaction_classes_get_distinct_terms() {
        let model = annotated_toy();
        assert_eq!(sbo(&model, "EX_cpd00027_e"), "SBO:0000627");
        assert_eq!(sbo(&model, "rxn05573_c"), "SBO:0000185");
        assert_eq!(sbo(&model, "rxn00148_c"), "SBO:0000176");
    }

    #[test]
    fn seed_cross_references_use_the_id_prefix() {
        let model = annotated_toy();
        assert_eq!(
            model.reactions["rxn00148_c"].annotation["seed.reaction"],
            Value::String("rxn00148".to_string())
        );
        assert_eq!(
            model.metabolites["cpd00027_c"].annotation["seed.compound"],
            Value::String("cpd00027".to_string())
        );
        assert_eq!(
            model.metabolites["cpd00027_c"].annotation["sbo"],
            Value::String("SBO:0000247".to_string())
        );
    }

    #[test]
    fn custom_objective_reaction_is_tagged() {
        let mut model = Model::new_empty();
        model
            .add_reaction(
                ReactionBuilder::default()
                    .id("bio1".to_string())
                    .metabolites(IndexMap::from([("cpd11416_c".to_string(), -1.0)]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        annotate(&mut model, ObjectiveAnnotation::Reaction("bio1".to_string()));
        assert_eq!(sbo(&model, "bio1"), "SBO:0000629");
    }
}
