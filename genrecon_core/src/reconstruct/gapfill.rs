//! pFBA gap-filling
//!
//! One round of gap-filling merges the draft network into a scratch copy of
//! the universal reaction bag, forces the objective to carry a fraction of
//! its unconstrained optimum, and minimizes the total flux through every
//! reaction the draft did not already have. Reactions left carrying flux
//! are the gap-fill candidates; [`integrate`] then makes them permanent.

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{Reaction, EXCHANGE_PREFIX};
use crate::optimize::flux::{flux_balance, parsimonious_minimization};
use crate::optimize::problem::ProblemError;
use crate::reconstruct::medium::COMPLETE;

/// Minimum uptake forced through the complete-medium exchanges between the
/// two gap-filling rounds
const MIN_BASE_UPTAKE: f64 = 0.01;

/// Which gap-filling round is running
///
/// The first round anchors a base of objective activity under task
/// constraints; the second tightens toward the full optimum after the
/// complete-medium uptake reactions have been opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GapfillStep {
    First,
    Second,
}

/// Identify the universal reactions needed to make the objective carry flux
///
/// The universal bag is only ever touched through a scratch copy scoped to
/// this call: the `universal` argument itself is unchanged on return,
/// regardless of success or failure. Within the scratch copy the medium is
/// applied, every reaction the model already has replaces its universal
/// counterpart, task reactions get a forced lower bound, and the objective
/// is constrained to a band of its unconstrained optimum before the
/// parsimonious minimization runs.
///
/// Returns the ids of reactions outside the model whose flux magnitude
/// exceeds the configured epsilon.
///
/// # Errors
/// [`GapfillError::UnknownReaction`] when `objective_id` does not resolve in
/// the bag, [`GapfillError::Infeasible`] when the constraints admit no
/// solution (an empty set is never returned in that case).
#[allow(clippy::too_many_arguments)]
pub fn find_active_reactions(
    model: &Model,
    universal: &Model,
    medium: &IndexMap<String, f64>,
    tasks: Option<&[String]>,
    objective_id: &str,
    min_fraction: f64,
    max_fraction: f64,
    step: GapfillStep,
    preserve_objective_in_model: bool,
) -> Result<IndexSet<String>, GapfillError> {
    let mut bag = universal.clone();
    bag.set_medium(medium);

    // Reaction ids the model already has; the objective is only one of them
    // when the model arrived as a full network
    let mut orig_ids: IndexSet<String> = IndexSet::new();
    for reaction_id in model.reactions.keys() {
        if reaction_id == objective_id && !preserve_objective_in_model {
            continue;
        }
        orig_ids.insert(reaction_id.clone());
    }

    // Swap the model's own reactions into the bag, so the solve runs on
    // model-exact reaction objects plus the full reference superset
    for reaction_id in &orig_ids {
        if bag.has_reaction(reaction_id) {
            bag.remove_reaction(reaction_id);
        }
    }
    for reaction_id in &orig_ids {
        bag.import_reaction_from(model, reaction_id)?;
    }

    // Force a minimum flux through the metabolic tasks
    if let Some(tasks) = tasks {
        for task_id in tasks {
            if let Some(reaction) = bag.reactions.get_mut(task_id) {
                reaction.lower_bound = min_fraction;
            }
        }
    }

    if !bag.has_reaction(objective_id) {
        return Err(GapfillError::UnknownReaction(objective_id.to_string()));
    }
    bag.set_objective(objective_id)?;
    let best_objective = flux_balance(&bag)?.objective_value;
    debug!(objective_id, best_objective, "unconstrained objective optimum");

    let (flux_lower, flux_upper) = match step {
        GapfillStep::First => (
            best_objective * min_fraction,
            best_objective * max_fraction,
        ),
        GapfillStep::Second => (best_objective * max_fraction, best_objective),
    };

    let solution =
        parsimonious_minimization(&bag, objective_id, flux_lower, flux_upper, &orig_ids)?;

    let epsilon = CONFIGURATION.read().unwrap().flux_epsilon;
    let new_ids: IndexSet<String> = solution
        .active_reactions(epsilon)
        .difference(&orig_ids)
        .cloned()
        .collect();
    info!(count = new_ids.len(), "active reactions beyond the model");
    Ok(new_ids)
}

/// Permanently add discovered reactions to the model
///
/// The first round also imports the objective reaction itself, unless the
/// model (an extended network) already carries it. Integration
/// is strictly additive; a reaction id that is already present fails with a
/// duplicate error instead of being overwritten. Imported exchange
/// reactions answer to the gap-filling medium, exactly as they did inside
/// the solver's scratch copy. Afterwards the objective is set to maximize
/// the objective reaction, and an exchange reaction is created for every
/// extracellular metabolite that lacks one.
pub fn integrate(
    model: &mut Model,
    universal: &Model,
    new_ids: &IndexSet<String>,
    medium: &IndexMap<String, f64>,
    objective_id: &str,
    step: GapfillStep,
) -> Result<(), GapfillError> {
    let mut imported: Vec<String> = Vec::new();
    if step == GapfillStep::First && !model.has_reaction(objective_id) {
        model.import_reaction_from(universal, objective_id)?;
        imported.push(objective_id.to_string());
    }
    for reaction_id in new_ids {
        if reaction_id != objective_id {
            model.import_reaction_from(universal, reaction_id)?;
            imported.push(reaction_id.clone());
        }
    }

    for reaction_id in &imported {
        if let Some(reaction) = model.reactions.get_mut(reaction_id) {
            if reaction.is_exchange() {
                reaction.lower_bound = match medium.get(reaction_id) {
                    Some(magnitude) => -magnitude.abs(),
                    None => 0.0,
                };
            }
        }
    }

    model.set_objective(objective_id)?;
    add_missing_exchanges(model)?;
    Ok(())
}

/// Create an exchange reaction for every extracellular metabolite that does
/// not have one, so each extracellular species is independently
/// exchangeable
fn add_missing_exchanges(model: &mut Model) -> Result<(), ModelError> {
    let (lower_bound, upper_bound) = {
        let configuration = CONFIGURATION.read().unwrap();
        (configuration.lower_bound, configuration.upper_bound)
    };

    let mut missing = Vec::new();
    for (metabolite_id, metabolite) in &model.metabolites {
        if !metabolite.is_extracellular() {
            continue;
        }
        let exchange_id = format!("{EXCHANGE_PREFIX}{metabolite_id}");
        if model.has_reaction(&exchange_id) {
            continue;
        }
        let name = match &metabolite.name {
            Some(name) => format!("{name} exchange"),
            None => format!("{metabolite_id} exchange"),
        };
        missing.push((exchange_id, name, metabolite_id.clone()));
    }

    for (exchange_id, name, metabolite_id) in missing {
        model.add_reaction(Reaction {
            id: exchange_id,
            metabolites: IndexMap::from([(metabolite_id, -1.0)]),
            name: Some(name),
            gpr: None,
            lower_bound,
            upper_bound,
            subsystem: None,
            annotation: IndexMap::new(),
        })?;
    }
    Ok(())
}

/// Force uptake of the complete-medium compounds ahead of the second
/// gap-filling round
///
/// Missing exchange reactions are imported from the universal bag; every
/// one of them is then bounded to require at least a trickle of uptake.
pub fn set_base_inputs(model: &mut Model, universal: &Model) -> Result<(), GapfillError> {
    let lower_bound = CONFIGURATION.read().unwrap().lower_bound;
    let exchange_ids: Vec<String> = COMPLETE
        .iter()
        .map(|compound| format!("{EXCHANGE_PREFIX}{compound}"))
        .collect();

    for exchange_id in &exchange_ids {
        if !model.has_reaction(exchange_id) {
            model.import_reaction_from(universal, exchange_id)?;
        }
    }
    for exchange_id in &exchange_ids {
        if let Some(reaction) = model.reactions.get_mut(exchange_id) {
            reaction.set_bounds(lower_bound, -MIN_BASE_UPTAKE);
        }
    }
    Ok(())
}

/// Errors raised while gap-filling
#[derive(Debug, Error)]
pub enum GapfillError {
    /// The named objective reaction does not exist in the universal bag
    #[error("objective reaction {0:?} not present in the universal reaction bag")]
    UnknownReaction(String),
    /// The optimization admits no solution under the current constraints
    #[error("gap-filling optimization is infeasible under the current constraints")]
    Infeasible,
    /// The optimization failed for a reason other than infeasibility
    #[error("gap-filling optimization failed: {0}")]
    Solve(ProblemError),
    /// Reaction bookkeeping failed while editing a model
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<ProblemError> for GapfillError {
    fn from(err: ProblemError) -> Self {
        match err {
            ProblemError::Infeasible => GapfillError::Infeasible,
            other => GapfillError::Solve(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn reaction(id: &str, metabolites: &[(&str, f64)], lb: f64, ub: f64) -> Reaction {
        ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(
                metabolites
                    .iter()
                    .map(|(m, c)| (m.to_string(), *c))
                    .collect(),
            )
            .lower_bound(lb)
            .upper_bound(ub)
            .build()
            .unwrap()
    }

    /// Universal bag: uptake of A feeding a chain to the biomass sink, plus
    /// a pair of reactions disconnected from everything else
    fn toy_universal() -> Model {
        let mut universal = Model::new_empty();
        universal
            .add_reaction(reaction("EX_cpdA_e", &[("cpdA_e", -1.0)], -1000., 1000.))
            .unwrap();
        universal
            .add_reaction(reaction(
                "rxnT01_c",
                &[("cpdA_e", -1.0), ("cpdA_c", 1.0)],
                -1000.,
                1000.,
            ))
            .unwrap();
        universal
            .add_reaction(reaction(
                "rxn00001_c",
                &[("cpdA_c", -1.0), ("cpdB_c", 1.0)],
                -1000.,
                1000.,
            ))
            .unwrap();
        universal
            .add_reaction(reaction(
                "rxn00002_c",
                &[("cpdB_c", -1.0), ("cpdC_c", 1.0)],
                -1000.,
                1000.,
            ))
            .unwrap();
        universal
            .add_reaction(reaction(
                "rxn00003_c",
                &[("cpdD_c", -1.0), ("cpdE_c", 1.0)],
                -1000.,
                1000.,
            ))
            .unwrap();
        universal
            .add_reaction(reaction("biomass_GmPos", &[("cpdC_c", -1.0)], 0., 1000.))
            .unwrap();
        universal
    }

    /// Draft containing only the transport reaction
    fn toy_draft(universal: &Model) -> Model {
        let mut draft = Model::new_empty();
        draft.import_reaction_from(universal, "rxnT01_c").unwrap();
        draft
    }

    fn toy_medium() -> IndexMap<String, f64> {
        IndexMap::from([("EX_cpdA_e".to_string(), 1000.0)])
    }

    #[test]
    fn finds_the_missing_chain_and_skips_disconnected_reactions() {
        let universal = toy_universal();
        let draft = toy_draft(&universal);

        let new_ids = find_active_reactions(
            &draft,
            &universal,
            &toy_medium(),
            None,
            "biomass_GmPos",
            0.01,
            0.5,
            GapfillStep::First,
            false,
        )
        .unwrap();

        assert!(new_ids.contains("rxn00001_c"));
        assert!(new_ids.contains("rxn00002_c"));
        assert!(new_ids.contains("biomass_GmPos"));
        // Unconnected to the objective subnetwork
        assert!(!new_ids.contains("rxn00003_c"));
        // Never report what the model already had
        assert!(!new_ids.contains("rxnT01_c"));
    }

    #[test]
    fn the_universal_bag_is_unchanged_by_a_solve() {
        let universal = toy_universal();
        let draft = toy_draft(&universal);
        let snapshot = universal.clone();

        find_active_reactions(
            &draft,
            &universal,
            &toy_medium(),
            Some(&["rxn00002_c".to_string()]),
            "biomass_GmPos",
            0.01,
            0.5,
            GapfillStep::First,
            false,
        )
        .unwrap();

        assert_eq!(universal, snapshot);
    }

    #[test]
    fn unknown_objective_is_an_error() {
        let universal = toy_universal();
        let draft = toy_draft(&universal);
        let result = find_active_reactions(
            &draft,
            &universal,
            &toy_medium(),
            None,
            "biomass_GmNeg",
            0.01,
            0.5,
            GapfillStep::First,
            false,
        );
        assert!(matches!(result, Err(GapfillError::UnknownReaction(_))));
    }

    #[test]
    fn unsupportable_task_is_infeasible_not_empty() {
        let universal = toy_universal();
        let draft = toy_draft(&universal);
        // cpdD_c has no producer, so forcing rxn00003_c to carry flux breaks
        // its mass balance
        let result = find_active_reactions(
            &draft,
            &universal,
            &toy_medium(),
            Some(&["rxn00003_c".to_string()]),
            "biomass_GmPos",
            0.01,
            0.5,
            GapfillStep::First,
            false,
        );
        assert!(matches!(result, Err(GapfillError::Infeasible)));
    }

    #[test]
    fn integration_imports_the_objective_and_synthesizes_exchanges() {
        let universal = toy_universal();
        let mut model = toy_draft(&universal);

        let new_ids: IndexSet<String> =
            IndexSet::from(["rxn00001_c".to_string(), "rxn00002_c".to_string()]);
        integrate(
            &mut model,
            &universal,
            &new_ids,
            &toy_medium(),
            "biomass_GmPos",
            GapfillStep::First,
        )
        .unwrap();

        assert!(model.has_reaction("biomass_GmPos"));
        assert_eq!(model.objective_reaction_id(), Some("biomass_GmPos"));
        // cpdA_e is extracellular and had no exchange in the draft
        assert!(model.has_reaction("EX_cpdA_e"));
        let exchange = &model.reactions["EX_cpdA_e"];
        assert!((exchange.lower_bound + 1000.0).abs() < 1e-12);
        assert!((exchange.upper_bound - 1000.0).abs() < 1e-12);
    }

    #[test]
    fn reintegration_of_present_reactions_is_rejected() {
        let universal = toy_universal();
        let mut model = toy_draft(&universal);
        let new_ids: IndexSet<String> = IndexSet::from(["rxn00001_c".to_string()]);

        integrate(
            &mut model,
            &universal,
            &new_ids,
            &toy_medium(),
            "biomass_GmPos",
            GapfillStep::First,
        )
        .unwrap();
        let before = model.clone();

        let again = integrate(
            &mut model,
            &universal,
            &new_ids,
            &toy_medium(),
            "biomass_GmPos",
            GapfillStep::Second,
        );
        assert!(matches!(
            again,
            Err(GapfillError::Model(ModelError::DuplicateReaction(_)))
        ));
        // The duplicate insertion must not have overwritten anything
        assert_eq!(model.reactions, before.reactions);
    }

    #[test]
    fn base_inputs_force_uptake_of_the_complete_medium() {
        let mut universal = toy_universal();
        for compound in COMPLETE.iter().copied() {
            universal
                .add_reaction(reaction(
                    &format!("EX_{compound}"),
                    &[(compound, -1.0)],
                    -1000.,
                    1000.,
                ))
                .unwrap();
        }
        let mut model = toy_draft(&universal);

        set_base_inputs(&mut model, &universal).unwrap();
        for compound in COMPLETE.iter().copied() {
            let reaction = &model.reactions[&format!("EX_{compound}")];
            assert!((reaction.lower_bound + 1000.0).abs() < 1e-12);
            assert!((reaction.upper_bound + MIN_BASE_UPTAKE).abs() < 1e-12);
        }
    }

    #[test]
    fn preserved_objective_uses_the_model_copy() {
        let universal = toy_universal();
        // A full-network input carrying its own, tighter objective reaction
        let mut network = toy_draft(&universal);
        network
            .add_reaction(reaction("biomass_GmPos", &[("cpdC_c", -1.0)], 0., 10.))
            .unwrap();
        network
            .import_reaction_from(&universal, "rxn00001_c")
            .unwrap();
        network
            .import_reaction_from(&universal, "rxn00002_c")
            .unwrap();
        network
            .import_reaction_from(&universal, "EX_cpdA_e")
            .unwrap();
        network.set_objective("biomass_GmPos").unwrap();

        let new_ids = find_active_reactions(
            &network,
            &universal,
            &toy_medium(),
            None,
            "biomass_GmPos",
            0.01,
            0.5,
            GapfillStep::First,
            true,
        )
        .unwrap();
        // Everything needed is already present; nothing new to add
        assert!(new_ids.is_empty());
    }
}
