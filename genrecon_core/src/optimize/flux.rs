//! Flux balance analysis over a metabolic model
//!
//! Every reaction contributes a forward and a reverse flux component to the
//! optimization problem, with steady-state mass balance enforced per
//! metabolite. The net flux of a reaction is forward minus reverse.

use indexmap::{IndexMap, IndexSet};

use crate::metabolic_model::model::Model;
use crate::optimize::problem::{ObjectiveSense, Problem, ProblemError, Solution};

/// Solved fluxes for a model
#[derive(Debug, Clone)]
pub struct FluxSolution {
    /// Optimized objective value
    pub objective_value: f64,
    /// Net flux per reaction id
    pub fluxes: IndexMap<String, f64>,
}

impl FluxSolution {
    /// Ids of reactions whose net flux magnitude exceeds `epsilon`
    pub fn active_reactions(&self, epsilon: f64) -> IndexSet<String> {
        self.fluxes
            .iter()
            .filter(|(_, flux)| flux.abs() > epsilon)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Maximize the model's objective and return the solved fluxes
pub fn flux_balance(model: &Model) -> Result<FluxSolution, ProblemError> {
    let mut problem = build_flux_problem(model, ObjectiveSense::Maximize)?;
    for (reaction_id, coefficient) in &model.objective {
        if let Some(reaction) = model.reactions.get(reaction_id) {
            problem.set_objective_term(&reaction.get_forward_id(), *coefficient)?;
            problem.set_objective_term(&reaction.get_reverse_id(), -coefficient)?;
        }
    }
    let solution = problem.solve()?;
    Ok(net_fluxes(model, solution))
}

/// Minimize total penalized flux while holding the flux of `objective_id`
/// inside `[flux_lower, flux_upper]`
///
/// Reactions listed in `unpenalized` contribute weight zero to the
/// minimization; every other reaction's forward and reverse components are
/// penalized with weight one.
pub fn parsimonious_minimization(
    model: &Model,
    objective_id: &str,
    flux_lower: f64,
    flux_upper: f64,
    unpenalized: &IndexSet<String>,
) -> Result<FluxSolution, ProblemError> {
    let mut problem = build_flux_problem(model, ObjectiveSense::Minimize)?;

    let objective_reaction = model
        .reactions
        .get(objective_id)
        .ok_or_else(|| ProblemError::NonExistentVariable(objective_id.to_string()))?;
    let forward_id = objective_reaction.get_forward_id();
    let reverse_id = objective_reaction.get_reverse_id();
    problem.add_inequality_constraint(
        &[forward_id.as_str(), reverse_id.as_str()],
        &[1.0, -1.0],
        flux_lower,
        flux_upper,
    )?;

    for reaction in model.reactions.values() {
        let weight = if unpenalized.contains(&reaction.id) {
            0.0
        } else {
            1.0
        };
        problem.set_objective_term(&reaction.get_forward_id(), weight)?;
        problem.set_objective_term(&reaction.get_reverse_id(), weight)?;
    }

    let solution = problem.solve()?;
    Ok(net_fluxes(model, solution))
}

/// Assemble the stoichiometric skeleton of the flux problem: a forward and
/// reverse variable per reaction and a mass balance row per metabolite
fn build_flux_problem(model: &Model, sense: ObjectiveSense) -> Result<Problem, ProblemError> {
    let mut problem = Problem::new(sense);

    for reaction in model.reactions.values() {
        problem.add_variable(
            &reaction.get_forward_id(),
            reaction.get_forward_lower_bound(),
            reaction.get_forward_upper_bound(),
        )?;
        problem.add_variable(
            &reaction.get_reverse_id(),
            reaction.get_reverse_lower_bound(),
            reaction.get_reverse_upper_bound(),
        )?;
    }

    let mut balances: IndexMap<&str, Vec<(String, f64)>> = IndexMap::new();
    for reaction in model.reactions.values() {
        for (metabolite_id, coefficient) in &reaction.metabolites {
            let terms = balances.entry(metabolite_id).or_default();
            terms.push((reaction.get_forward_id(), *coefficient));
            terms.push((reaction.get_reverse_id(), -coefficient));
        }
    }
    for terms in balances.values() {
        let variables: Vec<&str> = terms.iter().map(|(id, _)| id.as_str()).collect();
        let coefficients: Vec<f64> = terms.iter().map(|(_, c)| *c).collect();
        problem.add_equality_constraint(&variables, &coefficients, 0.0)?;
    }

    Ok(problem)
}

/// Collapse forward/reverse variable values into per-reaction net fluxes
fn net_fluxes(model: &Model, solution: Solution) -> FluxSolution {
    let mut fluxes = IndexMap::with_capacity(model.reactions.len());
    for reaction in model.reactions.values() {
        let forward = solution
            .variable_values
            .get(&reaction.get_forward_id())
            .copied()
            .unwrap_or(0.0);
        let reverse = solution
            .variable_values
            .get(&reaction.get_reverse_id())
            .copied()
            .unwrap_or(0.0);
        fluxes.insert(reaction.id.clone(), forward - reverse);
    }
    FluxSolution {
        objective_value: solution.objective_value,
        fluxes,
    }
}
