//! Provides struct representing an optimization problem
//!
//! The problem is assembled as plain data (variables, constraints, a linear
//! objective) and handed to the `microlp` solver on [`Problem::solve`].

use indexmap::IndexMap;
use microlp::{ComparisonOp, OptimizationDirection};
use thiserror::Error;

/// A linear optimization problem
#[derive(Debug, Clone)]
pub struct Problem {
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: Vec<Constraint>,
    /// Objective to optimize
    objective: Objective,
}

/// A bounded continuous variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub id: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Represents a linear constraint in an optimization problem
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        terms: Vec<ConstraintTerm>,
        equals: f64,
    },
    /// Represents a range constraint,
    /// where `lower_bound` <= `terms` <= `upper_bound`
    Inequality {
        terms: Vec<ConstraintTerm>,
        lower_bound: f64,
        upper_bound: f64,
    },
}

/// Represents a single term in a constraint, specifically the
/// multiplication of the variable by the coefficient
#[derive(Debug, Clone)]
pub struct ConstraintTerm {
    pub variable: String,
    pub coefficient: f64,
}

/// The linear objective of an optimization problem
#[derive(Debug, Clone)]
struct Objective {
    /// Map of variable id to objective coefficient
    terms: IndexMap<String, f64>,
    /// Sense of the objective, see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

/// Represents the sense of the objective, whether it should be maximized or
/// minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// Solution to a successfully optimized [`Problem`]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Optimized value of the objective
    pub objective_value: f64,
    /// Values of the variables at the optimum, keyed by variable id
    pub variable_values: IndexMap<String, f64>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            variables: IndexMap::new(),
            constraints: Vec::new(),
            objective: Objective {
                terms: IndexMap::new(),
                sense,
            },
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.sense = sense;
    }

    // region Adding Variables
    /// Create a new continuous variable and add it to the optimization
    /// problem
    pub fn add_variable(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if self.variables.contains_key(id) {
            return Err(ProblemError::VariableIdAlreadyExists);
        }
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        self.variables.insert(
            id.to_string(),
            Variable {
                id: id.to_string(),
                lower_bound,
                upper_bound,
            },
        );
        Ok(())
    }

    /// Update the bounds of a variable
    pub fn update_variable_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        match self.variables.get_mut(id) {
            Some(variable) => {
                variable.lower_bound = lower_bound;
                variable.upper_bound = upper_bound;
            }
            None => return Err(ProblemError::NonExistentVariable(id.to_string())),
        };
        Ok(())
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Create a new equality constraint and add it to the problem
    pub fn add_equality_constraint(
        &mut self,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        let terms = self.zip_into_terms(variables, coefficients)?;
        self.constraints.push(Constraint::Equality { terms, equals });
        Ok(())
    }

    /// Create a new range constraint and add it to the problem
    pub fn add_inequality_constraint(
        &mut self,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidConstraintBounds);
        }
        let terms = self.zip_into_terms(variables, coefficients)?;
        self.constraints.push(Constraint::Inequality {
            terms,
            lower_bound,
            upper_bound,
        });
        Ok(())
    }

    /// Take a slice of variable ids and a slice of coefficients and zip them
    /// together into a vec of ConstraintTerms, checking that every variable
    /// exists in the problem
    fn zip_into_terms(
        &self,
        variables: &[&str],
        coefficients: &[f64],
    ) -> Result<Vec<ConstraintTerm>, ProblemError> {
        variables
            .iter()
            .zip(coefficients)
            .map(|(variable, coefficient)| {
                if !self.variables.contains_key(*variable) {
                    return Err(ProblemError::NonExistentVariable(variable.to_string()));
                }
                Ok(ConstraintTerm {
                    variable: variable.to_string(),
                    coefficient: *coefficient,
                })
            })
            .collect()
    }
    // endregion Adding Constraints

    // region Objective Terms
    /// Set the objective coefficient of a variable
    pub fn set_objective_term(
        &mut self,
        variable: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        if !self.variables.contains_key(variable) {
            return Err(ProblemError::NonExistentVariable(variable.to_string()));
        }
        self.objective.terms.insert(variable.to_string(), coefficient);
        Ok(())
    }

    /// Remove all terms from the objective
    pub fn remove_all_objective_terms(&mut self) {
        self.objective.terms.clear();
    }
    // endregion Objective Terms

    /// Solve the problem with the configured solver backend
    ///
    /// # Errors
    /// [`ProblemError::Infeasible`] when no assignment satisfies the
    /// constraints, [`ProblemError::Unbounded`] when the objective can grow
    /// without limit.
    pub fn solve(&self) -> Result<Solution, ProblemError> {
        let direction = match self.objective.sense {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut lp = microlp::Problem::new(direction);

        let mut handles: IndexMap<String, microlp::Variable> =
            IndexMap::with_capacity(self.variables.len());
        for (id, variable) in &self.variables {
            let coefficient = self.objective.terms.get(id).copied().unwrap_or(0.0);
            let handle = lp.add_var(coefficient, (variable.lower_bound, variable.upper_bound));
            handles.insert(id.clone(), handle);
        }

        for constraint in &self.constraints {
            match constraint {
                Constraint::Equality { terms, equals } => {
                    lp.add_constraint(Self::lp_terms(terms, &handles), ComparisonOp::Eq, *equals);
                }
                Constraint::Inequality {
                    terms,
                    lower_bound,
                    upper_bound,
                } => {
                    lp.add_constraint(
                        Self::lp_terms(terms, &handles),
                        ComparisonOp::Ge,
                        *lower_bound,
                    );
                    lp.add_constraint(
                        Self::lp_terms(terms, &handles),
                        ComparisonOp::Le,
                        *upper_bound,
                    );
                }
            }
        }

        let solved = lp.solve().map_err(|err| match err {
            microlp::Error::Infeasible => ProblemError::Infeasible,
            microlp::Error::Unbounded => ProblemError::Unbounded,
            #[allow(unreachable_patterns)]
            other => ProblemError::Solver(other.to_string()),
        })?;

        let mut variable_values = IndexMap::with_capacity(handles.len());
        for (id, handle) in &handles {
            variable_values.insert(id.clone(), solved[*handle]);
        }
        Ok(Solution {
            objective_value: solved.objective(),
            variable_values,
        })
    }

    fn lp_terms(
        terms: &[ConstraintTerm],
        handles: &IndexMap<String, microlp::Variable>,
    ) -> Vec<(microlp::Variable, f64)> {
        terms
            .iter()
            .map(|term| (handles[term.variable.as_str()], term.coefficient))
            .collect()
    }
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing
    /// variable
    #[error("tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add a variable with invalid bounds
    #[error("tried to add a variable with lower_bound > upper_bound")]
    InvalidVariableBounds,
    /// Error when trying to add a range constraint with invalid bounds
    #[error("tried to add a range constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when referencing a variable that doesn't exist
    #[error("tried to access a variable that doesn't exist: {0}")]
    NonExistentVariable(String),
    /// The problem has no feasible solution under the current constraints
    #[error("the optimization problem is infeasible")]
    Infeasible,
    /// The objective value is not bounded
    #[error("the optimization problem is unbounded")]
    Unbounded,
    /// The solver backend failed for another reason
    #[error("solver failure: {0}")]
    Solver(String),
}
