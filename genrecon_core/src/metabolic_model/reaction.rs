//! This module provides a struct for representing reactions

use derive_builder::Builder;
use indexmap::IndexMap;
use serde_json::Value;

use super::model::Gpr;
use crate::configuration::CONFIGURATION;

/// Identifier prefix marking exchange reactions
///
/// The exchange reaction for a metabolite is named by appending the
/// metabolite identifier to this prefix.
pub const EXCHANGE_PREFIX: &str = "EX_";

/// Represents a reaction in the metabolic model
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene reaction rule describing which genes can catalyze the reaction
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Reaction Annotations
    #[builder(default = "IndexMap::new()")]
    pub annotation: IndexMap<String, Value>,
}

impl Reaction {
    /// Whether this reaction is an exchange reaction, per the naming
    /// convention
    pub fn is_exchange(&self) -> bool {
        self.id.starts_with(EXCHANGE_PREFIX)
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower_bound, self.upper_bound)
    }

    pub fn set_bounds(&mut self, lower_bound: f64, upper_bound: f64) {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
    }

    /// Determine the id associated with the forward flux component in an
    /// optimization problem
    pub fn get_forward_id(&self) -> String {
        format!("{}__forward", &self.id)
    }

    /// Determine the id associated with the reverse flux component in an
    /// optimization problem
    pub fn get_reverse_id(&self) -> String {
        format!("{}__reverse", &self.id)
    }

    /// Determine the lower bound of the variable associated with the forward
    /// flux component
    pub(crate) fn get_forward_lower_bound(&self) -> f64 {
        if self.lower_bound > 0f64 {
            self.lower_bound
        } else {
            0f64
        }
    }

    /// Determine the upper bound of the variable associated with the forward
    /// flux component
    pub(crate) fn get_forward_upper_bound(&self) -> f64 {
        if self.upper_bound > 0f64 {
            self.upper_bound
        } else {
            0f64
        }
    }

    /// Determine the lower bound of the variable associated with the reverse
    /// flux component
    pub(crate) fn get_reverse_lower_bound(&self) -> f64 {
        if self.upper_bound < 0f64 {
            -self.upper_bound
        } else {
            0f64
        }
    }

    /// Determine the upper bound of the variable associated with the reverse
    /// flux component
    pub(crate) fn get_reverse_upper_bound(&self) -> f64 {
        if self.lower_bound < 0f64 {
            -self.lower_bound
        } else {
            0f64
        }
    }
}
