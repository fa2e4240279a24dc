//! This module provides the metabolite struct representing a metabolite

use derive_builder::Builder;
use indexmap::IndexMap;
use serde_json::Value;

/// Compartment tag for cytosolic metabolites
pub const CYTOSOL: &str = "cytosol";
/// Compartment tag for extracellular metabolites
pub const EXTRACELLULAR: &str = "extracellular";

/// Represents a metabolite
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None")]
    pub compartment: Option<String>,
    /// Electrical charge of the Metabolite
    #[builder(default = "0")]
    pub charge: i32,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    pub formula: Option<String>,
    /// Metabolite annotations
    #[builder(default = "IndexMap::new()")]
    pub annotation: IndexMap<String, Value>,
}

impl Metabolite {
    /// Create a placeholder metabolite from a namespaced identifier.
    ///
    /// The compartment is derived from the identifier suffix (`_c` for
    /// cytosol, `_e` for extracellular); other suffixes leave the
    /// compartment unset.
    pub fn from_id(id: &str) -> Metabolite {
        let compartment = match id.rsplit_once('_').map(|(_, suffix)| suffix) {
            Some("c") => Some(CYTOSOL.to_string()),
            Some("e") => Some(EXTRACELLULAR.to_string()),
            _ => None,
        };
        MetaboliteBuilder::default()
            .id(id.to_string())
            .compartment(compartment)
            .build()
            .unwrap()
    }

    /// Whether the metabolite lives in the extracellular compartment
    pub fn is_extracellular(&self) -> bool {
        self.compartment.as_deref() == Some(EXTRACELLULAR)
    }
}
