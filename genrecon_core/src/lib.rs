//! Core rust implementation of GenRecon, a crate for reconstructing
//! genome-scale metabolic models and gap-filling them with a two-phase
//! parsimonious flux balance analysis procedure.

pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod reconstruct;
pub mod utils;
