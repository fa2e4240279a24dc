use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

pub struct Configuration {
    /// Default lower flux bound for reactions
    pub lower_bound: f64,
    /// Default upper flux bound for reactions
    pub upper_bound: f64,
    /// Absolute flux magnitude above which a reaction counts as active
    /// during gap-filling. Absorbs solver numerical noise; retune only
    /// together with the gap-filling tests.
    pub flux_epsilon: f64,
    /// Default minimum objective fraction for gap-filling
    pub min_fraction: f64,
    /// Default maximum objective fraction for gap-filling
    pub max_fraction: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            flux_epsilon: 1e-6,
            min_fraction: 0.01,
            max_fraction: 0.5,
        }
    }
}
