//! Reconstruction of genome-scale metabolic models
//!
//! The orchestrator turns one of three inputs (protein sequences,
//! similarity hits, or an existing network) into a finished model: a draft
//! is built against the reference database, gap-filled with two rounds of
//! parsimonious flux minimization, annotated, and finished with a global
//! exchange-bound policy.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{info, warn};

pub mod align;
pub mod annotate;
pub mod database;
pub mod draft;
pub mod gapfill;
pub mod medium;

use crate::configuration::CONFIGURATION;
use crate::io::json::JsonError;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::EXCHANGE_PREFIX;
use crate::optimize::flux::flux_balance;
use align::{Aligner, AlignError};
use annotate::{annotate, ObjectiveAnnotation};
use database::ReferenceDatabase;
use draft::{apply_gene_names, build_draft, genes_to_reactions, read_hits, DraftError,
    DraftSummary};
use gapfill::{find_active_reactions, integrate, set_base_inputs, GapfillError, GapfillStep};
use medium::Medium;

/// What kind of input file a reconstruction starts from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// A FASTA file of protein sequences, to be aligned first
    Sequences,
    /// A precomputed tabular similarity-hit file
    Hits,
    /// An existing serialized network to extend
    Network,
}

/// Gram-stain classification of the organism being reconstructed
///
/// Selects which of the universal bag's biomass formulations becomes the
/// objective reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GramStain {
    Positive,
    Negative,
}

impl GramStain {
    /// The id of the biomass reaction this classification selects
    pub fn objective_id(&self) -> &'static str {
        match self {
            GramStain::Positive => "biomass_GmPos",
            GramStain::Negative => "biomass_GmNeg",
        }
    }
}

impl FromStr for GramStain {
    type Err = ReconstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(GramStain::Positive),
            "negative" => Ok(GramStain::Negative),
            other => Err(ReconstructionError::UnrecognizedGram(other.to_string())),
        }
    }
}

/// Options controlling a reconstruction run
#[derive(Builder, Clone, Debug)]
pub struct ReconstructionOptions {
    /// Growth medium made available during gap-filling
    #[builder(default = "Medium::default()")]
    pub media: Medium,
    /// Reaction ids forced to carry flux during gap-filling
    #[builder(default = "None")]
    pub tasks: Option<Vec<String>>,
    /// Organism code whose reference genes augment the similarity hits
    #[builder(default = "None")]
    pub organism: Option<String>,
    /// Minimum objective fraction for gap-filling
    #[builder(default = "CONFIGURATION.read().unwrap().min_fraction")]
    pub min_fraction: f64,
    /// Maximum objective fraction for gap-filling
    #[builder(default = "CONFIGURATION.read().unwrap().max_fraction")]
    pub max_fraction: f64,
    /// Gram-stain classification selecting the objective reaction
    #[builder(default = "GramStain::Positive")]
    pub gram: GramStain,
    /// Id given to the reconstructed model
    #[builder(default = "None")]
    pub model_id: Option<String>,
    /// Processor count passed through to the aligner
    #[builder(default = "None")]
    pub processors: Option<u32>,
    /// Whether to gap-fill at all
    #[builder(default = "true")]
    pub gapfill: bool,
    /// Whether the finished model's exchanges end up fully open or closed
    #[builder(default = "true")]
    pub open_exchanges: bool,
    /// Similarity-search binary, required for sequence input
    #[builder(default = "None")]
    pub aligner: Option<Aligner>,
}

impl Default for ReconstructionOptions {
    fn default() -> Self {
        ReconstructionOptionsBuilder::default()
            .build()
            .unwrap_or_else(|_| unreachable!("all options have defaults"))
    }
}

/// Counts and flux describing a finished reconstruction
#[derive(Clone, Debug, Default)]
pub struct ReconstructionSummary {
    /// Mapping statistics from draft construction
    pub draft: DraftSummary,
    pub draft_reactions: usize,
    pub draft_metabolites: usize,
    pub draft_genes: usize,
    /// Reactions added beyond the draft by gap-filling
    pub gapfilled_reactions: usize,
    /// Metabolites added beyond the draft by gap-filling
    pub gapfilled_metabolites: usize,
    pub final_reactions: usize,
    pub final_metabolites: usize,
    /// Objective flux of the finished model under its final bounds
    pub objective_flux: f64,
}

/// A finished reconstruction
#[derive(Clone, Debug)]
pub struct Reconstruction {
    pub model: Model,
    pub summary: ReconstructionSummary,
}

/// Reconstruct a metabolic model from an input file
///
/// Sequence and hit inputs are drafted against the reference database and
/// gap-filled in two rounds (task-constrained, then medium-constrained
/// after the complete-medium uptakes are opened). Network inputs skip
/// drafting, keep their own objective reaction, and receive a single
/// gap-filling round.
///
/// # Errors
/// Fails on a missing input path, on an unresolvable objective, and on an
/// infeasible gap-filling optimization; no partial model is returned.
pub fn reconstruct(
    input: &Path,
    kind: InputKind,
    database: &ReferenceDatabase,
    options: &ReconstructionOptions,
) -> Result<Reconstruction, ReconstructionError> {
    if !input.exists() {
        return Err(ReconstructionError::InputNotFound(input.to_path_buf()));
    }

    let (min_fraction, max_fraction) =
        clamp_fractions(options.min_fraction, options.max_fraction);
    let mut objective_id = options.gram.objective_id().to_string();

    // Intake: all three input kinds converge on a draft model
    let mut draft_summary = DraftSummary::default();
    let mut model = match kind {
        InputKind::Sequences => {
            let aligner = options
                .aligner
                .as_ref()
                .ok_or(ReconstructionError::AlignerNotConfigured)?;
            let hits = align::hits_path(input);
            info!(input = %input.display(), "aligning sequences against the reference database");
            aligner.search(input, &hits, options.processors)?;
            draft_from_hits(&hits, database, options, &mut draft_summary)?
        }
        InputKind::Hits => draft_from_hits(input, database, options, &mut draft_summary)?,
        InputKind::Network => {
            let model = Model::read_json(input)?;
            objective_id = model
                .objective_reaction_id()
                .ok_or(ReconstructionError::MissingObjective)?
                .to_string();
            model
        }
    };

    let draft_reaction_ids: IndexSet<String> = model.reactions.keys().cloned().collect();
    let draft_metabolite_ids: IndexSet<String> = model.metabolites.keys().cloned().collect();
    let draft_genes = model.genes.len();

    if options.gapfill {
        // Uptake magnitudes for the compounds of the chosen medium that the
        // universal bag can exchange
        let magnitude = CONFIGURATION.read().unwrap().upper_bound;
        let mut gapfill_medium: IndexMap<String, f64> = IndexMap::new();
        for compound in options.media.compounds() {
            let exchange_id = format!("{EXCHANGE_PREFIX}{compound}");
            if database.universal.has_reaction(&exchange_id) {
                gapfill_medium.insert(exchange_id, magnitude);
            }
        }

        let preserve_objective = kind == InputKind::Network;
        info!("gap-filling: task-constrained round");
        let new_ids = find_active_reactions(
            &model,
            &database.universal,
            &gapfill_medium,
            options.tasks.as_deref(),
            &objective_id,
            min_fraction,
            max_fraction,
            GapfillStep::First,
            preserve_objective,
        )?;
        integrate(
            &mut model,
            &database.universal,
            &new_ids,
            &gapfill_medium,
            &objective_id,
            GapfillStep::First,
        )?;

        if kind != InputKind::Network {
            // A freshly drafted model gets a second round against the
            // complete medium; an existing network already encodes its
            // medium-independent structure
            set_base_inputs(&mut model, &database.universal)?;
            info!("gap-filling: medium-constrained round");
            let media_ids = find_active_reactions(
                &model,
                &database.universal,
                &gapfill_medium,
                options.tasks.as_deref(),
                &objective_id,
                min_fraction,
                max_fraction,
                GapfillStep::Second,
                preserve_objective,
            )?;
            integrate(
                &mut model,
                &database.universal,
                &media_ids,
                &gapfill_medium,
                &objective_id,
                GapfillStep::Second,
            )?;
            annotate(&mut model, ObjectiveAnnotation::Biomass);
        } else {
            annotate(&mut model, ObjectiveAnnotation::Reaction(objective_id.clone()));
        }
    } else {
        annotate(&mut model, ObjectiveAnnotation::Biomass);
    }

    finalize_exchange_bounds(&mut model, options.open_exchanges);

    let summary = summarize(
        &model,
        draft_summary,
        &draft_reaction_ids,
        &draft_metabolite_ids,
        draft_genes,
    )?;
    info!(
        draft_reactions = summary.draft_reactions,
        gapfilled_reactions = summary.gapfilled_reactions,
        final_reactions = summary.final_reactions,
        objective_flux = summary.objective_flux,
        "reconstruction finished"
    );
    Ok(Reconstruction { model, summary })
}

/// Build a draft model from a similarity-hit file
fn draft_from_hits(
    hits_path: &Path,
    database: &ReferenceDatabase,
    options: &ReconstructionOptions,
    summary: &mut DraftSummary,
) -> Result<Model, ReconstructionError> {
    let hits = read_hits(hits_path)?;
    let (reaction_genes, mut draft_summary) =
        genes_to_reactions(&hits, database, options.organism.as_deref());
    let mut model = build_draft(
        &reaction_genes,
        database,
        options.model_id.as_deref(),
        &mut draft_summary,
    )?;
    apply_gene_names(&mut model, database);
    *summary = draft_summary;
    Ok(model)
}

/// Clamp out-of-range objective fractions to their defaults, warning rather
/// than failing
fn clamp_fractions(min_fraction: f64, max_fraction: f64) -> (f64, f64) {
    let (default_min, default_max) = {
        let configuration = CONFIGURATION.read().unwrap();
        (configuration.min_fraction, configuration.max_fraction)
    };
    let mut min_fraction = min_fraction;
    let mut max_fraction = max_fraction;

    if min_fraction <= 0.0 || min_fraction > 1.0 {
        warn!(
            min_fraction,
            default = default_min,
            "improper minimum fraction, falling back to the default"
        );
        min_fraction = default_min;
    }
    if max_fraction <= 0.0 || max_fraction > 1.0 {
        warn!(
            max_fraction,
            default = default_max,
            "improper maximum fraction, falling back to the default"
        );
        max_fraction = default_max;
    }
    if max_fraction < min_fraction {
        warn!(
            min_fraction,
            max_fraction, "maximum fraction below minimum, setting minimum to half maximum"
        );
        min_fraction = max_fraction * 0.5;
    }
    (min_fraction, max_fraction)
}

/// Apply the global exchange-bound policy: fully open or fully closed
fn finalize_exchange_bounds(model: &mut Model, open_exchanges: bool) {
    let bounds = if open_exchanges {
        let configuration = CONFIGURATION.read().unwrap();
        (configuration.lower_bound, configuration.upper_bound)
    } else {
        (0.0, 0.0)
    };
    for reaction in model.reactions.values_mut() {
        if reaction.is_exchange() {
            reaction.set_bounds(bounds.0, bounds.1);
        }
    }
}

/// Collect the final counts and objective flux of a finished model
fn summarize(
    model: &Model,
    draft: DraftSummary,
    draft_reaction_ids: &IndexSet<String>,
    draft_metabolite_ids: &IndexSet<String>,
    draft_genes: usize,
) -> Result<ReconstructionSummary, ReconstructionError> {
    let gapfilled_reactions = model
        .reactions
        .keys()
        .filter(|id| !draft_reaction_ids.contains(*id))
        .count();
    let gapfilled_metabolites = model
        .metabolites
        .keys()
        .filter(|id| !draft_metabolite_ids.contains(*id))
        .count();
    let objective_flux = if model.objective.is_empty() {
        0.0
    } else {
        flux_balance(model)
            .map_err(GapfillError::from)?
            .objective_value
    };
    Ok(ReconstructionSummary {
        draft,
        draft_reactions: draft_reaction_ids.len(),
        draft_metabolites: draft_metabolite_ids.len(),
        draft_genes,
        gapfilled_reactions,
        gapfilled_metabolites,
        final_reactions: model.reactions.len(),
        final_metabolites: model.metabolites.len(),
        objective_flux,
    })
}

/// Errors that abort a reconstruction
#[derive(Debug, Error)]
pub enum ReconstructionError {
    /// The input path does not exist on disk
    #[error("input path does not exist: {0}")]
    InputNotFound(PathBuf),
    /// The gram-stain value names no known biomass formulation
    #[error("unrecognized gram stain value {0:?}, expected \"positive\" or \"negative\"")]
    UnrecognizedGram(String),
    /// Sequence input was given without an aligner to search with
    #[error("sequence input requires a configured aligner")]
    AlignerNotConfigured,
    /// A network input carries no objective to gap-fill towards
    #[error("input network has no objective reaction")]
    MissingObjective,
    #[error(transparent)]
    Align(#[from] AlignError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Gapfill(#[from] GapfillError),
    #[error(transparent)]
    Io(#[from] JsonError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::{Reaction, ReactionBuilder};
    use std::io::Write;

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

    /// A universal bag where biomass is reachable from cpdA through a
    /// two-step chain, every complete-medium compound is consumable, and
    /// one reaction pair stays disconnected
    fn toy_database() -> ReferenceDatabase {
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

        // Every complete-medium compound gets an exchange and a consumer,
        // so forced base uptake has somewhere to go
        for (index, compound) in medium::COMPLETE.iter().copied().enumerate() {
            universal
                .add_reaction(reaction(
                    &format!("EX_{compound}"),
                    &[(compound, -1.0)],
                    -1000.,
                    1000.,
                ))
                .unwrap();
            universal
                .add_reaction(reaction(
                    &format!("rxn8{index:04}_c"),
                    &[(compound, -1.0), ("cpd90000_c", 1.0)],
                    0.,
                    1000.,
                ))
                .unwrap();
        }
        universal
            .add_reaction(reaction("rxn90000_c", &[("cpd90000_c", -1.0)], 0., 1000.))
            .unwrap();

        let mut gene_reactions = IndexMap::new();
        gene_reactions.insert("org:g1".to_string(), vec!["rxnT01".to_string()]);
        gene_reactions.insert("org:g2".to_string(), vec!["rxn77777".to_string()]);

        ReferenceDatabase::from_parts(universal, gene_reactions, IndexMap::new())
    }

    fn write_hits_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("query.hits.out");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "seq1\torg:g1\t98.5").unwrap();
        path
    }

    fn options() -> ReconstructionOptions {
        ReconstructionOptionsBuilder::default()
            .media(Medium::Compounds(vec!["cpdA_e".to_string()]))
            .model_id(Some("toy".to_string()))
            .build()
            .unwrap()
    }

    #[test]
    fn missing_input_fails_before_any_work() {
        let database = toy_database();
        let result = reconstruct(
            Path::new("/nonexistent/input.out"),
            InputKind::Hits,
            &database,
            &options(),
        );
        assert!(matches!(
            result,
            Err(ReconstructionError::InputNotFound(_))
        ));
    }

    #[test]
    fn gram_stain_parsing() {
        assert_eq!("positive".parse::<GramStain>().unwrap(), GramStain::Positive);
        assert_eq!(
            GramStain::Negative.objective_id(),
            "biomass_GmNeg"
        );
        assert!(matches!(
            "aerobic".parse::<GramStain>(),
            Err(ReconstructionError::UnrecognizedGram(_))
        ));
    }

    #[test]
    fn fraction_clamping_recovers_with_defaults() {
        assert_eq!(clamp_fractions(0.01, 0.5), (0.01, 0.5));
        // Out-of-range values fall back to the defaults
        assert_eq!(clamp_fractions(-0.5, 0.5), (0.01, 0.5));
        assert_eq!(clamp_fractions(0.01, 1.5), (0.01, 0.5));
        // Inverted fractions pull the minimum to half the maximum
        assert_eq!(clamp_fractions(0.8, 0.4), (0.2, 0.4));
    }

    #[test]
    fn hits_input_is_drafted_and_gap_filled_end_to_end() {
        let database = toy_database();
        let dir = tempfile::tempdir().unwrap();
        let hits = write_hits_file(&dir);

        let reconstruction =
            reconstruct(&hits, InputKind::Hits, &database, &options()).unwrap();
        let model = &reconstruction.model;

        // The draft contributed the transport reaction with its gene
        assert!(model.has_reaction("rxnT01_c"));
        assert!(model.genes.contains_key("seq1"));
        // Gap-filling pulled in the chain to biomass but not the
        // disconnected pair
        assert!(model.has_reaction("rxn00001_c"));
        assert!(model.has_reaction("rxn00002_c"));
        assert!(model.has_reaction("biomass_GmPos"));
        assert!(!model.has_reaction("rxn00003_c"));
        assert_eq!(model.objective_reaction_id(), Some("biomass_GmPos"));

        // Open exchanges by default
        for exchange in model.exchanges() {
            assert_eq!(exchange.bounds(), (-1000.0, 1000.0));
        }

        let summary = &reconstruction.summary;
        assert_eq!(summary.draft_reactions, 1);
        assert!(summary.gapfilled_reactions > 0);
        assert_eq!(summary.final_reactions, model.reactions.len());
        assert!(summary.objective_flux > 0.0);
        assert_eq!(summary.draft.hit_genes, 1);
    }

    #[test]
    fn closed_exchange_policy_zeroes_every_exchange() {
        let database = toy_database();
        let dir = tempfile::tempdir().unwrap();
        let hits = write_hits_file(&dir);

        let mut options = options();
        options.open_exchanges = false;
        let reconstruction =
            reconstruct(&hits, InputKind::Hits, &database, &options).unwrap();

        let mut exchange_count = 0;
        for exchange in reconstruction.model.exchanges() {
            assert_eq!(exchange.bounds(), (0.0, 0.0));
            exchange_count += 1;
        }
        assert!(exchange_count > 0);
        // With every exchange closed nothing can flow
        assert!(reconstruction.summary.objective_flux.abs() < 1e-9);
    }

    #[test]
    fn skipping_gapfill_preserves_the_draft_exactly() {
        let database = toy_database();
        let dir = tempfile::tempdir().unwrap();
        let hits = write_hits_file(&dir);

        let mut options = options();
        options.gapfill = false;
        let reconstruction =
            reconstruct(&hits, InputKind::Hits, &database, &options).unwrap();
        let model = &reconstruction.model;

        // Exactly the draft's reactions, metabolites, and genes
        assert_eq!(model.reactions.keys().collect::<Vec<_>>(), vec!["rxnT01_c"]);
        assert_eq!(model.metabolites.len(), 2);
        assert_eq!(model.genes.len(), 1);
        assert_eq!(reconstruction.summary.gapfilled_reactions, 0);
        assert_eq!(reconstruction.summary.gapfilled_metabolites, 0);
        // Annotation was still applied
        assert!(model.reactions["rxnT01_c"].annotation.contains_key("sbo"));
    }

    #[test]
    fn network_input_keeps_its_objective_and_skips_the_second_round() {
        let database = toy_database();

        // An existing network: the chain is present but the final step is
        // missing; its own objective reaction is already inside
        let mut network = Model::new_empty();
        network
            .import_reaction_from(&database.universal, "EX_cpdA_e")
            .unwrap();
        network
            .import_reaction_from(&database.universal, "rxnT01_c")
            .unwrap();
        network
            .import_reaction_from(&database.universal, "rxn00001_c")
            .unwrap();
        network
            .import_reaction_from(&database.universal, "biomass_GmPos")
            .unwrap();
        network.set_objective("biomass_GmPos").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        network.write_json(&path).unwrap();

        let reconstruction =
            reconstruct(&path, InputKind::Network, &database, &options()).unwrap();
        let model = &reconstruction.model;

        // The missing chain step was filled in
        assert!(model.has_reaction("rxn00002_c"));
        assert_eq!(model.objective_reaction_id(), Some("biomass_GmPos"));
        // No second round ran: the complete-medium uptakes were never
        // imported
        assert!(!model.has_reaction("EX_cpd00051_e"));
        assert!(reconstruction.summary.objective_flux > 0.0);
    }

    #[test]
    fn unsupportable_task_surfaces_infeasibility() {
        let database = toy_database();
        let dir = tempfile::tempdir().unwrap();
        let hits = write_hits_file(&dir);

        let mut options = options();
        options.tasks = Some(vec!["rxn00003_c".to_string()]);
        let result = reconstruct(&hits, InputKind::Hits, &database, &options);
        assert!(matches!(
            result,
            Err(ReconstructionError::Gapfill(GapfillError::Infeasible))
        ));
    }

    #[test]
    fn sequence_input_without_aligner_is_rejected() {
        let database = toy_database();
        let dir = tempfile::tempdir().unwrap();
        let query = dir.path().join("query.fasta");
        std::fs::write(&query, ">seq1\nMKV\n").unwrap();

        let result = reconstruct(&query, InputKind::Sequences, &database, &options());
        assert!(matches!(
            result,
            Err(ReconstructionError::AlignerNotConfigured)
        ));
    }
}
