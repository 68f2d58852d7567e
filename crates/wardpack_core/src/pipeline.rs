//! End-to-end integration pipeline.
//!
//! # Responsibility
//! - Run the stages in their fixed order: load, resolve, validate,
//!   reassign, prune, re-validate, normalize weights, export.
//! - Halt before export when any stage reports a hard violation.
//!
//! # Invariants
//! - No partial export: the output file is written only after every stage
//!   succeeded and the final validation pass is clean.
//! - Warnings never halt a run; only violations and stage errors do.

use crate::config::{ConfigError, IntegrateConfig};
use crate::directive::{load_directives, Directive, DirectiveError};
use crate::export::{export_graph, write_engine_package, ExportError};
use crate::loader::{load_packages, LoadError};
use crate::model::graph::ContentGraph;
use crate::prune::prune_graph;
use crate::reassign::{apply_reassignments, ReassignError};
use crate::report::IntegrationReport;
use crate::resolve::{resolve_packages, ResolveError};
use crate::validate::{validate_graph, Violation};
use crate::weight::normalize_weights;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Inputs for one integration run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directories scanned recursively for package JSON files.
    pub package_dirs: Vec<PathBuf>,
    /// Optional curator directive file.
    pub directives_path: Option<PathBuf>,
    /// Destination for the engine package. `None` runs check-only.
    pub out_path: Option<PathBuf>,
    pub config: IntegrateConfig,
}

/// Result of a completed run: the finalized graph and the curator report.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub graph: ContentGraph,
    pub report: IntegrationReport,
}

/// Any stage failure that halts a run.
#[derive(Debug)]
pub enum PipelineError {
    Config(ConfigError),
    Load(LoadError),
    Directive(DirectiveError),
    Resolve(ResolveError),
    /// Hard conflict violations; carries the report gathered so far so the
    /// caller can still show curators what was found.
    ValidationFailed {
        violations: Vec<Violation>,
        report: IntegrationReport,
    },
    Reassign(ReassignError),
    Export(ExportError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Load(e) => write!(f, "package loading failed: {e}"),
            Self::Directive(e) => write!(f, "directive loading failed: {e}"),
            Self::Resolve(e) => write!(f, "identity resolution failed: {e}"),
            Self::ValidationFailed { violations, .. } => {
                write!(f, "validation found {} hard violation(s)", violations.len())
            }
            Self::Reassign(e) => write!(f, "reassignment failed: {e}"),
            Self::Export(e) => write!(f, "export failed: {e}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Load(e) => Some(e),
            Self::Directive(e) => Some(e),
            Self::Resolve(e) => Some(e),
            Self::ValidationFailed { .. } => None,
            Self::Reassign(e) => Some(e),
            Self::Export(e) => Some(e),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LoadError> for PipelineError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<DirectiveError> for PipelineError {
    fn from(e: DirectiveError) -> Self {
        Self::Directive(e)
    }
}

impl From<ResolveError> for PipelineError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

impl From<ReassignError> for PipelineError {
    fn from(e: ReassignError) -> Self {
        Self::Reassign(e)
    }
}

impl From<ExportError> for PipelineError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Runs the full integration pipeline.
///
/// With `out_path` set, a clean run writes the engine package there. Without
/// it, the run stops after the final validation pass (check mode).
pub fn run_pipeline(options: &PipelineOptions) -> Result<PipelineOutcome, PipelineError> {
    options.config.validate()?;

    let packages = load_packages(&options.package_dirs)?;
    let directives: Vec<Directive> = match &options.directives_path {
        Some(path) => load_directives(path)?,
        None => Vec::new(),
    };
    info!(
        "event=pipeline_start packages={} directives={}",
        packages.len(),
        directives.len()
    );

    let mut report = IntegrationReport::default();
    report.packages_loaded = packages.len();

    let (mut graph, resolve_outcome) = resolve_packages(&packages, &directives)?;
    report.resolve = resolve_outcome;

    report.validation = validate_graph(&graph);
    if !report.validation.is_valid() {
        return Err(halt_on_violations(report));
    }

    report.reassign = Some(apply_reassignments(&mut graph, &options.config, &directives)?);
    report.prune = Some(prune_graph(&mut graph));

    // Reassignment and pruning only remove entities and rewrite departments,
    // but re-validate anyway so export never sees an inconsistent graph.
    let revalidation = validate_graph(&graph);
    if !revalidation.is_valid() {
        report.validation = revalidation;
        return Err(halt_on_violations(report));
    }
    let new_warnings: Vec<String> = revalidation
        .warnings
        .into_iter()
        .filter(|w| !report.validation.warnings.contains(w))
        .collect();
    report.validation.warnings.extend(new_warnings);

    report.weights = Some(normalize_weights(&mut graph, &options.config));

    if let Some(out_path) = &options.out_path {
        let package = export_graph(&graph)?;
        write_engine_package(&package, out_path)?;
        info!(
            "event=pipeline_complete out={} diseases={} symptoms={} examinations={} treatments={}",
            out_path.display(),
            package.diseases.len(),
            package.symptoms.len(),
            package.examinations.len(),
            package.treatments.len()
        );
    } else {
        info!("event=pipeline_check_complete entities={}", graph.entity_count());
    }

    Ok(PipelineOutcome { graph, report })
}

fn halt_on_violations(report: IntegrationReport) -> PipelineError {
    error!(
        "event=pipeline_halt violations={}",
        report.validation.violations.len()
    );
    PipelineError::ValidationFailed {
        violations: report.validation.violations.clone(),
        report,
    }
}
