//! Core integration engine for wardpack.
//! This crate is the single source of truth for content-integration invariants.

pub mod config;
pub mod directive;
pub mod export;
pub mod loader;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod prune;
pub mod reassign;
pub mod report;
pub mod resolve;
pub mod validate;
pub mod weight;

pub use config::{ConfigError, IntegrateConfig, DEFAULT_BASELINE_WEIGHT};
pub use directive::{load_directives, Directive, DirectiveError};
pub use export::{export_graph, write_engine_package, EnginePackage, ExportError};
pub use loader::{load_packages, LoadError, LoadResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{
    Disease, EntityId, EntityKind, Examination, FacilityKind, PackageTag, Symptom, Treatment,
    TreatmentKind,
};
pub use model::graph::ContentGraph;
pub use model::package::SourcePackage;
pub use pipeline::{run_pipeline, PipelineError, PipelineOptions, PipelineOutcome};
pub use report::IntegrationReport;
pub use resolve::{resolve_packages, MergeReason, MergeRecord, ResolveError, ResolveOutcome};
pub use validate::{validate_graph, ValidationOutcome, Violation};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
