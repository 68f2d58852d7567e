//! Curator-directed department reassignment.
//!
//! # Responsibility
//! - Apply move/restrict directives to the resolved graph in declaration
//!   order.
//! - Stop on the first broken directive; curator input is corrected, not
//!   auto-fixed.
//!
//! # Invariants
//! - Directives already applied when a later one fails stay committed; the
//!   pipeline aborts before export, so a partial graph never ships.
//! - Removed diseases leave their subtrees in place for the pruning pass.

use crate::config::IntegrateConfig;
use crate::directive::Directive;
use crate::model::entity::{EntityId, EntityKind};
use crate::model::graph::ContentGraph;
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reassignment errors; each aborts the run at the failing directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassignError {
    UnknownEntityReference { kind: EntityKind, id: EntityId },
    UnknownDepartment { department: String },
}

impl Display for ReassignError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEntityReference { kind, id } => {
                write!(f, "reassignment directive references unknown {kind} `{id}`")
            }
            Self::UnknownDepartment { department } => {
                write!(
                    f,
                    "reassignment directive references unknown department `{department}`"
                )
            }
        }
    }
}

impl Error for ReassignError {}

/// Summary of applied reassignments for the curator report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReassignOutcome {
    /// Disease id and its new department, per applied move.
    pub moved: Vec<(EntityId, String)>,
    /// Diseases removed by restrict directives.
    pub removed: Vec<EntityId>,
    /// Number of directives applied, including no-op restricts.
    pub applied: usize,
}

/// Applies every reassignment directive in `directives`, in order.
///
/// Merge directives are ignored here; the identity resolver owns those.
/// Each directive sees the graph state produced by its predecessors.
///
/// # Errors
/// Returns at the first unknown disease or department. Directives before
/// the failure remain committed to `graph`; the caller is expected to
/// abort the run.
pub fn apply_reassignments(
    graph: &mut ContentGraph,
    config: &IntegrateConfig,
    directives: &[Directive],
) -> Result<ReassignOutcome, ReassignError> {
    let mut outcome = ReassignOutcome::default();

    for directive in directives {
        match directive {
            Directive::Merge { .. } => continue,
            Directive::MoveToDepartment {
                disease,
                department,
            } => {
                if !config.knows_department(department) {
                    error!(
                        "event=reassign_abort reason=unknown_department department={department} applied={}",
                        outcome.applied
                    );
                    return Err(ReassignError::UnknownDepartment {
                        department: department.clone(),
                    });
                }
                let Some(entry) = graph.diseases.get_mut(disease) else {
                    error!(
                        "event=reassign_abort reason=unknown_disease disease={disease} applied={}",
                        outcome.applied
                    );
                    return Err(ReassignError::UnknownEntityReference {
                        kind: EntityKind::Disease,
                        id: disease.clone(),
                    });
                };
                entry.department = department.clone();
                outcome.moved.push((disease.clone(), department.clone()));
                outcome.applied += 1;
            }
            Directive::RestrictToCategory {
                department,
                required_tag,
            } => {
                if !config.knows_department(department) {
                    error!(
                        "event=reassign_abort reason=unknown_department department={department} applied={}",
                        outcome.applied
                    );
                    return Err(ReassignError::UnknownDepartment {
                        department: department.clone(),
                    });
                }
                let removed: Vec<EntityId> = graph
                    .diseases
                    .values()
                    .filter(|d| {
                        d.department == *department && !d.tags.iter().any(|t| t == required_tag)
                    })
                    .map(|d| d.id.clone())
                    .collect();
                for id in &removed {
                    graph.diseases.remove(id);
                }
                info!(
                    "event=restrict_applied department={department} required_tag={required_tag} removed={}",
                    removed.len()
                );
                outcome.removed.extend(removed);
                outcome.applied += 1;
            }
        }
    }

    info!(
        "event=reassign_complete applied={} moved={} removed={}",
        outcome.applied,
        outcome.moved.len(),
        outcome.removed.len()
    );
    Ok(outcome)
}
