//! Unused-entity elimination.
//!
//! # Responsibility
//! - Compute the reachable closure from retained diseases and drop every
//!   symptom, examination and treatment outside it.
//!
//! # Invariants
//! - Pruning is deterministic and idempotent; a second run removes nothing.
//! - Diseases are never pruned; only reassignment removes diseases.

use crate::model::entity::EntityId;
use crate::model::graph::ContentGraph;
use log::info;
use serde::Serialize;
use std::collections::BTreeSet;

/// What one pruning pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneOutcome {
    pub removed_symptoms: Vec<EntityId>,
    pub removed_examinations: Vec<EntityId>,
    pub removed_treatments: Vec<EntityId>,
}

impl PruneOutcome {
    pub fn removed_count(&self) -> usize {
        self.removed_symptoms.len()
            + self.removed_examinations.len()
            + self.removed_treatments.len()
    }
}

/// Removes every symptom, examination and treatment not reachable from a
/// retained disease.
pub fn prune_graph(graph: &mut ContentGraph) -> PruneOutcome {
    let mut kept_symptoms: BTreeSet<EntityId> = BTreeSet::new();
    for disease in graph.diseases.values() {
        for symptom_ref in disease.symptom_refs() {
            kept_symptoms.insert(symptom_ref.clone());
        }
    }

    let mut kept_examinations: BTreeSet<EntityId> = BTreeSet::new();
    let mut kept_treatments: BTreeSet<EntityId> = BTreeSet::new();
    for symptom_id in &kept_symptoms {
        let Some(symptom) = graph.symptoms.get(symptom_id) else {
            // Dangling disease reference; the validator reports it, pruning
            // just skips it.
            continue;
        };
        kept_examinations.extend(symptom.examinations.iter().cloned());
        if let Some(treatment_ref) = &symptom.treatment {
            kept_treatments.insert(treatment_ref.clone());
        }
    }

    let mut outcome = PruneOutcome::default();
    outcome.removed_symptoms = drop_complement(&mut graph.symptoms, &kept_symptoms);
    outcome.removed_examinations = drop_complement(&mut graph.examinations, &kept_examinations);
    outcome.removed_treatments = drop_complement(&mut graph.treatments, &kept_treatments);

    info!(
        "event=prune_complete removed_symptoms={} removed_examinations={} removed_treatments={}",
        outcome.removed_symptoms.len(),
        outcome.removed_examinations.len(),
        outcome.removed_treatments.len()
    );
    outcome
}

fn drop_complement<T>(
    entities: &mut std::collections::BTreeMap<EntityId, T>,
    kept: &BTreeSet<EntityId>,
) -> Vec<EntityId> {
    let unused: Vec<EntityId> = entities
        .keys()
        .filter(|id| !kept.contains(*id))
        .cloned()
        .collect();
    for id in &unused {
        entities.remove(id);
    }
    unused
}
