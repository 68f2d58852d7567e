//! The content graph every pipeline stage consumes and produces.
//!
//! # Responsibility
//! - Hold the merged entity collections with deterministic iteration order.
//! - Provide reference-rewriting helpers used by the identity resolver.
//!
//! # Invariants
//! - Storage is `BTreeMap` keyed by entity id, so every walk over the graph
//!   is reproducible across runs and package orderings.
//! - The graph itself enforces no domain rules; the conflict validator does.

use crate::model::entity::{Disease, EntityId, Examination, Symptom, Treatment};
use std::collections::BTreeMap;

/// In-memory content graph rooted at diseases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentGraph {
    pub diseases: BTreeMap<EntityId, Disease>,
    pub symptoms: BTreeMap<EntityId, Symptom>,
    pub examinations: BTreeMap<EntityId, Examination>,
    pub treatments: BTreeMap<EntityId, Treatment>,
}

impl ContentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entity count across all four collections.
    pub fn entity_count(&self) -> usize {
        self.diseases.len() + self.symptoms.len() + self.examinations.len() + self.treatments.len()
    }

    pub fn insert_disease(&mut self, disease: Disease) {
        self.diseases.insert(disease.id.clone(), disease);
    }

    pub fn insert_symptom(&mut self, symptom: Symptom) {
        self.symptoms.insert(symptom.id.clone(), symptom);
    }

    pub fn insert_examination(&mut self, examination: Examination) {
        self.examinations.insert(examination.id.clone(), examination);
    }

    pub fn insert_treatment(&mut self, treatment: Treatment) {
        self.treatments.insert(treatment.id.clone(), treatment);
    }

    /// Rewrites every disease-held symptom reference through `remap`.
    ///
    /// Secondary symptom lists are deduplicated after rewriting, since two
    /// distinct references may collapse onto one canonical symptom.
    pub fn remap_symptom_refs(&mut self, remap: &BTreeMap<EntityId, EntityId>) {
        if remap.is_empty() {
            return;
        }
        for disease in self.diseases.values_mut() {
            if let Some(canonical) = remap.get(&disease.main_symptom) {
                disease.main_symptom = canonical.clone();
            }
            for symptom_ref in &mut disease.secondary_symptoms {
                if let Some(canonical) = remap.get(symptom_ref) {
                    *symptom_ref = canonical.clone();
                }
            }
            dedup_refs(&mut disease.secondary_symptoms);
            let main_symptom = disease.main_symptom.clone();
            disease
                .secondary_symptoms
                .retain(|symptom_ref| *symptom_ref != main_symptom);
        }
    }

    /// Rewrites every symptom-held examination reference through `remap`.
    pub fn remap_examination_refs(&mut self, remap: &BTreeMap<EntityId, EntityId>) {
        if remap.is_empty() {
            return;
        }
        for symptom in self.symptoms.values_mut() {
            for exam_ref in &mut symptom.examinations {
                if let Some(canonical) = remap.get(exam_ref) {
                    *exam_ref = canonical.clone();
                }
            }
            dedup_refs(&mut symptom.examinations);
        }
    }

    /// Rewrites every symptom-held treatment reference through `remap`.
    pub fn remap_treatment_refs(&mut self, remap: &BTreeMap<EntityId, EntityId>) {
        if remap.is_empty() {
            return;
        }
        for symptom in self.symptoms.values_mut() {
            if let Some(treatment_ref) = &symptom.treatment {
                if let Some(canonical) = remap.get(treatment_ref) {
                    symptom.treatment = Some(canonical.clone());
                }
            }
        }
    }
}

fn dedup_refs(refs: &mut Vec<EntityId>) {
    let mut seen = std::collections::BTreeSet::new();
    refs.retain(|id| seen.insert(id.clone()));
}
