//! Conflict validation over the resolved content graph.
//!
//! # Responsibility
//! - Verify every domain invariant the downstream engine requires.
//! - Report every problem in one pass so curators fix content once.
//!
//! # Invariants
//! - Validation never mutates the graph.
//! - Checks are independent and never short-circuit each other.
//! - Violations are hard failures; warnings never affect the exit code.

use crate::model::entity::{EntityId, EntityKind, FacilityKind};
use crate::model::graph::ContentGraph;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// One hard invariant violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Violation {
    /// Two diseases claim the same main symptom.
    DuplicateMainSymptom {
        symptom: EntityId,
        first_disease: EntityId,
        second_disease: EntityId,
    },
    /// A symptom has no treatment reference, or a dangling one.
    MissingTreatment { symptom: EntityId },
    /// A symptom has no resolvable examination reference.
    UncoveredSymptom { symptom: EntityId },
    /// An examination names a facility outside the closed set.
    UnknownFacility {
        examination: EntityId,
        facility: String,
    },
    /// A reference points at an entity absent from the graph.
    DanglingReference {
        from_kind: EntityKind,
        from: EntityId,
        to_kind: EntityKind,
        to: EntityId,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateMainSymptom {
                symptom,
                first_disease,
                second_disease,
            } => write!(
                f,
                "main symptom `{symptom}` is claimed by both `{first_disease}` and `{second_disease}`"
            ),
            Self::MissingTreatment { symptom } => {
                write!(f, "symptom `{symptom}` has no resolvable treatment")
            }
            Self::UncoveredSymptom { symptom } => {
                write!(f, "symptom `{symptom}` has no resolvable examination")
            }
            Self::UnknownFacility {
                examination,
                facility,
            } => write!(
                f,
                "examination `{examination}` requires unknown facility `{facility}`"
            ),
            Self::DanglingReference {
                from_kind,
                from,
                to_kind,
                to,
            } => write!(
                f,
                "{from_kind} `{from}` references missing {to_kind} `{to}`"
            ),
        }
    }
}

/// Full validation result: hard violations plus advisory warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Runs every invariant check against `graph`.
///
/// All checks run to completion; a single call reports every problem.
pub fn validate_graph(graph: &ContentGraph) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    check_main_symptom_uniqueness(graph, &mut outcome);
    check_symptom_references(graph, &mut outcome);
    check_disease_references(graph, &mut outcome);
    check_facilities(graph, &mut outcome);
    check_main_flag_consistency(graph, &mut outcome);

    outcome
}

fn check_main_symptom_uniqueness(graph: &ContentGraph, outcome: &mut ValidationOutcome) {
    let mut owner_by_symptom: BTreeMap<&EntityId, &EntityId> = BTreeMap::new();
    for disease in graph.diseases.values() {
        match owner_by_symptom.get(&disease.main_symptom) {
            Some(first) => outcome.violations.push(Violation::DuplicateMainSymptom {
                symptom: disease.main_symptom.clone(),
                first_disease: (*first).clone(),
                second_disease: disease.id.clone(),
            }),
            None => {
                owner_by_symptom.insert(&disease.main_symptom, &disease.id);
            }
        }
    }
}

fn check_symptom_references(graph: &ContentGraph, outcome: &mut ValidationOutcome) {
    for symptom in graph.symptoms.values() {
        match &symptom.treatment {
            None => outcome.violations.push(Violation::MissingTreatment {
                symptom: symptom.id.clone(),
            }),
            Some(treatment_ref) => {
                if !graph.treatments.contains_key(treatment_ref) {
                    outcome.violations.push(Violation::MissingTreatment {
                        symptom: symptom.id.clone(),
                    });
                    outcome.violations.push(Violation::DanglingReference {
                        from_kind: EntityKind::Symptom,
                        from: symptom.id.clone(),
                        to_kind: EntityKind::Treatment,
                        to: treatment_ref.clone(),
                    });
                }
            }
        }

        let mut resolvable_exams = 0;
        for exam_ref in &symptom.examinations {
            if graph.examinations.contains_key(exam_ref) {
                resolvable_exams += 1;
            } else {
                outcome.violations.push(Violation::DanglingReference {
                    from_kind: EntityKind::Symptom,
                    from: symptom.id.clone(),
                    to_kind: EntityKind::Examination,
                    to: exam_ref.clone(),
                });
            }
        }
        if resolvable_exams == 0 {
            outcome.violations.push(Violation::UncoveredSymptom {
                symptom: symptom.id.clone(),
            });
        }
    }
}

fn check_disease_references(graph: &ContentGraph, outcome: &mut ValidationOutcome) {
    for disease in graph.diseases.values() {
        for symptom_ref in disease.symptom_refs() {
            if !graph.symptoms.contains_key(symptom_ref) {
                outcome.violations.push(Violation::DanglingReference {
                    from_kind: EntityKind::Disease,
                    from: disease.id.clone(),
                    to_kind: EntityKind::Symptom,
                    to: symptom_ref.clone(),
                });
            }
        }
    }
}

fn check_facilities(graph: &ContentGraph, outcome: &mut ValidationOutcome) {
    for examination in graph.examinations.values() {
        if FacilityKind::parse(&examination.facility).is_none() {
            outcome.violations.push(Violation::UnknownFacility {
                examination: examination.id.clone(),
                facility: examination.facility.clone(),
            });
        }
    }
}

/// Advisory checks: flag consistency problems the engine tolerates but a
/// curator probably wants to see.
fn check_main_flag_consistency(graph: &ContentGraph, outcome: &mut ValidationOutcome) {
    let mut referenced_as_main = std::collections::BTreeSet::new();
    for disease in graph.diseases.values() {
        referenced_as_main.insert(&disease.main_symptom);
        if let Some(symptom) = graph.symptoms.get(&disease.main_symptom) {
            if !symptom.is_main {
                outcome.warnings.push(format!(
                    "disease `{}` uses `{}` as main symptom but it is not flagged is_main",
                    disease.id, symptom.id
                ));
            }
        }
    }
    for symptom in graph.symptoms.values() {
        if symptom.is_main && !referenced_as_main.contains(&symptom.id) {
            outcome.warnings.push(format!(
                "main symptom `{}` is not referenced as main by any disease",
                symptom.id
            ));
        }
    }
}
