//! Engine-schema export of the finalized graph.
//!
//! # Responsibility
//! - Transform the validated graph into the downstream engine's package
//!   shape, pure and side-effect free.
//! - Refuse entities the target schema cannot represent.
//!
//! # Invariants
//! - `UnsupportedEntityShape` cannot occur on a graph the conflict
//!   validator passed; hitting it means a validator gap.
//! - Output collections are sorted by id, so exports are byte-reproducible.

use crate::model::entity::{EntityId, EntityKind, FacilityKind, TreatmentKind};
use crate::model::graph::ContentGraph;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

/// Version stamp for the exported schema shape.
pub const ENGINE_SCHEMA_VERSION: u32 = 1;

/// The package shape the downstream engine ingests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnginePackage {
    pub schema_version: u32,
    pub diseases: Vec<EngineDisease>,
    pub symptoms: Vec<EngineSymptom>,
    pub examinations: Vec<EngineExamination>,
    pub treatments: Vec<EngineTreatment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineDisease {
    pub id: EntityId,
    pub name: String,
    pub department: String,
    pub main_symptom: EntityId,
    pub secondary_symptoms: Vec<EntityId>,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_cost: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSymptom {
    pub id: EntityId,
    pub name: String,
    pub is_main: bool,
    pub examinations: Vec<EntityId>,
    pub treatment: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discomfort: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineExamination {
    pub id: EntityId,
    pub name: String,
    pub facility: FacilityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discomfort: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineTreatment {
    pub id: EntityId,
    pub name: String,
    pub kind: TreatmentKind,
    pub hospitalization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discomfort: Option<u8>,
}

/// Export errors.
#[derive(Debug)]
pub enum ExportError {
    /// An entity cannot be represented in the engine schema.
    UnsupportedEntityShape {
        kind: EntityKind,
        id: EntityId,
        detail: String,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedEntityShape { kind, id, detail } => {
                write!(f, "cannot export {kind} `{id}`: {detail}")
            }
            Self::Io { path, source } => {
                write!(f, "failed to write export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnsupportedEntityShape { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Transforms the finalized graph into the engine package shape.
pub fn export_graph(graph: &ContentGraph) -> Result<EnginePackage, ExportError> {
    let mut diseases = Vec::with_capacity(graph.diseases.len());
    for disease in graph.diseases.values() {
        diseases.push(EngineDisease {
            id: disease.id.clone(),
            name: disease.name.clone(),
            department: disease.department.clone(),
            main_symptom: disease.main_symptom.clone(),
            secondary_symptoms: disease.secondary_symptoms.clone(),
            weight: disease.weight.ok_or_else(|| ExportError::UnsupportedEntityShape {
                kind: EntityKind::Disease,
                id: disease.id.clone(),
                detail: "weight was never materialized".to_string(),
            })?,
            treatment_cost: disease.treatment_cost,
        });
    }

    let mut symptoms = Vec::with_capacity(graph.symptoms.len());
    for symptom in graph.symptoms.values() {
        let treatment =
            symptom
                .treatment
                .clone()
                .ok_or_else(|| ExportError::UnsupportedEntityShape {
                    kind: EntityKind::Symptom,
                    id: symptom.id.clone(),
                    detail: "symptom has no treatment reference".to_string(),
                })?;
        symptoms.push(EngineSymptom {
            id: symptom.id.clone(),
            name: symptom.name.clone(),
            is_main: symptom.is_main,
            examinations: symptom.examinations.clone(),
            treatment,
            severity: symptom.severity,
            discomfort: symptom.discomfort,
        });
    }

    let mut examinations = Vec::with_capacity(graph.examinations.len());
    for examination in graph.examinations.values() {
        let facility = FacilityKind::parse(&examination.facility).ok_or_else(|| {
            ExportError::UnsupportedEntityShape {
                kind: EntityKind::Examination,
                id: examination.id.clone(),
                detail: format!("unknown facility `{}`", examination.facility),
            }
        })?;
        examinations.push(EngineExamination {
            id: examination.id.clone(),
            name: examination.name.clone(),
            facility,
            duration_minutes: examination.duration_minutes,
            discomfort: examination.discomfort,
        });
    }

    let treatments = graph
        .treatments
        .values()
        .map(|treatment| EngineTreatment {
            id: treatment.id.clone(),
            name: treatment.name.clone(),
            kind: treatment.kind,
            hospitalization: treatment.hospitalization,
            discomfort: treatment.discomfort,
        })
        .collect();

    Ok(EnginePackage {
        schema_version: ENGINE_SCHEMA_VERSION,
        diseases,
        symptoms,
        examinations,
        treatments,
    })
}

/// Serializes `package` as pretty JSON to `path`.
pub fn write_engine_package(package: &EnginePackage, path: &Path) -> Result<(), ExportError> {
    let text = serde_json::to_string_pretty(package).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, source),
    })?;
    fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{export_graph, ExportError, ENGINE_SCHEMA_VERSION};
    use crate::model::entity::{
        Disease, EntityId, Examination, FacilityKind, Symptom, Treatment, TreatmentKind,
    };
    use crate::model::graph::ContentGraph;

    fn finalized_graph() -> ContentGraph {
        let mut graph = ContentGraph::new();
        graph.insert_treatment(Treatment {
            id: "TRT_SURGERY".into(),
            name: "Appendectomy".to_string(),
            kind: TreatmentKind::Surgical,
            hospitalization: true,
            discomfort: Some(4),
            package: "base".to_string(),
        });
        graph.insert_examination(Examination {
            id: "EXAM_CT".into(),
            name: "CT Scan".to_string(),
            facility: "radiology".to_string(),
            duration_minutes: Some(20),
            discomfort: None,
            package: "base".to_string(),
        });
        graph.insert_symptom(Symptom {
            id: "SYM_PAIN".into(),
            name: "Abdominal Pain".to_string(),
            is_main: true,
            examinations: vec!["EXAM_CT".into()],
            treatment: Some("TRT_SURGERY".into()),
            severity: Some(3),
            discomfort: None,
            package: "base".to_string(),
        });
        graph.insert_disease(Disease {
            id: "DX_APPENDICITIS".into(),
            name: "Appendicitis".to_string(),
            department: "surgery".to_string(),
            main_symptom: "SYM_PAIN".into(),
            secondary_symptoms: Vec::new(),
            weight: Some(0.1),
            treatment_cost: Some(900),
            tags: Vec::new(),
            package: "base".to_string(),
        });
        graph
    }

    #[test]
    fn exports_finalized_graph() {
        let package = export_graph(&finalized_graph()).expect("export should succeed");

        assert_eq!(package.schema_version, ENGINE_SCHEMA_VERSION);
        assert_eq!(package.diseases.len(), 1);
        assert_eq!(package.symptoms[0].treatment, EntityId::from("TRT_SURGERY"));
        assert_eq!(package.examinations[0].facility, FacilityKind::Radiology);

        let json = serde_json::to_value(&package).expect("package should serialize");
        assert_eq!(json["examinations"][0]["facility"], "radiology");
        assert_eq!(json["treatments"][0]["kind"], "surgical");
    }

    #[test]
    fn unknown_facility_is_an_unsupported_shape() {
        let mut graph = finalized_graph();
        graph
            .examinations
            .get_mut(&EntityId::from("EXAM_CT"))
            .expect("fixture exam exists")
            .facility = "holodeck".to_string();

        let err = export_graph(&graph).expect_err("unknown facility must fail export");
        assert!(matches!(
            err,
            ExportError::UnsupportedEntityShape { detail, .. } if detail.contains("holodeck")
        ));
    }

    #[test]
    fn symptom_without_treatment_is_an_unsupported_shape() {
        let mut graph = finalized_graph();
        graph
            .symptoms
            .get_mut(&EntityId::from("SYM_PAIN"))
            .expect("fixture symptom exists")
            .treatment = None;

        let err = export_graph(&graph).expect_err("missing treatment must fail export");
        assert!(matches!(err, ExportError::UnsupportedEntityShape { .. }));
    }
}
