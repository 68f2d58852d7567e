//! Entity records for diseases, symptoms, examinations and treatments.
//!
//! # Responsibility
//! - Define the four content entity types and their reference fields.
//! - Provide the closed facility and treatment-kind enumerations.
//!
//! # Invariants
//! - `EntityId` values are opaque stable strings, unique per entity type
//!   within one source package.
//! - A `Disease` always names exactly one main symptom; cure state of the
//!   disease follows cure state of that symptom downstream.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque stable identifier for one content entity.
///
/// Ids are authored by curators inside source packages; the engine never
/// generates them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Name of the package an entity was loaded from.
///
/// Kept as a type alias to make provenance explicit in signatures.
pub type PackageTag = String;

/// The four content entity types handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Disease,
    Symptom,
    Examination,
    Treatment,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disease => "disease",
            Self::Symptom => "symptom",
            Self::Examination => "examination",
            Self::Treatment => "treatment",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of facility kinds the downstream engine can host an
/// examination in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKind {
    DoctorOffice,
    Observation,
    Ward,
    Lab,
    Radiology,
    OperatingTheater,
    IntensiveCare,
}

impl FacilityKind {
    pub const ALL: [FacilityKind; 7] = [
        Self::DoctorOffice,
        Self::Observation,
        Self::Ward,
        Self::Lab,
        Self::Radiology,
        Self::OperatingTheater,
        Self::IntensiveCare,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DoctorOffice => "doctor_office",
            Self::Observation => "observation",
            Self::Ward => "ward",
            Self::Lab => "lab",
            Self::Radiology => "radiology",
            Self::OperatingTheater => "operating_theater",
            Self::IntensiveCare => "intensive_care",
        }
    }

    /// Parses a facility string from authored content.
    ///
    /// Returns `None` for anything outside the closed set; callers decide
    /// whether that is a validation violation or an export failure.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "doctor_office" => Some(Self::DoctorOffice),
            "observation" => Some(Self::Observation),
            "ward" => Some(Self::Ward),
            "lab" => Some(Self::Lab),
            "radiology" => Some(Self::Radiology),
            "operating_theater" => Some(Self::OperatingTheater),
            "intensive_care" => Some(Self::IntensiveCare),
            _ => None,
        }
    }
}

/// Whether a treatment requires surgery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentKind {
    Surgical,
    NonSurgical,
}

/// One disease definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub id: EntityId,
    pub name: String,
    /// Owning hospital department id.
    pub department: String,
    /// The single symptom whose cure determines this disease's cure state.
    pub main_symptom: EntityId,
    #[serde(default)]
    pub secondary_symptoms: Vec<EntityId>,
    /// Raw patient-generation frequency weight; `None` falls back to the
    /// configured baseline during weight normalization.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub treatment_cost: Option<u32>,
    /// Free-form category tags consumed by restrict directives.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Stamped by the loader; not part of the authored record.
    #[serde(default)]
    pub package: PackageTag,
}

impl Disease {
    /// Ids of every symptom this disease references, main symptom first.
    pub fn symptom_refs(&self) -> impl Iterator<Item = &EntityId> {
        std::iter::once(&self.main_symptom).chain(self.secondary_symptoms.iter())
    }
}

/// One symptom definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub is_main: bool,
    /// Examinations able to detect this symptom. Must resolve to at least
    /// one examination in a valid graph.
    #[serde(default)]
    pub examinations: Vec<EntityId>,
    /// The single treatment curing this symptom. Optional in the loaded
    /// shape so a missing reference is reportable instead of unparseable.
    #[serde(default)]
    pub treatment: Option<EntityId>,
    #[serde(default)]
    pub severity: Option<u8>,
    #[serde(default)]
    pub discomfort: Option<u8>,
    #[serde(default)]
    pub package: PackageTag,
}

/// One examination definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Examination {
    pub id: EntityId,
    pub name: String,
    /// Facility string validated against [`FacilityKind`].
    pub facility: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub discomfort: Option<u8>,
    #[serde(default)]
    pub package: PackageTag,
}

/// One treatment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub id: EntityId,
    pub name: String,
    pub kind: TreatmentKind,
    #[serde(default)]
    pub hospitalization: bool,
    #[serde(default)]
    pub discomfort: Option<u8>,
    #[serde(default)]
    pub package: PackageTag,
}
