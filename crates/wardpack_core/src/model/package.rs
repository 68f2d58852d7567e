//! Source package declaration and validation.
//!
//! # Responsibility
//! - Define the provenance unit one authoring team ships: a tagged,
//!   prioritized bundle of the four entity collections.
//! - Validate declaration-level invariants before entities enter the graph.
//!
//! # Invariants
//! - Entity ids are unique per type within one package.
//! - Merge priority ties across packages are broken by lexical tag order,
//!   so the tag must be non-empty.

use crate::model::entity::{Disease, EntityId, EntityKind, Examination, Symptom, Treatment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One independently authored content package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePackage {
    /// Unique package name, e.g. `cardiology-basic`.
    pub tag: String,
    /// Curator-assigned merge priority; higher wins attribute conflicts.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub diseases: Vec<Disease>,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub examinations: Vec<Examination>,
    #[serde(default)]
    pub treatments: Vec<Treatment>,
}

impl SourcePackage {
    /// Creates an empty package, mostly useful in tests.
    pub fn new(tag: impl Into<String>, priority: i32) -> Self {
        Self {
            tag: tag.into(),
            priority,
            diseases: Vec::new(),
            symptoms: Vec::new(),
            examinations: Vec::new(),
            treatments: Vec::new(),
        }
    }

    /// Validates declaration-level package invariants.
    pub fn validate(&self) -> Result<(), PackageValidationError> {
        if self.tag.trim().is_empty() {
            return Err(PackageValidationError::EmptyTag);
        }

        check_unique_ids(EntityKind::Disease, self.diseases.iter().map(|d| &d.id))?;
        check_unique_ids(EntityKind::Symptom, self.symptoms.iter().map(|s| &s.id))?;
        check_unique_ids(
            EntityKind::Examination,
            self.examinations.iter().map(|e| &e.id),
        )?;
        check_unique_ids(EntityKind::Treatment, self.treatments.iter().map(|t| &t.id))?;
        Ok(())
    }

    /// Stamps every contained entity with this package's tag.
    pub fn stamp_provenance(&mut self) {
        let tag = self.tag.clone();
        for disease in &mut self.diseases {
            disease.package = tag.clone();
        }
        for symptom in &mut self.symptoms {
            symptom.package = tag.clone();
        }
        for examination in &mut self.examinations {
            examination.package = tag.clone();
        }
        for treatment in &mut self.treatments {
            treatment.package = tag.clone();
        }
    }

    /// Total number of entities across all four collections.
    pub fn entity_count(&self) -> usize {
        self.diseases.len() + self.symptoms.len() + self.examinations.len() + self.treatments.len()
    }
}

fn check_unique_ids<'a>(
    kind: EntityKind,
    ids: impl Iterator<Item = &'a EntityId>,
) -> Result<(), PackageValidationError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if id.as_str().trim().is_empty() {
            return Err(PackageValidationError::EmptyEntityId(kind));
        }
        if !seen.insert(id.clone()) {
            return Err(PackageValidationError::DuplicateEntityId(kind, id.clone()));
        }
    }
    Ok(())
}

/// Declaration-level package validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageValidationError {
    EmptyTag,
    EmptyEntityId(EntityKind),
    DuplicateEntityId(EntityKind, EntityId),
}

impl Display for PackageValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTag => write!(f, "package tag must not be empty"),
            Self::EmptyEntityId(kind) => {
                write!(f, "package declares a {kind} with an empty id")
            }
            Self::DuplicateEntityId(kind, id) => {
                write!(f, "package declares {kind} id `{id}` more than once")
            }
        }
    }
}

impl Error for PackageValidationError {}
