//! Curator directive file parsing.
//!
//! # Responsibility
//! - Parse the ordered directive list curators supply alongside packages.
//! - Keep directive shapes declarative; application lives in the resolver
//!   and the reassignment engine.
//!
//! # Invariants
//! - Directive order is meaningful and preserved exactly as declared.
//! - A directive naming an unknown entity or department is a hard error in
//!   the stage that applies it, never silently skipped.

use crate::model::entity::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

/// One curator directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// Explicit near-duplicate merge: `from` is superseded by `into`.
    Merge {
        kind: EntityKind,
        from: EntityId,
        into: EntityId,
    },
    /// Moves one disease to a different department.
    MoveToDepartment {
        disease: EntityId,
        department: String,
    },
    /// Keeps only diseases carrying `required_tag` in `department`; the
    /// rest are removed and their orphaned subtrees left for pruning.
    RestrictToCategory {
        department: String,
        required_tag: String,
    },
}

impl Directive {
    /// Returns whether the identity resolver applies this directive.
    pub fn is_merge(&self) -> bool {
        matches!(self, Self::Merge { .. })
    }

    /// Returns whether the reassignment engine applies this directive.
    pub fn is_reassignment(&self) -> bool {
        matches!(
            self,
            Self::MoveToDepartment { .. } | Self::RestrictToCategory { .. }
        )
    }
}

/// Directive file errors.
#[derive(Debug)]
pub enum DirectiveError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for DirectiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read directives `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse directives `{}`: {source}",
                    path.display()
                )
            }
        }
    }
}

impl Error for DirectiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Loads an ordered directive list from a JSON file.
pub fn load_directives(path: &Path) -> Result<Vec<Directive>, DirectiveError> {
    let text = fs::read_to_string(path).map_err(|source| DirectiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DirectiveError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
