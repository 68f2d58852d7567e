//! Source package discovery and parsing.
//!
//! # Responsibility
//! - Find and parse every package file under the given directories.
//! - Reject broken or ambiguous input before it can reach the graph.
//!
//! # Invariants
//! - Files are visited in sorted path order and packages are returned
//!   sorted by tag, so downstream output never depends on directory
//!   enumeration order.
//! - Every loaded entity carries its originating package tag.

use crate::model::package::{PackageValidationError, SourcePackage};
use log::{debug, info};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

pub type LoadResult<T> = Result<T, LoadError>;

/// Errors surfaced while discovering and parsing package files.
#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidPackage {
        path: PathBuf,
        source: PackageValidationError,
    },
    DuplicatePackageTag {
        tag: String,
        first: PathBuf,
        second: PathBuf,
    },
    NoPackagesFound {
        dirs: Vec<PathBuf>,
    },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse package `{}`: {source}", path.display())
            }
            Self::InvalidPackage { path, source } => {
                write!(f, "invalid package `{}`: {source}", path.display())
            }
            Self::DuplicatePackageTag { tag, first, second } => {
                write!(
                    f,
                    "package tag `{tag}` declared by both `{}` and `{}`",
                    first.display(),
                    second.display()
                )
            }
            Self::NoPackagesFound { dirs } => {
                let joined = dirs
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "no package files found under: {joined}")
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidPackage { source, .. } => Some(source),
            Self::DuplicatePackageTag { .. } | Self::NoPackagesFound { .. } => None,
        }
    }
}

/// Loads every `*.json` package under `dirs`, recursively.
///
/// Returns packages sorted by tag with provenance stamped on every entity.
///
/// # Errors
/// - I/O and parse failures name the offending file.
/// - Two files declaring the same package tag are rejected.
/// - An empty result set is rejected; an integration run over nothing is
///   always a caller mistake.
pub fn load_packages(dirs: &[PathBuf]) -> LoadResult<Vec<SourcePackage>> {
    let mut files = Vec::new();
    for dir in dirs {
        collect_package_files(dir, &mut files)?;
    }
    files.sort();
    files.dedup();

    if files.is_empty() {
        return Err(LoadError::NoPackagesFound {
            dirs: dirs.to_vec(),
        });
    }

    let mut packages: Vec<SourcePackage> = Vec::with_capacity(files.len());
    let mut tag_origin: Vec<(String, PathBuf)> = Vec::new();
    let mut seen_tags = BTreeSet::new();

    for path in files {
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let mut package: SourcePackage =
            serde_json::from_str(&text).map_err(|source| LoadError::Parse {
                path: path.clone(),
                source,
            })?;
        package
            .validate()
            .map_err(|source| LoadError::InvalidPackage {
                path: path.clone(),
                source,
            })?;

        if !seen_tags.insert(package.tag.clone()) {
            let first = tag_origin
                .iter()
                .find(|(tag, _)| *tag == package.tag)
                .map(|(_, p)| p.clone())
                .unwrap_or_default();
            return Err(LoadError::DuplicatePackageTag {
                tag: package.tag,
                first,
                second: path,
            });
        }

        package.stamp_provenance();
        debug!(
            "event=package_loaded tag={} priority={} entities={} file={}",
            package.tag,
            package.priority,
            package.entity_count(),
            path.display()
        );
        tag_origin.push((package.tag.clone(), path));
        packages.push(package);
    }

    packages.sort_by(|a, b| a.tag.cmp(&b.tag));
    info!(
        "event=load_complete packages={} entities={}",
        packages.len(),
        packages.iter().map(SourcePackage::entity_count).sum::<usize>()
    );
    Ok(packages)
}

fn collect_package_files(dir: &Path, out: &mut Vec<PathBuf>) -> LoadResult<()> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_package_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}
