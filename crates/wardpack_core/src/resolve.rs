//! Identity resolution across independently authored packages.
//!
//! # Responsibility
//! - Collapse entities that describe the same real-world concept into one
//!   canonical instance and rewrite every inbound reference.
//! - Flag near-duplicates for curator review instead of guessing.
//!
//! # Invariants
//! - Canonical attribute source is the highest-priority package; ties break
//!   on lexically smallest package tag, then smallest entity id.
//! - Resolution output is identical under any package ordering.
//! - Only exact normalized-name matches and explicit merge directives
//!   collapse entities; fuzzy matching never merges silently.

use crate::directive::Directive;
use crate::model::entity::{Disease, EntityId, EntityKind, Examination, Symptom, Treatment};
use crate::model::graph::ContentGraph;
use crate::model::package::SourcePackage;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why two entities were collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeReason {
    /// Same id declared by more than one package.
    SharedId,
    /// Distinct ids with the same normalized name.
    ExactName,
    /// Explicit curator merge directive.
    Directive,
}

/// One audit-trail entry: a superseded entity and its canonical survivor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeRecord {
    pub kind: EntityKind,
    pub superseded: EntityId,
    pub superseded_package: String,
    pub canonical: EntityId,
    pub canonical_package: String,
    pub reason: MergeReason,
}

/// A group of distinct entities that look like the same concept but were
/// not auto-merged. Left for an explicit merge directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCandidate {
    pub kind: EntityKind,
    pub ids: Vec<EntityId>,
    pub names: Vec<String>,
}

/// Resolver output alongside the canonical graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolveOutcome {
    pub merges: Vec<MergeRecord>,
    pub review_candidates: Vec<ReviewCandidate>,
}

/// Resolver errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A merge directive named an entity that does not exist.
    UnknownEntityReference { kind: EntityKind, id: EntityId },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEntityReference { kind, id } => {
                write!(f, "merge directive references unknown {kind} `{id}`")
            }
        }
    }
}

impl Error for ResolveError {}

/// Normalizes an authored display name for exact-match comparison.
///
/// Folds case, collapses whitespace and strips trailing bracketed
/// package-local qualifiers such as `"Blood Test (CardioPack)"`.
pub fn normalize_name(name: &str) -> String {
    static QUALIFIER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s*[(\[][^)\]]*[)\]]\s*$").expect("qualifier pattern is valid"));
    static SPACES: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

    let mut name = name.trim().to_lowercase();
    loop {
        let stripped = QUALIFIER.replace(&name, "").trim().to_string();
        if stripped == name {
            break;
        }
        name = stripped;
    }
    SPACES.replace_all(&name, " ").into_owned()
}

/// Order-insensitive token key used only to surface review candidates.
fn loose_key(normalized: &str) -> String {
    let mut tokens: Vec<String> = normalized
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tokens.sort();
    tokens.join(" ")
}

trait NamedEntity: Clone {
    const KIND: EntityKind;
    fn id(&self) -> &EntityId;
    fn name(&self) -> &str;
    fn package(&self) -> &str;
}

impl NamedEntity for Disease {
    const KIND: EntityKind = EntityKind::Disease;
    fn id(&self) -> &EntityId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn package(&self) -> &str {
        &self.package
    }
}

impl NamedEntity for Symptom {
    const KIND: EntityKind = EntityKind::Symptom;
    fn id(&self) -> &EntityId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn package(&self) -> &str {
        &self.package
    }
}

impl NamedEntity for Examination {
    const KIND: EntityKind = EntityKind::Examination;
    fn id(&self) -> &EntityId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn package(&self) -> &str {
        &self.package
    }
}

impl NamedEntity for Treatment {
    const KIND: EntityKind = EntityKind::Treatment;
    fn id(&self) -> &EntityId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn package(&self) -> &str {
        &self.package
    }
}

struct Occurrence<T> {
    priority: i32,
    entity: T,
}

struct MergedKind<T> {
    entities: BTreeMap<EntityId, T>,
    remap: BTreeMap<EntityId, EntityId>,
    records: Vec<MergeRecord>,
}

/// Resolves the unioned entity set of `packages` into one canonical graph.
///
/// Merge directives are applied after automatic resolution, in declaration
/// order; they may reference pre-merge ids, which are followed through the
/// canonical mapping first.
pub fn resolve_packages(
    packages: &[SourcePackage],
    directives: &[Directive],
) -> Result<(ContentGraph, ResolveOutcome), ResolveError> {
    let mut sorted: Vec<&SourcePackage> = packages.iter().collect();
    sorted.sort_by(|a, b| a.tag.cmp(&b.tag));

    let mut diseases = merge_kind(collect(&sorted, |p| &p.diseases));
    let mut symptoms = merge_kind(collect(&sorted, |p| &p.symptoms));
    let mut examinations = merge_kind(collect(&sorted, |p| &p.examinations));
    let mut treatments = merge_kind(collect(&sorted, |p| &p.treatments));

    for directive in directives {
        let Directive::Merge { kind, from, into } = directive else {
            continue;
        };
        match kind {
            EntityKind::Disease => apply_merge_directive(&mut diseases, from, into)?,
            EntityKind::Symptom => apply_merge_directive(&mut symptoms, from, into)?,
            EntityKind::Examination => apply_merge_directive(&mut examinations, from, into)?,
            EntityKind::Treatment => apply_merge_directive(&mut treatments, from, into)?,
        }
    }

    compress_remap(&mut symptoms.remap);
    compress_remap(&mut examinations.remap);
    compress_remap(&mut treatments.remap);

    let mut graph = ContentGraph::new();
    graph.diseases = diseases.entities;
    graph.symptoms = symptoms.entities;
    graph.examinations = examinations.entities;
    graph.treatments = treatments.entities;
    graph.remap_symptom_refs(&symptoms.remap);
    graph.remap_examination_refs(&examinations.remap);
    graph.remap_treatment_refs(&treatments.remap);

    let mut outcome = ResolveOutcome::default();
    outcome.merges.extend(diseases.records);
    outcome.merges.extend(symptoms.records);
    outcome.merges.extend(examinations.records);
    outcome.merges.extend(treatments.records);

    collect_review_candidates(&graph.diseases, &mut outcome.review_candidates);
    collect_review_candidates(&graph.symptoms, &mut outcome.review_candidates);
    collect_review_candidates(&graph.examinations, &mut outcome.review_candidates);
    collect_review_candidates(&graph.treatments, &mut outcome.review_candidates);

    for candidate in &outcome.review_candidates {
        warn!(
            "event=review_candidate kind={} ids={:?}",
            candidate.kind, candidate.ids
        );
    }
    info!(
        "event=resolve_complete merges={} review_candidates={} entities={}",
        outcome.merges.len(),
        outcome.review_candidates.len(),
        graph.entity_count()
    );

    Ok((graph, outcome))
}

fn collect<'a, T: NamedEntity>(
    packages: &[&'a SourcePackage],
    pick: fn(&'a SourcePackage) -> &'a Vec<T>,
) -> Vec<Occurrence<T>> {
    let mut occurrences = Vec::new();
    for package in packages {
        for entity in pick(package) {
            occurrences.push(Occurrence {
                priority: package.priority,
                entity: entity.clone(),
            });
        }
    }
    occurrences
}

/// True when `a` should be the canonical attribute source over `b`.
fn wins<T: NamedEntity>(a: &Occurrence<T>, b: &Occurrence<T>) -> bool {
    (a.priority, b.entity.package(), b.entity.id()) > (b.priority, a.entity.package(), a.entity.id())
}

fn merge_kind<T: NamedEntity>(occurrences: Vec<Occurrence<T>>) -> MergedKind<T> {
    let mut records = Vec::new();

    // Phase 1: the same id declared by several packages is the same entity;
    // keep the highest-priority declaration.
    let mut by_id: BTreeMap<EntityId, Vec<Occurrence<T>>> = BTreeMap::new();
    for occurrence in occurrences {
        by_id
            .entry(occurrence.entity.id().clone())
            .or_default()
            .push(occurrence);
    }

    let mut survivors: BTreeMap<EntityId, Occurrence<T>> = BTreeMap::new();
    for (id, group) in by_id {
        let mut group = group.into_iter();
        let mut winner = group.next().expect("id group is never empty");
        for other in group {
            let (kept, dropped) = if wins(&other, &winner) {
                (other, winner)
            } else {
                (winner, other)
            };
            records.push(MergeRecord {
                kind: T::KIND,
                superseded: id.clone(),
                superseded_package: dropped.entity.package().to_string(),
                canonical: id.clone(),
                canonical_package: kept.entity.package().to_string(),
                reason: MergeReason::SharedId,
            });
            winner = kept;
        }
        survivors.insert(id, winner);
    }

    // Phase 2: distinct ids sharing a normalized name collapse onto the
    // winning declaration; losers are remapped onto the canonical id.
    let mut by_name: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
    for (id, occurrence) in &survivors {
        by_name
            .entry(normalize_name(occurrence.entity.name()))
            .or_default()
            .push(id.clone());
    }

    let mut remap = BTreeMap::new();
    for ids in by_name.into_values() {
        if ids.len() < 2 {
            continue;
        }
        let canonical_id = ids
            .iter()
            .max_by(|a, b| {
                let (a, b) = (&survivors[*a], &survivors[*b]);
                if wins(a, b) {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Less
                }
            })
            .expect("name group is never empty")
            .clone();

        for id in ids {
            if id == canonical_id {
                continue;
            }
            let dropped = &survivors[&id];
            records.push(MergeRecord {
                kind: T::KIND,
                superseded: id.clone(),
                superseded_package: dropped.entity.package().to_string(),
                canonical: canonical_id.clone(),
                canonical_package: survivors[&canonical_id].entity.package().to_string(),
                reason: MergeReason::ExactName,
            });
            remap.insert(id, canonical_id.clone());
        }
    }

    let mut entities = BTreeMap::new();
    for (id, occurrence) in survivors {
        if remap.contains_key(&id) {
            continue;
        }
        entities.insert(id, occurrence.entity);
    }

    MergedKind {
        entities,
        remap,
        records,
    }
}

fn apply_merge_directive<T: NamedEntity>(
    merged: &mut MergedKind<T>,
    from: &EntityId,
    into: &EntityId,
) -> Result<(), ResolveError> {
    let from = resolve_through(&merged.remap, from);
    let into = resolve_through(&merged.remap, into);
    if from == into {
        return Ok(());
    }

    let Some(dropped) = merged.entities.remove(&from) else {
        return Err(ResolveError::UnknownEntityReference {
            kind: T::KIND,
            id: from,
        });
    };
    let Some(kept) = merged.entities.get(&into) else {
        // Put the removed entity back so the graph stays intact for error
        // reporting by the caller.
        merged.entities.insert(from.clone(), dropped);
        return Err(ResolveError::UnknownEntityReference {
            kind: T::KIND,
            id: into,
        });
    };

    merged.records.push(MergeRecord {
        kind: T::KIND,
        superseded: from.clone(),
        superseded_package: dropped.package().to_string(),
        canonical: into.clone(),
        canonical_package: kept.package().to_string(),
        reason: MergeReason::Directive,
    });
    merged.remap.insert(from, into);
    Ok(())
}

fn resolve_through(remap: &BTreeMap<EntityId, EntityId>, id: &EntityId) -> EntityId {
    let mut current = id.clone();
    let mut hops = 0;
    while let Some(next) = remap.get(&current) {
        current = next.clone();
        hops += 1;
        if hops > remap.len() {
            break;
        }
    }
    current
}

fn compress_remap(remap: &mut BTreeMap<EntityId, EntityId>) {
    let keys: Vec<EntityId> = remap.keys().cloned().collect();
    for key in keys {
        let target = resolve_through(remap, &key);
        remap.insert(key, target);
    }
}

fn collect_review_candidates<T: NamedEntity>(
    entities: &BTreeMap<EntityId, T>,
    out: &mut Vec<ReviewCandidate>,
) {
    let mut by_loose: BTreeMap<String, Vec<&T>> = BTreeMap::new();
    for entity in entities.values() {
        by_loose
            .entry(loose_key(&normalize_name(entity.name())))
            .or_default()
            .push(entity);
    }
    for group in by_loose.into_values() {
        if group.len() < 2 {
            continue;
        }
        out.push(ReviewCandidate {
            kind: T::KIND,
            ids: group.iter().map(|e| e.id().clone()).collect(),
            names: group.iter().map(|e| e.name().to_string()).collect(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, resolve_packages, MergeReason, ResolveError};
    use crate::directive::Directive;
    use crate::model::entity::{EntityId, EntityKind, Examination};
    use crate::model::package::SourcePackage;

    fn exam(id: &str, name: &str, facility: &str) -> Examination {
        Examination {
            id: id.into(),
            name: name.to_string(),
            facility: facility.to_string(),
            duration_minutes: None,
            discomfort: None,
            package: String::new(),
        }
    }

    fn package(tag: &str, priority: i32, exams: Vec<Examination>) -> SourcePackage {
        let mut package = SourcePackage::new(tag, priority);
        package.examinations = exams;
        package.stamp_provenance();
        package
    }

    #[test]
    fn normalize_name_strips_case_whitespace_and_qualifiers() {
        assert_eq!(normalize_name("  Blood   Test "), "blood test");
        assert_eq!(normalize_name("Blood Test (CardioPack)"), "blood test");
        assert_eq!(normalize_name("Blood Test [v2] (core)"), "blood test");
    }

    #[test]
    fn exact_name_merge_prefers_higher_priority_package() {
        let low = package("alpha", 1, vec![exam("EXAM_BLOOD_A", "Blood Test", "lab")]);
        let high = package(
            "beta",
            5,
            vec![exam("EXAM_BLOOD_B", "Blood Test", "radiology")],
        );

        let (graph, outcome) =
            resolve_packages(&[low, high], &[]).expect("resolution should succeed");

        assert_eq!(graph.examinations.len(), 1);
        let survivor = graph.examinations.values().next().expect("one survivor");
        assert_eq!(survivor.id, EntityId::from("EXAM_BLOOD_B"));
        assert_eq!(survivor.facility, "radiology");
        assert_eq!(outcome.merges.len(), 1);
        assert_eq!(outcome.merges[0].reason, MergeReason::ExactName);
        assert_eq!(outcome.merges[0].canonical_package, "beta");
    }

    #[test]
    fn resolution_is_deterministic_under_package_reordering() {
        let a = package("alpha", 2, vec![exam("EXAM_1", "Blood Test", "lab")]);
        let b = package("beta", 2, vec![exam("EXAM_2", "Blood Test", "lab")]);

        let (graph_ab, outcome_ab) =
            resolve_packages(&[a.clone(), b.clone()], &[]).expect("ab order should resolve");
        let (graph_ba, outcome_ba) =
            resolve_packages(&[b, a], &[]).expect("ba order should resolve");

        assert_eq!(graph_ab, graph_ba);
        assert_eq!(outcome_ab, outcome_ba);
        // Equal priorities: lexically smallest tag wins.
        let survivor = graph_ab.examinations.values().next().expect("one survivor");
        assert_eq!(survivor.package, "alpha");
    }

    #[test]
    fn near_duplicates_are_flagged_not_merged() {
        let a = package("alpha", 1, vec![exam("EXAM_PANEL", "Test Blood", "lab")]);
        let b = package("beta", 1, vec![exam("EXAM_TEST", "Blood Test", "lab")]);

        let (graph, outcome) = resolve_packages(&[a, b], &[]).expect("resolution should succeed");

        assert_eq!(graph.examinations.len(), 2);
        assert!(outcome.merges.is_empty());
        assert_eq!(outcome.review_candidates.len(), 1);
        assert_eq!(outcome.review_candidates[0].kind, EntityKind::Examination);
    }

    #[test]
    fn merge_directive_collapses_named_entities() {
        let a = package("alpha", 1, vec![exam("EXAM_PANEL", "Blood Panel", "lab")]);
        let b = package("beta", 1, vec![exam("EXAM_TEST", "Blood Test", "lab")]);
        let directives = vec![Directive::Merge {
            kind: EntityKind::Examination,
            from: "EXAM_PANEL".into(),
            into: "EXAM_TEST".into(),
        }];

        let (graph, outcome) =
            resolve_packages(&[a, b], &directives).expect("resolution should succeed");

        assert_eq!(graph.examinations.len(), 1);
        assert!(graph.examinations.contains_key(&EntityId::from("EXAM_TEST")));
        assert!(outcome
            .merges
            .iter()
            .any(|m| m.reason == MergeReason::Directive));
    }

    #[test]
    fn merge_directive_with_unknown_id_fails() {
        let a = package("alpha", 1, vec![exam("EXAM_TEST", "Blood Test", "lab")]);
        let directives = vec![Directive::Merge {
            kind: EntityKind::Examination,
            from: "EXAM_MISSING".into(),
            into: "EXAM_TEST".into(),
        }];

        let err = resolve_packages(&[a], &directives).expect_err("unknown id must fail");
        assert_eq!(
            err,
            ResolveError::UnknownEntityReference {
                kind: EntityKind::Examination,
                id: "EXAM_MISSING".into(),
            }
        );
    }
}
