//! Curator-facing integration report.
//!
//! # Responsibility
//! - Accumulate what every stage did: merges, review candidates,
//!   violations, warnings, reassignments, pruning and weight rescaling.
//! - Render one human-readable summary for review before release.

use crate::prune::PruneOutcome;
use crate::reassign::ReassignOutcome;
use crate::resolve::ResolveOutcome;
use crate::validate::ValidationOutcome;
use crate::weight::WeightOutcome;
use serde::Serialize;
use std::fmt::Write as _;

/// Everything a curator reviews about one integration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrationReport {
    pub packages_loaded: usize,
    pub resolve: ResolveOutcome,
    pub validation: ValidationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reassign: Option<ReassignOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prune: Option<PruneOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightOutcome>,
}

impl IntegrationReport {
    /// Renders the report as plain text for terminal or file review.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== wardpack integration report ==");
        let _ = writeln!(out, "packages loaded: {}", self.packages_loaded);

        let _ = writeln!(out, "\n-- merges ({}) --", self.resolve.merges.len());
        for merge in &self.resolve.merges {
            let _ = writeln!(
                out,
                "  [{:?}] {} `{}` ({}) -> `{}` ({})",
                merge.reason,
                merge.kind,
                merge.superseded,
                merge.superseded_package,
                merge.canonical,
                merge.canonical_package
            );
        }

        let _ = writeln!(
            out,
            "\n-- review candidates ({}) --",
            self.resolve.review_candidates.len()
        );
        for candidate in &self.resolve.review_candidates {
            let _ = writeln!(
                out,
                "  {} {:?} named {:?}",
                candidate.kind, candidate.ids, candidate.names
            );
        }

        let _ = writeln!(
            out,
            "\n-- violations ({}) --",
            self.validation.violations.len()
        );
        for violation in &self.validation.violations {
            let _ = writeln!(out, "  {violation}");
        }

        let _ = writeln!(out, "\n-- warnings ({}) --", self.warning_count());
        for warning in self.all_warnings() {
            let _ = writeln!(out, "  {warning}");
        }

        if let Some(reassign) = &self.reassign {
            let _ = writeln!(
                out,
                "\n-- reassignment: {} applied, {} moved, {} removed --",
                reassign.applied,
                reassign.moved.len(),
                reassign.removed.len()
            );
            for (disease, department) in &reassign.moved {
                let _ = writeln!(out, "  moved `{disease}` -> {department}");
            }
            for disease in &reassign.removed {
                let _ = writeln!(out, "  removed `{disease}`");
            }
        }

        if let Some(prune) = &self.prune {
            let _ = writeln!(
                out,
                "\n-- pruned: {} symptoms, {} examinations, {} treatments --",
                prune.removed_symptoms.len(),
                prune.removed_examinations.len(),
                prune.removed_treatments.len()
            );
        }

        if let Some(weights) = &self.weights {
            let _ = writeln!(out, "\n-- weight normalization --");
            for (department, factor) in &weights.rescaled {
                let _ = writeln!(out, "  {department}: scaled by {factor:.6}");
            }
            for department in &weights.unscaled_departments {
                let _ = writeln!(out, "  {department}: no configured share, raw weights kept");
            }
        }

        out
    }

    fn warning_count(&self) -> usize {
        self.validation.warnings.len()
            + self
                .weights
                .as_ref()
                .map(|w| w.warnings.len())
                .unwrap_or(0)
    }

    fn all_warnings(&self) -> impl Iterator<Item = &String> {
        self.validation.warnings.iter().chain(
            self.weights
                .iter()
                .flat_map(|w| w.warnings.iter()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::IntegrationReport;
    use crate::model::entity::EntityKind;
    use crate::resolve::{MergeReason, MergeRecord};
    use crate::validate::Violation;

    #[test]
    fn renders_merges_and_violations() {
        let mut report = IntegrationReport::default();
        report.packages_loaded = 2;
        report.resolve.merges.push(MergeRecord {
            kind: EntityKind::Examination,
            superseded: "EXAM_A".into(),
            superseded_package: "alpha".to_string(),
            canonical: "EXAM_B".into(),
            canonical_package: "beta".to_string(),
            reason: MergeReason::ExactName,
        });
        report.validation.violations.push(Violation::UncoveredSymptom {
            symptom: "SYM_X".into(),
        });

        let text = report.render_text();
        assert!(text.contains("packages loaded: 2"));
        assert!(text.contains("`EXAM_A` (alpha) -> `EXAM_B` (beta)"));
        assert!(text.contains("symptom `SYM_X` has no resolvable examination"));
    }

    #[test]
    fn serializes_without_optional_sections() {
        let report = IntegrationReport::default();
        let json = serde_json::to_value(&report).expect("report should serialize");
        assert!(json.get("reassign").is_none());
        assert!(json.get("prune").is_none());
    }
}
