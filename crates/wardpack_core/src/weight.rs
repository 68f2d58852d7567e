//! Patient-generation weight normalization.
//!
//! # Responsibility
//! - Rescale disease frequency weights per department so each department
//!   hits its configured share of total patient generation.
//!
//! # Invariants
//! - Within a department, relative weight ratios are preserved exactly.
//! - A positive weight never becomes zero or negative.
//! - Departments without a configured share keep raw weights.

use crate::config::IntegrateConfig;
use crate::model::graph::ContentGraph;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Weight normalization summary for the curator report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeightOutcome {
    /// Department and the scale factor applied to its raw weights.
    pub rescaled: BTreeMap<String, f64>,
    /// Departments seen in content but absent from the share table.
    pub unscaled_departments: Vec<String>,
    /// Advisory notes, e.g. dead (zero-weight) diseases.
    pub warnings: Vec<String>,
}

/// Normalizes disease weights in place.
///
/// Missing weights are materialized to the configured baseline first, so
/// every exported disease carries an explicit weight. For each department
/// with a configured share, weights are scaled by `share / raw_sum`, which
/// keeps in-department ratios intact while the department's total equals
/// its share of total generation.
pub fn normalize_weights(graph: &mut ContentGraph, config: &IntegrateConfig) -> WeightOutcome {
    let mut outcome = WeightOutcome::default();

    let mut raw_sums: BTreeMap<String, f64> = BTreeMap::new();
    for disease in graph.diseases.values_mut() {
        let raw = disease.weight.unwrap_or(config.baseline_weight);
        if raw <= 0.0 {
            outcome.warnings.push(format!(
                "disease `{}` has non-positive weight {raw}; it can never be generated",
                disease.id
            ));
        }
        disease.weight = Some(raw);
        *raw_sums.entry(disease.department.clone()).or_insert(0.0) += raw.max(0.0);
    }

    for (department, raw_sum) in &raw_sums {
        let Some(share) = config.department_shares.get(department) else {
            outcome.unscaled_departments.push(department.clone());
            continue;
        };
        if *raw_sum <= 0.0 {
            warn!(
                "event=weight_skip department={department} reason=non_positive_raw_sum sum={raw_sum}"
            );
            outcome.warnings.push(format!(
                "department `{department}` has no positive raw weight; share {share} not applied"
            ));
            continue;
        }
        outcome
            .rescaled
            .insert(department.clone(), share / raw_sum);
    }

    for disease in graph.diseases.values_mut() {
        if let Some(factor) = outcome.rescaled.get(&disease.department) {
            let raw = disease.weight.unwrap_or(config.baseline_weight);
            if raw > 0.0 {
                disease.weight = Some(raw * factor);
            }
        }
    }

    info!(
        "event=weights_normalized rescaled_departments={} unscaled_departments={} warnings={}",
        outcome.rescaled.len(),
        outcome.unscaled_departments.len(),
        outcome.warnings.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::normalize_weights;
    use crate::config::IntegrateConfig;
    use crate::model::entity::{Disease, EntityId};
    use crate::model::graph::ContentGraph;

    fn disease(id: &str, department: &str, weight: Option<f64>) -> Disease {
        Disease {
            id: id.into(),
            name: id.to_string(),
            department: department.to_string(),
            main_symptom: "SYM_X".into(),
            secondary_symptoms: Vec::new(),
            weight,
            treatment_cost: None,
            tags: Vec::new(),
            package: "base".to_string(),
        }
    }

    fn weight_of(graph: &ContentGraph, id: &str) -> f64 {
        graph.diseases[&EntityId::from(id)]
            .weight
            .expect("weight is materialized")
    }

    #[test]
    fn preserves_in_department_ratios() {
        let mut graph = ContentGraph::new();
        graph.insert_disease(disease("DX_X", "cardiology", Some(4.0)));
        graph.insert_disease(disease("DX_Y", "cardiology", Some(2.0)));

        let mut config = IntegrateConfig::default();
        config.departments.insert("cardiology".to_string());
        config
            .department_shares
            .insert("cardiology".to_string(), 0.3);

        normalize_weights(&mut graph, &config);

        let x = weight_of(&graph, "DX_X");
        let y = weight_of(&graph, "DX_Y");
        assert!((x / y - 2.0).abs() < 1e-12, "ratio drifted: {x} vs {y}");
        assert!((x + y - 0.3).abs() < 1e-12, "department sum is its share");
    }

    #[test]
    fn missing_weight_defaults_to_baseline() {
        let mut graph = ContentGraph::new();
        graph.insert_disease(disease("DX_X", "cardiology", None));

        let config = IntegrateConfig::default();
        let outcome = normalize_weights(&mut graph, &config);

        assert_eq!(weight_of(&graph, "DX_X"), config.baseline_weight);
        assert_eq!(outcome.unscaled_departments, vec!["cardiology".to_string()]);
    }

    #[test]
    fn zero_weight_is_a_warning_not_an_error() {
        let mut graph = ContentGraph::new();
        graph.insert_disease(disease("DX_DEAD", "cardiology", Some(0.0)));
        graph.insert_disease(disease("DX_LIVE", "cardiology", Some(1.0)));

        let mut config = IntegrateConfig::default();
        config.departments.insert("cardiology".to_string());
        config
            .department_shares
            .insert("cardiology".to_string(), 0.5);

        let outcome = normalize_weights(&mut graph, &config);

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("DX_DEAD"));
        // The live disease absorbs the whole share; the dead one stays put.
        assert!((weight_of(&graph, "DX_LIVE") - 0.5).abs() < 1e-12);
        assert_eq!(weight_of(&graph, "DX_DEAD"), 0.0);
    }

    #[test]
    fn unconfigured_departments_keep_raw_weights() {
        let mut graph = ContentGraph::new();
        graph.insert_disease(disease("DX_X", "dermatology", Some(7.5)));

        let outcome = normalize_weights(&mut graph, &IntegrateConfig::default());

        assert_eq!(weight_of(&graph, "DX_X"), 7.5);
        assert_eq!(
            outcome.unscaled_departments,
            vec!["dermatology".to_string()]
        );
    }
}
