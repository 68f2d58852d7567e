use wardpack_core::directive::Directive;
use wardpack_core::model::entity::{EntityId, EntityKind};
use wardpack_core::model::package::SourcePackage;
use wardpack_core::resolve::{resolve_packages, MergeReason};

fn package(tag: &str, priority: i32, json: serde_json::Value) -> SourcePackage {
    let mut json = json;
    json["tag"] = serde_json::json!(tag);
    json["priority"] = serde_json::json!(priority);
    let mut package: SourcePackage =
        serde_json::from_value(json).expect("fixture package parses");
    package.stamp_provenance();
    package
}

fn cardio_pack() -> SourcePackage {
    package(
        "cardio",
        5,
        serde_json::json!({
            "diseases": [{
                "id": "DX_ANGINA",
                "name": "Angina",
                "department": "cardiology",
                "main_symptom": "SYM_CHEST_PAIN"
            }],
            "symptoms": [{
                "id": "SYM_CHEST_PAIN",
                "name": "Chest Pain",
                "is_main": true,
                "examinations": ["EXAM_BLOOD_CARDIO"],
                "treatment": "TRT_MEDS"
            }],
            "examinations": [{
                "id": "EXAM_BLOOD_CARDIO",
                "name": "Blood Test (CardioPack)",
                "facility": "lab"
            }],
            "treatments": [{
                "id": "TRT_MEDS",
                "name": "Medication",
                "kind": "non_surgical"
            }]
        }),
    )
}

fn base_pack() -> SourcePackage {
    package(
        "base",
        1,
        serde_json::json!({
            "diseases": [{
                "id": "DX_ANEMIA",
                "name": "Anemia",
                "department": "general",
                "main_symptom": "SYM_FATIGUE"
            }],
            "symptoms": [{
                "id": "SYM_FATIGUE",
                "name": "Fatigue",
                "is_main": true,
                "examinations": ["EXAM_BLOOD"],
                "treatment": "TRT_IRON"
            }],
            "examinations": [{
                "id": "EXAM_BLOOD",
                "name": "Blood Test",
                "facility": "lab"
            }],
            "treatments": [{
                "id": "TRT_IRON",
                "name": "Iron Supplement",
                "kind": "non_surgical"
            }]
        }),
    )
}

#[test]
fn same_name_examinations_collapse_to_highest_priority() {
    let (graph, outcome) =
        resolve_packages(&[base_pack(), cardio_pack()], &[]).expect("resolution succeeds");

    // One canonical blood test survives; the higher-priority pack wins.
    assert!(graph
        .examinations
        .contains_key(&EntityId::from("EXAM_BLOOD_CARDIO")));
    assert!(!graph.examinations.contains_key(&EntityId::from("EXAM_BLOOD")));

    let merge = outcome
        .merges
        .iter()
        .find(|m| m.kind == EntityKind::Examination)
        .expect("examination merge recorded");
    assert_eq!(merge.superseded, EntityId::from("EXAM_BLOOD"));
    assert_eq!(merge.canonical, EntityId::from("EXAM_BLOOD_CARDIO"));
    assert_eq!(merge.reason, MergeReason::ExactName);

    // Every symptom that referenced the superseded exam now points at the
    // canonical one.
    for symptom in graph.symptoms.values() {
        assert!(!symptom
            .examinations
            .contains(&EntityId::from("EXAM_BLOOD")));
    }
    assert!(graph.symptoms[&EntityId::from("SYM_FATIGUE")]
        .examinations
        .contains(&EntityId::from("EXAM_BLOOD_CARDIO")));
}

#[test]
fn resolution_is_order_insensitive() {
    let forward =
        resolve_packages(&[base_pack(), cardio_pack()], &[]).expect("resolution succeeds");
    let reversed =
        resolve_packages(&[cardio_pack(), base_pack()], &[]).expect("resolution succeeds");

    assert_eq!(forward.0, reversed.0);
    assert_eq!(forward.1, reversed.1);
}

#[test]
fn reordered_names_become_review_candidates_not_merges() {
    let mut other = base_pack();
    other.tag = "other".to_string();
    other.examinations[0].id = "EXAM_BLOOD_ALT".into();
    other.examinations[0].name = "Test, Blood".to_string();
    other.symptoms[0].id = "SYM_PALLOR".into();
    other.symptoms[0].name = "Pallor".to_string();
    other.symptoms[0].examinations = vec!["EXAM_BLOOD_ALT".into()];
    other.diseases[0].id = "DX_PALLOR".into();
    other.diseases[0].name = "Iron Deficiency".to_string();
    other.diseases[0].main_symptom = "SYM_PALLOR".into();
    other.treatments[0].id = "TRT_IRON_ALT".into();
    other.treatments[0].name = "Ferrous Sulfate".to_string();
    other.symptoms[0].treatment = Some("TRT_IRON_ALT".into());
    other.stamp_provenance();

    let (graph, outcome) =
        resolve_packages(&[base_pack(), other], &[]).expect("resolution succeeds");

    // Both exams survive; the pair is surfaced for curator review.
    assert!(graph.examinations.contains_key(&EntityId::from("EXAM_BLOOD")));
    assert!(graph
        .examinations
        .contains_key(&EntityId::from("EXAM_BLOOD_ALT")));
    let candidate = outcome
        .review_candidates
        .iter()
        .find(|c| c.kind == EntityKind::Examination)
        .expect("review candidate surfaced");
    assert!(candidate.ids.contains(&EntityId::from("EXAM_BLOOD")));
    assert!(candidate.ids.contains(&EntityId::from("EXAM_BLOOD_ALT")));
}

#[test]
fn merge_directive_collapses_review_candidates() {
    let mut other = base_pack();
    other.tag = "other".to_string();
    other.examinations[0].id = "EXAM_BLOOD_ALT".into();
    other.examinations[0].name = "Test, Blood".to_string();
    other.symptoms[0].id = "SYM_PALLOR".into();
    other.symptoms[0].name = "Pallor".to_string();
    other.symptoms[0].examinations = vec!["EXAM_BLOOD_ALT".into()];
    other.diseases[0].id = "DX_PALLOR".into();
    other.diseases[0].name = "Iron Deficiency".to_string();
    other.diseases[0].main_symptom = "SYM_PALLOR".into();
    other.treatments[0].id = "TRT_IRON_ALT".into();
    other.treatments[0].name = "Ferrous Sulfate".to_string();
    other.symptoms[0].treatment = Some("TRT_IRON_ALT".into());
    other.stamp_provenance();

    let directives = vec![Directive::Merge {
        kind: EntityKind::Examination,
        from: "EXAM_BLOOD_ALT".into(),
        into: "EXAM_BLOOD".into(),
    }];
    let (graph, outcome) =
        resolve_packages(&[base_pack(), other], &directives).expect("resolution succeeds");

    assert!(!graph
        .examinations
        .contains_key(&EntityId::from("EXAM_BLOOD_ALT")));
    assert!(graph.symptoms[&EntityId::from("SYM_PALLOR")]
        .examinations
        .contains(&EntityId::from("EXAM_BLOOD")));
    assert!(outcome
        .merges
        .iter()
        .any(|m| m.reason == MergeReason::Directive));
}
