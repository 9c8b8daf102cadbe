//! Tests d'intégration: configuration de zone et lot de projets

use urbanisme::rules::permit_for_element;
use urbanisme::{resolve_setbacks, ConstructionType, Determination};
use urbassist::{evaluate_batch, BatchEntry, BatchStatus, Config};

#[test]
fn test_zone_config_drives_effective_rules() {
    let config = Config::from_preset("standard").unwrap();
    let ub = config.zone("UB").unwrap();

    let shed = resolve_setbacks(ConstructionType::Shed, ub);
    assert_eq!(shed.front_setback, 5.0);
    assert_eq!(shed.side_setback, 0.0);
    assert_eq!(shed.rear_setback, 0.0);
    assert_eq!(shed.max_height, 3.5);

    let house = resolve_setbacks(ConstructionType::MainHouse, ub);
    assert_eq!(house.side_setback, 3.0);
    assert_eq!(house.max_height, 9.0);

    assert!(permit_for_element(ConstructionType::Shed, 4.0).is_none());
    assert!(permit_for_element(ConstructionType::Shed, 12.0).is_some());
}

#[test]
fn test_batch_from_json_document() {
    let document = r#"[
        {"label": "abri", "projectType": "new_construction", "floorAreaCreated": 15},
        {"label": "extension", "projectType": "existing_extension",
         "floorAreaCreated": 30, "existingFloorArea": 130},
        {"label": "terrasse", "projectType": "outdoor", "floorAreaCreated": 0},
        {"label": "erreur", "projectType": "new_construction", "floorAreaCreated": -1}
    ]"#;
    let entries: Vec<BatchEntry> = serde_json::from_str(document).unwrap();

    let report = evaluate_batch("projets.json", &entries);

    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert_eq!(report.evaluated, 3);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.results[0].result.determination, Determination::Dp);
    assert_eq!(
        report.results[1].result.determination,
        Determination::ArchitectRequired
    );
    assert_eq!(report.results[2].result.determination, Determination::Review);
    assert_eq!(report.errors[0].label.as_deref(), Some("erreur"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "PartialSuccess");
    assert_eq!(json["by_determination"]["REVIEW"], 1);
}
