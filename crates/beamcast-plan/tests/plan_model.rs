use beamcast_core::BeamcastError;
use beamcast_plan::{load_plan, plan_from_json, plan_to_json, save_plan, Field, Plan, Spot};

fn spot(energy: f64, x: f64, y: f64, mu: f64) -> Spot {
    Spot {
        energy_nominal: energy,
        x,
        y,
        mu,
    }
}

fn demo_plan() -> Plan {
    Plan {
        label: "demo".into(),
        patient_id: "anon-001".into(),
        scaling: 1.0,
        fields: vec![
            Field {
                number: 1,
                gantry_angle: 90.0,
                couch_angle: 0.0,
                sad: Some((1850.0, 2250.0)),
                spots: vec![
                    spot(110.0, -12.0, 4.0, 0.8),
                    spot(110.0, -8.0, 4.0, 1.1),
                    spot(150.0, 0.0, -6.0, 0.4),
                ],
            },
            Field {
                number: 2,
                gantry_angle: 270.0,
                couch_angle: 0.0,
                sad: None,
                spots: vec![spot(90.0, 3.0, 3.0, 2.0)],
            },
        ],
    }
}

#[test]
fn statistics_sum_over_fields() {
    let plan = demo_plan();
    assert_eq!(plan.n_fields(), 2);
    assert_eq!(plan.n_spots(), 4);
    assert!((plan.total_mu() - 4.3).abs() < 1e-12);
    assert!((plan.fields[0].total_mu() - 2.3).abs() < 1e-12);
}

#[test]
fn energy_and_lateral_extents() {
    let plan = demo_plan();
    let field = &plan.fields[0];
    assert_eq!(field.energy_min(), Some(110.0));
    assert_eq!(field.energy_max(), Some(150.0));
    assert_eq!(field.lateral_extent(), Some((-12.0, 0.0, -6.0, 4.0)));
}

#[test]
fn contiguous_equal_energy_spots_form_layers() {
    let plan = demo_plan();
    let layers = plan.fields[0].energy_layers();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].number, 1);
    assert_eq!(layers[0].energy_nominal, 110.0);
    assert_eq!(layers[0].n_spots, 2);
    assert!((layers[0].mu - 1.9).abs() < 1e-12);
    assert_eq!(layers[1].energy_nominal, 150.0);
    assert_eq!(layers[1].n_spots, 1);
}

#[test]
fn empty_field_has_no_extents() {
    let field = Field {
        number: 1,
        gantry_angle: 0.0,
        couch_angle: 0.0,
        sad: None,
        spots: Vec::new(),
    };
    assert_eq!(field.energy_min(), None);
    assert_eq!(field.lateral_extent(), None);
    assert!(field.energy_layers().is_empty());
}

#[test]
fn display_renders_the_overview_table() {
    let plan = demo_plan();
    let rendered = plan.to_string();
    assert!(rendered.contains("Plan label             : demo"));
    assert!(rendered.contains("Number of Fields       :  2"));
    assert!(rendered.contains("Energy layers          :          2"));
    assert!(rendered.contains("Lowest energy          :   110.0000 MeV"));
}

#[test]
fn json_roundtrip_is_identity() {
    let plan = demo_plan();
    let json = plan_to_json(&plan).unwrap();
    let restored = plan_from_json(&json).unwrap();
    assert_eq!(plan, restored);
}

#[test]
fn missing_scaling_defaults_to_one() {
    let json = r#"{"label":"p","fields":[{"number":1,"spots":[]}]}"#;
    let plan = plan_from_json(json).unwrap();
    assert_eq!(plan.scaling, 1.0);
    assert_eq!(plan.fields[0].gantry_angle, 0.0);
    assert_eq!(plan.fields[0].sad, None);
}

#[test]
fn malformed_json_reports_serde_error() {
    let err = plan_from_json("{not json").unwrap_err();
    assert!(matches!(err, BeamcastError::Serde(info) if info.code == "json-deserialize"));
}

#[test]
fn file_roundtrip_via_tempdir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let plan = demo_plan();
    save_plan(&plan, &path).unwrap();
    let restored = load_plan(&path).unwrap();
    assert_eq!(plan, restored);
}

#[test]
fn missing_plan_file_reports_the_path() {
    let err = load_plan(std::path::Path::new("no/such/plan.json")).unwrap_err();
    assert!(matches!(err, BeamcastError::Serde(info)
        if info.code == "plan-read" && info.context["path"].contains("plan.json")));
}
