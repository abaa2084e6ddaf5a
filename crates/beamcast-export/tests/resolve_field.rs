use beamcast_core::BeamcastError;
use beamcast_export::{export_field, export_plan, resolve_spot};
use beamcast_model::{BeamModelTable, CalibrationRow};
use beamcast_plan::{Field, Plan, Spot};

const REFERENCE_DISTANCE: f64 = 500.0;

fn row(
    energy: f64,
    sigma_x: f64,
    div_x: f64,
    cov_x: f64,
    ppmu: f64,
) -> CalibrationRow {
    CalibrationRow {
        energy_nominal: energy,
        energy: energy - 0.25,
        espread: 0.8,
        ppmu,
        sigma_x,
        sigma_y: sigma_x + 0.2,
        div_x,
        div_y: div_x + 0.001,
        cov_x,
        cov_y: cov_x,
    }
}

fn two_row_table() -> BeamModelTable {
    BeamModelTable::new(
        vec![
            row(70.0, 3.0, 0.01, 0.0, 1.0e8),
            row(100.0, 2.5, 0.015, 0.0, 2.0e8),
        ],
        REFERENCE_DISTANCE,
    )
    .unwrap()
}

fn spot(energy: f64, x: f64, y: f64, mu: f64) -> Spot {
    Spot {
        energy_nominal: energy,
        x,
        y,
        mu,
    }
}

fn field(number: usize, spots: Vec<Spot>) -> Field {
    Field {
        number,
        gantry_angle: 0.0,
        couch_angle: 0.0,
        sad: None,
        spots,
    }
}

#[test]
fn midpoint_energy_at_reference_plane_is_pure_interpolation() {
    let table = two_row_table();
    let source = resolve_spot(&spot(85.0, 1.5, -2.0, 1.0), &table, REFERENCE_DISTANCE).unwrap();
    assert!((source.phase_x.sigma - 2.75).abs() < 1e-12);
    assert!((source.phase_x.sigma_prime - 0.0125).abs() < 1e-12);
    assert_eq!(source.phase_x.cov, 0.0);
    assert_eq!(source.x, 1.5);
    assert_eq!(source.y, -2.0);
}

#[test]
fn downstream_output_plane_applies_backward_drift() {
    let table = BeamModelTable::new(vec![row(100.0, 2.5, 0.01, 0.0, 1.0e8)], REFERENCE_DISTANCE)
        .unwrap();
    let source = resolve_spot(&spot(100.0, 0.0, 0.0, 1.0), &table, 400.0).unwrap();
    // drift = 400 - 500 = -100 mm: sigma^2 = 2.5^2 + 100^2 * 0.01^2 = 7.25
    assert!((source.phase_x.variance() - 7.25).abs() < 1e-9);
    assert!((source.phase_x.sigma - 2.693).abs() < 1e-3);
    assert_eq!(source.phase_x.sigma_prime, 0.01);
}

#[test]
fn output_at_reference_plane_preserves_table_values() {
    let table = two_row_table();
    let source = resolve_spot(&spot(70.0, 0.0, 0.0, 1.0), &table, REFERENCE_DISTANCE).unwrap();
    assert_eq!(source.phase_x.sigma, 3.0);
    assert_eq!(source.phase_x.sigma_prime, 0.01);
    assert_eq!(source.energy, 69.75);
    assert_eq!(source.espread, 0.8);
}

#[test]
fn weight_scales_linearly_with_meterset() {
    let table = two_row_table();
    let base = resolve_spot(&spot(70.0, 0.0, 0.0, 1.0), &table, 500.0).unwrap();
    let scaled = resolve_spot(&spot(70.0, 0.0, 0.0, 2.5), &table, 500.0).unwrap();
    assert_eq!(base.weight, 1.0e8);
    assert!((scaled.weight - 2.5 * base.weight).abs() < 1e-3);
}

#[test]
fn out_of_range_energy_fails_the_spot() {
    let table = two_row_table();
    let err = resolve_spot(&spot(60.0, 0.0, 0.0, 1.0), &table, 500.0).unwrap_err();
    assert!(matches!(err, BeamcastError::EnergyOutOfRange(_)));
}

#[test]
fn inconsistent_covariance_is_reported_per_axis() {
    let table =
        BeamModelTable::new(vec![row(100.0, 1.0, 0.0, -0.1, 1.0e8)], REFERENCE_DISTANCE).unwrap();
    let err = resolve_spot(&spot(100.0, 0.0, 0.0, 1.0), &table, 550.0).unwrap_err();
    assert!(matches!(err, BeamcastError::InvalidTransport(info)
        if info.code == "negative-variance" && info.context["axis"] == "x"));
}

#[test]
fn export_preserves_spot_order() {
    let table = two_row_table();
    let field = field(
        1,
        vec![
            spot(100.0, 0.0, 0.0, 1.0),
            spot(70.0, 1.0, 0.0, 1.0),
            spot(85.0, 2.0, 0.0, 1.0),
            spot(70.0, 3.0, 0.0, 1.0),
        ],
    );
    let sources = export_field(&field, &table, 500.0).unwrap();
    let energies: Vec<f64> = sources.iter().map(|s| s.energy_nominal).collect();
    assert_eq!(energies, vec![100.0, 70.0, 85.0, 70.0]);
    let xs: Vec<f64> = sources.iter().map(|s| s.x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn empty_field_is_rejected_before_resolution() {
    let table = two_row_table();
    let err = export_field(&field(3, Vec::new()), &table, 500.0).unwrap_err();
    assert!(matches!(err, BeamcastError::EmptyField(info)
        if info.code == "empty-field" && info.context["field"] == "3"));
}

#[test]
fn first_failing_spot_aborts_the_field_with_context() {
    let table = two_row_table();
    let field = field(
        2,
        vec![spot(70.0, 0.0, 0.0, 1.0), spot(180.0, 0.0, 0.0, 1.0)],
    );
    let err = export_field(&field, &table, 500.0).unwrap_err();
    assert!(matches!(err, BeamcastError::EnergyOutOfRange(info)
        if info.context["field"] == "2" && info.context["spot"] == "1"));
}

#[test]
fn plan_export_respects_the_field_filter() {
    let table = two_row_table();
    let plan = Plan {
        label: "demo".into(),
        patient_id: String::new(),
        scaling: 1.0,
        fields: vec![
            field(1, vec![spot(70.0, 0.0, 0.0, 1.0)]),
            field(2, vec![spot(100.0, 0.0, 0.0, 1.0), spot(85.0, 0.0, 0.0, 1.0)]),
        ],
    };
    let all = export_plan(&plan, &table, 500.0, None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].field_number, 1);
    assert_eq!(all[1].field_number, 2);
    assert_eq!(all[1].sources.len(), 2);

    let only = export_plan(&plan, &table, 500.0, Some(2)).unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].field_number, 2);

    let none = export_plan(&plan, &table, 500.0, Some(9)).unwrap();
    assert!(none.is_empty());
}

#[test]
fn resolved_sources_roundtrip_through_json() {
    let table = two_row_table();
    let field = field(1, vec![spot(70.0, -4.0, 2.0, 1.5), spot(85.0, 0.0, 0.0, 0.5)]);
    let exports = export_plan(
        &Plan {
            label: String::new(),
            patient_id: String::new(),
            scaling: 1.0,
            fields: vec![field],
        },
        &table,
        450.0,
        None,
    )
    .unwrap();
    let json = serde_json::to_string(&exports).unwrap();
    let restored: Vec<beamcast_export::FieldExport> = serde_json::from_str(&json).unwrap();
    assert_eq!(exports, restored);
}

#[test]
fn plan_export_fails_on_the_first_bad_field() {
    let table = two_row_table();
    let plan = Plan {
        label: String::new(),
        patient_id: String::new(),
        scaling: 1.0,
        fields: vec![
            field(1, vec![spot(70.0, 0.0, 0.0, 1.0)]),
            field(2, Vec::new()),
        ],
    };
    let err = export_plan(&plan, &table, 500.0, None).unwrap_err();
    assert!(matches!(err, BeamcastError::EmptyField(info) if info.context["field"] == "2"));
}
