use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use beamcast_export::{export_plan, field_source_text, EnergyMode, TopasOptions};
use beamcast_model::BeamModelTable;
use beamcast_plan::load_plan;
use clap::Args;
use log::{debug, info};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Plan JSON produced by the plan importer.
    #[arg(long)]
    pub plan: PathBuf,
    /// Beam model calibration CSV.
    #[arg(long = "beam-model")]
    pub beam_model: PathBuf,
    /// SPR to material mapping CSV, forwarded to the geometry exporter.
    #[arg(long = "spr-to-material")]
    pub spr_to_material: Option<PathBuf>,
    /// Plane the beam model was measured at, mm upstream of isocenter.
    #[arg(long = "reference-distance", default_value_t = 500.0)]
    pub reference_distance: f64,
    /// Plane to define the sources at, mm upstream of isocenter
    /// (default: the beam model's own reference plane).
    #[arg(long = "output-distance")]
    pub output_distance: Option<f64>,
    /// Export only this 1-based field number (default: all fields).
    #[arg(long)]
    pub field: Option<usize>,
    /// Target number of Monte Carlo histories per field.
    #[arg(long, default_value_t = 1_000_000)]
    pub nstat: u64,
    /// Write realized (measured) energies instead of nominal ones.
    #[arg(long = "realized-energy")]
    pub realized_energy: bool,
    /// Output base path; the field number is appended before the extension.
    #[arg(long, default_value = "topas.txt")]
    pub out: PathBuf,
}

pub fn run(args: &ExportArgs) -> Result<(), Box<dyn Error>> {
    let table = BeamModelTable::from_csv_path(&args.beam_model, args.reference_distance)?;
    let plan = load_plan(&args.plan)?;
    if let Some(spr) = &args.spr_to_material {
        debug!("SPR to material map {} (geometry export only)", spr.display());
    }

    if let Some(wanted) = args.field {
        if !plan.fields.iter().any(|field| field.number == wanted) {
            return Err(format!(
                "field {wanted} not present in plan '{}' ({} fields)",
                plan.label,
                plan.n_fields()
            )
            .into());
        }
    }

    let output_distance = args.output_distance.unwrap_or(args.reference_distance);
    info!(
        "beam model: {} rows, reference plane {} mm upstream, output plane {} mm",
        table.len(),
        table.reference_distance(),
        output_distance
    );

    let opts = TopasOptions {
        nstat: args.nstat.max(1),
        energy_mode: if args.realized_energy {
            EnergyMode::Realized
        } else {
            EnergyMode::Nominal
        },
    };

    let exports = export_plan(&plan, &table, output_distance, args.field)?;
    for export in &exports {
        let field = plan
            .fields
            .iter()
            .find(|field| field.number == export.field_number)
            .ok_or_else(|| format!("field {} missing from plan", export.field_number))?;
        let text = field_source_text(field, &export.sources, output_distance, plan.scaling, &opts);
        let path = field_output_path(&args.out, export.field_number);
        fs::write(&path, text)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// `topas.txt` + field 2 -> `topas_field2.txt`, next to the base path.
fn field_output_path(base: &Path, field_number: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("topas");
    let ext = base.extension().and_then(|ext| ext.to_str()).unwrap_or("txt");
    base.with_file_name(format!("{stem}_field{field_number}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_append_the_field_number() {
        let path = field_output_path(Path::new("out/topas.txt"), 2);
        assert_eq!(path, PathBuf::from("out/topas_field2.txt"));
    }
}
