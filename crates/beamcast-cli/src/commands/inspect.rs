use std::error::Error;
use std::path::PathBuf;

use beamcast_plan::load_plan;
use clap::Args;
use serde_json::json;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Plan JSON produced by the plan importer.
    #[arg(long)]
    pub plan: PathBuf,
    /// Emit a machine readable summary instead of the overview table.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &InspectArgs) -> Result<(), Box<dyn Error>> {
    let plan = load_plan(&args.plan)?;
    if args.json {
        let fields: Vec<_> = plan
            .fields
            .iter()
            .map(|field| {
                json!({
                    "number": field.number,
                    "n_spots": field.n_spots(),
                    "n_layers": field.energy_layers().len(),
                    "total_mu": field.total_mu(),
                    "energy_min_mev": field.energy_min(),
                    "energy_max_mev": field.energy_max(),
                })
            })
            .collect();
        let summary = json!({
            "label": plan.label,
            "patient_id": plan.patient_id,
            "n_fields": plan.n_fields(),
            "n_spots": plan.n_spots(),
            "total_mu": plan.total_mu(),
            "fields": fields,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{plan}");
    }
    Ok(())
}
