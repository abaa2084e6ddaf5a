use std::fmt;

use serde::{Deserialize, Serialize};

fn default_scaling() -> f64 {
    1.0
}

/// Single scanned spot: one discrete beam position/energy/weight unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    /// Nominal beam energy, the calibration lookup key [MeV].
    pub energy_nominal: f64,
    /// Lateral position at isocenter, horizontal [mm].
    pub x: f64,
    /// Lateral position at isocenter, vertical [mm].
    pub y: f64,
    /// Meterset weight [MU].
    pub mu: f64,
}

/// One spot-scanned treatment field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// 1-based field number within the plan.
    pub number: usize,
    /// Gantry angle [deg]. Irrelevant to the optics core, carried for the
    /// emitted file header.
    #[serde(default)]
    pub gantry_angle: f64,
    /// Couch (patient support) angle [deg].
    #[serde(default)]
    pub couch_angle: f64,
    /// Source-to-axis distances per transverse axis (x, y) [mm], when the
    /// delivery machine publishes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sad: Option<(f64, f64)>,
    /// Scanned spots in delivery order.
    pub spots: Vec<Spot>,
}

/// Contiguous run of equal-energy spots, the original layer view of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    /// 1-based layer number.
    pub number: usize,
    /// Nominal energy shared by the spots in the run [MeV].
    pub energy_nominal: f64,
    /// Number of spots in the run.
    pub n_spots: usize,
    /// Summed meterset weight of the run [MU].
    pub mu: f64,
}

impl Field {
    /// Number of spots in this field.
    pub fn n_spots(&self) -> usize {
        self.spots.len()
    }

    /// Summed meterset weight over all spots [MU].
    pub fn total_mu(&self) -> f64 {
        self.spots.iter().map(|spot| spot.mu).sum()
    }

    /// Lowest nominal energy over all spots [MeV].
    pub fn energy_min(&self) -> Option<f64> {
        self.spots
            .iter()
            .map(|spot| spot.energy_nominal)
            .fold(None, |acc, e| Some(acc.map_or(e, |a: f64| a.min(e))))
    }

    /// Highest nominal energy over all spots [MeV].
    pub fn energy_max(&self) -> Option<f64> {
        self.spots
            .iter()
            .map(|spot| spot.energy_nominal)
            .fold(None, |acc, e| Some(acc.map_or(e, |a: f64| a.max(e))))
    }

    /// Lateral extent of the spot pattern, `(xmin, xmax, ymin, ymax)` [mm].
    pub fn lateral_extent(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.spots.first()?;
        let mut extent = (first.x, first.x, first.y, first.y);
        for spot in &self.spots[1..] {
            extent.0 = extent.0.min(spot.x);
            extent.1 = extent.1.max(spot.x);
            extent.2 = extent.2.min(spot.y);
            extent.3 = extent.3.max(spot.y);
        }
        Some(extent)
    }

    /// Regroups the flat spot list into contiguous equal-energy runs, the
    /// layer structure scanned delivery systems emit.
    pub fn energy_layers(&self) -> Vec<LayerSummary> {
        let mut layers: Vec<LayerSummary> = Vec::new();
        for spot in &self.spots {
            match layers.last_mut() {
                Some(layer) if layer.energy_nominal == spot.energy_nominal => {
                    layer.n_spots += 1;
                    layer.mu += spot.mu;
                }
                _ => layers.push(LayerSummary {
                    number: layers.len() + 1,
                    energy_nominal: spot.energy_nominal,
                    n_spots: 1,
                    mu: spot.mu,
                }),
            }
        }
        layers
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers = self.energy_layers();
        writeln!(f, "    ------------------------------------------------")?;
        writeln!(f, "    Energy layers          : {:10}", layers.len())?;
        writeln!(f, "    Total MUs              : {:10.4}", self.total_mu())?;
        writeln!(f, "    ------------------------------------------------")?;
        for layer in &layers {
            writeln!(
                f,
                "       Layer {:3}: {:10.4} MeV    {:10} spots",
                layer.number, layer.energy_nominal, layer.n_spots
            )?;
        }
        writeln!(
            f,
            "    Lowest energy          : {:10.4} MeV",
            self.energy_min().unwrap_or(0.0)
        )?;
        writeln!(
            f,
            "    Highest energy         : {:10.4} MeV",
            self.energy_max().unwrap_or(0.0)
        )?;
        let (xmin, xmax, ymin, ymax) = self.lateral_extent().unwrap_or((0.0, 0.0, 0.0, 0.0));
        writeln!(f, "    ------------------------------------------------")?;
        writeln!(
            f,
            "    Spot field min/max X   : {xmin:+10.4} {xmax:+10.4} mm"
        )?;
        writeln!(
            f,
            "    Spot field min/max Y   : {ymin:+10.4} {ymax:+10.4} mm"
        )?;
        writeln!(f, "    ------------------------------------------------")
    }
}

/// A proton therapy plan consisting of multiple fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan label from the treatment planning system.
    #[serde(default)]
    pub label: String,
    /// Anonymised patient identifier.
    #[serde(default)]
    pub patient_id: String,
    /// Global particle-budget scaling factor applied at export time.
    #[serde(default = "default_scaling")]
    pub scaling: f64,
    /// Treatment fields in plan order.
    pub fields: Vec<Field>,
}

impl Plan {
    /// Number of fields in the plan.
    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }

    /// Total number of spots over all fields.
    pub fn n_spots(&self) -> usize {
        self.fields.iter().map(Field::n_spots).sum()
    }

    /// Summed meterset weight over all fields [MU].
    pub fn total_mu(&self) -> f64 {
        self.fields.iter().map(Field::total_mu).sum()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------------------------------------------------")?;
        writeln!(f, "Plan label             : {}", self.label)?;
        writeln!(f, "Patient ID             : {}", self.patient_id)?;
        writeln!(f, "Number of Fields       : {:2}", self.n_fields())?;
        for field in &self.fields {
            writeln!(f, "---------------------------------------------------")?;
            writeln!(
                f,
                "   Field                  : {:02}/{:02}:",
                field.number,
                self.n_fields()
            )?;
            write!(f, "{field}")?;
        }
        Ok(())
    }
}
