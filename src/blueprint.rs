//! Factory blueprints: JSON import/export and power/throughput summaries

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculator::RateCalculator;
use crate::constants::GameConstants;
use crate::error::CalcResult;
use crate::models::{ExtractorKind, GeneratorGroup, GeneratorKind, MachineGroup, MachineKind};
use crate::payload::{RawInputDraft, RawInputPayload};
use crate::well::node_count;

pub const BLUEPRINT_VERSION: u32 = 1;

fn default_version() -> u32 {
    BLUEPRINT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryBlueprint {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub raw_inputs: Vec<RawInputPayload>,
    #[serde(default)]
    pub power_generators: Vec<PowerGeneratorEntry>,
    #[serde(default)]
    pub production_lines: Vec<ProductionLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerGeneratorEntry {
    pub generator_type: GeneratorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_item: Option<String>,
    pub count: u32,
    pub overclock_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLine {
    pub name: String,
    pub machine_type: MachineKind,
    pub output_item: String,
    /// Recipe output per machine per minute at 100%
    pub output_per_min: f64,
    pub count: u32,
    pub overclock_percent: f64,
    #[serde(default)]
    pub somersloop: u32,
}

impl ProductionLine {
    pub fn machine_group(&self) -> MachineGroup {
        MachineGroup {
            kind: self.machine_type,
            recipe_rate: self.output_per_min,
            count: self.count,
            clock_speed: self.overclock_percent,
            somersloop: self.somersloop,
        }
    }
}

impl PowerGeneratorEntry {
    pub fn generator_group(&self) -> GeneratorGroup {
        GeneratorGroup {
            kind: self.generator_type,
            count: self.count,
            clock_speed: self.overclock_percent,
        }
    }
}

impl FactoryBlueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: BLUEPRINT_VERSION,
            raw_inputs: Vec::new(),
            power_generators: Vec::new(),
            production_lines: Vec::new(),
        }
    }
}

pub fn import_blueprint(path: &Path) -> Result<FactoryBlueprint> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read blueprint {}", path.display()))?;
    let blueprint: FactoryBlueprint = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse blueprint {}", path.display()))?;

    if blueprint.version > BLUEPRINT_VERSION {
        bail!(
            "Blueprint {} uses format version {}, newest supported is {}",
            path.display(),
            blueprint.version,
            BLUEPRINT_VERSION
        );
    }

    info!(
        name = %blueprint.name,
        raw_inputs = blueprint.raw_inputs.len(),
        generators = blueprint.power_generators.len(),
        lines = blueprint.production_lines.len(),
        "Imported blueprint"
    );
    Ok(blueprint)
}

pub fn export_blueprint(path: &Path, blueprint: &FactoryBlueprint) -> Result<()> {
    let json = serde_json::to_string_pretty(blueprint).context("Failed to serialize blueprint")?;
    fs::write(path, json).with_context(|| format!("Failed to write blueprint {}", path.display()))?;
    info!(name = %blueprint.name, path = %path.display(), "Exported blueprint");
    Ok(())
}

/// Summary of a factory's power balance and item flows
#[derive(Debug)]
pub struct FactorySummary {
    pub name: String,
    pub total_power_consumption: f64,
    pub total_power_generation: f64,
    pub net_power: f64,
    pub building_counts: Vec<(String, u32)>,
    pub raw_inputs: Vec<(String, f64)>,
    pub outputs: Vec<(String, f64)>,
    pub fuel_consumption: Vec<(String, f64)>,
}

fn sorted<V>(map: HashMap<String, V>) -> Vec<(String, V)> {
    let mut list: Vec<_> = map.into_iter().collect();
    list.sort_by(|a, b| a.0.cmp(&b.0));
    list
}

/// Recompute every entry of a blueprint from the game data
///
/// Stored `quantity_per_min` values are ignored; raw inputs are re-estimated
/// from their stored settings. Resource wells count their stored nodes.
pub fn summarize(blueprint: &FactoryBlueprint, constants: &GameConstants) -> CalcResult<FactorySummary> {
    let calc = RateCalculator::new(constants);

    let mut building_counts: HashMap<String, u32> = HashMap::new();
    let mut raw_inputs: HashMap<String, f64> = HashMap::new();
    let mut outputs: HashMap<String, f64> = HashMap::new();
    let mut fuel: HashMap<String, f64> = HashMap::new();
    let mut power_consumption = 0.0;
    let mut power_generation = 0.0;

    for payload in &blueprint.raw_inputs {
        let draft = RawInputDraft::from_payload(payload);
        let estimate = draft.estimate(constants)?;
        let buildings = if payload.extractor_type == ExtractorKind::ResourceWellExtractor {
            node_count(&draft.well_entries)?
        } else {
            draft.count
        };
        *raw_inputs.entry(payload.item.clone()).or_default() += estimate.throughput_per_min;
        *building_counts
            .entry(payload.extractor_type.to_string())
            .or_default() += buildings;
        power_consumption += estimate.power_mw;
    }

    for line in &blueprint.production_lines {
        let output = calc.machine(&line.machine_group())?;
        *outputs.entry(line.output_item.clone()).or_default() += output.throughput_per_min;
        *building_counts
            .entry(line.machine_type.to_string())
            .or_default() += line.count;
        power_consumption += output.power_mw;
    }

    for entry in &blueprint.power_generators {
        let output = calc.generator(&entry.generator_group())?;
        *building_counts
            .entry(entry.generator_type.to_string())
            .or_default() += entry.count;
        power_generation += output.power_mw;

        if let (Some(item), Some(rate)) = (&entry.fuel_item, output.fuel_per_min) {
            *fuel.entry(item.clone()).or_default() += rate;
        }
    }

    Ok(FactorySummary {
        name: blueprint.name.clone(),
        total_power_consumption: power_consumption,
        total_power_generation: power_generation,
        net_power: power_generation - power_consumption,
        building_counts: sorted(building_counts),
        raw_inputs: sorted(raw_inputs),
        outputs: sorted(outputs),
        fuel_consumption: sorted(fuel),
    })
}

impl std::fmt::Display for FactorySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Factory Summary: {} ===", self.name)?;
        writeln!(f)?;

        writeln!(f, "Buildings:")?;
        for (name, count) in &self.building_counts {
            writeln!(f, "  {}x {}", count, name)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs:")?;
        for (item, rate) in &self.raw_inputs {
            writeln!(f, "  {} @ {:.3}/min", item, rate)?;
        }
        writeln!(f)?;

        writeln!(f, "Outputs:")?;
        for (item, rate) in &self.outputs {
            writeln!(f, "  {} @ {:.3}/min", item, rate)?;
        }
        writeln!(f)?;

        if !self.fuel_consumption.is_empty() {
            writeln!(f, "Fuel burned:")?;
            for (item, rate) in &self.fuel_consumption {
                writeln!(f, "  {} @ {:.3}/min", item, rate)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Power:")?;
        writeln!(f, "  Consumption: {:.1} MW", self.total_power_consumption)?;
        writeln!(f, "  Generation:  {:.1} MW", self.total_power_generation)?;
        writeln!(f, "  Net:         {:.1} MW", self.net_power)?;

        Ok(())
    }
}
