//! Versioned game-data tables
//!
//! One shared table of base rates, base power and purity values, read by the
//! calculator, the resource-well aggregator and every report. The built-in
//! defaults can be replaced from the database or from a TOML file when the
//! game's balance values change.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};
use crate::models::{ExtractorKind, GeneratorKind, MachineKind, Purity, ResourceClass};

pub const GAME_DATA_VERSION: &str = "1.0";

/// ≈ log2(5), the game's overclock exponent
pub const OVERCLOCK_EXPONENT: f64 = 1.321928;

pub const MIN_CLOCK_SPEED: f64 = 0.0;
pub const MAX_CLOCK_SPEED: f64 = 250.0;

pub const DEFAULT_STICKY_VALUES: [f64; 9] =
    [0.0, 50.0, 100.0, 125.0, 150.0, 175.0, 200.0, 225.0, 250.0];
pub const DEFAULT_SNAP_THRESHOLD: f64 = 2.0;

pub const PRESSURIZER_BASE_POWER_MW: f64 = 150.0;

/// Upper bound on the expanded nodes of one resource well; node ids are `u32`
pub const MAX_WELL_NODES: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorSpec {
    pub kind: ExtractorKind,
    /// Normal-purity rate per minute at 100%. Resource-well nodes take their
    /// rate from `GameConstants::resource_well_rates` instead.
    pub base_rate: f64,
    pub base_power: f64,
    pub resource_class: ResourceClass,
    pub purity_applies: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub kind: MachineKind,
    pub base_power: f64,
    pub max_somersloop: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub kind: GeneratorKind,
    pub base_power: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_per_min: Option<f64>,
}

/// One value per purity tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurityTable {
    pub impure: f64,
    pub normal: f64,
    pub pure: f64,
}

impl PurityTable {
    pub fn get(&self, purity: Purity) -> f64 {
        match purity {
            Purity::Impure => self.impure,
            Purity::Normal => self.normal,
            Purity::Pure => self.pure,
        }
    }

    pub fn set(&mut self, purity: Purity, value: f64) {
        match purity {
            Purity::Impure => self.impure = value,
            Purity::Normal => self.normal = value,
            Purity::Pure => self.pure = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    pub sticky_values: Vec<f64>,
    pub threshold: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            sticky_values: DEFAULT_STICKY_VALUES.to_vec(),
            threshold: DEFAULT_SNAP_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConstants {
    pub version: String,
    pub overclock_exponent: f64,
    pub pressurizer_base_power: f64,
    /// Applied to miner and oil extractor base rates
    pub purity_multipliers: PurityTable,
    /// Absolute per-node rates; not a multiplier
    pub resource_well_rates: PurityTable,
    pub snap: SnapSettings,
    pub extractors: Vec<ExtractorSpec>,
    pub machines: Vec<MachineSpec>,
    pub generators: Vec<GeneratorSpec>,
}

impl Default for GameConstants {
    fn default() -> Self {
        use ExtractorKind::*;
        use GeneratorKind::*;
        use MachineKind::*;

        let extractor = |kind, base_rate, base_power, resource_class, purity_applies| ExtractorSpec {
            kind,
            base_rate,
            base_power,
            resource_class,
            purity_applies,
        };
        let machine = |kind, base_power, max_somersloop| MachineSpec {
            kind,
            base_power,
            max_somersloop,
        };
        let generator = |kind, base_power, fuel_per_min| GeneratorSpec {
            kind,
            base_power,
            fuel_per_min,
        };

        Self {
            version: GAME_DATA_VERSION.to_string(),
            overclock_exponent: OVERCLOCK_EXPONENT,
            pressurizer_base_power: PRESSURIZER_BASE_POWER_MW,
            purity_multipliers: PurityTable {
                impure: 0.5,
                normal: 1.0,
                pure: 2.0,
            },
            resource_well_rates: PurityTable {
                impure: 30.0,
                normal: 60.0,
                pure: 120.0,
            },
            snap: SnapSettings::default(),
            extractors: vec![
                extractor(MinerMk1, 60.0, 5.0, ResourceClass::Solid, true),
                extractor(MinerMk2, 120.0, 12.0, ResourceClass::Solid, true),
                extractor(MinerMk3, 240.0, 30.0, ResourceClass::Solid, true),
                extractor(WaterExtractor, 120.0, 20.0, ResourceClass::Liquid, false),
                extractor(OilExtractor, 120.0, 40.0, ResourceClass::Liquid, true),
                // Power is drawn by the pressurizer, not the node
                extractor(ResourceWellExtractor, 60.0, 0.0, ResourceClass::Gas, true),
            ],
            machines: vec![
                machine(Smelter, 4.0, 1),
                machine(Constructor, 4.0, 1),
                machine(Assembler, 15.0, 2),
                machine(Foundry, 16.0, 2),
                machine(Refinery, 30.0, 2),
                machine(Manufacturer, 55.0, 4),
                machine(Blender, 75.0, 4),
                machine(Packager, 10.0, 0),
                machine(ParticleAccelerator, 500.0, 4),
            ],
            generators: vec![
                generator(BiomassBurner, 30.0, None),
                generator(CoalGenerator, 75.0, Some(15.0)),
                generator(FuelGenerator, 250.0, Some(20.0)),
                generator(NuclearPowerPlant, 2500.0, Some(0.2)),
                generator(GeothermalGenerator, 200.0, None),
            ],
        }
    }
}

impl GameConstants {
    /// `(clock/100)^exponent`; exactly 1 at 100% and 0 at 0%
    pub fn clock_factor(&self, clock_speed: f64) -> f64 {
        (clock_speed / 100.0).powf(self.overclock_exponent)
    }

    pub fn extractor(&self, kind: ExtractorKind) -> CalcResult<&ExtractorSpec> {
        self.extractors
            .iter()
            .find(|spec| spec.kind == kind)
            .ok_or_else(|| CalcError::UnsupportedKind(kind.to_string()))
    }

    pub fn machine(&self, kind: MachineKind) -> CalcResult<&MachineSpec> {
        self.machines
            .iter()
            .find(|spec| spec.kind == kind)
            .ok_or_else(|| CalcError::UnsupportedKind(kind.to_string()))
    }

    pub fn generator(&self, kind: GeneratorKind) -> CalcResult<&GeneratorSpec> {
        self.generators
            .iter()
            .find(|spec| spec.kind == kind)
            .ok_or_else(|| CalcError::UnsupportedKind(kind.to_string()))
    }

    pub fn extractor_mut(&mut self, kind: ExtractorKind) -> Option<&mut ExtractorSpec> {
        self.extractors.iter_mut().find(|spec| spec.kind == kind)
    }

    pub fn machine_mut(&mut self, kind: MachineKind) -> Option<&mut MachineSpec> {
        self.machines.iter_mut().find(|spec| spec.kind == kind)
    }

    pub fn generator_mut(&mut self, kind: GeneratorKind) -> Option<&mut GeneratorSpec> {
        self.generators.iter_mut().find(|spec| spec.kind == kind)
    }

    /// Load a full table from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read game data {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse game data {}", path.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize game data")
    }
}
