//! Data models for Satisfactory extractors, machines and generators

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, ValidationError};

/// Lowercase with separators dropped, so "Miner Mk2", "miner-mk2" and
/// "miner_mk2" all name the same kind
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name, as stored in the database and in payloads
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                let wanted = normalize_name(name);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| normalize_name(candidate.as_str()) == wanted)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

named_enum!(
    /// Raw-resource extractor buildings
    ExtractorKind {
        MinerMk1 => "miner_mk1",
        MinerMk2 => "miner_mk2",
        MinerMk3 => "miner_mk3",
        WaterExtractor => "water_extractor",
        OilExtractor => "oil_extractor",
        ResourceWellExtractor => "resource_well_extractor",
    }
);

named_enum!(
    /// Production buildings that run a recipe
    MachineKind {
        Smelter => "smelter",
        Constructor => "constructor",
        Assembler => "assembler",
        Foundry => "foundry",
        Refinery => "refinery",
        Manufacturer => "manufacturer",
        Blender => "blender",
        Packager => "packager",
        ParticleAccelerator => "particle_accelerator",
    }
);

named_enum!(
    /// Power generator buildings
    GeneratorKind {
        BiomassBurner => "biomass_burner",
        CoalGenerator => "coal_generator",
        FuelGenerator => "fuel_generator",
        NuclearPowerPlant => "nuclear_power_plant",
        GeothermalGenerator => "geothermal_generator",
    }
);

named_enum!(
    /// Resource node richness tier
    Purity {
        Impure => "impure",
        Normal => "normal",
        Pure => "pure",
    }
);

named_enum!(
    ResourceClass {
        Solid => "solid",
        Liquid => "liquid",
        Gas => "gas",
    }
);

impl FromStr for ExtractorKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CalcError::UnsupportedKind(s.to_string()))
    }
}

impl FromStr for MachineKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CalcError::UnsupportedKind(s.to_string()))
    }
}

impl FromStr for GeneratorKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CalcError::UnsupportedKind(s.to_string()))
    }
}

impl FromStr for Purity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ValidationError::UnknownPurity(s.to_string()))
    }
}

impl FromStr for ResourceClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ValidationError::UnknownResourceClass(s.to_string()))
    }
}

/// N identical machines running the same recipe at the same clock speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineGroup {
    pub kind: MachineKind,
    pub recipe_rate: f64, // Recipe output per minute at 100%
    pub count: u32,
    pub clock_speed: f64,
    #[serde(default)]
    pub somersloop: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorGroup {
    pub kind: GeneratorKind,
    pub count: u32,
    pub clock_speed: f64,
}

/// `count` resource-well nodes sharing a purity, as edited in the form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceWellExtractorEntry {
    pub purity: Purity,
    pub count: u32,
}

/// Parses `purity[:count]`, e.g. `pure:2` or `impure`
impl FromStr for ResourceWellExtractorEntry {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (purity, count) = match s.split_once(':') {
            Some((purity, count)) => {
                let count = count
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ValidationError::MalformedEntry(s.to_string()))?;
                (purity, count)
            }
            None => (s, 1),
        };

        Ok(Self {
            purity: purity.trim().parse()?,
            count,
        })
    }
}

/// A single resource-well node, as persisted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorNode {
    pub id: u32,
    pub purity: Purity,
}

/// Shared overclock for every node of one resource well
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceWellPressurizer {
    pub clock_speed: f64,
}

impl Default for ResourceWellPressurizer {
    fn default() -> Self {
        Self { clock_speed: 100.0 }
    }
}

/// Throughput and power of one homogeneous group
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RateOutput {
    pub throughput_per_min: f64,
    pub power_mw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOutput {
    pub power_mw: f64,
    pub fuel_per_min: Option<f64>, // None for unfueled generators
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceWellOutput {
    pub total_throughput_per_min: f64,
    pub total_power_mw: f64,
    pub expanded_node_count: usize,
}

impl From<ResourceWellOutput> for RateOutput {
    fn from(output: ResourceWellOutput) -> Self {
        Self {
            throughput_per_min: output.total_throughput_per_min,
            power_mw: output.total_power_mw,
        }
    }
}

impl fmt::Display for RateOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}/min, consumes {:.3} MW",
            self.throughput_per_min, self.power_mw
        )
    }
}

impl fmt::Display for GeneratorOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generates {:.3} MW", self.power_mw)?;
        if let Some(fuel) = self.fuel_per_min {
            write!(f, ", burns {:.3} fuel/min", fuel)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResourceWellOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {:.3}/min, consumes {:.3} MW",
            self.expanded_node_count, self.total_throughput_per_min, self.total_power_mw
        )
    }
}
