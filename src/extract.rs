//! Game-data extraction from the Satisfactory `Docs.json` class dump
//!
//! The game ships `CommunityResources/Docs/*.json`, a UTF-16 JSON listing
//! every buildable class with its power and extraction fields. Classes are
//! matched by name and their values copied over the loaded game data.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::constants::GameConstants;
use crate::models::{ExtractorKind, GeneratorKind, MachineKind, ResourceClass};

/// Raw fields of one buildable class
#[derive(Debug, Default, Clone, PartialEq)]
struct ExtractedClass {
    class_name: String,
    power_consumption: Option<f64>,
    power_production: Option<f64>,
    extract_cycle_time: Option<f64>,
    items_per_cycle: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClassTarget {
    Extractor(ExtractorKind),
    Pressurizer,
    Machine(MachineKind),
    Generator(GeneratorKind),
}

fn class_target(class_name: &str) -> Option<ClassTarget> {
    use ClassTarget::*;

    let target = match class_name {
        "Build_MinerMk1_C" => Extractor(ExtractorKind::MinerMk1),
        "Build_MinerMk2_C" => Extractor(ExtractorKind::MinerMk2),
        "Build_MinerMk3_C" => Extractor(ExtractorKind::MinerMk3),
        "Build_WaterPump_C" => Extractor(ExtractorKind::WaterExtractor),
        "Build_OilPump_C" => Extractor(ExtractorKind::OilExtractor),
        "Build_FrackingExtractor_C" => Extractor(ExtractorKind::ResourceWellExtractor),
        "Build_FrackingSmasher_C" => Pressurizer,
        "Build_SmelterMk1_C" => Machine(MachineKind::Smelter),
        "Build_ConstructorMk1_C" => Machine(MachineKind::Constructor),
        "Build_AssemblerMk1_C" => Machine(MachineKind::Assembler),
        "Build_FoundryMk1_C" => Machine(MachineKind::Foundry),
        "Build_OilRefinery_C" => Machine(MachineKind::Refinery),
        "Build_ManufacturerMk1_C" => Machine(MachineKind::Manufacturer),
        "Build_Blender_C" => Machine(MachineKind::Blender),
        "Build_Packager_C" => Machine(MachineKind::Packager),
        "Build_HadronCollider_C" => Machine(MachineKind::ParticleAccelerator),
        "Build_GeneratorBiomass_Automated_C" => Generator(GeneratorKind::BiomassBurner),
        "Build_GeneratorCoal_C" => Generator(GeneratorKind::CoalGenerator),
        "Build_GeneratorFuel_C" => Generator(GeneratorKind::FuelGenerator),
        "Build_GeneratorNuclear_C" => Generator(GeneratorKind::NuclearPowerPlant),
        "Build_GeneratorGeoThermal_C" => Generator(GeneratorKind::GeothermalGenerator),
        _ => return None,
    };
    Some(target)
}

/// Compiled field patterns, shared across files
struct DocsPatterns {
    class_name: Regex,
    power_consumption: Regex,
    power_production: Regex,
    extract_cycle_time: Regex,
    items_per_cycle: Regex,
}

impl DocsPatterns {
    fn new() -> Result<Self> {
        let field = |name: &str| Regex::new(&format!(r#""{}"\s*:\s*"(-?[\d.]+)""#, name));
        Ok(Self {
            class_name: Regex::new(r#""ClassName"\s*:\s*"(\w+)""#)?,
            power_consumption: field("mPowerConsumption")?,
            power_production: field("mPowerProduction")?,
            extract_cycle_time: field("mExtractCycleTime")?,
            items_per_cycle: field("mItemsPerCycle")?,
        })
    }

    fn number(pattern: &Regex, segment: &str) -> Option<f64> {
        pattern
            .captures(segment)
            .and_then(|cap| cap[1].parse::<f64>().ok())
    }

    /// Split on each "ClassName" entry; a class's fields run until the next one
    fn parse(&self, content: &str) -> Vec<ExtractedClass> {
        let starts: Vec<_> = self.class_name.captures_iter(content).collect();
        let mut classes = Vec::with_capacity(starts.len());

        for (index, cap) in starts.iter().enumerate() {
            let Some(whole) = cap.get(0) else { continue };
            let end = starts
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map_or(content.len(), |next| next.start());
            let segment = &content[whole.end()..end];

            classes.push(ExtractedClass {
                class_name: cap[1].to_string(),
                power_consumption: Self::number(&self.power_consumption, segment),
                power_production: Self::number(&self.power_production, segment),
                extract_cycle_time: Self::number(&self.extract_cycle_time, segment),
                items_per_cycle: Self::number(&self.items_per_cycle, segment),
            });
        }

        classes
    }
}

/// Read a docs file, decoding UTF-16LE when it starts with a byte-order mark
fn read_docs_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if let Some(body) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return Ok(String::from_utf16_lossy(&units));
    }

    let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes.as_slice());
    String::from_utf8(body.to_vec()).with_context(|| format!("{} is not UTF-8 or UTF-16", path.display()))
}

/// Find all JSON files under `docs_dir`
pub fn find_docs_files(docs_dir: &Path) -> Result<Vec<PathBuf>> {
    if !docs_dir.is_dir() {
        anyhow::bail!("{} is not a directory", docs_dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(docs_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();

    Ok(files)
}

/// Copy one class's values into the game data; false if nothing applied
fn apply_class(constants: &mut GameConstants, class: &ExtractedClass) -> bool {
    let Some(target) = class_target(&class.class_name) else {
        return false;
    };
    // Variable-power buildings report 0; keep the stored average
    let consumption = class.power_consumption.filter(|power| *power > 0.0);

    match target {
        ClassTarget::Extractor(kind) => {
            let Some(spec) = constants.extractor_mut(kind) else {
                return false;
            };
            let mut applied = false;
            if kind != ExtractorKind::ResourceWellExtractor {
                if let Some(power) = consumption {
                    spec.base_power = power;
                    applied = true;
                }
                let cycle = class.extract_cycle_time.filter(|cycle| *cycle > 0.0);
                if let (Some(cycle), Some(items)) = (cycle, class.items_per_cycle) {
                    // Fluids are counted in litres
                    let scale = if spec.resource_class == ResourceClass::Solid { 1.0 } else { 1000.0 };
                    spec.base_rate = items / scale / cycle * 60.0;
                    applied = true;
                }
            }
            applied
        }
        ClassTarget::Pressurizer => match consumption {
            Some(power) => {
                constants.pressurizer_base_power = power;
                true
            }
            None => false,
        },
        ClassTarget::Machine(kind) => match (constants.machine_mut(kind), consumption) {
            (Some(spec), Some(power)) => {
                spec.base_power = power;
                true
            }
            _ => false,
        },
        ClassTarget::Generator(kind) => {
            let production = class.power_production.filter(|power| *power > 0.0);
            match (constants.generator_mut(kind), production) {
                (Some(spec), Some(power)) => {
                    spec.base_power = power;
                    true
                }
                _ => false,
            }
        }
    }
}

/// Scan `docs_dir` and update `constants` in place
pub fn extract_to_constants(docs_dir: &Path, constants: &mut GameConstants) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();
    let patterns = DocsPatterns::new()?;

    info!(dir = %docs_dir.display(), "Scanning for game docs");
    let files = find_docs_files(docs_dir)?;
    info!(count = files.len(), "Found candidate docs files");

    for path in &files {
        let content = match read_docs_file(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable docs file");
                stats.errors += 1;
                continue;
            }
        };
        stats.files += 1;

        for class in patterns.parse(&content) {
            stats.classes += 1;
            if apply_class(constants, &class) {
                debug!(
                    class = %class.class_name,
                    power_consumption = ?class.power_consumption,
                    power_production = ?class.power_production,
                    "Updated game data"
                );
                stats.updated += 1;
            } else {
                stats.skipped += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ExtractStats {
    pub files: usize,
    pub classes: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scanned {} files ({} classes). Updated: {}, Skipped: {}, Errors: {}",
            self.files, self.classes, self.updated, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DOCS: &str = r#"[
      {
        "NativeClass": "/Script/CoreUObject.Class'/Script/FactoryGame.FGBuildableResourceExtractor'",
        "Classes": [
          {
            "ClassName": "Build_MinerMk2_C",
            "mDisplayName": "Miner Mk.2",
            "mExtractCycleTime": "0.500000",
            "mItemsPerCycle": "1",
            "mPowerConsumption": "15.000000"
          },
          {
            "ClassName": "Build_WaterPump_C",
            "mExtractCycleTime": "1.000000",
            "mItemsPerCycle": "2500",
            "mPowerConsumption": "20.000000"
          },
          {
            "ClassName": "Build_FrackingSmasher_C",
            "mPowerConsumption": "160.000000"
          },
          {
            "ClassName": "Build_ConveyorBeltMk1_C",
            "mSpeed": "120.000000"
          },
          {
            "ClassName": "Build_HadronCollider_C",
            "mPowerConsumption": "0.000000"
          }
        ]
      },
      {
        "Classes": [
          { "ClassName": "Build_GeneratorCoal_C", "mPowerProduction": "80.000000" }
        ]
      }
    ]"#;

    #[test]
    fn parse_splits_classes() {
        let patterns = DocsPatterns::new().unwrap();
        let classes = patterns.parse(SAMPLE_DOCS);

        assert_eq!(classes.len(), 6);
        assert_eq!(classes[0].class_name, "Build_MinerMk2_C");
        assert_eq!(classes[0].extract_cycle_time, Some(0.5));
        assert_eq!(classes[0].power_consumption, Some(15.0));
        // Fields do not leak into the next class
        assert_eq!(classes[3].power_consumption, None);
        assert_eq!(classes[5].power_production, Some(80.0));
    }

    #[test]
    fn extraction_updates_matching_entries() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("CommunityResources/Docs");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("en-US.json"), SAMPLE_DOCS).unwrap();
        fs::write(nested.join("readme.txt"), "not docs").unwrap();

        let mut constants = GameConstants::default();
        let stats = extract_to_constants(dir.path(), &mut constants).unwrap();

        assert_eq!(stats.files, 1);
        assert_eq!(stats.classes, 6);
        assert_eq!(stats.updated, 4);
        assert_eq!(stats.skipped, 2);

        let mk2 = constants.extractor(ExtractorKind::MinerMk2).unwrap();
        assert_eq!(mk2.base_power, 15.0);
        assert_eq!(mk2.base_rate, 120.0);
        let water = constants.extractor(ExtractorKind::WaterExtractor).unwrap();
        assert_eq!(water.base_rate, 150.0);
        assert_eq!(constants.pressurizer_base_power, 160.0);
        assert_eq!(constants.generator(GeneratorKind::CoalGenerator).unwrap().base_power, 80.0);
        // Zero power keeps the stored average
        assert_eq!(
            constants.machine(MachineKind::ParticleAccelerator).unwrap().base_power,
            500.0
        );
    }

    #[test]
    fn zero_cycle_time_keeps_base_rate() {
        let mut constants = GameConstants::default();
        let class = ExtractedClass {
            class_name: "Build_MinerMk3_C".to_string(),
            extract_cycle_time: Some(0.0),
            items_per_cycle: Some(2.0),
            ..Default::default()
        };

        assert!(!apply_class(&mut constants, &class));
        assert_eq!(constants.extractor(ExtractorKind::MinerMk3).unwrap().base_rate, 240.0);
    }

    #[test]
    fn utf16_docs_are_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = vec![0xFF, 0xFE];
        for unit in r#"[{"ClassName":"Build_SmelterMk1_C","mPowerConsumption":"4.500000"}]"#.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        fs::write(dir.path().join("en-US.json"), bytes).unwrap();

        let mut constants = GameConstants::default();
        let stats = extract_to_constants(dir.path(), &mut constants).unwrap();

        assert_eq!(stats.updated, 1);
        assert_eq!(constants.machine(MachineKind::Smelter).unwrap().base_power, 4.5);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let mut constants = GameConstants::default();
        let result = extract_to_constants(Path::new("/nonexistent/docs"), &mut constants);
        assert!(result.is_err());
    }
}
