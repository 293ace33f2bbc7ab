//! Production rate and power calculator
//!
//! Every homogeneous group of machines, extractors or generators follows
//! `value = base × (clock/100)^exponent × count`. Power drawn by a machine
//! is further scaled by `(1 + used/max)^2` for inserted somersloops.

use crate::constants::{ExtractorSpec, GameConstants, MAX_CLOCK_SPEED, MIN_CLOCK_SPEED};
use crate::error::{CalcResult, ValidationError};
use crate::models::{
    ExtractorKind, GeneratorGroup, GeneratorOutput, MachineGroup, Purity, RateOutput,
};

/// A single rate computation, dispatched by `RateCalculator::compute_rate`
#[derive(Debug, Clone, PartialEq)]
pub enum RateRequest {
    Extractor {
        kind: ExtractorKind,
        purity: Option<Purity>,
        clock_speed: f64,
        count: u32,
    },
    Machine(MachineGroup),
    Generator(GeneratorGroup),
}

/// Somersloops inserted into one machine, out of its slot count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SomersloopSlots {
    pub used: u32,
    pub max: u32,
}

impl SomersloopSlots {
    pub fn power_multiplier(&self) -> f64 {
        if self.max == 0 {
            return 1.0;
        }
        (1.0 + f64::from(self.used) / f64::from(self.max)).powi(2)
    }
}

pub fn validate_clock_speed(clock_speed: f64) -> Result<(), ValidationError> {
    if !(MIN_CLOCK_SPEED..=MAX_CLOCK_SPEED).contains(&clock_speed) {
        return Err(ValidationError::ClockSpeed(clock_speed));
    }
    Ok(())
}

pub fn validate_count(count: u32) -> Result<(), ValidationError> {
    if count == 0 {
        return Err(ValidationError::ZeroCount);
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    // NaN fails the comparison too
    if !(value >= 0.0) || value.is_infinite() {
        return Err(ValidationError::NegativeValue { field, value });
    }
    Ok(())
}

/// Pure calculator over a borrowed game-data table
#[derive(Debug, Clone, Copy)]
pub struct RateCalculator<'a> {
    constants: &'a GameConstants,
}

impl<'a> RateCalculator<'a> {
    pub fn new(constants: &'a GameConstants) -> Self {
        Self { constants }
    }

    pub fn compute_rate(&self, request: &RateRequest) -> CalcResult<RateOutput> {
        match request {
            RateRequest::Extractor {
                kind,
                purity,
                clock_speed,
                count,
            } => self.extractor(*kind, *purity, *clock_speed, *count),
            RateRequest::Machine(group) => self.machine(group),
            RateRequest::Generator(group) => {
                // Throughput of a generator is the fuel it burns
                let output = self.generator(group)?;
                Ok(RateOutput {
                    throughput_per_min: output.fuel_per_min.unwrap_or(0.0),
                    power_mw: output.power_mw,
                })
            }
        }
    }

    /// The generic formula for one group
    pub fn group(
        &self,
        base_rate: f64,
        base_power: f64,
        clock_speed: f64,
        count: u32,
        somersloop: Option<SomersloopSlots>,
    ) -> CalcResult<RateOutput> {
        validate_non_negative("base rate", base_rate)?;
        validate_non_negative("base power", base_power)?;
        validate_clock_speed(clock_speed)?;
        validate_count(count)?;

        let power_multiplier = match somersloop {
            Some(slots) if slots.used > slots.max => {
                return Err(ValidationError::Somersloop {
                    used: slots.used,
                    max: slots.max,
                }
                .into());
            }
            Some(slots) => slots.power_multiplier(),
            None => 1.0,
        };

        let factor = self.constants.clock_factor(clock_speed);
        let count = f64::from(count);

        Ok(RateOutput {
            throughput_per_min: base_rate * factor * count,
            power_mw: base_power * factor * count * power_multiplier,
        })
    }

    pub fn extractor(
        &self,
        kind: ExtractorKind,
        purity: Option<Purity>,
        clock_speed: f64,
        count: u32,
    ) -> CalcResult<RateOutput> {
        let spec = self.constants.extractor(kind)?;
        let base_rate = self.extractor_base_rate(spec, purity)?;
        self.group(base_rate, spec.base_power, clock_speed, count, None)
    }

    /// Purity-adjusted rate of one extractor at 100%
    pub fn extractor_base_rate(
        &self,
        spec: &ExtractorSpec,
        purity: Option<Purity>,
    ) -> CalcResult<f64> {
        if !spec.purity_applies {
            return Ok(spec.base_rate);
        }
        let purity = purity.ok_or(ValidationError::MissingPurity(spec.kind))?;

        if spec.kind == ExtractorKind::ResourceWellExtractor {
            Ok(self.constants.resource_well_rates.get(purity))
        } else {
            Ok(spec.base_rate * self.constants.purity_multipliers.get(purity))
        }
    }

    pub fn machine(&self, group: &MachineGroup) -> CalcResult<RateOutput> {
        let spec = self.constants.machine(group.kind)?;
        self.group(
            group.recipe_rate,
            spec.base_power,
            group.clock_speed,
            group.count,
            Some(SomersloopSlots {
                used: group.somersloop,
                max: spec.max_somersloop,
            }),
        )
    }

    pub fn generator(&self, group: &GeneratorGroup) -> CalcResult<GeneratorOutput> {
        let spec = self.constants.generator(group.kind)?;
        let output = self.group(
            spec.fuel_per_min.unwrap_or(0.0),
            spec.base_power,
            group.clock_speed,
            group.count,
            None,
        )?;

        Ok(GeneratorOutput {
            power_mw: output.power_mw,
            fuel_per_min: spec.fuel_per_min.map(|_| output.throughput_per_min),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::OVERCLOCK_EXPONENT;
    use crate::error::CalcError;
    use crate::models::{GeneratorKind, MachineKind};

    fn extractor_request(kind: ExtractorKind, purity: Option<Purity>, clock_speed: f64, count: u32) -> RateRequest {
        RateRequest::Extractor {
            kind,
            purity,
            clock_speed,
            count,
        }
    }

    #[test]
    fn full_clock_reproduces_base_values() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let out = calc
            .compute_rate(&extractor_request(ExtractorKind::MinerMk1, Some(Purity::Normal), 100.0, 1))
            .unwrap();
        assert_eq!(out, RateOutput { throughput_per_min: 60.0, power_mw: 5.0 });

        let out = calc
            .compute_rate(&extractor_request(ExtractorKind::OilExtractor, Some(Purity::Impure), 100.0, 1))
            .unwrap();
        assert_eq!(out, RateOutput { throughput_per_min: 60.0, power_mw: 40.0 });
    }

    #[test]
    fn full_clock_matches_table_for_every_kind() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        for kind in ExtractorKind::ALL {
            let spec = constants.extractor(*kind).unwrap();
            let purities: Vec<Option<Purity>> = if spec.purity_applies {
                Purity::ALL.iter().copied().map(Some).collect()
            } else {
                vec![None]
            };

            for purity in purities {
                let expected_rate = match purity {
                    None => spec.base_rate,
                    Some(purity) if *kind == ExtractorKind::ResourceWellExtractor => {
                        constants.resource_well_rates.get(purity)
                    }
                    Some(purity) => spec.base_rate * constants.purity_multipliers.get(purity),
                };
                let out = calc.compute_rate(&extractor_request(*kind, purity, 100.0, 1)).unwrap();
                assert_eq!(
                    out,
                    RateOutput { throughput_per_min: expected_rate, power_mw: spec.base_power },
                    "{} {:?}",
                    kind,
                    purity
                );
            }
        }

        for kind in MachineKind::ALL {
            let spec = constants.machine(*kind).unwrap();
            let group = MachineGroup {
                kind: *kind,
                recipe_rate: 30.0,
                count: 1,
                clock_speed: 100.0,
                somersloop: 0,
            };
            let out = calc.machine(&group).unwrap();
            assert_eq!(out, RateOutput { throughput_per_min: 30.0, power_mw: spec.base_power }, "{}", kind);
        }

        for kind in GeneratorKind::ALL {
            let spec = constants.generator(*kind).unwrap();
            let out = calc
                .generator(&GeneratorGroup { kind: *kind, count: 1, clock_speed: 100.0 })
                .unwrap();
            assert_eq!(out.power_mw, spec.base_power, "{}", kind);
            assert_eq!(out.fuel_per_min, spec.fuel_per_min, "{}", kind);
        }
    }

    #[test]
    fn zero_clock_gives_zero() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        for count in [1, 3, 40] {
            let out = calc
                .extractor(ExtractorKind::MinerMk3, Some(Purity::Pure), 0.0, count)
                .unwrap();
            assert_eq!(out.throughput_per_min, 0.0);
            assert_eq!(out.power_mw, 0.0);
        }
    }

    #[test]
    fn strictly_increasing_in_clock() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let mut previous = RateOutput::default();
        for step in 1..=250 {
            let out = calc
                .extractor(ExtractorKind::MinerMk2, Some(Purity::Normal), f64::from(step), 2)
                .unwrap();
            assert!(out.throughput_per_min > previous.throughput_per_min, "throughput at {step}%");
            assert!(out.power_mw > previous.power_mw, "power at {step}%");
            previous = out;
        }
    }

    #[test]
    fn linear_in_count() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let single = calc
            .extractor(ExtractorKind::MinerMk1, Some(Purity::Impure), 137.5, 1)
            .unwrap();
        for count in [2, 5, 17] {
            let many = calc
                .extractor(ExtractorKind::MinerMk1, Some(Purity::Impure), 137.5, count)
                .unwrap();
            assert_eq!(many.throughput_per_min, f64::from(count) * single.throughput_per_min);
        }
    }

    #[test]
    fn overclocked_pure_mk2_scenario() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let out = calc
            .extractor(ExtractorKind::MinerMk2, Some(Purity::Pure), 150.0, 4)
            .unwrap();

        let factor = 1.5f64.powf(OVERCLOCK_EXPONENT);
        let pure_rate = 120.0 * 2.0;
        assert!((out.throughput_per_min - pure_rate * factor * 4.0).abs() < 1e-9);
        assert!((out.power_mw - 12.0 * factor * 4.0).abs() < 1e-9);
    }

    #[test]
    fn water_ignores_purity() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let bare = calc.extractor(ExtractorKind::WaterExtractor, None, 100.0, 1).unwrap();
        let with_purity = calc
            .extractor(ExtractorKind::WaterExtractor, Some(Purity::Pure), 100.0, 1)
            .unwrap();
        assert_eq!(bare.throughput_per_min, 120.0);
        assert_eq!(bare, with_purity);
    }

    #[test]
    fn single_well_node_uses_absolute_rate() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let out = calc
            .extractor(ExtractorKind::ResourceWellExtractor, Some(Purity::Impure), 100.0, 1)
            .unwrap();
        assert_eq!(out.throughput_per_min, 30.0);
        assert_eq!(out.power_mw, 0.0);
    }

    #[test]
    fn missing_purity_rejected() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let err = calc.extractor(ExtractorKind::MinerMk1, None, 100.0, 1).unwrap_err();
        assert_eq!(
            err,
            CalcError::Validation(ValidationError::MissingPurity(ExtractorKind::MinerMk1))
        );
    }

    #[test]
    fn invalid_inputs_rejected_not_clamped() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let zero_count = calc.extractor(ExtractorKind::MinerMk1, Some(Purity::Normal), 100.0, 0);
        assert_eq!(zero_count, Err(ValidationError::ZeroCount.into()));

        for clock in [-1.0, 250.5, f64::NAN] {
            let result = calc.extractor(ExtractorKind::MinerMk1, Some(Purity::Normal), clock, 1);
            assert!(
                matches!(result, Err(CalcError::Validation(ValidationError::ClockSpeed(_)))),
                "clock {clock} accepted"
            );
        }

        let negative_rate = calc.group(-5.0, 4.0, 100.0, 1, None);
        assert_eq!(
            negative_rate,
            Err(ValidationError::NegativeValue { field: "base rate", value: -5.0 }.into())
        );
    }

    #[test]
    fn clock_bounds_are_inclusive() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        assert!(calc.extractor(ExtractorKind::MinerMk1, Some(Purity::Normal), 0.0, 1).is_ok());
        assert!(calc.extractor(ExtractorKind::MinerMk1, Some(Purity::Normal), 250.0, 1).is_ok());
    }

    #[test]
    fn somersloop_scales_power_only() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let mut group = MachineGroup {
            kind: MachineKind::Manufacturer,
            recipe_rate: 2.5,
            count: 2,
            clock_speed: 100.0,
            somersloop: 0,
        };
        let plain = calc.machine(&group).unwrap();
        assert_eq!(plain, RateOutput { throughput_per_min: 5.0, power_mw: 110.0 });

        group.somersloop = 2;
        let boosted = calc.machine(&group).unwrap();
        assert_eq!(boosted.throughput_per_min, plain.throughput_per_min);
        assert!((boosted.power_mw - 110.0 * 1.5 * 1.5).abs() < 1e-9);

        group.somersloop = 4;
        let full = calc.machine(&group).unwrap();
        assert!((full.power_mw - 110.0 * 4.0).abs() < 1e-9);
    }

    #[test]
    fn somersloop_over_slot_count_rejected() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let group = MachineGroup {
            kind: MachineKind::Smelter,
            recipe_rate: 30.0,
            count: 1,
            clock_speed: 100.0,
            somersloop: 2,
        };
        assert_eq!(
            calc.machine(&group),
            Err(ValidationError::Somersloop { used: 2, max: 1 }.into())
        );

        let packager = MachineGroup {
            kind: MachineKind::Packager,
            somersloop: 0,
            ..group
        };
        assert_eq!(calc.machine(&packager).unwrap().power_mw, 10.0);
    }

    #[test]
    fn generator_power_and_fuel_scale_together() {
        let constants = GameConstants::default();
        let calc = RateCalculator::new(&constants);

        let coal = calc
            .generator(&GeneratorGroup {
                kind: GeneratorKind::CoalGenerator,
                count: 3,
                clock_speed: 100.0,
            })
            .unwrap();
        assert_eq!(coal.power_mw, 225.0);
        assert_eq!(coal.fuel_per_min, Some(45.0));

        let geothermal = calc
            .generator(&GeneratorGroup {
                kind: GeneratorKind::GeothermalGenerator,
                count: 1,
                clock_speed: 100.0,
            })
            .unwrap();
        assert_eq!(geothermal.fuel_per_min, None);

        let request = RateRequest::Generator(GeneratorGroup {
            kind: GeneratorKind::FuelGenerator,
            count: 2,
            clock_speed: 50.0,
        });
        let out = calc.compute_rate(&request).unwrap();
        let factor = 0.5f64.powf(OVERCLOCK_EXPONENT);
        assert!((out.power_mw - 250.0 * factor * 2.0).abs() < 1e-9);
        assert!((out.throughput_per_min - 20.0 * factor * 2.0).abs() < 1e-9);
    }

    #[test]
    fn kind_missing_from_table_is_unsupported() {
        let mut constants = GameConstants::default();
        constants.extractors.retain(|spec| spec.kind != ExtractorKind::MinerMk3);
        let calc = RateCalculator::new(&constants);

        let err = calc
            .extractor(ExtractorKind::MinerMk3, Some(Purity::Normal), 100.0, 1)
            .unwrap_err();
        assert_eq!(err, CalcError::UnsupportedKind("miner_mk3".to_string()));
    }
}
