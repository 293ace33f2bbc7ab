//! Resource-well aggregation
//!
//! A resource well is one pressurizer driving many extractor nodes. The form
//! edits nodes grouped as `{purity, count}`; the backend stores individual
//! nodes. Throughput is summed over the individual nodes and scaled once by
//! the pressurizer clock. Power belongs to the pressurizer alone.

use std::iter;

use crate::calculator::{validate_clock_speed, validate_count};
use crate::constants::{GameConstants, MAX_WELL_NODES};
use crate::error::{CalcResult, ValidationError};
use crate::models::{
    ExtractorNode, Purity, ResourceWellExtractorEntry, ResourceWellOutput, ResourceWellPressurizer,
};

/// Total expanded node count, rejected above `MAX_WELL_NODES`
pub fn node_count(entries: &[ResourceWellExtractorEntry]) -> CalcResult<u32> {
    let count: u64 = entries.iter().map(|entry| u64::from(entry.count)).sum();
    match u32::try_from(count) {
        Ok(count) if count <= MAX_WELL_NODES => Ok(count),
        _ => Err(ValidationError::TooManyNodes {
            count,
            max: MAX_WELL_NODES,
        }
        .into()),
    }
}

fn node_purities(entries: &[ResourceWellExtractorEntry]) -> impl Iterator<Item = Purity> + '_ {
    entries
        .iter()
        .flat_map(|entry| iter::repeat_n(entry.purity, entry.count as usize))
}

/// Expand grouped entries into one node per extractor, ids from 1 in entry order
pub fn expand_entries(entries: &[ResourceWellExtractorEntry]) -> CalcResult<Vec<ExtractorNode>> {
    let count = node_count(entries)?;

    Ok((1..=count)
        .zip(node_purities(entries))
        .map(|(id, purity)| ExtractorNode { id, purity })
        .collect())
}

/// Group individual nodes back by purity, in first-seen order
pub fn collapse_nodes(nodes: &[ExtractorNode]) -> Vec<ResourceWellExtractorEntry> {
    let mut entries: Vec<ResourceWellExtractorEntry> = Vec::new();

    for node in nodes {
        match entries.iter_mut().find(|entry| entry.purity == node.purity) {
            Some(entry) => entry.count += 1,
            None => entries.push(ResourceWellExtractorEntry {
                purity: node.purity,
                count: 1,
            }),
        }
    }

    entries
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceWellAggregator<'a> {
    constants: &'a GameConstants,
}

impl<'a> ResourceWellAggregator<'a> {
    pub fn new(constants: &'a GameConstants) -> Self {
        Self { constants }
    }

    pub fn compute(
        &self,
        pressurizer: &ResourceWellPressurizer,
        entries: &[ResourceWellExtractorEntry],
    ) -> CalcResult<ResourceWellOutput> {
        validate_clock_speed(pressurizer.clock_speed)?;
        for entry in entries {
            validate_count(entry.count)?;
        }
        let count = node_count(entries)?;

        let base_sum: f64 = node_purities(entries)
            .map(|purity| self.constants.resource_well_rates.get(purity))
            .sum();
        let factor = self.constants.clock_factor(pressurizer.clock_speed);

        Ok(ResourceWellOutput {
            total_throughput_per_min: base_sum * factor,
            total_power_mw: self.constants.pressurizer_base_power * factor,
            expanded_node_count: count as usize,
        })
    }
}
