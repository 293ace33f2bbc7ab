//! Raw-input form state and the backend create/update payload

use serde::{Deserialize, Serialize};

use crate::calculator::RateCalculator;
use crate::constants::GameConstants;
use crate::error::{CalcResult, ValidationError};
use crate::models::{
    ExtractorKind, ExtractorNode, Purity, RateOutput, ResourceWellExtractorEntry,
    ResourceWellPressurizer,
};
use crate::well::{ResourceWellAggregator, collapse_nodes, expand_entries, node_count};

/// Body of a raw-input create/update request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInputPayload {
    pub extractor_type: ExtractorKind,
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purity: Option<Purity>,
    pub overclock_percent: f64,
    pub count: u32,
    pub quantity_per_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressurizer: Option<ResourceWellPressurizer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractors: Option<Vec<ExtractorNode>>,
}

/// Editable raw input, as held by an open form
#[derive(Debug, Clone, PartialEq)]
pub struct RawInputDraft {
    pub kind: ExtractorKind,
    pub item: String,
    pub purity: Option<Purity>,
    pub clock_speed: f64,
    pub count: u32,
    pub pressurizer: Option<ResourceWellPressurizer>,
    pub well_entries: Vec<ResourceWellExtractorEntry>,
}

impl RawInputDraft {
    pub fn new(kind: ExtractorKind, item: impl Into<String>) -> Self {
        let pressurizer = if kind == ExtractorKind::ResourceWellExtractor {
            Some(ResourceWellPressurizer::default())
        } else {
            None
        };

        Self {
            kind,
            item: item.into(),
            purity: None,
            clock_speed: 100.0,
            count: 1,
            pressurizer,
            well_entries: Vec::new(),
        }
    }

    fn is_resource_well(&self) -> bool {
        self.kind == ExtractorKind::ResourceWellExtractor
    }

    /// Required-field checks that block submission
    pub fn validate(&self, constants: &GameConstants) -> CalcResult<()> {
        if self.item.trim().is_empty() {
            return Err(ValidationError::MissingField("item").into());
        }

        let spec = constants.extractor(self.kind)?;

        if self.is_resource_well() {
            if self.pressurizer.is_none() {
                return Err(ValidationError::MissingField("pressurizer").into());
            }
            if self.well_entries.is_empty() {
                return Err(ValidationError::MissingField("extractors").into());
            }
        } else if spec.purity_applies && self.purity.is_none() {
            return Err(ValidationError::MissingPurity(self.kind).into());
        }

        Ok(())
    }

    /// Local estimate of throughput and power
    pub fn estimate(&self, constants: &GameConstants) -> CalcResult<RateOutput> {
        if self.is_resource_well() {
            let pressurizer = self
                .pressurizer
                .ok_or(ValidationError::MissingField("pressurizer"))?;
            let output =
                ResourceWellAggregator::new(constants).compute(&pressurizer, &self.well_entries)?;
            return Ok(output.into());
        }

        RateCalculator::new(constants).extractor(self.kind, self.purity, self.clock_speed, self.count)
    }

    pub fn to_payload(&self, constants: &GameConstants) -> CalcResult<RawInputPayload> {
        self.validate(constants)?;
        let estimate = self.estimate(constants)?;

        if let Some(pressurizer) = self.pressurizer.filter(|_| self.is_resource_well()) {
            let count = node_count(&self.well_entries)?;
            let nodes = expand_entries(&self.well_entries)?;
            return Ok(RawInputPayload {
                extractor_type: self.kind,
                item: self.item.clone(),
                purity: None,
                overclock_percent: pressurizer.clock_speed,
                count,
                quantity_per_min: estimate.throughput_per_min,
                pressurizer: Some(pressurizer),
                extractors: Some(nodes),
            });
        }

        let purity_applies = constants.extractor(self.kind)?.purity_applies;
        Ok(RawInputPayload {
            extractor_type: self.kind,
            item: self.item.clone(),
            purity: self.purity.filter(|_| purity_applies),
            overclock_percent: self.clock_speed,
            count: self.count,
            quantity_per_min: estimate.throughput_per_min,
            pressurizer: None,
            extractors: None,
        })
    }

    /// Rebuild editable state from a stored payload
    pub fn from_payload(payload: &RawInputPayload) -> Self {
        let mut draft = Self::new(payload.extractor_type, payload.item.clone());
        draft.purity = payload.purity;
        draft.clock_speed = payload.overclock_percent;
        draft.count = payload.count;

        if draft.is_resource_well() {
            draft.pressurizer = Some(payload.pressurizer.unwrap_or(ResourceWellPressurizer {
                clock_speed: payload.overclock_percent,
            }));
            draft.well_entries = payload
                .extractors
                .as_deref()
                .map(collapse_nodes)
                .unwrap_or_default();
        }

        draft
    }
}
