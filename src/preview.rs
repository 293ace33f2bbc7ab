//! Local estimates reconciled with authoritative backend previews
//!
//! Every edit submits a fresh local estimate and takes a ticket. Only the
//! response for the newest ticket may replace the estimate; older responses
//! are dropped. A failed preview leaves the estimate on display.

use tracing::{debug, warn};

use crate::error::PreviewError;
use crate::models::RateOutput;
use crate::payload::RawInputPayload;

/// Source of authoritative numbers for a raw input
pub trait PreviewBackend {
    fn preview_raw_input(&self, payload: &RawInputPayload) -> Result<RateOutput, PreviewError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PreviewTicket {
    sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    LocalEstimate,
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview<'a, T> {
    pub value: &'a T,
    pub source: PreviewSource,
}

#[derive(Debug, Clone)]
pub struct PreviewCoordinator<T> {
    last_sequence: u64,
    local: Option<T>,
    authoritative: Option<T>,
}

impl<T> Default for PreviewCoordinator<T> {
    fn default() -> Self {
        Self {
            last_sequence: 0,
            local: None,
            authoritative: None,
        }
    }
}

impl<T> PreviewCoordinator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new local estimate, superseding every in-flight request
    pub fn submit(&mut self, estimate: T) -> PreviewTicket {
        self.last_sequence += 1;
        self.local = Some(estimate);
        self.authoritative = None;
        debug!(sequence = self.last_sequence, "Local preview estimate updated");

        PreviewTicket {
            sequence: self.last_sequence,
        }
    }

    pub fn resolve(&mut self, ticket: PreviewTicket, response: Result<T, PreviewError>) -> Resolution {
        if ticket.sequence != self.last_sequence {
            debug!(
                sequence = ticket.sequence,
                latest = self.last_sequence,
                "Dropping stale preview response"
            );
            return Resolution::Stale;
        }

        match response {
            Ok(value) => {
                self.authoritative = Some(value);
                Resolution::Applied
            }
            Err(err) => {
                warn!(sequence = ticket.sequence, error = %err, "Backend preview failed, keeping local estimate");
                Resolution::Failed
            }
        }
    }

    pub fn current(&self) -> Option<Preview<'_, T>> {
        if let Some(value) = &self.authoritative {
            return Some(Preview {
                value,
                source: PreviewSource::Backend,
            });
        }
        self.local.as_ref().map(|value| Preview {
            value,
            source: PreviewSource::LocalEstimate,
        })
    }

    pub fn is_authoritative(&self) -> bool {
        self.authoritative.is_some()
    }
}

/// One synchronous submit/preview/resolve round for a raw input
pub fn refresh<B: PreviewBackend + ?Sized>(
    coordinator: &mut PreviewCoordinator<RateOutput>,
    backend: &B,
    payload: &RawInputPayload,
    estimate: RateOutput,
) -> Resolution {
    let ticket = coordinator.submit(estimate);
    let response = backend.preview_raw_input(payload);
    coordinator.resolve(ticket, response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GameConstants;
    use crate::models::{ExtractorKind, Purity};
    use crate::payload::RawInputDraft;

    fn rate(throughput_per_min: f64) -> RateOutput {
        RateOutput {
            throughput_per_min,
            power_mw: 5.0,
        }
    }

    #[test]
    fn estimate_shown_until_backend_answers() {
        let mut coordinator = PreviewCoordinator::new();
        assert!(coordinator.current().is_none());

        let ticket = coordinator.submit(rate(60.0));
        let shown = coordinator.current().unwrap();
        assert_eq!(shown.source, PreviewSource::LocalEstimate);
        assert_eq!(shown.value.throughput_per_min, 60.0);

        assert_eq!(coordinator.resolve(ticket, Ok(rate(58.5))), Resolution::Applied);
        let shown = coordinator.current().unwrap();
        assert_eq!(shown.source, PreviewSource::Backend);
        assert_eq!(shown.value.throughput_per_min, 58.5);
    }

    #[test]
    fn out_of_order_response_discarded() {
        let mut coordinator = PreviewCoordinator::new();
        let first = coordinator.submit(rate(60.0));
        let second = coordinator.submit(rate(120.0));
        assert!(second > first);

        assert_eq!(coordinator.resolve(second, Ok(rate(119.0))), Resolution::Applied);
        assert_eq!(coordinator.resolve(first, Ok(rate(59.0))), Resolution::Stale);
        assert_eq!(coordinator.current().unwrap().value.throughput_per_min, 119.0);
    }

    #[test]
    fn new_edit_supersedes_authoritative_value() {
        let mut coordinator = PreviewCoordinator::new();
        let ticket = coordinator.submit(rate(60.0));
        coordinator.resolve(ticket, Ok(rate(61.0)));
        assert!(coordinator.is_authoritative());

        let stale = ticket;
        coordinator.submit(rate(90.0));
        assert!(!coordinator.is_authoritative());
        assert_eq!(coordinator.resolve(stale, Ok(rate(61.0))), Resolution::Stale);
        assert_eq!(coordinator.current().unwrap().value.throughput_per_min, 90.0);
    }

    #[test]
    fn failure_keeps_local_estimate() {
        let mut coordinator = PreviewCoordinator::new();
        let ticket = coordinator.submit(rate(60.0));

        assert_eq!(
            coordinator.resolve(ticket, Err(PreviewError::Status(502))),
            Resolution::Failed
        );
        let shown = coordinator.current().unwrap();
        assert_eq!(shown.source, PreviewSource::LocalEstimate);
        assert_eq!(shown.value.throughput_per_min, 60.0);
    }

    struct FixedBackend(Result<RateOutput, PreviewError>);

    impl PreviewBackend for FixedBackend {
        fn preview_raw_input(&self, _payload: &RawInputPayload) -> Result<RateOutput, PreviewError> {
            self.0.clone()
        }
    }

    #[test]
    fn refresh_round_trip() {
        let constants = GameConstants::default();
        let mut draft = RawInputDraft::new(ExtractorKind::MinerMk2, "Copper Ore");
        draft.purity = Some(Purity::Normal);
        let payload = draft.to_payload(&constants).unwrap();
        let estimate = draft.estimate(&constants).unwrap();

        let mut coordinator = PreviewCoordinator::new();
        let online = FixedBackend(Ok(rate(121.0)));
        assert_eq!(refresh(&mut coordinator, &online, &payload, estimate), Resolution::Applied);
        assert_eq!(coordinator.current().unwrap().value.throughput_per_min, 121.0);

        let offline = FixedBackend(Err(PreviewError::Transport("connection refused".into())));
        assert_eq!(refresh(&mut coordinator, &offline, &payload, estimate), Resolution::Failed);
        let shown = coordinator.current().unwrap();
        assert_eq!(shown.source, PreviewSource::LocalEstimate);
        assert_eq!(shown.value.throughput_per_min, 120.0);
    }
}
