//! P/E valuation gauge.
//!
//! Bands (default anchors 15 / 20 / 25):
//!
//! ```text
//! pe <= 15        Undervalued
//! 15 < pe < 20    Slightly undervalued
//! pe == 20        Fair value
//! 20 < pe < 25    Slightly overvalued
//! pe >= 25        Overvalued
//! ```
//!
//! The needle maps `[0, cheap]`, `[cheap, fair]` and `[fair, rich]` onto
//! 20-point segments of the dial (0-20, 20-40, 40-60). Above `rich` the
//! needle keeps the slope of the last segment through the remaining 40
//! points and stops at 100.

use fair_value_common::GaugeSettings;

use super::types::{FinancialFacts, PeBand, PeGauge};

const SEGMENT_WIDTH: f64 = 20.0;

pub fn classify_pe(pe: f64, anchors: &GaugeSettings) -> PeBand {
    if pe <= anchors.cheap_pe {
        PeBand::Undervalued
    } else if pe < anchors.fair_pe {
        PeBand::SlightlyUndervalued
    } else if pe == anchors.fair_pe {
        PeBand::FairValue
    } else if pe < anchors.rich_pe {
        PeBand::SlightlyOvervalued
    } else {
        PeBand::Overvalued
    }
}

/// Needle position in [0, 100].
pub fn gauge_position(pe: f64, anchors: &GaugeSettings) -> f64 {
    let GaugeSettings {
        cheap_pe,
        fair_pe,
        rich_pe,
    } = *anchors;

    let position = if pe <= cheap_pe {
        SEGMENT_WIDTH * pe / cheap_pe
    } else if pe <= fair_pe {
        SEGMENT_WIDTH * (1.0 + (pe - cheap_pe) / (fair_pe - cheap_pe))
    } else if pe <= rich_pe {
        SEGMENT_WIDTH * (2.0 + (pe - fair_pe) / (rich_pe - fair_pe))
    } else {
        SEGMENT_WIDTH * (3.0 + (pe - rich_pe) / (rich_pe - fair_pe))
    };

    position.clamp(0.0, 100.0)
}

/// Place the current P/E on the gauge; `None` unless price and trailing EPS are positive.
pub fn build_gauge(facts: &FinancialFacts, anchors: &GaugeSettings) -> Option<PeGauge> {
    let current_pe = facts.current_pe().filter(|pe| pe.is_finite())?;
    let band = classify_pe(current_pe, anchors);

    Some(PeGauge {
        current_pe,
        band,
        label: band.to_string(),
        position: gauge_position(current_pe, anchors),
        forward_pe: facts.forward_pe(),
    })
}
