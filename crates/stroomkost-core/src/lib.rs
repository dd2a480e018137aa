// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Stroomkost Cost Engine
//!
//! Maps timestamped interval energy readings to monetary cost under a tariff
//! schedule that varies by time of day and by calendar period, and folds the
//! result into a cost report.
//!
//! ## Features
//!
//! - **Local-Time Resolution**: classifies naive local timestamps against
//!   DST transition rules, handling duplicated (fall-back) and skipped
//!   (spring-forward) hours explicitly
//! - **Tariff Lookup**: validity windows and peak/off-peak time classes with
//!   deterministic tie-breaking; a missing tariff is an explicit error,
//!   never a silent default
//! - **Exact Arithmetic**: decimal money and energy, rounding only at
//!   presentation
//! - **Aggregation**: totals, monthly trend, peak/off-peak split, optional
//!   flat-reference comparison

pub mod aggregates;
pub mod costs;
pub mod error;
pub mod report;
pub mod resolver;
pub mod schedule;

pub use aggregates::{Aggregates, aggregate};
pub use costs::cost_line;
pub use error::{EngineError, Result};
pub use report::build_cost_report;
pub use resolver::{
    DstTransition, LocalLookup, LocalTimeResolver, LocalTimeRules, ResolvedInstant,
    TransitionTable,
};
pub use schedule::TariffSchedule;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use stroomkost_types::{CostReport, Reading, SkippedReading};

/// What to do when a reading fails resolution or tariff lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Abort the entire run on the first failure
    #[default]
    FailFast,
    /// Exclude the offending reading, record it in report metadata, continue
    BestEffort,
}

/// Per-run engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeOptions {
    pub strictness: Strictness,
    /// Flat EUR/kWh price to compare the schedule against, if any
    pub reference_price_eur_per_kwh: Option<Decimal>,
}

/// Run the full pipeline: resolve every reading, cost it against the
/// schedule, aggregate, and assemble the report.
///
/// Readings must be supplied in original file order; that order drives the
/// duplicated-hour disambiguation and the accumulation order, making the
/// result bit-identical across runs on the same inputs.
pub fn compute<R: LocalTimeRules>(
    readings: &[Reading],
    schedule: &TariffSchedule,
    timezone_rules: &R,
    options: &ComputeOptions,
) -> Result<CostReport> {
    let mut resolver = LocalTimeResolver::new(timezone_rules);
    let mut lines = Vec::with_capacity(readings.len());
    let mut skipped: Vec<SkippedReading> = Vec::new();
    let mut ambiguous_count = 0usize;

    for (index, reading) in readings.iter().enumerate() {
        let position = index + 1;
        let costed = resolver.resolve(reading, position).and_then(|instant| {
            costs::cost_line(reading, &instant, schedule, position)
                .map(|line| (line, instant.is_ambiguous))
        });

        match costed {
            Ok((line, is_ambiguous)) => {
                // Counted only once the reading actually makes it into the
                // aggregates; skipped ambiguous readings are not
                if is_ambiguous {
                    ambiguous_count += 1;
                }
                lines.push(line);
            }
            Err(err) => match options.strictness {
                Strictness::FailFast => return Err(err),
                Strictness::BestEffort => {
                    warn!("skipping reading: {err}");
                    let (line, timestamp, meter_id) = err.reading_ref();
                    skipped.push(SkippedReading {
                        line,
                        timestamp,
                        meter_id: meter_id.map(ToOwned::to_owned),
                        reason: err.to_string(),
                    });
                }
            },
        }
    }

    Ok(report::build_cost_report(
        &lines,
        readings.len(),
        skipped,
        ambiguous_count,
        options.reference_price_eur_per_kwh,
    ))
}
