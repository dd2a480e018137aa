// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use stroomkost_types::{
    CostLine, CostReport, ReferenceComparison, RunMetadata, SkippedReading,
};

use crate::aggregates::aggregate;

/// Assemble the final report: aggregates plus run metadata and, when a flat
/// reference price is given, the comparison against it. Pure assembly on top
/// of the aggregator; no rounding happens here.
#[must_use]
pub fn build_cost_report(
    lines: &[CostLine],
    readings_total: usize,
    skipped: Vec<SkippedReading>,
    ambiguous_count: usize,
    reference_price_eur_per_kwh: Option<Decimal>,
) -> CostReport {
    let agg = aggregate(lines);

    let first_date = lines.iter().map(|l| l.timestamp.date()).min();
    let last_date = lines.iter().map(|l| l.timestamp.date()).max();

    let reference = reference_price_eur_per_kwh
        .map(|price| reference_comparison(lines, agg.total.net_cost_eur, price));

    CostReport {
        total: agg.total,
        monthly: agg.monthly,
        peak: agg.peak,
        off_peak: agg.off_peak,
        metadata: RunMetadata {
            readings_total,
            readings_costed: lines.len(),
            readings_skipped: skipped.len(),
            ambiguous_count,
            first_date,
            last_date,
            skipped,
        },
        reference,
    }
}

/// What the same consumption would have cost at a flat EUR/kWh price.
/// Matches the original backtest's reference feature: only afname is priced;
/// injection is not netted against the flat rate.
fn reference_comparison(
    lines: &[CostLine],
    total_cost_eur: Decimal,
    price: Decimal,
) -> ReferenceComparison {
    let mut reference_total = Decimal::ZERO;
    let mut monthly: BTreeMap<String, Decimal> = BTreeMap::new();

    for line in lines {
        let cost = line.afname_kwh * price;
        reference_total += cost;
        *monthly.entry(line.month_bucket.clone()).or_default() += cost;
    }

    let difference = total_cost_eur - reference_total;
    let difference_pct = if reference_total.is_zero() {
        Decimal::ZERO
    } else {
        difference / reference_total * Decimal::ONE_HUNDRED
    };

    ReferenceComparison {
        reference_price_eur_per_kwh: price,
        reference_cost_eur: reference_total,
        difference_eur: difference,
        difference_pct,
        monthly_reference_eur: monthly,
    }
}
