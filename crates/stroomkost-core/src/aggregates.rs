// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use std::collections::BTreeMap;

use stroomkost_types::{CostLine, Subtotal, TimeClass};

/// Folded totals over a cost line sequence, before report assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub total: Subtotal,
    pub monthly: BTreeMap<String, Subtotal>,
    pub peak: Subtotal,
    pub off_peak: Subtotal,
}

/// Single pass in input order. Accumulation is commutative, but keeping the
/// input sequence order makes the last decimal digit reproducible run to
/// run. An empty sequence yields all-zero aggregates.
#[must_use]
pub fn aggregate(lines: &[CostLine]) -> Aggregates {
    let mut agg = Aggregates::default();

    for line in lines {
        absorb(&mut agg.total, line);
        absorb(agg.monthly.entry(line.month_bucket.clone()).or_default(), line);
        match line.time_class {
            TimeClass::Peak => absorb(&mut agg.peak, line),
            // `Any` never comes out of classification
            TimeClass::OffPeak | TimeClass::Any => absorb(&mut agg.off_peak, line),
        }
    }

    agg
}

fn absorb(subtotal: &mut Subtotal, line: &CostLine) {
    subtotal.net_cost_eur += line.net_cost_eur;
    subtotal.afname_kwh += line.afname_kwh;
    subtotal.injectie_kwh += line.injectie_kwh;
}
