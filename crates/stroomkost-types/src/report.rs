// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reading::Disambiguation;
use crate::tariff::TimeClass;

/// Computed cost for one interval reading. Derived, immutable, exactly one
/// per reading that survived resolution and tariff lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLine {
    /// 1-based position of the reading in the input sequence
    pub line: usize,
    /// Local wall-clock start of the interval
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub meter_id: Option<String>,
    pub time_class: TimeClass,
    /// Calendar month bucket, `YYYY-MM`, derived from the local date
    pub month_bucket: String,
    /// Which occurrence of a duplicated fall-back hour this interval is
    #[serde(default)]
    pub disambiguation: Disambiguation,
    pub afname_kwh: Decimal,
    pub injectie_kwh: Decimal,
    pub price_afname_eur_per_kwh: Decimal,
    pub price_injectie_eur_per_kwh: Decimal,
    pub cost_afname_eur: Decimal,
    pub cost_injectie_eur: Decimal,
    /// `cost_afname - cost_injectie`; injection is credited
    pub net_cost_eur: Decimal,
}

/// Additive cost/usage bucket (total, per month, or per time class).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtotal {
    pub net_cost_eur: Decimal,
    pub afname_kwh: Decimal,
    pub injectie_kwh: Decimal,
}

/// A reading excluded from the aggregates under best-effort strictness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedReading {
    pub line: usize,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub meter_id: Option<String>,
    pub reason: String,
}

/// Run metadata attached to the final report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Number of readings supplied to the run
    pub readings_total: usize,
    /// Number of readings that produced a cost line
    pub readings_costed: usize,
    /// Number of readings excluded due to resolution or tariff failures
    pub readings_skipped: usize,
    /// Number of costed readings that fell inside a duplicated fall-back
    /// hour (informational); excludes readings that were skipped
    pub ambiguous_count: usize,
    /// First local calendar date covered by the cost lines
    pub first_date: Option<NaiveDate>,
    /// Last local calendar date covered by the cost lines
    pub last_date: Option<NaiveDate>,
    pub skipped: Vec<SkippedReading>,
}

/// Comparison of the computed total against a flat reference price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceComparison {
    pub reference_price_eur_per_kwh: Decimal,
    /// Every afname kWh priced at the flat reference rate
    pub reference_cost_eur: Decimal,
    /// `total - reference`; negative means the schedule beat the reference
    pub difference_eur: Decimal,
    /// Difference as a percentage of the reference cost; zero when the
    /// reference cost is zero
    pub difference_pct: Decimal,
    pub monthly_reference_eur: BTreeMap<String, Decimal>,
}

/// The final result of a backtest run. Read-only after construction; money
/// is kept at full precision and rounded only for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostReport {
    pub total: Subtotal,
    /// Net cost and usage per `YYYY-MM` calendar month
    pub monthly: BTreeMap<String, Subtotal>,
    pub peak: Subtotal,
    pub off_peak: Subtotal,
    pub metadata: RunMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceComparison>,
}

impl CostReport {
    /// Presentation copy with all monetary values rounded to `dp` decimal
    /// places (banker's rounding). Energy quantities are left untouched.
    /// Aggregation always happens before this, never after.
    #[must_use]
    pub fn rounded(&self, dp: u32) -> Self {
        let round = |sub: &Subtotal| Subtotal {
            net_cost_eur: sub.net_cost_eur.round_dp(dp),
            afname_kwh: sub.afname_kwh,
            injectie_kwh: sub.injectie_kwh,
        };

        Self {
            total: round(&self.total),
            monthly: self
                .monthly
                .iter()
                .map(|(month, sub)| (month.clone(), round(sub)))
                .collect(),
            peak: round(&self.peak),
            off_peak: round(&self.off_peak),
            metadata: self.metadata.clone(),
            reference: self.reference.as_ref().map(|r| ReferenceComparison {
                reference_price_eur_per_kwh: r.reference_price_eur_per_kwh,
                reference_cost_eur: r.reference_cost_eur.round_dp(dp),
                difference_eur: r.difference_eur.round_dp(dp),
                difference_pct: r.difference_pct.round_dp(1),
                monthly_reference_eur: r
                    .monthly_reference_eur
                    .iter()
                    .map(|(month, cost)| (month.clone(), cost.round_dp(dp)))
                    .collect(),
            }),
        }
    }
}
