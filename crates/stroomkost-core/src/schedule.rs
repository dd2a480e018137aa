// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use stroomkost_types::{TariffRule, TariffType, TimeClass};

/// Ordered, immutable collection of tariff rules for one run.
///
/// The schedule is passed explicitly into every computation call; there is
/// no shared tariff table, so concurrent runs with different schedules are
/// safe and tests are deterministic.
#[derive(Debug, Clone, Default)]
pub struct TariffSchedule {
    rules: Vec<TariffRule>,
}

impl TariffSchedule {
    #[must_use]
    pub fn new(rules: Vec<TariffRule>) -> Self {
        Self { rules }
    }

    /// Default Belgian dual-rate schedule: a peak and an off-peak consumption
    /// price, each with a flat per-kWh surcharge added, open-ended validity.
    #[must_use]
    pub fn dual_rate(
        peak_eur_per_kwh: Decimal,
        offpeak_eur_per_kwh: Decimal,
        surcharge_eur_per_kwh: Decimal,
    ) -> Self {
        let open_start = NaiveDate::MIN;
        Self::new(vec![
            TariffRule {
                tariff_type: TariffType::Afname,
                valid_from: open_start,
                valid_to: None,
                price_eur_per_kwh: peak_eur_per_kwh + surcharge_eur_per_kwh,
                time_class: TimeClass::Peak,
            },
            TariffRule {
                tariff_type: TariffType::Afname,
                valid_from: open_start,
                valid_to: None,
                price_eur_per_kwh: offpeak_eur_per_kwh + surcharge_eur_per_kwh,
                time_class: TimeClass::OffPeak,
            },
        ])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn rules(&self) -> &[TariffRule] {
        &self.rules
    }

    /// Unit price for `(tariff_type, date, time_class)`, or `None` when no
    /// rule covers the triple.
    ///
    /// Candidates are the rules of the right type whose validity window
    /// covers the date and whose time class is the queried one or `any`.
    /// Tie-break: narrowest validity window first (open-ended counts as
    /// widest), then the specific time class over `any`, then schedule
    /// order. Callers turn a `None` into an explicit error; the engine never
    /// substitutes a default price.
    #[must_use]
    pub fn price_for(
        &self,
        tariff_type: TariffType,
        date: NaiveDate,
        time_class: TimeClass,
    ) -> Option<Decimal> {
        self.rules
            .iter()
            .filter(|rule| rule.tariff_type == tariff_type)
            .filter(|rule| rule.applies_on(date))
            .filter(|rule| rule.time_class.matches(time_class))
            .enumerate()
            .min_by_key(|(position, rule)| {
                let window = rule.window_days().unwrap_or(i64::MAX);
                let specificity = usize::from(rule.time_class == TimeClass::Any);
                (window, specificity, *position)
            })
            .map(|(_, rule)| rule.price_eur_per_kwh)
    }
}
