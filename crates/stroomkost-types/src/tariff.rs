// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use chrono::{NaiveDate, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peak hours run from 07:00 (inclusive) to 22:00 (exclusive), local time.
pub const PEAK_START_HOUR: u32 = 7;
pub const PEAK_END_HOUR: u32 = 22;

/// Energy flow direction a tariff rule prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffType {
    /// Consumption taken from the grid
    Afname,
    /// Injection fed back into the grid (credited)
    Injectie,
}

impl fmt::Display for TariffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Afname => write!(f, "afname"),
            Self::Injectie => write!(f, "injectie"),
        }
    }
}

/// Time-of-day tariff classification.
///
/// `Any` is a rule wildcard only: classifying a clock time always yields
/// `Peak` or `OffPeak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeClass {
    Peak,
    OffPeak,
    Any,
}

impl TimeClass {
    /// Classify a local clock time. Boundaries are half-open: 07:00 exactly
    /// is peak, 22:00 exactly is off-peak.
    #[must_use]
    pub fn of(time: NaiveTime) -> Self {
        if (PEAK_START_HOUR..PEAK_END_HOUR).contains(&time.hour()) {
            Self::Peak
        } else {
            Self::OffPeak
        }
    }

    /// Whether a rule carrying this class applies to a query for `queried`.
    #[must_use]
    pub fn matches(self, queried: TimeClass) -> bool {
        self == Self::Any || self == queried
    }
}

impl fmt::Display for TimeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peak => write!(f, "peak"),
            Self::OffPeak => write!(f, "off_peak"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// A priced, date- and time-of-day-bounded pricing policy for one energy
/// flow direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRule {
    pub tariff_type: TariffType,
    /// First calendar date the rule is valid on (inclusive)
    pub valid_from: NaiveDate,
    /// Last calendar date the rule is valid on (inclusive); open-ended when absent
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    pub price_eur_per_kwh: Decimal,
    pub time_class: TimeClass,
}

impl TariffRule {
    /// Whether the rule's validity window covers `date`.
    #[must_use]
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && self.valid_to.is_none_or(|end| date <= end)
    }

    /// Width of the validity window in days; `None` for open-ended rules.
    /// Used for the narrowest-window-wins tie-break.
    #[must_use]
    pub fn window_days(&self) -> Option<i64> {
        self.valid_to
            .map(|end| (end - self.valid_from).num_days() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).expect("valid time")
    }

    #[test]
    fn test_time_class_boundaries() {
        assert_eq!(TimeClass::of(time(7, 0, 0)), TimeClass::Peak);
        assert_eq!(TimeClass::of(time(6, 59, 59)), TimeClass::OffPeak);
        assert_eq!(TimeClass::of(time(21, 59, 59)), TimeClass::Peak);
        assert_eq!(TimeClass::of(time(22, 0, 0)), TimeClass::OffPeak);
        assert_eq!(TimeClass::of(time(0, 0, 0)), TimeClass::OffPeak);
        assert_eq!(TimeClass::of(time(12, 30, 0)), TimeClass::Peak);
    }

    #[test]
    fn test_time_class_matches() {
        assert!(TimeClass::Any.matches(TimeClass::Peak));
        assert!(TimeClass::Any.matches(TimeClass::OffPeak));
        assert!(TimeClass::Peak.matches(TimeClass::Peak));
        assert!(!TimeClass::Peak.matches(TimeClass::OffPeak));
    }

    #[test]
    fn test_rule_validity_boundaries() {
        let rule = TariffRule {
            tariff_type: TariffType::Afname,
            valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            valid_to: NaiveDate::from_ymd_opt(2024, 6, 30),
            price_eur_per_kwh: dec!(0.32),
            time_class: TimeClass::Any,
        };

        assert!(rule.applies_on(NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")));
        assert!(rule.applies_on(NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date")));
        assert!(!rule.applies_on(NaiveDate::from_ymd_opt(2023, 12, 31).expect("valid date")));
        assert!(!rule.applies_on(NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date")));
        assert_eq!(rule.window_days(), Some(182));
    }

    #[test]
    fn test_open_ended_rule() {
        let rule = TariffRule {
            tariff_type: TariffType::Injectie,
            valid_from: NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date"),
            valid_to: None,
            price_eur_per_kwh: dec!(0.05),
            time_class: TimeClass::Any,
        };

        assert!(rule.applies_on(NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid date")));
        assert_eq!(rule.window_days(), None);
    }
}
