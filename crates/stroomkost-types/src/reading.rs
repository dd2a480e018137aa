// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One metered interval (typically 15 minutes, sometimes 1 hour) from a
/// Fluvius export.
///
/// The timestamp is the naive local wall-clock time exactly as it appears in
/// the export; no UTC offset is attached. Resolving it against the DST
/// transition rules of a timezone is the engine's job, never the parser's.
///
/// A bidirectional metering point may carry both a consumption (afname) and
/// an injection (injectie) quantity for the same interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Local wall-clock start of the interval
    pub timestamp: NaiveDateTime,
    /// Energy taken from the grid during the interval (kWh, non-negative)
    pub afname_kwh: Decimal,
    /// Energy injected into the grid during the interval (kWh, non-negative)
    pub injectie_kwh: Decimal,
    /// Metering point identifier (EAN code) when the export carries one
    #[serde(default)]
    pub meter_id: Option<String>,
}

impl Reading {
    /// Consumption-only reading
    #[must_use]
    pub fn afname(timestamp: NaiveDateTime, afname_kwh: Decimal) -> Self {
        Self {
            timestamp,
            afname_kwh,
            injectie_kwh: Decimal::ZERO,
            meter_id: None,
        }
    }

    /// Injection-only reading
    #[must_use]
    pub fn injectie(timestamp: NaiveDateTime, injectie_kwh: Decimal) -> Self {
        Self {
            timestamp,
            afname_kwh: Decimal::ZERO,
            injectie_kwh,
            meter_id: None,
        }
    }

    /// Same reading tagged with a metering point id
    #[must_use]
    pub fn with_meter(mut self, meter_id: impl Into<String>) -> Self {
        self.meter_id = Some(meter_id.into());
        self
    }
}

/// Which occurrence of a duplicated (DST fall-back) local hour a reading was
/// resolved to. `NotApplicable` for every timestamp outside such a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disambiguation {
    First,
    Second,
    #[default]
    NotApplicable,
}
