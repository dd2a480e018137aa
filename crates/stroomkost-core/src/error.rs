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

//! Error types for the cost engine

use chrono::{NaiveDate, NaiveDateTime};
use stroomkost_types::{TariffType, TimeClass};
use thiserror::Error;

/// Failures the engine can surface for a single reading. Each variant
/// carries the offending reading's identity (timestamp, meter, 1-based file
/// position) so callers can render an actionable message without re-deriving
/// anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The local timestamp falls in a DST spring-forward gap and cannot
    /// exist in the configured timezone. Data-quality error, never corrected
    /// silently.
    #[error(
        "local time {timestamp} does not exist in this timezone (spring-forward gap); row {line}, meter {}",
        meter_id.as_deref().unwrap_or("?")
    )]
    InvalidLocalTime {
        timestamp: NaiveDateTime,
        meter_id: Option<String>,
        line: usize,
    },

    /// No tariff rule covers the queried (type, date, time class) triple.
    #[error(
        "no {tariff_type} tariff rule matches {date} ({time_class}); reading at {timestamp}, row {line}, meter {}",
        meter_id.as_deref().unwrap_or("?")
    )]
    NoTariffMatch {
        tariff_type: TariffType,
        date: NaiveDate,
        time_class: TimeClass,
        timestamp: NaiveDateTime,
        meter_id: Option<String>,
        line: usize,
    },
}

impl EngineError {
    /// Identity of the offending reading: (file position, timestamp, meter).
    #[must_use]
    pub fn reading_ref(&self) -> (usize, NaiveDateTime, Option<&str>) {
        match self {
            Self::InvalidLocalTime {
                timestamp,
                meter_id,
                line,
            }
            | Self::NoTariffMatch {
                timestamp,
                meter_id,
                line,
                ..
            } => (*line, *timestamp, meter_id.as_deref()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
