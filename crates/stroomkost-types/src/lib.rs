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

//! Shared data types for the Stroomkost cost backtesting engine.
//!
//! These are plain serde-derived entities with no engine logic: metered
//! interval readings, tariff rules, and the report structures returned to
//! callers. All monetary and energy quantities use [`rust_decimal::Decimal`]
//! so that summing many small interval costs stays exact.

pub mod reading;
pub mod report;
pub mod tariff;

// Re-export common types for convenience
pub use reading::{Disambiguation, Reading};
pub use report::{CostLine, CostReport, ReferenceComparison, RunMetadata, SkippedReading, Subtotal};
pub use tariff::{TariffRule, TariffType, TimeClass};
