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

//! Parsing collaborator for the Stroomkost engine: turns Fluvius interval
//! exports (CSV or XLSX) into readings and tariff CSV files into tariff
//! rules. Timestamps are kept as naive local wall-clock times; DST
//! resolution belongs to the engine, not the parser.

pub mod intervals;
pub mod readings;
pub mod tariffs;

pub use intervals::check_intervals;
pub use readings::read_readings;
pub use tariffs::read_tariffs;
