// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use tracing::{info, warn};

use stroomkost_types::TariffRule;

/// Read tariff rules from a CSV file with headers
/// `tariff_type,valid_from,valid_to,price_eur_per_kwh,time_class`.
///
/// `valid_to` may be left empty for an open-ended rule. Dates are ISO
/// (`YYYY-MM-DD`); `tariff_type` is `afname`/`injectie`; `time_class` is
/// `peak`/`off_peak`/`any`.
pub fn read_tariffs(path: &Path) -> Result<Vec<TariffRule>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open tariff file {}", path.display()))?;

    let mut rules = Vec::new();
    for (index, result) in reader.deserialize::<TariffRule>().enumerate() {
        let rule = result.with_context(|| format!("invalid tariff rule at row {}", index + 2))?;
        rules.push(rule);
    }

    if rules.is_empty() {
        warn!("tariff file {} contains no rules", path.display());
    } else {
        info!("parsed {} tariff rules from {}", rules.len(), path.display());
    }
    Ok(rules)
}
