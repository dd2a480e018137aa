// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use stroomkost_types::{CostLine, Reading, TariffType, TimeClass};

use crate::error::{EngineError, Result};
use crate::resolver::ResolvedInstant;
use crate::schedule::TariffSchedule;

/// Produce the cost line for one resolved reading.
///
/// The schedule is consulted once per direction. A missing rule is an error
/// only when the corresponding energy quantity is non-zero; a zero quantity
/// contributes a zero cost component without requiring tariff coverage, so a
/// consumption-only dataset does not need injectie rules.
///
/// All arithmetic is exact decimal; rounding happens only at report
/// presentation, never per interval.
pub fn cost_line(
    reading: &Reading,
    instant: &ResolvedInstant,
    schedule: &TariffSchedule,
    line: usize,
) -> Result<CostLine> {
    let date = instant.local.date();
    let time_class = TimeClass::of(instant.local.time());

    let price_afname = price_or_zero(
        schedule,
        TariffType::Afname,
        date,
        time_class,
        reading.afname_kwh,
        reading,
        line,
    )?;
    let price_injectie = price_or_zero(
        schedule,
        TariffType::Injectie,
        date,
        time_class,
        reading.injectie_kwh,
        reading,
        line,
    )?;

    let cost_afname = reading.afname_kwh * price_afname;
    let cost_injectie = reading.injectie_kwh * price_injectie;

    Ok(CostLine {
        line,
        timestamp: reading.timestamp,
        meter_id: reading.meter_id.clone(),
        time_class,
        month_bucket: date.format("%Y-%m").to_string(),
        disambiguation: instant.disambiguation,
        afname_kwh: reading.afname_kwh,
        injectie_kwh: reading.injectie_kwh,
        price_afname_eur_per_kwh: price_afname,
        price_injectie_eur_per_kwh: price_injectie,
        cost_afname_eur: cost_afname,
        cost_injectie_eur: cost_injectie,
        // Injection is credited against consumption
        net_cost_eur: cost_afname - cost_injectie,
    })
}

fn price_or_zero(
    schedule: &TariffSchedule,
    tariff_type: TariffType,
    date: NaiveDate,
    time_class: TimeClass,
    quantity_kwh: Decimal,
    reading: &Reading,
    line: usize,
) -> Result<Decimal> {
    if quantity_kwh.is_zero() {
        return Ok(Decimal::ZERO);
    }
    schedule
        .price_for(tariff_type, date, time_class)
        .ok_or_else(|| EngineError::NoTariffMatch {
            tariff_type,
            date,
            time_class,
            timestamp: reading.timestamp,
            meter_id: reading.meter_id.clone(),
            line,
        })
}
